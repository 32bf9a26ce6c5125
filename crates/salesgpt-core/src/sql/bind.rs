use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::dsl::plan::{ParamValue, PlannedQuery};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("placeholder ':{0}' has no bound parameter")]
    MissingParam(String),
}

/// A statement ready for a positional-parameter driver.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<ParamValue>,
}

/// Walk `sql`, handing every `:name` placeholder to `f` and splicing in what
/// it returns. `::` casts and quoted literals are left alone.
fn rewrite_placeholders<F>(sql: &str, mut f: F) -> Result<String, BindError>
where
    F: FnMut(&str) -> Result<String, BindError>,
{
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut copied = 0;
    let mut in_literal = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_literal = !in_literal,
            b':' if !in_literal => {
                let after_colon = i > 0 && bytes[i - 1] == b':';
                let starts_ident = bytes
                    .get(i + 1)
                    .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');

                if !after_colon && starts_ident {
                    let start = i + 1;
                    let mut end = start;
                    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                        end += 1;
                    }

                    out.push_str(&sql[copied..i]);
                    out.push_str(&f(&sql[start..end])?);
                    copied = end;
                    i = end;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    out.push_str(&sql[copied..]);
    Ok(out)
}

/// Names of every `:name` placeholder in `sql`, in order of first use.
pub fn placeholders(sql: &str) -> IndexSet<String> {
    let mut names = IndexSet::new();
    // The callback never fails, so neither does the walk.
    let _ = rewrite_placeholders(sql, |name| {
        names.insert(name.to_string());
        Ok(format!(":{name}"))
    });
    names
}

/// Rewrite named placeholders to typed positional ones (`$1::BIGINT`),
/// reusing a position when a name repeats.
pub fn bind(plan: &PlannedQuery) -> Result<BoundQuery, BindError> {
    let mut positions: IndexMap<String, usize> = IndexMap::new();
    let mut params = Vec::new();

    let sql = rewrite_placeholders(&plan.sql, |name| {
        let value = plan
            .params
            .get(name)
            .ok_or_else(|| BindError::MissingParam(name.to_string()))?;

        let position = match positions.get(name) {
            Some(p) => *p,
            None => {
                params.push(value.clone());
                positions.insert(name.to_string(), params.len());
                params.len()
            }
        };

        Ok(format!("${}::{}", position, value.sql_type()))
    })?;

    Ok(BoundQuery { sql, params })
}
