use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Product,
    Category,
}

/// Typed view over an intent's open filter map.
///
/// Every recognized key is admitted only when its JSON value has the right
/// shape; anything else is dropped so the planner never sees raw text where
/// it expects a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub year: Option<i64>,
    pub years: Option<Vec<i64>>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub year_count: Option<i64>,
    pub category: Option<String>,
    pub categories: Option<Vec<String>>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub limit: Option<i64>,
    pub order: Option<RankOrder>,
    pub entity: Option<Entity>,
    pub average: bool,
}

impl Filters {
    pub fn from_map(map: &IndexMap<String, Value>) -> Self {
        let get = |key: &str| map.get(key);

        Self {
            year: get("year").and_then(int),
            years: get("years").and_then(int_list),
            year_from: get("year_from").and_then(int),
            year_to: get("year_to").and_then(int),
            year_count: get("year_count").and_then(int),
            category: get("category").and_then(text),
            categories: get("categories").and_then(text_list),
            product_id: get("product_id").and_then(int),
            product_name: get("product_name").and_then(text),
            limit: get("limit").and_then(int),
            order: get("order").and_then(|v| match v.as_str()? {
                "top" => Some(RankOrder::Top),
                "bottom" => Some(RankOrder::Bottom),
                _ => None,
            }),
            entity: get("entity").and_then(|v| match v.as_str()? {
                "product" => Some(Entity::Product),
                "category" => Some(Entity::Category),
                _ => None,
            }),
            average: get("average").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

/// JSON integers, or strings made only of ASCII digits.
fn int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_prefix('-').unwrap_or(s);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn text(v: &Value) -> Option<String> {
    let s = v.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn int_list(v: &Value) -> Option<Vec<i64>> {
    let items: Vec<i64> = v.as_array()?.iter().filter_map(int).collect();
    (!items.is_empty()).then_some(items)
}

fn text_list(v: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = v.as_array()?.iter().filter_map(text).collect();
    (!items.is_empty()).then_some(items)
}
