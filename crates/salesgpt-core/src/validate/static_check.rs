use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Basic static SQL parse check, run on bound statements before they leave
/// the process.
pub fn parse_ok(sql: &str) -> anyhow::Result<()> {
    let dialect = PostgreSqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql)?;
    if statements.len() != 1 {
        anyhow::bail!("expected exactly one statement, found {}", statements.len());
    }
    Ok(())
}
