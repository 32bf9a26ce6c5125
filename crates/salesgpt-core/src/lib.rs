//! Natural-language sales questions to parameterized aggregation queries.

pub mod agents;
pub mod compiler;
pub mod config;
pub mod dsl;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod sql;
pub mod validate;
