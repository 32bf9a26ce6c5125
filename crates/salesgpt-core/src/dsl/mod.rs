pub mod compile;
pub mod filters;
pub mod intent;
pub mod plan;
pub mod validate;
