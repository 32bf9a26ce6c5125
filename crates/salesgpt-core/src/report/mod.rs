pub mod chart;
pub mod title;
