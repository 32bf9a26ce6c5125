pub mod catalog;
pub mod join_graph;
