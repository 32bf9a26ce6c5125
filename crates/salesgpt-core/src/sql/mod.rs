pub mod bind;
pub mod render;
