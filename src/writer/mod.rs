pub mod json;
pub mod patch;
pub mod render;
