pub mod package;
pub mod render;
pub mod xml;
