pub mod build_view;
pub mod footer;
pub mod header;
pub mod new_build;
pub mod render;
pub mod spinner;
pub mod table;
