pub mod camera;
pub mod config;
pub mod repl;
pub mod widget;
