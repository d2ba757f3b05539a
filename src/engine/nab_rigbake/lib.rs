pub mod app;
pub mod timing;

mod toml_io;
pub use toml_io::*;
