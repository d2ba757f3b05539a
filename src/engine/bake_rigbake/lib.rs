mod config;
pub use config::*;

mod issues;
pub use issues::*;

pub mod skeleton;
pub mod skin;
pub mod material;
pub mod geometry;
mod tangents;
pub mod animation;

mod pipeline;
pub use pipeline::*;
