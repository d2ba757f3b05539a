mod scene;
pub use scene::*;

mod mesh;
pub use mesh::*;

mod curve;
pub use curve::*;

mod axis_system;
pub use axis_system::*;

pub mod gltf_import;

mod import;
pub use import::*;
