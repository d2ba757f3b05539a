mod bin_io;
pub use bin_io::*;

mod model;
pub use model::*;

mod animation;
pub use animation::*;
