mod transform;
pub use transform::*;

mod matrix;
pub use matrix::*;

mod convention;
pub use convention::*;
