mod scan;
pub use scan::*;

mod output;
pub use output::*;

mod batch;
pub use batch::*;
