pub mod catalog;
pub mod change;
pub mod common;
pub mod field;
pub mod options;
pub mod upload;

pub use catalog::*;
pub use change::*;
pub use common::*;
pub use field::*;
pub use options::*;
pub use upload::*;
