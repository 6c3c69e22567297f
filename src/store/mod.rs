pub mod cache;
pub mod traits;

pub use cache::*;
pub use traits::*;
