pub mod changes;
pub mod input;
pub mod loader;
pub mod reconcile;
pub mod session;
pub mod update;

pub use changes::*;
pub use input::*;
pub use loader::*;
pub use reconcile::*;
pub use session::*;
pub use update::*;
