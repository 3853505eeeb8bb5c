pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
pub use session::{Session, TransferKind};
