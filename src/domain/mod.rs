pub mod error;
pub mod snapshot;
pub mod types;

pub use error::*;
pub use snapshot::*;
pub use types::*;
