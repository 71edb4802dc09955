pub mod feed;
pub mod weather;

pub use feed::*;
pub use weather::*;
