pub mod error;
pub mod model;
pub mod retry;

pub use error::*;
pub use model::*;
pub use retry::*;
