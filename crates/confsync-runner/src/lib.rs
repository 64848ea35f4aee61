pub mod activate;
pub mod config;
pub mod engine;
pub mod identity;
pub mod pipeline;

pub use activate::*;
pub use config::*;
pub use engine::*;
pub use identity::*;
pub use pipeline::*;
