pub mod fetch;
pub mod generate;
pub mod resolver;
pub mod transport;

pub use fetch::*;
pub use generate::*;
pub use resolver::*;
pub use transport::*;
