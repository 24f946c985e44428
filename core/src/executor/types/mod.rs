pub mod config;
pub mod plan;
pub mod result;

pub use config::*;
pub use plan::*;
pub use result::*;
