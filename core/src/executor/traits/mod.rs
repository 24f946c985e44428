pub mod renderer;
pub mod tools;

pub use renderer::*;
pub use tools::*;
