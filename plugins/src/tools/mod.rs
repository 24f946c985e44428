pub mod chat;
pub mod command;
mod http;
pub mod image;
pub mod search;

pub use chat::ChatTool;
pub use command::{CommandImageTool, CommandTool};
pub use image::ImageApiTool;
pub use search::WebSearchTool;
