mod catalog;
mod functions;
mod result;

pub use catalog::{ToolCatalog, ToolName};
pub use functions::ToolFunctions;
pub use result::ToolResult;
