pub mod error;
pub mod extract;
pub mod format;
pub mod models;
pub mod prompt;

pub use error::RequestError;
pub use extract::{extract, extract_from_value, extract_list, extract_with_keys, Fence, Strategy};
pub use format::{format, format_plan};
pub use models::*;
pub use prompt::{render_prompt, Prompt};
