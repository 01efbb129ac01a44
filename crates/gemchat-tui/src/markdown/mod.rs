//! Markdown rendering for model replies.

mod parse;
mod wrap;

pub use parse::render_markdown;
pub use wrap::{WrapOptions, wrap_plain, wrap_styled_spans};
