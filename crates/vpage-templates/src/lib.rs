//! vpage Templates
//!
//! Fetching, compiling and caching of HTML templates for pages.
//!
//! Features:
//! - `{{name}}` / `{{a.b}}` substitution (HTML-escaped) and `{{{name}}}` (raw)
//! - Asynchronous preloading with [`TemplateCache::load`]
//! - Synchronous fallback in [`TemplateCache::get`] for templates not preloaded

mod cache;
mod source;
mod template;

pub use cache::TemplateCache;
pub use source::{DirSource, MemorySource, TemplateSource};
pub use template::{Template, escape_html};

/// Template error
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template path is missing or blank")]
    BlankPath,

    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to read template '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unclosed tag at byte {0}")]
    UnclosedTag(usize),

    #[error("Empty tag at byte {0}")]
    EmptyTag(usize),
}
