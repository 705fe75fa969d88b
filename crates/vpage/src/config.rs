//! Binder Configuration

use std::time::Duration;

/// Binder configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Selector of the rendering surface container
    pub selector: String,

    /// Blank the surface before each navigation
    pub clear_page: bool,

    /// URL given to the host history for every bookkeeping entry
    pub home_url: String,

    /// Upper bound on waiting for content before restoring scroll
    pub restore_timeout: Duration,
}

impl Config {
    /// Set the surface selector
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Enable or disable blanking the surface between pages
    pub fn with_clear_page(mut self, clear_page: bool) -> Self {
        self.clear_page = clear_page;
        self
    }

    /// Set the host history URL
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    /// Set the scroll restoration timeout
    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.restore_timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selector: "#page".to_string(),
            clear_page: false,
            home_url: "/".to_string(),
            restore_timeout: Duration::from_secs(10),
        }
    }
}
