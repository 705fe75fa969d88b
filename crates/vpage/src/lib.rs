//! vpage
//!
//! Virtual page navigation for single-page applications.
//!
//! # Features
//! - Page registry with lazily rendered, user-defined pages
//! - History stack rooted at the home page, with back-button handling
//!   bridged to the host's navigation history
//! - Scroll restoration that waits for content and images before applying
//!   a page's remembered offset, bounded by a timeout and cancelled by newer
//!   navigations
//!
//! # Example
//! ```rust,ignore
//! use vpage::{Binder, Config, HeadlessSurface, MemoryHistory};
//!
//! let executor = Rc::new(smol::LocalExecutor::new());
//! let binder = Binder::new(
//!     Config::default(),
//!     Rc::new(HeadlessSurface::new("#page")),
//!     Rc::new(MemoryHistory::new("https://app.example/")?),
//!     executor.clone(),
//! );
//! binder.init(HomePage::new())?;
//! binder.add_page(SecondPage::new())?;
//! binder.goto_page("secondPage", None)?;
//! smol::block_on(executor.run(binder.settle()));
//! ```

mod binder;
mod config;
mod error;
pub mod host;
pub mod page;
pub mod restore;
pub mod stack;
pub mod surface;

pub use binder::{BackOutcome, Binder};
pub use config::Config;
pub use error::{ErrorKind, NavError};
pub use host::{HostEntry, HostHistory, MemoryHistory, PopHandler};
pub use page::{Navigation, NavigationCause, Page, PageId, PageRegistry, PageSlot};
pub use restore::{CancelHandle, CancelToken, RestoreOutcome};
pub use stack::{BackStep, HistoryEntry, HistoryStack};
pub use surface::{HeadlessSurface, ScrollListener, Surface};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
