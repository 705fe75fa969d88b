//! Page Contract
//!
//! Pages are the navigable units of an app. The binder owns them through
//! a registry of [`PageSlot`]s, which also remember each page's scroll offset.

use crate::Binder;
use crate::error::NavError;
use serde_json::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Page identifier, also the page's logical location
pub type PageId = String;

/// Why a navigation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationCause {
    /// Regular navigation initiated by the app
    #[default]
    Forward,
    /// Navigation produced by going back one page
    Back,
}

/// A single navigation handed to [`Page::render`]
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    /// Target page
    pub page_id: PageId,
    /// Payload supplied by the caller of `goto_page`
    pub data: Option<Value>,
    /// Forward or back
    pub cause: NavigationCause,
}

impl Navigation {
    /// Create a forward navigation
    pub fn forward(page_id: impl Into<PageId>, data: Option<Value>) -> Self {
        Self {
            page_id: page_id.into(),
            data,
            cause: NavigationCause::Forward,
        }
    }

    /// True when the back button caused this navigation
    pub fn is_back(&self) -> bool {
        self.cause == NavigationCause::Back
    }

    /// Look up a field of the payload
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// A virtual page.
///
/// `render` produces the page's content. It should call [`Binder::replace`]
/// with the content and, once everything is written (possibly after its own
/// async work), [`Binder::update_scroll_position`].
pub trait Page {
    /// Unique page id
    fn id(&self) -> &str;

    /// Human readable title
    fn title(&self) -> &str;

    /// Build and show the page content
    fn render(&self, binder: &Binder, navigation: &Navigation) -> anyhow::Result<()>;

    /// Notified after the page's scroll offset changed
    fn on_scroll(&self, _offset: i64) {}
}

impl<P: Page + ?Sized> Page for Rc<P> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn title(&self) -> &str {
        (**self).title()
    }

    fn render(&self, binder: &Binder, navigation: &Navigation) -> anyhow::Result<()> {
        (**self).render(binder, navigation)
    }

    fn on_scroll(&self, offset: i64) {
        (**self).on_scroll(offset)
    }
}

/// A registered page together with its remembered scroll offset
pub struct PageSlot {
    page: Rc<dyn Page>,
    scroll_offset: Cell<i64>,
}

impl PageSlot {
    /// Wrap a page with a zero scroll offset
    pub fn new(page: Rc<dyn Page>) -> Self {
        Self {
            page,
            scroll_offset: Cell::new(0),
        }
    }

    /// The page
    pub fn page(&self) -> &Rc<dyn Page> {
        &self.page
    }

    /// Page id
    pub fn id(&self) -> &str {
        self.page.id()
    }

    /// Page title
    pub fn title(&self) -> &str {
        self.page.title()
    }

    /// Last known scroll offset
    pub fn scroll_offset(&self) -> i64 {
        self.scroll_offset.get()
    }

    /// Record a new scroll offset
    pub fn on_scroll(&self, offset: i64) {
        self.scroll_offset.set(offset);
        self.page.on_scroll(offset);
    }

    pub(crate) fn reset_scroll(&self) {
        self.scroll_offset.set(0);
    }
}

impl fmt::Debug for PageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSlot")
            .field("id", &self.id())
            .field("title", &self.title())
            .field("scroll_offset", &self.scroll_offset.get())
            .finish()
    }
}

/// Page id -> page
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: HashMap<PageId, Rc<PageSlot>>,
}

impl PageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page, replacing any page with the same id
    pub fn insert(&mut self, page: Rc<dyn Page>) -> Result<Rc<PageSlot>, NavError> {
        let id = page.id();
        if id.trim().is_empty() {
            return Err(NavError::BlankPageId);
        }

        let id = id.to_string();
        let slot = Rc::new(PageSlot::new(page));
        if self.pages.insert(id.clone(), slot.clone()).is_some() {
            tracing::debug!("Page '{}' replaced in registry", id);
        }
        Ok(slot)
    }

    /// Get a page slot by id
    pub fn get(&self, id: &str) -> Option<&Rc<PageSlot>> {
        self.pages.get(id)
    }

    /// Is a page registered under this id
    pub fn contains(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }

    /// Number of registered pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Is the registry empty
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
