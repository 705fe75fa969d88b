//! Binder
//!
//! Owns the page registry, the history stack and the host history bridge,
//! and drives scroll restoration. A `Binder` is a cheap handle; clones share
//! the same state and every page render receives one explicitly.

use crate::config::Config;
use crate::error::NavError;
use crate::host::{HostHistory, PopHandler};
use crate::page::{Navigation, NavigationCause, Page, PageId, PageRegistry, PageSlot};
use crate::restore::{self, CancelHandle, RestoreOutcome};
use crate::stack::{BackStep, HistoryEntry, HistoryStack};
use crate::surface::Surface;
use serde::Serialize;
use serde_json::Value;
use smol::channel::{self, Receiver};
use smol::{LocalExecutor, Task};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

/// Result of going back one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
    /// Home was reached; the host was sent back past the app
    Exited,
    /// The binder navigated back to this page
    Navigated(PageId),
}

/// State handed to the host with every history frame
#[derive(Serialize)]
struct HostState<'a> {
    page: &'a str,
}

struct PendingRestore {
    _cancel: CancelHandle,
    done: Receiver<RestoreOutcome>,
}

#[derive(Default)]
struct State {
    registry: PageRegistry,
    stack: HistoryStack,
    home: Option<PageId>,
    current: Option<PageId>,
    host_state: Option<String>,
    pending: Option<PendingRestore>,
    generation: u64,
    last_restore: Option<RestoreOutcome>,
}

impl State {
    fn home(&self) -> Result<PageId, NavError> {
        self.home.clone().ok_or(NavError::NotInitialized)
    }

    fn home_title(&self) -> String {
        self.home
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .map(|slot| slot.title().to_string())
            .unwrap_or_default()
    }

    fn cancel_pending(&mut self) {
        // Dropping the handle cancels; the detached task still reports Cancelled
        self.pending = None;
    }
}

struct Shared {
    config: Config,
    surface: Rc<dyn Surface>,
    host: Rc<dyn HostHistory>,
    executor: Rc<LocalExecutor<'static>>,
    state: RefCell<State>,
}

/// Virtual page navigation engine
#[derive(Clone)]
pub struct Binder {
    shared: Rc<Shared>,
}

impl Binder {
    /// Create an uninitialized binder
    pub fn new(
        config: Config,
        surface: Rc<dyn Surface>,
        host: Rc<dyn HostHistory>,
        executor: Rc<LocalExecutor<'static>>,
    ) -> Self {
        if surface.selector() != config.selector {
            tracing::warn!(
                "Surface selector '{}' does not match configured selector '{}'",
                surface.selector(),
                config.selector
            );
        }

        Self {
            shared: Rc::new(Shared {
                config,
                surface,
                host,
                executor,
                state: RefCell::new(State::default()),
            }),
        }
    }

    /// Set the home page, seed history with it and hook up the host's back button.
    ///
    /// Calling it again re-seeds all navigation state.
    pub fn init<P: Page + 'static>(&self, home: P) -> Result<(), NavError> {
        let home: Rc<dyn Page> = Rc::new(home);
        let id = home.id().to_string();
        if id.trim().is_empty() {
            return Err(NavError::BlankPageId);
        }
        let title = home.title().to_string();
        let host_state = serde_json::to_string(&HostState { page: &id })?;

        {
            let mut state = self.shared.state.borrow_mut();
            state.registry.insert(home)?;
            state.stack.reset(HistoryEntry::new(id.clone(), None));
            state.home = Some(id.clone());
            state.current = Some(id.clone());
            state.host_state = Some(host_state.clone());
            state.cancel_pending();
        }

        self.shared
            .host
            .push_state(Some(&host_state), &title, &self.shared.config.home_url);
        self.shared.host.set_pop_handler(Some(self.pop_handler()));

        tracing::info!("Binder initialized with home page '{}'", id);
        Ok(())
    }

    fn pop_handler(&self) -> PopHandler {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                let binder = Binder { shared };
                if let Err(e) = binder.on_native_back() {
                    tracing::error!("Back navigation failed: {}", e);
                }
            }
        })
    }

    /// Handle the host's native back signal.
    ///
    /// The host frame that was just popped is pushed again so the host never
    /// runs out of frames while the app has pages to go back to.
    pub fn on_native_back(&self) -> Result<BackOutcome, NavError> {
        let (host_state, title) = {
            let state = self.shared.state.borrow();
            if state.home.is_none() {
                return Err(NavError::NotInitialized);
            }
            (state.host_state.clone(), state.home_title())
        };

        self.shared
            .host
            .push_state(host_state.as_deref(), &title, &self.shared.config.home_url);
        self.back_one_page()
    }

    /// Register a page, replacing any page with the same id
    pub fn add_page<P: Page + 'static>(&self, page: P) -> Result<(), NavError> {
        let slot = self.shared.state.borrow_mut().registry.insert(Rc::new(page))?;
        tracing::debug!("Page '{}' added", slot.id());
        Ok(())
    }

    /// Navigate forward to a registered page
    pub fn goto_page(&self, page_id: &str, data: Option<Value>) -> Result<(), NavError> {
        self.navigate(page_id, data, NavigationCause::Forward)
    }

    /// Go back one page.
    ///
    /// From the page right above home this leaves the app: the host is sent
    /// back two frames and nothing is pushed.
    pub fn back_one_page(&self) -> Result<BackOutcome, NavError> {
        let step = {
            let mut state = self.shared.state.borrow_mut();
            let home = state.home()?;
            state.stack.step_back(&home)
        };

        match step {
            BackStep::Exit => {
                tracing::info!("Back from the first page, leaving the app");
                self.shared.host.go(-2);
                Ok(BackOutcome::Exited)
            }
            BackStep::Restore(entry) => {
                self.navigate(&entry.page_id, entry.data, NavigationCause::Back)?;
                Ok(BackOutcome::Navigated(entry.page_id))
            }
        }
    }

    fn navigate(
        &self,
        page_id: &str,
        data: Option<Value>,
        cause: NavigationCause,
    ) -> Result<(), NavError> {
        let config = &self.shared.config;

        let (slot, navigation) = {
            let mut state = self.shared.state.borrow_mut();
            let home = state.home()?;
            if page_id.trim().is_empty() {
                return Err(NavError::BlankPageId);
            }
            let slot = state
                .registry
                .get(page_id)
                .cloned()
                .ok_or_else(|| NavError::PageNotFound(page_id.to_string()))?;

            if config.clear_page {
                self.shared.surface.clear();
            }

            self.shared.host.replace_state(
                state.host_state.as_deref(),
                &state.home_title(),
                &config.home_url,
            );

            state.stack.push(HistoryEntry::new(page_id, data.clone()), &home);
            tracing::debug!("History: {:?}", state.stack.page_ids());

            self.shared.surface.set_scroll_listener(None);
            state.cancel_pending();

            state.current = Some(page_id.to_string());

            if cause == NavigationCause::Forward {
                slot.reset_scroll();
            }

            let navigation = Navigation {
                page_id: page_id.to_string(),
                data,
                cause,
            };
            (slot, navigation)
        };

        tracing::info!("Showing page '{}' ({:?})", page_id, cause);
        slot.page()
            .render(self, &navigation)
            .map_err(|source| NavError::Render {
                page: page_id.to_string(),
                source,
            })
    }

    /// Swap the surface content for `content`
    pub fn replace(&self, content: &str) {
        self.shared.surface.replace(content);
    }

    /// Restore the current page's scroll offset once its content settles,
    /// then track its scrolling. Called by pages when their content is final.
    ///
    /// Any restoration still waiting is cancelled.
    pub fn update_scroll_position(&self) -> Result<(), NavError> {
        let mut state = self.shared.state.borrow_mut();
        let current = state.current.clone().ok_or(NavError::NotInitialized)?;
        let slot = state
            .registry
            .get(&current)
            .cloned()
            .ok_or(NavError::PageNotFound(current))?;

        state.cancel_pending();
        state.generation += 1;
        let generation = state.generation;

        let (cancel, token) = restore::cancel_pair();
        let restoring = restore::restore(
            self.shared.surface.clone(),
            slot,
            token,
            self.shared.config.restore_timeout,
        );

        let (done_tx, done) = channel::bounded(1);
        let weak = Rc::downgrade(&self.shared);
        self.shared
            .executor
            .spawn(async move {
                let outcome = restoring.await;
                if let Some(shared) = weak.upgrade() {
                    let mut state = shared.state.borrow_mut();
                    if state.generation == generation {
                        state.last_restore = Some(outcome.clone());
                    }
                }
                let _ = done_tx.try_send(outcome);
            })
            .detach();

        state.pending = Some(PendingRestore {
            _cancel: cancel,
            done,
        });
        Ok(())
    }

    /// Wait for the outstanding scroll restoration, if any.
    ///
    /// Each outcome is reported once. Dropping the returned future leaves
    /// the restoration running.
    pub async fn settle(&self) -> Option<RestoreOutcome> {
        let done = self
            .shared
            .state
            .borrow()
            .pending
            .as_ref()
            .map(|pending| pending.done.clone());

        match done {
            Some(done) => done.recv().await.ok(),
            None => None,
        }
    }

    /// Spawn page work on the binder's executor
    pub fn spawn<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> Task<T> {
        self.shared.executor.spawn(future)
    }

    /// Has `init` been called
    pub fn is_initialized(&self) -> bool {
        self.shared.state.borrow().home.is_some()
    }

    /// Id of the home page
    pub fn home_page(&self) -> Option<PageId> {
        self.shared.state.borrow().home.clone()
    }

    /// Id of the page currently shown
    pub fn current_page(&self) -> Option<PageId> {
        self.shared.state.borrow().current.clone()
    }

    /// Page ids in the history stack, root first
    pub fn history(&self) -> Vec<PageId> {
        self.shared.state.borrow().stack.page_ids()
    }

    /// Full history stack, root first
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.shared.state.borrow().stack.entries().to_vec()
    }

    /// Is a page registered under this id
    pub fn contains_page(&self, page_id: &str) -> bool {
        self.shared.state.borrow().registry.contains(page_id)
    }

    /// Number of registered pages
    pub fn page_count(&self) -> usize {
        self.shared.state.borrow().registry.len()
    }

    /// Remembered scroll offset of a page
    pub fn scroll_offset(&self, page_id: &str) -> Option<i64> {
        self.page_slot(page_id).map(|slot| slot.scroll_offset())
    }

    /// Registry slot of a page
    pub fn page_slot(&self, page_id: &str) -> Option<Rc<PageSlot>> {
        self.shared.state.borrow().registry.get(page_id).cloned()
    }

    /// Outcome of the most recent scroll restoration
    pub fn last_restore(&self) -> Option<RestoreOutcome> {
        self.shared.state.borrow().last_restore.clone()
    }

    /// Get binder configuration
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// The rendering surface
    pub fn surface(&self) -> &Rc<dyn Surface> {
        &self.shared.surface
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Binder")
            .field("selector", &self.shared.config.selector)
            .field("home", &state.home)
            .field("current", &state.current)
            .field("history", &state.stack.page_ids())
            .field("pages", &state.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHistory;
    use crate::surface::HeadlessSurface;
    use std::cell::Cell;

    struct Counter {
        id: &'static str,
        renders: Rc<Cell<usize>>,
    }

    impl Page for Counter {
        fn id(&self) -> &str {
            self.id
        }

        fn title(&self) -> &str {
            self.id
        }

        fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
            self.renders.set(self.renders.get() + 1);
            binder.replace(self.id);
            Ok(())
        }
    }

    fn binder() -> (Binder, Rc<MemoryHistory>) {
        let host = Rc::new(MemoryHistory::new("https://app.example/").unwrap());
        let binder = Binder::new(
            Config::default(),
            Rc::new(HeadlessSurface::new("#page")),
            host.clone(),
            Rc::new(LocalExecutor::new()),
        );
        (binder, host)
    }

    #[test]
    fn test_init_seeds_history() {
        let (binder, host) = binder();
        let renders = Rc::new(Cell::new(0));
        binder.init(Counter { id: "home", renders: renders.clone() }).unwrap();

        assert!(binder.is_initialized());
        assert_eq!(binder.history(), vec!["home"]);
        assert_eq!(binder.current_page().as_deref(), Some("home"));
        assert_eq!(renders.get(), 0);

        assert_eq!(host.length(), 2);
        assert_eq!(host.current().state.as_deref(), Some(r#"{"page":"home"}"#));
        assert_eq!(host.current().title, "home");
    }

    #[test]
    fn test_goto_before_init() {
        let (binder, _host) = binder();
        let err = binder.goto_page("home", None).unwrap_err();
        assert!(matches!(err, NavError::NotInitialized));
    }

    #[test]
    fn test_goto_renders_and_replaces_host_frame() {
        let (binder, host) = binder();
        let renders = Rc::new(Cell::new(0));
        binder.init(Counter { id: "home", renders: Rc::new(Cell::new(0)) }).unwrap();
        binder.add_page(Counter { id: "a", renders: renders.clone() }).unwrap();

        binder.goto_page("a", None).unwrap();
        assert_eq!(renders.get(), 1);
        assert_eq!(binder.history(), vec!["home", "a"]);
        assert_eq!(host.length(), 2);
        assert_eq!(binder.surface().scroll_offset(), 0);
    }

    #[test]
    fn test_clear_page_blanks_surface() {
        let surface = Rc::new(HeadlessSurface::new("#page"));
        let binder = Binder::new(
            Config::default().with_clear_page(true),
            surface.clone(),
            Rc::new(MemoryHistory::new("https://app.example/").unwrap()),
            Rc::new(LocalExecutor::new()),
        );
        binder.init(Counter { id: "home", renders: Rc::new(Cell::new(0)) }).unwrap();
        binder.goto_page("home", None).unwrap();

        // clear + replace from render
        assert_eq!(surface.replacements(), 2);
        assert_eq!(surface.content(), "home");
    }
}
