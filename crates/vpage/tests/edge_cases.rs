//! Edge case tests for vpage
//!
//! Error handling, restoration timeouts and cancellation, async pages.

use smol::future::FutureExt;
use smol::{LocalExecutor, Timer};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use vpage::*;

struct Static {
    id: &'static str,
    content: &'static str,
}

impl Page for Static {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.id
    }

    fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        binder.replace(self.content);
        binder.update_scroll_position()?;
        Ok(())
    }
}

fn page(id: &'static str) -> Static {
    Static { id, content: "<p>text</p>" }
}

struct Setup {
    binder: Binder,
    surface: Rc<HeadlessSurface>,
    executor: Rc<LocalExecutor<'static>>,
}

impl Setup {
    fn new(config: Config) -> Self {
        let surface = Rc::new(HeadlessSurface::from_config(&config));
        let executor = Rc::new(LocalExecutor::new());
        let binder = Binder::new(
            config,
            surface.clone(),
            Rc::new(MemoryHistory::new("https://app.example/").unwrap()),
            executor.clone(),
        );
        binder.init(page("home")).unwrap();
        Self { binder, surface, executor }
    }

    fn settle(&self) -> Option<RestoreOutcome> {
        smol::block_on(self.executor.run(self.binder.settle()))
    }

    fn run_for(&self, duration: Duration) {
        smol::block_on(self.executor.run(async {
            Timer::after(duration).await;
        }));
    }
}

// ============================================================================
// NAVIGATION ERRORS
// ============================================================================

#[test]
fn test_goto_blank_id() {
    let s = Setup::new(Config::default());
    s.binder.add_page(page("a")).unwrap();
    s.binder.goto_page("a", None).unwrap();

    for id in ["", "   ", "\t"] {
        let err = s.binder.goto_page(id, None).unwrap_err();
        assert!(matches!(err, NavError::BlankPageId));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    assert_eq!(s.binder.history(), vec!["home", "a"]);
    assert_eq!(s.binder.current_page().as_deref(), Some("a"));
}

#[test]
fn test_goto_unknown_page() {
    let s = Setup::new(Config::default());
    let err = s.binder.goto_page("nonexistent", None).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Lookup);
    assert_eq!(err.to_string(), "Page 'nonexistent' not found in binder");
    assert_eq!(s.binder.history(), vec!["home"]);
    assert_eq!(s.binder.current_page().as_deref(), Some("home"));
}

#[test]
fn test_add_blank_page() {
    let s = Setup::new(Config::default());
    let err = s.binder.add_page(page(" ")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(s.binder.page_count(), 1);
}

#[test]
fn test_init_blank_home() {
    let binder = Binder::new(
        Config::default(),
        Rc::new(HeadlessSurface::new("#page")),
        Rc::new(MemoryHistory::new("https://app.example/").unwrap()),
        Rc::new(LocalExecutor::new()),
    );
    assert!(matches!(binder.init(page("")), Err(NavError::BlankPageId)));
    assert!(!binder.is_initialized());
    assert!(matches!(binder.back_one_page(), Err(NavError::NotInitialized)));
    assert!(matches!(binder.update_scroll_position(), Err(NavError::NotInitialized)));
}

struct Failing;

impl Page for Failing {
    fn id(&self) -> &str {
        "failing"
    }

    fn title(&self) -> &str {
        "Failing"
    }

    fn render(&self, _binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        anyhow::bail!("template missing")
    }
}

#[test]
fn test_render_error() {
    let s = Setup::new(Config::default());
    s.binder.add_page(Failing).unwrap();

    let err = s.binder.goto_page("failing", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.to_string(), "Page 'failing' failed to render: template missing");
    assert_eq!(s.binder.current_page().as_deref(), Some("failing"));
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn test_duplicate_page_replaces() {
    let s = Setup::new(Config::default());
    s.binder.add_page(Static { id: "a", content: "old" }).unwrap();
    s.binder.add_page(Static { id: "a", content: "new" }).unwrap();
    assert_eq!(s.binder.page_count(), 2);

    s.binder.goto_page("a", None).unwrap();
    assert_eq!(s.surface.content(), "new");
}

#[test]
fn test_reinit_reseeds() {
    let s = Setup::new(Config::default());
    s.binder.add_page(page("a")).unwrap();
    s.binder.goto_page("a", None).unwrap();

    s.binder.init(page("start")).unwrap();
    assert_eq!(s.binder.history(), vec!["start"]);
    assert_eq!(s.binder.home_page().as_deref(), Some("start"));
    assert!(s.binder.contains_page("a"));
}

struct Redirect;

impl Page for Redirect {
    fn id(&self) -> &str {
        "redirect"
    }

    fn title(&self) -> &str {
        "Redirect"
    }

    fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        binder.goto_page("a", None)?;
        Ok(())
    }
}

#[test]
fn test_render_can_navigate() {
    let s = Setup::new(Config::default());
    s.binder.add_page(page("a")).unwrap();
    s.binder.add_page(Redirect).unwrap();

    s.binder.goto_page("redirect", None).unwrap();
    assert_eq!(s.binder.history(), vec!["home", "redirect", "a"]);
    assert_eq!(s.binder.current_page().as_deref(), Some("a"));
}

// ============================================================================
// SCROLL RESTORATION
// ============================================================================

#[test]
fn test_restoration_times_out() {
    let s = Setup::new(Config::default().with_restore_timeout(Duration::from_millis(30)));
    s.binder
        .add_page(Static { id: "gallery", content: "<img src='never.png'>" })
        .unwrap();

    s.binder.goto_page("gallery", None).unwrap();
    let outcome = s.settle();

    assert_eq!(outcome, Some(RestoreOutcome::TimedOut { page_id: "gallery".into() }));
    assert_eq!(s.binder.last_restore(), outcome);
    assert!(s.surface.markers().is_empty());

    // Tracking still starts so later scrolls are remembered
    s.surface.scroll_to(40);
    assert_eq!(s.binder.scroll_offset("gallery"), Some(40));
}

#[test]
fn test_restoration_waits_for_marker() {
    let s = Setup::new(Config::default());
    s.binder.add_page(page("a")).unwrap();
    s.surface.hold_markers(true);

    s.binder.goto_page("a", None).unwrap();
    s.run_for(Duration::from_millis(20));
    assert_eq!(s.binder.last_restore(), None);
    assert!(!s.surface.has_scroll_listener());

    s.surface.flush_markers();
    assert!(s.settle().unwrap().is_applied());
    assert!(s.surface.has_scroll_listener());
}

#[test]
fn test_stale_restoration_never_applies() {
    let s = Setup::new(Config::default());
    s.binder
        .add_page(Static { id: "gallery", content: "<img src='a.png'>" })
        .unwrap();
    s.binder.add_page(page("a")).unwrap();
    s.binder.add_page(page("b")).unwrap();

    // Give the gallery a remembered offset
    s.binder.goto_page("gallery", None).unwrap();
    s.surface.complete_images();
    s.settle();
    s.surface.scroll_to(300);
    s.binder.goto_page("b", None).unwrap();
    s.settle();

    // Back to the gallery, then leave before its images load
    s.binder.back_one_page().unwrap();
    assert_eq!(s.surface.pending_images(), 1);
    s.binder.goto_page("a", None).unwrap();
    s.surface.complete_images();

    assert_eq!(
        s.settle(),
        Some(RestoreOutcome::Applied { page_id: "a".into(), offset: 0 })
    );
    s.run_for(Duration::from_millis(20));

    assert_eq!(s.surface.scroll_offset(), 0);
    assert_eq!(s.binder.scroll_offset("gallery"), Some(300));
    assert_eq!(
        s.binder.last_restore(),
        Some(RestoreOutcome::Applied { page_id: "a".into(), offset: 0 })
    );
}

#[test]
fn test_superseded_restoration_not_recorded() {
    let s = Setup::new(Config::default());
    s.binder
        .add_page(Static { id: "gallery", content: "<img src='a.png'>" })
        .unwrap();
    s.binder.add_page(page("b")).unwrap();

    s.binder.goto_page("gallery", None).unwrap();
    // A new restoration for the same page replaces the first one
    s.binder.update_scroll_position().unwrap();
    s.run_for(Duration::from_millis(20));
    assert_eq!(s.binder.last_restore(), None);

    s.surface.complete_images();
    assert!(s.settle().unwrap().is_applied());
}

#[test]
fn test_restoration_survives_abandoned_settle() {
    let s = Setup::new(Config::default());
    s.binder
        .add_page(Static { id: "gallery", content: "<img src='a.png'>" })
        .unwrap();
    s.binder.goto_page("gallery", None).unwrap();

    let bounded = smol::block_on(s.executor.run(s.binder.settle().or(async {
        Timer::after(Duration::from_millis(10)).await;
        None
    })));
    assert_eq!(bounded, None);

    s.surface.complete_images();
    s.run_for(Duration::from_millis(50));

    let applied = RestoreOutcome::Applied { page_id: "gallery".into(), offset: 0 };
    assert_eq!(s.binder.last_restore(), Some(applied.clone()));
    assert!(s.surface.has_scroll_listener());

    s.surface.scroll_to(77);
    assert_eq!(s.binder.scroll_offset("gallery"), Some(77));

    // The outcome is still reported once
    assert_eq!(s.settle(), Some(applied));
    assert_eq!(s.settle(), None);
}

#[test]
fn test_settle_without_restoration() {
    let s = Setup::new(Config::default());
    assert_eq!(s.settle(), None);
}

// ============================================================================
// ASYNC PAGES
// ============================================================================

struct Remote {
    loaded: Rc<Cell<bool>>,
}

impl Page for Remote {
    fn id(&self) -> &str {
        "remote"
    }

    fn title(&self) -> &str {
        "Remote"
    }

    fn render(&self, binder: &Binder, _navigation: &Navigation) -> anyhow::Result<()> {
        let handle = binder.clone();
        let loaded = self.loaded.clone();
        binder
            .spawn(async move {
                Timer::after(Duration::from_millis(10)).await;
                handle.replace("<p>remote data</p>");
                loaded.set(true);
                if let Err(e) = handle.update_scroll_position() {
                    tracing::error!("{}", e);
                }
            })
            .detach();
        Ok(())
    }
}

#[test]
fn test_async_render() {
    let s = Setup::new(Config::default());
    let loaded = Rc::new(Cell::new(false));
    s.binder.add_page(Remote { loaded: loaded.clone() }).unwrap();

    s.binder.goto_page("remote", None).unwrap();
    assert!(!loaded.get());
    assert_eq!(s.settle(), None);

    s.run_for(Duration::from_millis(50));
    assert!(loaded.get());
    assert_eq!(s.surface.content(), "<p>remote data</p>");
    assert_eq!(
        s.settle(),
        Some(RestoreOutcome::Applied { page_id: "remote".into(), offset: 0 })
    );
}
