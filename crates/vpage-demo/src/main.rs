//! vpage Demo - Headless walkthrough of the three-page application

mod pages;

use pages::{HomePage, SecondPage, template_source};
use serde_json::json;
use smol::{LocalExecutor, Timer};
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vpage::{Binder, Config, HeadlessSurface, MemoryHistory, Surface};
use vpage_templates::TemplateCache;

struct Demo {
    executor: Rc<LocalExecutor<'static>>,
    surface: Rc<HeadlessSurface>,
    host: Rc<MemoryHistory>,
    binder: Binder,
}

impl Demo {
    /// Let background work run for a while
    fn run_for(&self, duration: Duration) {
        smol::block_on(self.executor.run(Timer::after(duration)));
    }

    /// Wait for the pending scroll restoration and report it
    fn settle(&self) {
        if let Some(outcome) = smol::block_on(self.executor.run(self.binder.settle())) {
            tracing::info!("Restoration: {:?}", outcome);
        }
    }

    fn report(&self) {
        tracing::info!(
            "Current page: {:?}, history: {:?}, host frame {}/{}",
            self.binder.current_page(),
            self.binder.history(),
            self.host.index() + 1,
            self.host.length()
        );
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting vpage demo {}...", vpage::VERSION);

    // Parse command line for the app's base URL
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080/".to_string());

    let executor = Rc::new(LocalExecutor::new());
    let surface = Rc::new(HeadlessSurface::new("#page"));
    let host = Rc::new(MemoryHistory::new(&base_url)?);
    let binder = Binder::new(
        Config::default(),
        surface.clone(),
        host.clone(),
        executor.clone(),
    );
    let demo = Demo {
        executor,
        surface,
        host,
        binder,
    };
    let binder = &demo.binder;

    let templates = Rc::new(TemplateCache::new(template_source()));
    binder.init(HomePage::new(binder, templates.clone()))?;
    binder.add_page(SecondPage::new(binder, templates.clone()))?;
    demo.run_for(Duration::from_millis(10));
    tracing::info!("{} templates preloaded", templates.len());

    binder.goto_page("homePage", None)?;
    demo.report();

    binder.goto_page("secondPage", Some(json!({ "callingPage": "homePage" })))?;
    demo.settle();
    demo.report();

    // The third page renders once its data request completes
    binder.goto_page("thirdPage", None)?;
    demo.run_for(Duration::from_millis(100));
    demo.surface.complete_images();
    demo.settle();
    demo.surface.scroll_to(240);
    demo.report();

    binder.goto_page("secondPage", Some(json!({ "callingPage": "thirdPage" })))?;
    demo.settle();
    demo.surface.scroll_to(90);
    tracing::info!(
        "Scroll offsets: second={:?}, third={:?}",
        binder.scroll_offset("secondPage"),
        binder.scroll_offset("thirdPage")
    );

    binder.goto_page("thirdPage", None)?;
    demo.run_for(Duration::from_millis(100));
    demo.surface.complete_images();
    demo.settle();
    demo.report();

    // Native back button until the app is left
    loop {
        demo.host.back();
        if demo.host.has_left() {
            tracing::info!("Left the app");
            break;
        }
        demo.run_for(Duration::from_millis(100));
        demo.surface.complete_images();
        demo.settle();
        tracing::info!("Back, scroll offset {}", demo.surface.scroll_offset());
        demo.report();
    }

    demo.report();
    println!("{}", demo.surface.html());
    Ok(())
}
