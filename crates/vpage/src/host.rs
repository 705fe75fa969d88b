//! Host History Bridge
//!
//! The binder keeps its own history stack and only uses the host's
//! navigation history (the browser's `window.history`) as a trigger for
//! back-button presses. [`MemoryHistory`] is an in-memory host for headless
//! use and tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use url::Url;

/// Callback for native "navigate back" signals
pub type PopHandler = Rc<dyn Fn()>;

/// Host navigation history
pub trait HostHistory {
    /// Push a new frame
    fn push_state(&self, state: Option<&str>, title: &str, url: &str);

    /// Replace the current frame without adding one
    fn replace_state(&self, state: Option<&str>, title: &str, url: &str);

    /// Move through host frames by `delta`
    fn go(&self, delta: i32);

    /// Install the handler called whenever the host pops a frame
    fn set_pop_handler(&self, handler: Option<PopHandler>);
}

/// Host history frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub url: String,
    pub title: String,
    pub state: Option<String>,
}

#[derive(Debug)]
struct Frames {
    entries: Vec<HostEntry>,
    current: usize,
    left: bool,
}

/// In-memory host history
pub struct MemoryHistory {
    base: Url,
    frames: RefCell<Frames>,
    pop_handler: RefCell<Option<PopHandler>>,
}

impl MemoryHistory {
    /// Create history with the document's initial URL as the only frame
    pub fn new(initial_url: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(initial_url)?;
        Ok(Self {
            frames: RefCell::new(Frames {
                entries: vec![HostEntry {
                    url: base.to_string(),
                    title: String::new(),
                    state: None,
                }],
                current: 0,
                left: false,
            }),
            base,
            pop_handler: RefCell::new(None),
        })
    }

    /// Simulate the user pressing the back button
    pub fn back(&self) {
        self.go(-1);
    }

    /// Simulate the user pressing the forward button
    pub fn forward(&self) {
        self.go(1);
    }

    /// Get current frame
    pub fn current(&self) -> HostEntry {
        let frames = self.frames.borrow();
        frames.entries[frames.current].clone()
    }

    /// Current frame index
    pub fn index(&self) -> usize {
        self.frames.borrow().current
    }

    /// Get history length
    pub fn length(&self) -> usize {
        self.frames.borrow().entries.len()
    }

    /// True once navigation went back past the first frame, leaving the app
    pub fn has_left(&self) -> bool {
        self.frames.borrow().left
    }

    fn resolve(&self, url: &str) -> String {
        match self.base.join(url) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                tracing::debug!("Keeping unresolvable history URL '{}': {}", url, e);
                url.to_string()
            }
        }
    }
}

impl HostHistory for MemoryHistory {
    fn push_state(&self, state: Option<&str>, title: &str, url: &str) {
        let entry = HostEntry {
            url: self.resolve(url),
            title: title.to_string(),
            state: state.map(str::to_string),
        };

        let mut frames = self.frames.borrow_mut();
        // Remove forward history
        let keep = frames.current + 1;
        frames.entries.truncate(keep);
        frames.entries.push(entry);
        frames.current = frames.entries.len() - 1;
    }

    fn replace_state(&self, state: Option<&str>, title: &str, url: &str) {
        let url = self.resolve(url);
        let mut frames = self.frames.borrow_mut();
        let current = frames.current;
        if let Some(entry) = frames.entries.get_mut(current) {
            entry.url = url;
            entry.title = title.to_string();
            entry.state = state.map(str::to_string);
        }
    }

    fn go(&self, delta: i32) {
        if delta == 0 {
            return;
        }

        {
            let mut frames = self.frames.borrow_mut();
            let target = frames.current as i64 + i64::from(delta);
            if target < 0 {
                tracing::debug!("Host history went {} frames back, leaving the app", -delta);
                frames.left = true;
                return;
            }
            let Ok(target) = usize::try_from(target) else {
                return;
            };
            if target >= frames.entries.len() {
                return;
            }
            frames.current = target;
        }

        // The handler may push frames, so no borrow is held while it runs
        let handler = self.pop_handler.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    fn set_pop_handler(&self, handler: Option<PopHandler>) {
        *self.pop_handler.borrow_mut() = handler;
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("base", &self.base.as_str())
            .field("frames", &self.frames.borrow())
            .field("has_pop_handler", &self.pop_handler.borrow().is_some())
            .finish()
    }
}
