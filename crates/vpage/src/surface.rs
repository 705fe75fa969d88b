//! Rendering Surface
//!
//! The single addressable region whose content is swapped on every
//! navigation, plus the document scroll offset. [`HeadlessSurface`] keeps
//! everything in memory and treats each `<img` tag as a pending image.

use crate::config::Config;
use smol::channel::{self, Sender};
use smol::future::{self, BoxedLocal, FutureExt};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback receiving document scroll offsets
pub type ScrollListener = Rc<dyn Fn(i64)>;

/// Rendering surface the binder writes pages into
pub trait Surface {
    /// Selector identifying the content container
    fn selector(&self) -> &str;

    /// Swap the content container for a fresh one holding `content`
    fn replace(&self, content: &str);

    /// Blank the content container
    fn clear(&self);

    /// Append an invisible marker element with the given id
    fn insert_marker(&self, id: &str);

    /// Remove a marker element
    fn remove_marker(&self, id: &str);

    /// Resolves once the marker with this id is attached
    fn marker_attached(&self, id: &str) -> BoxedLocal<()>;

    /// Resolves once every image in the content has finished loading
    fn images_loaded(&self) -> BoxedLocal<()>;

    /// Document scroll offset
    fn scroll_offset(&self) -> i64;

    /// Scroll the document
    fn set_scroll_offset(&self, offset: i64);

    /// Install or remove the document scroll listener
    fn set_scroll_listener(&self, listener: Option<ScrollListener>);
}

#[derive(Debug, Default)]
struct SurfaceState {
    content: String,
    pending_images: usize,
    markers: Vec<String>,
    held_markers: Vec<String>,
    hold_markers: bool,
    image_waiters: Vec<Sender<()>>,
    marker_waiters: Vec<(String, Sender<()>)>,
    scroll: i64,
    replacements: usize,
}

impl SurfaceState {
    fn notify_images(&mut self) {
        if self.pending_images == 0 {
            for tx in self.image_waiters.drain(..) {
                let _ = tx.try_send(());
            }
        }
    }

    fn attach_marker(&mut self, id: String) {
        self.marker_waiters.retain(|(waiting_for, tx)| {
            if *waiting_for == id {
                let _ = tx.try_send(());
                false
            } else {
                true
            }
        });
        self.markers.push(id);
    }
}

/// In-memory rendering surface
pub struct HeadlessSurface {
    selector: String,
    state: RefCell<SurfaceState>,
    listener: RefCell<Option<ScrollListener>>,
}

impl HeadlessSurface {
    /// Create an empty surface
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            state: RefCell::new(SurfaceState::default()),
            listener: RefCell::new(None),
        }
    }

    /// Create an empty surface addressed by the configured selector
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.selector.clone())
    }

    /// Current content
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Content wrapped in its addressable container
    pub fn html(&self) -> String {
        let state = self.state.borrow();
        format!(
            "<div id='{}'>{}</div>",
            self.selector.trim_start_matches('#'),
            state.content
        )
    }

    /// How many times the content was replaced or cleared
    pub fn replacements(&self) -> usize {
        self.state.borrow().replacements
    }

    /// Images still loading
    pub fn pending_images(&self) -> usize {
        self.state.borrow().pending_images
    }

    /// Finish loading one image
    pub fn complete_image(&self) {
        let mut state = self.state.borrow_mut();
        state.pending_images = state.pending_images.saturating_sub(1);
        state.notify_images();
    }

    /// Finish loading every image
    pub fn complete_images(&self) {
        let mut state = self.state.borrow_mut();
        state.pending_images = 0;
        state.notify_images();
    }

    /// Ids of attached markers
    pub fn markers(&self) -> Vec<String> {
        self.state.borrow().markers.clone()
    }

    /// While holding, inserted markers are not attached until [`Self::flush_markers`]
    pub fn hold_markers(&self, hold: bool) {
        self.state.borrow_mut().hold_markers = hold;
    }

    /// Attach every held marker
    pub fn flush_markers(&self) {
        let mut state = self.state.borrow_mut();
        let held = std::mem::take(&mut state.held_markers);
        for id in held {
            state.attach_marker(id);
        }
    }

    /// Is a scroll listener installed
    pub fn has_scroll_listener(&self) -> bool {
        self.listener.borrow().is_some()
    }

    /// Simulate the user scrolling the document
    pub fn scroll_to(&self, offset: i64) {
        self.state.borrow_mut().scroll = offset;

        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(offset);
        }
    }
}

impl Surface for HeadlessSurface {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn replace(&self, content: &str) {
        let mut state = self.state.borrow_mut();
        state.content = content.to_string();
        state.pending_images = content.matches("<img").count();
        state.markers.clear();
        state.held_markers.clear();
        state.marker_waiters.clear();
        state.replacements += 1;
        state.notify_images();
    }

    fn clear(&self) {
        self.replace("");
    }

    fn insert_marker(&self, id: &str) {
        let mut state = self.state.borrow_mut();
        if state.hold_markers {
            state.held_markers.push(id.to_string());
        } else {
            state.attach_marker(id.to_string());
        }
    }

    fn remove_marker(&self, id: &str) {
        let mut state = self.state.borrow_mut();
        state.markers.retain(|m| m != id);
        state.held_markers.retain(|m| m != id);
        state.marker_waiters.retain(|(waiting_for, _)| waiting_for != id);
    }

    fn marker_attached(&self, id: &str) -> BoxedLocal<()> {
        let mut state = self.state.borrow_mut();
        if state.markers.iter().any(|m| m == id) {
            return future::ready(()).boxed_local();
        }

        let (tx, rx) = channel::bounded(1);
        state.marker_waiters.push((id.to_string(), tx));
        wait_for(rx)
    }

    fn images_loaded(&self) -> BoxedLocal<()> {
        let mut state = self.state.borrow_mut();
        if state.pending_images == 0 {
            return future::ready(()).boxed_local();
        }

        let (tx, rx) = channel::bounded(1);
        state.image_waiters.push(tx);
        wait_for(rx)
    }

    fn scroll_offset(&self) -> i64 {
        self.state.borrow().scroll
    }

    fn set_scroll_offset(&self, offset: i64) {
        self.state.borrow_mut().scroll = offset;
    }

    fn set_scroll_listener(&self, listener: Option<ScrollListener>) {
        *self.listener.borrow_mut() = listener;
    }
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("selector", &self.selector)
            .field("state", &self.state.borrow())
            .field("has_scroll_listener", &self.has_scroll_listener())
            .finish()
    }
}

// A dropped sender means the signal will never come
fn wait_for(rx: channel::Receiver<()>) -> BoxedLocal<()> {
    async move {
        if rx.recv().await.is_err() {
            future::pending::<()>().await;
        }
    }
    .boxed_local()
}
