//! Scroll Restoration
//!
//! Waits until a page's content is attached and its images are loaded,
//! then scrolls the document back to the page's remembered offset and
//! starts tracking scroll changes. The wait is bounded by a timeout and
//! can be cancelled by a newer navigation.

use crate::page::{PageId, PageSlot};
use crate::surface::Surface;
use smol::Timer;
use smol::channel::{self, Receiver, Sender};
use smol::future::{self, FutureExt};
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static MARKER_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique id for a readiness marker
pub fn next_marker_id() -> String {
    format!("vpage-ready-{}", MARKER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Cancels its paired [`CancelToken`] when cancelled or dropped
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
}

impl CancelHandle {
    /// Cancel the paired token
    pub fn cancel(self) {}
}

/// Observes cancellation of a restoration
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    /// Has the paired handle been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.rx.is_closed()
    }

    /// Resolves once cancelled
    pub async fn cancelled(&self) {
        // Nothing is ever sent, recv only returns once the handle is gone
        let _ = self.rx.recv().await;
    }
}

/// Create a fresh handle/token pair
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = channel::bounded(1);
    (CancelHandle { _tx: tx }, CancelToken { rx })
}

/// How a restoration ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Content settled and the offset was applied
    Applied { page_id: PageId, offset: i64 },
    /// Content did not settle in time; offset skipped, tracking started
    TimedOut { page_id: PageId },
    /// A newer navigation superseded this restoration
    Cancelled { page_id: PageId },
}

impl RestoreOutcome {
    /// Page the restoration was for
    pub fn page_id(&self) -> &str {
        match self {
            RestoreOutcome::Applied { page_id, .. }
            | RestoreOutcome::TimedOut { page_id }
            | RestoreOutcome::Cancelled { page_id } => page_id,
        }
    }

    /// Was the offset applied
    pub fn is_applied(&self) -> bool {
        matches!(self, RestoreOutcome::Applied { .. })
    }
}

enum Wait {
    Ready,
    TimedOut,
    Cancelled,
}

/// Start restoring the scroll offset of `slot`.
///
/// The target offset is read and the marker inserted immediately; the
/// returned future does the waiting.
pub fn restore(
    surface: Rc<dyn Surface>,
    slot: Rc<PageSlot>,
    token: CancelToken,
    timeout: Duration,
) -> impl Future<Output = RestoreOutcome> {
    let target = slot.scroll_offset();
    let images = surface.images_loaded();
    let marker = next_marker_id();
    surface.insert_marker(&marker);
    let attached = surface.marker_attached(&marker);

    tracing::debug!(
        "Restoring '{}' to offset {} (marker {})",
        slot.id(),
        target,
        marker
    );

    async move {
        let page_id = slot.id().to_string();

        let ready = async {
            future::zip(images, attached).await;
            Wait::Ready
        };
        let cancelled = async {
            token.cancelled().await;
            Wait::Cancelled
        };
        let expired = async {
            Timer::after(timeout).await;
            Wait::TimedOut
        };
        let wait = ready.or(cancelled).or(expired).await;

        surface.remove_marker(&marker);

        if token.is_cancelled() {
            tracing::debug!("Scroll restoration for '{}' cancelled", page_id);
            return RestoreOutcome::Cancelled { page_id };
        }

        match wait {
            Wait::Ready => {
                surface.set_scroll_offset(target);
                track_scroll(&*surface, slot);
                tracing::debug!("Scroll restored for '{}' at {}", page_id, target);
                RestoreOutcome::Applied { page_id, offset: target }
            }
            Wait::TimedOut => {
                tracing::warn!(
                    "Content of '{}' did not settle within {:?}, scroll restoration skipped",
                    page_id,
                    timeout
                );
                track_scroll(&*surface, slot);
                RestoreOutcome::TimedOut { page_id }
            }
            Wait::Cancelled => RestoreOutcome::Cancelled { page_id },
        }
    }
}

/// Forward document scroll offsets to the page slot
pub fn track_scroll(surface: &dyn Surface, slot: Rc<PageSlot>) {
    surface.set_scroll_listener(Some(Rc::new(move |offset| slot.on_scroll(offset))));
}
