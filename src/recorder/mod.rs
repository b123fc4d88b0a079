//! Step recorder - turning user interactions into steps
//!
//! Two states: idle and recording. While recording, interaction events from
//! the page are converted into fill and click steps via the resolver.
//! Repeated edits to the same field collapse into one step (text inputs fire
//! an event per keystroke); clicks are always distinct. Newly appended steps
//! are published on a broadcast channel so the host UI can show live
//! progress.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use crate::core::error::{RefillError, Result};
use crate::core::types::{Step, StepAction};
use crate::dom::{Document, DomEvent, EventKind, NodeId, Page};
use crate::resolver::{self, describe};

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// Marker attribute on the embedder's recording indicator overlay; clicks
/// inside it are never recorded.
pub const INDICATOR_ATTR: &str = "data-refill-indicator";

/// External UI collaborator toggled with the recorder lifecycle
pub trait RecorderUi: Send + Sync {
    fn show(&self) {}
    fn hide(&self) {}
}

/// No-op indicator for headless embedders and tests
pub struct NullUi;

impl RecorderUi for NullUi {}

struct RecorderState {
    recording: bool,
    steps: Vec<Step>,
    next_order: u32,
}

/// Records user interactions on one page at a time
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
    live: broadcast::Sender<Step>,
    cancel: broadcast::Sender<()>,
    ui: Arc<dyn RecorderUi>,
}

impl Recorder {
    /// Create an idle recorder with no indicator UI
    pub fn new() -> Self {
        Self::with_ui(Arc::new(NullUi))
    }

    /// Create an idle recorder with an indicator collaborator
    pub fn with_ui(ui: Arc<dyn RecorderUi>) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        let (cancel, _) = broadcast::channel(1);
        Self {
            state: Arc::new(Mutex::new(RecorderState {
                recording: false,
                steps: Vec::new(),
                next_order: 1,
            })),
            live,
            cancel,
            ui,
        }
    }

    /// Whether a recording session is active
    pub fn is_recording(&self) -> bool {
        self.state.lock().recording
    }

    /// Start recording interactions on a page
    ///
    /// Resets the step buffer and order counter, shows the indicator, and
    /// spawns a listener on the page's interaction events. Errors if a
    /// session is already active.
    pub fn start(&self, page: Arc<Page>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.recording {
                return Err(RefillError::recorder("a recording session is already active"));
            }
            state.recording = true;
            state.steps.clear();
            state.next_order = 1;
        }
        self.ui.show();

        // Subscribe before returning so no gesture between start and the
        // listener task's first poll is lost.
        let mut events = page.subscribe_events();
        let mut cancel = self.cancel.subscribe();
        let state = Arc::clone(&self.state);
        let live = self.live.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.recv() => break,
                    event = events.recv() => match event {
                        Ok(event) => observe(&page, &state, &live, event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "recorder lagged behind interaction events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("recorder listener stopped");
        });

        info!("recording started");
        Ok(())
    }

    /// Stop recording and return the captured steps in order
    pub fn stop(&self) -> Vec<Step> {
        let _ = self.cancel.send(());
        self.ui.hide();
        let mut state = self.state.lock();
        state.recording = false;
        let steps = std::mem::take(&mut state.steps);
        info!(steps = steps.len(), "recording stopped");
        steps
    }

    /// Subscribe to live step captures
    ///
    /// Delivery is at-most-once; a lagging subscriber misses pings rather
    /// than stalling the recorder.
    pub fn subscribe_steps(&self) -> broadcast::Receiver<Step> {
        self.live.subscribe()
    }

    /// Live step captures as a stream
    pub fn step_stream(&self) -> impl futures::Stream<Item = Step> {
        BroadcastStream::new(self.live.subscribe()).filter_map(|res| async move { res.ok() })
    }

    /// Feed one interaction event through the capture logic
    ///
    /// The spawned listener calls this internally; embedders that pump their
    /// own event loop can call it directly.
    pub fn observe(&self, page: &Page, event: DomEvent) {
        observe(page, &self.state, &self.live, event);
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn observe(
    page: &Page,
    state: &Mutex<RecorderState>,
    live: &broadcast::Sender<Step>,
    event: DomEvent,
) {
    let doc = page.doc();
    match event.kind {
        EventKind::Input | EventKind::Change => capture_fill(&doc, state, live, event.target),
        EventKind::Click => capture_click(&doc, state, live, event.target),
    }
}

fn capture_fill(
    doc: &Document,
    state: &Mutex<RecorderState>,
    live: &broadcast::Sender<Step>,
    target: NodeId,
) {
    let el = doc.element(target);
    if !el.is_form_control() {
        return;
    }
    // Submit and button inputs are click targets, not fields
    if el.tag() == "input" && matches!(el.input_type().as_str(), "submit" | "button") {
        return;
    }

    let locator = resolver::resolve(doc, target);
    let mut state = state.lock();
    if !state.recording {
        return;
    }

    // Dedupe by selector: a field edited again updates its step in place,
    // keeping the original order number.
    if let Some(existing) = state
        .steps
        .iter_mut()
        .find(|s| s.action == StepAction::Fill && s.selector == locator.selector)
    {
        existing.value = Some(describe::field_value(doc, target));
        debug!(selector = %locator.selector, "fill step updated in place");
        return;
    }

    let order = state.next_order;
    state.next_order += 1;
    let step = Step {
        order,
        action: StepAction::Fill,
        selector: locator.selector,
        fragile: locator.fragile,
        kind: Some(describe::field_kind(doc, target)),
        value: Some(describe::field_value(doc, target)),
        label: describe::field_label(doc, target),
    };
    state.steps.push(step.clone());
    drop(state);

    debug!(order = step.order, selector = %step.selector, "fill step captured");
    let _ = live.send(step);
}

fn capture_click(
    doc: &Document,
    state: &Mutex<RecorderState>,
    live: &broadcast::Sender<Step>,
    target: NodeId,
) {
    if doc.within_attr(target, INDICATOR_ATTR) {
        return;
    }
    // Labels proxy clicks to their associated control
    if doc.closest(target, "label").is_some() {
        return;
    }

    let el = doc.element(target);
    let submit_like = el.tag() == "input" && matches!(el.input_type().as_str(), "submit" | "button");
    if el.is_form_control() && !submit_like {
        return;
    }
    let qualifies = submit_like
        || matches!(el.tag(), "button" | "a")
        || el.attr("role") == Some("button");
    if !qualifies {
        return;
    }

    let locator = resolver::resolve(doc, target);
    let label = describe::click_label(doc, target);
    let mut state = state.lock();
    if !state.recording {
        return;
    }

    let order = state.next_order;
    state.next_order += 1;
    let step = Step::click(order, locator.selector, locator.fragile, label);
    state.steps.push(step.clone());
    drop(state);

    debug!(order = step.order, selector = %step.selector, "click step captured");
    let _ = live.send(step);
}
