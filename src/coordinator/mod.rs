//! Replay coordinator - tracking one replay across page navigations
//!
//! The coordinator lives above any single page context. It opens a session
//! when a replay starts, follows progress signals, and on every navigation
//! in the session's tab decides between aborting (the page left the origin
//! host), finishing (every step already completed), or resuming the engine
//! in the new page at `last_completed_index + 1`.

pub mod host;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::CoordinatorConfig;
use crate::core::types::{ReplayReport, ReplaySignal, Step, TabId};

pub use host::{PageHost, ReplayHost};
pub use session::ReplaySession;

/// Two-state machine: no session, or one active session
pub struct Coordinator {
    host: Arc<dyn ReplayHost>,
    settle_delay: Duration,
    session: Option<ReplaySession>,
}

impl Coordinator {
    /// Create a coordinator over a replay host
    pub fn new(host: Arc<dyn ReplayHost>, config: &CoordinatorConfig) -> Self {
        Self {
            host,
            settle_delay: config.settle_delay(),
            session: None,
        }
    }

    /// Whether a replay session is in flight
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&ReplaySession> {
        self.session.as_ref()
    }

    /// A replay began in `tab` on the page at `url`
    pub fn handle_started(&mut self, tab: TabId, steps: Vec<Step>, url: &Url) {
        if self.session.is_some() {
            warn!("replay started while a session was still active; replacing it");
        }
        let origin = url.host_str().unwrap_or_default().to_string();
        info!(tab, origin = %origin, steps = steps.len(), "replay session opened");
        self.session = Some(ReplaySession::new(tab, steps, origin));
    }

    /// The engine reported progress through the sequence
    pub fn handle_progress(&mut self, last_completed_index: usize) {
        if let Some(session) = self.session.as_mut() {
            session.last_completed_index = Some(last_completed_index);
            debug!(last_completed_index, "progress recorded");
        }
    }

    /// A navigation committed in some tab
    ///
    /// Returns the final report when this terminates the session (cross-host
    /// abort, or the sequence was already complete); `None` when the session
    /// continues, was discarded, or no session is affected.
    pub async fn handle_navigated(&mut self, tab: TabId, url: &Url) -> Option<ReplayReport> {
        let new_host = url.host_str().unwrap_or_default().to_string();
        let (same_origin, complete, resume_index, steps) = {
            let session = self.session.as_ref()?;
            if session.tab != tab {
                return None;
            }
            (
                session.origin_host == new_host,
                session.is_complete(),
                session.resume_index(),
                session.steps.clone(),
            )
        };

        if !same_origin {
            let mut session = self.session.take()?;
            session.partial.aborted = true;
            session.partial.warn(format!(
                "replay aborted: page navigated from {} to {}",
                session.origin_host, new_host
            ));
            warn!(tab, from = %session.origin_host, to = %new_host, "cross-origin navigation, replay aborted");
            return Some(session.partial);
        }

        if complete {
            let session = self.session.take()?;
            info!(tab, "sequence already complete at navigation");
            return Some(session.partial);
        }

        // Let the new page settle before looking for the machinery
        tokio::time::sleep(self.settle_delay).await;

        if !self.host.probe(tab).await {
            debug!(tab, "replay machinery missing after navigation, reinjecting");
            if let Err(e) = self.host.inject(tab).await {
                warn!(tab, error = %e, "reinjection failed, discarding session");
                self.session = None;
                return None;
            }
        }

        info!(tab, resume_index, "resuming replay in new page");
        if let Err(e) = self.host.resume(tab, steps, resume_index).await {
            warn!(tab, error = %e, "resume failed, discarding session");
            self.session = None;
        }
        None
    }

    /// A page-context pass finished with a partial report
    ///
    /// Merges into the session's accumulated report and closes the session.
    /// A finish with no active session still yields its report, just not
    /// merged into stale state.
    pub fn handle_finished(&mut self, report: ReplayReport) -> ReplayReport {
        match self.session.take() {
            Some(mut session) => {
                session.partial.merge(report);
                info!(summary = %session.partial.summary(), "replay session closed");
                session.partial
            }
            None => report,
        }
    }

    /// Typed dispatch for embedders pumping the engine's signal channel
    pub async fn handle_signal(
        &mut self,
        tab: TabId,
        url: &Url,
        signal: ReplaySignal,
    ) -> Option<ReplayReport> {
        match signal {
            ReplaySignal::Started { steps } => {
                self.handle_started(tab, steps, url);
                None
            }
            ReplaySignal::Progress {
                last_completed_index,
            } => {
                self.handle_progress(last_completed_index);
                None
            }
            ReplaySignal::Finished { report } => Some(self.handle_finished(report)),
        }
    }
}
