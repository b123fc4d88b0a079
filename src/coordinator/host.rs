//! Replay host - the coordinator's view of a tab's page context
//!
//! After a navigation the coordinator needs three things from the embedder:
//! a liveness probe for the replay machinery, reinjection when it is absent,
//! and a way to start the engine at an index. `ReplayHost` is that seam;
//! `PageHost` implements it over the in-process page model and doubles as
//! the reference embedder for tests and the CLI.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::core::config::ReplayConfig;
use crate::core::error::{RefillError, Result};
use crate::core::types::{ReplaySignal, Step, TabId};
use crate::dom::Page;
use crate::replay::ReplayEngine;

/// The page-context surface the coordinator drives after navigations
#[async_trait]
pub trait ReplayHost: Send + Sync {
    /// Whether the replay machinery is present in the tab's current page
    async fn probe(&self, tab: TabId) -> bool;

    /// Install the replay machinery into the tab's current page
    async fn inject(&self, tab: TabId) -> Result<()>;

    /// Run the engine in the tab's current page from `start_index`
    async fn resume(&self, tab: TabId, steps: Vec<Step>, start_index: usize) -> Result<()>;
}

struct TabContext {
    page: Arc<Page>,
    engine_ready: bool,
    running: Option<JoinHandle<()>>,
}

/// In-process embedder: tabs, navigation, and engine execution over the
/// page model
pub struct PageHost {
    tabs: Mutex<HashMap<TabId, TabContext>>,
    config: ReplayConfig,
    signals: mpsc::UnboundedSender<ReplaySignal>,
}

impl PageHost {
    /// Create a host whose engines report on the given channel
    pub fn new(config: ReplayConfig, signals: mpsc::UnboundedSender<ReplaySignal>) -> Self {
        Self {
            tabs: Mutex::new(HashMap::new()),
            config,
            signals,
        }
    }

    /// Open a tab on an HTML page
    pub fn open_tab(&self, tab: TabId, html: &str, url: Url) -> Arc<Page> {
        let page = Arc::new(Page::from_html(html, url));
        self.tabs.lock().insert(
            tab,
            TabContext {
                page: Arc::clone(&page),
                engine_ready: false,
                running: None,
            },
        );
        page
    }

    /// Navigate a tab to a new page
    ///
    /// The old page's execution context is destroyed: a running replay pass
    /// is aborted mid-flight and the machinery must be probed and possibly
    /// reinjected before anything runs in the new page.
    pub fn navigate(&self, tab: TabId, html: &str, url: Url) -> Option<Arc<Page>> {
        let mut tabs = self.tabs.lock();
        let context = tabs.get_mut(&tab)?;
        if let Some(running) = context.running.take() {
            running.abort();
            debug!(tab, "running replay pass destroyed by navigation");
        }
        let page = Arc::new(Page::from_html(html, url));
        context.page = Arc::clone(&page);
        context.engine_ready = false;
        info!(tab, url = %page.url(), "navigated");
        Some(page)
    }

    /// The tab's current page
    pub fn page(&self, tab: TabId) -> Option<Arc<Page>> {
        self.tabs.lock().get(&tab).map(|c| Arc::clone(&c.page))
    }

    /// Begin a fresh replay in a tab, injecting the machinery if needed
    pub async fn start_replay(&self, tab: TabId, steps: Vec<Step>) -> Result<()> {
        if !self.probe(tab).await {
            self.inject(tab).await?;
        }
        self.resume(tab, steps, 0).await
    }
}

#[async_trait]
impl ReplayHost for PageHost {
    async fn probe(&self, tab: TabId) -> bool {
        self.tabs
            .lock()
            .get(&tab)
            .map(|c| c.engine_ready)
            .unwrap_or(false)
    }

    async fn inject(&self, tab: TabId) -> Result<()> {
        let mut tabs = self.tabs.lock();
        let context = tabs
            .get_mut(&tab)
            .ok_or_else(|| RefillError::host(format!("no such tab: {}", tab)))?;
        context.engine_ready = true;
        debug!(tab, "replay machinery injected");
        Ok(())
    }

    async fn resume(&self, tab: TabId, steps: Vec<Step>, start_index: usize) -> Result<()> {
        let mut tabs = self.tabs.lock();
        let context = tabs
            .get_mut(&tab)
            .ok_or_else(|| RefillError::host(format!("no such tab: {}", tab)))?;
        if !context.engine_ready {
            return Err(RefillError::host(format!(
                "replay machinery not present in tab {}",
                tab
            )));
        }

        let page = Arc::clone(&context.page);
        let engine = ReplayEngine::new(self.config.clone(), self.signals.clone());
        // The tab stays locked until the handle is stored so a navigation
        // racing this call cannot miss the running pass
        let handle = tokio::spawn(async move {
            engine.replay(&page, &steps, start_index).await;
        });
        context.running = Some(handle);
        Ok(())
    }
}
