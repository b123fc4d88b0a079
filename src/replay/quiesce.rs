//! DOM quiescence wait
//!
//! "The page settled" is modeled as a quiet window with no mutation notices.
//! Every observed mutation restarts the window, so the wait tracks reactive
//! re-renders without hardcoded sleeps, and costs exactly one window when
//! nothing mutates at all.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

use crate::dom::Page;

/// Resolve once no mutation has been observed for `window`
///
/// The mutation receiver is dropped on return, disconnecting the observer on
/// every exit path.
pub async fn wait_for_quiet(page: &Page, window: Duration) {
    let mut mutations = page.subscribe_mutations();
    loop {
        match timeout(window, mutations.recv()).await {
            // A mutation (or a burst we lagged behind) restarts the window
            Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
            Ok(Err(RecvError::Closed)) => return,
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;
    use url::Url;

    fn page() -> Arc<Page> {
        Arc::new(Page::new(Url::parse("https://forms.example/").unwrap()))
    }

    #[tokio::test]
    async fn test_quiet_page_waits_one_window() {
        let page = page();
        let started = Instant::now();
        wait_for_quiet(&page, Duration::from_millis(50)).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_mutations_stretch_the_wait() {
        let page = page();
        let mutator = {
            let page = Arc::clone(&page);
            tokio::spawn(async move {
                for _ in 0..3 {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    let mut doc = page.doc();
                    let body = doc.body();
                    doc.append_element(body, "div", &[]);
                }
            })
        };

        let started = Instant::now();
        wait_for_quiet(&page, Duration::from_millis(50)).await;
        // Three mutations at ~30ms spacing keep resetting the 50ms window
        assert!(started.elapsed() >= Duration::from_millis(120));
        mutator.await.unwrap();
    }
}
