//! Cross-navigation replay integration tests
//!
//! Drives the coordinator, the in-process page host, and the engine through
//! a replay whose click step navigates the tab, and through a navigation
//! that leaves the origin host.

use std::sync::Arc;

use refill::coordinator::{Coordinator, PageHost, ReplayHost};
use refill::core::{
    CoordinatorConfig, FieldKind, ReplayConfig, ReplayReport, Step, TabId,
};
use refill::dom::{EventKind, Selector};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use url::Url;

const TAB: TabId = 1;

const PAGE_ONE: &str = r#"
<html><body>
  <form>
    <input id="name" type="text">
    <button id="go" type="submit">Continue</button>
  </form>
</body></html>
"#;

const PAGE_TWO: &str = r#"
<html><body>
  <form>
    <input id="email" type="text">
  </form>
</body></html>
"#;

fn fast_replay() -> ReplayConfig {
    // The element timeout doubles as the window in which a navigation can
    // abort the pass that triggered it; keep it generous
    ReplayConfig {
        element_timeout_ms: 2000,
        click_quiet_ms: 10,
        fill_quiet_ms: 10,
    }
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn steps() -> Vec<Step> {
    vec![
        Step::fill(1, "#name", false, FieldKind::Text, "Ada", "Name"),
        Step::click(2, "#go", false, "Continue"),
        Step::fill(3, "#email", false, FieldKind::Text, "ada@lovelace.dev", "Email"),
    ]
}

/// Spawn a task that emulates the browser: when the page's submit button is
/// clicked, navigate the tab and announce the new URL.
fn navigate_on_click(
    host: Arc<PageHost>,
    page: Arc<refill::dom::Page>,
    button: &str,
    next_html: &'static str,
    next_url: Url,
    nav_tx: mpsc::UnboundedSender<Url>,
) {
    let button = page
        .query_first(&Selector::parse(button).unwrap())
        .expect("button present");
    let mut events = page.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event.kind == EventKind::Click && event.target == button {
                host.navigate(TAB, next_html, next_url.clone());
                let _ = nav_tx.send(next_url.clone());
                break;
            }
        }
    });
}

/// Pump engine signals and navigation notices into the coordinator until a
/// terminal report appears.
async fn drive_to_completion(
    coordinator: &mut Coordinator,
    host: &Arc<PageHost>,
    signals: &mut mpsc::UnboundedReceiver<refill::core::ReplaySignal>,
    nav_rx: &mut mpsc::UnboundedReceiver<Url>,
) -> ReplayReport {
    loop {
        tokio::select! {
            // Engine signals are strictly older than the navigation they may
            // have triggered; drain them first
            biased;
            Some(signal) = signals.recv() => {
                let page_url = host.page(TAB).expect("tab open").url().clone();
                if let Some(report) = coordinator.handle_signal(TAB, &page_url, signal).await {
                    return report;
                }
            }
            Some(new_url) = nav_rx.recv() => {
                if let Some(report) = coordinator.handle_navigated(TAB, &new_url).await {
                    return report;
                }
            }
        }
    }
}

#[tokio::test]
async fn test_replay_resumes_after_same_origin_navigation() {
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    let host = Arc::new(PageHost::new(fast_replay(), signal_tx));
    let page_one = host.open_tab(TAB, PAGE_ONE, url("https://forms.example/start"));

    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    navigate_on_click(
        Arc::clone(&host),
        Arc::clone(&page_one),
        "#go",
        PAGE_TWO,
        url("https://forms.example/details"),
        nav_tx,
    );

    let mut coordinator = Coordinator::new(
        Arc::clone(&host) as Arc<dyn ReplayHost>,
        &CoordinatorConfig { settle_delay_ms: 10 },
    );

    host.start_replay(TAB, steps()).await.unwrap();
    let report = timeout(
        Duration::from_secs(5),
        drive_to_completion(&mut coordinator, &host, &mut signal_rx, &mut nav_rx),
    )
    .await
    .expect("replay should finish");

    // Segment one filled the name on the old page
    {
        let doc = page_one.doc();
        let name = Selector::parse("#name").unwrap().query_first(&doc).unwrap();
        assert_eq!(doc.element(name).value(), "Ada");
    }

    // Segment two resumed on the new page at the step after the click
    let page_two = host.page(TAB).unwrap();
    {
        let doc = page_two.doc();
        let email = Selector::parse("#email").unwrap().query_first(&doc).unwrap();
        assert_eq!(doc.element(email).value(), "ada@lovelace.dev");
    }

    assert!(!report.aborted);
    assert_eq!(report.filled, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.last_index, Some(2));
    assert!(!coordinator.has_session());
}

#[tokio::test]
async fn test_cross_origin_navigation_aborts_replay() {
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    let host = Arc::new(PageHost::new(fast_replay(), signal_tx));
    let page_one = host.open_tab(TAB, PAGE_ONE, url("https://forms.example/start"));

    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    navigate_on_click(
        Arc::clone(&host),
        Arc::clone(&page_one),
        "#go",
        PAGE_TWO,
        url("https://elsewhere.example/landing"),
        nav_tx,
    );

    let mut coordinator = Coordinator::new(
        Arc::clone(&host) as Arc<dyn ReplayHost>,
        &CoordinatorConfig { settle_delay_ms: 10 },
    );

    host.start_replay(TAB, steps()).await.unwrap();
    let report = timeout(
        Duration::from_secs(5),
        drive_to_completion(&mut coordinator, &host, &mut signal_rx, &mut nav_rx),
    )
    .await
    .expect("abort should terminate the session");

    assert!(report.aborted);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("forms.example"));
    assert!(report.warnings[0].contains("elsewhere.example"));
    assert!(!coordinator.has_session());

    // The session is gone: another navigation notice is ignored
    let noop = coordinator
        .handle_navigated(TAB, &url("https://third.example/"))
        .await;
    assert!(noop.is_none());
}
