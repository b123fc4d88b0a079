//! Replay engine - executing a step sequence against one page context
//!
//! One pass walks the sorted steps from a start index, resolving each
//! selector with a bounded wait, applying the fill or click, and letting the
//! page quiesce before moving on. Failures to resolve are soft: the step is
//! skipped with a warning and the pass continues. Progress signals flow to
//! the coordinator so a navigation mid-pass can resume where this context
//! left off.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::config::ReplayConfig;
use crate::core::types::{FieldKind, ReplayReport, ReplaySignal, Step, StepAction, StepValue};
use crate::dom::{EventKind, Page};
use crate::replay::inject::inject;
use crate::replay::quiesce::wait_for_quiet;
use crate::resolver;

/// Replays step sequences against a page, reporting to a signal channel
pub struct ReplayEngine {
    config: ReplayConfig,
    signals: mpsc::UnboundedSender<ReplaySignal>,
}

impl ReplayEngine {
    /// Create an engine reporting on the given channel
    pub fn new(config: ReplayConfig, signals: mpsc::UnboundedSender<ReplaySignal>) -> Self {
        Self { config, signals }
    }

    /// Create an engine plus the receiving end of its signal channel
    pub fn channel(config: ReplayConfig) -> (Self, mpsc::UnboundedReceiver<ReplaySignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(config, tx), rx)
    }

    /// Execute steps from `start_index` to the end of the sequence
    ///
    /// Steps are sorted by `order` first; callers may not guarantee storage
    /// order. Returns the partial report for this pass, which is also sent
    /// as a `Finished` signal.
    pub async fn replay(&self, page: &Page, steps: &[Step], start_index: usize) -> ReplayReport {
        let mut ordered = steps.to_vec();
        ordered.sort_by_key(|s| s.order);

        // A resumed pass must not look like a fresh replay to the coordinator
        if start_index == 0 {
            let _ = self.signals.send(ReplaySignal::Started {
                steps: ordered.clone(),
            });
        }
        info!(
            steps = ordered.len(),
            start_index,
            url = %page.url(),
            "replay pass started"
        );

        let mut report = ReplayReport::default();
        for index in start_index..ordered.len() {
            let step = &ordered[index];
            report.last_index = Some(index);

            let node = match resolver::find_element(
                page,
                &step.selector,
                self.config.element_timeout(),
            )
            .await
            {
                Some(node) => node,
                None => {
                    report.skipped += 1;
                    report.warn(format!(
                        "step {}: no element matched `{}` ({})",
                        step.order, step.selector, step.label
                    ));
                    warn!(
                        order = step.order,
                        selector = %step.selector,
                        "step skipped, element not found"
                    );
                    continue;
                }
            };

            match step.action {
                StepAction::Click => {
                    // Report before clicking: the click can navigate away and
                    // destroy this context before anything after it runs.
                    let _ = self.signals.send(ReplaySignal::Progress {
                        last_completed_index: index,
                    });
                    page.doc().dispatch(node, EventKind::Click);
                    report.clicked += 1;
                    debug!(order = step.order, selector = %step.selector, "clicked");
                    wait_for_quiet(page, self.config.click_quiet()).await;
                }
                StepAction::Fill => {
                    let kind = step.kind.unwrap_or(FieldKind::Text);
                    let value = step
                        .value
                        .clone()
                        .unwrap_or_else(|| StepValue::Text(String::new()));
                    inject(&mut page.doc(), node, kind, &value);
                    report.filled += 1;
                    debug!(order = step.order, selector = %step.selector, "filled");
                    wait_for_quiet(page, self.config.fill_quiet()).await;
                    let _ = self.signals.send(ReplaySignal::Progress {
                        last_completed_index: index,
                    });
                }
            }
        }

        info!(
            filled = report.filled,
            clicked = report.clicked,
            skipped = report.skipped,
            "replay pass finished"
        );
        let _ = self.signals.send(ReplaySignal::Finished {
            report: report.clone(),
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn fast_config() -> ReplayConfig {
        ReplayConfig {
            element_timeout_ms: 50,
            click_quiet_ms: 10,
            fill_quiet_ms: 10,
        }
    }

    fn page() -> Arc<Page> {
        Arc::new(Page::new(Url::parse("https://forms.example/").unwrap()))
    }

    #[tokio::test]
    async fn test_skip_and_continue() {
        let page = page();
        {
            let mut doc = page.doc();
            let body = doc.body();
            doc.append_element(body, "input", &[("id", "first")]);
            doc.append_element(body, "input", &[("id", "third")]);
        }
        let steps = vec![
            Step::fill(1, "#first", false, FieldKind::Text, "a", "First"),
            Step::fill(2, "#missing", false, FieldKind::Text, "b", "Missing"),
            Step::fill(3, "#third", false, FieldKind::Text, "c", "Third"),
        ];

        let (engine, _rx) = ReplayEngine::channel(fast_config());
        let report = engine.replay(&page, &steps, 0).await;

        assert_eq!(report.filled, 2);
        assert_eq!(report.clicked, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("step 2"));
        assert!(report.warnings[0].contains("#missing"));

        let doc = page.doc();
        let first = crate::dom::Selector::parse("#first")
            .unwrap()
            .query_first(&doc)
            .unwrap();
        let third = crate::dom::Selector::parse("#third")
            .unwrap()
            .query_first(&doc)
            .unwrap();
        assert_eq!(doc.element(first).value(), "a");
        assert_eq!(doc.element(third).value(), "c");
    }

    #[tokio::test]
    async fn test_steps_sorted_before_execution() {
        let page = page();
        let input = {
            let mut doc = page.doc();
            let body = doc.body();
            doc.append_element(body, "input", &[("id", "field")])
        };
        // Stored out of order; both target the same field, so the higher
        // order must win
        let steps = vec![
            Step::fill(9, "#field", false, FieldKind::Text, "late", "Field"),
            Step::fill(2, "#field", false, FieldKind::Text, "early", "Field"),
        ];

        let (engine, _rx) = ReplayEngine::channel(fast_config());
        let report = engine.replay(&page, &steps, 0).await;

        assert_eq!(report.filled, 2);
        assert_eq!(page.doc().element(input).value(), "late");
    }

    #[tokio::test]
    async fn test_progress_reported_before_click() {
        let page = page();
        {
            let mut doc = page.doc();
            let body = doc.body();
            doc.append_element(body, "button", &[("id", "go")]);
        }
        let steps = vec![Step::click(1, "#go", false, "Go")];

        let (engine, mut rx) = ReplayEngine::channel(fast_config());
        let mut events = page.subscribe_events();
        engine.replay(&page, &steps, 0).await;

        // Signal order: Started, Progress (pre-click), Finished
        assert!(matches!(rx.try_recv(), Ok(ReplaySignal::Started { .. })));
        match rx.try_recv() {
            Ok(ReplaySignal::Progress {
                last_completed_index,
            }) => assert_eq!(last_completed_index, 0),
            other => panic!("expected progress signal, got {:?}", other),
        }
        assert!(matches!(rx.try_recv(), Ok(ReplaySignal::Finished { .. })));
        assert!(events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_resumed_pass_skips_completed_steps_and_started_signal() {
        let page = page();
        let (a, b) = {
            let mut doc = page.doc();
            let body = doc.body();
            let a = doc.append_element(body, "input", &[("id", "a")]);
            let b = doc.append_element(body, "input", &[("id", "b")]);
            (a, b)
        };
        let steps = vec![
            Step::fill(1, "#a", false, FieldKind::Text, "x", "A"),
            Step::fill(2, "#b", false, FieldKind::Text, "y", "B"),
        ];

        let (engine, mut rx) = ReplayEngine::channel(fast_config());
        let report = engine.replay(&page, &steps, 1).await;

        assert_eq!(report.filled, 1);
        assert_eq!(page.doc().element(a).value(), "");
        assert_eq!(page.doc().element(b).value(), "y");
        assert!(matches!(rx.try_recv(), Ok(ReplaySignal::Progress { .. })));
    }

    #[tokio::test]
    async fn test_checkbox_noop_still_counts_as_filled() {
        let page = page();
        let checkbox = {
            let mut doc = page.doc();
            let body = doc.body();
            let node = doc.append_element(body, "input", &[("type", "checkbox"), ("id", "tos")]);
            doc.set_checked(node, true);
            node
        };
        let steps = vec![Step::fill(1, "#tos", false, FieldKind::Checkbox, true, "Terms")];

        let (engine, _rx) = ReplayEngine::channel(fast_config());
        let mut events = page.subscribe_events();
        let report = engine.replay(&page, &steps, 0).await;

        assert_eq!(report.filled, 1);
        assert!(page.doc().element(checkbox).is_checked());
        // Already in the target state: no change or input events dispatched
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_element_appearing_late_is_filled() {
        let page = page();
        let steps = vec![Step::fill(1, "#late", false, FieldKind::Text, "v", "Late")];

        let config = ReplayConfig {
            element_timeout_ms: 500,
            ..fast_config()
        };
        let (engine, _rx) = ReplayEngine::channel(config);

        let inserter = {
            let page = Arc::clone(&page);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut doc = page.doc();
                let body = doc.body();
                doc.append_element(body, "input", &[("id", "late")])
            })
        };

        let report = engine.replay(&page, &steps, 0).await;
        let input = inserter.await.unwrap();

        assert_eq!(report.filled, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(page.doc().element(input).value(), "v");
    }
}
