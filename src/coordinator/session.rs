//! Replay session state
//!
//! One session tracks one logical replay across however many page loads it
//! spans. The coordinator owns it with an explicit create/merge/discard
//! lifecycle; page contexts only ever see signals.

use crate::core::types::{ReplayReport, Step, TabId};

/// State for one in-flight replay, scoped to a tab
#[derive(Debug, Clone)]
pub struct ReplaySession {
    pub tab: TabId,
    pub steps: Vec<Step>,
    /// Hostname of the page the replay started on; leaving it aborts
    pub origin_host: String,
    /// Single source of truth for where to resume after a navigation.
    /// `None` until the first progress signal.
    pub last_completed_index: Option<usize>,
    /// Report accumulated so far across finished segments
    pub partial: ReplayReport,
}

impl ReplaySession {
    /// Open a session for a replay starting now
    pub fn new(tab: TabId, steps: Vec<Step>, origin_host: impl Into<String>) -> Self {
        Self {
            tab,
            steps,
            origin_host: origin_host.into(),
            last_completed_index: None,
            partial: ReplayReport::default(),
        }
    }

    /// Index the next segment should start from
    pub fn resume_index(&self) -> usize {
        self.last_completed_index.map(|i| i + 1).unwrap_or(0)
    }

    /// Whether every step has already been reported complete
    pub fn is_complete(&self) -> bool {
        self.resume_index() >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Step;

    fn steps(n: u32) -> Vec<Step> {
        (1..=n).map(|i| Step::click(i, "#x", false, "X")).collect()
    }

    #[test]
    fn test_resume_index() {
        let mut session = ReplaySession::new(1, steps(10), "a.com");
        assert_eq!(session.resume_index(), 0);

        session.last_completed_index = Some(4);
        assert_eq!(session.resume_index(), 5);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_complete_after_last_step() {
        let mut session = ReplaySession::new(1, steps(3), "a.com");
        session.last_completed_index = Some(2);
        assert!(session.is_complete());
    }
}
