//! Shared types used across refill modules
//!
//! Contains the recorded step model, scripts, replay reports, and the
//! signals the replay engine exchanges with the coordinator.

use serde::{Deserialize, Serialize};

/// Identifier for one browser tab within the embedder
pub type TabId = u64;

/// Action performed by a recorded step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// Set a form field value
    Fill,
    /// Click a button, link, or other click target
    Click,
}

/// Field classification driving the value-injection strategy at replay time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Select,
    Textarea,
    Checkbox,
    Radio,
    Date,
    Time,
    DatetimeLocal,
    Color,
    Range,
    File,
}

impl FieldKind {
    /// Classify an input `type` attribute value
    ///
    /// Unknown or absent types degrade to `Text` rather than failing.
    pub fn from_input_type(input_type: &str) -> Self {
        match input_type {
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime-local" => Self::DatetimeLocal,
            "color" => Self::Color,
            "range" => Self::Range,
            "file" => Self::File,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::Textarea => "textarea",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DatetimeLocal => "datetime-local",
            FieldKind::Color => "color",
            FieldKind::Range => "range",
            FieldKind::File => "file",
        };
        write!(f, "{}", name)
    }
}

/// Value carried by a fill step
///
/// Checkboxes record their checked state as a boolean; every other field
/// records its value string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepValue {
    Toggle(bool),
    Text(String),
}

impl StepValue {
    /// The value as a string for text-like injection
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Toggle(b) => b.to_string(),
        }
    }

    /// The value as a checked state for checkbox injection
    pub fn as_toggle(&self) -> bool {
        match self {
            Self::Toggle(b) => *b,
            Self::Text(s) => s == "true",
        }
    }
}

impl From<&str> for StepValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for StepValue {
    fn from(b: bool) -> Self {
        Self::Toggle(b)
    }
}

/// One recorded action: a field fill or a click
///
/// `order` defines the replay sequence. It is strictly increasing within a
/// script but not necessarily contiguous after edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub order: u32,
    pub action: StepAction,
    /// CSS selector locating the target element
    pub selector: String,
    /// True when the selector was derived positionally and page structure
    /// changes are likely to break it
    pub fragile: bool,
    /// Field classification, fill steps only
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    /// Value to inject, fill steps only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StepValue>,
    /// Human-readable descriptor captured at record time, display only
    #[serde(default)]
    pub label: String,
}

impl Step {
    /// Create a fill step
    pub fn fill(
        order: u32,
        selector: impl Into<String>,
        fragile: bool,
        kind: FieldKind,
        value: impl Into<StepValue>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            order,
            action: StepAction::Fill,
            selector: selector.into(),
            fragile,
            kind: Some(kind),
            value: Some(value.into()),
            label: label.into(),
        }
    }

    /// Create a click step
    pub fn click(
        order: u32,
        selector: impl Into<String>,
        fragile: bool,
        label: impl Into<String>,
    ) -> Self {
        Self {
            order,
            action: StepAction::Click,
            selector: selector.into(),
            fragile,
            kind: None,
            value: None,
            label: label.into(),
        }
    }
}

/// A named, ordered collection of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Store-assigned identifier, empty until first save
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Optional site grouping hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub steps: Vec<Step>,
}

impl Script {
    /// Create an unsaved script
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            site: None,
            steps,
        }
    }

    /// Steps in replay order, regardless of storage order
    pub fn ordered_steps(&self) -> Vec<Step> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

/// Outcome of a replay, possibly accumulated across navigation segments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub filled: u32,
    pub clicked: u32,
    pub skipped: u32,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub aborted: bool,
    /// Index of the last step the engine reached in its pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_index: Option<usize>,
}

impl ReplayReport {
    /// Merge a later segment's partial report into this one
    ///
    /// Counts sum, warnings concatenate, aborted is sticky, and the later
    /// segment's last index wins when present.
    pub fn merge(&mut self, other: ReplayReport) {
        self.filled += other.filled;
        self.clicked += other.clicked;
        self.skipped += other.skipped;
        self.warnings.extend(other.warnings);
        self.aborted |= other.aborted;
        if other.last_index.is_some() {
            self.last_index = other.last_index;
        }
    }

    /// Append a warning
    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// One-line human summary for CLI output
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} filled, {} clicked, {} skipped",
            self.filled, self.clicked, self.skipped
        );
        if self.aborted {
            line.push_str(" (aborted)");
        }
        line
    }
}

/// Signals sent by the replay engine to the coordinator
#[derive(Debug, Clone)]
pub enum ReplaySignal {
    /// A fresh replay began in a page context with these steps
    Started { steps: Vec<Step> },
    /// Progress through the sorted sequence; emitted before a click so the
    /// resume point survives a navigation that destroys the context
    Progress { last_completed_index: usize },
    /// The page-context pass ended with a partial report
    Finished { report: ReplayReport },
}
