//! Line-level diffing between buffer snapshots.
//!
//! Two passes produce a structured diff: LCS alignment of old vs. new lines
//! (`align`), then classification of the unaligned gaps into typed change
//! records (`classify`).

mod align;
mod classify;

pub use align::{align_lines, LineMapping};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a single change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A whole line was rewritten.
    Modification,
    /// A line exists only in the new text.
    Addition,
    /// A line exists only in the old text.
    Deletion,
    /// Characters were removed within an otherwise unchanged line.
    DeleteChars,
    /// Characters were inserted within an otherwise unchanged line.
    InsertChars,
    /// A coalesced run of modifications spanning `start_line..end_line`.
    ModificationGroup,
    /// A coalesced run of additions spanning `start_line..end_line`.
    AdditionGroup,
}

impl ChangeKind {
    pub fn is_addition(self) -> bool {
        matches!(self, ChangeKind::Addition | ChangeKind::AdditionGroup)
    }

    pub fn is_deletion(self) -> bool {
        matches!(self, ChangeKind::Deletion)
    }

    pub fn is_modification(self) -> bool {
        !self.is_addition() && !self.is_deletion()
    }
}

/// One typed change record keyed into a [`DiffResult`].
///
/// Line numbers are 1-based. `new_line_num` is -1 for pure deletions and
/// `old_line_num` may be -1 for additions with no anchor; at most one of the
/// two is -1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub kind: ChangeKind,
    pub new_line_num: i64,
    pub old_line_num: i64,
    pub content: String,
    #[serde(default)]
    pub old_content: String,
    /// 0-based character columns for the char-level kinds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub col_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub col_end: Option<usize>,
    /// Explicit span for the group kinds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_line: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_line: Option<i64>,
}

impl LineChange {
    pub fn modification(
        new_line_num: i64,
        old_line_num: i64,
        content: String,
        old_content: String,
    ) -> Self {
        Self {
            kind: ChangeKind::Modification,
            new_line_num,
            old_line_num,
            content,
            old_content,
            col_start: None,
            col_end: None,
            start_line: None,
            end_line: None,
        }
    }

    pub fn addition(new_line_num: i64, anchor_old_line: i64, content: String) -> Self {
        Self {
            kind: ChangeKind::Addition,
            new_line_num,
            old_line_num: anchor_old_line,
            content,
            old_content: String::new(),
            col_start: None,
            col_end: None,
            start_line: None,
            end_line: None,
        }
    }

    pub fn deletion(old_line_num: i64, old_content: String) -> Self {
        Self {
            kind: ChangeKind::Deletion,
            new_line_num: -1,
            old_line_num,
            content: String::new(),
            old_content,
            col_start: None,
            col_end: None,
            start_line: None,
            end_line: None,
        }
    }
}

/// Structured diff between two snapshots.
///
/// `changes` is keyed by new-text line number. Pure deletions have no
/// new-side line and are keyed by `-old_line_num` instead; the reserved
/// negative key space can never collide with additions at the same anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub changes: BTreeMap<i64, LineChange>,
    pub old_line_count: usize,
    pub new_line_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_mapping: Option<LineMapping>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Tunables for diff computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Minimum shared prefix+suffix length before a modification is refined
    /// into a char-level record. 0 disables the refinement.
    pub char_diff_min_common: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            char_diff_min_common: 3,
        }
    }
}

/// Compute the structured diff between two text snapshots.
pub fn compute_diff(old_text: &str, new_text: &str) -> DiffResult {
    compute_diff_with(old_text, new_text, DiffOptions::default())
}

pub fn compute_diff_with(old_text: &str, new_text: &str, options: DiffOptions) -> DiffResult {
    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);
    compute_diff_lines(&old_lines, &new_lines, options)
}

/// Compute the structured diff between two already-split line slices.
pub fn compute_diff_lines(
    old_lines: &[String],
    new_lines: &[String],
    options: DiffOptions,
) -> DiffResult {
    let mapping = align::align_lines(old_lines, new_lines);
    let changes = classify::classify_changes(old_lines, new_lines, &mapping, options);
    DiffResult {
        changes,
        old_line_count: old_lines.len(),
        new_line_count: new_lines.len(),
        line_mapping: Some(mapping),
    }
}

/// Split text into lines without terminating newlines. Empty text has no
/// lines; a trailing newline contributes a final empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}

/// Join lines with newlines.
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}
