//! Contracts between the staging core and its collaborators.
//!
//! The editor buffer, the completion providers, and the host runtime all
//! live behind these traits; the core itself never performs I/O.

use crate::staging::RenderGroup;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use uuid::Uuid;

/// Which completion backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Edit-prediction API: full edit suggestions with cursor prediction.
    #[default]
    Zeta,
    /// Inline fill-in-the-middle completion at the cursor.
    AutoComplete,
    /// Whole-window rewrite of the visible region.
    Sweep,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderType::Zeta => "zeta",
            ProviderType::AutoComplete => "auto_complete",
            ProviderType::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

impl FromStr for ProviderType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "zeta" => Ok(ProviderType::Zeta),
            "auto_complete" | "autocomplete" | "inline" => Ok(ProviderType::AutoComplete),
            "sweep" => Ok(ProviderType::Sweep),
            other => Err(anyhow::anyhow!("unsupported provider type: {}", other)),
        }
    }
}

/// Connection settings for one provider backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Where the cursor should land after a stage is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorTarget {
    pub relative_path: String,
    pub line_number: i64,
    /// Ask the host for a fresh completion after the cursor move.
    pub should_retrigger: bool,
}

/// One historical edit snapshot kept as provider context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub old_text: String,
    pub new_text: String,
    pub recorded_at: DateTime<Utc>,
}

/// Diagnostics the editor's language servers currently report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinterErrors {
    pub errors: Vec<LinterError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinterError {
    pub path: String,
    pub line: i64,
    pub message: String,
    #[serde(default)]
    pub severity: String,
}

/// State reported by the editor after a sync round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// A different buffer came into focus since the last sync.
    pub buffer_changed: bool,
    pub old_path: String,
    pub new_path: String,
}

/// Everything a provider needs to produce a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub request_id: Uuid,
    pub path: String,
    pub row: i64,
    pub col: i64,
    pub lines: Vec<String>,
    #[serde(default)]
    pub previous_lines: Vec<String>,
    #[serde(default)]
    pub original_lines: Vec<String>,
    #[serde(default)]
    pub diff_histories: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub linter_errors: Option<LinterErrors>,
}

/// A provider's proposed replacement for a buffer range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// 1-based inclusive buffer range the completion text replaces.
    pub start_line: i64,
    pub end_line_inc: i64,
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cursor_target: Option<CursorTarget>,
}

/// Deferred editor operations prepared for one stage.
pub trait Batch {
    fn execute(&mut self) -> Result<()>;
}

/// Editor buffer operations, implemented by the host's RPC client.
pub trait Buffer {
    /// Read current state from the editor.
    fn sync(&mut self, workspace_path: &str) -> Result<SyncResult>;

    // State accessors
    fn lines(&self) -> &[String];
    fn row(&self) -> i64;
    fn col(&self) -> i64;
    fn path(&self) -> &str;
    fn version(&self) -> i64;
    fn viewport_bounds(&self) -> (i64, i64);

    // File context carried between completion rounds
    fn previous_lines(&self) -> &[String];
    fn original_lines(&self) -> &[String];
    fn diff_histories(&self) -> &[DiffEntry];
    fn set_file_context(&mut self, prev: Vec<String>, orig: Vec<String>, diffs: Vec<DiffEntry>);

    // Completion lifecycle
    fn has_changes(&self, start_line: i64, end_line_inc: i64, lines: &[String]) -> bool;
    fn prepare_completion(
        &mut self,
        start_line: i64,
        end_line_inc: i64,
        lines: &[String],
        groups: &[RenderGroup],
    ) -> Box<dyn Batch>;
    fn commit_pending(&mut self);

    // UI operations
    fn show_cursor_target(&mut self, line: i64) -> Result<()>;
    fn clear_ui(&mut self) -> Result<()>;
    fn move_cursor(&mut self, line: i64, center: bool, mark: bool) -> Result<()>;

    // LSP
    fn linter_errors(&self) -> Option<LinterErrors>;

    // Event registration for the editor's RPC handler
    fn register_event_handler(&mut self, handler: Box<dyn Fn(&str) + Send>) -> Result<()>;
}

/// A completion backend.
pub trait Provider: Send + Sync {
    fn get_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>>;
}
