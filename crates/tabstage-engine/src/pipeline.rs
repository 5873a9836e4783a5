//! Completion pipeline: debounce, provider dispatch, staging, application.
//!
//! Provider failures are fatal for the current completion only: the result
//! is discarded and the UI cleared. Editor-side failures are debug-logged
//! and the completion abandoned.

use crate::clock::{Clock, Timer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tabstage_adapters::cache::DiffCache;
use tabstage_adapters::config::Config;
use tabstage_adapters::util::debug_log;
use tabstage_core::diff::DiffOptions;
use tabstage_core::protocol::{Buffer, CompletionRequest, CompletionResponse, Provider};
use tabstage_core::staging::{self, CompletionStage, StageParams, StagingResult};
use uuid::Uuid;

/// Debounced scheduler: at most one pending completion timer per buffer;
/// scheduling a new round stops the previous timer.
pub struct Debouncer {
    clock: Arc<dyn Clock>,
    delay: Duration,
    pending: Option<Box<dyn Timer>>,
}

impl Debouncer {
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            pending: None,
        }
    }

    /// Schedule `callback`, cancelling any not-yet-fired predecessor.
    /// Returns true when a predecessor was prevented from firing.
    pub fn schedule(&mut self, callback: Box<dyn FnOnce() + Send>) -> bool {
        let cancelled = self.cancel();
        self.pending = Some(self.clock.after_func(self.delay, callback));
        cancelled
    }

    /// Stop the pending timer, if any. Returns true when it was prevented
    /// from firing.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().map(|timer| timer.stop()).unwrap_or(false)
    }
}

/// Orchestrates completion rounds against one editor buffer.
pub struct CompletionEngine<B: Buffer> {
    buffer: B,
    provider: Box<dyn Provider>,
    config: Config,
    cache: DiffCache,
}

impl<B: Buffer> CompletionEngine<B> {
    pub fn new(buffer: B, provider: Box<dyn Provider>, config: Config) -> Self {
        let cache = DiffCache::new(config.cache_capacity);
        Self {
            buffer,
            provider,
            config,
            cache,
        }
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    /// Run one completion round: sync the buffer, ask the provider, stage
    /// the result, apply the closest stage, and surface its cursor target.
    /// Returns the full plan so the host can drive the remaining stages.
    pub async fn process_completion(&mut self, workspace_path: &str) -> Result<Option<StagingResult>> {
        let sync = self
            .buffer
            .sync(workspace_path)
            .context("buffer sync failed")?;
        if sync.buffer_changed {
            // A different buffer came into focus; this round is stale.
            return Ok(None);
        }

        let request = self.build_request();
        let response = match self.provider.get_completion(&request).await {
            Ok(response) => response,
            Err(err) => {
                debug_log(&format!("provider error: {:#}", err));
                let _ = self.buffer.clear_ui();
                return Ok(None);
            }
        };

        let staging = self.stage_response(&response);
        let Some(first) = staging.stages.first() else {
            return Ok(None);
        };

        if let Err(err) = self.apply_stage(first) {
            debug_log(&format!("editor error: {:#}", err));
            return Ok(None);
        }

        Ok(Some(staging))
    }

    fn build_request(&self) -> CompletionRequest {
        CompletionRequest {
            request_id: Uuid::new_v4(),
            path: self.buffer.path().to_string(),
            row: self.buffer.row(),
            col: self.buffer.col(),
            lines: self.buffer.lines().to_vec(),
            previous_lines: self.buffer.previous_lines().to_vec(),
            original_lines: self.buffer.original_lines().to_vec(),
            diff_histories: self.buffer.diff_histories().to_vec(),
            linter_errors: self.buffer.linter_errors(),
        }
    }

    /// Diff the replaced window against the proposed lines and assemble the
    /// staged plan for it.
    fn stage_response(&self, response: &CompletionResponse) -> StagingResult {
        let buffer_lines = self.buffer.lines();
        let base_line_offset = response.start_line.max(1);
        let start = (base_line_offset - 1) as usize;
        let end = (response.end_line_inc.max(0) as usize).min(buffer_lines.len());
        let old_lines: Vec<String> = if start < end {
            buffer_lines[start..end].to_vec()
        } else {
            Vec::new()
        };

        let diff = self.cache.get_or_compute(
            &old_lines,
            &response.lines,
            DiffOptions {
                char_diff_min_common: self.config.char_diff_min_common,
            },
        );

        let (viewport_top, viewport_bottom) = if self.config.viewport_filter {
            self.buffer.viewport_bounds()
        } else {
            (0, 0)
        };

        staging::create_stages(
            &diff,
            &response.lines,
            &StageParams {
                cursor_row: self.buffer.row(),
                viewport_top,
                viewport_bottom,
                base_line_offset,
                proximity_threshold: self.config.proximity_threshold,
                file_path: self.buffer.path(),
            },
        )
    }

    fn apply_stage(&mut self, stage: &CompletionStage) -> Result<()> {
        if !self
            .buffer
            .has_changes(stage.buffer_start, stage.buffer_end, &stage.lines)
        {
            return Ok(());
        }
        let mut batch = self.buffer.prepare_completion(
            stage.buffer_start,
            stage.buffer_end,
            &stage.lines,
            &stage.groups,
        );
        batch.execute()?;
        self.buffer.commit_pending();
        self.buffer
            .show_cursor_target(stage.cursor_target.line_number)?;
        Ok(())
    }
}
