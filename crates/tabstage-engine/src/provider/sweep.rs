//! Sweep whole-window rewrite provider.
//!
//! Ships the visible window together with the file's original and previous
//! snapshots; the backend answers with a rewritten window.

use super::http::{create_http_client, post_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tabstage_core::diff::{join_lines, split_lines};
use tabstage_core::protocol::{CompletionRequest, CompletionResponse, Provider, ProviderConfig};

pub struct SweepProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl SweepProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.request_timeout_secs)?,
            config: config.clone(),
        })
    }
}

#[derive(Serialize)]
struct SweepRequest<'a> {
    path: &'a str,
    content: String,
    cursor_row: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    original_content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    previous_content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<SweepDiagnostic<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    model: &'a str,
}

#[derive(Serialize)]
struct SweepDiagnostic<'a> {
    line: i64,
    message: &'a str,
}

#[derive(Deserialize)]
struct SweepResponse {
    start_line: i64,
    end_line: i64,
    content: String,
}

impl Provider for SweepProvider {
    fn get_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>> {
        Box::pin(async move {
            let diagnostics = request
                .linter_errors
                .as_ref()
                .map(|errors| {
                    errors
                        .errors
                        .iter()
                        .map(|e| SweepDiagnostic {
                            line: e.line,
                            message: &e.message,
                        })
                        .collect()
                })
                .unwrap_or_default();

            let body = SweepRequest {
                path: &request.path,
                content: join_lines(&request.lines),
                cursor_row: request.row,
                original_content: join_lines(&request.original_lines),
                previous_content: join_lines(&request.previous_lines),
                diagnostics,
                model: &self.config.model,
            };

            let response: SweepResponse =
                post_json(&self.client, &self.config.endpoint, &self.config.api_key, &body)
                    .await?;

            Ok(CompletionResponse {
                start_line: response.start_line,
                end_line_inc: response.end_line,
                lines: split_lines(&response.content),
                cursor_target: None,
            })
        })
    }
}
