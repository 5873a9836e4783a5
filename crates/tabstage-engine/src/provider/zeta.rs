//! Zeta edit-prediction provider.
//!
//! Sends the buffer excerpt plus recent edit history and receives a full
//! replacement range, optionally with a predicted cursor position.

use super::http::{create_http_client, post_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tabstage_core::diff::{join_lines, split_lines};
use tabstage_core::protocol::{
    CompletionRequest, CompletionResponse, CursorTarget, Provider, ProviderConfig,
};

pub struct ZetaProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl ZetaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.request_timeout_secs)?,
            config: config.clone(),
        })
    }
}

#[derive(Serialize)]
struct ZetaRequest<'a> {
    path: &'a str,
    excerpt: String,
    cursor_row: i64,
    cursor_col: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    edit_history: Vec<ZetaEdit<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    model: &'a str,
}

#[derive(Serialize)]
struct ZetaEdit<'a> {
    path: &'a str,
    old_text: &'a str,
    new_text: &'a str,
}

#[derive(Deserialize)]
struct ZetaResponse {
    start_line: i64,
    end_line: i64,
    text: String,
    #[serde(default)]
    cursor_line: Option<i64>,
    #[serde(default)]
    should_retrigger: bool,
}

impl Provider for ZetaProvider {
    fn get_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>> {
        Box::pin(async move {
            let body = ZetaRequest {
                path: &request.path,
                excerpt: join_lines(&request.lines),
                cursor_row: request.row,
                cursor_col: request.col,
                edit_history: request
                    .diff_histories
                    .iter()
                    .map(|entry| ZetaEdit {
                        path: &entry.path,
                        old_text: &entry.old_text,
                        new_text: &entry.new_text,
                    })
                    .collect(),
                model: &self.config.model,
            };

            let response: ZetaResponse =
                post_json(&self.client, &self.config.endpoint, &self.config.api_key, &body)
                    .await?;

            Ok(CompletionResponse {
                start_line: response.start_line,
                end_line_inc: response.end_line,
                lines: split_lines(&response.text),
                cursor_target: response.cursor_line.map(|line| CursorTarget {
                    relative_path: request.path.clone(),
                    line_number: line,
                    should_retrigger: response.should_retrigger,
                }),
            })
        })
    }
}
