//! Inline fill-in-the-middle provider.
//!
//! Splits the buffer at the cursor into prefix and suffix and splices the
//! returned snippet back into the current line.

use super::http::{create_http_client, post_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tabstage_core::diff::join_lines;
use tabstage_core::protocol::{CompletionRequest, CompletionResponse, Provider, ProviderConfig};

pub struct AutoCompleteProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl AutoCompleteProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.request_timeout_secs)?,
            config: config.clone(),
        })
    }
}

#[derive(Serialize)]
struct FimRequest<'a> {
    prompt: String,
    suffix: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    model: &'a str,
}

#[derive(Deserialize)]
struct FimResponse {
    completion: String,
}

/// Split the request's current line at the cursor column (character-based).
fn split_at_cursor(request: &CompletionRequest) -> (String, String) {
    let row_idx = (request.row.max(1) - 1) as usize;
    let current = request
        .lines
        .get(row_idx)
        .map(String::as_str)
        .unwrap_or_default();
    let col = (request.col.max(0) as usize).min(current.chars().count());
    let split_byte = current
        .char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(current.len());

    let mut prefix = join_lines(&request.lines[..row_idx.min(request.lines.len())]);
    if !prefix.is_empty() {
        prefix.push('\n');
    }
    prefix.push_str(&current[..split_byte]);

    let mut suffix = current[split_byte..].to_string();
    let rest_start = (row_idx + 1).min(request.lines.len());
    if rest_start < request.lines.len() {
        suffix.push('\n');
        suffix.push_str(&join_lines(&request.lines[rest_start..]));
    }
    (prefix, suffix)
}

impl Provider for AutoCompleteProvider {
    fn get_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse>> + Send + 'a>> {
        Box::pin(async move {
            let (prefix, suffix) = split_at_cursor(request);
            let body = FimRequest {
                prompt: prefix,
                suffix,
                model: &self.config.model,
            };

            let response: FimResponse =
                post_json(&self.client, &self.config.endpoint, &self.config.api_key, &body)
                    .await?;

            // Splice the snippet into the current line; the row expands into
            // as many lines as the snippet carries.
            let row_idx = (request.row.max(1) - 1) as usize;
            let current = request
                .lines
                .get(row_idx)
                .map(String::as_str)
                .unwrap_or_default();
            let col = (request.col.max(0) as usize).min(current.chars().count());
            let split_byte = current
                .char_indices()
                .nth(col)
                .map(|(idx, _)| idx)
                .unwrap_or(current.len());
            let spliced = format!(
                "{}{}{}",
                &current[..split_byte],
                response.completion,
                &current[split_byte..]
            );

            Ok(CompletionResponse {
                start_line: request.row,
                end_line_inc: request.row,
                lines: spliced.split('\n').map(str::to_string).collect(),
                cursor_target: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request(lines: &[&str], row: i64, col: i64) -> CompletionRequest {
        CompletionRequest {
            request_id: Uuid::new_v4(),
            path: "test.rs".to_string(),
            row,
            col,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            previous_lines: Vec::new(),
            original_lines: Vec::new(),
            diff_histories: Vec::new(),
            linter_errors: None,
        }
    }

    #[test]
    fn test_split_at_cursor_mid_line() {
        let (prefix, suffix) = split_at_cursor(&request(&["fn main() {", "    let x", "}"], 2, 9));
        assert_eq!(prefix, "fn main() {\n    let x");
        assert_eq!(suffix, "\n}");
    }

    #[test]
    fn test_split_at_cursor_start_of_file() {
        let (prefix, suffix) = split_at_cursor(&request(&["abc"], 1, 1));
        assert_eq!(prefix, "a");
        assert_eq!(suffix, "bc");
    }

    #[test]
    fn test_split_at_cursor_out_of_range_column() {
        let (prefix, suffix) = split_at_cursor(&request(&["ab"], 1, 99));
        assert_eq!(prefix, "ab");
        assert_eq!(suffix, "");
    }
}
