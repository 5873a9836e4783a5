//! Conversions between the coordinate spaces used by staging.
//!
//! Three spaces exist: *cluster-relative* (1-based into a cluster's span),
//! *new-text* (1-based into the completion content), and *buffer* (1-based
//! absolute editor lines). Cluster coordinates stay in new-text space until
//! stage assembly, which is the only place they become buffer coordinates.

/// Buffer line for a 1-based new-text line.
pub fn buffer_from_new_text(new_text_line: i64, base_line_offset: i64) -> i64 {
    new_text_line + base_line_offset - 1
}

/// New-text line for a 1-based buffer line.
pub fn new_text_from_buffer(buffer_line: i64, base_line_offset: i64) -> i64 {
    buffer_line - base_line_offset + 1
}

/// Buffer line where content inserted *after* `anchor_old_line` first
/// appears. Anchor 0 means "insert at the top of the completion range".
pub fn insertion_buffer_line(anchor_old_line: i64, base_line_offset: i64) -> i64 {
    anchor_old_line + base_line_offset
}

/// Stage-local line for a new-text line inside a cluster starting at
/// `cluster_start`.
pub fn stage_local_from_new_text(new_text_line: i64, cluster_start: i64) -> i64 {
    new_text_line - cluster_start + 1
}

/// New-text line for a stage-local line.
pub fn new_text_from_stage_local(stage_local_line: i64, cluster_start: i64) -> i64 {
    stage_local_line + cluster_start - 1
}
