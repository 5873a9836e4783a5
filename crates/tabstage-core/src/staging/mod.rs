//! Completion staging: clustering, render groups, and stage assembly.
//!
//! Turns a structured diff into an ordered sequence of stages the UI applies
//! one at a time. Cluster coordinates stay in new-text space until stage
//! assembly, which converts them to buffer coordinates exactly once.

use crate::coords;
use crate::diff::{ChangeKind, DiffResult, LineChange, LineMapping};
use crate::protocol::CursorTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A group of nearby changes (within the proximity threshold).
///
/// `start_line`/`end_line` bound the cluster in new-text coordinates.
/// `changes` keeps the diff's own keys, so pure deletions stay in the
/// reserved negative key space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeCluster {
    pub start_line: i64,
    pub end_line: i64,
    pub changes: BTreeMap<i64, LineChange>,
}

/// Group nearby changes into clusters; gaps wider than `threshold` lines
/// start a new cluster. Returns clusters in ascending new-text order; an
/// empty diff produces an empty vec.
pub fn cluster_changes(diff: &DiffResult, threshold: i64) -> Vec<ChangeCluster> {
    if diff.changes.is_empty() {
        return Vec::new();
    }

    let mapping = diff.line_mapping.as_ref();
    let mut positioned: Vec<(i64, i64, &LineChange)> = diff
        .changes
        .iter()
        .map(|(key, change)| (effective_new_line(mapping, change), *key, change))
        .collect();
    positioned.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut clusters: Vec<ChangeCluster> = Vec::new();
    for (line, key, change) in positioned {
        debug_assert!(
            change.new_line_num != -1 || change.old_line_num != -1,
            "line change must keep at least one side"
        );
        let end = change_end_line(line, change);
        match clusters.last_mut() {
            Some(cluster) if line - cluster.end_line <= threshold => {
                cluster.changes.insert(key, change.clone());
                if end > cluster.end_line {
                    cluster.end_line = end;
                }
            }
            _ => {
                let mut changes = BTreeMap::new();
                changes.insert(key, change.clone());
                clusters.push(ChangeCluster {
                    start_line: line,
                    end_line: end,
                    changes,
                });
            }
        }
    }
    clusters
}

/// True when the diff spans more than one cluster at this threshold, i.e.
/// the completion should be applied in stages.
pub fn should_split_completion(diff: &DiffResult, threshold: i64) -> bool {
    cluster_changes(diff, threshold).len() > 1
}

/// Group-typed changes contribute their explicit end line to the sweep.
fn change_end_line(line: i64, change: &LineChange) -> i64 {
    match change.kind {
        ChangeKind::ModificationGroup | ChangeKind::AdditionGroup => {
            change.end_line.unwrap_or(line).max(line)
        }
        _ => line,
    }
}

/// New-text position a change occupies for clustering. Deletions have no
/// new-side line; they sit at the insertion point left behind by the nearest
/// preceding matched line, or at line 1 when nothing precedes them.
fn effective_new_line(mapping: Option<&LineMapping>, change: &LineChange) -> i64 {
    if change.new_line_num != -1 {
        return change.new_line_num;
    }
    if let Some(mapping) = mapping {
        let mut old_line = change.old_line_num - 1;
        while old_line >= 1 {
            let new_pos = mapping.new_pos_of_old(old_line);
            if new_pos != -1 {
                return new_pos;
            }
            old_line -= 1;
        }
        return 1;
    }
    // Hand-built diffs without a mapping: assume the old position held.
    change.old_line_num.max(1)
}

/// Render category of a contiguous group inside one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Modification,
    Addition,
    Deletion,
}

impl GroupKind {
    fn of_change(kind: ChangeKind) -> GroupKind {
        match kind {
            ChangeKind::Addition | ChangeKind::AdditionGroup => GroupKind::Addition,
            ChangeKind::Deletion => GroupKind::Deletion,
            ChangeKind::Modification
            | ChangeKind::DeleteChars
            | ChangeKind::InsertChars
            | ChangeKind::ModificationGroup => GroupKind::Modification,
        }
    }
}

/// A contiguous run of same-kind changes, with coordinates local to the
/// stage content (1-based into [`CompletionStage::lines`]). Deletion groups
/// mark an anchor position and carry no lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderGroup {
    pub kind: GroupKind,
    pub start_line: i64,
    pub end_line: i64,
    pub lines: Vec<String>,
}

/// One atomic unit of UI application: a cluster's content with buffer
/// coordinates and the cursor target that drives the next stage.
///
/// A stage whose changes are all additions is a pure insertion at
/// `buffer_start`; every other stage replaces `buffer_start..=buffer_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionStage {
    pub lines: Vec<String>,
    pub groups: Vec<RenderGroup>,
    pub changes: Vec<LineChange>,
    pub buffer_start: i64,
    pub buffer_end: i64,
    pub cursor_target: CursorTarget,
    pub is_last_stage: bool,
}

impl CompletionStage {
    /// True when this stage inserts content instead of replacing a range.
    pub fn is_pure_insertion(&self) -> bool {
        !self.changes.is_empty() && self.changes.iter().all(|c| c.kind.is_addition())
    }
}

/// Ordered staging plan, closest-to-cursor first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingResult {
    pub stages: Vec<CompletionStage>,
}

impl StagingResult {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Inputs shared by a staging run, in buffer coordinates.
#[derive(Debug, Clone)]
pub struct StageParams<'a> {
    pub cursor_row: i64,
    /// Viewport window; `(0, 0)` disables the filter.
    pub viewport_top: i64,
    pub viewport_bottom: i64,
    /// Buffer line number of new-text line 1.
    pub base_line_offset: i64,
    pub proximity_threshold: i64,
    pub file_path: &'a str,
}

struct StagedCluster {
    cluster: ChangeCluster,
    buffer_start: i64,
    buffer_end: i64,
    lines: Vec<String>,
}

/// Build the staged plan for a diff: cluster, resolve buffer coordinates,
/// filter to the viewport, order by cursor distance, and wire cursor
/// targets. Only the final stage retriggers.
pub fn create_stages(
    diff: &DiffResult,
    new_lines: &[String],
    params: &StageParams<'_>,
) -> StagingResult {
    let clusters = cluster_changes(diff, params.proximity_threshold);
    if clusters.is_empty() {
        return StagingResult::default();
    }

    let mut staged: Vec<StagedCluster> = clusters
        .into_iter()
        .map(|cluster| resolve_cluster(cluster, new_lines, params.base_line_offset))
        .collect();

    if (params.viewport_top, params.viewport_bottom) != (0, 0) {
        staged.retain(|s| {
            s.buffer_end >= params.viewport_top && s.buffer_start <= params.viewport_bottom
        });
        if staged.is_empty() {
            return StagingResult::default();
        }
    }

    staged.sort_by_key(|s| {
        (
            distance_from_cursor(s.buffer_start, s.buffer_end, params.cursor_row),
            s.buffer_start,
        )
    });

    let last = staged.len() - 1;
    let mapping = diff.line_mapping.as_ref();
    let mut stages = Vec::with_capacity(staged.len());
    for (index, resolved) in staged.iter().enumerate() {
        let is_last_stage = index == last;
        let cursor_target = if is_last_stage {
            CursorTarget {
                relative_path: params.file_path.to_string(),
                line_number: resolved.buffer_end,
                should_retrigger: true,
            }
        } else {
            CursorTarget {
                relative_path: params.file_path.to_string(),
                line_number: staged[index + 1].buffer_start,
                should_retrigger: false,
            }
        };

        stages.push(CompletionStage {
            lines: resolved.lines.clone(),
            groups: synthesize_groups(&resolved.cluster, mapping, &resolved.lines),
            changes: resolved.cluster.changes.values().cloned().collect(),
            buffer_start: resolved.buffer_start,
            buffer_end: resolved.buffer_end,
            cursor_target,
            is_last_stage,
        });
    }
    StagingResult { stages }
}

/// Map one cluster to buffer coordinates and stage content.
fn resolve_cluster(
    cluster: ChangeCluster,
    new_lines: &[String],
    base_line_offset: i64,
) -> StagedCluster {
    let pure_addition = cluster.changes.values().all(|c| c.kind.is_addition());
    let pure_deletion = cluster.changes.values().all(|c| c.kind.is_deletion());

    if pure_addition {
        // Insert after the shared anchor; the block rule guarantees every
        // addition in one delete+insert block carries the same anchor.
        let anchor = cluster
            .changes
            .values()
            .next()
            .map(|c| c.old_line_num.max(0))
            .unwrap_or(0);
        let lines: Vec<String> = cluster.changes.values().map(|c| c.content.clone()).collect();
        let buffer_start = coords::insertion_buffer_line(anchor, base_line_offset);
        let buffer_end = buffer_start + (lines.len() as i64 - 1).max(0);
        return StagedCluster {
            cluster,
            buffer_start,
            buffer_end,
            lines,
        };
    }

    if pure_deletion {
        let first = cluster
            .changes
            .values()
            .map(|c| c.old_line_num)
            .min()
            .unwrap_or(1);
        let last = cluster
            .changes
            .values()
            .map(|c| c.old_line_num)
            .max()
            .unwrap_or(first);
        return StagedCluster {
            cluster,
            buffer_start: coords::buffer_from_new_text(first, base_line_offset),
            buffer_end: coords::buffer_from_new_text(last, base_line_offset),
            lines: Vec::new(),
        };
    }

    let buffer_start = coords::buffer_from_new_text(cluster.start_line, base_line_offset);
    let buffer_end = coords::buffer_from_new_text(cluster.end_line, base_line_offset);
    let mut lines = Vec::with_capacity((cluster.end_line - cluster.start_line + 1) as usize);
    for line in cluster.start_line..=cluster.end_line {
        // Right-pad when the completion text is shorter than the diff
        // claims; never panic on short input.
        let content = new_lines.get((line - 1) as usize).cloned().unwrap_or_default();
        lines.push(content);
    }
    StagedCluster {
        cluster,
        buffer_start,
        buffer_end,
        lines,
    }
}

/// Minimum distance from the cursor to a buffer range; 0 when inside.
fn distance_from_cursor(buffer_start: i64, buffer_end: i64, cursor_row: i64) -> i64 {
    if cursor_row >= buffer_start && cursor_row <= buffer_end {
        0
    } else if cursor_row < buffer_start {
        buffer_start - cursor_row
    } else {
        cursor_row - buffer_end
    }
}

/// Merge a cluster's changes into contiguous same-kind render groups.
/// Unchanged intervening lines break a group, and families never merge:
/// a modification next to an addition stays two groups.
fn synthesize_groups(
    cluster: &ChangeCluster,
    mapping: Option<&LineMapping>,
    stage_lines: &[String],
) -> Vec<RenderGroup> {
    let mut ordered: Vec<(i64, i64, &LineChange)> = cluster
        .changes
        .iter()
        .map(|(key, change)| (effective_new_line(mapping, change), *key, change))
        .collect();
    ordered.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let max_line = stage_lines.len().max(1) as i64;
    let mut groups: Vec<RenderGroup> = Vec::new();
    for (line, _, change) in ordered {
        let kind = GroupKind::of_change(change.kind);
        let local_start =
            coords::stage_local_from_new_text(line, cluster.start_line).clamp(1, max_line);
        let local_end = coords::stage_local_from_new_text(change_end_line(line, change), cluster.start_line)
            .clamp(local_start, max_line);
        match groups.last_mut() {
            Some(group) if group.kind == kind && local_start <= group.end_line + 1 => {
                if local_end > group.end_line {
                    group.end_line = local_end;
                }
            }
            _ => groups.push(RenderGroup {
                kind,
                start_line: local_start,
                end_line: local_end,
                lines: Vec::new(),
            }),
        }
    }

    for group in &mut groups {
        if group.kind == GroupKind::Deletion || stage_lines.is_empty() {
            continue;
        }
        let start = (group.start_line - 1) as usize;
        let end = (group.end_line as usize).min(stage_lines.len());
        if start < end {
            group.lines = stage_lines[start..end].to_vec();
        }
    }
    groups
}

/// Replay a staged plan onto the original lines.
///
/// Stage coordinates live in new-text space, so they are valid against the
/// buffer as it stands once every stage above them has been applied: apply
/// ascending by `buffer_start`. Pure-insertion stages insert at
/// `buffer_start`; everything else replaces its range.
pub fn apply_stages(old_lines: &[String], stages: &[CompletionStage]) -> Vec<String> {
    let mut result: Vec<String> = old_lines.to_vec();
    let mut ordered: Vec<&CompletionStage> = stages.iter().collect();
    ordered.sort_by_key(|s| s.buffer_start);

    for stage in ordered {
        let start = ((stage.buffer_start.max(1) - 1) as usize).min(result.len());
        let end = if stage.is_pure_insertion() {
            start
        } else {
            (stage.buffer_end.max(0) as usize).clamp(start, result.len())
        };
        result.splice(start..end, stage.lines.iter().cloned());
    }
    result
}
