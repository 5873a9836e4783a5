//! Classification of aligned line gaps into typed change records.

use super::align::LineMapping;
use super::{ChangeKind, DiffOptions, LineChange};
use std::collections::BTreeMap;

/// Walk the alignment and emit one change record per differing line.
///
/// Between two matched pairs the unaligned lines form a delete+insert block:
/// the first `min(d_old, d_new)` pairs become modifications, the excess
/// becomes additions (anchored at the last modified old line so the block
/// stays in one cluster downstream) or deletions (keyed `-old_line_num`).
pub(crate) fn classify_changes(
    old_lines: &[String],
    new_lines: &[String],
    mapping: &LineMapping,
    options: DiffOptions,
) -> BTreeMap<i64, LineChange> {
    let mut changes = BTreeMap::new();
    let old_count = old_lines.len();
    let new_count = new_lines.len();

    let mut i = 0usize; // 0-based old cursor
    let mut j = 0usize; // 0-based new cursor
    let mut last_matched_old: i64 = 0; // 0 = before the first match

    while i < old_count || j < new_count {
        if i < old_count && j < new_count && mapping.old_to_new[i] == (j + 1) as i64 {
            last_matched_old = (i + 1) as i64;
            i += 1;
            j += 1;
            continue;
        }

        // Maximal delete+insert block: a run of unmatched old lines followed
        // by a run of unmatched new lines. The alignment is monotonic, so at
        // least one of the runs is non-empty here.
        let del_start = i;
        while i < old_count && mapping.old_to_new[i] == -1 {
            i += 1;
        }
        let ins_start = j;
        while j < new_count && mapping.new_to_old[j] == -1 {
            j += 1;
        }
        let d_old = i - del_start;
        let d_new = j - ins_start;
        debug_assert!(d_old > 0 || d_new > 0, "block walk must consume a line");

        let paired = d_old.min(d_new);
        for k in 0..paired {
            let old_idx = del_start + k;
            let new_idx = ins_start + k;
            let change = refine_modification(
                (new_idx + 1) as i64,
                (old_idx + 1) as i64,
                &new_lines[new_idx],
                &old_lines[old_idx],
                options.char_diff_min_common,
            );
            changes.insert((new_idx + 1) as i64, change);
        }

        if d_new > d_old {
            let anchor = if d_old > 0 {
                (del_start + d_old) as i64
            } else {
                last_matched_old
            };
            for k in paired..d_new {
                let new_idx = ins_start + k;
                let new_line = (new_idx + 1) as i64;
                changes.insert(
                    new_line,
                    LineChange::addition(new_line, anchor, new_lines[new_idx].clone()),
                );
            }
        } else if d_old > d_new {
            for k in paired..d_old {
                let old_idx = del_start + k;
                let old_line = (old_idx + 1) as i64;
                changes.insert(
                    -old_line,
                    LineChange::deletion(old_line, old_lines[old_idx].clone()),
                );
            }
        }
    }

    changes
}

/// Refine a whole-line modification into a char-level record when the old
/// and new lines share enough prefix+suffix context and the change is a pure
/// intra-line insertion or removal. Columns are 0-based characters.
fn refine_modification(
    new_line_num: i64,
    old_line_num: i64,
    new_content: &str,
    old_content: &str,
    min_common: usize,
) -> LineChange {
    if min_common > 0 {
        let new_chars: Vec<char> = new_content.chars().collect();
        let old_chars: Vec<char> = old_content.chars().collect();

        let mut prefix = 0usize;
        while prefix < new_chars.len()
            && prefix < old_chars.len()
            && new_chars[prefix] == old_chars[prefix]
        {
            prefix += 1;
        }
        let mut suffix = 0usize;
        while suffix < new_chars.len() - prefix
            && suffix < old_chars.len() - prefix
            && new_chars[new_chars.len() - 1 - suffix] == old_chars[old_chars.len() - 1 - suffix]
        {
            suffix += 1;
        }

        let mid_new = new_chars.len() - prefix - suffix;
        let mid_old = old_chars.len() - prefix - suffix;

        if prefix + suffix >= min_common {
            if mid_old == 0 && mid_new > 0 {
                let mut change = LineChange::modification(
                    new_line_num,
                    old_line_num,
                    new_content.to_string(),
                    old_content.to_string(),
                );
                change.kind = ChangeKind::InsertChars;
                change.col_start = Some(prefix);
                change.col_end = Some(prefix + mid_new);
                return change;
            }
            if mid_new == 0 && mid_old > 0 {
                let mut change = LineChange::modification(
                    new_line_num,
                    old_line_num,
                    new_content.to_string(),
                    old_content.to_string(),
                );
                change.kind = ChangeKind::DeleteChars;
                change.col_start = Some(prefix);
                change.col_end = Some(prefix + mid_old);
                return change;
            }
        }
    }

    LineChange::modification(
        new_line_num,
        old_line_num,
        new_content.to_string(),
        old_content.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::super::{align_lines, ChangeKind, DiffOptions};
    use super::*;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn classify(old: &[String], new: &[String]) -> BTreeMap<i64, LineChange> {
        let mapping = align_lines(old, new);
        classify_changes(old, new, &mapping, DiffOptions::default())
    }

    #[test]
    fn test_equal_length_block_is_all_modifications() {
        let old = lines(&["keep", "one", "two", "keep2"]);
        let new = lines(&["keep", "ONE", "TWO", "keep2"]);
        let changes = classify(&old, &new);
        assert_eq!(changes.len(), 2);
        for (line, change) in &changes {
            assert_eq!(change.kind, ChangeKind::Modification);
            assert_eq!(change.new_line_num, *line);
            assert_eq!(change.old_line_num, *line);
        }
    }

    #[test]
    fn test_excess_additions_anchor_at_last_modified_old_line() {
        // Block of 1 old line vs 4 new lines: 1 modification, 3 additions,
        // every addition anchored at the modified old line.
        let old = lines(&["keep", "old", "keep2"]);
        let new = lines(&["keep", "n1", "n2", "n3", "n4", "keep2"]);
        let changes = classify(&old, &new);
        assert_eq!(changes.len(), 4);
        assert_eq!(changes[&2].kind, ChangeKind::Modification);
        for line in 3..=5 {
            assert_eq!(changes[&line].kind, ChangeKind::Addition);
            assert_eq!(changes[&line].old_line_num, 2);
        }
    }

    #[test]
    fn test_pure_insert_block_anchors_at_preceding_match() {
        let old = lines(&["a", "b"]);
        let new = lines(&["a", "x", "y", "b"]);
        let changes = classify(&old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[&2].old_line_num, 1);
        assert_eq!(changes[&3].old_line_num, 1);
    }

    #[test]
    fn test_invariant_one_side_always_set() {
        let old = lines(&["a", "gone", "b"]);
        let new = lines(&["a", "b", "added"]);
        let changes = classify(&old, &new);
        for change in changes.values() {
            assert!(
                change.new_line_num != -1 || change.old_line_num != -1,
                "change dropped both line numbers: {:?}",
                change
            );
        }
    }

    #[test]
    fn test_refine_keeps_unicode_columns_in_chars() {
        // Columns count characters, not bytes.
        let change = refine_modification(1, 1, "héllo(x)", "héllo()", 3);
        assert_eq!(change.kind, ChangeKind::InsertChars);
        assert_eq!(change.col_start, Some(6));
        assert_eq!(change.col_end, Some(7));
    }

    #[test]
    fn test_refine_disabled_at_zero() {
        let change = refine_modification(1, 1, "foo(bar)", "foo()", 0);
        assert_eq!(change.kind, ChangeKind::Modification);
    }
}
