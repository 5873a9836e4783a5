//! Longest-common-subsequence alignment of old vs. new lines.

use serde::{Deserialize, Serialize};

/// Two-way line alignment produced by the aligner.
///
/// Vectors are indexed by 0-based line position; values are 1-based line
/// numbers in the opposite snapshot, or -1 for lines with no counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapping {
    pub new_to_old: Vec<i64>,
    pub old_to_new: Vec<i64>,
}

impl LineMapping {
    /// New-text position of a 1-based old line, or -1 when the line was
    /// deleted or out of range.
    pub fn new_pos_of_old(&self, old_line: i64) -> i64 {
        if old_line < 1 || old_line as usize > self.old_to_new.len() {
            return -1;
        }
        self.old_to_new[(old_line - 1) as usize]
    }

    /// Old-text position of a 1-based new line, or -1 when the line was
    /// inserted or out of range.
    pub fn old_pos_of_new(&self, new_line: i64) -> i64 {
        if new_line < 1 || new_line as usize > self.new_to_old.len() {
            return -1;
        }
        self.new_to_old[(new_line - 1) as usize]
    }
}

/// Align two line slices by whole-line equality.
///
/// Ties inside the LCS prefer the earliest matching position in the opposite
/// sequence, so the output is deterministic for any input. Empty inputs
/// produce all-unmatched mappings.
pub fn align_lines(old: &[String], new: &[String]) -> LineMapping {
    let mut new_to_old = vec![-1i64; new.len()];
    let mut old_to_new = vec![-1i64; old.len()];

    // Trim the shared prefix and suffix before building the DP table so the
    // table only covers the changed middle window.
    let mut prefix = 0usize;
    while prefix < old.len() && prefix < new.len() && old[prefix] == new[prefix] {
        old_to_new[prefix] = (prefix + 1) as i64;
        new_to_old[prefix] = (prefix + 1) as i64;
        prefix += 1;
    }
    let mut suffix = 0usize;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && old[old.len() - 1 - suffix] == new[new.len() - 1 - suffix]
    {
        old_to_new[old.len() - 1 - suffix] = (new.len() - suffix) as i64;
        new_to_old[new.len() - 1 - suffix] = (old.len() - suffix) as i64;
        suffix += 1;
    }

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    if old_mid.is_empty() || new_mid.is_empty() {
        return LineMapping {
            new_to_old,
            old_to_new,
        };
    }

    let table = lcs_suffix_table(old_mid, new_mid);

    // Walk front-to-back: matching equal heads immediately is always part of
    // some LCS and keeps every pairing at its earliest position.
    let mut i = 0usize;
    let mut j = 0usize;
    while i < old_mid.len() && j < new_mid.len() {
        if old_mid[i] == new_mid[j] {
            old_to_new[prefix + i] = (prefix + j + 1) as i64;
            new_to_old[prefix + j] = (prefix + i + 1) as i64;
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    LineMapping {
        new_to_old,
        old_to_new,
    }
}

/// `table[i][j]` = length of the LCS of `old[i..]` and `new[j..]`.
fn lcs_suffix_table(old: &[String], new: &[String]) -> Vec<Vec<u32>> {
    let m = old.len();
    let n = new.len();
    let mut table = vec![vec![0u32; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_identical_sequences_map_one_to_one() {
        let text = lines(&["a", "b", "c"]);
        let mapping = align_lines(&text, &text);
        assert_eq!(mapping.new_to_old, vec![1, 2, 3]);
        assert_eq!(mapping.old_to_new, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_sides() {
        let mapping = align_lines(&[], &lines(&["a", "b"]));
        assert_eq!(mapping.new_to_old, vec![-1, -1]);
        assert!(mapping.old_to_new.is_empty());

        let mapping = align_lines(&lines(&["a"]), &[]);
        assert_eq!(mapping.old_to_new, vec![-1]);
        assert!(mapping.new_to_old.is_empty());
    }

    #[test]
    fn test_disjoint_sequences_have_no_matches() {
        let mapping = align_lines(&lines(&["a", "b"]), &lines(&["x", "y", "z"]));
        assert_eq!(mapping.old_to_new, vec![-1, -1]);
        assert_eq!(mapping.new_to_old, vec![-1, -1, -1]);
    }

    #[test]
    fn test_insertion_in_middle() {
        let mapping = align_lines(&lines(&["a", "b"]), &lines(&["a", "x", "b"]));
        assert_eq!(mapping.old_to_new, vec![1, 3]);
        assert_eq!(mapping.new_to_old, vec![1, -1, 2]);
    }

    #[test]
    fn test_duplicate_lines_match_leftmost() {
        // Two identical old lines against one new line: the pairing prefers
        // the earliest old position.
        let mapping = align_lines(&lines(&["a", "a"]), &lines(&["a"]));
        assert_eq!(mapping.old_to_new, vec![1, -1]);
        assert_eq!(mapping.new_to_old, vec![1]);
    }

    #[test]
    fn test_whole_line_equality_no_trimming() {
        // "a " and "a" are different lines.
        let mapping = align_lines(&lines(&["a "]), &lines(&["a"]));
        assert_eq!(mapping.old_to_new, vec![-1]);
        assert_eq!(mapping.new_to_old, vec![-1]);
    }

    #[test]
    fn test_blank_lines_participate() {
        let mapping = align_lines(&lines(&["a", "", "b"]), &lines(&["a", "", "x", "b"]));
        assert_eq!(mapping.old_to_new, vec![1, 2, 4]);
        assert_eq!(mapping.new_to_old, vec![1, 2, -1, 3]);
    }

    #[test]
    fn test_alignment_is_monotonic() {
        let old = lines(&["f", "a", "b", "c", "g"]);
        let new = lines(&["c", "a", "b", "f", "g"]);
        let mapping = align_lines(&old, &new);
        let mut last = 0;
        for (idx, &pos) in mapping.old_to_new.iter().enumerate() {
            if pos != -1 {
                assert!(pos > last, "crossing match at old line {}", idx + 1);
                last = pos;
            }
        }
    }

    #[test]
    fn test_lookup_helpers_handle_out_of_range() {
        let mapping = align_lines(&lines(&["a"]), &lines(&["a"]));
        assert_eq!(mapping.new_pos_of_old(0), -1);
        assert_eq!(mapping.new_pos_of_old(2), -1);
        assert_eq!(mapping.old_pos_of_new(1), 1);
        assert_eq!(mapping.old_pos_of_new(99), -1);
    }
}
