use serde::Serialize;
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineChange {
    Removed,
    Added,
    Unchanged,
}

impl LineChange {
    const fn marker(self) -> char {
        match self {
            Self::Removed => '-',
            Self::Added => '+',
            Self::Unchanged => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub change: LineChange,
    pub text: String,
}

/// Line-level alignment between a stored artifact and its candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LineDiff {
    pub lines: Vec<DiffLine>,
}

impl LineDiff {
    #[must_use]
    pub fn compute(old: &str, new: &str) -> Self {
        let old = normalize_lines(old);
        let new = normalize_lines(new);
        let diff = TextDiff::from_lines(old.as_str(), new.as_str());
        let lines = diff
            .iter_all_changes()
            .map(|change| DiffLine {
                change: match change.tag() {
                    ChangeTag::Delete => LineChange::Removed,
                    ChangeTag::Insert => LineChange::Added,
                    ChangeTag::Equal => LineChange::Unchanged,
                },
                text: change.value().trim_end_matches('\n').to_string(),
            })
            .collect();
        Self { lines }
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.with_change(LineChange::Removed)
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.with_change(LineChange::Added)
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &str> {
        self.with_change(LineChange::Unchanged)
    }

    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.change == LineChange::Unchanged)
    }

    /// Unified-style rendering: `-`, `+` or a space, then the line.
    #[must_use]
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{} {}", line.change.marker(), line.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn with_change(&self, change: LineChange) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |line| line.change == change)
            .map(|line| line.text.as_str())
    }
}

// A missing trailing newline must not turn the last line into a change.
fn normalize_lines(text: &str) -> String {
    text.lines().fold(String::with_capacity(text.len() + 1), |mut out, line| {
        out.push_str(line);
        out.push('\n');
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "1. Loyalty program\n2. Price review\n3. New region";
    const NEW: &str = "1. Loyalty program\n2. Price increase of 3%\n3. New region\n4. Partner channel\n";

    fn sorted(lines: impl Iterator<Item = impl Into<String>>) -> Vec<String> {
        let mut out = lines.map(Into::into).collect::<Vec<String>>();
        out.sort();
        out
    }

    #[test]
    fn diff_against_self_has_no_changes() {
        let diff = LineDiff::compute(OLD, OLD);
        assert!(diff.is_identical());
        assert_eq!(diff.removed().count(), 0);
        assert_eq!(diff.added().count(), 0);
        assert_eq!(diff.unchanged().count(), 3);
    }

    #[test]
    fn reversed_diff_swaps_removed_and_added() {
        let forward = LineDiff::compute(OLD, NEW);
        let backward = LineDiff::compute(NEW, OLD);
        assert_eq!(sorted(forward.removed()), vec!["2. Price review"]);
        assert_eq!(
            sorted(forward.added()),
            vec!["2. Price increase of 3%", "4. Partner channel"]
        );
        assert_eq!(sorted(forward.removed()), sorted(backward.added()));
        assert_eq!(sorted(forward.added()), sorted(backward.removed()));
    }

    #[test]
    fn reordered_lines_keep_symmetric_cardinality() {
        let a = "x\ny\nz";
        let b = "z\ny\nx";
        let forward = LineDiff::compute(a, b);
        let backward = LineDiff::compute(b, a);
        assert_eq!(forward.removed().count(), backward.added().count());
        assert_eq!(forward.added().count(), backward.removed().count());
    }

    #[test]
    fn trailing_newline_difference_is_not_a_change() {
        assert!(LineDiff::compute("a\nb", "a\nb\n").is_identical());
    }

    #[test]
    fn render_marks_each_line() {
        let diff = LineDiff::compute("keep\nold", "keep\nnew");
        assert_eq!(diff.render(), "  keep\n- old\n+ new");
    }
}
