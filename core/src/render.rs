//! Plain-text rendering helpers for help and usage output.

/// Spaces between columns.
const COLUMN_GAP: usize = 4;

/// Lays `rows` out as left-aligned columns separated by four spaces.
///
/// Trailing padding on each line and surrounding whitespace on the whole
/// table are trimmed.
///
/// ```
/// use action_runner_core::render::tabular;
///
/// let table = tabular(&[
///     vec!["deploy".into(), "Ship it".into()],
///     vec!["db".into(), "Database tasks".into()],
/// ]);
/// assert_eq!(table, "deploy    Ship it\ndb        Database tasks");
/// ```
pub fn tabular(rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate() {
            line.push_str(cell);
            let pad = widths[idx] + COLUMN_GAP - cell.chars().count();
            line.push_str(&" ".repeat(pad));
        }
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n").trim().to_string()
}

/// A title underlined with `=`.
pub fn header(title: &str) -> String {
    format!("{title}\n{}", "=".repeat(title.chars().count()))
}
