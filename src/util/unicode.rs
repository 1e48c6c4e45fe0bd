use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: char = '\u{2026}';

/// Display width in terminal cells.
pub fn display_width(s: &str) -> usize {
    s.width()
}

/// Collapse line breaks and tabs into single spaces so free text fits on
/// one row.
pub fn single_line(s: &str) -> String {
    s.split(['\n', '\r', '\t'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `s` down to at most `max_cells` cells, ending in `…` when anything
/// was dropped. Wide characters are never split.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let Some(budget) = max_cells.checked_sub(1) else {
        return String::new();
    };
    let mut used = 0;
    let mut out: String = s
        .graphemes(true)
        .take_while(|g| {
            used += g.width();
            used <= budget
        })
        .collect();
    out.push(ELLIPSIS);
    out
}

/// Right-pad with spaces to exactly `cells` cells (no-op if already wider).
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    let mut out = s.to_string();
    if w < cells {
        out.push_str(&" ".repeat(cells - w));
    }
    out
}
