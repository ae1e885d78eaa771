//! Line splitting and indentation shared by the formatters.

/// Columns per tab stop when help text is split into lines.
const TAB_WIDTH: usize = 4;
/// Spaces per nesting level in generated markup.
const INDENT_WIDTH: usize = 4;
/// A help line holding only this character disables rewrapping until the
/// next blank line.
pub(crate) const NO_REWRAP_MARKER: &str = "\x08";

/// Split free-form text into right-stripped lines with tabs expanded.
pub(crate) fn string2lines(text: &str) -> Vec<String> {
    let normalized = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace(['\x0b', '\x0c'], " ");
    normalized
        .lines()
        .map(|line| expand_tabs(line, TAB_WIDTH).trim_end().to_string())
        .collect()
}

fn expand_tabs(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = width - (column % width);
            out.push_str(&" ".repeat(pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

/// Indent a non-blank line by `level` nesting levels.
pub(crate) fn indent(line: &str, level: usize) -> String {
    if line.trim().is_empty() {
        return line.to_string();
    }
    format!("{}{}", " ".repeat(INDENT_WIDTH * level), line)
}

/// Two-state scan over description lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RewrapState {
    #[default]
    Rewrap,
    Verbatim,
}

impl RewrapState {
    /// Consume one line, yielding the next state and the line to emit (if any).
    pub(crate) fn step(self, line: &str) -> (RewrapState, Option<String>) {
        if line == NO_REWRAP_MARKER {
            return (RewrapState::Verbatim, None);
        }
        let next = if line.is_empty() {
            RewrapState::Rewrap
        } else {
            self
        };
        let emitted = match next {
            RewrapState::Verbatim => format!("| {line}"),
            RewrapState::Rewrap => line.to_string(),
        };
        (next, Some(emitted))
    }
}

/// Apply the no-rewrap convention to a sequence of lines.
pub(crate) fn mark_verbatim_blocks(lines: Vec<String>) -> Vec<String> {
    let mut state = RewrapState::default();
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let (next, emitted) = state.step(&line);
        state = next;
        out.extend(emitted);
    }
    out
}
