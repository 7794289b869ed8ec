use crate::parser::SymbolOccurrence;
use std::path::{Path, PathBuf};

/// Authoritative source of line text for position resolution: the open
/// editor buffer when one exists, otherwise the file on disk.
pub trait LineSource: Send + Sync {
    /// Returns the text of `line` (0-based) in `path`, without its
    /// trailing newline, or None when the file or line is unavailable.
    fn line_text(&self, path: &Path, line: u32) -> Option<String>;
}

/// An exact character range for one symbol occurrence. Columns are
/// UTF-16 code units, 0-based, spanning exactly the symbol text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub path: PathBuf,
    /// 0-based.
    pub line: u32,
    pub col_start: u32,
    pub col_end: u32,
}

/// Re-derives the column of an occurrence by locating the symbol text
/// on its reported line. The tool's own line image strips leading
/// whitespace in some encodings, so its column is never trusted.
///
/// Returns None (with a diagnostic) when the symbol no longer appears
/// on that line, e.g. the file changed after the index was built; a
/// guessed column is never emitted.
pub fn resolve_occurrence(
    occurrence: &SymbolOccurrence,
    lines: &dyn LineSource,
) -> Option<ResolvedLocation> {
    let line = occurrence.line.checked_sub(1)?;
    let text = match lines.line_text(&occurrence.path, line) {
        Some(text) => text,
        None => {
            tracing::warn!(
                path = %occurrence.path.display(),
                line = occurrence.line,
                "dropping occurrence: line not available"
            );
            return None;
        }
    };
    let byte_start = match text.find(&occurrence.symbol) {
        Some(idx) => idx,
        None => {
            tracing::warn!(
                symbol = %occurrence.symbol,
                path = %occurrence.path.display(),
                line = occurrence.line,
                "dropping occurrence: symbol not found on its reported line"
            );
            return None;
        }
    };
    let col_start: usize = text[..byte_start].chars().map(char::len_utf16).sum();
    let symbol_width: usize = occurrence.symbol.chars().map(char::len_utf16).sum();
    Some(ResolvedLocation {
        path: occurrence.path.clone(),
        line,
        col_start: col_start as u32,
        col_end: (col_start + symbol_width) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapLines(HashMap<(PathBuf, u32), String>);

    impl MapLines {
        fn single(path: &str, line: u32, text: &str) -> Self {
            let mut map = HashMap::new();
            map.insert((PathBuf::from(path), line), text.to_string());
            MapLines(map)
        }
    }

    impl LineSource for MapLines {
        fn line_text(&self, path: &Path, line: u32) -> Option<String> {
            self.0.get(&(path.to_path_buf(), line)).cloned()
        }
    }

    fn occurrence(symbol: &str, path: &str, line: u32) -> SymbolOccurrence {
        SymbolOccurrence {
            symbol: symbol.to_string(),
            path: PathBuf::from(path),
            line,
        }
    }

    #[test]
    fn resolves_the_exact_symbol_span() {
        let lines = MapLines::single("/proj/a.c", 9, "int main() {");
        let loc = resolve_occurrence(&occurrence("main", "/proj/a.c", 10), &lines).unwrap();
        assert_eq!(
            loc,
            ResolvedLocation {
                path: PathBuf::from("/proj/a.c"),
                line: 9,
                col_start: 4,
                col_end: 8,
            }
        );
    }

    #[test]
    fn leading_whitespace_is_counted() {
        // The tool's line image drops this indentation; the buffer keeps it.
        let lines = MapLines::single("/proj/a.c", 4, "        callee();");
        let loc = resolve_occurrence(&occurrence("callee", "/proj/a.c", 5), &lines).unwrap();
        assert_eq!((loc.col_start, loc.col_end), (8, 14));
    }

    #[test]
    fn resolved_span_equals_the_symbol_text() {
        let text = "static int helper_fn(void) {";
        let lines = MapLines::single("/p/x.c", 0, text);
        let loc = resolve_occurrence(&occurrence("helper_fn", "/p/x.c", 1), &lines).unwrap();
        assert_eq!(
            &text[loc.col_start as usize..loc.col_end as usize],
            "helper_fn"
        );
    }

    #[test]
    fn columns_are_utf16_code_units() {
        // "日本" is 2 UTF-16 units but 6 UTF-8 bytes.
        let lines = MapLines::single("/p/u.c", 0, "日本 name = 1;");
        let loc = resolve_occurrence(&occurrence("name", "/p/u.c", 1), &lines).unwrap();
        assert_eq!((loc.col_start, loc.col_end), (3, 7));
    }

    #[test]
    fn missing_symbol_drops_the_occurrence() {
        let lines = MapLines::single("/proj/a.c", 9, "int other() {");
        assert!(resolve_occurrence(&occurrence("main", "/proj/a.c", 10), &lines).is_none());
    }

    #[test]
    fn unavailable_line_drops_the_occurrence() {
        let lines = MapLines(HashMap::new());
        assert!(resolve_occurrence(&occurrence("main", "/proj/a.c", 10), &lines).is_none());
        // Line 0 from the tool would underflow; dropped, not panicked.
        assert!(resolve_occurrence(&occurrence("main", "/proj/a.c", 0), &lines).is_none());
    }
}
