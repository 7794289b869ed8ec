use crate::error::{Result, TagscopeError};
use std::path::PathBuf;

/// One line of `global --result=cscope` output, before column resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOccurrence {
    pub symbol: String,
    pub path: PathBuf,
    /// 1-based, as reported by the tool.
    pub line: u32,
}

/// Parses cscope-format query output: one occurrence per line,
/// `<path> <symbol> <line> <line image>`, the line image keeping any
/// further spaces. Empty or whitespace-only output is zero matches;
/// a line with fewer than four fields means we have lost sync with the
/// tool's output format and is a hard error.
pub fn parse_cscope_output(stdout: &[u8]) -> Result<Vec<SymbolOccurrence>> {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .lines()
        .map(|line| parse_line(line.trim_end_matches('\r')))
        .collect()
}

fn parse_line(line: &str) -> Result<SymbolOccurrence> {
    let malformed = || TagscopeError::MalformedOutput(line.to_string());
    let mut fields = line.splitn(4, ' ');
    let path = fields.next().filter(|f| !f.is_empty()).ok_or_else(malformed)?;
    let symbol = fields.next().filter(|f| !f.is_empty()).ok_or_else(malformed)?;
    let line_no = fields.next().ok_or_else(malformed)?;
    // The line image may be empty text, but the field itself must exist.
    let _image = fields.next().ok_or_else(malformed)?;
    let line_no: u32 = line_no.parse().map_err(|_| malformed())?;
    Ok(SymbolOccurrence {
        symbol: symbol.to_string(),
        path: PathBuf::from(path),
        line: line_no,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parses_a_definition_line() {
        let occs = parse_cscope_output(b"/proj/a.c main 10 int main() {\n").unwrap();
        assert_eq!(
            occs,
            vec![SymbolOccurrence {
                symbol: "main".to_string(),
                path: PathBuf::from("/proj/a.c"),
                line: 10,
            }]
        );
    }

    #[test]
    fn preserves_tool_output_order() {
        let occs = parse_cscope_output(
            b"/proj/b.c foo 3 foo();\n/proj/a.c foo 12 int foo(void)\n/proj/b.c foo 9 foo();\n",
        )
        .unwrap();
        let lines: Vec<(&Path, u32)> = occs.iter().map(|o| (o.path.as_path(), o.line)).collect();
        assert_eq!(
            lines,
            vec![
                (Path::new("/proj/b.c"), 3),
                (Path::new("/proj/a.c"), 12),
                (Path::new("/proj/b.c"), 9),
            ]
        );
    }

    #[test]
    fn line_image_keeps_embedded_spaces() {
        // splitn must stop after the line number; the image is the remainder.
        let occs = parse_cscope_output(b"/p/x.c f 1 int f(int a, int b) { return a; }").unwrap();
        assert_eq!(occs.len(), 1);
        assert_eq!(occs[0].symbol, "f");
    }

    #[test]
    fn empty_output_is_zero_matches() {
        assert!(parse_cscope_output(b"").unwrap().is_empty());
        assert!(parse_cscope_output(b"  \n\t\n").unwrap().is_empty());
    }

    #[test]
    fn short_line_is_a_malformed_output_error() {
        let err = parse_cscope_output(b"/proj/a.c main 10").unwrap_err();
        assert!(matches!(err, TagscopeError::MalformedOutput(_)));
    }

    #[test]
    fn non_numeric_line_number_is_malformed() {
        let err = parse_cscope_output(b"/proj/a.c main ten int main() {").unwrap_err();
        assert!(matches!(err, TagscopeError::MalformedOutput(_)));
    }

    #[test]
    fn crlf_terminated_lines_parse() {
        let occs = parse_cscope_output(b"/proj/a.c main 10 int main() {\r\n").unwrap();
        assert_eq!(occs[0].line, 10);
    }
}
