#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sqlsift::diagnostics::Diagnostics;
    use sqlsift::lexer::{decode_literal, segment, SegmentKind, TextSegment};

    fn kinds<'a>(segments: &[TextSegment<'a>]) -> Vec<(SegmentKind, &'a str)> {
        segments.iter().map(|s| (s.kind, s.text)).collect()
    }

    fn assert_covers(source: &str, segments: &[TextSegment<'_>]) {
        let mut cursor = 0;
        for seg in segments {
            assert_eq!(seg.start, cursor, "gap or overlap before {:?}", seg);
            assert!(seg.end > seg.start, "empty segment {:?}", seg);
            assert_eq!(seg.text, &source[seg.start..seg.end]);
            cursor = seg.end;
        }
        assert_eq!(cursor, source.len());
    }

    #[test]
    fn test_code_literal_and_comments() {
        let source = "String q = \"SELECT 1\"; // trailing\n/* block */ run(q);";
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Code, "String q = "),
                (SegmentKind::Literal, "\"SELECT 1\""),
                (SegmentKind::Code, "; "),
                (SegmentKind::LineComment, "// trailing"),
                (SegmentKind::Code, "\n"),
                (SegmentKind::BlockComment, "/* block */"),
                (SegmentKind::Code, " run(q);"),
            ]
        );
        assert!(diagnostics.is_empty());
        assert_covers(source, &segments);
    }

    #[test]
    fn test_block_comment_closes_at_first_terminator() {
        let source = "/* a /* b */ c */";
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::BlockComment, "/* a /* b */"),
                (SegmentKind::Code, " c */"),
            ]
        );
    }

    #[test]
    fn test_comment_markers_inside_literals_are_text() {
        let source = r#"String s = "-- not // a /* comment */";"#;
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        let literals: Vec<_> = segments.iter().filter(|s| s.is_literal()).collect();
        assert_eq!(literals.len(), 1);
        assert_eq!(
            decode_literal(literals[0].text, literals[0].terminated),
            "-- not // a /* comment */"
        );
        assert!(segments
            .iter()
            .all(|s| !matches!(s.kind, SegmentKind::LineComment | SegmentKind::BlockComment)));
    }

    #[test]
    fn test_escaped_quotes_stay_inside_literal() {
        let source = r#"String s = "a \"quoted\" b"; char c = '"';"#;
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        let literals: Vec<_> = segments.iter().filter(|s| s.is_literal()).collect();
        assert_eq!(literals.len(), 1);
        assert_eq!(literals[0].text, r#""a \"quoted\" b""#);
        assert_eq!(decode_literal(literals[0].text, true), "a \"quoted\" b");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_text_block() {
        let source = "String q = \"\"\"\n        SELECT id\n        FROM users\n        \"\"\";";
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        let block = segments
            .iter()
            .find(|s| s.is_literal())
            .expect("text block segment");
        assert!(block.is_text_block());
        assert_eq!(decode_literal(block.text, block.terminated), "SELECT id\nFROM users\n");
        assert_covers(source, &segments);
    }

    #[test]
    fn test_unterminated_literal_reports_diagnostic() {
        let source = "String q = \"SELECT a FROM t";
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        let last = segments.last().expect("segments");
        assert!(last.is_literal());
        assert!(!last.terminated);
        assert_eq!(decode_literal(last.text, last.terminated), "SELECT a FROM t");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has_warnings());
        assert_covers(source, &segments);
    }

    #[test]
    fn test_unterminated_block_comment_reports_diagnostic() {
        let source = "int x = 1; /* never closed";
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);

        let last = segments.last().expect("segments");
        assert_eq!(last.kind, SegmentKind::BlockComment);
        assert!(!last.terminated);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_empty_source() {
        let mut diagnostics = Diagnostics::new();
        assert!(segment("", &mut diagnostics).is_empty());
        assert!(diagnostics.is_empty());
    }

    proptest! {
        #[test]
        fn prop_segments_cover_source(source in "\\PC{0,200}") {
            let mut diagnostics = Diagnostics::new();
            let segments = segment(&source, &mut diagnostics);
            let mut cursor = 0;
            for seg in &segments {
                prop_assert_eq!(seg.start, cursor);
                prop_assert!(seg.end > seg.start);
                prop_assert_eq!(seg.text, &source[seg.start..seg.end]);
                cursor = seg.end;
            }
            prop_assert_eq!(cursor, source.len());
        }

        #[test]
        fn prop_java_like_text_covers(source in r#"[a-z =+;(){}"'/*\\\n]{0,120}"#) {
            let mut diagnostics = Diagnostics::new();
            let segments = segment(&source, &mut diagnostics);
            let joined: String = segments.iter().map(|s| s.text).collect();
            prop_assert_eq!(joined, source.clone());
        }
    }
}
