#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use sqlsift::classify::StatementType;
    use sqlsift::engine::analyze_source;
    use sqlsift::extract::{TableReference, TableRole};
    use sqlsift::report::{AnalysisReport, RejectionReason, StatementRecord};

    const CONCATENATION: &str = include_str!("../fixtures/ConcatenationDao.java");
    const JAVA_PATTERNS: &str = include_str!("../fixtures/JavaPatternDao.java");

    fn analyze(path: &str, source: &str) -> AnalysisReport {
        let mut report = analyze_source(path, source).into_report();
        report.sort();
        report
    }

    /// 1-based line of the first `needle` after the line holding `anchor`.
    fn line_after(source: &str, anchor: &str, needle: &str) -> usize {
        let lines: Vec<&str> = source.lines().collect();
        let from = lines
            .iter()
            .position(|l| l.contains(anchor))
            .unwrap_or_else(|| panic!("anchor `{}` not in fixture", anchor));
        let offset = lines[from..]
            .iter()
            .position(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("`{}` not after `{}`", needle, anchor));
        from + offset + 1
    }

    fn summary(tables: &[TableReference]) -> Vec<(&str, Option<&str>, TableRole, bool)> {
        tables
            .iter()
            .map(|t| (t.name.as_str(), t.alias.as_deref(), t.role, t.conditional))
            .collect()
    }

    fn statement_at<'r>(report: &'r AnalysisReport, line: usize) -> &'r StatementRecord {
        report
            .statements
            .iter()
            .find(|s| s.start_line == line)
            .unwrap_or_else(|| panic!("no statement starting on line {}", line))
    }

    #[test]
    fn test_concatenation_fixture_counts() {
        let report = analyze("ConcatenationDao.java", CONCATENATION);

        assert_eq!(report.statements.len(), 5);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.rejections_for(RejectionReason::FalsePositive).count(), 2);
        assert_eq!(report.rejections_for(RejectionReason::NoKeywordMatch).count(), 2);
        assert_eq!(report.rejections_for(RejectionReason::UnresolvedOrigin).count(), 0);

        let types: Vec<_> = report.statements.iter().map(|s| s.statement_type).collect();
        assert_eq!(
            types,
            vec![
                StatementType::Select,
                StatementType::Select,
                StatementType::Insert,
                StatementType::Delete,
                StatementType::Merge,
            ]
        );
    }

    #[test]
    fn test_conditional_concatenation() {
        let report = analyze("ConcatenationDao.java", CONCATENATION);
        let start = line_after(CONCATENATION, "conditionalJoin(", "String sql =");
        let end = line_after(CONCATENATION, "conditionalJoin(", "WHERE u.status");
        let record = statement_at(&report, start);

        assert_eq!(record.end_line, end);
        assert_eq!(
            summary(&record.tables),
            vec![
                ("users", Some("u"), TableRole::Source, false),
                ("orders", Some("o"), TableRole::Joined, true),
                ("products", Some("p"), TableRole::Joined, true),
            ]
        );
        assert_snapshot!(
            record.raw_text,
            @"SELECT u.user_id, u.username FROM users u LEFT JOIN orders o ON u.user_id = o.user_id LEFT JOIN products p ON o.product_id = p.product_id WHERE u.status = 'ACTIVE'"
        );
    }

    #[test]
    fn test_loop_concatenation() {
        let report = analyze("ConcatenationDao.java", CONCATENATION);
        let start = line_after(CONCATENATION, "loopJoin(", "String sql =");
        let record = statement_at(&report, start);

        assert_eq!(
            summary(&record.tables),
            vec![
                ("users", Some("u"), TableRole::Source, false),
                ("*", Some("t"), TableRole::Joined, true),
            ]
        );
        assert_snapshot!(
            record.raw_text,
            @"SELECT u.user_id, u.username FROM users u LEFT JOIN * t ON u.user_id = t.user_id WHERE u.status = 'ACTIVE'"
        );
    }

    #[test]
    fn test_insert_delete_and_merge() {
        let report = analyze("ConcatenationDao.java", CONCATENATION);

        let insert = statement_at(&report, line_after(CONCATENATION, "insertAudit(", "String sql ="));
        assert_eq!(
            summary(&insert.tables),
            vec![("user_audit_logs", None, TableRole::Target, false)]
        );
        assert_snapshot!(
            insert.raw_text,
            @"INSERT INTO user_audit_logs (user_id, action_type, created_date) VALUES ('*', '*', SYSDATE)"
        );

        let delete = statement_at(&report, line_after(CONCATENATION, "deleteSessions(", "String sql ="));
        assert_eq!(
            summary(&delete.tables),
            vec![("user_sessions", None, TableRole::Target, false)]
        );

        let merge = statement_at(&report, line_after(CONCATENATION, "mergeStatistics(", "String sql ="));
        assert_eq!(
            summary(&merge.tables),
            vec![
                ("user_statistics", Some("us"), TableRole::Target, false),
                ("orders", None, TableRole::Subquery, false),
            ]
        );
    }

    #[test]
    fn test_concatenation_false_positives() {
        let report = analyze("ConcatenationDao.java", CONCATENATION);

        let log_line = line_after(CONCATENATION, "insertAudit(", "Insert Concat SQL");
        let prose_line = line_after(CONCATENATION, "nonSqlStrings(", "falsePositive1");
        let false_positives: Vec<_> = report
            .rejections_for(RejectionReason::FalsePositive)
            .map(|r| (r.start_line, r.detail.as_deref()))
            .collect();
        assert_eq!(
            false_positives,
            vec![
                (log_line, Some("label followed by colon")),
                (prose_line, Some("prose word `the` as table")),
            ]
        );

        let no_match: Vec<_> = report
            .rejections_for(RejectionReason::NoKeywordMatch)
            .map(|r| r.start_line)
            .collect();
        assert_eq!(
            no_match,
            vec![
                line_after(CONCATENATION, "nonSqlStrings(", "notSQL1"),
                line_after(CONCATENATION, "nonSqlStrings(", "falsePositive2"),
            ]
        );
    }

    #[test]
    fn test_java_pattern_fixture() {
        let report = analyze("JavaPatternDao.java", JAVA_PATTERNS);

        assert_eq!(report.statements.len(), 4);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.rejections_for(RejectionReason::FalsePositive).count(), 0);
        assert_eq!(report.rejections_for(RejectionReason::NoKeywordMatch).count(), 3);

        let builder = &report.statements[0];
        assert_eq!(
            summary(&builder.tables),
            vec![
                ("users", Some("u"), TableRole::Source, false),
                ("orders", Some("o"), TableRole::Joined, false),
            ]
        );
        assert_snapshot!(
            builder.raw_text,
            @"SELECT u.user_id, u.username, o.order_date FROM users u LEFT JOIN orders o ON u.user_id = o.user_id WHERE u.status = 'ACTIVE' ORDER BY o.order_date DESC"
        );
    }

    #[test]
    fn test_format_pattern() {
        let report = analyze("JavaPatternDao.java", JAVA_PATTERNS);
        let start = line_after(JAVA_PATTERNS, "formatPattern(", "String sql =");
        let record = statement_at(&report, start);

        assert_eq!(
            record.end_line,
            line_after(JAVA_PATTERNS, "formatPattern(", "INNER JOIN")
        );
        assert_eq!(
            summary(&record.tables),
            vec![
                ("users_*", Some("u"), TableRole::Source, false),
                ("products_*", Some("p"), TableRole::Joined, false),
            ]
        );
        assert!(record.confidence >= 0.5 && record.confidence < 1.0);
    }

    #[test]
    fn test_plus_equals_and_large_scale() {
        let report = analyze("JavaPatternDao.java", JAVA_PATTERNS);

        let plus = statement_at(&report, line_after(JAVA_PATTERNS, "plusEqualsPattern(", "String sql ="));
        assert_eq!(
            summary(&plus.tables),
            vec![
                ("users", Some("u"), TableRole::Source, false),
                ("user_profiles", Some("up"), TableRole::Joined, false),
            ]
        );

        let large = statement_at(&report, line_after(JAVA_PATTERNS, "largeScale(", "String sql ="));
        assert_eq!(
            summary(&large.tables),
            vec![
                ("main_table", Some("t1"), TableRole::Source, false),
                ("table*", Some("t*"), TableRole::Joined, true),
            ]
        );
        assert_snapshot!(
            large.raw_text,
            @"SELECT t*.field*, t1.main_id FROM main_table t1 LEFT JOIN table* t* ON t1.main_id = t*.main_id WHERE t1.status = 'ACTIVE'"
        );
    }

    #[test]
    fn test_unresolved_origins() {
        let report = analyze("JavaPatternDao.java", JAVA_PATTERNS);

        let unresolved: Vec<_> = report
            .rejections_for(RejectionReason::UnresolvedOrigin)
            .map(|r| (r.start_line, r.detail.as_deref()))
            .collect();
        assert_eq!(
            unresolved,
            vec![
                (
                    line_after(JAVA_PATTERNS, "variableReferencePattern(", "String sql ="),
                    Some("built from variable `baseTable`"),
                ),
                (
                    line_after(JAVA_PATTERNS, "methodCallPattern(", "String sql ="),
                    Some("built from result of `buildBaseQuery()`"),
                ),
            ]
        );
        // Returned literals are not candidates on their own.
        let helper = line_after(JAVA_PATTERNS, "buildBaseQuery() {", "return");
        assert!(report.statements.iter().all(|s| s.start_line != helper));
    }

    #[test]
    fn test_report_json_shape() {
        let report = analyze("JavaPatternDao.java", JAVA_PATTERNS);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        let first = &json["statements"][0];
        assert_eq!(first["sourceFile"], "JavaPatternDao.java");
        assert_eq!(first["statementType"], "SELECT");
        assert_eq!(first["tables"][1]["role"], "joined");
        assert_eq!(first["tables"][1]["conditional"], false);
        assert_eq!(json["rejections"][0]["reason"], "unresolved-origin");
        assert!(json["rejections"][0]["detail"].is_string());
        assert!(json["diagnostics"].as_array().is_some_and(|d| d.is_empty()));
    }
}
