#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sqlsift::config::Settings;
    use sqlsift::engine::{analyze_source, AnalysisPool, Analyzer};
    use sqlsift::report::{AnalysisReport, RejectionReason};
    use sqlsift::source::SourceUnit;

    const CONCATENATION: &str = include_str!("../fixtures/ConcatenationDao.java");
    const JAVA_PATTERNS: &str = include_str!("../fixtures/JavaPatternDao.java");

    fn units() -> Vec<SourceUnit> {
        let mut units = vec![
            SourceUnit::new("ConcatenationDao.java", CONCATENATION),
            SourceUnit::new("JavaPatternDao.java", JAVA_PATTERNS),
        ];
        for i in 0..12 {
            units.push(SourceUnit::new(
                format!("Generated{}.java", i),
                format!(
                    "class G{i} {{\n  void q() {{\n    String s = \"SELECT c{i} FROM table_{i} t\";\n  }}\n}}\n"
                ),
            ));
        }
        units
    }

    fn sequential(units: &[SourceUnit]) -> AnalysisReport {
        let mut report = AnalysisReport::new();
        for unit in units {
            report.merge(analyze_source(&unit.path, &unit.text).into_report());
        }
        report
    }

    #[tokio::test]
    async fn test_pool_matches_sequential_analysis() {
        let units = units();
        let expected = sequential(&units);

        let pool = AnalysisPool::new(Arc::new(Analyzer::default()), 4, Duration::from_secs(30));
        let report = pool.run(units).await;

        assert_eq!(report.statements.len(), expected.statements.len());
        assert_eq!(report.digest().unwrap(), expected.digest().unwrap());
    }

    #[tokio::test]
    async fn test_single_worker_gives_same_report() {
        let units = units();
        let wide = AnalysisPool::new(Arc::new(Analyzer::default()), 8, Duration::from_secs(30));
        let narrow = AnalysisPool::new(Arc::new(Analyzer::default()), 1, Duration::from_secs(30));

        let a = wide.run(units.clone()).await;
        let b = narrow.run(units).await;
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[tokio::test]
    async fn test_expired_units_are_rejected_whole() {
        let pool = AnalysisPool::new(Arc::new(Analyzer::default()), 2, Duration::ZERO);
        let mut report = pool
            .run(vec![
                SourceUnit::new("A.java", CONCATENATION),
                SourceUnit::new("B.java", JAVA_PATTERNS),
            ])
            .await;
        report.sort();

        assert!(report.statements.is_empty());
        assert!(report.diagnostics.is_empty());
        let rejected: Vec<_> = report
            .rejections
            .iter()
            .map(|r| (r.source_file.as_str(), r.start_line, r.reason))
            .collect();
        assert_eq!(
            rejected,
            vec![
                ("A.java", 0, RejectionReason::Timeout),
                ("B.java", 0, RejectionReason::Timeout),
            ]
        );
    }

    #[tokio::test]
    async fn test_deeply_nested_unit_is_skipped_not_fatal() {
        let depth = 10_000;
        let deep = format!(
            "class Deep {{\n  void q() {{\n    String sql = \"SELECT * FROM t\" + f({}x{});\n  }}\n}}\n",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let fine = "class Fine {\n  void q() {\n    String s = \"SELECT id FROM users\";\n  }\n}\n";

        let pool = AnalysisPool::new(Arc::new(Analyzer::default()), 2, Duration::from_secs(30));
        let mut report = pool
            .run(vec![
                SourceUnit::new("Deep.java", deep),
                SourceUnit::new("Fine.java", fine),
            ])
            .await;
        report.sort();

        assert_eq!(report.statements.len(), 1);
        assert_eq!(report.statements[0].source_file, "Fine.java");
        assert_eq!(report.rejections.len(), 1);
        let rejection = &report.rejections[0];
        assert_eq!(
            (rejection.source_file.as_str(), rejection.start_line, rejection.reason),
            ("Deep.java", 0, RejectionReason::InternalError)
        );
        assert!(rejection
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("exceeds the limit of 128")));
    }

    #[tokio::test]
    async fn test_empty_run() {
        let pool = AnalysisPool::new(Arc::new(Analyzer::default()), 3, Duration::from_secs(1));
        assert!(pool.run(Vec::new()).await.is_empty());
    }

    #[test]
    fn test_pool_sizing() {
        let mut settings = Settings::default();
        settings.engine.workers = 3;
        let pool = AnalysisPool::from_settings(Arc::new(Analyzer::new(&settings)));
        assert_eq!(pool.workers(), 3);

        let pool = AnalysisPool::new(Arc::new(Analyzer::default()), 0, Duration::from_secs(1));
        assert_eq!(pool.workers(), 1);
    }
}
