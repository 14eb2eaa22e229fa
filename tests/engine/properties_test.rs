#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sqlsift::classify::classify;
    use sqlsift::config::FilterSettings;
    use sqlsift::engine::{analyze_source, UnitOutcome};

    const SNIPPETS: &[&str] = &[
        "String q = ",
        "q = q + ",
        "q += ",
        "sb.append(",
        "StringBuilder sb = new StringBuilder();",
        "String.format(",
        "\"SELECT a \"",
        "\"FROM t \"",
        "\"LEFT JOIN u ON t.id = u.id \"",
        "\"WHERE x = %s\"",
        "\"UPDATE t SET a = 1\"",
        "\"Log message: DELETE done\"",
        "\"it's \\\"quoted\\\"\"",
        " + ",
        ", ",
        "env",
        "build()",
        ");",
        ";",
        "\n",
        "if (f) {",
        "for (String c : cs) {",
        "}",
        "{",
        "// note \"SELECT\"\n",
        "/* MERGE INTO x */",
        "'\"'",
        "\"\"\"\n  SELECT 1\n  FROM dual\n  \"\"\"",
    ];

    fn java_like() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(SNIPPETS), 0..40).prop_map(|parts| {
            format!("class P {{\n void m() {{\n{}\n }}\n}}\n", parts.concat())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_analysis_is_deterministic(source in java_like()) {
            let first = analyze_source("P.java", &source);
            let second = analyze_source("P.java", &source);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_emitted_statements_are_well_formed(source in java_like()) {
            let min = FilterSettings::default().min_confidence;
            let report = analyze_source("P.java", &source).into_report();
            let line_count = source.lines().count().max(1);

            for statement in &report.statements {
                prop_assert!(!statement.tables.is_empty());
                prop_assert!(statement.confidence >= min && statement.confidence <= 1.0);
                prop_assert_eq!(classify(&statement.raw_text), Some(statement.statement_type));
                prop_assert!(statement.start_line >= 1);
                prop_assert!(statement.start_line <= statement.end_line);
                prop_assert!(statement.end_line <= line_count);
            }
            for rejection in &report.rejections {
                prop_assert_eq!(rejection.source_file.as_str(), "P.java");
            }
        }

        #[test]
        fn prop_arbitrary_text_yields_an_outcome(source in "\\PC{0,300}") {
            match analyze_source("R.java", &source) {
                UnitOutcome::Completed { diagnostics, .. } => {
                    for diagnostic in diagnostics {
                        prop_assert!(diagnostic.line >= 1);
                    }
                }
                UnitOutcome::Rejected(record) => {
                    prop_assert_eq!(record.start_line, 0);
                }
            }
        }
    }
}
