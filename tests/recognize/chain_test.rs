#[cfg(test)]
mod tests {
    use sqlsift::assemble::{assemble, AssembledStatement};
    use sqlsift::config::RecognizerSettings;
    use sqlsift::diagnostics::Diagnostics;
    use sqlsift::engine::Deadline;
    use sqlsift::lexer::segment;
    use sqlsift::recognize::{ConstructionChain, Idiom, Recognized, Recognizer};
    use sqlsift::source::LineIndex;

    fn method(body: &str) -> String {
        format!("class Dao {{\n  void run(String env, long id) {{\n{}\n  }}\n}}\n", body)
    }

    fn chains(source: &str) -> Vec<(ConstructionChain, AssembledStatement)> {
        let mut diagnostics = Diagnostics::new();
        let segments = segment(source, &mut diagnostics);
        let settings = RecognizerSettings::default();
        let recognition = Recognizer::new(&settings)
            .recognize(&segments, &Deadline::none())
            .unwrap();
        let lines = LineIndex::new(source);
        recognition
            .items
            .into_iter()
            .filter_map(|item| match item {
                Recognized::Chain(chain) => {
                    let assembled = assemble(&chain, &recognition.pool, "Dao.java", &lines);
                    Some((chain, assembled))
                }
                Recognized::Excluded(_) => None,
            })
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        chains(source).into_iter().map(|(_, a)| a.text).collect()
    }

    #[test]
    fn test_fluent_append_preserves_order() {
        let source = method(
            r#"    StringBuilder sb = new StringBuilder();
    sb.append("SELECT a ").append("FROM t ").append("WHERE x = 1");"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.idiom, Idiom::AppendChain);
        assert_eq!(found[0].1.text, "SELECT a FROM t WHERE x = 1");
    }

    #[test]
    fn test_separate_append_statements() {
        let source = method(
            r#"    StringBuilder sb = new StringBuilder("SELECT a ");
    sb.append("FROM t ");
    sb.append("ORDER BY a");"#,
        );
        assert_eq!(texts(&source), vec!["SELECT a FROM t ORDER BY a"]);
    }

    #[test]
    fn test_plus_accumulation_and_compound_assignment() {
        let source = method(
            r#"    String q = "SELECT a ";
    q = q + "FROM t ";
    q += "WHERE b = 2";"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.idiom, Idiom::PlusAccumulation);
        assert_eq!(found[0].1.text, "SELECT a FROM t WHERE b = 2");
        assert_eq!(found[0].1.start_line, 3);
        assert_eq!(found[0].1.end_line, 5);
    }

    #[test]
    fn test_prepending_keeps_source_order_of_text() {
        let source = method(
            r#"    String q = "FROM t";
    q = "SELECT a " + q;"#,
        );
        assert_eq!(texts(&source), vec!["SELECT a FROM t"]);
    }

    #[test]
    fn test_reassignment_starts_a_new_chain() {
        let source = method(
            r#"    String q = "SELECT a FROM t";
    jdbc.query(q);
    q = "DELETE FROM t";"#,
        );
        assert_eq!(texts(&source), vec!["SELECT a FROM t", "DELETE FROM t"]);
    }

    #[test]
    fn test_format_with_dynamic_and_constant_arguments() {
        let source = method(
            r#"    String q = String.format("SELECT * FROM %s_%s LIMIT %d", "analytics", env, 10);"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.idiom, Idiom::FormatCall);
        assert_eq!(found[0].1.text, "SELECT * FROM analytics_* LIMIT 10");
        assert!(found[0].1.has_unresolved_placeholder);
    }

    #[test]
    fn test_format_template_built_from_plus() {
        let source = method(
            r#"    String q = String.format(
        "SELECT u.id " +
        "FROM users_%s u",
        env);"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.text, "SELECT u.id FROM users_* u");
        assert_eq!(found[0].1.start_line, 3);
        assert_eq!(found[0].1.end_line, 5);
    }

    #[test]
    fn test_format_with_locale_argument() {
        let source = method(
            r#"    String q = String.format(Locale.ROOT, "SELECT id FROM %s", "users");"#,
        );
        assert_eq!(texts(&source), vec!["SELECT id FROM users"]);
    }

    #[test]
    fn test_message_format() {
        let source = method(
            r#"    String q = MessageFormat.format("DELETE FROM {0} WHERE id = {1}", "audit", id);"#,
        );
        assert_eq!(texts(&source), vec!["DELETE FROM audit WHERE id = *"]);
    }

    #[test]
    fn test_formatted_method() {
        let source = method(r#"    String q = "UPDATE users_%s SET a = 1".formatted(env);"#);
        assert_eq!(texts(&source), vec!["UPDATE users_* SET a = 1"]);
    }

    #[test]
    fn test_conditional_fragments_are_tagged() {
        let source = method(
            r#"    String q = "SELECT a FROM t ";
    if (env != null) {
        q += "WHERE b = 1";
    }"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        let (chain, assembled) = &found[0];
        assert_eq!(chain.max_conditional_depth(), 1);
        assert_eq!(assembled.max_conditional_depth, 1);
        assert_eq!(assembled.text, "SELECT a FROM t WHERE b = 1");

        let where_at = assembled.text.find("WHERE").unwrap();
        assert!(assembled.is_conditional(&(where_at..where_at + 5)));
        assert!(!assembled.is_conditional(&(0..6)));
    }

    #[test]
    fn test_loop_accumulation_wildcards_loop_values() {
        let source = method(
            r#"    String q = "SELECT a FROM t ";
    for (String c : columns) {
        q = q + "AND " + c + " IS NOT NULL ";
    }"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.idiom, Idiom::LoopAccumulation);
        assert_eq!(found[0].1.text, "SELECT a FROM t AND * IS NOT NULL ");
        assert_eq!(found[0].1.wildcard_ranges().count(), 1);
    }

    #[test]
    fn test_call_argument_is_a_construction() {
        let source = method(
            r#"    String name = "bob";
    jdbc.query("SELECT id FROM users WHERE n = " + name);"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.variable, None);
        assert_eq!(found[0].1.text, "SELECT id FROM users WHERE n = *");
    }

    #[test]
    fn test_comments_do_not_contribute() {
        let source = method(
            r#"    String q = "SELECT a " /* + "FROM wrong " */ + "FROM t"; // q += " WHERE"
    // String old = "DELETE FROM t";"#,
        );
        assert_eq!(texts(&source), vec!["SELECT a FROM t"]);
    }

    #[test]
    fn test_numeric_constant_is_substituted() {
        let source = method(r#"    String q = "SELECT a FROM t LIMIT " + 50;"#);
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.text, "SELECT a FROM t LIMIT 50");
        assert!(!found[0].1.has_unresolved_placeholder);
    }

    #[test]
    fn test_catch_body_is_conditional() {
        let source = method(
            r#"    String q = "SELECT a FROM t ";
    try {
        jdbc.ping();
    } catch (Exception e) {
        q += "WHERE fallback = 1";
    }"#,
        );
        let found = chains(&source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.text, "SELECT a FROM t WHERE fallback = 1");
        assert_eq!(found[0].1.max_conditional_depth, 1);
    }

    #[test]
    fn test_strings_without_keywords_are_ignored() {
        let source = method(
            r#"    String label = "Total: ";
    String msg = label + "done";
    log.info("finished run");"#,
        );
        assert!(chains(&source).is_empty());
    }
}
