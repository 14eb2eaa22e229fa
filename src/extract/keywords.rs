//! Reserved words that end a table reference or can never be an alias.

/// Words that are never table aliases.
const RESERVED: &[&str] = &[
    "ALL", "AND", "AS", "BY", "CASE", "CONNECT", "CROSS", "DELETE", "DISTINCT", "ELSE", "END",
    "EXCEPT", "FETCH", "FOR", "FROM", "FULL", "GROUP", "HAVING", "IN", "INNER", "INSERT",
    "INTERSECT", "INTO", "IS", "JOIN", "LATERAL", "LEFT", "LIMIT", "MATCHED", "MERGE", "MINUS",
    "NATURAL", "NOT", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PARTITION", "QUALIFY", "RETURNING",
    "RIGHT", "SELECT", "SET", "START", "TABLESAMPLE", "THEN", "UNION", "UPDATE", "USING", "VALUES",
    "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Words that qualify a following `JOIN`.
const JOIN_QUALIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "FULL", "OUTER", "CROSS", "NATURAL"];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(word))
}

pub fn is_join_qualifier(word: &str) -> bool {
    JOIN_QUALIFIERS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
