//! Table and reference extraction.
//!
//! A single pass over the assembled text with one frame per parenthesis
//! level. Clause keywords (`FROM`, `JOIN`, `INTO`, a leading `UPDATE` or
//! `DELETE`, `MERGE ... USING`) put the frame into a state that takes the
//! next word as a table name and the word after that, unless reserved, as
//! its alias. A parenthesis followed by `SELECT` or `WITH` opens a subquery
//! frame; every table found inside it has the `subquery` role. Other
//! parentheses are expression groups or call arguments, where `FROM`
//! (`EXTRACT(YEAR FROM d)`, `TRIM(LEADING '0' FROM c)`) names no table.

pub mod keywords;
pub mod sql_lexer;

use serde::Serialize;

use crate::assemble::AssembledStatement;
use crate::classify::StatementType;
use keywords::{is_join_qualifier, is_reserved};
use sql_lexer::{tokenize, unquote, SqlToken, SqlTokenKind};

/// How a statement uses a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Target,
    Source,
    Joined,
    Subquery,
}

/// A table referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReference {
    /// Name as written, schema qualifier kept, wildcards embedded.
    pub name: String,
    pub alias: Option<String>,
    pub role: TableRole,
    /// The name came from a fragment appended under a branch or loop.
    pub conditional: bool,
}

/// A classified statement with its table references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub statement_type: StatementType,
    pub tables: Vec<TableReference>,
    pub assembled: AssembledStatement,
}

impl SqlStatement {
    /// Extract the tables of `assembled`, classified as `statement_type`.
    pub fn new(statement_type: StatementType, assembled: AssembledStatement) -> Self {
        let tables = extract_tables(&assembled, statement_type);
        Self {
            statement_type,
            tables,
            assembled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    None,
    From,
    Join,
    Into,
    UpdateTarget,
    DeleteTarget,
    Using,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Nothing,
    Table,
    Alias,
}

/// Scanner state for one parenthesis level.
#[derive(Debug)]
struct Frame {
    /// Holds a query or a table list rather than an expression.
    query: bool,
    subquery: bool,
    /// Opened where a table name was expected; the group takes an alias.
    derived: bool,
    clause: Clause,
    expect: Expect,
    /// Reference the next alias attaches to.
    last: Option<usize>,
}

impl Frame {
    fn new(query: bool, subquery: bool, derived: bool) -> Self {
        Self {
            query,
            subquery,
            derived,
            clause: Clause::None,
            expect: Expect::Nothing,
            last: None,
        }
    }

    fn reset(&mut self) {
        self.clause = Clause::None;
        self.expect = Expect::Nothing;
        self.last = None;
    }

    fn enter(&mut self, clause: Clause) {
        self.clause = clause;
        self.expect = Expect::Table;
        self.last = None;
    }

    fn role(&self, statement_type: StatementType) -> TableRole {
        if self.subquery {
            return TableRole::Subquery;
        }
        match self.clause {
            Clause::Into | Clause::UpdateTarget | Clause::DeleteTarget => TableRole::Target,
            Clause::Join if statement_type != StatementType::Update => TableRole::Joined,
            Clause::From | Clause::Join | Clause::Using | Clause::None => TableRole::Source,
        }
    }
}

/// Table references of `statement`, deduplicated in order of appearance.
pub fn extract_tables(
    statement: &AssembledStatement,
    statement_type: StatementType,
) -> Vec<TableReference> {
    let text = statement.text.as_str();
    let tokens = tokenize(text);
    let mut found: Vec<TableReference> = Vec::new();
    let mut frames = vec![Frame::new(true, false, false)];

    for (index, token) in tokens.iter().enumerate() {
        let at_root = frames.len() == 1;
        match token.kind {
            SqlTokenKind::LParen => {
                let opens_subquery = tokens
                    .get(index + 1)
                    .is_some_and(|next| starts_query(next, text));
                let Some(frame) = frames.last_mut() else { break };
                let at_table = frame.expect == Expect::Table;
                let derived = opens_subquery && at_table;
                let query = opens_subquery || (frame.query && at_table);
                let subquery = frame.subquery || opens_subquery;
                frame.expect = Expect::Nothing;
                frame.last = None;
                let mut child = Frame::new(query, subquery, derived);
                if query && !opens_subquery {
                    // FROM (a JOIN b ON ...)
                    child.enter(Clause::From);
                }
                frames.push(child);
            }
            SqlTokenKind::RParen => {
                if at_root {
                    continue;
                }
                let derived = frames.pop().is_some_and(|child| child.derived);
                if let Some(frame) = frames.last_mut() {
                    // A derived table's alias is consumed but not reported.
                    frame.expect = if derived {
                        Expect::Alias
                    } else {
                        Expect::Nothing
                    };
                }
            }
            SqlTokenKind::Comma => {
                if let Some(frame) = frames.last_mut() {
                    frame.expect = match frame.clause {
                        Clause::From | Clause::UpdateTarget => Expect::Table,
                        _ => Expect::Nothing,
                    };
                    frame.last = None;
                }
            }
            SqlTokenKind::Str | SqlTokenKind::Symbol => {
                if let Some(frame) = frames.last_mut() {
                    frame.expect = Expect::Nothing;
                    frame.last = None;
                }
            }
            SqlTokenKind::Word => {
                let Some(frame) = frames.last_mut() else { break };
                let word = token.text(text);
                let at_start = index == 0 && at_root;

                match word.to_ascii_uppercase().as_str() {
                    "FROM" | "JOIN" | "INTO" if !frame.query => frame.reset(),
                    // DELETE FROM t
                    "FROM"
                        if frame.clause == Clause::DeleteTarget
                            && frame.expect == Expect::Table => {}
                    "FROM" => frame.enter(Clause::From),
                    "JOIN" => frame.enter(Clause::Join),
                    "INTO" => frame.enter(Clause::Into),
                    "UPDATE" if at_start && statement_type == StatementType::Update => {
                        frame.enter(Clause::UpdateTarget)
                    }
                    "DELETE" if at_start && statement_type == StatementType::Delete => {
                        frame.enter(Clause::DeleteTarget)
                    }
                    "USING" if at_root && statement_type == StatementType::Merge => {
                        frame.enter(Clause::Using)
                    }
                    "AS" if frame.expect == Expect::Alias => {}
                    _ if is_reserved(word) || is_join_qualifier(word) => frame.reset(),
                    _ => match frame.expect {
                        Expect::Table => {
                            found.push(TableReference {
                                name: unquote(word),
                                alias: None,
                                role: frame.role(statement_type),
                                conditional: statement.is_conditional(&token.range),
                            });
                            frame.last = Some(found.len() - 1);
                            frame.expect = Expect::Alias;
                        }
                        Expect::Alias => {
                            if let Some(last) = frame.last.take() {
                                found[last].alias = Some(unquote(word));
                            }
                            frame.expect = Expect::Nothing;
                        }
                        Expect::Nothing => {}
                    },
                }
            }
        }
    }

    dedup(found)
}

fn starts_query(token: &SqlToken, text: &str) -> bool {
    token.is_word()
        && matches!(
            token.text(text).to_ascii_uppercase().as_str(),
            "SELECT" | "WITH"
        )
}

/// Drop repeated references; a table is conditional only if every
/// occurrence is.
fn dedup(tables: Vec<TableReference>) -> Vec<TableReference> {
    let mut out: Vec<TableReference> = Vec::with_capacity(tables.len());
    for table in tables {
        let existing = out.iter_mut().find(|t| {
            t.name == table.name && t.alias == table.alias && t.role == table.role
        });
        match existing {
            Some(existing) => existing.conditional &= table.conditional,
            None => out.push(table),
        }
    }
    out
}
