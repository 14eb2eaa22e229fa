//! Construction-pattern recognition.
//!
//! Walks the code tokens of one source unit statement by statement and
//! groups the literal fragments that build one dynamic string into a
//! [`ConstructionChain`]. Recognized idioms:
//!
//! - single literal assigned to a variable or passed as a call argument
//! - append chains on a string builder (`sb.append(..)`, fluent or not)
//! - plus/assignment accumulation (`s = s + ..`, `s += ..`, `s = .. + s`)
//! - formatting calls (`String.format`, `MessageFormat.format`, `.formatted`)
//! - any of the above inside a loop body
//!
//! Constructions built from other string variables or from call results are
//! reported as [`Recognized::Excluded`] instead of being resolved.
//!
//! Only constructions that look like statement candidates are emitted: some
//! literal fragment must contain a DML keyword, or an excluded construction
//! must have accumulated at least two contributions.

pub mod chain;
pub mod expr;
pub mod format;
pub mod scope;
pub mod tokens;

pub use chain::{
    ConstructionChain, Exclusion, ExclusionPattern, Fragment, FragmentKind, Idiom, JoinOperator,
    Recognized,
};
pub use tokens::{ConstId, ConstantPool};

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::config::RecognizerSettings;
use crate::engine::{Deadline, EngineError, EngineResult};
use crate::lexer::TextSegment;
use expr::{
    call_args, group_end, nesting_depth, parse_operands, read_path, split_top_level, Operand,
};
use format::{FormatArg, TemplatePart};
use scope::{BlockKind, Local, ScopeStack, VarKind};
use tokens::{Tok, Token};

/// A standalone DML keyword anywhere in a literal.
static DML_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(select|insert|update|delete|merge)\b").expect("valid regex")
});

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "transient",
    "volatile",
];

/// Everything recognized in one unit, with the constants fragments point to.
#[derive(Debug, Clone, Default)]
pub struct Recognition {
    pub pool: ConstantPool,
    /// Admitted constructions ordered by source offset.
    pub items: Vec<Recognized>,
}

/// Recognizes string-construction idioms in segmented source.
#[derive(Debug, Clone)]
pub struct Recognizer<'a> {
    settings: &'a RecognizerSettings,
}

impl<'a> Recognizer<'a> {
    pub fn new(settings: &'a RecognizerSettings) -> Self {
        Self { settings }
    }

    /// Recognize constructions in `segments`.
    ///
    /// Fails when `deadline` expires or when brackets nest deeper than
    /// `max_nesting`.
    pub fn recognize(
        &self,
        segments: &[TextSegment<'_>],
        deadline: &Deadline,
    ) -> EngineResult<Recognition> {
        let mut pool = ConstantPool::new();
        let tokens = tokens::tokenize(segments, &mut pool);

        // Operand and argument scans recurse once per bracket level.
        let depth = nesting_depth(&tokens);
        if depth > self.settings.max_nesting {
            return Err(EngineError::NestingTooDeep {
                depth,
                limit: self.settings.max_nesting,
            });
        }

        // Root block for code outside any type body.
        let mut scopes = ScopeStack::new();
        scopes.push(BlockKind::Plain, false, Vec::new());

        let mut walker = Walker {
            settings: self.settings,
            deadline,
            tokens: &tokens,
            pos: 0,
            pool,
            scopes,
            chains: HashMap::new(),
            items: Vec::new(),
        };
        walker.run()?;

        let Walker {
            pool, mut items, ..
        } = walker;
        items.sort_by_key(|(offset, _)| *offset);

        Ok(Recognition {
            pool,
            items: items.into_iter().map(|(_, item)| item).collect(),
        })
    }
}

/// Chain under construction.
#[derive(Debug)]
struct ChainState {
    variable: Option<String>,
    /// Scope depth at creation; conditional depth is counted above it.
    base: usize,
    /// Block whose exit finalizes the chain; `None` for call arguments.
    owner: Option<usize>,
    fragments: Vec<Fragment>,
    contributions: usize,
    taint: Option<ExclusionPattern>,
    offset: usize,
    end_offset: usize,
    appended: bool,
    formatted: bool,
    looped: bool,
}

impl ChainState {
    fn new(variable: Option<String>, base: usize, owner: Option<usize>, offset: usize) -> Self {
        Self {
            variable,
            base,
            owner,
            fragments: Vec::new(),
            contributions: 0,
            taint: None,
            offset,
            end_offset: offset,
            appended: false,
            formatted: false,
            looped: false,
        }
    }

    fn extend(&mut self, fragments: Vec<Fragment>) {
        for mut fragment in fragments {
            if self.fragments.is_empty() {
                fragment.join = JoinOperator::Initial;
            }
            self.end_offset = self.end_offset.max(fragment.offset);
            self.fragments.push(fragment);
        }
    }

    fn prepend(&mut self, mut fragments: Vec<Fragment>) {
        if fragments.is_empty() {
            return;
        }
        if let Some(first) = self.fragments.first_mut() {
            if first.join == JoinOperator::Initial {
                first.join = JoinOperator::Plus;
            }
        }
        if let Some(first) = fragments.first_mut() {
            first.join = JoinOperator::Initial;
        }
        for fragment in &fragments {
            self.end_offset = self.end_offset.max(fragment.offset);
        }
        fragments.append(&mut self.fragments);
        self.fragments = fragments;
    }

    fn idiom(&self) -> Idiom {
        if self.looped {
            Idiom::LoopAccumulation
        } else if self.appended {
            Idiom::AppendChain
        } else if self.formatted && self.contributions == 1 {
            Idiom::FormatCall
        } else if self.contributions == 1 && self.fragments.len() == 1 {
            Idiom::SingleLiteral
        } else {
            Idiom::PlusAccumulation
        }
    }
}

/// Where statement collection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Semicolon,
    OpenBrace,
    CloseBrace,
    Eof,
}

struct Walker<'a, 't, 'src> {
    settings: &'a RecognizerSettings,
    deadline: &'a Deadline,
    tokens: &'t [Token<'src>],
    pos: usize,
    pool: ConstantPool,
    scopes: ScopeStack,
    chains: HashMap<String, ChainState>,
    items: Vec<(usize, Recognized)>,
}

impl<'a, 't, 'src> Walker<'a, 't, 'src> {
    fn run(&mut self) -> EngineResult<()> {
        let tokens = self.tokens;
        while self.pos < tokens.len() {
            self.deadline.check()?;
            let token = tokens[self.pos];
            match token.tok {
                Tok::Punct('{') => {
                    self.pos += 1;
                    self.scopes.push(BlockKind::Plain, false, Vec::new());
                }
                Tok::Punct('}') => {
                    self.pos += 1;
                    self.close_block();
                }
                Tok::Punct(';') => {
                    self.pos += 1;
                    self.end_statement();
                }
                Tok::Punct('@') if !self.peek_is_ident(1, "interface") => {
                    self.pos = skip_annotation(tokens, self.pos);
                }
                Tok::Ident(word) if is_control_keyword(word) => self.control(word),
                Tok::Ident(word)
                    if self.peek(1).is_some_and(|t| t.is_punct(':'))
                        && !matches!(word, "case" | "default") =>
                {
                    // Statement label.
                    self.pos += 2;
                }
                _ => self.statement(),
            }
        }

        while !self.scopes.is_empty() {
            self.pop_block();
        }
        let mut rest: Vec<String> = self.chains.keys().cloned().collect();
        rest.sort();
        for name in rest {
            self.finalize_var(&name);
        }
        // Argument scans stop early once expired.
        self.deadline.check()
    }

    fn peek(&self, ahead: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + ahead)
    }

    fn peek_is_ident(&self, ahead: usize, name: &str) -> bool {
        self.peek(ahead).is_some_and(|t| t.is_ident(name))
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    fn control(&mut self, keyword: &'src str) {
        let tokens = self.tokens;
        self.pos += 1;
        match keyword {
            "if" | "while" | "switch" | "catch" | "synchronized" => {
                self.skip_parens();
                let kind = match keyword {
                    "while" => BlockKind::Loop,
                    "synchronized" => BlockKind::Plain,
                    _ => BlockKind::Branch,
                };
                self.open_control(kind, Vec::new());
            }
            "for" => {
                let mut vars = Vec::new();
                if tokens.get(self.pos).is_some_and(|t| t.is_punct('(')) {
                    let end = group_end(tokens, self.pos);
                    let inner = &tokens[self.pos + 1..end.saturating_sub(1).max(self.pos + 1)];
                    vars = loop_vars(inner);
                    self.scan_arguments(inner);
                    self.pos = end;
                }
                self.open_control(BlockKind::Loop, vars);
            }
            "do" => self.open_control(BlockKind::Loop, Vec::new()),
            "else" => {
                // `else if` is one branch, opened by the `if`.
                if !tokens.get(self.pos).is_some_and(|t| t.is_ident("if")) {
                    self.open_control(BlockKind::Branch, Vec::new());
                }
            }
            "try" => {
                if tokens.get(self.pos).is_some_and(|t| t.is_punct('(')) {
                    let end = group_end(tokens, self.pos);
                    let inner = &tokens[self.pos + 1..end.saturating_sub(1).max(self.pos + 1)];
                    for resource in split_top_level(inner, |t| t.is_punct(';')) {
                        self.analyze_statement(resource);
                    }
                    self.pos = end;
                }
                self.open_control(BlockKind::Plain, Vec::new());
            }
            "finally" => self.open_control(BlockKind::Plain, Vec::new()),
            "case" => {
                let mut depth = 0usize;
                while let Some(token) = tokens.get(self.pos) {
                    self.pos += 1;
                    match token.tok {
                        Tok::Punct('(') => depth += 1,
                        Tok::Punct(')') => depth = depth.saturating_sub(1),
                        Tok::Punct(':') | Tok::Op("->") if depth == 0 => break,
                        _ => {}
                    }
                }
            }
            "default" => {
                if tokens
                    .get(self.pos)
                    .is_some_and(|t| t.is_punct(':') || t.is_op("->"))
                {
                    self.pos += 1;
                } else {
                    // Interface default method.
                    self.pos -= 1;
                    self.statement();
                }
            }
            _ => {}
        }
    }

    fn skip_parens(&mut self) {
        if self.tokens.get(self.pos).is_some_and(|t| t.is_punct('(')) {
            self.pos = group_end(self.tokens, self.pos);
        }
    }

    fn open_control(&mut self, kind: BlockKind, vars: Vec<&str>) {
        let locals = vars
            .into_iter()
            .map(|name| Local {
                name: name.to_string(),
                kind: VarKind::LoopVar,
                is_string: false,
            })
            .collect();
        if self.tokens.get(self.pos).is_some_and(|t| t.is_punct('{')) {
            self.pos += 1;
            self.scopes.push(kind, false, locals);
        } else {
            self.scopes.push(kind, true, locals);
        }
    }

    fn close_block(&mut self) {
        while self.scopes.top_is_virtual() {
            self.pop_block();
        }
        // An unbalanced `}` never closes the root block.
        if self.scopes.len() > 1 {
            self.pop_block();
        }
        let continues = self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.is_ident("else") || t.is_ident("catch") || t.is_ident("finally"));
        if !continues {
            self.end_statement();
        }
    }

    /// A statement ended: braceless bodies end with it.
    fn end_statement(&mut self) {
        while self.scopes.top_is_virtual() {
            self.pop_block();
        }
    }

    fn pop_block(&mut self) {
        if self.scopes.pop().is_none() {
            return;
        }
        let depth = self.scopes.len();

        let mut owned: Vec<(usize, String)> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.owner.is_some_and(|owner| owner >= depth))
            .map(|(name, chain)| (chain.offset, name.clone()))
            .collect();
        owned.sort();
        for (_, name) in owned {
            self.finalize_var(&name);
        }

        for chain in self.chains.values_mut() {
            chain.base = chain.base.min(depth);
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statement(&mut self) {
        let tokens = self.tokens;
        let start = self.pos;
        let (end, terminator) = collect_statement(tokens, start);
        let stmt = &tokens[start..end];
        match terminator {
            Terminator::Semicolon => {
                self.pos = end + 1;
                self.analyze_statement(stmt);
                self.end_statement();
            }
            Terminator::OpenBrace => {
                self.pos = end + 1;
                self.open_header(stmt);
            }
            Terminator::CloseBrace | Terminator::Eof => {
                self.pos = end.max(start + 1);
                self.analyze_statement(stmt);
            }
        }
    }

    fn open_header(&mut self, header: &[Token<'src>]) {
        let kind = if header.iter().any(|t| {
            t.ident()
                .is_some_and(|w| matches!(w, "class" | "interface" | "enum" | "record"))
        }) {
            BlockKind::Class
        } else if header.iter().any(|t| t.is_punct('(')) {
            BlockKind::Method
        } else {
            BlockKind::Plain
        };
        self.scopes.push(kind, false, Vec::new());
    }

    fn analyze_statement(&mut self, stmt: &[Token<'src>]) {
        let stmt = strip_annotations(stmt);
        let Some(first) = stmt.first() else { return };

        if first
            .ident()
            .is_some_and(|w| matches!(w, "return" | "throw" | "yield" | "assert"))
        {
            self.scan_arguments(&stmt[1..]);
            return;
        }

        if let Some(index) = find_assignment(&stmt) {
            let plus_assign = stmt[index].is_op("+=");
            let lhs = &stmt[..index];
            let rhs = split_top_level(&stmt[index + 1..], |t| t.is_punct(','))
                .into_iter()
                .next()
                .unwrap_or(&[]);
            match assignment_target(lhs, self.settings) {
                Some(target) => self.assignment(target, plus_assign, rhs, first.offset),
                None => self.scan_arguments(rhs),
            }
            return;
        }

        if self.append_statement(&stmt) {
            return;
        }

        if let Some(target) = assignment_target(&stmt, self.settings) {
            if let Some(is_string) = target.declared_string {
                self.finalize_var(&target.name);
                self.scopes.declare(Local {
                    name: target.name,
                    kind: VarKind::Local,
                    is_string,
                });
                return;
            }
        }

        self.scan_arguments(&stmt);
    }

    fn assignment(&mut self, target: Target, plus_assign: bool, rhs: &[Token<'src>], offset: usize) {
        let settings = self.settings;
        let operands = parse_operands(rhs, settings);
        let name = target.name;

        if let Some(declared_string) = target.declared_string {
            let is_string =
                declared_string || (target.inferred && operands.iter().any(Operand::is_textual));
            self.finalize_var(&name);
            self.scopes.declare(Local {
                name: name.clone(),
                kind: VarKind::Local,
                is_string,
            });
            if !is_string {
                self.scan_operands(&operands);
                return;
            }
        } else {
            let tracked = match self.scopes.resolve(&name) {
                Some((_, local)) => local.is_string,
                None => {
                    self.chains.contains_key(&name) || operands.iter().any(Operand::is_textual)
                }
            };
            if !tracked {
                self.scan_operands(&operands);
                return;
            }
        }

        let self_index = operands
            .iter()
            .position(|op| matches!(op, Operand::Var { name: n, .. } if *n == name));

        match (plus_assign, self_index) {
            (true, _) => {
                let existed = self.chains.contains_key(&name);
                self.ensure_chain(&name, offset);
                if !existed {
                    trace!(variable = %name, "compound assignment without a prior value");
                }
                self.contribute(&name, &operands, JoinOperator::PlusAssign);
            }
            (false, None) => {
                self.finalize_var(&name);
                self.start_chain(&name, offset);
                self.contribute(&name, &operands, JoinOperator::Plus);
            }
            (false, Some(index)) => {
                let existed = self.chains.contains_key(&name);
                self.ensure_chain(&name, offset);
                let (before, after) = operands.split_at(index);
                let after = &after[1..];
                if !existed {
                    // Previous value unknown.
                    self.push_wildcard(&name, operands[index].offset());
                }
                let mut chain = self.take_chain(&name);
                let mut prepended = Vec::new();
                self.lower_all(&mut chain, before, JoinOperator::Plus, true, &mut prepended);
                let mut appended = Vec::new();
                self.lower_all(&mut chain, after, JoinOperator::Plus, true, &mut appended);
                self.record_contribution(&mut chain, before.iter().chain(after.iter()));
                chain.prepend(prepended);
                chain.extend(appended);
                self.chains.insert(name, chain);
            }
        }
    }

    /// `recv.append(..).append(..)` and `recv.setLength(0)`.
    fn append_statement(&mut self, stmt: &[Token<'src>]) -> bool {
        if stmt.first().and_then(Token::ident).is_none() {
            return false;
        }
        let (path, after) = read_path(stmt, 0);
        if path.len() < 2 || !stmt.get(after).is_some_and(|t| t.is_punct('(')) {
            return false;
        }
        let receiver_path = if path[0] == "this" { &path[1..path.len() - 1] } else { &path[..path.len() - 1] };
        if receiver_path.is_empty() {
            return false;
        }
        let receiver = receiver_path.join(".");
        let mut method = path[path.len() - 1];

        let settings = self.settings;
        let is_append = |m: &str| settings.append_methods.iter().any(|a| a == m);
        if !is_append(method) && method != "setLength" {
            return false;
        }
        if self
            .scopes
            .resolve(&receiver)
            .is_some_and(|(_, local)| !local.is_string)
        {
            return false;
        }

        let mut open = after;
        loop {
            let end = group_end(stmt, open);
            if is_append(method) {
                if let Some(arg) = call_args(stmt, open).into_iter().next() {
                    let operands = parse_operands(arg, settings);
                    self.ensure_chain(&receiver, stmt[0].offset);
                    self.contribute(&receiver, &operands, JoinOperator::Append);
                }
            } else if method == "setLength" {
                self.finalize_var(&receiver);
                self.start_chain(&receiver, stmt[0].offset);
            } else {
                self.scan_arguments(&stmt[open..]);
                break;
            }

            let next_call = stmt.get(end).is_some_and(|t| t.is_punct('.'))
                && stmt.get(end + 2).is_some_and(|t| t.is_punct('('));
            match stmt.get(end + 1).and_then(Token::ident) {
                Some(next) if next_call => {
                    method = next;
                    open = end + 2;
                }
                _ => break,
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Chains
    // ------------------------------------------------------------------

    fn start_chain(&mut self, name: &str, offset: usize) {
        let owner = match self.scopes.resolve(name) {
            Some((index, _)) => index,
            None => self.scopes.innermost_method(),
        };
        let chain = ChainState::new(Some(name.to_string()), self.scopes.len(), Some(owner), offset);
        self.chains.insert(name.to_string(), chain);
    }

    fn ensure_chain(&mut self, name: &str, offset: usize) {
        if !self.chains.contains_key(name) {
            self.start_chain(name, offset);
        }
    }

    fn take_chain(&mut self, name: &str) -> ChainState {
        self.chains
            .remove(name)
            .unwrap_or_else(|| ChainState::new(Some(name.to_string()), self.scopes.len(), None, 0))
    }

    fn push_wildcard(&mut self, name: &str, offset: usize) {
        let mut chain = self.take_chain(name);
        let kind = self.wildcard(&chain);
        let fragment = self.fragment(&chain, kind, JoinOperator::Plus, offset);
        chain.extend(vec![fragment]);
        self.chains.insert(name.to_string(), chain);
    }

    /// Append one contribution to the chain of `name`.
    fn contribute(&mut self, name: &str, operands: &[Operand<'_, 'src>], join: JoinOperator) {
        let mut chain = self.take_chain(name);
        let mut fragments = Vec::new();
        self.lower_all(&mut chain, operands, join, true, &mut fragments);
        self.record_contribution(&mut chain, operands.iter());
        chain.extend(fragments);
        self.chains.insert(name.to_string(), chain);
    }

    /// Count a contribution and taint the chain when it carries no text of
    /// its own but a call result.
    fn record_contribution<'o, 'x: 'o>(
        &self,
        chain: &mut ChainState,
        operands: impl Iterator<Item = &'o Operand<'x, 'src>>,
    ) where
        'src: 'x,
    {
        let mut any = false;
        let mut textual = false;
        let mut call = None;
        for op in operands {
            any = true;
            textual |= op.is_textual();
            if let Operand::Call { name, .. } = op {
                call.get_or_insert_with(|| name.clone());
            }
        }
        if !any {
            return;
        }
        chain.contributions += 1;
        if self.scopes.in_loop(chain.base) {
            chain.looped = true;
        }
        if let (false, Some(call)) = (textual, call) {
            chain
                .taint
                .get_or_insert(ExclusionPattern::MethodCallResult { call });
        }
    }

    fn wildcard(&self, chain: &ChainState) -> FragmentKind {
        if self.scopes.in_loop(chain.base) {
            FragmentKind::LoopWildcard
        } else {
            FragmentKind::ExprWildcard
        }
    }

    fn fragment(&self, chain: &ChainState, kind: FragmentKind, join: JoinOperator, offset: usize) -> Fragment {
        Fragment {
            kind,
            join,
            conditional_depth: self.scopes.conditional_depth(chain.base),
            offset,
        }
    }

    fn lower_all(
        &mut self,
        chain: &mut ChainState,
        operands: &[Operand<'_, 'src>],
        join: JoinOperator,
        taint_vars: bool,
        out: &mut Vec<Fragment>,
    ) {
        for op in operands {
            self.lower(chain, op, join, taint_vars, out);
        }
    }

    /// Turn one operand into fragments.
    fn lower(
        &mut self,
        chain: &mut ChainState,
        operand: &Operand<'_, 'src>,
        join: JoinOperator,
        taint_vars: bool,
        out: &mut Vec<Fragment>,
    ) {
        let settings = self.settings;
        match operand {
            Operand::Constant { id, offset } => {
                let kind = FragmentKind::constant(&self.pool, *id);
                out.push(self.fragment(chain, kind, join, *offset));
            }
            Operand::Var { name, offset } => {
                let kind = match self.scopes.resolve(name) {
                    Some((_, local)) if local.kind == VarKind::LoopVar => FragmentKind::LoopWildcard,
                    Some((_, local)) if local.is_string && taint_vars => {
                        chain
                            .taint
                            .get_or_insert_with(|| ExclusionPattern::VariableReference {
                                variable: (*name).to_string(),
                            });
                        self.wildcard(chain)
                    }
                    _ => self.wildcard(chain),
                };
                out.push(self.fragment(chain, kind, join, *offset));
            }
            Operand::Format {
                style,
                template,
                args,
                ..
            } => {
                chain.formatted = true;
                let parts: Vec<TemplatePart> = parse_operands(template, settings)
                    .iter()
                    .map(|op| match op {
                        Operand::Constant { id, offset } => TemplatePart::Literal {
                            constant: *id,
                            offset: *offset,
                        },
                        other => TemplatePart::Dynamic {
                            offset: other.offset(),
                        },
                    })
                    .collect();
                let values: Vec<FormatArg> = args
                    .iter()
                    .map(|arg| match parse_operands(arg, settings).as_slice() {
                        [Operand::Constant { id, .. }] => FormatArg::Constant(*id),
                        _ => FormatArg::Dynamic,
                    })
                    .collect();
                for (kind, offset) in format::expand(*style, &parts, &values, &mut self.pool) {
                    let kind = match kind {
                        FragmentKind::ExprWildcard => self.wildcard(chain),
                        other => other,
                    };
                    out.push(self.fragment(chain, kind, JoinOperator::Format, offset));
                }
            }
            Operand::Builder { seed, appends, .. } => {
                chain.appended = true;
                for arg in seed.iter().chain(appends.iter()) {
                    let operands = parse_operands(arg, settings);
                    self.lower_all(chain, &operands, JoinOperator::Append, taint_vars, out);
                }
            }
            Operand::Call { tokens, offset, .. } | Operand::Other { tokens, offset } => {
                self.scan_arguments(tokens);
                let kind = self.wildcard(chain);
                out.push(self.fragment(chain, kind, join, *offset));
            }
        }
        if join == JoinOperator::Append {
            chain.appended = true;
        }
    }

    /// Finalize the chain of `name`, if any.
    fn finalize_var(&mut self, name: &str) {
        if let Some(chain) = self.chains.remove(name) {
            self.finalize(chain);
        }
    }

    fn finalize(&mut self, chain: ChainState) {
        if chain.contributions == 0 {
            return;
        }
        let has_keyword = chain.fragments.iter().any(|f| match &f.kind {
            FragmentKind::Literal { constant, range } => {
                DML_KEYWORD.is_match(self.pool.slice(*constant, range))
            }
            _ => false,
        });
        let admitted = has_keyword || (chain.taint.is_some() && chain.contributions >= 2);
        if !admitted {
            return;
        }

        let idiom = chain.idiom();
        match chain.taint {
            Some(pattern) => {
                trace!(offset = chain.offset, reason = %pattern.describe(), "construction excluded");
                self.items.push((
                    chain.offset,
                    Recognized::Excluded(Exclusion {
                        pattern,
                        variable: chain.variable,
                        offset: chain.offset,
                        end_offset: chain.end_offset,
                    }),
                ));
            }
            None => {
                self.items.push((
                    chain.offset,
                    Recognized::Chain(ConstructionChain {
                        variable: chain.variable,
                        idiom,
                        fragments: chain.fragments,
                        offset: chain.offset,
                    }),
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Call arguments
    // ------------------------------------------------------------------

    fn scan_operands(&mut self, operands: &[Operand<'_, 'src>]) {
        if operands.iter().any(Operand::is_textual) {
            let offset = operands.first().map(Operand::offset).unwrap_or(0);
            self.standalone(operands, offset);
            return;
        }
        for op in operands {
            if let Operand::Call { tokens, .. } | Operand::Other { tokens, .. } = op {
                self.scan_arguments(tokens);
            }
        }
    }

    /// Find call arguments that carry literal text and treat each as its
    /// own construction.
    fn scan_arguments(&mut self, tokens: &[Token<'src>]) {
        let settings = self.settings;
        let mut i = 0;
        while i < tokens.len() {
            if self.deadline.is_expired() {
                return;
            }
            if !tokens[i].is_punct('(') {
                i += 1;
                continue;
            }
            let end = group_end(tokens, i);
            let is_call = i > 0
                && (tokens[i - 1].ident().is_some_and(|w| !is_control_keyword(w))
                    || tokens[i - 1].is_punct('>'));
            if is_call {
                for arg in call_args(tokens, i) {
                    let operands = parse_operands(arg, settings);
                    if operands.iter().any(Operand::is_textual) {
                        let offset = arg.first().map(|t| t.offset).unwrap_or(0);
                        self.standalone(&operands, offset);
                    } else {
                        self.scan_arguments(arg);
                    }
                }
            } else {
                let inner_end = end.saturating_sub(1).max(i + 1);
                self.scan_arguments(&tokens[i + 1..inner_end.min(tokens.len())]);
            }
            i = end.max(i + 1);
        }
    }

    fn standalone(&mut self, operands: &[Operand<'_, 'src>], offset: usize) {
        let mut chain = ChainState::new(None, self.scopes.len(), None, offset);
        let mut fragments = Vec::new();
        self.lower_all(&mut chain, operands, JoinOperator::Plus, false, &mut fragments);
        self.record_contribution(&mut chain, operands.iter());
        chain.extend(fragments);
        self.finalize(chain);
    }
}

fn is_control_keyword(word: &str) -> bool {
    matches!(
        word,
        "if" | "else"
            | "for"
            | "while"
            | "do"
            | "switch"
            | "case"
            | "default"
            | "try"
            | "catch"
            | "finally"
            | "synchronized"
    )
}

/// Collect one statement starting at `start`.
fn collect_statement(tokens: &[Token<'_>], start: usize) -> (usize, Terminator) {
    let mut depth = 0usize;
    let mut i = start;
    while i < tokens.len() {
        match tokens[i].tok {
            Tok::Punct('(' | '[') => depth += 1,
            Tok::Punct(')' | ']') => depth = depth.saturating_sub(1),
            Tok::Punct('{') if depth > 0 => depth += 1,
            Tok::Punct('}') if depth > 0 => depth -= 1,
            Tok::Punct('{') => {
                let initializer = i > start
                    && matches!(tokens[i - 1].tok, Tok::Punct('=' | ']' | ','));
                if !initializer {
                    return (i, Terminator::OpenBrace);
                }
                i = group_end(tokens, i);
                continue;
            }
            Tok::Punct('}') => return (i, Terminator::CloseBrace),
            Tok::Punct(';') if depth == 0 => return (i, Terminator::Semicolon),
            _ => {}
        }
        i += 1;
    }
    (tokens.len(), Terminator::Eof)
}

/// Index past an annotation starting at `at` (`@Name` or `@Name(..)`).
fn skip_annotation(tokens: &[Token<'_>], at: usize) -> usize {
    let (_, after) = read_path(tokens, at + 1);
    let after = after.max(at + 1);
    if tokens.get(after).is_some_and(|t| t.is_punct('(')) {
        group_end(tokens, after)
    } else {
        after
    }
}

fn strip_annotations<'src>(stmt: &[Token<'src>]) -> Vec<Token<'src>> {
    let mut out = Vec::with_capacity(stmt.len());
    let mut i = 0;
    while i < stmt.len() {
        let is_annotation = stmt[i].is_punct('@')
            && !stmt.get(i + 1).is_some_and(|t| t.is_ident("interface"));
        if is_annotation {
            i = skip_annotation(stmt, i);
        } else {
            out.push(stmt[i]);
            i += 1;
        }
    }
    out
}

/// Top-level `=` or `+=`.
fn find_assignment(stmt: &[Token<'_>]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in stmt.iter().enumerate() {
        match token.tok {
            Tok::Punct('(' | '[' | '{') => depth += 1,
            Tok::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            Tok::Punct('=') | Tok::Op("+=") if depth == 0 => return Some(i),
            // Compound assignments other than `+=` never build strings.
            Tok::Op("-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" | ">>>=")
                if depth == 0 =>
            {
                return None
            }
            Tok::Op("->") if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

/// Left-hand side of an assignment or a bare declaration.
#[derive(Debug)]
struct Target {
    name: String,
    /// `Some(is_string)` for a declaration.
    declared_string: Option<bool>,
    /// Declared with `var`; string-ness follows the initializer.
    inferred: bool,
}

fn assignment_target(lhs: &[Token<'_>], settings: &RecognizerSettings) -> Option<Target> {
    match lhs {
        [only] => only.ident().map(|name| Target {
            name: name.to_string(),
            declared_string: None,
            inferred: false,
        }),
        [this, dot, field] if this.is_ident("this") && dot.is_punct('.') => {
            field.ident().map(|name| Target {
                name: name.to_string(),
                declared_string: None,
                inferred: false,
            })
        }
        _ => {
            let last = lhs.last()?;
            let name = last.ident()?;
            let before = lhs.get(lhs.len().checked_sub(2)?)?;

            let is_declaration = lhs.iter().all(is_type_token)
                && (before.ident().is_some() || before.is_punct('>') || before.is_punct(']'));

            if is_declaration {
                let type_tokens = &lhs[..lhs.len() - 1];
                let type_start = type_tokens
                    .iter()
                    .position(|t| !t.ident().is_some_and(|w| MODIFIERS.contains(&w)))
                    .unwrap_or(type_tokens.len());
                let type_tokens = &type_tokens[type_start..];
                let (path, after) = read_path(type_tokens, 0);
                let type_name = path.last().copied().unwrap_or("");
                let is_array = type_tokens[after.min(type_tokens.len())..]
                    .iter()
                    .any(|t| t.is_punct('['));
                let inferred = type_name == "var";
                let is_string = !is_array
                    && (matches!(type_name, "String" | "CharSequence")
                        || settings.builder_types.iter().any(|b| b == type_name));
                return Some(Target {
                    name: name.to_string(),
                    declared_string: Some(is_string),
                    inferred,
                });
            }

            // Dotted field target such as `holder.sql`.
            let (path, after) = read_path(lhs, 0);
            (after == lhs.len() && path.len() > 1).then(|| Target {
                name: path.join("."),
                declared_string: None,
                inferred: false,
            })
        }
    }
}

fn is_type_token(token: &Token<'_>) -> bool {
    token.ident().is_some() || matches!(token.tok, Tok::Punct('<' | '>' | '[' | ']' | ',' | '.' | '?'))
}

/// Loop variables declared in a `for` header.
fn loop_vars<'src>(header: &[Token<'src>]) -> Vec<&'src str> {
    let colon_parts = split_top_level(header, |t| t.is_punct(':'));
    if colon_parts.len() >= 2 {
        return colon_parts[0]
            .last()
            .and_then(Token::ident)
            .into_iter()
            .collect();
    }

    let init = split_top_level(header, |t| t.is_punct(';'))
        .into_iter()
        .next()
        .unwrap_or(&[]);
    split_top_level(init, |t| t.is_punct(','))
        .into_iter()
        .filter_map(|declarator| {
            let eq = declarator.iter().position(|t| t.is_punct('='))?;
            declarator.get(eq.checked_sub(1)?)?.ident()
        })
        .collect()
}
