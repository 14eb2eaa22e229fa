//! Construction chains and the fragments they are built from.

use std::ops::Range;

use serde::Serialize;

use super::tokens::{ConstId, ConstantPool};

/// What a fragment contributes to the assembled text.
///
/// Closed set; every stage matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// A byte range of a compile-time constant.
    Literal { constant: ConstId, range: Range<usize> },
    /// A formatting placeholder whose argument is not a constant.
    FormatWildcard,
    /// A non-constant operand appended inside a loop body.
    LoopWildcard,
    /// Any other non-constant operand (parameter, field, call result).
    ExprWildcard,
}

impl FragmentKind {
    /// Whole-constant literal.
    pub fn constant(pool: &ConstantPool, constant: ConstId) -> Self {
        FragmentKind::Literal {
            constant,
            range: 0..pool.get(constant).len(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, FragmentKind::Literal { .. })
    }
}

/// How a fragment was joined onto the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinOperator {
    /// First fragment of the chain.
    Initial,
    /// `a + b` inside one expression or `x = x + b`.
    Plus,
    /// `x += b`.
    PlusAssign,
    /// `sb.append(b)` or a builder seed.
    Append,
    /// Piece of an expanded formatting template.
    Format,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub join: JoinOperator,
    /// Enclosing branch and loop constructs at the append site, counted
    /// from the point where the chain was started.
    pub conditional_depth: usize,
    /// Byte offset of the contributing token.
    pub offset: usize,
}

/// The idiom a chain was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Idiom {
    SingleLiteral,
    AppendChain,
    PlusAccumulation,
    FormatCall,
    LoopAccumulation,
}

/// One recognized occurrence of a string-building idiom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionChain {
    /// Variable the chain was built into, `None` for a call argument.
    pub variable: Option<String>,
    pub idiom: Idiom,
    /// Fragments in source order of contribution.
    pub fragments: Vec<Fragment>,
    /// Byte offset where the chain was started.
    pub offset: usize,
}

impl ConstructionChain {
    pub fn max_conditional_depth(&self) -> usize {
        self.fragments
            .iter()
            .map(|f| f.conditional_depth)
            .max()
            .unwrap_or(0)
    }

    /// Literal text of each literal fragment, in order.
    pub fn literal_texts<'p>(&'p self, pool: &'p ConstantPool) -> impl Iterator<Item = &'p str> {
        self.fragments.iter().filter_map(move |f| match &f.kind {
            FragmentKind::Literal { constant, range } => Some(pool.slice(*constant, range)),
            _ => None,
        })
    }
}

/// Constructions deliberately left unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionPattern {
    /// Built from other string variables.
    VariableReference { variable: String },
    /// Built from the return value of a call not analysed in this pass.
    MethodCallResult { call: String },
}

impl ExclusionPattern {
    pub fn describe(&self) -> String {
        match self {
            ExclusionPattern::VariableReference { variable } => {
                format!("built from variable `{}`", variable)
            }
            ExclusionPattern::MethodCallResult { call } => {
                format!("built from result of `{}()`", call)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub pattern: ExclusionPattern,
    /// Variable the excluded construction was assigned to.
    pub variable: Option<String>,
    pub offset: usize,
    /// Last contributing offset.
    pub end_offset: usize,
}

/// Output of the recognizer for one admitted construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognized {
    Chain(ConstructionChain),
    Excluded(Exclusion),
}
