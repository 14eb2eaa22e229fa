//! # sqlsift
//!
//! Static recovery of SQL statements that a program builds at runtime by
//! concatenating, appending or formatting string fragments, and of the
//! tables each statement touches. Nothing is executed; analysis works on
//! source text alone.
//!
//! ## Architecture
//!
//! Each source unit flows left to right through one sequential pass:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SourceUnit { path, text }                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lexer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   TextSegments (code, literal, line/block comment)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [recognize]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ConstructionChains  /  unresolved-origin exclusions    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [assemble] → [classify] → [extract]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SqlStatement (type, tables, assembled text)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter]
//! ┌─────────────────────────────────────────────────────────┐
//! │   StatementRecord  /  RejectionRecord  → AnalysisReport  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Units are independent. [`engine::AnalysisPool`] runs many of them
//! concurrently, each under its own deadline.
//!
//! ```no_run
//! use sqlsift::prelude::*;
//!
//! let outcome = analyze_source("UserDao.java", "String q = \"SELECT * FROM users\";");
//! let report = outcome.into_report();
//! println!("{}", report.to_json().unwrap());
//! ```

pub mod assemble;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod extract;
pub mod filter;
pub mod lexer;
pub mod recognize;
pub mod report;
pub mod source;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::assemble::{assemble, AssembledStatement};
    pub use crate::classify::{classify, StatementType};
    pub use crate::config::{Settings, SettingsError};
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
    pub use crate::engine::{
        analyze_source, AnalysisPool, Analyzer, Deadline, EngineError, EngineResult,
        UnitAnalysis, UnitOutcome,
    };
    pub use crate::extract::{extract_tables, SqlStatement, TableReference, TableRole};
    pub use crate::filter::{ConfidenceFilter, Signal, Verdict};
    pub use crate::lexer::{segment, SegmentKind, TextSegment};
    pub use crate::recognize::{ConstructionChain, Recognized, Recognizer};
    pub use crate::report::{
        AnalysisReport, RejectionReason, RejectionRecord, StatementRecord, UnitDiagnostic,
    };
    pub use crate::source::SourceUnit;
}

// Also export at crate root for convenience
pub use engine::{analyze_source, AnalysisPool, Analyzer, Deadline};
pub use report::AnalysisReport;
pub use source::SourceUnit;
