//! Per-unit analysis and the worker pool that runs it.
//!
//! One unit is analysed in a single sequential pass:
//! segment, recognize, then for every admitted construction assemble,
//! classify, extract and filter. The pass either completes or is abandoned
//! as a whole; a unit that times out or faults contributes exactly one
//! unit-level [`RejectionRecord`] and nothing else.

mod deadline;
mod error;
mod pool;

pub use deadline::Deadline;
pub use error::{EngineError, EngineResult};
pub use pool::AnalysisPool;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::assemble::assemble;
use crate::classify::classify;
use crate::config::Settings;
use crate::diagnostics::Diagnostics;
use crate::extract::SqlStatement;
use crate::filter::ConfidenceFilter;
use crate::lexer;
use crate::recognize::{Recognized, Recognizer};
use crate::report::{
    AnalysisReport, RejectionReason, RejectionRecord, StatementRecord, UnitDiagnostic,
};
use crate::source::SourceUnit;

/// Records produced by one completed unit pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitAnalysis {
    pub statements: Vec<StatementRecord>,
    pub rejections: Vec<RejectionRecord>,
}

/// Result of an isolated unit pass.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Completed {
        analysis: UnitAnalysis,
        diagnostics: Vec<UnitDiagnostic>,
    },
    /// The unit was abandoned; no statements are emitted for it.
    Rejected(RejectionRecord),
}

impl UnitOutcome {
    pub fn into_report(self) -> AnalysisReport {
        match self {
            UnitOutcome::Completed {
                analysis,
                diagnostics,
            } => AnalysisReport {
                statements: analysis.statements,
                rejections: analysis.rejections,
                diagnostics,
            },
            UnitOutcome::Rejected(record) => AnalysisReport::rejected(record),
        }
    }
}

/// Runs the full pipeline over source units.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    settings: Settings,
}

impl Analyzer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Analyse one unit.
    ///
    /// Structural problems in the text go to `diagnostics`. Fails only when
    /// `deadline` expires.
    pub fn analyze(
        &self,
        unit: &SourceUnit,
        deadline: &Deadline,
        diagnostics: &mut Diagnostics,
    ) -> EngineResult<UnitAnalysis> {
        self.run(unit, deadline, diagnostics)
            .map_err(|err| err.for_unit(&unit.path))
    }

    fn run(
        &self,
        unit: &SourceUnit,
        deadline: &Deadline,
        diagnostics: &mut Diagnostics,
    ) -> EngineResult<UnitAnalysis> {
        deadline.check()?;
        let segments = lexer::segment(&unit.text, diagnostics);
        let recognition = Recognizer::new(&self.settings.recognizer).recognize(&segments, deadline)?;

        let lines = unit.line_index();
        let filter = ConfidenceFilter::new(&self.settings.filter);
        let mut analysis = UnitAnalysis::default();

        for item in recognition.items {
            deadline.check()?;
            match item {
                Recognized::Excluded(exclusion) => {
                    let detail = exclusion.pattern.describe();
                    trace!(path = %unit.path, %detail, "unresolved origin");
                    analysis.rejections.push(
                        RejectionRecord::new(
                            unit.path.as_str(),
                            lines.line_of(exclusion.offset),
                            RejectionReason::UnresolvedOrigin,
                        )
                        .with_detail(detail),
                    );
                }
                Recognized::Chain(chain) => {
                    let assembled = assemble(&chain, &recognition.pool, &unit.path, &lines);
                    let Some(statement_type) = classify(&assembled.text) else {
                        trace!(path = %unit.path, line = assembled.start_line, "no keyword match");
                        analysis.rejections.push(RejectionRecord::new(
                            unit.path.as_str(),
                            assembled.start_line,
                            RejectionReason::NoKeywordMatch,
                        ));
                        continue;
                    };

                    let statement = SqlStatement::new(statement_type, assembled);
                    let verdict = filter.evaluate(&statement);
                    if verdict.passed {
                        analysis
                            .statements
                            .push(StatementRecord::new(statement, verdict.confidence));
                    } else {
                        let detail = verdict.rejection_detail().unwrap_or_default();
                        trace!(
                            path = %unit.path,
                            line = statement.assembled.start_line,
                            %detail,
                            "false positive"
                        );
                        analysis.rejections.push(
                            RejectionRecord::new(
                                unit.path.as_str(),
                                statement.assembled.start_line,
                                RejectionReason::FalsePositive,
                            )
                            .with_detail(detail),
                        );
                    }
                }
            }
        }

        debug!(
            path = %unit.path,
            statements = analysis.statements.len(),
            rejections = analysis.rejections.len(),
            diagnostics = diagnostics.len(),
            "analysed unit"
        );
        Ok(analysis)
    }

    /// Analyse one unit behind a fault boundary.
    ///
    /// Timeouts and panics become a unit-level rejection instead of
    /// propagating.
    pub fn analyze_isolated(&self, unit: &SourceUnit, deadline: &Deadline) -> UnitOutcome {
        let mut diagnostics = Diagnostics::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyze(unit, deadline, &mut diagnostics)
        }));

        match result {
            Ok(Ok(analysis)) => {
                let lines = unit.line_index();
                UnitOutcome::Completed {
                    analysis,
                    diagnostics: diagnostics
                        .into_vec()
                        .into_iter()
                        .map(|d| UnitDiagnostic::new(&unit.path, &lines, d))
                        .collect(),
                }
            }
            Ok(Err(err)) => {
                warn!(path = %unit.path, error = %err, "unit abandoned");
                UnitOutcome::Rejected(err.to_rejection(&unit.path))
            }
            Err(payload) => {
                let err = EngineError::Internal(panic_message(payload.as_ref()));
                warn!(path = %unit.path, error = %err, "unit skipped after fault");
                UnitOutcome::Rejected(err.to_rejection(&unit.path))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic while analysing unit".to_string()
    }
}

/// Analyse `text` with default settings and no deadline.
pub fn analyze_source(path: &str, text: &str) -> UnitOutcome {
    Analyzer::default().analyze_isolated(&SourceUnit::new(path, text), &Deadline::none())
}
