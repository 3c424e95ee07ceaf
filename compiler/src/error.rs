//! Error types
//!
//! [`AnalysisError`] covers precondition violations inside the analyses. They
//! are bugs in whatever produced the IR and abort the pass invocation.
//! "Could not prove" is never an error: it is the sentinel in result maps.
//!
//! [`ProgramLoadError`] covers loading a serialized program for the driver.

use crate::error_codes::{self, ErrorCode};
use crate::ir::validation::ValidationError;
use crate::ir::{SNodeId, StmtId};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal precondition violation inside an analysis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("statement {0} is not a task boundary")]
    NotATaskBoundary(StmtId),

    #[error("loop dimensionality of task {0} queried before it was set")]
    DimensionalityUnset(StmtId),

    #[error(
        "pointers {lhs} and {rhs} into bit-struct {container} have {lhs_arity} and {rhs_arity} indices"
    )]
    IndexArityMismatch {
        container: SNodeId,
        lhs: StmtId,
        rhs: StmtId,
        lhs_arity: usize,
        rhs_arity: usize,
    },

    #[error("struct-for task {0} has no container storage node")]
    StructForWithoutSNode(StmtId),

    #[error("bit-level storage node {0} has no physical container")]
    OrphanBitLevelSNode(SNodeId),

    #[error("unknown statement {0}")]
    UnknownStmt(StmtId),

    #[error("unknown storage node {0}")]
    UnknownSNode(SNodeId),

    #[error("statement {0} is not a pointer computation")]
    NotAPointer(StmtId),
}

impl AnalysisError {
    /// Numeric code from the error registry
    pub fn code(&self) -> u16 {
        match self {
            AnalysisError::NotATaskBoundary(_) => error_codes::E_NOT_A_TASK_BOUNDARY,
            AnalysisError::DimensionalityUnset(_) => error_codes::E_DIMENSIONALITY_UNSET,
            AnalysisError::IndexArityMismatch { .. } => error_codes::E_INDEX_ARITY_MISMATCH,
            AnalysisError::StructForWithoutSNode(_) => error_codes::E_STRUCT_FOR_WITHOUT_SNODE,
            AnalysisError::OrphanBitLevelSNode(_) => error_codes::E_ORPHAN_BIT_LEVEL_SNODE,
            AnalysisError::UnknownStmt(_) => error_codes::E_UNKNOWN_STMT,
            AnalysisError::UnknownSNode(_) => error_codes::E_UNKNOWN_SNODE,
            AnalysisError::NotAPointer(_) => error_codes::E_NOT_A_POINTER,
        }
    }

    pub fn error_code(&self) -> Option<&'static ErrorCode> {
        error_codes::get_error_code(self.code())
    }
}

/// Failure to load a serialized program or driver configuration
#[derive(Debug, Error)]
pub enum ProgramLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported IR version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("malformed configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Holds at least one error; build it with [`ProgramLoadError::invalid`]
    #[error("program failed validation with {} error(s)", 1 + .rest.len())]
    Invalid {
        first: ValidationError,
        rest: Vec<ValidationError>,
    },
}

impl ProgramLoadError {
    /// `None` when `errors` is empty
    pub fn invalid(errors: Vec<ValidationError>) -> Option<Self> {
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        Some(ProgramLoadError::Invalid {
            first,
            rest: errors.collect(),
        })
    }

    /// Validation errors in report order; empty for every other variant
    pub fn validation_errors(&self) -> impl Iterator<Item = &ValidationError> {
        let (first, rest) = match self {
            ProgramLoadError::Invalid { first, rest } => (Some(first), rest.as_slice()),
            _ => (None, &[][..]),
        };
        first.into_iter().chain(rest)
    }

    pub fn code(&self) -> u16 {
        match self {
            ProgramLoadError::Io { .. } => error_codes::E_LOAD_IO,
            ProgramLoadError::Malformed(_) => error_codes::E_LOAD_MALFORMED,
            ProgramLoadError::Version { .. } => error_codes::E_LOAD_VERSION,
            ProgramLoadError::Config(_) => error_codes::E_LOAD_CONFIG,
            ProgramLoadError::Invalid { first, .. } => first.kind.code(),
        }
    }

    pub fn error_code(&self) -> Option<&'static ErrorCode> {
        error_codes::get_error_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::validation::ValidationErrorKind;

    #[test]
    fn test_analysis_error_codes_are_registered() {
        let errors = [
            AnalysisError::NotATaskBoundary(StmtId::new(0)),
            AnalysisError::DimensionalityUnset(StmtId::new(0)),
            AnalysisError::IndexArityMismatch {
                container: SNodeId::new(1),
                lhs: StmtId::new(2),
                rhs: StmtId::new(3),
                lhs_arity: 1,
                rhs_arity: 2,
            },
            AnalysisError::StructForWithoutSNode(StmtId::new(0)),
            AnalysisError::OrphanBitLevelSNode(SNodeId::new(4)),
            AnalysisError::UnknownStmt(StmtId::new(9)),
            AnalysisError::UnknownSNode(SNodeId::new(9)),
            AnalysisError::NotAPointer(StmtId::new(1)),
        ];
        for error in &errors {
            let code = error.error_code().expect("registered");
            assert_eq!(code.category, "Analysis");
        }
    }

    #[test]
    fn test_arity_message() {
        let error = AnalysisError::IndexArityMismatch {
            container: SNodeId::new(1),
            lhs: StmtId::new(2),
            rhs: StmtId::new(3),
            lhs_arity: 1,
            rhs_arity: 2,
        };
        assert_eq!(
            error.to_string(),
            "pointers $2 and $3 into bit-struct S1 have 1 and 2 indices"
        );
    }

    #[test]
    fn test_empty_validation_list_is_not_a_load_error() {
        assert!(ProgramLoadError::invalid(Vec::new()).is_none());
    }

    #[test]
    fn test_invalid_program_reports_its_first_error() {
        let errors = vec![
            ValidationError {
                kind: ValidationErrorKind::LoopIndexOutOfRange {
                    owner: StmtId::new(0),
                    index: 1,
                    dims: 0,
                },
                stmt: Some(StmtId::new(1)),
            },
            ValidationError {
                kind: ValidationErrorKind::UnknownSNode { referenced: SNodeId::new(8) },
                stmt: Some(StmtId::new(2)),
            },
        ];
        let error = ProgramLoadError::invalid(errors).expect("non-empty");
        assert_eq!(error.code(), error_codes::E_VALIDATION_LOOP_INDEX_OUT_OF_RANGE);
        assert_eq!(error.error_code().map(|c| c.category), Some("Validation"));
        assert_eq!(error.to_string(), "program failed validation with 2 error(s)");
        let stmts: Vec<_> = error.validation_errors().map(|e| e.stmt).collect();
        assert_eq!(stmts, [Some(StmtId::new(1)), Some(StmtId::new(2))]);
    }

    #[test]
    fn test_other_load_errors_have_no_validation_errors() {
        let error = ProgramLoadError::Version { found: 2, expected: 1 };
        assert_eq!(error.code(), error_codes::E_LOAD_VERSION);
        assert_eq!(error.validation_errors().count(), 0);
    }
}
