//! Error Code Registry for the access analyses
//!
//! Every error the crate can report maps to a stable code so that drivers can
//! print it and tests can match on it.
//!
//! # Error Code Ranges
//!
//! - E1000-E1999: Program loading and driver errors (I/O, malformed input, version)
//! - E2000-E2999: IR validation errors
//! - E9000-E9999: Analysis precondition violations (internal errors)
//!
//! Codes in the E9xxx range indicate a bug in whatever produced the IR; the
//! analysis aborts and publishes nothing.

use std::collections::HashMap;
use std::fmt;

/// Error code struct containing the numeric code and human-readable description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// The numeric error code (e.g., 9001)
    pub code: u16,
    /// Human-readable error category
    pub category: &'static str,
    /// Brief description of what this error means
    pub description: &'static str,
    /// Optional help text
    pub help: Option<&'static str>,
}

impl ErrorCode {
    pub const fn new(
        code: u16,
        category: &'static str,
        description: &'static str,
        help: Option<&'static str>,
    ) -> Self {
        Self {
            code,
            category,
            description,
            help,
        }
    }

    /// Format the error code as "E{code:04}" (e.g., "E9001")
    pub fn format_code(&self) -> String {
        format!("E{:04}", self.code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.format_code(),
            self.category,
            self.description
        )
    }
}

// ===== LOAD ERRORS (E1000-E1999) =====
pub const E_LOAD_IO: u16 = 1001;
pub const E_LOAD_MALFORMED: u16 = 1002;
pub const E_LOAD_VERSION: u16 = 1003;
pub const E_LOAD_CONFIG: u16 = 1004;
pub const E_DRIVER_UNKNOWN_CODE: u16 = 1005;

// ===== VALIDATION ERRORS (E2000-E2999) =====
pub const E_VALIDATION_UNKNOWN_STMT: u16 = 2001;
pub const E_VALIDATION_UNKNOWN_SNODE: u16 = 2002;
pub const E_VALIDATION_USE_BEFORE_DEFINE: u16 = 2003;
pub const E_VALIDATION_BAD_LOOP_INDEX: u16 = 2004;
pub const E_VALIDATION_EMPTY_CANDIDATES: u16 = 2005;
pub const E_VALIDATION_MISSING_CONTAINER: u16 = 2006;
pub const E_VALIDATION_MULTIPLE_PARENTS: u16 = 2007;
pub const E_VALIDATION_LOOP_INDEX_OUT_OF_RANGE: u16 = 2008;
pub const E_VALIDATION_SNODE_ID_MISMATCH: u16 = 2009;
pub const E_VALIDATION_SNODE_PARENT_CYCLE: u16 = 2010;

// ===== ANALYSIS PRECONDITIONS (E9000-E9999) =====
pub const E_NOT_A_TASK_BOUNDARY: u16 = 9001;
pub const E_DIMENSIONALITY_UNSET: u16 = 9002;
pub const E_INDEX_ARITY_MISMATCH: u16 = 9003;
pub const E_STRUCT_FOR_WITHOUT_SNODE: u16 = 9004;
pub const E_ORPHAN_BIT_LEVEL_SNODE: u16 = 9005;
pub const E_UNKNOWN_STMT: u16 = 9006;
pub const E_UNKNOWN_SNODE: u16 = 9007;
pub const E_NOT_A_POINTER: u16 = 9008;

/// Registry containing all defined error codes
pub struct ErrorCodeRegistry {
    codes: HashMap<u16, ErrorCode>,
}

impl ErrorCodeRegistry {
    /// Create a new registry with all predefined error codes
    pub fn new() -> Self {
        let mut registry = Self {
            codes: HashMap::new(),
        };
        registry.register_all_codes();
        registry
    }

    /// Get an error code by its numeric value
    pub fn get(&self, code: u16) -> Option<&ErrorCode> {
        self.codes.get(&code)
    }

    /// Get an error code by its formatted string (e.g., "E9001")
    pub fn get_by_string(&self, code_str: &str) -> Option<&ErrorCode> {
        self.get(parse_error_code(code_str)?)
    }

    fn register(&mut self, error_code: ErrorCode) {
        self.codes.insert(error_code.code, error_code);
    }

    fn register_all_codes(&mut self) {
        // ===== LOAD ERRORS =====
        self.register(ErrorCode::new(
            E_LOAD_IO,
            "Load",
            "Could not read program file",
            None,
        ));
        self.register(ErrorCode::new(
            E_LOAD_MALFORMED,
            "Load",
            "Malformed program description",
            Some("The program must be a JSON object with `snodes`, `stmts` and `root`"),
        ));
        self.register(ErrorCode::new(
            E_LOAD_VERSION,
            "Load",
            "Unsupported IR version",
            None,
        ));
        self.register(ErrorCode::new(
            E_LOAD_CONFIG,
            "Load",
            "Malformed configuration file",
            None,
        ));
        self.register(ErrorCode::new(
            E_DRIVER_UNKNOWN_CODE,
            "Driver",
            "No such error code",
            Some("Run `uniqpass explain` without arguments to list every code"),
        ));

        // ===== VALIDATION ERRORS =====
        self.register(ErrorCode::new(
            E_VALIDATION_UNKNOWN_STMT,
            "Validation",
            "Reference to an unknown statement",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_UNKNOWN_SNODE,
            "Validation",
            "Reference to an unknown storage node",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_USE_BEFORE_DEFINE,
            "Validation",
            "Operand used before its definition",
            Some("Operands must precede their users in the statement list"),
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_BAD_LOOP_INDEX,
            "Validation",
            "Loop index does not belong to a loop",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_EMPTY_CANDIDATES,
            "Validation",
            "Pointer computation without candidate storage nodes",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_MISSING_CONTAINER,
            "Validation",
            "Struct-for task without a container storage node",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_MULTIPLE_PARENTS,
            "Validation",
            "Statement appears in more than one block",
            None,
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_LOOP_INDEX_OUT_OF_RANGE,
            "Validation",
            "Loop index names a dimension its loop does not iterate",
            Some("Serial tasks have no loop dimensions; struct-for tasks have as many as their container"),
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_SNODE_ID_MISMATCH,
            "Validation",
            "Storage node id differs from its position in the tree",
            Some("The n-th entry of `snodes.nodes` must have id n"),
        ));
        self.register(ErrorCode::new(
            E_VALIDATION_SNODE_PARENT_CYCLE,
            "Validation",
            "Storage node parents form a cycle",
            None,
        ));

        // ===== ANALYSIS PRECONDITIONS =====
        self.register(ErrorCode::new(
            E_NOT_A_TASK_BOUNDARY,
            "Analysis",
            "Per-task analysis invoked on a statement that is not a task boundary",
            None,
        ));
        self.register(ErrorCode::new(
            E_DIMENSIONALITY_UNSET,
            "Analysis",
            "Loop dimensionality queried before it was set",
            None,
        ));
        self.register(ErrorCode::new(
            E_INDEX_ARITY_MISMATCH,
            "Analysis",
            "Pointers into one bit-struct disagree in index arity",
            Some("An upstream pass produced inconsistent pointer computations"),
        ));
        self.register(ErrorCode::new(
            E_STRUCT_FOR_WITHOUT_SNODE,
            "Analysis",
            "Struct-for task has no container storage node",
            None,
        ));
        self.register(ErrorCode::new(
            E_ORPHAN_BIT_LEVEL_SNODE,
            "Analysis",
            "Bit-level storage node has no physical container",
            None,
        ));
        self.register(ErrorCode::new(
            E_UNKNOWN_STMT,
            "Analysis",
            "Reference to an unknown statement",
            None,
        ));
        self.register(ErrorCode::new(
            E_UNKNOWN_SNODE,
            "Analysis",
            "Reference to an unknown storage node",
            None,
        ));
        self.register(ErrorCode::new(
            E_NOT_A_POINTER,
            "Analysis",
            "Representative statement is not a pointer computation",
            None,
        ));
    }

    /// All registered codes, ascending
    pub fn all(&self) -> Vec<&ErrorCode> {
        let mut codes: Vec<_> = self.codes.values().collect();
        codes.sort_by_key(|code| code.code);
        codes
    }
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<ErrorCodeRegistry> = std::sync::OnceLock::new();

/// Global registry instance
pub fn error_registry() -> &'static ErrorCodeRegistry {
    REGISTRY.get_or_init(ErrorCodeRegistry::new)
}

pub fn get_error_code(code: u16) -> Option<&'static ErrorCode> {
    error_registry().get(code)
}

pub fn format_error_code(code: u16) -> String {
    format!("E{:04}", code)
}

/// Parse "E9001" into 9001
pub fn parse_error_code(code_str: &str) -> Option<u16> {
    code_str.strip_prefix('E')?.parse::<u16>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_functionality() {
        let registry = ErrorCodeRegistry::new();

        let arity = registry.get(E_INDEX_ARITY_MISMATCH).unwrap();
        assert_eq!(arity.category, "Analysis");

        let by_string = registry.get_by_string("E9001").unwrap();
        assert_eq!(by_string.code, E_NOT_A_TASK_BOUNDARY);

        assert!(registry.get(65535).is_none());
        assert!(registry.get_by_string("INVALID").is_none());
    }

    #[test]
    fn test_all_is_sorted_and_complete() {
        let all = error_registry().all();
        assert_eq!(all.len(), 23);
        assert!(all.windows(2).all(|w| w[0].code < w[1].code));
        assert_eq!(all.first().map(|e| e.code), Some(E_LOAD_IO));
        assert_eq!(all.last().map(|e| e.code), Some(E_NOT_A_POINTER));
        assert_eq!(all.iter().filter(|e| e.category == "Analysis").count(), 8);
    }

    #[test]
    fn test_helper_functions() {
        assert_eq!(format_error_code(9003), "E9003");
        assert_eq!(format_error_code(42), "E0042");
        assert_eq!(parse_error_code("E2001"), Some(2001));
        assert_eq!(parse_error_code("2001"), None);

        let code = get_error_code(E_LOAD_MALFORMED).unwrap();
        assert_eq!(code.to_string(), "E1002 [Load]: Malformed program description");
    }
}
