//! Loop-unique access analyses for offloaded compute tasks.
//!
//! Given a program split into task boundaries, the analyses decide which
//! storage nodes each task touches at exactly one address per iteration.
//! Backends use the result to drop atomics and to skip the read half of
//! read-modify-write updates of packed bit-struct words.
//!
//! Entry points:
//! - [`analysis::gather_uniquely_accessed_pointers`] for one task
//! - [`analysis::gather_uniquely_accessed_bit_structs`] for a whole program

pub mod analysis;
pub mod error;
pub mod error_codes;
pub mod ir;
pub mod logging;

pub use error::{AnalysisError, ProgramLoadError};
