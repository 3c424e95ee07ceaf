//! Task-level Intermediate Representation (IR)
//!
//! This module defines the statement-level IR that the access analyses run on.
//! A [`Program`] owns every statement in a flat arena and lists its top-level
//! statements in a root block. Task boundaries ([`Stmt::Offloaded`]) carry a
//! body block; operands are referenced by [`StmtId`].
//!
//! The IR is designed to be:
//! - Immutable while an analysis borrows it
//! - Defined-before-use (every operand precedes its user in the arena)
//! - Serializable, so programs can be loaded from JSON for the CLI driver

pub mod types;
pub mod instructions;
pub mod snode;
pub mod program;
pub mod builder;
pub mod traversal;
pub mod validation;
pub mod dump;

pub use types::*;
pub use instructions::*;
pub use snode::*;
pub use program::*;
pub use builder::*;
pub use traversal::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR version for compatibility checking of serialized programs
pub const IR_VERSION: u32 = 1;

/// Identifier of a statement in a [`Program`]'s arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StmtId(u32);

impl StmtId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Identifier of a storage node in an [`SNodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SNodeId(u32);

impl SNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A sequence of statements executed in order
pub type Block = Vec<StmtId>;
