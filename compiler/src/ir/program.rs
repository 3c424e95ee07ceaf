//! Programs
//!
//! A [`Program`] is the unit the analyses run on: a storage-node tree, an arena
//! of statements and the root block listing top-level statements (normally the
//! task boundaries, in launch order).

use super::validation::validate_program;
use super::{walk_block, Block, SNodeId, SNode, SNodeTree, Stmt, StmtId, WalkOptions, IR_VERSION};
use crate::error::{AnalysisError, ProgramLoadError};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_version() -> u32 {
    IR_VERSION
}

/// A whole program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default = "default_version")]
    pub version: u32,
    pub snodes: SNodeTree,
    pub stmts: Vec<Stmt>,
    pub root: Block,
}

impl Program {
    /// Create an empty program over a storage tree
    pub fn new(snodes: SNodeTree) -> Self {
        Self {
            version: IR_VERSION,
            snodes,
            stmts: Vec::new(),
            root: Vec::new(),
        }
    }

    /// Append a statement to the arena without placing it in any block
    pub fn push(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.index())
    }

    pub(crate) fn stmt_mut(&mut self, id: StmtId) -> Option<&mut Stmt> {
        self.stmts.get_mut(id.index())
    }

    /// Like [`Program::stmt`], for analyses that treat a dangling id as fatal
    pub fn try_stmt(&self, id: StmtId) -> Result<&Stmt, AnalysisError> {
        self.stmt(id).ok_or(AnalysisError::UnknownStmt(id))
    }

    pub fn snode(&self, id: SNodeId) -> Option<&SNode> {
        self.snodes.get(id)
    }

    pub fn try_snode(&self, id: SNodeId) -> Result<&SNode, AnalysisError> {
        self.snode(id).ok_or(AnalysisError::UnknownSNode(id))
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Every task boundary reachable from the root, in program order.
    ///
    /// Task boundaries nested inside another task's body are included and
    /// follow their enclosing task.
    pub fn tasks(&self) -> Vec<StmtId> {
        let mut tasks = Vec::new();
        walk_block(self, &self.root, WalkOptions::everything(), &mut |id, stmt| {
            if stmt.is_task_boundary() {
                tasks.push(id);
            }
        });
        tasks
    }

    /// Parse a program from JSON and validate it
    pub fn from_json(text: &str) -> Result<Self, ProgramLoadError> {
        let program: Program = serde_json::from_str(text)?;
        if program.version != IR_VERSION {
            return Err(ProgramLoadError::Version {
                found: program.version,
                expected: IR_VERSION,
            });
        }
        if let Some(error) = validate_program(&program)
            .err()
            .and_then(ProgramLoadError::invalid)
        {
            return Err(error);
        }
        Ok(program)
    }

    /// Read, parse and validate a program file
    pub fn load(path: &Path) -> Result<Self, ProgramLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProgramLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loading program from {}", path.display());
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
