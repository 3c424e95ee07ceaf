//! IR Validation
//!
//! Checks the structural invariants the analyses rely on before a program is
//! handed to them: ids in range, operands defined before use, loop indices
//! owned by loops and within the loop's dimensionality, non-empty pointer
//! candidate sets, struct-for tasks that name their container, and a storage
//! tree whose ids match positions and whose parent links are acyclic.

use super::{OffloadedTaskType, Program, SNodeId, Stmt, StmtId};
use crate::error_codes;
use fxhash::FxHashMap;
use std::fmt;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Statement the error was found in, if any
    pub stmt: Option<StmtId>,
}

/// Types of validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Reference to a statement outside the arena
    UnknownStmt { referenced: StmtId },

    /// Reference to a storage node outside the tree
    UnknownSNode { referenced: SNodeId },

    /// Operand not defined before its user
    UseBeforeDefine { operand: StmtId },

    /// Loop index whose owner is not a loop statement
    BadLoopIndex { owner: StmtId },

    /// Pointer computation with no candidate storage node
    EmptyCandidates,

    /// Struct-for task without a container storage node
    MissingContainer,

    /// Statement listed in more than one block
    MultipleParents,

    /// Loop index naming a dimension at or above its loop's dimensionality
    LoopIndexOutOfRange { owner: StmtId, index: usize, dims: usize },

    /// Storage node whose id is not its position in the tree
    SNodeIdMismatch { position: usize, id: SNodeId },

    /// Storage node lying on a cycle of parent links
    SNodeParentCycle { snode: SNodeId },
}

impl ValidationErrorKind {
    pub fn code(&self) -> u16 {
        match self {
            ValidationErrorKind::UnknownStmt { .. } => error_codes::E_VALIDATION_UNKNOWN_STMT,
            ValidationErrorKind::UnknownSNode { .. } => error_codes::E_VALIDATION_UNKNOWN_SNODE,
            ValidationErrorKind::UseBeforeDefine { .. } => {
                error_codes::E_VALIDATION_USE_BEFORE_DEFINE
            }
            ValidationErrorKind::BadLoopIndex { .. } => error_codes::E_VALIDATION_BAD_LOOP_INDEX,
            ValidationErrorKind::EmptyCandidates => error_codes::E_VALIDATION_EMPTY_CANDIDATES,
            ValidationErrorKind::MissingContainer => error_codes::E_VALIDATION_MISSING_CONTAINER,
            ValidationErrorKind::MultipleParents => error_codes::E_VALIDATION_MULTIPLE_PARENTS,
            ValidationErrorKind::LoopIndexOutOfRange { .. } => {
                error_codes::E_VALIDATION_LOOP_INDEX_OUT_OF_RANGE
            }
            ValidationErrorKind::SNodeIdMismatch { .. } => error_codes::E_VALIDATION_SNODE_ID_MISMATCH,
            ValidationErrorKind::SNodeParentCycle { .. } => {
                error_codes::E_VALIDATION_SNODE_PARENT_CYCLE
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", error_codes::format_error_code(self.kind.code()))?;
        if let Some(stmt) = self.stmt {
            write!(f, "in {}: ", stmt)?;
        }
        match &self.kind {
            ValidationErrorKind::UnknownStmt { referenced } => {
                write!(f, "unknown statement {}", referenced)
            }
            ValidationErrorKind::UnknownSNode { referenced } => {
                write!(f, "unknown storage node {}", referenced)
            }
            ValidationErrorKind::UseBeforeDefine { operand } => {
                write!(f, "operand {} used before its definition", operand)
            }
            ValidationErrorKind::BadLoopIndex { owner } => {
                write!(f, "loop index owner {} is not a loop", owner)
            }
            ValidationErrorKind::EmptyCandidates => {
                write!(f, "pointer computation has no candidate storage node")
            }
            ValidationErrorKind::MissingContainer => {
                write!(f, "struct-for task has no container storage node")
            }
            ValidationErrorKind::MultipleParents => {
                write!(f, "statement appears in more than one block")
            }
            ValidationErrorKind::LoopIndexOutOfRange { owner, index, dims } => {
                write!(f, "loop index {} of {} out of range ({} dimensions)", index, owner, dims)
            }
            ValidationErrorKind::SNodeIdMismatch { position, id } => {
                write!(f, "storage node at position {} has id {}", position, id)
            }
            ValidationErrorKind::SNodeParentCycle { snode } => {
                write!(f, "storage node {} is its own ancestor", snode)
            }
        }
    }
}

/// Validation context
struct ValidationContext<'p> {
    program: &'p Program,
    errors: Vec<ValidationError>,
    /// Block owner of each statement seen so far (`None` for the root block)
    placed: FxHashMap<StmtId, Option<StmtId>>,
}

impl<'p> ValidationContext<'p> {
    fn error(&mut self, stmt: Option<StmtId>, kind: ValidationErrorKind) {
        self.errors.push(ValidationError { kind, stmt });
    }

    fn check_snode(&mut self, user: StmtId, snode: SNodeId) {
        if !self.program.snodes.contains(snode) {
            self.error(Some(user), ValidationErrorKind::UnknownSNode { referenced: snode });
        }
    }

    /// Number of loop dimensions `owner` iterates. `None` when unknown
    /// (struct-for without a valid container, reported separately).
    fn loop_dims(&self, owner: &Stmt) -> Option<usize> {
        match owner {
            Stmt::RangeFor { .. } => Some(1),
            Stmt::Offloaded { task_type, snode, .. } => match task_type {
                OffloadedTaskType::Serial => Some(0),
                OffloadedTaskType::RangeFor | OffloadedTaskType::MeshFor => Some(1),
                OffloadedTaskType::StructFor => {
                    snode.and_then(|s| self.program.snodes.num_active_indices(s))
                }
            },
            _ => None,
        }
    }

    fn check_snode_tree(&mut self) {
        let program = self.program;
        let tree = &program.snodes;
        for (position, node) in tree.iter().enumerate() {
            if node.id.index() != position {
                self.error(None, ValidationErrorKind::SNodeIdMismatch { position, id: node.id });
            }
            if let Some(parent) = node.parent {
                if !tree.contains(parent) {
                    self.error(None, ValidationErrorKind::UnknownSNode { referenced: parent });
                }
            }
        }

        // a node is on a cycle when following at most `len` parent links
        // leads back to its own position
        for position in 0..tree.len() {
            let start = SNodeId::new(position as u32);
            let mut current = tree.parent(start);
            for _ in 0..tree.len() {
                match current {
                    Some(p) if p == start => {
                        self.error(None, ValidationErrorKind::SNodeParentCycle { snode: start });
                        break;
                    }
                    Some(p) => current = tree.parent(p),
                    None => break,
                }
            }
        }
    }

    fn check_block(&mut self, owner: Option<StmtId>, block: &'p [StmtId]) {
        for &id in block {
            if self.placed.insert(id, owner).is_some() {
                self.error(Some(id), ValidationErrorKind::MultipleParents);
                continue;
            }
            match self.program.stmt(id) {
                Some(stmt) => {
                    self.check_stmt(id, stmt);
                    for nested in stmt.blocks() {
                        self.check_block(Some(id), nested);
                    }
                }
                None => self.error(owner, ValidationErrorKind::UnknownStmt { referenced: id }),
            }
        }
    }

    fn check_stmt(&mut self, id: StmtId, stmt: &Stmt) {
        let program = self.program;
        for operand in stmt.operands() {
            if program.stmt(operand).is_none() {
                self.error(Some(id), ValidationErrorKind::UnknownStmt { referenced: operand });
            } else if operand >= id {
                self.error(Some(id), ValidationErrorKind::UseBeforeDefine { operand });
            }
        }
        for snode in stmt.snodes() {
            self.check_snode(id, snode);
        }

        match stmt {
            Stmt::LoopIndex { loop_, index } => match program.stmt(*loop_) {
                Some(owner) if owner.is_loop() => {
                    if let Some(dims) = self.loop_dims(owner) {
                        if *index >= dims {
                            self.error(
                                Some(id),
                                ValidationErrorKind::LoopIndexOutOfRange {
                                    owner: *loop_,
                                    index: *index,
                                    dims,
                                },
                            );
                        }
                    }
                }
                Some(_) => self.error(Some(id), ValidationErrorKind::BadLoopIndex { owner: *loop_ }),
                None => self.error(Some(id), ValidationErrorKind::UnknownStmt { referenced: *loop_ }),
            },
            Stmt::GlobalPtr { snodes, .. } if snodes.is_empty() => {
                self.error(Some(id), ValidationErrorKind::EmptyCandidates);
            }
            Stmt::Offloaded { task_type: OffloadedTaskType::StructFor, snode: None, .. } => {
                self.error(Some(id), ValidationErrorKind::MissingContainer);
            }
            _ => {}
        }
    }
}

/// Validate a program, collecting every error found
pub fn validate_program(program: &Program) -> Result<(), Vec<ValidationError>> {
    let mut ctx = ValidationContext {
        program,
        errors: Vec::new(),
        placed: FxHashMap::default(),
    };

    ctx.check_snode_tree();
    ctx.check_block(None, &program.root);

    if ctx.errors.is_empty() {
        Ok(())
    } else {
        log::debug!("validation found {} error(s)", ctx.errors.len());
        Err(ctx.errors)
    }
}
