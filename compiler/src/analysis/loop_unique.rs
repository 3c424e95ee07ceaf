//! Loop-invariance and loop-uniqueness classification.
//!
//! A single forward walk over one task body tags values that are:
//!
//! - **loop-invariant**: identical in every iteration of the task;
//! - **loop-unique**: pairwise distinct across iterations, either because the
//!   value is (an injective function of) the `d`-th iteration index, or because
//!   an earlier pass marked it unique across the whole iteration space.
//!
//! Rules:
//!
//! ```text
//! const                          -> invariant
//! loop_index(task, d)            -> unique along d   (indices of nested loops ignored)
//! loop_unique(x)                 -> fully unique
//! neg(u)                         -> tag of u
//! u (+|-|^) inv, inv (+|-|^) u   -> tag of u
//! op(inv...)                     -> invariant
//! ```
//!
//! The walk relies on definitions preceding uses; there is no fixpoint.
//!
//! A pointer's address is loop-unique when one index is fully unique, or when
//! its indices together cover every loop dimension of the task:
//!
//! ```text
//! for i, j in x:
//!     a[j, i]   loop-unique
//!     b[i, i]   not loop-unique (no j)
//! ```

use crate::error::AnalysisError;
use crate::ir::{walk_task_body, Program, Stmt, StmtId};
use fxhash::{FxHashMap, FxHashSet};

/// Loop-uniqueness tag of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopUniqueness {
    /// Equal to an injective function of the given iteration index
    Index(usize),
    /// Distinct across every iteration of the task
    Full,
}

/// Whether indices carrying `tags` address a loop-unique location in a task
/// with `num_loop_indices` loop dimensions.
///
/// Untagged indices are `None`. A single fully-unique index suffices;
/// otherwise the distinct dimensions covered must number `num_loop_indices`.
pub fn is_address_loop_unique<I>(tags: I, num_loop_indices: usize) -> bool
where
    I: IntoIterator<Item = Option<LoopUniqueness>>,
{
    let mut covered = FxHashSet::default();
    for tag in tags {
        match tag {
            Some(LoopUniqueness::Full) => return true,
            Some(LoopUniqueness::Index(dim)) => {
                covered.insert(dim);
            }
            None => {}
        }
    }
    covered.len() == num_loop_indices
}

/// Classifies the values of one task body.
#[derive(Debug)]
pub struct LoopUniqueStmtSearcher<'a> {
    program: &'a Program,
    task: StmtId,

    /// Values that don't change across iterations
    loop_invariant: FxHashSet<StmtId>,

    /// Values distinct across iterations
    loop_unique: FxHashMap<StmtId, LoopUniqueness>,

    /// Number of loop dimensions of the task; `None` until set
    num_different_loop_indices: Option<usize>,
}

impl<'a> LoopUniqueStmtSearcher<'a> {
    pub fn new(program: &'a Program, task: StmtId) -> Self {
        Self {
            program,
            task,
            loop_invariant: FxHashSet::default(),
            loop_unique: FxHashMap::default(),
            num_different_loop_indices: None,
        }
    }

    pub fn task(&self) -> StmtId {
        self.task
    }

    pub fn set_num_different_loop_indices(&mut self, num: usize) {
        self.num_different_loop_indices = Some(num);
    }

    pub fn num_different_loop_indices(&self) -> Option<usize> {
        self.num_different_loop_indices
    }

    /// Walk the task body once, in definition order.
    pub fn run(&mut self) {
        let program = self.program;
        walk_task_body(program, self.task, &mut |id, stmt| self.visit(id, stmt));
        log::trace!(
            "task {}: {} invariant, {} unique values",
            self.task,
            self.loop_invariant.len(),
            self.loop_unique.len()
        );
    }

    fn visit(&mut self, id: StmtId, stmt: &Stmt) {
        match stmt {
            Stmt::Const { .. } => {
                self.loop_invariant.insert(id);
            }
            Stmt::LoopIndex { loop_, index } => {
                if *loop_ == self.task {
                    self.loop_unique.insert(id, LoopUniqueness::Index(*index));
                }
            }
            Stmt::LoopUnique { .. } => {
                self.loop_unique.insert(id, LoopUniqueness::Full);
            }
            Stmt::UnaryOp { op, operand } => {
                if self.is_loop_invariant(*operand) {
                    self.loop_invariant.insert(id);
                }
                if op.is_injective() {
                    if let Some(tag) = self.loop_uniqueness(*operand) {
                        self.loop_unique.insert(id, tag);
                    }
                }
            }
            Stmt::BinaryOp { op, lhs, rhs } => {
                let lhs_invariant = self.is_loop_invariant(*lhs);
                let rhs_invariant = self.is_loop_invariant(*rhs);
                if lhs_invariant && rhs_invariant {
                    self.loop_invariant.insert(id);
                }
                if op.is_injective_with_invariant_operand() {
                    // unique op invariant, invariant op unique
                    let tag = match (self.loop_uniqueness(*lhs), self.loop_uniqueness(*rhs)) {
                        (Some(tag), None) if rhs_invariant => Some(tag),
                        (None, Some(tag)) if lhs_invariant => Some(tag),
                        _ => None,
                    };
                    if let Some(tag) = tag {
                        self.loop_unique.insert(id, tag);
                    }
                }
            }
            Stmt::GlobalPtr { .. }
            | Stmt::GlobalLoad { .. }
            | Stmt::GlobalStore { .. }
            | Stmt::AtomicOp { .. }
            | Stmt::SNodeOp { .. }
            | Stmt::If { .. }
            | Stmt::RangeFor { .. }
            | Stmt::Offloaded { .. } => {}
        }
    }

    pub fn is_loop_invariant(&self, id: StmtId) -> bool {
        self.loop_invariant.contains(&id)
    }

    pub fn loop_uniqueness(&self, id: StmtId) -> Option<LoopUniqueness> {
        self.loop_unique.get(&id).copied()
    }

    /// Whether the address computed by pointer `ptr` is loop-unique.
    pub fn is_ptr_indices_loop_unique(&self, ptr: StmtId) -> Result<bool, AnalysisError> {
        let num = self
            .num_different_loop_indices()
            .ok_or(AnalysisError::DimensionalityUnset(self.task))?;
        let indices = self
            .program
            .try_stmt(ptr)?
            .ptr_indices()
            .ok_or(AnalysisError::NotAPointer(ptr))?;
        Ok(is_address_loop_unique(
            indices.iter().map(|&index| self.loop_uniqueness(index)),
            num,
        ))
    }
}
