//! Program Builder
//!
//! This module provides a builder interface for constructing programs in a
//! convenient way. The builder keeps a stack of open blocks: statements are
//! appended to the innermost one, and `begin_*`/`end_*` pairs open and close
//! the bodies of task boundaries, conditionals and nested loops.

use tracing::debug;

use super::{
    AtomicOpType, BinaryOpType, Block, ConstValue, OffloadedTaskType, Program, SNodeId,
    SNodeOpType, SNodeTree, Stmt, StmtId, UnaryOpType,
};
use super::validation::{validate_program, ValidationError};

/// Which block of its owner a frame fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockSlot {
    Root,
    Body,
    TrueBlock,
    FalseBlock,
}

#[derive(Debug)]
struct Frame {
    owner: Option<StmtId>,
    slot: BlockSlot,
    items: Block,
}

/// Builder for [`Program`]s
pub struct ProgramBuilder {
    /// The program being built
    program: Program,

    /// Open blocks, innermost last. The root frame is always at the bottom.
    frames: Vec<Frame>,
}

impl ProgramBuilder {
    /// Create a new builder over a storage tree
    pub fn new(snodes: SNodeTree) -> Self {
        Self {
            program: Program::new(snodes),
            frames: vec![Frame {
                owner: None,
                slot: BlockSlot::Root,
                items: Vec::new(),
            }],
        }
    }

    /// Storage tree of the program being built
    pub fn snodes(&self) -> &SNodeTree {
        &self.program.snodes
    }

    /// Append a statement to the innermost open block
    pub fn push(&mut self, stmt: Stmt) -> StmtId {
        let id = self.program.push(stmt);
        if let Some(frame) = self.frames.last_mut() {
            frame.items.push(id);
        }
        id
    }

    fn open(&mut self, owner: StmtId, slot: BlockSlot) {
        self.frames.push(Frame {
            owner: Some(owner),
            slot,
            items: Vec::new(),
        });
    }

    /// Close the innermost frame if it fills one of `slots`, storing its
    /// statements into the owner. Returns the owner.
    fn close(&mut self, slots: &[BlockSlot]) -> Option<StmtId> {
        let frame = self.frames.last()?;
        if !slots.contains(&frame.slot) {
            debug!("builder: cannot close {:?} frame as {:?}", frame.slot, slots);
            return None;
        }
        let frame = self.frames.pop()?;
        let owner = frame.owner?;
        match (self.program.stmt_mut(owner)?, frame.slot) {
            (Stmt::Offloaded { body, .. }, BlockSlot::Body)
            | (Stmt::RangeFor { body, .. }, BlockSlot::Body)
            | (Stmt::If { true_block: body, .. }, BlockSlot::TrueBlock)
            | (Stmt::If { false_block: body, .. }, BlockSlot::FalseBlock) => {
                *body = frame.items;
            }
            _ => return None,
        }
        Some(owner)
    }

    // === Task Boundaries ===

    /// Open a task boundary; subsequent statements go into its body
    pub fn begin_offload(&mut self, task_type: OffloadedTaskType, snode: Option<SNodeId>) -> StmtId {
        let id = self.push(Stmt::Offloaded {
            task_type,
            snode,
            body: Vec::new(),
        });
        debug!("builder: begin {} task {}", task_type, id);
        self.open(id, BlockSlot::Body);
        id
    }

    /// Close the innermost task boundary
    pub fn end_offload(&mut self) -> Option<StmtId> {
        self.close(&[BlockSlot::Body])
    }

    // === Control Flow ===

    /// Open a conditional; subsequent statements go into its true block
    pub fn begin_if(&mut self, cond: StmtId) -> StmtId {
        let id = self.push(Stmt::If {
            cond,
            true_block: Vec::new(),
            false_block: Vec::new(),
        });
        self.open(id, BlockSlot::TrueBlock);
        id
    }

    /// Switch the innermost conditional to its false block
    pub fn begin_else(&mut self) -> Option<StmtId> {
        let owner = self.close(&[BlockSlot::TrueBlock])?;
        self.open(owner, BlockSlot::FalseBlock);
        Some(owner)
    }

    /// Close the innermost conditional
    pub fn end_if(&mut self) -> Option<StmtId> {
        self.close(&[BlockSlot::TrueBlock, BlockSlot::FalseBlock])
    }

    /// Open a serial loop nested in the current task
    pub fn begin_range_for(&mut self, begin: StmtId, end: StmtId) -> StmtId {
        let id = self.push(Stmt::RangeFor {
            begin,
            end,
            body: Vec::new(),
        });
        self.open(id, BlockSlot::Body);
        id
    }

    pub fn end_range_for(&mut self) -> Option<StmtId> {
        self.close(&[BlockSlot::Body])
    }

    // === Values ===

    pub fn const_value(&mut self, value: ConstValue) -> StmtId {
        self.push(Stmt::Const { value })
    }

    pub fn const_i32(&mut self, value: i32) -> StmtId {
        self.const_value(ConstValue::I32(value))
    }

    pub fn unary(&mut self, op: UnaryOpType, operand: StmtId) -> StmtId {
        self.push(Stmt::UnaryOp { op, operand })
    }

    pub fn neg(&mut self, operand: StmtId) -> StmtId {
        self.unary(UnaryOpType::Neg, operand)
    }

    pub fn binary(&mut self, op: BinaryOpType, lhs: StmtId, rhs: StmtId) -> StmtId {
        self.push(Stmt::BinaryOp { op, lhs, rhs })
    }

    pub fn add(&mut self, lhs: StmtId, rhs: StmtId) -> StmtId {
        self.binary(BinaryOpType::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: StmtId, rhs: StmtId) -> StmtId {
        self.binary(BinaryOpType::Sub, lhs, rhs)
    }

    /// The `index`-th iteration index of `loop_`
    pub fn loop_index(&mut self, loop_: StmtId, index: usize) -> StmtId {
        self.push(Stmt::LoopIndex { loop_, index })
    }

    pub fn loop_unique(&mut self, input: StmtId) -> StmtId {
        self.push(Stmt::LoopUnique { input })
    }

    // === Memory ===

    pub fn global_ptr(&mut self, snodes: &[SNodeId], indices: &[StmtId]) -> StmtId {
        self.push(Stmt::GlobalPtr {
            snodes: snodes.iter().copied().collect(),
            indices: indices.iter().copied().collect(),
        })
    }

    pub fn global_load(&mut self, src: StmtId) -> StmtId {
        self.push(Stmt::GlobalLoad { src })
    }

    pub fn global_store(&mut self, dest: StmtId, value: StmtId) -> StmtId {
        self.push(Stmt::GlobalStore { dest, value })
    }

    pub fn atomic(&mut self, op: AtomicOpType, dest: StmtId, value: StmtId) -> StmtId {
        self.push(Stmt::AtomicOp { op, dest, value })
    }

    pub fn snode_op(
        &mut self,
        op: SNodeOpType,
        snode: SNodeId,
        ptr: StmtId,
        value: Option<StmtId>,
    ) -> StmtId {
        self.push(Stmt::SNodeOp { op, snode, ptr, value })
    }

    // === Finishing ===

    fn close_all(&mut self) {
        while self.frames.len() > 1 {
            let slot = self.frames.last().map(|f| f.slot);
            debug!("builder: closing unterminated {:?} block", slot);
            if let Some(slot) = slot {
                if self.close(&[slot]).is_none() {
                    self.frames.pop();
                }
            }
        }
    }

    /// Close any open blocks and return the program without validating it
    pub fn finish_unchecked(mut self) -> Program {
        self.close_all();
        if let Some(root) = self.frames.pop() {
            self.program.root = root.items;
        }
        self.program
    }

    /// Close any open blocks and return the validated program
    pub fn finish(self) -> Result<Program, Vec<ValidationError>> {
        let program = self.finish_unchecked();
        validate_program(&program)?;
        Ok(program)
    }
}
