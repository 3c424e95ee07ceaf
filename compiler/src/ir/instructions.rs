//! IR Statements
//!
//! Defines the statement set for the task-level IR. Statements are stored in a
//! [`Program`](super::Program) arena; operand links are [`StmtId`]s, so a
//! statement never owns the values it reads.

use super::{AtomicOpType, BinaryOpType, Block, ConstValue, OffloadedTaskType, SNodeId,
            SNodeOpType, StmtId, UnaryOpType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index operands of a pointer computation
pub type Indices = SmallVec<[StmtId; 4]>;

/// Candidate storage nodes a pointer computation may resolve to
pub type SNodeCandidates = SmallVec<[SNodeId; 2]>;

/// IR statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    // === Value Operations ===

    /// Constant value
    Const {
        value: ConstValue,
    },

    /// Unary arithmetic operation
    UnaryOp {
        #[serde(rename = "type")]
        op: UnaryOpType,
        operand: StmtId,
    },

    /// Binary arithmetic operation
    BinaryOp {
        #[serde(rename = "type")]
        op: BinaryOpType,
        lhs: StmtId,
        rhs: StmtId,
    },

    // === Loop Values ===

    /// The `index`-th iteration index of `loop_` (a task boundary or a
    /// nested range-for)
    LoopIndex {
        #[serde(rename = "loop")]
        loop_: StmtId,
        index: usize,
    },

    /// Value marked by an earlier pass as distinct across every iteration of
    /// the enclosing task
    LoopUnique {
        input: StmtId,
    },

    // === Memory Operations ===

    /// Address of a cell of one of `snodes`, selected by `indices`
    GlobalPtr {
        snodes: SNodeCandidates,
        indices: Indices,
    },

    /// Load from a global pointer
    GlobalLoad {
        src: StmtId,
    },

    /// Store to a global pointer
    GlobalStore {
        dest: StmtId,
        value: StmtId,
    },

    /// Atomic read-modify-write on a global pointer
    AtomicOp {
        #[serde(rename = "type")]
        op: AtomicOpType,
        dest: StmtId,
        value: StmtId,
    },

    /// Structural operation (activation, append, ...) on a storage node
    SNodeOp {
        #[serde(rename = "type")]
        op: SNodeOpType,
        snode: SNodeId,
        ptr: StmtId,
        #[serde(default)]
        value: Option<StmtId>,
    },

    // === Control Flow ===

    /// Conditional execution
    If {
        cond: StmtId,
        #[serde(default)]
        true_block: Block,
        #[serde(default)]
        false_block: Block,
    },

    /// Serial loop nested inside a task
    RangeFor {
        begin: StmtId,
        end: StmtId,
        body: Block,
    },

    /// Task boundary. `snode` is the iterated container for struct-for tasks.
    Offloaded {
        task_type: OffloadedTaskType,
        #[serde(default)]
        snode: Option<SNodeId>,
        body: Block,
    },
}

impl Stmt {
    /// Short mnemonic used by the dump and in log messages
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Stmt::Const { .. } => "const",
            Stmt::UnaryOp { .. } => "unary",
            Stmt::BinaryOp { .. } => "binary",
            Stmt::LoopIndex { .. } => "loop_index",
            Stmt::LoopUnique { .. } => "loop_unique",
            Stmt::GlobalPtr { .. } => "global_ptr",
            Stmt::GlobalLoad { .. } => "global_load",
            Stmt::GlobalStore { .. } => "global_store",
            Stmt::AtomicOp { .. } => "atomic",
            Stmt::SNodeOp { .. } => "snode_op",
            Stmt::If { .. } => "if",
            Stmt::RangeFor { .. } => "range_for",
            Stmt::Offloaded { .. } => "offload",
        }
    }

    /// Value operands read by this statement (nested blocks excluded)
    pub fn operands(&self) -> Vec<StmtId> {
        match self {
            Stmt::Const { .. } | Stmt::Offloaded { .. } => vec![],
            Stmt::UnaryOp { operand, .. } => vec![*operand],
            Stmt::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Stmt::LoopIndex { .. } => vec![],
            Stmt::LoopUnique { input } => vec![*input],
            Stmt::GlobalPtr { indices, .. } => indices.to_vec(),
            Stmt::GlobalLoad { src } => vec![*src],
            Stmt::GlobalStore { dest, value } => vec![*dest, *value],
            Stmt::AtomicOp { dest, value, .. } => vec![*dest, *value],
            Stmt::SNodeOp { ptr, value, .. } => {
                let mut uses = vec![*ptr];
                uses.extend(value);
                uses
            }
            Stmt::If { cond, .. } => vec![*cond],
            Stmt::RangeFor { begin, end, .. } => vec![*begin, *end],
        }
    }

    /// Nested blocks owned by this statement, in execution order
    pub fn blocks(&self) -> Vec<&Block> {
        match self {
            Stmt::If { true_block, false_block, .. } => vec![true_block, false_block],
            Stmt::RangeFor { body, .. } | Stmt::Offloaded { body, .. } => vec![body],
            _ => vec![],
        }
    }

    /// Storage nodes referenced directly by this statement
    pub fn snodes(&self) -> Vec<SNodeId> {
        match self {
            Stmt::GlobalPtr { snodes, .. } => snodes.to_vec(),
            Stmt::SNodeOp { snode, .. } => vec![*snode],
            Stmt::Offloaded { snode, .. } => snode.iter().copied().collect(),
            _ => vec![],
        }
    }

    /// Whether this statement is a loop that can own [`Stmt::LoopIndex`] values
    pub fn is_loop(&self) -> bool {
        matches!(self, Stmt::RangeFor { .. } | Stmt::Offloaded { .. })
    }

    pub fn is_task_boundary(&self) -> bool {
        matches!(self, Stmt::Offloaded { .. })
    }

    pub fn is_global_ptr(&self) -> bool {
        matches!(self, Stmt::GlobalPtr { .. })
    }

    /// Index operands if this is a pointer computation
    pub fn ptr_indices(&self) -> Option<&[StmtId]> {
        match self {
            Stmt::GlobalPtr { indices, .. } => Some(indices),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_statement_properties() {
        let add = Stmt::BinaryOp {
            op: BinaryOpType::Add,
            lhs: StmtId::new(2),
            rhs: StmtId::new(3),
        };
        assert_eq!(add.operands(), vec![StmtId::new(2), StmtId::new(3)]);
        assert!(add.blocks().is_empty());
        assert!(!add.is_loop());

        let ptr = Stmt::GlobalPtr {
            snodes: smallvec![SNodeId::new(1)],
            indices: smallvec![StmtId::new(4), StmtId::new(5)],
        };
        assert!(ptr.is_global_ptr());
        assert_eq!(ptr.ptr_indices(), Some(&[StmtId::new(4), StmtId::new(5)][..]));
        assert_eq!(ptr.snodes(), vec![SNodeId::new(1)]);

        let task = Stmt::Offloaded {
            task_type: OffloadedTaskType::RangeFor,
            snode: None,
            body: vec![StmtId::new(0)],
        };
        assert!(task.is_loop());
        assert!(task.is_task_boundary());
        assert_eq!(task.blocks().len(), 1);
    }

    #[test]
    fn test_statement_json_shape() {
        let json = r#"{"op":"binary_op","type":"add","lhs":1,"rhs":2}"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        assert_eq!(
            stmt,
            Stmt::BinaryOp {
                op: BinaryOpType::Add,
                lhs: StmtId::new(1),
                rhs: StmtId::new(2),
            }
        );

        let json = r#"{"op":"loop_index","loop":0,"index":1}"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        assert_eq!(stmt, Stmt::LoopIndex { loop_: StmtId::new(0), index: 1 });
    }
}
