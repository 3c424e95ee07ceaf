//! IR operation kinds and constant values
//!
//! Defines the operator enums carried by statements, the constant value
//! representation and the kinds of task boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant value carried by [`Stmt::Const`](super::Stmt::Const)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    U32(u32),
    F32(f32),
    F64(f64),
}

impl ConstValue {
    /// Integer view of the constant, if it is an integer
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            ConstValue::I32(v) => Some(v as i64),
            ConstValue::I64(v) => Some(v),
            ConstValue::U32(v) => Some(v as i64),
            ConstValue::F32(_) | ConstValue::F64(_) => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::I32(v) => write!(f, "{}i32", v),
            ConstValue::I64(v) => write!(f, "{}i64", v),
            ConstValue::U32(v) => write!(f, "{}u32", v),
            ConstValue::F32(v) => write!(f, "{}f32", v),
            ConstValue::F64(v) => write!(f, "{}f64", v),
        }
    }
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOpType {
    Neg,
    Abs,
    BitNot,
    LogicNot,
    Sqrt,
    Floor,
    Ceil,
}

impl UnaryOpType {
    /// Whether the operation is known to be injective, so that a loop-unique
    /// operand yields a loop-unique result.
    ///
    /// Only negation is listed. `BitNot` is injective too but is not relied on.
    pub fn is_injective(self) -> bool {
        matches!(self, UnaryOpType::Neg)
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOpType::Neg => "neg",
            UnaryOpType::Abs => "abs",
            UnaryOpType::BitNot => "bit_not",
            UnaryOpType::LogicNot => "logic_not",
            UnaryOpType::Sqrt => "sqrt",
            UnaryOpType::Floor => "floor",
            UnaryOpType::Ceil => "ceil",
        }
    }
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOpType {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Max,
    Min,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitShl,
    BitSar,

    // Comparison
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    CmpEq,
    CmpNe,
}

impl BinaryOpType {
    /// Whether the operation is injective in either operand once the other
    /// operand is fixed.
    pub fn is_injective_with_invariant_operand(self) -> bool {
        matches!(self, BinaryOpType::Add | BinaryOpType::Sub | BinaryOpType::BitXor)
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOpType::Add
                | BinaryOpType::Mul
                | BinaryOpType::Max
                | BinaryOpType::Min
                | BinaryOpType::BitAnd
                | BinaryOpType::BitOr
                | BinaryOpType::BitXor
                | BinaryOpType::CmpEq
                | BinaryOpType::CmpNe
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOpType::Add => "add",
            BinaryOpType::Sub => "sub",
            BinaryOpType::Mul => "mul",
            BinaryOpType::Div => "div",
            BinaryOpType::Mod => "mod",
            BinaryOpType::FloorDiv => "floordiv",
            BinaryOpType::Max => "max",
            BinaryOpType::Min => "min",
            BinaryOpType::BitAnd => "bit_and",
            BinaryOpType::BitOr => "bit_or",
            BinaryOpType::BitXor => "bit_xor",
            BinaryOpType::BitShl => "bit_shl",
            BinaryOpType::BitSar => "bit_sar",
            BinaryOpType::CmpLt => "cmp_lt",
            BinaryOpType::CmpLe => "cmp_le",
            BinaryOpType::CmpGt => "cmp_gt",
            BinaryOpType::CmpGe => "cmp_ge",
            BinaryOpType::CmpEq => "cmp_eq",
            BinaryOpType::CmpNe => "cmp_ne",
        }
    }
}

/// Atomic read-modify-write operations on global memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicOpType {
    Add,
    Sub,
    Max,
    Min,
    BitAnd,
    BitOr,
    BitXor,
}

/// Structural operations on sparse storage nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SNodeOpType {
    Activate,
    Deactivate,
    IsActive,
    Append,
    Length,
}

/// Kind of a task boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffloadedTaskType {
    /// Runs once, no loop
    Serial,
    /// Flat parallel loop over one index
    RangeFor,
    /// Parallel loop over the active cells of a container storage node
    StructFor,
    /// Parallel loop over mesh elements
    MeshFor,
}

impl OffloadedTaskType {
    /// Whether tasks of this kind iterate in parallel
    pub fn is_data_parallel(self) -> bool {
        !matches!(self, OffloadedTaskType::Serial)
    }

    pub fn name(self) -> &'static str {
        match self {
            OffloadedTaskType::Serial => "serial",
            OffloadedTaskType::RangeFor => "range_for",
            OffloadedTaskType::StructFor => "struct_for",
            OffloadedTaskType::MeshFor => "mesh_for",
        }
    }
}

impl fmt::Display for OffloadedTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
