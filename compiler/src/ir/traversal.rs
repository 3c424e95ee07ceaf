//! Statement traversal
//!
//! Visits statements of a block in body order, descending into the blocks of
//! control-flow statements. Because every operand is defined before its user,
//! this order is also a valid definition order for forward analyses.

use super::{Program, Stmt, StmtId};

/// Traversal options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkOptions {
    /// Descend into the bodies of nested task boundaries
    pub dive_into_offloaded: bool,
}

impl WalkOptions {
    /// Stay inside the current task
    pub fn task_local() -> Self {
        Self { dive_into_offloaded: false }
    }

    /// Visit everything, including nested task bodies
    pub fn everything() -> Self {
        Self { dive_into_offloaded: true }
    }
}

/// Visit every statement reachable from `block` in pre-order.
///
/// A statement is visited before the statements of its nested blocks. Unknown
/// ids are skipped; [`validation`](super::validation) reports them.
pub fn walk_block<'p, F>(program: &'p Program, block: &'p [StmtId], options: WalkOptions, f: &mut F)
where
    F: FnMut(StmtId, &'p Stmt),
{
    for &id in block {
        let stmt = match program.stmt(id) {
            Some(stmt) => stmt,
            None => {
                log::warn!("walk: skipping unknown statement {}", id);
                continue;
            }
        };
        f(id, stmt);

        if stmt.is_task_boundary() && !options.dive_into_offloaded {
            continue;
        }
        for nested in stmt.blocks() {
            walk_block(program, nested, options, f);
        }
    }
}

/// Visit the body of task boundary `task` without entering nested tasks.
///
/// Does nothing if `task` is not a task boundary.
pub fn walk_task_body<'p, F>(program: &'p Program, task: StmtId, f: &mut F)
where
    F: FnMut(StmtId, &'p Stmt),
{
    if let Some(Stmt::Offloaded { body, .. }) = program.stmt(task) {
        walk_block(program, body, WalkOptions::task_local(), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOpType, ConstValue, OffloadedTaskType, ProgramBuilder, SNodeTree};

    fn nested_program() -> (Program, StmtId, StmtId) {
        let mut b = ProgramBuilder::new(SNodeTree::new());
        let outer = b.begin_offload(OffloadedTaskType::Serial, None);
        let c = b.const_value(ConstValue::I32(1));
        b.begin_if(c);
        b.binary(BinaryOpType::Add, c, c);
        b.begin_else();
        b.binary(BinaryOpType::Sub, c, c);
        b.end_if();
        let inner = b.begin_offload(OffloadedTaskType::RangeFor, None);
        b.const_value(ConstValue::I32(2));
        b.end_offload();
        b.end_offload();
        (b.finish_unchecked(), outer, inner)
    }

    #[test]
    fn test_walk_is_preorder_and_task_local() {
        let (program, outer, inner) = nested_program();
        let mut seen = Vec::new();
        walk_task_body(&program, outer, &mut |id, stmt| seen.push((id, stmt.mnemonic())));

        let names: Vec<_> = seen.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, vec!["const", "if", "binary", "binary", "offload"]);
        assert_eq!(seen.last().map(|(id, _)| *id), Some(inner));
    }

    #[test]
    fn test_walk_everything_enters_nested_tasks() {
        let (program, _, _) = nested_program();
        let mut count = 0;
        walk_block(&program, &program.root, WalkOptions::everything(), &mut |_, _| count += 1);
        // outer offload, const, if, two binaries, inner offload, inner const
        assert_eq!(count, 7);
    }
}
