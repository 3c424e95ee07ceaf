//! IR Dump Utility
//!
//! Pretty-prints programs in a human-readable, indented listing. Useful for
//! debugging analyses and for the driver's `--dump-ir` flag.

use super::{Block, Program, SNodeTree, Stmt, StmtId};
use std::fmt::Write;

/// Dump an entire program (storage tree followed by statements) to a string.
pub fn dump_program(program: &Program) -> String {
    let mut out = String::new();
    writeln!(out, "; IR version {}", program.version).unwrap();
    writeln!(out, "; Statements: {}", program.len()).unwrap();
    out.push_str(&dump_snodes(&program.snodes));
    writeln!(out).unwrap();
    dump_block(program, &program.root, 0, &mut out);
    out
}

/// Dump the storage tree, one node per line, children indented under parents.
pub fn dump_snodes(tree: &SNodeTree) -> String {
    let mut out = String::new();
    for node in tree.iter() {
        let mut depth = 0;
        let mut parent = node.parent;
        while let Some(p) = parent {
            depth += 1;
            parent = tree.parent(p);
            if depth > tree.len() {
                break;
            }
        }
        write!(out, "; {}{}", "  ".repeat(depth), tree.label(node.id)).unwrap();
        if node.num_active_indices > 0 {
            write!(out, " dims={}", node.num_active_indices).unwrap();
        }
        if node.is_bit_level {
            write!(out, " bit_level").unwrap();
        }
        writeln!(out).unwrap();
    }
    out
}

fn dump_block(program: &Program, block: &Block, depth: usize, out: &mut String) {
    for &id in block {
        let indent = "  ".repeat(depth);
        let stmt = match program.stmt(id) {
            Some(stmt) => stmt,
            None => {
                writeln!(out, "{}{} = <unknown>", indent, id).unwrap();
                continue;
            }
        };
        writeln!(out, "{}{}", indent, dump_stmt(id, stmt)).unwrap();

        match stmt {
            Stmt::If { true_block, false_block, .. } => {
                dump_block(program, true_block, depth + 1, out);
                if !false_block.is_empty() {
                    writeln!(out, "{}}} else {{", indent).unwrap();
                    dump_block(program, false_block, depth + 1, out);
                }
                writeln!(out, "{}}}", indent).unwrap();
            }
            Stmt::RangeFor { body, .. } | Stmt::Offloaded { body, .. } => {
                dump_block(program, body, depth + 1, out);
                writeln!(out, "{}}}", indent).unwrap();
            }
            _ => {}
        }
    }
}

fn list(ids: &[StmtId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

/// Dump a single statement header (without nested blocks).
pub fn dump_stmt(id: StmtId, stmt: &Stmt) -> String {
    match stmt {
        Stmt::Const { value } => format!("{} = const {}", id, value),
        Stmt::UnaryOp { op, operand } => format!("{} = {} {}", id, op.name(), operand),
        Stmt::BinaryOp { op, lhs, rhs } => format!("{} = {} {}, {}", id, op.name(), lhs, rhs),
        Stmt::LoopIndex { loop_, index } => format!("{} = loop {} index {}", id, loop_, index),
        Stmt::LoopUnique { input } => format!("{} = loop_unique {}", id, input),
        Stmt::GlobalPtr { snodes, indices } => {
            let snodes: Vec<String> = snodes.iter().map(|s| s.to_string()).collect();
            format!("{} = global ptr [{}], index [{}]", id, snodes.join(", "), list(indices))
        }
        Stmt::GlobalLoad { src } => format!("{} = global load {}", id, src),
        Stmt::GlobalStore { dest, value } => format!("{} : global store [{} <- {}]", id, dest, value),
        Stmt::AtomicOp { op, dest, value } => {
            format!("{} = atomic {:?}({}, {})", id, op, dest, value)
        }
        Stmt::SNodeOp { op, snode, ptr, value } => match value {
            Some(value) => format!("{} = {:?} {}, {}, {}", id, op, snode, ptr, value),
            None => format!("{} = {:?} {}, {}", id, op, snode, ptr),
        },
        Stmt::If { cond, .. } => format!("{} : if {} {{", id, cond),
        Stmt::RangeFor { begin, end, .. } => format!("{} : for in range({}, {}) {{", id, begin, end),
        Stmt::Offloaded { task_type, snode, .. } => match snode {
            Some(snode) => format!("{} = offloaded {} over {} {{", id, task_type, snode),
            None => format!("{} = offloaded {} {{", id, task_type),
        },
    }
}
