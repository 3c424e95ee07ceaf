//! Per-task summary of access analysis results.

use super::alias::AliasOracle;
use super::bit_struct::{
    GatherUniquelyAccessedBitStructsPass, UniquelyAccessedBitStructGatherer,
};
use super::manager::AnalysisManager;
use super::uniquely_accessed::{
    gather_uniquely_accessed_pointers, num_loop_indices, UniquelyAccessedPointers,
};
use super::AnalysisConfig;
use crate::error::AnalysisError;
use crate::ir::{OffloadedTaskType, Program, SNodeId, Stmt, StmtId};
use serde::Serialize;
use std::fmt::Write;

/// One storage node and its representative pointer, if uniquely accessed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEntry {
    pub snode: SNodeId,
    pub label: String,
    pub representative: Option<StmtId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task: StmtId,
    pub task_type: OffloadedTaskType,
    pub num_loop_indices: usize,
    pub pointers: Vec<AccessEntry>,
    /// `None` for serial tasks
    pub bit_structs: Option<Vec<AccessEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub tasks: Vec<TaskReport>,
}

fn entries(program: &Program, map: &UniquelyAccessedPointers) -> Vec<AccessEntry> {
    map.iter()
        .map(|(&snode, &representative)| AccessEntry {
            snode,
            label: program.snodes.label(snode),
            representative,
        })
        .collect()
}

fn task_type_of(program: &Program, task: StmtId) -> Result<OffloadedTaskType, AnalysisError> {
    match program.try_stmt(task)? {
        Stmt::Offloaded { task_type, .. } => Ok(*task_type),
        _ => Err(AnalysisError::NotATaskBoundary(task)),
    }
}

impl AnalysisReport {
    /// Report on every task of `program`.
    ///
    /// The bit-struct pass result is taken from `amgr`, computing it first if
    /// it is not cached.
    pub fn build<O: AliasOracle + ?Sized>(
        program: &Program,
        oracle: &O,
        config: AnalysisConfig,
        amgr: &mut AnalysisManager,
    ) -> Result<Self, AnalysisError> {
        let bit_structs = amgr.get_or_compute::<GatherUniquelyAccessedBitStructsPass, _, _>(|| {
            UniquelyAccessedBitStructGatherer::new(program, oracle, config).run()
        })?;

        let mut tasks = Vec::new();
        for task in program.tasks() {
            let pointers = gather_uniquely_accessed_pointers(program, task, oracle)?;
            tasks.push(TaskReport {
                task,
                task_type: task_type_of(program, task)?,
                num_loop_indices: num_loop_indices(program, task)?,
                pointers: entries(program, &pointers),
                bit_structs: bit_structs.get(&task).map(|m| entries(program, m)),
            });
        }
        Ok(Self { tasks })
    }

    /// Report on the single task boundary `task`.
    pub fn for_task<O: AliasOracle + ?Sized>(
        program: &Program,
        task: StmtId,
        oracle: &O,
    ) -> Result<Self, AnalysisError> {
        let task_type = task_type_of(program, task)?;
        let pointers = gather_uniquely_accessed_pointers(program, task, oracle)?;
        let bit_structs = if task_type.is_data_parallel() {
            let gatherer =
                UniquelyAccessedBitStructGatherer::new(program, oracle, AnalysisConfig::default());
            Some(entries(program, &gatherer.gather_task(task)?))
        } else {
            None
        };
        Ok(Self {
            tasks: vec![TaskReport {
                task,
                task_type,
                num_loop_indices: num_loop_indices(program, task)?,
                pointers: entries(program, &pointers),
                bit_structs,
            }],
        })
    }

    /// Human-readable listing
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for task in &self.tasks {
            writeln!(
                out,
                "task {} ({}, {} loop dims)",
                task.task, task.task_type, task.num_loop_indices
            )
            .unwrap();
            write_entries(&mut out, "pointers", &task.pointers);
            if let Some(bit_structs) = &task.bit_structs {
                write_entries(&mut out, "bit structs", bit_structs);
            }
        }
        out
    }
}

fn write_entries(out: &mut String, title: &str, entries: &[AccessEntry]) {
    writeln!(out, "  {}:", title).unwrap();
    if entries.is_empty() {
        writeln!(out, "    (none)").unwrap();
    }
    for entry in entries {
        match entry.representative {
            Some(ptr) => writeln!(out, "    {} -> {}", entry.label, ptr).unwrap(),
            None => writeln!(out, "    {} -> not unique", entry.label).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::alias::StructuralAliasOracle;
    use crate::ir::{ProgramBuilder, SNodeTree, SNodeType};

    fn program() -> (Program, StmtId, StmtId) {
        let mut tree = SNodeTree::new();
        let dense = tree.add_named_child(tree.root(), SNodeType::Dense, 1, "grid");
        let bits = tree.add_named_child(dense, SNodeType::BitStruct, 0, "word");
        let a = tree.add_named_child(bits, SNodeType::Place, 0, "a");
        let mut b = ProgramBuilder::new(tree);
        let range = b.begin_offload(OffloadedTaskType::RangeFor, None);
        let i = b.loop_index(range, 0);
        b.global_ptr(&[a], &[i]);
        b.end_offload();
        let serial = b.begin_offload(OffloadedTaskType::Serial, None);
        let zero = b.const_i32(0);
        b.global_ptr(&[a], &[zero]);
        b.end_offload();
        (b.finish().unwrap(), range, serial)
    }

    #[test]
    fn test_build_covers_every_task_and_caches_pass() {
        let (program, range, serial) = program();
        let oracle = StructuralAliasOracle::new(&program);
        let mut amgr = AnalysisManager::new();
        let report =
            AnalysisReport::build(&program, &oracle, AnalysisConfig::default(), &mut amgr).unwrap();

        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].task, range);
        assert_eq!(report.tasks[0].num_loop_indices, 1);
        assert_eq!(report.tasks[0].bit_structs.as_ref().map(|b| b.len()), Some(1));
        assert_eq!(report.tasks[1].task, serial);
        assert!(report.tasks[1].bit_structs.is_none());
        // serial task with no loop dims: every address counts as loop-unique
        assert!(report.tasks[1].pointers[0].representative.is_some());
        assert!(amgr.get_pass_result::<GatherUniquelyAccessedBitStructsPass>().is_some());

        let single = AnalysisReport::for_task(&program, range, &oracle).unwrap();
        assert_eq!(single.tasks[0], report.tasks[0]);
    }

    #[test]
    fn test_text_and_json() {
        let (program, _, _) = program();
        let oracle = StructuralAliasOracle::new(&program);
        let mut amgr = AnalysisManager::new();
        let report =
            AnalysisReport::build(&program, &oracle, AnalysisConfig::default(), &mut amgr).unwrap();

        let text = report.to_text();
        assert!(text.starts_with("task $0 (range_for, 1 loop dims)\n  pointers:\n"));
        assert!(text.contains("  bit structs:\n"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tasks"][0]["task"], 0);
        assert_eq!(json["tasks"][1]["bit_structs"], serde_json::Value::Null);
    }

    #[test]
    fn test_for_task_rejects_non_boundary() {
        let (program, _, _) = program();
        let oracle = StructuralAliasOracle::new(&program);
        let not_a_task = StmtId::new(1);
        assert_eq!(
            AnalysisReport::for_task(&program, not_a_task, &oracle).unwrap_err(),
            AnalysisError::NotATaskBoundary(not_a_task)
        );
    }
}
