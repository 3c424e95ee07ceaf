//! Uniquely accessed bit-structs.
//!
//! Packed sub-fields of a bit-struct share one physical word, so a write to
//! one field is a read-modify-write of the whole word. The read can only be
//! dropped when every field of the word that a task touches is uniquely
//! accessed, and all of them at the same coordinates.
//!
//! For every data-parallel task this pass takes the per-node result of
//! [`gather_uniquely_accessed_pointers`] and folds the entries of bit-level
//! nodes into their physical container:
//!
//! - the first field seen under a container donates its entry;
//! - a later field keeps the container's representative only if both entries
//!   are representatives whose indices are pairwise value-equal;
//! - anything else marks the container `None` for good.
//!
//! Serial tasks are skipped. Results are published in the [`AnalysisManager`]
//! under [`GatherUniquelyAccessedBitStructsPass`].

use super::alias::AliasOracle;
use super::manager::{AnalysisManager, Pass};
use super::uniquely_accessed::{gather_uniquely_accessed_pointers, UniquelyAccessedPointers};
use super::AnalysisConfig;
use crate::error::AnalysisError;
use crate::ir::{Program, SNodeId, Stmt, StmtId};
use indexmap::map::Entry;
use indexmap::IndexMap;
use rayon::prelude::*;

/// Task boundary -> container storage node -> representative pointer or `None`
pub type UniquelyAccessedBitStructs = IndexMap<StmtId, UniquelyAccessedPointers>;

/// Cache key of the bit-struct gathering pass
pub struct GatherUniquelyAccessedBitStructsPass;

impl Pass for GatherUniquelyAccessedBitStructsPass {
    const ID: &'static str = "GatherUniquelyAccessedBitStructsPass";
    type Result = UniquelyAccessedBitStructs;
}

/// Gathers uniquely accessed bit-structs over a whole program.
pub struct UniquelyAccessedBitStructGatherer<'a, O: AliasOracle + ?Sized> {
    program: &'a Program,
    oracle: &'a O,
    config: AnalysisConfig,
}

impl<'a, O: AliasOracle + ?Sized> UniquelyAccessedBitStructGatherer<'a, O> {
    pub fn new(program: &'a Program, oracle: &'a O, config: AnalysisConfig) -> Self {
        Self {
            program,
            oracle,
            config,
        }
    }

    /// Data-parallel task boundaries, in program order
    fn data_parallel_tasks(&self) -> Vec<StmtId> {
        self.program
            .tasks()
            .into_iter()
            .filter(|&task| match self.program.stmt(task) {
                Some(Stmt::Offloaded { task_type, .. }) => task_type.is_data_parallel(),
                _ => false,
            })
            .collect()
    }

    /// Index operands of representative pointer `ptr`
    fn indices_of(&self, ptr: StmtId) -> Result<&'a [StmtId], AnalysisError> {
        self.program
            .try_stmt(ptr)?
            .ptr_indices()
            .ok_or(AnalysisError::NotAPointer(ptr))
    }

    /// Merge a newly seen field entry into the container's current entry.
    fn merge(
        &self,
        container: SNodeId,
        current: Option<StmtId>,
        incoming: Option<StmtId>,
    ) -> Result<Option<StmtId>, AnalysisError> {
        let (Some(ptr2), Some(ptr1)) = (current, incoming) else {
            return Ok(None);
        };
        let indices1 = self.indices_of(ptr1)?;
        let indices2 = self.indices_of(ptr2)?;
        if indices1.len() != indices2.len() {
            return Err(AnalysisError::IndexArityMismatch {
                container,
                lhs: ptr2,
                rhs: ptr1,
                lhs_arity: indices2.len(),
                rhs_arity: indices1.len(),
            });
        }
        let same = indices1
            .iter()
            .zip(indices2)
            .all(|(&a, &b)| self.oracle.same_value(a, b));
        if same {
            Ok(Some(ptr2))
        } else {
            log::debug!(
                "{}: fields accessed through {} and {} at different coordinates",
                container,
                ptr2,
                ptr1
            );
            Ok(None)
        }
    }

    /// Fold the per-node result of one task into per-container entries.
    pub fn gather_task(&self, task: StmtId) -> Result<UniquelyAccessedPointers, AnalysisError> {
        let loop_unique_ptr = gather_uniquely_accessed_pointers(self.program, task, self.oracle)?;
        let mut loop_unique_bit_struct = UniquelyAccessedPointers::new();

        for (&snode, &ptr1) in &loop_unique_ptr {
            if !self.program.try_snode(snode)?.is_bit_level {
                continue;
            }
            let container = self
                .program
                .snodes
                .container_of(snode)
                .ok_or(AnalysisError::OrphanBitLevelSNode(snode))?;
            match loop_unique_bit_struct.entry(container) {
                Entry::Vacant(entry) => {
                    entry.insert(ptr1);
                }
                Entry::Occupied(mut entry) => {
                    let merged = self.merge(container, *entry.get(), ptr1)?;
                    entry.insert(merged);
                }
            }
        }
        Ok(loop_unique_bit_struct)
    }

    /// Analyze every data-parallel task.
    pub fn run(&self) -> Result<UniquelyAccessedBitStructs, AnalysisError> {
        let tasks = self.data_parallel_tasks();
        let per_task: Vec<(StmtId, UniquelyAccessedPointers)> = if self.config.parallel_tasks {
            tasks
                .par_iter()
                .map(|&task| self.gather_task(task).map(|r| (task, r)))
                .collect::<Result<_, _>>()?
        } else {
            tasks
                .iter()
                .map(|&task| self.gather_task(task).map(|r| (task, r)))
                .collect::<Result<_, _>>()?
        };
        Ok(per_task.into_iter().collect())
    }
}

/// Gather uniquely accessed bit-structs of every data-parallel task and store
/// them in `amgr` under [`GatherUniquelyAccessedBitStructsPass`].
///
/// On error nothing is stored.
pub fn gather_uniquely_accessed_bit_structs<O: AliasOracle + ?Sized>(
    program: &Program,
    oracle: &O,
    amgr: &mut AnalysisManager,
) -> Result<(), AnalysisError> {
    gather_uniquely_accessed_bit_structs_with_config(program, oracle, amgr, AnalysisConfig::default())
}

/// [`gather_uniquely_accessed_bit_structs`] with explicit configuration
pub fn gather_uniquely_accessed_bit_structs_with_config<O: AliasOracle + ?Sized>(
    program: &Program,
    oracle: &O,
    amgr: &mut AnalysisManager,
    config: AnalysisConfig,
) -> Result<(), AnalysisError> {
    let result = UniquelyAccessedBitStructGatherer::new(program, oracle, config).run()?;
    log::info!(
        "{}: analyzed {} data-parallel task(s)",
        GatherUniquelyAccessedBitStructsPass::ID,
        result.len()
    );
    amgr.put_pass_result::<GatherUniquelyAccessedBitStructsPass>(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::alias::StructuralAliasOracle;
    use crate::ir::{OffloadedTaskType, ProgramBuilder, SNodeTree, SNodeType};
    use smallvec::smallvec;

    /// dense(2) -> bit_struct -> {a, b}, plus a plain place `c` under dense
    struct Layout {
        tree: SNodeTree,
        dense: SNodeId,
        bits: SNodeId,
        a: SNodeId,
        b: SNodeId,
        c: SNodeId,
    }

    fn layout() -> Layout {
        let mut tree = SNodeTree::new();
        let dense = tree.add_child(tree.root(), SNodeType::Dense, 2);
        let bits = tree.add_child(dense, SNodeType::BitStruct, 0);
        let a = tree.add_child(bits, SNodeType::Place, 0);
        let b = tree.add_child(bits, SNodeType::Place, 0);
        let c = tree.add_child(dense, SNodeType::Place, 0);
        Layout { tree, dense, bits, a, b, c }
    }

    fn run(program: &Program) -> Result<UniquelyAccessedBitStructs, AnalysisError> {
        let oracle = StructuralAliasOracle::new(program);
        let mut amgr = AnalysisManager::new();
        gather_uniquely_accessed_bit_structs(program, &oracle, &mut amgr)?;
        Ok(amgr
            .get_pass_result::<GatherUniquelyAccessedBitStructsPass>()
            .cloned()
            .unwrap_or_default())
    }

    #[test]
    fn test_value_equal_fields_share_representative() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        let task = b.begin_offload(OffloadedTaskType::StructFor, Some(l.dense));
        let i = b.loop_index(task, 0);
        let j = b.loop_index(task, 1);
        let pa = b.global_ptr(&[l.a], &[i, j]);
        let pb = b.global_ptr(&[l.b], &[i, j]);
        let pc = b.global_ptr(&[l.c], &[i, j]);
        let one = b.const_i32(1);
        b.global_store(pa, one);
        b.global_store(pb, one);
        b.global_store(pc, one);
        b.end_offload();
        let program = b.finish().unwrap();

        let result = run(&program).unwrap();
        let per_task = &result[&task];
        assert_eq!(per_task.get(&l.bits), Some(&Some(pa)));
        assert_ne!(per_task.get(&l.bits), Some(&Some(pb)));
        // plain fields do not appear
        assert!(!per_task.contains_key(&l.dense));
        assert_eq!(per_task.len(), 1);
    }

    #[test]
    fn test_differing_coordinates_sentinel_container() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        let task = b.begin_offload(OffloadedTaskType::StructFor, Some(l.dense));
        let i = b.loop_index(task, 0);
        let j = b.loop_index(task, 1);
        b.global_ptr(&[l.a], &[i, j]);
        b.global_ptr(&[l.b], &[j, i]);
        b.end_offload();
        let program = b.finish().unwrap();

        let result = run(&program).unwrap();
        assert_eq!(result[&task].get(&l.bits), Some(&None));
    }

    #[test]
    fn test_sentineled_field_poisons_container_in_either_order() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        // non-unique field first, unique field second
        let first = b.begin_offload(OffloadedTaskType::StructFor, Some(l.dense));
        let i = b.loop_index(first, 0);
        let j = b.loop_index(first, 1);
        b.global_ptr(&[l.a], &[i, i]);
        b.global_ptr(&[l.b], &[i, j]);
        b.end_offload();
        // unique field first, non-unique field second
        let second = b.begin_offload(OffloadedTaskType::StructFor, Some(l.dense));
        let i = b.loop_index(second, 0);
        let j = b.loop_index(second, 1);
        b.global_ptr(&[l.a], &[i, j]);
        b.global_ptr(&[l.b], &[j, j]);
        b.end_offload();
        let program = b.finish().unwrap();

        let result = run(&program).unwrap();
        assert_eq!(result[&first].get(&l.bits), Some(&None));
        assert_eq!(result[&second].get(&l.bits), Some(&None));
    }

    #[test]
    fn test_single_field_adopts_its_entry() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        let task = b.begin_offload(OffloadedTaskType::RangeFor, None);
        let i = b.loop_index(task, 0);
        let zero = b.const_i32(0);
        let pa = b.global_ptr(&[l.a], &[i, zero]);
        b.end_offload();
        let program = b.finish().unwrap();

        let result = run(&program).unwrap();
        assert_eq!(result[&task].get(&l.bits), Some(&Some(pa)));
    }

    #[test]
    fn test_serial_tasks_are_excluded() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        let serial = b.begin_offload(OffloadedTaskType::Serial, None);
        let zero = b.const_i32(0);
        b.global_ptr(&[l.a], &[zero, zero]);
        b.end_offload();
        let range = b.begin_offload(OffloadedTaskType::RangeFor, None);
        b.end_offload();
        let program = b.finish().unwrap();

        let result = run(&program).unwrap();
        assert!(!result.contains_key(&serial));
        assert!(result[&range].is_empty());
    }

    #[test]
    fn test_arity_mismatch_is_fatal_and_stores_nothing() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        let task = b.begin_offload(OffloadedTaskType::RangeFor, None);
        let i = b.loop_index(task, 0);
        let pa = b.global_ptr(&[l.a], &[i]);
        let pb = b.global_ptr(&[l.b], &[i, i]);
        b.end_offload();
        let program = b.finish().unwrap();

        let oracle = StructuralAliasOracle::new(&program);
        let mut amgr = AnalysisManager::new();
        let error = gather_uniquely_accessed_bit_structs(&program, &oracle, &mut amgr).unwrap_err();
        assert_eq!(
            error,
            AnalysisError::IndexArityMismatch {
                container: l.bits,
                lhs: pa,
                rhs: pb,
                lhs_arity: 1,
                rhs_arity: 2,
            }
        );
        assert!(amgr.is_empty());
    }

    /// Mesh-for task with one pointer into S1 of an unvalidated tree
    fn program_over(tree_json: &str) -> Program {
        let tree: SNodeTree = serde_json::from_str(tree_json).unwrap();
        let mut program = Program::new(tree);
        let task = program.push(Stmt::Offloaded {
            task_type: OffloadedTaskType::MeshFor,
            snode: None,
            body: vec![],
        });
        let i = program.push(Stmt::LoopIndex { loop_: task, index: 0 });
        let p = program.push(Stmt::GlobalPtr {
            snodes: smallvec![SNodeId::new(1)],
            indices: smallvec![i],
        });
        if let Some(Stmt::Offloaded { body, .. }) = program.stmt_mut(task) {
            *body = vec![i, p];
        }
        program.root = vec![task];
        program
    }

    #[test]
    fn test_orphan_bit_level_node_is_fatal() {
        let program = program_over(
            r#"{"nodes":[{"id":0,"kind":"root"},{"id":1,"kind":"place","is_bit_level":true}]}"#,
        );
        assert_eq!(
            run(&program).unwrap_err(),
            AnalysisError::OrphanBitLevelSNode(SNodeId::new(1))
        );
    }

    #[test]
    fn test_parent_cycle_is_fatal_not_endless() {
        let program = program_over(
            r#"{"nodes":[
                {"id":0,"kind":"root"},
                {"id":1,"kind":"place","parent":2,"is_bit_level":true},
                {"id":2,"kind":"place","parent":1,"is_bit_level":true}
            ]}"#,
        );
        assert_eq!(
            run(&program).unwrap_err(),
            AnalysisError::OrphanBitLevelSNode(SNodeId::new(1))
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let l = layout();
        let mut b = ProgramBuilder::new(l.tree);
        for n in 0..8 {
            let task = b.begin_offload(OffloadedTaskType::StructFor, Some(l.dense));
            let i = b.loop_index(task, 0);
            let j = b.loop_index(task, 1);
            b.global_ptr(&[l.a], &[i, j]);
            if n % 2 == 0 {
                b.global_ptr(&[l.b], &[i, j]);
            } else {
                b.global_ptr(&[l.b], &[i, i]);
            }
            b.end_offload();
        }
        let program = b.finish().unwrap();
        let oracle = StructuralAliasOracle::new(&program);

        let sequential = UniquelyAccessedBitStructGatherer::new(
            &program,
            &oracle,
            AnalysisConfig { parallel_tasks: false },
        )
        .run()
        .unwrap();
        let parallel = UniquelyAccessedBitStructGatherer::new(
            &program,
            &oracle,
            AnalysisConfig { parallel_tasks: true },
        )
        .run()
        .unwrap();
        assert_eq!(sequential, parallel);
        assert!(sequential.keys().eq(parallel.keys()));
        assert_eq!(sequential.len(), 8);
    }
}
