//! Uniquely accessed storage nodes of one task.
//!
//! A storage node is uniquely accessed in a task when every pointer
//! computation that may resolve to it is definitely the same address as one
//! representative pointer, and that representative's address is loop-unique.
//! Then each iteration touches its own cell of the node and only through that
//! address.
//!
//! Nodes are mapped to `Some(representative)` or to `None` once any evidence
//! against uniqueness is seen. A `None` entry never reverts.
//!
//! Structural node operations (activation, append, ...) are not treated as
//! accesses here.

use super::alias::AliasOracle;
use super::loop_unique::LoopUniqueStmtSearcher;
use crate::error::AnalysisError;
use crate::ir::{walk_task_body, OffloadedTaskType, Program, SNodeId, Stmt, StmtId};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Storage node -> representative pointer, or `None` if not uniquely accessed
pub type UniquelyAccessedPointers = IndexMap<SNodeId, Option<StmtId>>;

/// Number of loop dimensions a task iterates
pub fn num_loop_indices(program: &Program, task: StmtId) -> Result<usize, AnalysisError> {
    match program.try_stmt(task)? {
        Stmt::Offloaded { task_type, snode, .. } => match task_type {
            OffloadedTaskType::RangeFor | OffloadedTaskType::MeshFor => Ok(1),
            OffloadedTaskType::StructFor => {
                let snode = snode.ok_or(AnalysisError::StructForWithoutSNode(task))?;
                Ok(program.try_snode(snode)?.num_active_indices)
            }
            OffloadedTaskType::Serial => Ok(0),
        },
        _ => Err(AnalysisError::NotATaskBoundary(task)),
    }
}

/// Searches the storage nodes a task accesses uniquely.
pub struct UniquelyAccessedSNodeSearcher<'a, O: AliasOracle + ?Sized> {
    program: &'a Program,
    oracle: &'a O,
    loop_unique_stmt_searcher: LoopUniqueStmtSearcher<'a>,
    accessed_pointer: UniquelyAccessedPointers,
}

impl<'a, O: AliasOracle + ?Sized> UniquelyAccessedSNodeSearcher<'a, O> {
    /// Prepare a search over task boundary `task`.
    pub fn new(program: &'a Program, task: StmtId, oracle: &'a O) -> Result<Self, AnalysisError> {
        let num = num_loop_indices(program, task)?;
        let mut loop_unique_stmt_searcher = LoopUniqueStmtSearcher::new(program, task);
        loop_unique_stmt_searcher.set_num_different_loop_indices(num);
        Ok(Self {
            program,
            oracle,
            loop_unique_stmt_searcher,
            accessed_pointer: IndexMap::new(),
        })
    }

    fn visit_global_ptr(&mut self, ptr: StmtId, snodes: &[SNodeId]) -> Result<(), AnalysisError> {
        for &snode in snodes {
            match self.accessed_pointer.entry(snode) {
                Entry::Vacant(entry) => {
                    let unique = self.loop_unique_stmt_searcher.is_ptr_indices_loop_unique(ptr)?;
                    if !unique {
                        log::debug!("{}: {} is not loop-unique", snode, ptr);
                    }
                    entry.insert(unique.then_some(ptr));
                }
                Entry::Occupied(mut entry) => {
                    if let Some(representative) = *entry.get() {
                        if !self.oracle.definitely_same_address(representative, ptr) {
                            log::debug!(
                                "{}: {} is not definitely the same address as {}",
                                snode,
                                ptr,
                                representative
                            );
                            entry.insert(None);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Classify values, then visit every pointer computation in body order.
    pub fn run(mut self) -> Result<UniquelyAccessedPointers, AnalysisError> {
        self.loop_unique_stmt_searcher.run();

        let task = self.loop_unique_stmt_searcher.task();
        let mut pointers = Vec::new();
        walk_task_body(self.program, task, &mut |id, stmt| {
            if let Stmt::GlobalPtr { snodes, .. } = stmt {
                pointers.push((id, snodes));
            }
        });
        for (ptr, snodes) in pointers {
            self.visit_global_ptr(ptr, snodes)?;
        }

        log::debug!(
            "task {}: {} of {} accessed storage nodes are uniquely accessed",
            task,
            self.accessed_pointer.values().filter(|p| p.is_some()).count(),
            self.accessed_pointer.len()
        );
        Ok(self.accessed_pointer)
    }
}

/// Gather the uniquely accessed storage nodes of task boundary `task`.
pub fn gather_uniquely_accessed_pointers<O: AliasOracle + ?Sized>(
    program: &Program,
    task: StmtId,
    oracle: &O,
) -> Result<UniquelyAccessedPointers, AnalysisError> {
    UniquelyAccessedSNodeSearcher::new(program, task, oracle)?.run()
}
