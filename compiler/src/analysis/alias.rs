//! Alias and value-equality queries between statements.
//!
//! The gatherers only ever ask two questions, both through [`AliasOracle`]:
//!
//! - `definitely_same_address(a, b)`: do two pointer computations denote the
//!   same address in every execution?
//! - `same_value(a, b)`: do two scalar expressions evaluate to the same value
//!   in every execution?
//!
//! Both answers must be sound: `true` only with proof, `false` whenever in
//! doubt. [`StructuralAliasOracle`] answers them from the shape of the IR.
//!
//! # Alias Results
//!
//! - **Same**: definitely the same address
//! - **Different**: definitely different addresses
//! - **Uncertain**: may or may not be the same address

use crate::ir::{Program, Stmt, StmtId};

/// Result of an alias query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasResult {
    /// Definitely the same address.
    Same,
    /// Definitely different addresses.
    Different,
    /// Nothing could be proven.
    Uncertain,
}

/// Oracle consulted by the access analyses.
///
/// Implementations are shared across tasks analyzed in parallel.
pub trait AliasOracle: Sync {
    /// `true` only if `a` and `b` provably compute the same address.
    fn definitely_same_address(&self, a: StmtId, b: StmtId) -> bool;

    /// `true` only if `a` and `b` provably evaluate to the same value.
    fn same_value(&self, a: StmtId, b: StmtId) -> bool;
}

/// Oracle deciding equality from the structure of the IR.
///
/// Two expressions are value-equal when they are the same statement, equal
/// constants, or the same operator applied to value-equal operands. Loads from
/// memory are only equal to themselves.
#[derive(Debug, Clone, Copy)]
pub struct StructuralAliasOracle<'a> {
    program: &'a Program,
}

impl<'a> StructuralAliasOracle<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Classify the relation between the addresses computed by `a` and `b`.
    pub fn alias_analysis(&self, a: StmtId, b: StmtId) -> AliasResult {
        if a == b {
            return AliasResult::Same;
        }
        let (lhs, rhs) = match (self.program.stmt(a), self.program.stmt(b)) {
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => return AliasResult::Uncertain,
        };
        let (
            Stmt::GlobalPtr { snodes: snodes1, indices: indices1 },
            Stmt::GlobalPtr { snodes: snodes2, indices: indices2 },
        ) = (lhs, rhs)
        else {
            return AliasResult::Uncertain;
        };

        if snodes1.len() != 1 || snodes2.len() != 1 {
            // Polymorphic pointers: nothing is definite unless the sets are disjoint
            let overlap = snodes1.iter().any(|s| snodes2.contains(s));
            return if overlap {
                AliasResult::Uncertain
            } else {
                AliasResult::Different
            };
        }
        if snodes1[0] != snodes2[0] {
            return AliasResult::Different;
        }
        if indices1.len() != indices2.len() {
            return AliasResult::Uncertain;
        }

        let mut all_same = true;
        for (&i1, &i2) in indices1.iter().zip(indices2.iter()) {
            if self.same_value(i1, i2) {
                continue;
            }
            all_same = false;
            if self.distinct_constants(i1, i2) {
                return AliasResult::Different;
            }
        }
        if all_same {
            AliasResult::Same
        } else {
            AliasResult::Uncertain
        }
    }

    fn distinct_constants(&self, a: StmtId, b: StmtId) -> bool {
        match (self.program.stmt(a), self.program.stmt(b)) {
            (Some(Stmt::Const { value: v1 }), Some(Stmt::Const { value: v2 })) => {
                match (v1.as_int(), v2.as_int()) {
                    (Some(x), Some(y)) => x != y,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl AliasOracle for StructuralAliasOracle<'_> {
    fn definitely_same_address(&self, a: StmtId, b: StmtId) -> bool {
        self.alias_analysis(a, b) == AliasResult::Same
    }

    fn same_value(&self, a: StmtId, b: StmtId) -> bool {
        if a == b {
            return true;
        }
        let (lhs, rhs) = match (self.program.stmt(a), self.program.stmt(b)) {
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => return false,
        };
        match (lhs, rhs) {
            (Stmt::Const { value: v1 }, Stmt::Const { value: v2 }) => v1 == v2,
            (
                Stmt::UnaryOp { op: op1, operand: x1 },
                Stmt::UnaryOp { op: op2, operand: x2 },
            ) => op1 == op2 && self.same_value(*x1, *x2),
            (
                Stmt::BinaryOp { op: op1, lhs: l1, rhs: r1 },
                Stmt::BinaryOp { op: op2, lhs: l2, rhs: r2 },
            ) => {
                op1 == op2
                    && ((self.same_value(*l1, *l2) && self.same_value(*r1, *r2))
                        || (op1.is_commutative()
                            && self.same_value(*l1, *r2)
                            && self.same_value(*r1, *l2)))
            }
            (
                Stmt::LoopIndex { loop_: loop1, index: index1 },
                Stmt::LoopIndex { loop_: loop2, index: index2 },
            ) => loop1 == loop2 && index1 == index2,
            (Stmt::LoopUnique { input: x1 }, Stmt::LoopUnique { input: x2 }) => {
                self.same_value(*x1, *x2)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        BinaryOpType, OffloadedTaskType, ProgramBuilder, SNodeId, SNodeTree, SNodeType,
    };

    struct Fixture {
        program: Program,
        x: SNodeId,
        i: StmtId,
        j: StmtId,
        one: StmtId,
        two: StmtId,
    }

    fn fixture(build: impl FnOnce(&mut ProgramBuilder, &Fixture)) -> Fixture {
        let mut tree = SNodeTree::new();
        let dense = tree.add_child(tree.root(), SNodeType::Dense, 2);
        let x = tree.add_child(dense, SNodeType::Place, 0);
        let mut b = ProgramBuilder::new(tree);
        let task = b.begin_offload(OffloadedTaskType::StructFor, Some(dense));
        let i = b.loop_index(task, 0);
        let j = b.loop_index(task, 1);
        let one = b.const_i32(1);
        let two = b.const_i32(2);
        let mut f = Fixture {
            program: Program::new(SNodeTree::new()),
            x,
            i,
            j,
            one,
            two,
        };
        build(&mut b, &f);
        b.end_offload();
        f.program = b.finish().unwrap();
        f
    }

    #[test]
    fn test_same_value_structural() {
        let mut ids = Vec::new();
        let f = fixture(|b, f| {
            let a = b.add(f.i, f.one);
            let c = b.add(f.one, f.i); // commuted
            let d = b.sub(f.i, f.one);
            let e = b.sub(f.one, f.i);
            let g = b.const_i32(1);
            let n1 = b.neg(f.j);
            let n2 = b.neg(f.j);
            ids.extend([a, c, d, e, g, n1, n2]);
        });
        let oracle = StructuralAliasOracle::new(&f.program);
        let [a, c, d, e, g, n1, n2] = ids[..] else { unreachable!() };

        assert!(oracle.same_value(a, c));
        assert!(!oracle.same_value(d, e));
        assert!(oracle.same_value(g, f.one));
        assert!(!oracle.same_value(f.one, f.two));
        assert!(oracle.same_value(n1, n2));
        assert!(!oracle.same_value(f.i, f.j));
        assert!(!oracle.same_value(a, d));
    }

    #[test]
    fn test_loads_are_not_value_equal() {
        let mut ids = Vec::new();
        let f = fixture(|b, f| {
            let p = b.global_ptr(&[f.x], &[f.i, f.j]);
            let l1 = b.global_load(p);
            let l2 = b.global_load(p);
            ids.extend([l1, l2]);
        });
        let oracle = StructuralAliasOracle::new(&f.program);
        assert!(oracle.same_value(ids[0], ids[0]));
        assert!(!oracle.same_value(ids[0], ids[1]));
    }

    #[test]
    fn test_alias_analysis_on_pointers() {
        let mut ids = Vec::new();
        let f = fixture(|b, f| {
            let p1 = b.global_ptr(&[f.x], &[f.i, f.j]);
            let p2 = b.global_ptr(&[f.x], &[f.i, f.j]);
            let k = b.binary(BinaryOpType::Add, f.j, f.one);
            let p3 = b.global_ptr(&[f.x], &[f.i, k]);
            let p4 = b.global_ptr(&[f.x], &[f.one, f.j]);
            let p5 = b.global_ptr(&[f.x], &[f.two, f.j]);
            let p6 = b.global_ptr(&[f.x], &[f.i]);
            ids.extend([p1, p2, p3, p4, p5, p6]);
        });
        let oracle = StructuralAliasOracle::new(&f.program);
        let [p1, p2, p3, p4, p5, p6] = ids[..] else { unreachable!() };

        assert_eq!(oracle.alias_analysis(p1, p2), AliasResult::Same);
        assert!(oracle.definitely_same_address(p1, p2));
        assert_eq!(oracle.alias_analysis(p1, p3), AliasResult::Uncertain);
        assert!(!oracle.definitely_same_address(p1, p3));
        assert_eq!(oracle.alias_analysis(p4, p5), AliasResult::Different);
        assert_eq!(oracle.alias_analysis(p1, p6), AliasResult::Uncertain);
        assert_eq!(oracle.alias_analysis(p1, f.i), AliasResult::Uncertain);
    }

    #[test]
    fn test_alias_analysis_on_candidate_sets() {
        let mut tree = SNodeTree::new();
        let a = tree.add_child(tree.root(), SNodeType::Place, 0);
        let c = tree.add_child(tree.root(), SNodeType::Place, 0);
        let d = tree.add_child(tree.root(), SNodeType::Place, 0);
        let mut b = ProgramBuilder::new(tree);
        b.begin_offload(OffloadedTaskType::Serial, None);
        let p1 = b.global_ptr(&[a, c], &[]);
        let p2 = b.global_ptr(&[a, c], &[]);
        let p3 = b.global_ptr(&[d], &[]);
        let p4 = b.global_ptr(&[a], &[]);
        b.end_offload();
        let program = b.finish().unwrap();
        let oracle = StructuralAliasOracle::new(&program);

        assert_eq!(oracle.alias_analysis(p1, p2), AliasResult::Uncertain);
        assert_eq!(oracle.alias_analysis(p1, p3), AliasResult::Different);
        assert_eq!(oracle.alias_analysis(p3, p4), AliasResult::Different);
        assert_eq!(oracle.alias_analysis(p1, p1), AliasResult::Same);
    }
}
