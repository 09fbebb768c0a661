//! CFG navigation helpers over deserialized front-end data.
//!
//! Predecessor lists are always derived from successor edges. The dominator
//! tree comes from the blocks' `idom` fields when the front-end filled them
//! in, and is computed with the Cooper-Harvey-Kennedy iteration otherwise.

use crate::ir::{BasicBlock, BinOpKind, BlockId, Function, Instruction, Value, ValueId, ValueKind};

/// A traversable view of a function's CFG and dominator tree.
pub struct Cfg<'a> {
    func: &'a Function,
    preds: Vec<Vec<BlockId>>,
    idoms: Vec<Option<BlockId>>,
    dominees: Vec<Vec<BlockId>>,
}

/// A block that ends in `if x == y` or `if x != y`.
#[derive(Debug, Clone, Copy)]
pub struct EqualityBranch<'a> {
    /// The comparison value itself (carries the source position).
    pub cond: &'a Value,
    pub op: BinOpKind,
    pub x: ValueId,
    pub y: ValueId,
    /// Successor taken when the operands are equal.
    pub tsucc: BlockId,
    /// Successor taken when the operands differ.
    pub fsucc: BlockId,
}

impl<'a> Cfg<'a> {
    /// Build traversal indices from a deserialized function
    pub fn from_function(func: &'a Function) -> Self {
        let n = func.blocks.len();
        let mut preds: Vec<Vec<BlockId>> = vec![Vec::new(); n];
        for block in func.blocks.iter().filter(|b| b.id.index() < n) {
            for &succ in &block.succs {
                if let Some(p) = preds.get_mut(succ.index()) {
                    p.push(block.id);
                }
            }
        }

        let mut cfg = Self {
            func,
            preds,
            idoms: vec![None; n],
            dominees: vec![Vec::new(); n],
        };

        let provided = func.blocks.iter().skip(1).any(|b| b.idom.is_some());
        cfg.idoms = if provided {
            let mut idoms: Vec<Option<BlockId>> = func.blocks.iter().map(|b| b.idom).collect();
            if let Some(entry) = idoms.first_mut() {
                *entry = None;
            }
            idoms
        } else {
            cfg.compute_idoms()
        };

        // Children in block order, like go/ssa's dominator tree.
        // Out-of-range ids in malformed input are dropped.
        for block in &func.blocks {
            let Some(parent) = cfg.idom(block.id) else {
                continue;
            };
            if let Some(children) = cfg.dominees.get_mut(parent.index()) {
                children.push(block.id);
            }
        }
        cfg
    }

    pub fn function(&self) -> &'a Function {
        self.func
    }

    pub fn block(&self, id: BlockId) -> Option<&'a BasicBlock> {
        self.func.block(id)
    }

    pub fn block_count(&self) -> usize {
        self.func.blocks.len()
    }

    pub fn successors(&self, id: BlockId) -> &'a [BlockId] {
        self.func
            .block(id)
            .map(|b| b.succs.as_slice())
            .unwrap_or(&[])
    }

    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        self.preds.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `id` can only be entered from one edge, so anything
    /// learned on that edge holds on entry.
    pub fn has_single_pred(&self, id: BlockId) -> bool {
        self.predecessors(id).len() == 1
    }

    pub fn idom(&self, id: BlockId) -> Option<BlockId> {
        self.idoms.get(id.index()).copied().flatten()
    }

    /// Children of `id` in the dominator tree.
    pub fn dominees(&self, id: BlockId) -> &[BlockId] {
        self.dominees
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reverse post-order from the entry, unreachable blocks omitted.
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let n = self.func.blocks.len();
        let mut postorder = Vec::with_capacity(n);
        if n == 0 {
            return postorder;
        }
        let mut visited = vec![false; n];
        let mut stack: Vec<(BlockId, usize)> = vec![(BlockId::ENTRY, 0)];
        visited[0] = true;

        while let Some(top) = stack.last_mut() {
            let (block, next) = *top;
            let succs = self.successors(block);
            if next < succs.len() {
                top.1 += 1;
                let succ = succs[next];
                match visited.get_mut(succ.index()) {
                    Some(seen) if !*seen => {
                        *seen = true;
                        stack.push((succ, 0));
                    }
                    _ => {}
                }
            } else {
                postorder.push(block);
                stack.pop();
            }
        }

        postorder.reverse();
        postorder
    }

    fn compute_idoms(&self) -> Vec<Option<BlockId>> {
        let n = self.func.blocks.len();
        let mut idoms: Vec<Option<BlockId>> = vec![None; n];
        let rpo = self.reverse_postorder();
        let Some(&entry) = rpo.first() else {
            return idoms;
        };

        let mut order = vec![usize::MAX; n];
        for (i, b) in rpo.iter().enumerate() {
            order[b.index()] = i;
        }

        idoms[entry.index()] = Some(entry);
        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let mut new_idom: Option<BlockId> = None;
                for &pred in self.predecessors(block) {
                    if idoms[pred.index()].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(&idoms, &order, current, pred),
                    });
                }
                if new_idom.is_some() && idoms[block.index()] != new_idom {
                    idoms[block.index()] = new_idom;
                    changed = true;
                }
            }
        }

        idoms[entry.index()] = None;
        idoms
    }

    /// If `id` ends in an `If` on an `==`/`!=` comparison, return the
    /// comparison and its equal/not-equal successors.
    pub fn equality_branch(&self, id: BlockId) -> Option<EqualityBranch<'a>> {
        let block = self.func.block(id)?;
        let Some(Instruction::If { cond }) = block.terminator() else {
            return None;
        };
        if block.succs.len() != 2 {
            return None;
        }
        let value = self.func.value(*cond)?;
        let ValueKind::BinOp { op, x, y } = &value.kind else {
            return None;
        };
        let (tsucc, fsucc) = match op {
            BinOpKind::Eql => (block.succs[0], block.succs[1]),
            BinOpKind::Neq => (block.succs[1], block.succs[0]),
            BinOpKind::Other => return None,
        };
        Some(EqualityBranch {
            cond: value,
            op: *op,
            x: *x,
            y: *y,
            tsucc,
            fsucc,
        })
    }
}

fn intersect(
    idoms: &[Option<BlockId>],
    order: &[usize],
    mut a: BlockId,
    mut b: BlockId,
) -> BlockId {
    while a != b {
        while order[a.index()] > order[b.index()] {
            match idoms[a.index()] {
                Some(parent) => a = parent,
                None => return b,
            }
        }
        while order[b.index()] > order[a.index()] {
            match idoms[b.index()] {
                Some(parent) => b = parent,
                None => return a,
            }
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn block(id: u32, succs: &[u32]) -> BasicBlock {
        BasicBlock {
            id: BlockId(id),
            comment: String::new(),
            instructions: vec![],
            succs: succs.iter().map(|&s| BlockId(s)).collect(),
            idom: None,
        }
    }

    fn func(blocks: Vec<BasicBlock>) -> Function {
        Function {
            name: "test.F".into(),
            short_name: "F".into(),
            span: None,
            values: vec![],
            blocks,
        }
    }

    /// 0 -> {1, 2}; 1 -> 3; 2 -> 3
    fn diamond() -> Function {
        func(vec![
            block(0, &[1, 2]),
            block(1, &[3]),
            block(2, &[3]),
            block(3, &[]),
        ])
    }

    fn ids(v: &[BlockId]) -> Vec<u32> {
        v.iter().map(|b| b.0).collect()
    }

    #[test]
    fn test_predecessors_derived_from_succs() {
        let f = diamond();
        let cfg = Cfg::from_function(&f);
        assert_eq!(ids(cfg.predecessors(BlockId(3))), vec![1, 2]);
        assert!(cfg.has_single_pred(BlockId(1)));
        assert!(!cfg.has_single_pred(BlockId(3)));
        assert!(cfg.predecessors(BlockId(0)).is_empty());
    }

    #[test]
    fn test_diamond_dominator_tree() {
        let f = diamond();
        let cfg = Cfg::from_function(&f);
        assert_eq!(ids(cfg.dominees(BlockId(0))), vec![1, 2, 3]);
        assert!(cfg.dominees(BlockId(1)).is_empty());
        assert_eq!(cfg.idom(BlockId(3)), Some(BlockId(0)));
        assert_eq!(cfg.idom(BlockId(0)), None);
    }

    #[test]
    fn test_out_of_range_successor_is_ignored() {
        let f = func(vec![block(0, &[1, 5]), block(1, &[])]);
        let cfg = Cfg::from_function(&f);
        assert_eq!(cfg.reverse_postorder(), vec![BlockId(0), BlockId(1)]);
        assert_eq!(ids(cfg.dominees(BlockId(0))), vec![1]);
        assert!(cfg.predecessors(BlockId(5)).is_empty());
    }

    #[test]
    fn test_out_of_range_idom_is_ignored() {
        let mut f = diamond();
        f.blocks[1].idom = Some(BlockId(0));
        f.blocks[2].idom = Some(BlockId(0));
        f.blocks[3].idom = Some(BlockId(42));
        let cfg = Cfg::from_function(&f);
        assert_eq!(ids(cfg.dominees(BlockId(0))), vec![1, 2]);
        assert_eq!(cfg.idom(BlockId(3)), Some(BlockId(42)));
        assert!(cfg.dominees(BlockId(42)).is_empty());
    }

    #[test]
    fn test_loop_dominator_tree() {
        // 0 -> 1; 1 -> {2, 3}; 2 -> 1
        let f = func(vec![
            block(0, &[1]),
            block(1, &[2, 3]),
            block(2, &[1]),
            block(3, &[]),
        ]);
        let cfg = Cfg::from_function(&f);
        assert_eq!(ids(cfg.dominees(BlockId(0))), vec![1]);
        assert_eq!(ids(cfg.dominees(BlockId(1))), vec![2, 3]);
        assert_eq!(ids(cfg.predecessors(BlockId(1))), vec![0, 2]);
    }

    #[test]
    fn test_provided_idoms_are_used() {
        let mut f = diamond();
        // A front-end that says block 3 is dominated by block 0.
        f.blocks[1].idom = Some(BlockId(0));
        f.blocks[2].idom = Some(BlockId(0));
        f.blocks[3].idom = Some(BlockId(0));
        let cfg = Cfg::from_function(&f);
        assert_eq!(ids(cfg.dominees(BlockId(0))), vec![1, 2, 3]);
    }

    #[test]
    fn test_unreachable_block_has_no_parent() {
        let f = func(vec![block(0, &[]), block(1, &[])]);
        let cfg = Cfg::from_function(&f);
        assert!(cfg.dominees(BlockId(0)).is_empty());
        assert_eq!(cfg.idom(BlockId(1)), None);
        assert_eq!(ids(&cfg.reverse_postorder()), vec![0]);
    }

    #[test]
    fn test_duplicate_edge_counts_twice() {
        // Both arms of the branch go to the same block.
        let f = func(vec![block(0, &[1, 1]), block(1, &[])]);
        let cfg = Cfg::from_function(&f);
        assert_eq!(cfg.predecessors(BlockId(1)).len(), 2);
        assert!(!cfg.has_single_pred(BlockId(1)));
    }

    #[test]
    fn test_reverse_postorder() {
        let f = diamond();
        let cfg = Cfg::from_function(&f);
        let rpo = ids(&cfg.reverse_postorder());
        assert_eq!(rpo[0], 0);
        assert_eq!(*rpo.last().unwrap(), 3);
        assert_eq!(rpo.len(), 4);
    }

    fn branch_on(op: BinOpKind) -> Function {
        let mut f = diamond();
        f.values = vec![
            Value {
                id: ValueId(0),
                name: "t0".into(),
                kind: ValueKind::Parameter,
                span: None,
            },
            Value {
                id: ValueId(1),
                name: "nil:*T".into(),
                kind: ValueKind::Const {
                    is_nil: true,
                    value: None,
                },
                span: None,
            },
            Value {
                id: ValueId(2),
                name: "t2".into(),
                kind: ValueKind::BinOp {
                    op,
                    x: ValueId(0),
                    y: ValueId(1),
                },
                span: Some(Span::new("f.go", 3, 7)),
            },
        ];
        f.blocks[0].instructions = vec![Instruction::If { cond: ValueId(2) }];
        f
    }

    #[test]
    fn test_equality_branch_eql() {
        let f = branch_on(BinOpKind::Eql);
        let cfg = Cfg::from_function(&f);
        let br = cfg.equality_branch(BlockId(0)).unwrap();
        assert_eq!(br.tsucc, BlockId(1));
        assert_eq!(br.fsucc, BlockId(2));
        assert_eq!(br.x, ValueId(0));
        assert_eq!(br.cond.span.as_ref().unwrap().start_line, 3);
    }

    #[test]
    fn test_equality_branch_neq_swaps_successors() {
        let f = branch_on(BinOpKind::Neq);
        let cfg = Cfg::from_function(&f);
        let br = cfg.equality_branch(BlockId(0)).unwrap();
        assert_eq!(br.tsucc, BlockId(2));
        assert_eq!(br.fsucc, BlockId(1));
    }

    #[test]
    fn test_equality_branch_ignores_other_ops() {
        let f = branch_on(BinOpKind::Other);
        let cfg = Cfg::from_function(&f);
        assert!(cfg.equality_branch(BlockId(0)).is_none());
        // Blocks without an If terminator are not branches.
        assert!(cfg.equality_branch(BlockId(1)).is_none());
    }

    #[test]
    fn test_equality_branch_condition_not_binop() {
        let mut f = branch_on(BinOpKind::Eql);
        f.blocks[0].instructions = vec![Instruction::If { cond: ValueId(0) }];
        let cfg = Cfg::from_function(&f);
        assert!(cfg.equality_branch(BlockId(0)).is_none());
    }
}
