//! Hand-built IR for unit tests.

use nilnop_ir::ir::{
    BasicBlock, BinOpKind, BlockId, CallInstruction, CallMode, CallableId, Function, Instruction,
    Span, Value, ValueId, ValueKind,
};

pub(crate) const FILE: &str = "t.go";

pub(crate) struct FuncBuilder {
    func: Function,
}

impl FuncBuilder {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            func: Function {
                name: format!("t.{name}"),
                short_name: name.to_string(),
                span: Some(Span::new(FILE, 1, 1)),
                values: Vec::new(),
                blocks: Vec::new(),
            },
        }
    }

    pub(crate) fn value(&mut self, kind: ValueKind) -> ValueId {
        let id = ValueId(self.func.values.len() as u32);
        self.func.values.push(Value {
            id,
            name: id.to_string(),
            kind,
            span: None,
        });
        id
    }

    pub(crate) fn nil(&mut self) -> ValueId {
        self.value(ValueKind::Const {
            is_nil: true,
            value: None,
        })
    }

    /// `x op y` positioned at `line`.
    pub(crate) fn cmp(&mut self, op: BinOpKind, x: ValueId, y: ValueId, line: u32) -> ValueId {
        let id = self.value(ValueKind::BinOp { op, x, y });
        self.func.values[id.index()].span = Some(Span::new(FILE, line, 5));
        id
    }

    pub(crate) fn block(&mut self) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BasicBlock {
            id,
            comment: String::new(),
            instructions: Vec::new(),
            succs: Vec::new(),
            idom: None,
        });
        id
    }

    /// Call of callable `callee` positioned at `line`.
    pub(crate) fn call(&mut self, block: BlockId, callee: u32, args: Vec<ValueId>, line: u32) {
        self.func.blocks[block.index()]
            .instructions
            .push(Instruction::Call(CallInstruction {
                mode: CallMode::Call,
                callee: Some(CallableId(callee)),
                args,
                result: None,
                span: Some(Span::new(FILE, line, 2)),
            }));
    }

    pub(crate) fn branch(&mut self, block: BlockId, cond: ValueId, then: BlockId, els: BlockId) {
        let b = &mut self.func.blocks[block.index()];
        b.instructions.push(Instruction::If { cond });
        b.succs = vec![then, els];
    }

    pub(crate) fn jump(&mut self, block: BlockId, to: BlockId) {
        let b = &mut self.func.blocks[block.index()];
        b.instructions.push(Instruction::Jump);
        b.succs = vec![to];
    }

    pub(crate) fn ret(&mut self, block: BlockId) {
        self.func.blocks[block.index()]
            .instructions
            .push(Instruction::Return {
                results: Vec::new(),
            });
    }

    pub(crate) fn finish(self) -> Function {
        self.func.validate().expect("test function is well formed");
        self.func
    }

    /// A function with values only, for classifier tests.
    pub(crate) fn finish_empty(self) -> Function {
        self.func
    }
}
