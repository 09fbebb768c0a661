//! Owned IR types for the nilness checker.
//!
//! These mirror the JSON emitted by the Go SSA front-end. Every function owns
//! an arena of values addressed by [`ValueId`] and a list of blocks addressed
//! by [`BlockId`]; the ids double as indices into those vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::IrError;

/// Identity of an SSA value inside one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Index of a basic block inside one function. Block 0 is the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Program-wide identity of a declared function or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallableId(pub u32);

/// Root type: everything the front-end produced for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub packages: Vec<Package>,
    #[serde(default)]
    pub go_version: String,
}

/// A Go package: its package-level names and the SSA of its functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub path: String,
    pub name: String,
    /// Named types declared at package level.
    #[serde(default)]
    pub types: Vec<String>,
    /// Package-level variables and constants.
    #[serde(default)]
    pub globals: Vec<String>,
    /// Functions and methods declared in this package, with their identities.
    #[serde(default)]
    pub callables: Vec<Callable>,
    /// Functions with SSA bodies to analyze.
    #[serde(default)]
    pub functions: Vec<Function>,
}

/// A declared function (`receiver == None`) or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callable {
    pub id: CallableId,
    pub name: String,
    /// Receiver type name, `"T"` or `"*T"`.
    #[serde(default)]
    pub receiver: Option<String>,
}

impl Callable {
    pub fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }

    /// Receiver type name without the pointer marker.
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver
            .as_deref()
            .map(|r| r.strip_prefix('*').unwrap_or(r))
    }
}

/// Source location span
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_col: u32,
}

impl Span {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }
}

/// An SSA value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    #[serde(default)]
    pub name: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub span: Option<Span>,
}

/// What produced a value. Only the kinds that matter for nilness are
/// distinguished; everything else deserializes as [`ValueKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValueKind {
    /// `new(T)` or `&T{}`.
    Alloc,
    /// `&x.f`
    FieldAddr,
    /// `&a[i]`
    IndexAddr,
    /// Variable captured by a closure.
    FreeVar,
    /// A function used as a value.
    Function,
    /// Address of a package-level variable.
    Global,
    MakeChan,
    MakeClosure,
    /// Boxing a concrete value into an interface.
    MakeInterface,
    /// Interface-to-interface conversion; nil in, nil out.
    ChangeInterface { x: ValueId },
    MakeMap,
    MakeSlice,
    /// `x[lo:hi]`; a nil slice resliced stays nil.
    Slice { x: ValueId },
    /// `(*[len]T)(x)`
    SliceToArrayPointer { x: ValueId, len: i64 },
    Const {
        #[serde(default)]
        is_nil: bool,
        #[serde(default)]
        value: Option<String>,
    },
    BinOp {
        op: BinOpKind,
        x: ValueId,
        y: ValueId,
    },
    Parameter,
    /// Result of a call instruction.
    Call,
    #[serde(other)]
    Other,
}

/// Binary operator of a [`ValueKind::BinOp`]. Only equality matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    #[serde(rename = "==")]
    Eql,
    #[serde(rename = "!=")]
    Neq,
    #[serde(other)]
    Other,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eql => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Other => write!(f, "<op>"),
        }
    }
}

/// How a call is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    #[default]
    Call,
    Go,
    Defer,
}

/// A call, `go` or `defer` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallInstruction {
    #[serde(default)]
    pub mode: CallMode,
    /// Statically known callee. `None` for dynamic, interface and builtin calls.
    #[serde(default)]
    pub callee: Option<CallableId>,
    /// Arguments in order; for methods the receiver comes first.
    #[serde(default)]
    pub args: Vec<ValueId>,
    #[serde(default)]
    pub result: Option<ValueId>,
    #[serde(default)]
    pub span: Option<Span>,
}

/// Instructions relevant to the walk. Value-producing instructions other
/// than calls are represented by their [`Value`] and need no entry here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Instruction {
    Call(CallInstruction),
    If {
        cond: ValueId,
    },
    Jump,
    Return {
        #[serde(default)]
        results: Vec<ValueId>,
    },
    Panic {
        value: ValueId,
    },
    #[serde(other)]
    Other,
}

/// SSA Basic Block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    /// Successors; two of them when the block ends in an `If`, the first
    /// being the branch taken when the condition holds.
    #[serde(default)]
    pub succs: Vec<BlockId>,
    /// Immediate dominator, if the front-end computed one.
    #[serde(default)]
    pub idom: Option<BlockId>,
}

impl BasicBlock {
    pub fn calls(&self) -> impl Iterator<Item = &CallInstruction> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Call(call) => Some(call),
            _ => None,
        })
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last()
    }
}

/// SSA Function with full CFG. A function without blocks is an external
/// declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Check that ids match their arena positions and that every reference
    /// points inside the function.
    pub fn validate(&self) -> Result<(), IrError> {
        let malformed = |reason: String| IrError::Malformed {
            function: self.name.clone(),
            reason,
        };
        let check_value = |id: ValueId, what: &str| {
            if id.index() < self.values.len() {
                Ok(())
            } else {
                Err(malformed(format!("{what} refers to unknown value {id}")))
            }
        };
        let check_block = |id: BlockId, what: &str| {
            if id.index() < self.blocks.len() {
                Ok(())
            } else {
                Err(malformed(format!("{what} refers to unknown block {id}")))
            }
        };

        for (i, value) in self.values.iter().enumerate() {
            if value.id.index() != i {
                return Err(malformed(format!(
                    "value at index {i} has id {}",
                    value.id
                )));
            }
            let what = format!("value {}", value.id);
            match &value.kind {
                ValueKind::ChangeInterface { x }
                | ValueKind::Slice { x }
                | ValueKind::SliceToArrayPointer { x, .. } => check_value(*x, &what)?,
                ValueKind::BinOp { x, y, .. } => {
                    check_value(*x, &what)?;
                    check_value(*y, &what)?;
                }
                _ => {}
            }
        }

        for (i, block) in self.blocks.iter().enumerate() {
            if block.id.index() != i {
                return Err(malformed(format!(
                    "block at index {i} has id {}",
                    block.id
                )));
            }
            let what = format!("block {}", block.id);
            if block.succs.len() > 2 {
                return Err(malformed(format!(
                    "{what} has {} successors",
                    block.succs.len()
                )));
            }
            for &succ in &block.succs {
                check_block(succ, &what)?;
            }
            if let Some(idom) = block.idom {
                check_block(idom, &what)?;
            }
            for instr in &block.instructions {
                match instr {
                    Instruction::Call(call) => {
                        for &arg in &call.args {
                            check_value(arg, &what)?;
                        }
                        if let Some(result) = call.result {
                            check_value(result, &what)?;
                        }
                    }
                    Instruction::If { cond } => check_value(*cond, &what)?,
                    Instruction::Return { results } => {
                        for &r in results {
                            check_value(r, &what)?;
                        }
                    }
                    Instruction::Panic { value } => check_value(*value, &what)?,
                    Instruction::Jump | Instruction::Other => {}
                }
            }
        }
        Ok(())
    }
}

impl Program {
    /// Deserialize and validate a JSON document.
    pub fn from_json(data: &str) -> Result<Self, IrError> {
        let program: Program = serde_json::from_str(data)?;
        for func in program.functions() {
            func.validate()?;
        }
        Ok(program)
    }

    /// Every function of every package.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.packages.iter().flat_map(|p| p.functions.iter())
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }
}
