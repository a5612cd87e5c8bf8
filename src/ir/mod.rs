//! The lowered form of a module: functions made of basic blocks over stack
//! slots, plus the pool of string constants and the external declarations
//! they call into.
//!
//! Every value is a 64-bit integer, except string constants (pointers) and
//! the `i1` results of comparisons, which only feed conditional branches.

pub mod builder;
pub mod print;

use crate::util::intern::{Interned, Interner};

#[derive(Debug)]
pub struct Module {
    pub name: Box<str>,
    /// String constants, keyed by content and numbered in first-use order.
    pub strings: Interner<str>,
    pub externs: Vec<ExternFunction>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| &*f.name == name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    Void,
    I32,
    I64,
    Ptr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Ty>,
    pub variadic: bool,
    pub ret: Ty,
}

impl Signature {
    /// `n` integer parameters, returning either an integer or nothing.
    pub fn integers(n: usize, returns_value: bool) -> Signature {
        Signature {
            params: vec![Ty::I64; n],
            variadic: false,
            ret: if returns_value { Ty::I64 } else { Ty::Void },
        }
    }

    pub fn returns_value(&self) -> bool {
        self.ret != Ty::Void
    }
}

/// A function only declared in this module, resolved at link time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternFunction {
    pub name: Box<str>,
    pub sig: Signature,
}

#[derive(Debug)]
pub struct Function {
    pub name: Box<str>,
    pub params: Vec<Box<str>>,
    pub sig: Signature,
    pub slots: Vec<Slot>,
    /// The first block is the entry block.
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }
}

/// A stack-allocated integer variable.
#[derive(Debug, PartialEq, Eq)]
pub struct Slot {
    pub name: Box<str>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Temp(pub usize);

#[derive(Debug)]
pub struct Block {
    pub label: &'static str,
    pub insts: Vec<Inst>,
    /// Always `Some` once lowering has finished.
    pub term: Option<Terminator>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Temp(Temp),
    /// The incoming value of the n-th parameter.
    Param(usize),
    /// Address of a string constant.
    Str(Interned<str>),
    /// Address of a function, converted to an integer.
    FuncAddr(Box<str>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpPred {
    Ne,
    Slt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inst {
    Load {
        dst: Temp,
        slot: SlotId,
    },
    Store {
        slot: SlotId,
        value: Value,
    },
    Binary {
        dst: Temp,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    Cmp {
        dst: Temp,
        pred: CmpPred,
        lhs: Value,
        rhs: Value,
    },
    Call {
        dst: Option<Temp>,
        callee: Box<str>,
        sig: Signature,
        args: Vec<Value>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<Value>),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret(_) => Vec::new(),
        }
    }
}
