//! This module contains the control-flow-graph IR that the interpreter
//! executes.
//!
//! The IR is produced by a front-end that has already performed inlining, SSA
//! construction and block simplification, so the interpreter treats it as
//! well-formed: every value is assigned exactly once (phi nodes aside), every
//! block ends in a terminator, and type information is reduced to bit-widths.
//! Structural mistakes that slip through are surfaced as fatal
//! [`crate::error::execution::Error`]s during interpretation.
//!
//! Values are identified by small arena indices into a per-function name
//! table rather than by pointers into the graph, which keeps the evaluator's
//! environment free of any lifetime coupling with the IR itself.

use std::collections::HashMap;

use num_bigint::BigInt;

/// An opaque, stable identity for a place that holds a value: an instruction
/// result, a function argument, or a phi result.
///
/// Identifiers are only meaningful for the [`Function`] that created them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ValueId(u32);

impl ValueId {
    /// Gets the index of this value in its function's name table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An identifier for a basic block within a [`Function`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlockId(u32);

impl BlockId {
    /// Gets the index of this block in its function's block list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A reference to a binding in the interpreter's environment.
///
/// The distinguished [`ValueRef::Return`] sentinel names the function's
/// return value, which no IR value identifies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRef {
    /// A named IR value.
    Var(ValueId),

    /// The function's return value.
    Return,
}

/// An operand of an instruction or terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    /// A previously bound instruction result or function argument.
    Ref(ValueId),

    /// An integer constant of the given bit-width.
    ///
    /// A width of [`crate::constant::BOOL_WIDTH_BITS`] denotes a boolean
    /// constant; any other width resolves to an integer in the run's mode.
    ConstInt { width: u32, value: BigInt },

    /// The null pointer constant, resolving to a zero address at pointer
    /// width.
    NullPtr,
}

/// The binary arithmetic and bitwise operations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

/// The integer comparison predicates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Predicate {
    Eq,
    Ne,
    Sge,
    Sgt,
    Sle,
    Slt,
    Uge,
    Ugt,
    Ule,
    Ult,
}

/// The width-conversion and pointer-coercion casts.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CastOp {
    ZExt,
    SExt,
    Trunc,
    PtrToInt,
    IntToPtr,
}

/// One component of an indexed address computation.
///
/// The front-end flattens the addressed type's layout into a stride in bytes
/// for every index position, so the interpreter can evaluate the address as
/// `base + Σ stride · index` without any knowledge of source-level types.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexComponent {
    /// The size in bytes of the element this index steps over.
    pub stride_bytes: u64,

    /// The index operand itself.
    pub index: Operand,
}

/// A non-terminator instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    /// A binary arithmetic or bitwise operation on two operands of `width`
    /// bits.
    ///
    /// A width of 1 operates on booleans instead of integers.
    Binary {
        result: ValueId,
        op:     BinOp,
        lhs:    Operand,
        rhs:    Operand,
        width:  u32,
    },

    /// An integer comparison producing a boolean.
    Cmp {
        result: ValueId,
        pred:   Predicate,
        lhs:    Operand,
        rhs:    Operand,
    },

    /// A width conversion or pointer coercion to `target_width` bits.
    Cast {
        result:       ValueId,
        op:           CastOp,
        operand:      Operand,
        target_width: u32,
    },

    /// An indexed address computation from a base address.
    AddressOf {
        result:     ValueId,
        base:       Operand,
        components: Vec<IndexComponent>,
    },

    /// A read of `width` bits from the heap.
    Load {
        result:  ValueId,
        address: Operand,
        width:   u32,
    },

    /// A write of `width` bits to the heap.
    Store {
        address: Operand,
        value:   Operand,
        width:   u32,
    },

    /// A choice between two already-resolvable operands based on a boolean
    /// condition.
    Select {
        result:    ValueId,
        condition: Operand,
        on_true:   Operand,
        on_false:  Operand,
    },

    /// A call to another function in the program, with arguments bound
    /// positionally.
    Call {
        result: ValueId,
        callee: String,
        args:   Vec<Operand>,
    },
}

/// A phi node at the top of a block, selecting its value by the identity of
/// the predecessor block that control arrived from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Phi {
    /// The value the phi binds.
    pub result: ValueId,

    /// The incoming value for each predecessor block.
    pub incoming: Vec<(BlockId, Operand)>,
}

/// A single case of a switch terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwitchCase {
    /// The constant the scrutinee is compared against, decoded in the run's
    /// mode at the switch's width.
    pub value: BigInt,

    /// The successor taken when this case matches.
    pub target: BlockId,
}

/// The terminator ending a basic block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Binds the return sentinel and ends the function.
    Return { value: Operand },

    /// An unconditional branch to the sole successor.
    Branch { target: BlockId },

    /// A two-way branch on a boolean condition.
    CondBranch {
        condition: Operand,
        on_true:   BlockId,
        on_false:  BlockId,
    },

    /// A multi-way branch comparing an integer scrutinee against constant
    /// cases in declared order, with the first match winning.
    Switch {
        scrutinee: Operand,
        width:     u32,
        cases:     Vec<SwitchCase>,
        default:   BlockId,
    },
}

/// A basic block: phi nodes, then ordinary instructions, then exactly one
/// terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    /// The label of the block, used to name its step in recorded traces.
    pub label: String,

    /// The phi nodes resolved on entry to the block.
    pub phis: Vec<Phi>,

    /// The non-terminator instructions, in execution order.
    pub instructions: Vec<Instruction>,

    /// The block's terminator.
    pub terminator: Terminator,
}

impl Block {
    /// Constructs a new block with the provided `label` and `terminator` and
    /// no phis or instructions.
    #[must_use]
    pub fn new(label: impl Into<String>, terminator: Terminator) -> Self {
        let label = label.into();
        let phis = Vec::new();
        let instructions = Vec::new();
        Self {
            label,
            phis,
            instructions,
            terminator,
        }
    }
}

/// A single function of the program: a name, positional arguments, a value
/// name table, and the blocks of its control-flow graph.
///
/// The entry block is always the first block added.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    name:        String,
    args:        Vec<ValueId>,
    value_names: Vec<String>,
    blocks:      Vec<Block>,
}

impl Function {
    /// Constructs a new function called `name` with no values or blocks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let args = Vec::new();
        let value_names = Vec::new();
        let blocks = Vec::new();
        Self {
            name,
            args,
            value_names,
            blocks,
        }
    }

    /// Interns a new named value, returning its identifier.
    ///
    /// # Panics
    ///
    /// Panics if the function holds more than [`u32::MAX`] values. This is a
    /// programmer bug.
    pub fn value(&mut self, name: impl Into<String>) -> ValueId {
        let index = self
            .value_names
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("Value count should not exceed {}", u32::MAX));
        self.value_names.push(name.into());
        ValueId(index)
    }

    /// Interns a new named value and registers it as the next positional
    /// argument of the function.
    pub fn argument(&mut self, name: impl Into<String>) -> ValueId {
        let id = self.value(name);
        self.args.push(id);
        id
    }

    /// Appends `block` to the function, returning its identifier.
    ///
    /// The first block appended becomes the function's entry block.
    ///
    /// # Panics
    ///
    /// Panics if the function holds more than [`u32::MAX`] blocks. This is a
    /// programmer bug.
    pub fn add_block(&mut self, block: Block) -> BlockId {
        let index = self
            .blocks
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("Block count should not exceed {}", u32::MAX));
        self.blocks.push(block);
        BlockId(index)
    }

    /// Gets the name of the function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the positional arguments of the function.
    #[must_use]
    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    /// Gets the identifier of the function's entry block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// Gets the block identified by `id`, if it exists.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Gets a mutable reference to the block identified by `id`, if it
    /// exists.
    ///
    /// Graphs with forward branches are built by appending placeholder
    /// blocks first and filling their bodies in once every target has an
    /// identifier.
    #[must_use]
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.index())
    }

    /// Gets the number of blocks in the function.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Gets the textual name of the value identified by `id`.
    ///
    /// Identifiers from another function resolve to a placeholder rather than
    /// panicking, as the name is only used for diagnostics and trace output.
    #[must_use]
    pub fn value_name(&self, id: ValueId) -> &str {
        self.value_names.get(id.index()).map_or("<unknown>", String::as_str)
    }
}

/// A program: the collection of functions that call instructions resolve
/// their callees in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    functions: HashMap<String, Function>,
}

impl Program {
    /// Constructs a new program containing no functions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `function` to the program, replacing any previous function of the
    /// same name.
    pub fn add(&mut self, function: Function) {
        self.functions.insert(function.name().to_string(), function);
    }

    /// Gets the function called `name`, if it exists.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Gets the number of functions in the program.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Checks if the program contains no functions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
