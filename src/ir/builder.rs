use super::{Block, BlockId, Function, Inst, Signature, Slot, SlotId, Temp, Terminator};

/// Incrementally builds one [`Function`], tracking the block instructions are
/// currently appended to.
pub struct FunctionBuilder {
    name: Box<str>,
    params: Vec<Box<str>>,
    sig: Signature,
    slots: Vec<Slot>,
    blocks: Vec<Block>,
    current: Option<BlockId>,
    next_temp: usize,
}

impl FunctionBuilder {
    /// Starts a function positioned at its (empty) entry block.
    pub fn new(name: Box<str>, params: Vec<Box<str>>, sig: Signature) -> FunctionBuilder {
        let mut builder = FunctionBuilder {
            name,
            params,
            sig,
            slots: Vec::new(),
            blocks: Vec::with_capacity(4),
            current: None,
            next_temp: 0,
        };
        let entry = builder.create_block("entry");
        builder.position_at(entry);
        builder
    }

    pub fn sig(&self) -> &Signature {
        &self.sig
    }

    pub fn create_block(&mut self, label: &'static str) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block {
            label,
            insts: Vec::new(),
            term: None,
        });
        id
    }

    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(self.blocks[block.0].term.is_none());
        self.current = Some(block);
    }

    /// The block being appended to, or `None` right after a terminator.
    pub fn current(&self) -> Option<BlockId> {
        self.current
    }

    pub fn is_current_block_terminated(&self) -> bool {
        self.current.is_none()
    }

    pub fn fresh_temp(&mut self) -> Temp {
        let temp = Temp(self.next_temp);
        self.next_temp += 1;
        temp
    }

    pub fn alloc_slot(&mut self, name: &str) -> SlotId {
        let id = SlotId(self.slots.len());
        self.slots.push(Slot { name: name.into() });
        id
    }

    /// Appends to the current block. Panics when positioned after a
    /// terminator.
    pub fn push(&mut self, inst: Inst) {
        let current = self.current.expect("no block to append to");
        self.blocks[current.0].insts.push(inst);
    }

    /// Ends the current block. The builder must be repositioned before
    /// anything else is appended.
    pub fn terminate(&mut self, term: Terminator) {
        let current = self.current.take().expect("no block to terminate");
        self.blocks[current.0].term = Some(term);
    }

    pub fn finish(self) -> Function {
        debug_assert!(self.blocks.iter().all(|b| b.term.is_some()));
        Function {
            name: self.name,
            params: self.params,
            sig: self.sig,
            slots: self.slots,
            blocks: self.blocks,
        }
    }
}
