//! Block nesting and local variable tracking.

/// Kind of an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Bare block, `try`, `finally`, `synchronized`, static initializer.
    Plain,
    /// Type body.
    Class,
    /// Method, constructor or lambda body.
    Method,
    /// `if`, `else`, `switch`, `catch`.
    Branch,
    /// `for`, `while`, `do`.
    Loop,
}

impl BlockKind {
    /// Branches and loops make their contents conditional.
    pub fn is_conditional(self) -> bool {
        matches!(self, BlockKind::Branch | BlockKind::Loop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Local,
    LoopVar,
}

#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub kind: VarKind,
    /// Declared with a string or string-builder type.
    pub is_string: bool,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Braceless body of a control statement; ends with its statement.
    pub virtual_block: bool,
    pub locals: Vec<Local>,
}

/// Stack of open blocks, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    blocks: Vec<Block>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn push(&mut self, kind: BlockKind, virtual_block: bool, locals: Vec<Local>) {
        self.blocks.push(Block {
            kind,
            virtual_block,
            locals,
        });
    }

    pub fn pop(&mut self) -> Option<Block> {
        self.blocks.pop()
    }

    pub fn top(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn top_is_virtual(&self) -> bool {
        self.top().is_some_and(|b| b.virtual_block)
    }

    /// Declare a local in the innermost block.
    pub fn declare(&mut self, local: Local) {
        if let Some(block) = self.blocks.last_mut() {
            block.locals.push(local);
        }
    }

    /// Innermost declaration of `name` and the index of its block.
    pub fn resolve(&self, name: &str) -> Option<(usize, &Local)> {
        self.blocks.iter().enumerate().rev().find_map(|(index, block)| {
            block
                .locals
                .iter()
                .rev()
                .find(|local| local.name == name)
                .map(|local| (index, local))
        })
    }

    /// Index of the innermost method block, else the innermost block.
    pub fn innermost_method(&self) -> usize {
        self.blocks
            .iter()
            .rposition(|b| b.kind == BlockKind::Method)
            .unwrap_or_else(|| self.blocks.len().saturating_sub(1))
    }

    /// Number of branch and loop blocks at or above `base`.
    pub fn conditional_depth(&self, base: usize) -> usize {
        self.blocks
            .iter()
            .skip(base)
            .filter(|b| b.kind.is_conditional())
            .count()
    }

    /// Returns true if a loop block is open at or above `base`.
    pub fn in_loop(&self, base: usize) -> bool {
        self.blocks
            .iter()
            .skip(base)
            .any(|b| b.kind == BlockKind::Loop)
    }
}
