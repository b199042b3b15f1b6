use crate::ast::{Node, NodeKind};
use crate::symbol_table::SymbolId;
use crate::type_decl::SymbolType;

/// What the optimizer knows about one global-table entry during a single pass.
#[derive(Debug, Clone, Default)]
pub struct SymbolSlot {
    /// Right-hand side of the last unconditional constant assignment.
    pub known_value: Option<Box<Node>>,
    pub declared: Option<SymbolType>,
    pub used: bool,
    /// Read targets and loop iterators. Never substituted.
    pub irremovable: bool,
}

/// One slot per global-table entry, sized when the pass starts.
#[derive(Debug, Clone, Default)]
pub struct SymbolMetadata {
    slots: Vec<SymbolSlot>,
}

impl SymbolMetadata {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![SymbolSlot::default(); len],
        }
    }

    /// Collects declared types, read targets and loop iterators before any rewriting,
    /// so a later use cannot be substituted on the strength of an earlier assignment.
    pub fn scan(root: &Node, len: usize) -> Self {
        let mut metadata = Self::new(len);
        metadata.visit(root);
        metadata
    }

    fn visit(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Declaration => {
                let ty = node.second().and_then(Node::type_tag);
                let mut list = node.first();
                while let Some(entry) = list {
                    if let Some(slot) = entry.first().and_then(Node::symbol).and_then(|id| self.get_mut(id)) {
                        slot.declared = ty;
                    }
                    list = entry.second();
                }
            }
            NodeKind::ReadS => {
                if let Some(slot) = node.first().and_then(Node::symbol).and_then(|id| self.get_mut(id)) {
                    slot.irremovable = true;
                    slot.used = true;
                }
            }
            NodeKind::ForAssign => {
                if let Some(slot) = node.first().and_then(Node::symbol).and_then(|id| self.get_mut(id)) {
                    slot.irremovable = true;
                }
            }
            _ => {}
        }
        for child in [node.first(), node.second(), node.third()].into_iter().flatten() {
            self.visit(child);
        }
    }

    pub fn get(&self, id: SymbolId) -> Option<&SymbolSlot> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut SymbolSlot> {
        self.slots.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The value a use of `id` may be replaced with, if any.
    pub fn substitute(&self, id: SymbolId) -> Option<&Node> {
        self.get(id)
            .filter(|slot| !slot.irremovable)
            .and_then(|slot| slot.known_value.as_deref())
    }

    pub fn mark_used(&mut self, id: SymbolId) {
        if let Some(slot) = self.get_mut(id) {
            slot.used = true;
        }
    }
}
