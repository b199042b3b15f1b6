pub mod fold;
pub mod metadata;

#[cfg(test)]
mod tests;

use crate::ast::{Node, NodeKind, Tree};
use crate::symbol_table::{SymbolId, SymbolTable};
use self::fold::{collapse_parenthesized, constant_type, fold_expression, single_constant};
use self::metadata::SymbolMetadata;

pub use self::fold::{FoldedConstant, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerOptions {
    pub fold_constants: bool,
    pub propagate_constants: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            propagate_constants: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Operators removed by folding.
    pub folded: usize,
    /// Identifier uses replaced by a known value.
    pub propagated: usize,
    /// Empty declaration blocks and statement lists removed.
    pub elided: usize,
}

/// Where the node being rewritten sits relative to loops, branches and operator chains.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    in_loop: bool,
    in_branch: bool,
    chain_tail: bool,
}

impl Scope {
    fn child(self, parent: NodeKind) -> Scope {
        Scope {
            in_loop: self.in_loop || parent.is_loop(),
            in_branch: self.in_branch,
            chain_tail: false,
        }
    }

    fn branch(self) -> Scope {
        Scope { in_branch: true, ..self }
    }

    fn tail(self) -> Scope {
        Scope { chain_tail: true, ..self }
    }

    /// Assignments here may run zero or many times.
    fn is_conditional(self) -> bool {
        self.in_loop || self.in_branch
    }
}

/// Post-order rewrite pass: constant folding, constant propagation and removal of
/// empty structural nodes.
pub struct Optimizer<'a> {
    symbols: &'a SymbolTable,
    options: OptimizerOptions,
    metadata: Option<SymbolMetadata>,
    stats: OptimizeStats,
}

impl<'a> Optimizer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self::with_options(symbols, OptimizerOptions::default())
    }

    pub fn with_options(symbols: &'a SymbolTable, options: OptimizerOptions) -> Self {
        Self {
            symbols,
            options,
            metadata: None,
            stats: OptimizeStats::default(),
        }
    }

    /// Rewrites `tree` in place. The root may become `None` if nothing is left.
    pub fn run(mut self, tree: &mut Tree) -> OptimizeStats {
        if let Some(root) = tree.as_deref() {
            self.ensure_metadata(root);
        }
        self.optimise_slot(tree, Scope::default());
        log::debug!(
            "optimizer: {} folded, {} propagated, {} elided",
            self.stats.folded,
            self.stats.propagated,
            self.stats.elided
        );
        self.stats
    }

    /// Built once per pass from the tree as it stood before rewriting began, and only
    /// when propagation is enabled.
    fn ensure_metadata(&mut self, root: &Node) {
        if self.metadata.is_none() && self.options.propagate_constants {
            self.metadata = Some(SymbolMetadata::scan(root, self.symbols.len()));
        }
    }

    fn optimise_slot(&mut self, slot: &mut Tree, scope: Scope) {
        let Some(node) = slot.as_deref_mut() else {
            return;
        };
        let kind = node.kind;
        let inner = scope.child(kind);
        match kind {
            NodeKind::IfS => {
                self.optimise_slot(&mut node.first, inner);
                self.optimise_slot(&mut node.second, inner.branch());
                self.optimise_slot(&mut node.third, inner.branch());
            }
            NodeKind::ExprAdd | NodeKind::ExprMinus => {
                self.optimise_slot(&mut node.first, inner);
                self.optimise_slot(&mut node.second, inner.tail());
            }
            _ => {
                self.optimise_slot(&mut node.first, inner);
                self.optimise_slot(&mut node.second, inner);
                self.optimise_slot(&mut node.third, inner);
            }
        }
        self.rewrite(slot, kind, scope);
    }

    fn rewrite(&mut self, slot: &mut Tree, kind: NodeKind, scope: Scope) {
        match kind {
            NodeKind::Block => {
                if let Some(block) = slot.as_deref_mut() {
                    if block.first.is_none() && block.second.is_some() {
                        block.first = block.second.take();
                    }
                }
            }
            NodeKind::DeclarationBlock => {
                if slot.as_deref().is_some_and(|node| node.first.is_none() && node.second.is_none()) {
                    *slot = None;
                    self.stats.elided += 1;
                }
            }
            NodeKind::StatementList => self.simplify_statement_list(slot),
            NodeKind::Assignment => {
                if let Some(node) = slot.as_deref() {
                    self.record_assignment(node, scope);
                }
            }
            NodeKind::OutputList | NodeKind::Term | NodeKind::TermMul | NodeKind::TermDiv => {
                if let Some(node) = slot.as_deref_mut() {
                    self.propagate_into(&mut node.first, scope);
                }
            }
            _ => {}
        }

        if !self.options.fold_constants {
            return;
        }
        match kind {
            NodeKind::Expression | NodeKind::ExprAdd | NodeKind::ExprMinus if !scope.chain_tail => {
                self.stats.folded += fold_expression(slot);
            }
            NodeKind::ValExpr => {
                if collapse_parenthesized(slot) {
                    log::trace!("collapsed parenthesized constant");
                }
            }
            _ => {}
        }
    }

    fn simplify_statement_list(&mut self, slot: &mut Tree) {
        let Some(list) = slot.as_deref_mut() else {
            return;
        };
        match (list.first.is_some(), list.second.is_some()) {
            (false, false) => {
                *slot = None;
                self.stats.elided += 1;
            }
            (false, true) => {
                let second = list.second.take();
                *slot = second;
            }
            _ => {}
        }
    }

    /// Remembers the right-hand side of an unconditional assignment whose literal type
    /// matches the target's declared type, and forgets it otherwise.
    fn record_assignment(&mut self, node: &Node, scope: Scope) {
        let Some(target) = node.second().and_then(Node::symbol) else {
            return;
        };
        let Some(entry) = self.metadata.as_mut().and_then(|metadata| metadata.get_mut(target)) else {
            return;
        };
        let value = node.first().filter(|value| {
            !scope.is_conditional()
                && !entry.irremovable
                && entry.declared.is_some()
                && constant_type(value) == entry.declared
        });
        entry.known_value = value.map(|value| Box::new(value.clone()));
        if let Some(value) = &entry.known_value {
            log::trace!("symbol {} holds a known value ({} nodes)", target.0, value.size());
        }
    }

    /// Replaces an identifier operand with the value its symbol is known to hold.
    fn propagate_into(&mut self, slot: &mut Tree, scope: Scope) {
        if scope.in_loop || !self.options.propagate_constants {
            return;
        }
        let Some(id) = slot
            .as_deref()
            .filter(|value| value.kind == NodeKind::ValIdentifier)
            .and_then(Node::first)
            .and_then(Node::symbol)
        else {
            return;
        };
        let Some(replacement) = self.replacement_for(id) else {
            return;
        };
        *slot = Some(replacement);
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.mark_used(id);
        }
        self.stats.propagated += 1;
        log::trace!("propagated known value of {:?}", self.symbols.name(id));
    }

    fn replacement_for(&self, id: SymbolId) -> Option<Box<Node>> {
        let known = self.metadata.as_ref()?.substitute(id)?;
        Some(match single_constant(known) {
            Some(constant) => Box::new(constant.clone()),
            None => Node::new(None, NodeKind::ValExpr, Some(Box::new(known.clone())), None, None),
        })
    }
}

/// Runs the optimizer with default options.
pub fn optimise(tree: &mut Tree, symbols: &SymbolTable) -> OptimizeStats {
    Optimizer::new(symbols).run(tree)
}
