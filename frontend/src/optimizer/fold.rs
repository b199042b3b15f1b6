use crate::ast::{Node, NodeKind, Tree};
use crate::type_decl::SymbolType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn from_kind(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::ExprAdd => Some(Operator::Add),
            NodeKind::ExprMinus => Some(Operator::Subtract),
            NodeKind::TermMul => Some(Operator::Multiply),
            NodeKind::TermDiv => Some(Operator::Divide),
            _ => None,
        }
    }

    /// Two's-complement result, or `None` when the division must be left for runtime.
    pub fn apply(self, left: i32, right: i32) -> Option<i32> {
        match self {
            Operator::Add => Some(left.wrapping_add(right)),
            Operator::Subtract => Some(left.wrapping_sub(right)),
            Operator::Multiply => Some(left.wrapping_mul(right)),
            Operator::Divide => left.checked_div(right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldedConstant {
    pub value: i32,
    pub is_char: bool,
}

impl FoldedConstant {
    pub fn combine(self, other: FoldedConstant, op: Operator) -> Option<FoldedConstant> {
        let folded = FoldedConstant {
            value: op.apply(self.value, other.value)?,
            is_char: self.is_char || other.is_char,
        };
        folded.is_representable().then_some(folded)
    }

    /// Negative numbers are stored as a magnitude, so `i32::MIN` has no literal form.
    pub fn is_representable(self) -> bool {
        self.is_char || self.value != i32::MIN
    }

    /// Builds the `ValConstant` subtree for this value.
    pub fn into_value(self) -> Option<Box<Node>> {
        let literal = if self.is_char {
            Node::leaf(Some(self.value), NodeKind::CharConst)
        } else {
            let number = if self.value < 0 {
                Node::leaf(Some(self.value.checked_neg()?), NodeKind::NegIntConst)
            } else {
                Node::leaf(Some(self.value), NodeKind::IntConst)
            };
            Node::new(None, NodeKind::NumberConst, Some(number), None, None)
        };
        Some(Node::new(None, NodeKind::ValConstant, Some(literal), None, None))
    }
}

/// Integer value of a `ValConstant`. Reals are never folded.
pub fn constant_value(value: &Node) -> Option<FoldedConstant> {
    if value.kind != NodeKind::ValConstant {
        return None;
    }
    let literal = value.first()?;
    match literal.kind {
        NodeKind::CharConst => Some(FoldedConstant { value: literal.item?, is_char: true }),
        NodeKind::NumberConst => {
            let number = literal.first()?;
            let value = match number.kind {
                NodeKind::IntConst => number.item?,
                NodeKind::NegIntConst => number.item?.checked_neg()?,
                _ => return None,
            };
            Some(FoldedConstant { value, is_char: false })
        }
        _ => None,
    }
}

/// Folds `left op right` over two `ValConstant` nodes into a new `ValConstant`.
pub fn fold_constants(left: &Node, right: &Node, op: Operator) -> Option<Box<Node>> {
    constant_value(left)?.combine(constant_value(right)?, op)?.into_value()
}

/// The `ValConstant` of an `Expression(Term(ValConstant))`.
pub fn single_constant(expression: &Node) -> Option<&Node> {
    if expression.kind != NodeKind::Expression {
        return None;
    }
    let term = expression.first()?;
    if term.kind != NodeKind::Term {
        return None;
    }
    term.first().filter(|value| value.kind == NodeKind::ValConstant)
}

/// Widest literal type in a subtree made only of literals, `None` if any identifier
/// is referenced.
pub fn constant_type(node: &Node) -> Option<SymbolType> {
    fn visit(node: &Node, widest: &mut Option<SymbolType>) -> bool {
        if matches!(node.kind, NodeKind::ValIdentifier | NodeKind::IdVal) {
            return false;
        }
        if let Some(ty) = node.kind.literal_type() {
            *widest = Some(widest.map_or(ty, |seen| seen.widen(ty)));
        }
        [node.first(), node.second(), node.third()]
            .into_iter()
            .flatten()
            .all(|child| visit(child, widest))
    }
    let mut widest = None;
    if visit(node, &mut widest) { widest } else { None }
}

pub fn is_constant_expression(node: &Node) -> bool {
    constant_type(node).is_some()
}

/// Replaces a parenthesized value holding a single constant with that constant.
pub fn collapse_parenthesized(slot: &mut Tree) -> bool {
    let collapsible = slot
        .as_deref()
        .filter(|node| node.kind == NodeKind::ValExpr)
        .and_then(Node::first)
        .and_then(single_constant)
        .is_some();
    if !collapsible {
        return false;
    }
    let inner = slot
        .take()
        .and_then(|paren| paren.first)
        .and_then(|expression| expression.first)
        .and_then(|term| term.first);
    *slot = inner;
    true
}

struct ChainShape {
    single: NodeKind,
    is_link: fn(NodeKind) -> bool,
    operand_constant: fn(&Node) -> Option<FoldedConstant>,
    wrap_operand: fn(Box<Node>) -> Box<Node>,
}

fn is_additive(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::ExprAdd | NodeKind::ExprMinus)
}

fn is_multiplicative(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::TermMul | NodeKind::TermDiv)
}

fn term_constant(term: &Node) -> Option<FoldedConstant> {
    if term.kind == NodeKind::Term {
        term.first().and_then(constant_value)
    } else {
        None
    }
}

fn wrap_in_term(value: Box<Node>) -> Box<Node> {
    Node::new(None, NodeKind::Term, Some(value), None, None)
}

fn unwrapped(value: Box<Node>) -> Box<Node> {
    value
}

const EXPRESSION_CHAIN: ChainShape = ChainShape {
    single: NodeKind::Expression,
    is_link: is_additive,
    operand_constant: term_constant,
    wrap_operand: wrap_in_term,
};

const TERM_CHAIN: ChainShape = ChainShape {
    single: NodeKind::Term,
    is_link: is_multiplicative,
    operand_constant: constant_value,
    wrap_operand: unwrapped,
};

/// Folds the constant prefix of the additive chain rooted at `slot`, after folding
/// every term of the chain. Returns the number of operators folded away.
pub fn fold_expression(slot: &mut Tree) -> usize {
    let mut folded = 0;
    let mut cursor = &mut *slot;
    while let Some(node) = cursor {
        folded += fold_term(&mut node.first);
        if !is_additive(node.kind) {
            break;
        }
        cursor = &mut node.second;
    }
    folded + fold_chain(slot, &EXPRESSION_CHAIN)
}

/// Folds the constant prefix of the multiplicative chain rooted at `slot`, after
/// folding any parenthesized operands. Returns the number of operators folded away.
pub fn fold_term(slot: &mut Tree) -> usize {
    let mut folded = 0;
    let mut cursor = &mut *slot;
    while let Some(node) = cursor {
        folded += fold_parenthesized(&mut node.first);
        if !is_multiplicative(node.kind) {
            break;
        }
        cursor = &mut node.second;
    }
    folded + fold_chain(slot, &TERM_CHAIN)
}

fn fold_parenthesized(slot: &mut Tree) -> usize {
    match slot.as_deref_mut() {
        Some(node) if node.kind == NodeKind::ValExpr => {
            let folded = fold_expression(&mut node.first);
            collapse_parenthesized(slot);
            folded
        }
        _ => 0,
    }
}

fn is_well_formed(mut node: &Node, shape: &ChainShape) -> bool {
    loop {
        if node.first.is_none() {
            return false;
        }
        if node.kind == shape.single {
            return true;
        }
        if !(shape.is_link)(node.kind) {
            return false;
        }
        match node.second() {
            Some(rest) => node = rest,
            None => return false,
        }
    }
}

/// How many leading operators fold, and the value they fold to.
fn plan(node: &Node, shape: &ChainShape) -> Option<(usize, FoldedConstant)> {
    let mut acc = node.first().and_then(shape.operand_constant)?;
    let mut consumed = 0;
    let mut link = node;
    while let Some(op) = Operator::from_kind(link.kind) {
        let Some(rest) = link.second() else { break };
        let Some(next) = rest.first().and_then(shape.operand_constant) else { break };
        let Some(combined) = acc.combine(next, op) else { break };
        acc = combined;
        consumed += 1;
        link = rest;
    }
    (consumed > 0).then_some((consumed, acc))
}

fn fold_chain(slot: &mut Tree, shape: &ChainShape) -> usize {
    let Some((consumed, value)) = slot
        .as_deref()
        .filter(|node| is_well_formed(node, shape))
        .and_then(|node| plan(node, shape))
    else {
        return 0;
    };
    let Some(folded) = value.into_value() else {
        return 0;
    };
    let Some(root) = slot.take() else {
        return 0;
    };

    let mut operands = Vec::new();
    let mut links = Vec::new();
    let mut next = Some(root);
    while let Some(node) = next {
        let Node { kind, first, second, .. } = *node;
        operands.extend(first);
        if kind == shape.single {
            break;
        }
        links.push(kind);
        next = second;
    }

    let mut rest_operands = operands.into_iter().skip(consumed + 1).rev();
    let mut rest_links = links.into_iter().skip(consumed).rev();
    let head = (shape.wrap_operand)(folded);
    let mut chain = None;
    for operand in rest_operands.by_ref() {
        chain = Some(match chain {
            None => Node::new(None, shape.single, Some(operand), None, None),
            Some(tail) => {
                let kind = rest_links.next().unwrap_or(shape.single);
                Node::new(None, kind, Some(operand), Some(tail), None)
            }
        });
    }
    *slot = Some(match chain {
        None => Node::new(None, shape.single, Some(head), None, None),
        Some(tail) => {
            let kind = rest_links.next().unwrap_or(shape.single);
            Node::new(None, kind, Some(head), Some(tail), None)
        }
    });
    log::debug!("folded {} operator(s) into {:?}", consumed, value);
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;

    fn values_of(node: &Node) -> Vec<i32> {
        let mut out = Vec::new();
        let mut cursor = Some(node);
        while let Some(link) = cursor {
            if let Some(term) = link.first() {
                if let Some(value) = term.first().and_then(constant_value) {
                    out.push(value.value);
                }
            }
            cursor = link.second();
        }
        out
    }

    #[test]
    fn subtraction_chain_folds_left_to_right() {
        let b = AstBuilder::new();
        let mut slot = Some(b.additive(
            b.term(b.int_value(10)),
            vec![
                (NodeKind::ExprMinus, b.term(b.int_value(3))),
                (NodeKind::ExprMinus, b.term(b.int_value(2))),
            ],
        ));
        assert_eq!(fold_expression(&mut slot), 2);
        let folded = slot.unwrap();
        assert_eq!(folded.kind, NodeKind::Expression);
        assert_eq!(values_of(&folded), vec![5]);
    }

    #[test]
    fn only_the_constant_prefix_folds() {
        let mut b = AstBuilder::new();
        let x = b.var("x").unwrap();
        let mut slot = Some(b.additive(
            b.term(b.int_value(4)),
            vec![
                (NodeKind::ExprMinus, b.term(b.int_value(6))),
                (NodeKind::ExprAdd, b.term(x)),
                (NodeKind::ExprAdd, b.term(b.int_value(1))),
            ],
        ));
        assert_eq!(fold_expression(&mut slot), 1);
        let folded = slot.unwrap();
        assert_eq!(folded.kind, NodeKind::ExprAdd);
        let negative = folded.first().and_then(Node::first).and_then(constant_value).unwrap();
        assert_eq!(negative, FoldedConstant { value: -2, is_char: false });
        assert_eq!(folded.second().unwrap().kind, NodeKind::ExprAdd);
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let b = AstBuilder::new();
        let original = b.product(b.int_value(8), vec![(NodeKind::TermDiv, b.int_value(0))]);
        let mut slot = Some(original.clone());
        assert_eq!(fold_term(&mut slot), 0);
        assert_eq!(slot, Some(original));
    }

    #[test]
    fn reals_are_never_folded() {
        let mut b = AstBuilder::new();
        let real = b.real("1.5").unwrap();
        let original = b.product(b.constant(real), vec![(NodeKind::TermMul, b.int_value(2))]);
        let mut slot = Some(original.clone());
        assert_eq!(fold_term(&mut slot), 0);
        assert_eq!(slot, Some(original));
    }

    #[test]
    fn char_operand_makes_a_char_result() {
        let b = AstBuilder::new();
        let folded = fold_constants(&b.char_value(b'a'), &b.int_value(1), Operator::Add).unwrap();
        assert_eq!(folded.first().unwrap().kind, NodeKind::CharConst);
        assert_eq!(folded.first().unwrap().item, Some(i32::from(b'b')));
    }

    #[test]
    fn parenthesized_operands_fold_first() {
        let b = AstBuilder::new();
        let inner = b.additive(b.term(b.int_value(1)), vec![(NodeKind::ExprAdd, b.term(b.int_value(2)))]);
        let mut slot = Some(b.product(b.paren(inner), vec![(NodeKind::TermMul, b.int_value(4))]));
        assert_eq!(fold_term(&mut slot), 2);
        let term = slot.unwrap();
        assert_eq!(term.kind, NodeKind::Term);
        assert_eq!(term.first().and_then(constant_value).map(|c| c.value), Some(12));
    }

    #[test]
    fn constant_type_reports_the_widest_literal() {
        let mut b = AstBuilder::new();
        let real = b.real("2.0").unwrap();
        let mixed = b.additive(b.term(b.char_value(b'x')), vec![(NodeKind::ExprAdd, b.term(b.constant(real)))]);
        assert_eq!(constant_type(&mixed), Some(SymbolType::Real));
        let y = b.var("y").unwrap();
        let with_var = b.value_expr(y);
        assert_eq!(constant_type(&with_var), None);
    }
}
