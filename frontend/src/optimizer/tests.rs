use super::*;
use crate::ast::Comparator;
use crate::builder::AstBuilder;
use crate::optimizer::fold::constant_value;
use crate::type_decl::SymbolType;
use rstest::rstest;

fn program(b: &mut AstBuilder, declarations: Vec<Box<Node>>, statements: Vec<Box<Node>>) -> Tree {
    let declarations = b.declarations(declarations);
    let statements = b.statements(statements);
    let block = b.block(declarations, statements);
    Some(b.program("test", block).unwrap())
}

fn find(node: &Node, kind: NodeKind) -> Option<&Node> {
    if node.kind == kind {
        return Some(node);
    }
    [node.first(), node.second(), node.third()]
        .into_iter()
        .flatten()
        .find_map(|child| find(child, kind))
}

fn count(node: &Node, kind: NodeKind) -> usize {
    usize::from(node.kind == kind)
        + [node.first(), node.second(), node.third()]
            .into_iter()
            .flatten()
            .map(|child| count(child, kind))
            .sum::<usize>()
}

/// Value of every `OutputList` entry, in tree order.
fn outputs(root: &Node) -> Vec<&Node> {
    fn visit<'n>(node: &'n Node, out: &mut Vec<&'n Node>) {
        if node.kind == NodeKind::OutputList {
            out.extend(node.first());
        }
        for child in [node.first(), node.second(), node.third()].into_iter().flatten() {
            visit(child, out);
        }
    }
    let mut out = Vec::new();
    visit(root, &mut out);
    out
}

fn constant_of(value: &Node) -> Option<i32> {
    constant_value(value).map(|c| c.value)
}

#[test]
fn folds_constant_assignment_and_propagates_it() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x"], SymbolType::Int).unwrap();
    let rhs = b.additive(b.term(b.int_value(2)), vec![(NodeKind::ExprAdd, b.term(b.int_value(3)))]);
    let assign = b.assign("x", rhs).unwrap();
    let x = b.var("x").unwrap();
    let write = b.write(vec![x]);
    let mut tree = program(&mut b, vec![declaration], vec![assign, write]);

    let stats = optimise(&mut tree, b.symbols());

    let root = tree.as_deref().unwrap();
    let assignment = find(root, NodeKind::Assignment).unwrap();
    let rhs = single_constant(assignment.first().unwrap()).unwrap();
    assert_eq!(constant_of(rhs), Some(5));
    assert_eq!(constant_of(outputs(root)[0]), Some(5));
    assert_eq!(stats, OptimizeStats { folded: 1, propagated: 1, elided: 0 });
}

#[test]
fn subtraction_chain_folds_once_at_its_head() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x"], SymbolType::Int).unwrap();
    let rhs = b.additive(
        b.term(b.int_value(10)),
        vec![
            (NodeKind::ExprMinus, b.term(b.int_value(3))),
            (NodeKind::ExprMinus, b.term(b.int_value(2))),
        ],
    );
    let assign = b.assign("x", rhs).unwrap();
    let mut tree = program(&mut b, vec![declaration], vec![assign]);

    let stats = optimise(&mut tree, b.symbols());

    let assignment = find(tree.as_deref().unwrap(), NodeKind::Assignment).unwrap();
    let rhs = single_constant(assignment.first().unwrap()).unwrap();
    assert_eq!(constant_of(rhs), Some(5));
    assert_eq!(stats.folded, 2);
}

#[test]
fn substituted_operand_is_folded_with_its_neighbours() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x", "y"], SymbolType::Int).unwrap();
    let six = b.value_expr(b.int_value(6));
    let set_x = b.assign("x", six).unwrap();
    let x = b.var("x").unwrap();
    let product = b.expr(b.product(x, vec![(NodeKind::TermMul, b.int_value(2))]));
    let set_y = b.assign("y", product).unwrap();
    let y = b.var("y").unwrap();
    let write = b.write(vec![y]);
    let mut tree = program(&mut b, vec![declaration], vec![set_x, set_y, write]);

    let stats = optimise(&mut tree, b.symbols());

    let root = tree.as_deref().unwrap();
    assert_eq!(constant_of(outputs(root)[0]), Some(12));
    assert_eq!(count(root, NodeKind::ValIdentifier), 0);
    assert_eq!(stats.propagated, 2);
    assert_eq!(stats.folded, 1);
}

#[test]
fn uses_inside_loops_are_not_replaced() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x"], SymbolType::Int).unwrap();
    let four = b.value_expr(b.int_value(4));
    let set_x = b.assign("x", four).unwrap();

    let x = b.var("x").unwrap();
    let condition = b.compare(b.value_expr(x), Comparator::Lt, b.value_expr(b.int_value(10)));
    let x = b.var("x").unwrap();
    let increment = b.additive(b.term(x), vec![(NodeKind::ExprAdd, b.term(b.int_value(1)))]);
    let step = b.assign("x", increment).unwrap();
    let x = b.var("x").unwrap();
    let write_inside = b.write(vec![x]);
    let body = b.statements(vec![step, write_inside]);
    let while_loop = b.while_do(condition, body);

    let x = b.var("x").unwrap();
    let write_after = b.write(vec![x]);
    let mut tree = program(&mut b, vec![declaration], vec![set_x, while_loop, write_after]);

    let stats = optimise(&mut tree, b.symbols());

    let root = tree.as_deref().unwrap();
    assert_eq!(count(root, NodeKind::ValIdentifier), 4);
    assert_eq!(stats.propagated, 0);
}

#[test]
fn assignment_in_a_branch_forgets_the_known_value() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x"], SymbolType::Int).unwrap();
    let one = b.value_expr(b.int_value(1));
    let set_x = b.assign("x", one).unwrap();
    let x = b.var("x").unwrap();
    let condition = b.compare(b.value_expr(x), Comparator::Gt, b.value_expr(b.int_value(0)));
    let two = b.value_expr(b.int_value(2));
    let set_again = b.assign("x", two).unwrap();
    let then_list = b.statements(vec![set_again]);
    let branch = b.if_then(condition, then_list, None);
    let x = b.var("x").unwrap();
    let write = b.write(vec![x]);
    let mut tree = program(&mut b, vec![declaration], vec![set_x, branch, write]);

    let stats = optimise(&mut tree, b.symbols());

    let root = tree.as_deref().unwrap();
    // the condition still sees the unconditional assignment
    assert_eq!(stats.propagated, 1);
    assert_eq!(outputs(root)[0].kind, NodeKind::ValIdentifier);
}

#[test]
fn read_targets_are_never_replaced() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["n"], SymbolType::Int).unwrap();
    let three = b.value_expr(b.int_value(3));
    let set_n = b.assign("n", three).unwrap();
    let n = b.var("n").unwrap();
    let write_before = b.write(vec![n]);
    let read = b.read("n").unwrap();
    let n = b.var("n").unwrap();
    let write_after = b.write(vec![n]);
    let mut tree = program(&mut b, vec![declaration], vec![set_n, write_before, read, write_after]);

    let stats = optimise(&mut tree, b.symbols());

    assert_eq!(stats.propagated, 0);
    let root = tree.as_deref().unwrap();
    assert!(outputs(root).iter().all(|value| value.kind == NodeKind::ValIdentifier));
}

#[test]
fn loop_iterators_are_never_replaced() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["i"], SymbolType::Int).unwrap();
    let zero = b.value_expr(b.int_value(0));
    let set_i = b.assign("i", zero).unwrap();
    let i = b.var("i").unwrap();
    let body = b.statements(vec![b.write(vec![i])]);
    let init = b.value_expr(b.int_value(1));
    let step = b.value_expr(b.int_value(1));
    let limit = b.value_expr(b.int_value(3));
    let for_loop = b.for_loop("i", init, step, limit, body).unwrap();
    let i = b.var("i").unwrap();
    let write_after = b.write(vec![i]);
    let mut tree = program(&mut b, vec![declaration], vec![set_i, for_loop, write_after]);

    let stats = optimise(&mut tree, b.symbols());

    assert_eq!(stats.propagated, 0);
    assert_eq!(count(tree.as_deref().unwrap(), NodeKind::ValIdentifier), 2);
}

#[rstest]
#[case(SymbolType::Int, false, true)]
#[case(SymbolType::Real, false, false)]
#[case(SymbolType::Char, true, true)]
#[case(SymbolType::Int, true, false)]
fn propagation_requires_matching_literal_type(#[case] declared: SymbolType, #[case] char_literal: bool, #[case] replaced: bool) {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["v"], declared).unwrap();
    let literal = if char_literal { b.char_value(b'q') } else { b.int_value(7) };
    let value = b.value_expr(literal);
    let assign = b.assign("v", value).unwrap();
    let v = b.var("v").unwrap();
    let write = b.write(vec![v]);
    let mut tree = program(&mut b, vec![declaration], vec![assign, write]);

    let stats = optimise(&mut tree, b.symbols());

    assert_eq!(stats.propagated == 1, replaced);
    let root = tree.as_deref().unwrap();
    assert_eq!(outputs(root)[0].kind == NodeKind::ValConstant, replaced);
}

#[test]
fn non_literal_constant_is_substituted_in_parentheses() {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["r"], SymbolType::Real).unwrap();
    let half = b.real("0.5").unwrap();
    let quarter = b.real("0.25").unwrap();
    let sum = b.additive(b.term(b.constant(half)), vec![(NodeKind::ExprAdd, b.term(b.constant(quarter)))]);
    let assign = b.assign("r", sum).unwrap();
    let r = b.var("r").unwrap();
    let write = b.write(vec![r]);
    let mut tree = program(&mut b, vec![declaration], vec![assign, write]);

    let stats = optimise(&mut tree, b.symbols());

    let root = tree.as_deref().unwrap();
    let substituted = outputs(root)[0];
    assert_eq!(substituted.kind, NodeKind::ValExpr);
    assert_eq!(substituted.first().unwrap().kind, NodeKind::ExprAdd);
    assert_eq!(stats.folded, 0);
    assert_eq!(stats.propagated, 1);
}

#[test]
fn empty_structures_are_elided_and_block_rotated() {
    let mut b = AstBuilder::new();
    let empty_declarations = Node::new(None, NodeKind::DeclarationBlock, None, None, None);
    let only_second = Node::new(None, NodeKind::StatementList, None, Some(b.newline()), None);
    let block = b.block(Some(empty_declarations), only_second);
    let mut tree = Some(b.program("test", block).unwrap());

    let stats = optimise(&mut tree, b.symbols());

    let block = find(tree.as_deref().unwrap(), NodeKind::Block).unwrap();
    assert_eq!(block.first().unwrap().kind, NodeKind::Statement);
    assert!(block.second().is_none());
    assert_eq!(stats.elided, 1);
}

#[test]
fn empty_statement_list_is_removed() {
    let mut b = AstBuilder::new();
    let statements = b.statements(Vec::new());
    let block = b.block(None, statements);
    let mut tree = Some(b.program("test", block).unwrap());

    let stats = optimise(&mut tree, b.symbols());

    let block = find(tree.as_deref().unwrap(), NodeKind::Block).unwrap();
    assert!(block.first().is_none() && block.second().is_none());
    assert_eq!(stats.elided, 1);
}

#[test]
fn missing_tree_is_left_alone() {
    let mut tree: Tree = None;
    assert_eq!(optimise(&mut tree, &SymbolTable::new()), OptimizeStats::default());
    assert!(tree.is_none());
}

#[rstest]
#[case(OptimizerOptions { fold_constants: false, propagate_constants: true }, 0, 1)]
#[case(OptimizerOptions { fold_constants: true, propagate_constants: false }, 1, 0)]
fn options_switch_passes_off(#[case] options: OptimizerOptions, #[case] folded: usize, #[case] propagated: usize) {
    let mut b = AstBuilder::new();
    let declaration = b.declaration(&["x"], SymbolType::Int).unwrap();
    let seven = b.value_expr(b.int_value(7));
    let set_x = b.assign("x", seven).unwrap();
    let x = b.var("x").unwrap();
    let write = b.write(vec![x]);
    let sum = b.additive(b.term(b.int_value(1)), vec![(NodeKind::ExprAdd, b.term(b.int_value(1)))]);
    let write_sum = b.write(vec![b.paren(sum)]);
    let mut tree = program(&mut b, vec![declaration], vec![set_x, write, write_sum]);

    let stats = Optimizer::with_options(b.symbols(), options).run(&mut tree);

    assert_eq!(stats.folded, folded);
    assert_eq!(stats.propagated, propagated);
}
