use crate::ast::{Comparator, Node, NodeKind, Tree};
use crate::symbol_table::{SourceLocation, SymbolId, SymbolTable, SymbolTableError};
use crate::type_decl::SymbolType;

/// Builds well-shaped syntax trees while populating the global symbol table.
///
/// The parser drives this the same way the tests do: identifiers are entered into
/// the table on first sight and every constructor returns an owned node ready to be
/// placed into a parent slot.
#[derive(Debug, Default)]
pub struct AstBuilder {
    symbols: SymbolTable,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbols(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    pub fn symbol(&mut self, name: &str) -> Result<SymbolId, SymbolTableError> {
        match self.symbols.find(name) {
            Some(id) => Ok(id),
            None => self.symbols.add(name),
        }
    }

    /// `IdVal` for `name`, entering it into the table if it is new.
    pub fn ident(&mut self, name: &str) -> Result<Box<Node>, SymbolTableError> {
        let id = self.symbol(name)?;
        Ok(Node::leaf(Some(id.as_item()), NodeKind::IdVal))
    }

    /// Like [`AstBuilder::ident`], recording where the identifier was first seen.
    pub fn ident_at(&mut self, name: &str, line: u32, column: u32) -> Result<Box<Node>, SymbolTableError> {
        let id = self.symbol(name)?;
        if let Some(record) = self.symbols.get_mut(id) {
            record.location.get_or_insert(SourceLocation { line, column });
        }
        Ok(Node::leaf(Some(id.as_item()), NodeKind::IdVal))
    }

    // literals

    /// `NumberConst` holding an integer. Negative values use the magnitude form;
    /// `i32::MIN` has no magnitude and saturates to `-i32::MAX`.
    pub fn int(&self, value: i32) -> Box<Node> {
        let literal = if value < 0 {
            Node::leaf(Some(value.saturating_neg()), NodeKind::NegIntConst)
        } else {
            Node::leaf(Some(value), NodeKind::IntConst)
        };
        Node::new(None, NodeKind::NumberConst, Some(literal), None, None)
    }

    pub fn char(&self, value: u8) -> Box<Node> {
        Node::leaf(Some(i32::from(value)), NodeKind::CharConst)
    }

    /// `NumberConst` holding a real literal. The spelling (without sign) is stored in
    /// the symbol table.
    pub fn real(&mut self, spelling: &str) -> Result<Box<Node>, SymbolTableError> {
        let (kind, digits) = match spelling.strip_prefix('-') {
            Some(digits) => (NodeKind::NegFloatConst, digits),
            None => (NodeKind::FloatConst, spelling),
        };
        let id = self.symbol(digits)?;
        let literal = Node::leaf(Some(id.as_item()), kind);
        Ok(Node::new(None, NodeKind::NumberConst, Some(literal), None, None))
    }

    // values

    /// `ValConstant` around a `CharConst` or `NumberConst`.
    pub fn constant(&self, literal: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::ValConstant, Some(literal), None, None)
    }

    pub fn var(&mut self, name: &str) -> Result<Box<Node>, SymbolTableError> {
        let id = self.ident(name)?;
        Ok(Node::new(None, NodeKind::ValIdentifier, Some(id), None, None))
    }

    pub fn paren(&self, expression: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::ValExpr, Some(expression), None, None)
    }

    pub fn int_value(&self, value: i32) -> Box<Node> {
        self.constant(self.int(value))
    }

    pub fn char_value(&self, value: u8) -> Box<Node> {
        self.constant(self.char(value))
    }

    // terms and expressions

    pub fn term(&self, value: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::Term, Some(value), None, None)
    }

    pub fn mul(&self, value: Box<Node>, rest: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::TermMul, Some(value), Some(rest), None)
    }

    pub fn div(&self, value: Box<Node>, rest: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::TermDiv, Some(value), Some(rest), None)
    }

    pub fn expr(&self, term: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::Expression, Some(term), None, None)
    }

    pub fn add(&self, term: Box<Node>, rest: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::ExprAdd, Some(term), Some(rest), None)
    }

    pub fn sub(&self, term: Box<Node>, rest: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::ExprMinus, Some(term), Some(rest), None)
    }

    /// `Expression(Term(value))`.
    pub fn value_expr(&self, value: Box<Node>) -> Box<Node> {
        self.expr(self.term(value))
    }

    /// Right-recursive additive chain `head k1 t1 k2 t2 ...` over terms, where each
    /// `k` is `ExprAdd` or `ExprMinus`.
    pub fn additive(&self, head: Box<Node>, mut rest: Vec<(NodeKind, Box<Node>)>) -> Box<Node> {
        let Some((mut link, last)) = rest.pop() else {
            return self.expr(head);
        };
        let mut chain = self.expr(last);
        while let Some((kind, term)) = rest.pop() {
            chain = Node::new(None, link, Some(term), Some(chain), None);
            link = kind;
        }
        Node::new(None, link, Some(head), Some(chain), None)
    }

    /// Right-recursive multiplicative chain over values, where each `k` is `TermMul`
    /// or `TermDiv`.
    pub fn product(&self, head: Box<Node>, mut rest: Vec<(NodeKind, Box<Node>)>) -> Box<Node> {
        let Some((mut link, last)) = rest.pop() else {
            return self.term(head);
        };
        let mut chain = self.term(last);
        while let Some((kind, value)) = rest.pop() {
            chain = Node::new(None, link, Some(value), Some(chain), None);
            link = kind;
        }
        Node::new(None, link, Some(head), Some(chain), None)
    }

    // conditions

    pub fn compare(&self, left: Box<Node>, comparator: Comparator, right: Box<Node>) -> Box<Node> {
        let comparison = Node::new(
            None,
            NodeKind::Comparison,
            Some(left),
            Some(Node::leaf(Some(comparator.tag()), NodeKind::Comparator)),
            Some(right),
        );
        self.conditional(comparison)
    }

    pub fn not(&self, condition: Box<Node>) -> Box<Node> {
        self.conditional(Node::new(None, NodeKind::Negation, Some(condition), None, None))
    }

    pub fn and(&self, left: Box<Node>, right: Box<Node>) -> Box<Node> {
        self.conditional(Node::new(None, NodeKind::LogAnd, Some(left), Some(right), None))
    }

    pub fn or(&self, left: Box<Node>, right: Box<Node>) -> Box<Node> {
        self.conditional(Node::new(None, NodeKind::LogOr, Some(left), Some(right), None))
    }

    fn conditional(&self, inner: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::Conditional, Some(inner), None, None)
    }

    // statements

    pub fn assign(&mut self, target: &str, value: Box<Node>) -> Result<Box<Node>, SymbolTableError> {
        let id = self.ident(target)?;
        Ok(self.statement(Node::new(None, NodeKind::Assignment, Some(value), Some(id), None)))
    }

    pub fn write(&self, values: Vec<Box<Node>>) -> Box<Node> {
        let list = values
            .into_iter()
            .rev()
            .fold(None, |rest: Tree, value| Some(Node::new(None, NodeKind::OutputList, Some(value), rest, None)));
        self.statement(Node::new(None, NodeKind::WriteS, list, None, None))
    }

    pub fn newline(&self) -> Box<Node> {
        self.statement(Node::leaf(None, NodeKind::WriteNewline))
    }

    pub fn read(&mut self, target: &str) -> Result<Box<Node>, SymbolTableError> {
        let id = self.ident(target)?;
        Ok(self.statement(Node::new(None, NodeKind::ReadS, Some(id), None, None)))
    }

    pub fn if_then(&self, condition: Box<Node>, then_list: Box<Node>, else_list: Tree) -> Box<Node> {
        self.statement(Node::new(None, NodeKind::IfS, Some(condition), Some(then_list), else_list))
    }

    pub fn do_while(&self, body: Box<Node>, condition: Box<Node>) -> Box<Node> {
        let body = Node::new(None, NodeKind::LoopBody, Some(body), None, None);
        self.statement(Node::new(None, NodeKind::DoS, Some(body), Some(condition), None))
    }

    pub fn while_do(&self, condition: Box<Node>, body: Box<Node>) -> Box<Node> {
        let body = Node::new(None, NodeKind::LoopBody, Some(body), None, None);
        self.statement(Node::new(None, NodeKind::WhileS, Some(condition), Some(body), None))
    }

    /// `FOR iterator IS init BY step TO limit DO body ENDFOR`.
    pub fn for_loop(
        &mut self,
        iterator: &str,
        init: Box<Node>,
        step: Box<Node>,
        limit: Box<Node>,
        body: Box<Node>,
    ) -> Result<Box<Node>, SymbolTableError> {
        let id = self.ident(iterator)?;
        let assign = Node::new(None, NodeKind::ForAssign, Some(id), Some(init), None);
        let properties = Node::new(None, NodeKind::ForProperties, Some(step), Some(limit), None);
        let body = Node::new(None, NodeKind::LoopBody, Some(body), None, None);
        Ok(self.statement(Node::new(None, NodeKind::ForS, Some(assign), Some(properties), Some(body))))
    }

    fn statement(&self, form: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::Statement, Some(form), None, None)
    }

    /// Left-recursive `StatementList` in source order.
    pub fn statements(&self, statements: Vec<Box<Node>>) -> Box<Node> {
        let mut iter = statements.into_iter();
        let mut list = Node::new(None, NodeKind::StatementList, iter.next(), None, None);
        for statement in iter {
            list = Node::new(None, NodeKind::StatementList, Some(list), Some(statement), None);
        }
        list
    }

    // declarations and program

    pub fn declaration(&mut self, names: &[&str], ty: SymbolType) -> Result<Box<Node>, SymbolTableError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.ident(name)?);
        }
        let list = ids
            .into_iter()
            .rev()
            .fold(None, |rest: Tree, id| Some(Node::new(None, NodeKind::IdList, Some(id), rest, None)));
        let ty = Node::leaf(Some(ty.tag()), NodeKind::TypeP);
        Ok(Node::new(None, NodeKind::Declaration, list, Some(ty), None))
    }

    pub fn declarations(&self, declarations: Vec<Box<Node>>) -> Tree {
        declarations
            .into_iter()
            .rev()
            .fold(None, |rest, declaration| {
                Some(Node::new(None, NodeKind::DeclarationBlock, Some(declaration), rest, None))
            })
    }

    pub fn block(&self, declarations: Tree, statements: Box<Node>) -> Box<Node> {
        Node::new(None, NodeKind::Block, declarations, Some(statements), None)
    }

    pub fn program(&mut self, name: &str, block: Box<Node>) -> Result<Box<Node>, SymbolTableError> {
        let id = self.ident(name)?;
        Ok(Node::new(None, NodeKind::Program, Some(id), Some(block), None))
    }
}
