use crate::symbol_table::SymbolId;
use crate::type_decl::SymbolType;

/// A child slot. Each present child is owned by exactly one parent.
pub type Tree = Option<Box<Node>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Block,
    DeclarationBlock,
    Declaration,
    IdList,
    TypeP,
    StatementList,
    Statement,
    Assignment,
    IfS,
    DoS,
    WhileS,
    ForS,
    ForAssign,
    ForProperties,
    LoopBody,
    WriteS,
    WriteNewline,
    ReadS,
    OutputList,
    Conditional,
    Negation,
    LogAnd,
    LogOr,
    Comparison,
    Comparator,
    Expression,
    Term,
    ExprAdd,
    ExprMinus,
    TermMul,
    TermDiv,
    ValIdentifier,
    ValConstant,
    ValExpr,
    NumberConst,
    CharConst,
    IntConst,
    NegIntConst,
    FloatConst,
    NegFloatConst,
    IdVal,
}

impl NodeKind {
    /// Constructs whose descendants may execute more than once.
    pub fn is_loop(self) -> bool {
        matches!(self, NodeKind::LoopBody | NodeKind::DoS | NodeKind::WhileS | NodeKind::ForS)
    }

    /// `Expression`, `ExprAdd` and `ExprMinus`.
    pub fn is_expression(self) -> bool {
        matches!(self, NodeKind::Expression | NodeKind::ExprAdd | NodeKind::ExprMinus)
    }

    /// `Term`, `TermMul` and `TermDiv`.
    pub fn is_term(self) -> bool {
        matches!(self, NodeKind::Term | NodeKind::TermMul | NodeKind::TermDiv)
    }

    pub fn is_value(self) -> bool {
        matches!(self, NodeKind::ValIdentifier | NodeKind::ValConstant | NodeKind::ValExpr)
    }

    /// Type of a literal leaf, if this kind is one.
    pub fn literal_type(self) -> Option<SymbolType> {
        match self {
            NodeKind::CharConst => Some(SymbolType::Char),
            NodeKind::IntConst | NodeKind::NegIntConst => Some(SymbolType::Int),
            NodeKind::FloatConst | NodeKind::NegFloatConst => Some(SymbolType::Real),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Comparator::Eq),
            1 => Some(Comparator::Ne),
            2 => Some(Comparator::Lt),
            3 => Some(Comparator::Gt),
            4 => Some(Comparator::Le),
            5 => Some(Comparator::Ge),
            _ => None,
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            Comparator::Eq => 0,
            Comparator::Ne => 1,
            Comparator::Lt => 2,
            Comparator::Gt => 3,
            Comparator::Le => 4,
            Comparator::Ge => 5,
        }
    }
}

/// Ternary syntax tree node. The meaning of `item` and of each slot depends on `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub item: Option<i32>,
    pub first: Tree,
    pub second: Tree,
    pub third: Tree,
}

impl Node {
    pub fn new(item: Option<i32>, kind: NodeKind, first: Tree, second: Tree, third: Tree) -> Box<Node> {
        Box::new(Node {
            kind,
            item,
            first,
            second,
            third,
        })
    }

    pub fn leaf(item: Option<i32>, kind: NodeKind) -> Box<Node> {
        Node::new(item, kind, None, None, None)
    }

    pub fn first(&self) -> Option<&Node> {
        self.first.as_deref()
    }

    pub fn second(&self) -> Option<&Node> {
        self.second.as_deref()
    }

    pub fn third(&self) -> Option<&Node> {
        self.third.as_deref()
    }

    /// Symbol table index carried by `IdVal`, `FloatConst` and `NegFloatConst` nodes.
    pub fn symbol(&self) -> Option<SymbolId> {
        self.item.and_then(SymbolId::from_item)
    }

    pub fn type_tag(&self) -> Option<SymbolType> {
        self.item.and_then(SymbolType::from_tag)
    }

    pub fn comparator(&self) -> Option<Comparator> {
        self.item.and_then(Comparator::from_tag)
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + [&self.first, &self.second, &self.third]
            .into_iter()
            .flatten()
            .map(|child| child.size())
            .sum::<usize>()
    }
}
