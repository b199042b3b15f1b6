pub mod ast;
pub mod builder;
pub mod optimizer;
pub mod symbol_table;
pub mod type_decl;

pub use crate::ast::{Node, NodeKind, Tree};
pub use crate::builder::AstBuilder;
pub use crate::optimizer::{optimise, OptimizeStats, Optimizer, OptimizerOptions};
pub use crate::symbol_table::{SourceLocation, SymbolId, SymbolRecord, SymbolTable, SymbolTableError};
pub use crate::type_decl::SymbolType;
