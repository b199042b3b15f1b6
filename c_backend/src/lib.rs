mod error;
mod expression;
mod for_loop;
mod sanitize;
mod statement;

pub use crate::error::{CodegenError, CodegenErrorKind, Warning, WarningKind};
pub use crate::for_loop::StepDirection;
pub use crate::sanitize::{is_reserved, sanitize, NameGenerator, RESERVED_WORDS};

use std::fmt::{self, Write};
use frontend::ast::{Node, NodeKind};
use frontend::symbol_table::{DynamicTable, SymbolId, SymbolTable};
use frontend::SymbolType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// First character of names given to identifiers that clash with C keywords.
    pub fresh_name_prefix: char,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            fresh_name_prefix: 'v',
        }
    }
}

/// How identifier references are treated.
///
/// While `Collecting`, references are being declared and anything goes. Once the
/// declarations of a block have been emitted the generator switches to `Validating`
/// and every reference must name a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Collecting,
    Validating,
}

/// What one syntactic construct touched: symbols by index, or the inferred type of an
/// argument that is not a bare identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScratchEntry {
    Symbol(SymbolId),
    Placeholder(SymbolType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentContext {
    /// Inside an expression: the reference widens the phrase type.
    Operand,
    /// Declared name, assignment target, read target or loop iterator: the reference
    /// is recorded in the scratch table.
    Target,
}

/// Text of a sub-phrase held back until its surrounding syntax is known, with the
/// widest type seen while rendering it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Phrase {
    pub text: String,
    pub ty: SymbolType,
}

impl Phrase {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            ty: SymbolType::Char,
        }
    }

    pub fn widen(&mut self, ty: SymbolType) {
        self.ty = self.ty.widen(ty);
    }
}

impl fmt::Write for Phrase {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}

pub fn c_type_name(ty: SymbolType) -> &'static str {
    match ty {
        SymbolType::Char => "char",
        SymbolType::Int => "int",
        SymbolType::Real => "double",
    }
}

/// `printf`/`scanf` conversion for a value of type `ty`.
pub fn format_specifier(ty: SymbolType) -> &'static str {
    match ty {
        SymbolType::Char => "%c",
        SymbolType::Int => "%d",
        SymbolType::Real => "%lg",
    }
}

pub(crate) fn required<'n>(child: Option<&'n Node>, parent: NodeKind, reason: &'static str) -> Result<&'n Node, CodegenError> {
    child.ok_or_else(|| CodegenError::malformed(parent, reason))
}

/// Lowers an optimized syntax tree to C, checking declarations, initialization and
/// assignment types on the way. Text is written to `out` as each construct completes;
/// after an error the output is incomplete and should be discarded.
pub struct CCodeGenerator<'a, W: fmt::Write> {
    symbols: &'a mut SymbolTable,
    out: W,
    options: CodegenOptions,
    mode: Mode,
    scratch: DynamicTable<ScratchEntry>,
    names: NameGenerator,
    warnings: Vec<Warning>,
}

impl<'a, W: fmt::Write> CCodeGenerator<'a, W> {
    pub fn new(symbols: &'a mut SymbolTable, out: W) -> Self {
        Self::with_options(symbols, out, CodegenOptions::default())
    }

    pub fn with_options(symbols: &'a mut SymbolTable, out: W, options: CodegenOptions) -> Self {
        Self {
            symbols,
            out,
            options,
            mode: Mode::default(),
            scratch: DynamicTable::new(),
            names: NameGenerator::new(options.fresh_name_prefix),
            warnings: Vec::new(),
        }
    }

    /// Starts in `mode` instead of `Collecting`, for emitting fragments whose
    /// declarations were handled elsewhere.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn symbols(&self) -> &SymbolTable {
        &*self.symbols
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Emits `tree` at nesting `level`. An absent tree emits nothing.
    pub fn generate(&mut self, tree: Option<&Node>, level: usize) -> Result<(), CodegenError> {
        let Some(node) = tree else {
            return Ok(());
        };
        match node.kind {
            NodeKind::Program => self.program(node, level),
            NodeKind::Block => self.block(node, level),
            NodeKind::DeclarationBlock => self.declaration_block(node, level),
            NodeKind::Declaration => self.declaration(node, level),
            NodeKind::StatementList
            | NodeKind::Statement
            | NodeKind::Assignment
            | NodeKind::IfS
            | NodeKind::DoS
            | NodeKind::WhileS
            | NodeKind::ForS
            | NodeKind::LoopBody
            | NodeKind::WriteS
            | NodeKind::WriteNewline
            | NodeKind::ReadS => self.statement(node, level),
            NodeKind::Conditional
            | NodeKind::Negation
            | NodeKind::LogAnd
            | NodeKind::LogOr
            | NodeKind::Comparison => {
                let condition = self.condition(node)?;
                self.out.write_str(&condition)?;
                Ok(())
            }
            kind if kind.is_expression()
                || kind.is_term()
                || kind.is_value()
                || kind.literal_type().is_some()
                || matches!(kind, NodeKind::NumberConst | NodeKind::IdVal) =>
            {
                let phrase = self.expression_phrase(node)?;
                self.out.write_str(&phrase.text)?;
                Ok(())
            }
            kind => Err(CodegenError::malformed(kind, "cannot be generated on its own")),
        }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.options.indent_width)
    }

    pub(crate) fn newline(&mut self, level: usize) -> Result<(), CodegenError> {
        let indent = self.indent(level);
        write!(self.out, "\n{}", indent)?;
        Ok(())
    }

    fn program(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        let identifier = required(node.first(), NodeKind::Program, "missing program identifier")?;
        let id = identifier
            .symbol()
            .ok_or_else(|| CodegenError::malformed(NodeKind::IdVal, "identifier without a symbol index"))?;
        let name = sanitize(self.symbols, id, &mut self.names)?;
        if let Some(record) = self.symbols.get_mut(id) {
            record.declared = true;
        }
        log::debug!("generating C for program \"{}\"", name);

        write!(
            self.out,
            "#include <stdio.h>\n\nvoid {name}(void);\n\nint main(void) {{ {name}(); return 0; }}\n\nvoid {name}(void)\n{{",
            name = name
        )?;
        self.generate(node.second(), level + 1)?;
        self.out.write_str("\n}\n")?;
        Ok(())
    }

    fn block(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        for child in [node.first(), node.second()].into_iter().flatten() {
            if child.kind != NodeKind::DeclarationBlock {
                self.mode = Mode::Validating;
            }
            self.generate(Some(child), level)?;
        }
        Ok(())
    }

    fn declaration_block(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        self.mode = Mode::Collecting;
        self.generate(node.first(), level)?;
        self.scratch.reset();
        self.generate(node.second(), level)?;
        self.mode = Mode::Validating;
        Ok(())
    }

    /// `<type> a, b;` Every collected name gets the declared type; declaring a name twice
    /// is an error.
    fn declaration(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        let ty = required(node.second(), NodeKind::Declaration, "missing type")?
            .type_tag()
            .ok_or_else(|| CodegenError::malformed(NodeKind::TypeP, "unknown type tag"))?;

        let mode = std::mem::replace(&mut self.mode, Mode::Collecting);
        self.scratch.reset();
        let mut names = Phrase::new();
        let mut list = node.first();
        while let Some(entry) = list {
            if entry.kind != NodeKind::IdList {
                return Err(CodegenError::malformed(entry.kind, "expected an identifier list"));
            }
            if !names.text.is_empty() {
                names.text.push_str(", ");
            }
            let identifier = required(entry.first(), NodeKind::IdList, "missing identifier")?;
            self.render_identifier(identifier, IdentContext::Target, &mut names)?;
            list = entry.second();
        }
        self.mode = mode;

        for index in 0..self.scratch.len() {
            let Some(ScratchEntry::Symbol(id)) = self.scratch.get(index).copied() else {
                continue;
            };
            let record = self
                .symbols
                .get(id)
                .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
            if record.declared {
                let location = record.location;
                return Err(CodegenError::duplicate_declaration(self.symbol_name(id))
                    .with_location(location)
                    .with_context("declaration"));
            }
            if let Some(record) = self.symbols.get_mut(id) {
                record.ty = Some(ty);
                record.declared = true;
            }
        }

        self.newline(level)?;
        write!(self.out, "{} {};", c_type_name(ty), names.text)?;
        Ok(())
    }

    pub(crate) fn symbol_name(&self, id: SymbolId) -> &str {
        self.symbols.name(id).unwrap_or("<unknown>")
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Generates C for `tree` into a fresh `String`.
pub fn generate_c(tree: Option<&Node>, symbols: &mut SymbolTable) -> Result<String, CodegenError> {
    let mut generator = CCodeGenerator::new(symbols, String::new());
    generator.generate(tree, 0)?;
    Ok(generator.into_output())
}
