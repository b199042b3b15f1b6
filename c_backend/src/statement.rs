use std::fmt::{self, Write};
use frontend::ast::{Node, NodeKind};
use frontend::{SymbolId, SymbolType};
use crate::error::CodegenError;
use crate::{format_specifier, required, CCodeGenerator, IdentContext, Phrase, ScratchEntry};

impl<'a, W: fmt::Write> CCodeGenerator<'a, W> {
    pub(crate) fn statement(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        match node.kind {
            NodeKind::StatementList => {
                self.generate(node.first(), level)?;
                self.generate(node.second(), level)
            }
            NodeKind::Statement => {
                self.newline(level)?;
                let form = required(node.first(), node.kind, "empty statement")?;
                self.statement(form, level)
            }
            NodeKind::Assignment => self.assignment(node),
            NodeKind::IfS => self.if_statement(node, level),
            NodeKind::DoS => {
                self.out.write_str("do")?;
                self.loop_body(required(node.first(), node.kind, "missing loop body")?, level)?;
                let condition = self.condition(required(node.second(), node.kind, "missing condition")?)?;
                write!(self.out, " while ({});", condition)?;
                Ok(())
            }
            NodeKind::WhileS => {
                let condition = self.condition(required(node.first(), node.kind, "missing condition")?)?;
                write!(self.out, "while ({})", condition)?;
                self.loop_body(required(node.second(), node.kind, "missing loop body")?, level)
            }
            NodeKind::ForS => self.for_statement(node, level),
            NodeKind::LoopBody => self.loop_body(node, level),
            NodeKind::WriteS => self.write_statement(node),
            NodeKind::WriteNewline => {
                self.out.write_str("putchar('\\n');")?;
                Ok(())
            }
            NodeKind::ReadS => self.read_statement(node),
            kind => Err(CodegenError::malformed(kind, "not a statement")),
        }
    }

    pub(crate) fn loop_body(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        if node.kind != NodeKind::LoopBody {
            return Err(CodegenError::malformed(node.kind, "expected a loop body"));
        }
        self.braced(node.first(), level)
    }

    /// `{` on its own line, `body` one level deeper, then `}`.
    fn braced(&mut self, body: Option<&Node>, level: usize) -> Result<(), CodegenError> {
        self.newline(level)?;
        self.out.write_char('{')?;
        self.generate(body, level + 1)?;
        self.newline(level)?;
        self.out.write_char('}')?;
        Ok(())
    }

    fn if_statement(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        let condition = self.condition(required(node.first(), node.kind, "missing condition")?)?;
        write!(self.out, "if ({})", condition)?;
        self.braced(node.second(), level)?;
        if let Some(otherwise) = node.third() {
            self.newline(level)?;
            self.out.write_str("else")?;
            self.braced(Some(otherwise), level)?;
        }
        Ok(())
    }

    /// Renders a target identifier and returns its symbol and C name.
    pub(crate) fn target(&mut self, node: &Node) -> Result<(SymbolId, String), CodegenError> {
        self.scratch.reset();
        let mut name = Phrase::new();
        self.render_identifier(node, IdentContext::Target, &mut name)?;
        match self.scratch.first() {
            Some(ScratchEntry::Symbol(id)) => Ok((*id, name.text)),
            _ => Err(CodegenError::malformed(node.kind, "target did not resolve to a symbol")),
        }
    }

    /// Type of a target that must have been declared with one.
    pub(crate) fn declared_type(&self, id: SymbolId) -> Result<SymbolType, CodegenError> {
        let record = self
            .symbols
            .get(id)
            .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
        record
            .ty
            .ok_or_else(|| CodegenError::undeclared_identifier(self.symbol_name(id)).with_location(record.location))
    }

    /// Rejects storing a `value` of a wider type than `id` was declared with.
    pub(crate) fn check_assignment(&self, id: SymbolId, value: SymbolType, context: &str) -> Result<(), CodegenError> {
        let declared = self.declared_type(id)?;
        if declared.can_hold(value) {
            return Ok(());
        }
        let location = self.symbols.get(id).and_then(|record| record.location);
        Err(CodegenError::invalid_assignment(self.symbol_name(id), declared, value)
            .with_location(location)
            .with_context(context))
    }

    pub(crate) fn mark_initialized(&mut self, id: SymbolId) {
        if let Some(record) = self.symbols.get_mut(id) {
            record.initialized = true;
        }
    }

    fn assignment(&mut self, node: &Node) -> Result<(), CodegenError> {
        let value = self.expression_phrase(required(node.first(), node.kind, "missing value")?)?;
        let (id, name) = self.target(required(node.second(), node.kind, "missing target")?)?;
        self.check_assignment(id, value.ty, "assignment")?;
        write!(self.out, "{} = {};", name, value.text)?;
        self.mark_initialized(id);
        Ok(())
    }

    /// `printf` with one conversion per output item. Bare identifiers must hold a value.
    fn write_statement(&mut self, node: &Node) -> Result<(), CodegenError> {
        self.scratch.reset();
        let mut arguments = Vec::new();
        let mut item = Some(required(node.first(), node.kind, "nothing to write")?);
        while let Some(entry) = item {
            if entry.kind != NodeKind::OutputList {
                return Err(CodegenError::malformed(entry.kind, "expected an output list"));
            }
            let value = required(entry.first(), entry.kind, "missing output value")?;
            if value.kind == NodeKind::ValIdentifier {
                let mut phrase = Phrase::new();
                let identifier = required(value.first(), value.kind, "missing identifier")?;
                self.render_identifier(identifier, IdentContext::Target, &mut phrase)?;
                arguments.push(phrase.text);
            } else {
                let phrase = self.expression_phrase(value)?;
                self.scratch.append(ScratchEntry::Placeholder(phrase.ty))?;
                arguments.push(phrase.text);
            }
            item = entry.second();
        }

        let mut formats = String::new();
        for index in 0..self.scratch.len() {
            let ty = match self.scratch.get(index).copied() {
                Some(ScratchEntry::Placeholder(ty)) => ty,
                Some(ScratchEntry::Symbol(id)) => {
                    let record = self
                        .symbols
                        .get(id)
                        .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
                    if !record.initialized {
                        return Err(CodegenError::uninitialized_variable(self.symbol_name(id))
                            .with_location(record.location)
                            .with_context("WRITE statement"));
                    }
                    self.declared_type(id)?
                }
                None => break,
            };
            formats.push_str(format_specifier(ty));
        }

        write!(self.out, "printf(\"{}\", {});", formats, arguments.join(", "))?;
        Ok(())
    }

    fn read_statement(&mut self, node: &Node) -> Result<(), CodegenError> {
        let (id, name) = self.target(required(node.first(), node.kind, "missing read target")?)?;
        let ty = self.declared_type(id)?;
        // leading space skips whitespace left in the input before a character
        let skip = if ty == SymbolType::Char { " " } else { "" };
        write!(self.out, "scanf(\"{}{}\", &{});", skip, format_specifier(ty), name)?;
        self.mark_initialized(id);
        Ok(())
    }
}
