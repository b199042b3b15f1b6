use std::fmt::{self, Write};
use frontend::ast::{Comparator, Node, NodeKind};
use frontend::SymbolType;
use crate::error::CodegenError;
use crate::sanitize::sanitize;
use crate::{required, CCodeGenerator, IdentContext, Mode, Phrase, ScratchEntry};

pub fn comparator_symbol(comparator: Comparator) -> &'static str {
    match comparator {
        Comparator::Eq => "==",
        Comparator::Ne => "!=",
        Comparator::Lt => "<",
        Comparator::Gt => ">",
        Comparator::Le => "<=",
        Comparator::Ge => ">=",
    }
}

/// C spelling of a character constant. Values outside `0..=255` become a cast.
pub fn char_literal(value: i32) -> String {
    match value {
        39 => "'\\''".to_string(),
        92 => "'\\\\'".to_string(),
        10 => "'\\n'".to_string(),
        9 => "'\\t'".to_string(),
        32..=126 => format!("'{}'", char::from(value as u8)),
        0..=255 => format!("'\\{:03o}'", value),
        _ => format!("((char){})", value),
    }
}

impl<'a, W: fmt::Write> CCodeGenerator<'a, W> {
    /// Renders an expression, term, value or literal and infers its type.
    pub(crate) fn expression_phrase(&mut self, node: &Node) -> Result<Phrase, CodegenError> {
        let mut phrase = Phrase::new();
        self.render_operand(node, &mut phrase)?;
        Ok(phrase)
    }

    fn render_operand(&mut self, node: &Node, phrase: &mut Phrase) -> Result<(), CodegenError> {
        match node.kind {
            NodeKind::Expression | NodeKind::Term | NodeKind::ValConstant | NodeKind::NumberConst => {
                let inner = required(node.first(), node.kind, "missing operand")?;
                self.render_operand(inner, phrase)
            }
            NodeKind::ExprAdd | NodeKind::ExprMinus | NodeKind::TermMul | NodeKind::TermDiv => {
                let operator = match node.kind {
                    NodeKind::ExprAdd => " + ",
                    NodeKind::ExprMinus => " - ",
                    NodeKind::TermMul => " * ",
                    _ => " / ",
                };
                self.render_operand(required(node.first(), node.kind, "missing left operand")?, phrase)?;
                phrase.text.push_str(operator);
                self.render_operand(required(node.second(), node.kind, "missing right operand")?, phrase)
            }
            NodeKind::ValExpr => {
                phrase.text.push('(');
                self.render_operand(required(node.first(), node.kind, "missing inner expression")?, phrase)?;
                phrase.text.push(')');
                Ok(())
            }
            NodeKind::ValIdentifier => {
                let identifier = required(node.first(), node.kind, "missing identifier")?;
                self.render_identifier(identifier, IdentContext::Operand, phrase)
            }
            NodeKind::IdVal => self.render_identifier(node, IdentContext::Operand, phrase),
            NodeKind::CharConst => {
                let value = node.item.ok_or_else(|| CodegenError::malformed(node.kind, "character without a value"))?;
                phrase.text.push_str(&char_literal(value));
                phrase.widen(SymbolType::Char);
                Ok(())
            }
            NodeKind::IntConst | NodeKind::NegIntConst => {
                let value = node.item.ok_or_else(|| CodegenError::malformed(node.kind, "integer without a value"))?;
                if node.kind == NodeKind::NegIntConst {
                    phrase.text.push('-');
                }
                write!(phrase, "{}", value)?;
                phrase.widen(SymbolType::Int);
                Ok(())
            }
            NodeKind::FloatConst | NodeKind::NegFloatConst => {
                let id = node
                    .symbol()
                    .ok_or_else(|| CodegenError::malformed(node.kind, "real without a symbol index"))?;
                let spelling = self
                    .symbols
                    .name(id)
                    .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
                if node.kind == NodeKind::NegFloatConst {
                    phrase.text.push('-');
                }
                phrase.text.push_str(spelling);
                phrase.widen(SymbolType::Real);
                Ok(())
            }
            kind => Err(CodegenError::malformed(kind, "not an expression")),
        }
    }

    /// Emits the C name of an `IdVal`. In `Validating` mode the name must be declared.
    pub(crate) fn render_identifier(
        &mut self,
        node: &Node,
        context: IdentContext,
        phrase: &mut Phrase,
    ) -> Result<(), CodegenError> {
        if node.kind != NodeKind::IdVal {
            return Err(CodegenError::malformed(node.kind, "expected an identifier"));
        }
        let id = node
            .symbol()
            .ok_or_else(|| CodegenError::malformed(node.kind, "identifier without a symbol index"))?;
        let record = self
            .symbols
            .get(id)
            .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
        if self.mode == Mode::Validating && !record.declared {
            let location = record.location;
            return Err(CodegenError::undeclared_identifier(self.symbol_name(id)).with_location(location));
        }
        let ty = record.ty;

        let name = sanitize(self.symbols, id, &mut self.names)?;
        phrase.text.push_str(&name);
        match context {
            IdentContext::Operand => {
                if let Some(ty) = ty {
                    phrase.widen(ty);
                }
            }
            IdentContext::Target => {
                self.scratch.append(ScratchEntry::Symbol(id))?;
            }
        }
        Ok(())
    }

    /// Renders a `Conditional` or any of its inner forms.
    pub(crate) fn condition(&mut self, node: &Node) -> Result<String, CodegenError> {
        match node.kind {
            NodeKind::Conditional => self.condition(required(node.first(), node.kind, "empty condition")?),
            NodeKind::Negation => {
                let inner = self.condition(required(node.first(), node.kind, "missing negated condition")?)?;
                Ok(format!("!({})", inner))
            }
            NodeKind::LogAnd | NodeKind::LogOr => {
                let left = self.condition(required(node.first(), node.kind, "missing left condition")?)?;
                let right = self.condition(required(node.second(), node.kind, "missing right condition")?)?;
                let operator = if node.kind == NodeKind::LogAnd { "&&" } else { "||" };
                Ok(format!("({} {} {})", left, operator, right))
            }
            NodeKind::Comparison => {
                let left = self.expression_phrase(required(node.first(), node.kind, "missing left operand")?)?;
                let comparator = required(node.second(), node.kind, "missing comparator")?
                    .comparator()
                    .ok_or_else(|| CodegenError::malformed(NodeKind::Comparator, "unknown comparator tag"))?;
                let right = self.expression_phrase(required(node.third(), node.kind, "missing right operand")?)?;
                Ok(format!("{} {} {}", left.text, comparator_symbol(comparator), right.text))
            }
            kind => Err(CodegenError::malformed(kind, "not a condition")),
        }
    }
}
