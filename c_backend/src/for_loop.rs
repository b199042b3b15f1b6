use std::fmt::{self, Write};
use frontend::ast::{Node, NodeKind};
use frontend::SymbolType;
use crate::error::{CodegenError, Warning, WarningKind};
use crate::{required, CCodeGenerator};

/// How a `FOR` loop's step tells the generator which way the iterator moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    /// A non-negative literal: loop while `i <= limit`.
    Ascending,
    /// A negative literal: loop while `i >= limit`.
    Descending,
    /// A lone constant of unrecognised shape: loop while `i != limit`.
    Ambiguous,
    /// Anything else: the sign is tested at run time.
    Dynamic,
}

impl StepDirection {
    /// Looks through `Expression(Term(ValConstant(..)))` for a signed literal.
    pub fn classify(step: &Node) -> StepDirection {
        let constant = Some(step)
            .filter(|node| node.kind == NodeKind::Expression && node.second().is_none())
            .and_then(Node::first)
            .filter(|node| node.kind == NodeKind::Term && node.second().is_none())
            .and_then(Node::first)
            .filter(|node| node.kind == NodeKind::ValConstant);
        let Some(constant) = constant else {
            return StepDirection::Dynamic;
        };

        let literal = match constant.first() {
            Some(node) if node.kind == NodeKind::NumberConst => node.first(),
            other => other,
        };
        match literal.map(|node| node.kind) {
            Some(NodeKind::CharConst | NodeKind::IntConst | NodeKind::FloatConst) => StepDirection::Ascending,
            Some(NodeKind::NegIntConst | NodeKind::NegFloatConst) => StepDirection::Descending,
            _ => StepDirection::Ambiguous,
        }
    }

    pub fn comparator(self) -> Option<&'static str> {
        match self {
            StepDirection::Ascending => Some("<="),
            StepDirection::Descending => Some(">="),
            StepDirection::Ambiguous => Some("!="),
            StepDirection::Dynamic => None,
        }
    }
}

impl<'a, W: fmt::Write> CCodeGenerator<'a, W> {
    /// `for (i = init; guard; i = i + (step))` followed by the braced body.
    pub(crate) fn for_statement(&mut self, node: &Node, level: usize) -> Result<(), CodegenError> {
        let assign = required(node.first(), node.kind, "missing iterator assignment")?;
        if assign.kind != NodeKind::ForAssign {
            return Err(CodegenError::malformed(assign.kind, "expected a FOR assignment"));
        }
        let (id, iterator) = self.target(required(assign.first(), assign.kind, "missing iterator")?)?;
        let init = self.expression_phrase(required(assign.second(), assign.kind, "missing initial value")?)?;
        self.check_assignment(id, init.ty, "FOR loop")?;
        self.mark_initialized(id);

        let location = self.symbols.get(id).and_then(|record| record.location);
        if self.declared_type(id)? == SymbolType::Real {
            self.warn(Warning {
                kind: WarningKind::RealLoopIterator { iterator: iterator.clone() },
                location,
            });
        }

        let properties = required(node.second(), node.kind, "missing loop properties")?;
        if properties.kind != NodeKind::ForProperties {
            return Err(CodegenError::malformed(properties.kind, "expected FOR properties"));
        }
        let step_node = required(properties.first(), properties.kind, "missing step")?;
        let direction = StepDirection::classify(step_node);
        let step = self.expression_phrase(step_node)?;
        let limit = self.expression_phrase(required(properties.second(), properties.kind, "missing limit")?)?;

        if direction == StepDirection::Ambiguous {
            self.warn(Warning {
                kind: WarningKind::AmbiguousStepDirection { iterator: iterator.clone() },
                location,
            });
        }
        let guard = match direction.comparator() {
            Some(comparator) => format!("{} {} {}", iterator, comparator, limit.text),
            None => format!(
                "({step} > 0 ? {i} - ({limit}) : ({limit}) - {i}) <= 0",
                step = step.text,
                i = iterator,
                limit = limit.text
            ),
        };
        log::trace!("FOR loop over \"{}\" steps {:?}", iterator, direction);

        write!(
            self.out,
            "for ({i} = {init}; {guard}; {i} = {i} + ({step}))",
            i = iterator,
            init = init.text,
            guard = guard,
            step = step.text
        )?;
        self.loop_body(required(node.third(), node.kind, "missing loop body")?, level)
    }
}
