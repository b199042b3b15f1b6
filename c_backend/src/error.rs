use std::fmt;
use frontend::{NodeKind, SourceLocation, SymbolTableError, SymbolType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenErrorKind {
    #[error("variable with identifier \"{name}\" has already been declared")]
    DuplicateDeclaration { name: String },
    #[error("unknown identifier \"{name}\"")]
    UndeclaredIdentifier { name: String },
    #[error("invalid assignment: \"{name}\" is {declared} but the assigned value is {assigned}")]
    InvalidAssignment {
        name: String,
        declared: SymbolType,
        assigned: SymbolType,
    },
    #[error("attempt to WRITE uninitialised variable \"{name}\"")]
    UninitializedVariable { name: String },
    #[error("symbol index {index} is not in the symbol table")]
    UnknownSymbol { index: i32 },
    #[error("malformed {kind:?} node: {reason}")]
    MalformedTree { kind: NodeKind, reason: &'static str },
    #[error(transparent)]
    Symbols(#[from] SymbolTableError),
    #[error("failed to write generated code")]
    Fmt(#[from] fmt::Error),
}

/// A fatal code generation error. Generation stops at the first one.
#[derive(Debug)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub context: Option<String>,
    pub location: Option<SourceLocation>,
}

impl CodegenError {
    fn new(kind: CodegenErrorKind) -> Self {
        Self {
            kind,
            context: None,
            location: None,
        }
    }

    pub fn duplicate_declaration(name: &str) -> Self {
        Self::new(CodegenErrorKind::DuplicateDeclaration { name: name.to_string() })
    }

    pub fn undeclared_identifier(name: &str) -> Self {
        Self::new(CodegenErrorKind::UndeclaredIdentifier { name: name.to_string() })
    }

    pub fn invalid_assignment(name: &str, declared: SymbolType, assigned: SymbolType) -> Self {
        Self::new(CodegenErrorKind::InvalidAssignment {
            name: name.to_string(),
            declared,
            assigned,
        })
    }

    pub fn uninitialized_variable(name: &str) -> Self {
        Self::new(CodegenErrorKind::UninitializedVariable { name: name.to_string() })
    }

    pub fn unknown_symbol(index: i32) -> Self {
        Self::new(CodegenErrorKind::UnknownSymbol { index })
    }

    pub fn malformed(kind: NodeKind, reason: &'static str) -> Self {
        Self::new(CodegenErrorKind::MalformedTree { kind, reason })
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }

    /// Attaches a source position. `None` leaves the error unchanged.
    pub fn with_location(mut self, location: impl Into<Option<SourceLocation>>) -> Self {
        if let Some(location) = location.into() {
            self.location = Some(location);
        }
        self
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " (in {})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<CodegenErrorKind> for CodegenError {
    fn from(kind: CodegenErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<fmt::Error> for CodegenError {
    fn from(error: fmt::Error) -> Self {
        Self::new(CodegenErrorKind::Fmt(error))
    }
}

impl From<SymbolTableError> for CodegenError {
    fn from(error: SymbolTableError) -> Self {
        Self::new(CodegenErrorKind::Symbols(error))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    AmbiguousStepDirection { iterator: String },
    RealLoopIterator { iterator: String },
}

/// Advisory diagnostic. Generation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        match &self.kind {
            WarningKind::AmbiguousStepDirection { iterator } => write!(
                f,
                "could not tell the direction of the BY clause of the FOR loop over \"{}\", using \"!=\"",
                iterator
            ),
            WarningKind::RealLoopIterator { iterator } => write!(
                f,
                "iterator \"{}\" defined as type REAL may cause the FOR loop to run perpetually",
                iterator
            ),
        }
    }
}
