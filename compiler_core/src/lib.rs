use std::fmt;
use std::io;
use std::path::Path;
use c_backend::{CCodeGenerator, CodegenError, CodegenOptions, Warning};
use frontend::{AstBuilder, Node, OptimizeStats, Optimizer, OptimizerOptions, SymbolTable, Tree};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error("failed to write generated C: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Run the optimizer before generating code.
    pub optimize: bool,
    pub optimizer: OptimizerOptions,
    pub codegen: CodegenOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            optimizer: OptimizerOptions::default(),
            codegen: CodegenOptions::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerOptions) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_codegen(mut self, codegen: CodegenOptions) -> Self {
        self.codegen = codegen;
        self
    }
}

/// Compiler session that owns the global symbol table for one program.
///
/// The parser fills the table while building the tree; the session then runs the
/// optimizer and the C generator against that same table and hands the generated text
/// to a sink. Nothing is written to a sink unless generation succeeds.
#[derive(Debug)]
pub struct CompilerSession {
    symbols: SymbolTable,
    config: SessionConfig,
    warnings: Vec<Warning>,
    last_stats: Option<OptimizeStats>,
}

impl CompilerSession {
    pub fn new(symbols: SymbolTable) -> Self {
        Self::with_config(symbols, SessionConfig::default())
    }

    pub fn with_config(symbols: SymbolTable, config: SessionConfig) -> Self {
        Self {
            symbols,
            config,
            warnings: Vec::new(),
            last_stats: None,
        }
    }

    /// Takes over the table a builder populated.
    pub fn from_builder(builder: AstBuilder) -> Self {
        Self::new(builder.into_symbols())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the optimizer over `tree` with the session's options.
    pub fn optimise(&mut self, tree: &mut Tree) -> OptimizeStats {
        let stats = Optimizer::with_options(&self.symbols, self.config.optimizer).run(tree);
        self.last_stats = Some(stats);
        stats
    }

    /// Generates C for `tree` into `out`. Warnings from this run replace earlier ones.
    pub fn generate<W: fmt::Write>(&mut self, tree: Option<&Node>, out: W) -> Result<W, CodegenError> {
        let mut generator = CCodeGenerator::with_options(&mut self.symbols, out, self.config.codegen);
        let result = generator.generate(tree, 0);
        self.warnings = generator.take_warnings();
        result?;
        Ok(generator.into_output())
    }

    pub fn compile_to_string(&mut self, mut tree: Tree) -> Result<String, CompileError> {
        if self.config.optimize {
            self.optimise(&mut tree);
        }
        let code = self.generate(tree.as_deref(), String::new())?;
        log::debug!("generated {} bytes of C", code.len());
        Ok(code)
    }

    pub fn compile_to_writer<W: io::Write>(&mut self, tree: Tree, writer: &mut W) -> Result<(), CompileError> {
        let code = self.compile_to_string(tree)?;
        writer.write_all(code.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn compile_to_path<P: AsRef<Path>>(&mut self, tree: Tree, path: P) -> Result<(), CompileError> {
        let code = self.compile_to_string(tree)?;
        std::fs::write(path.as_ref(), code)?;
        log::info!("wrote {}", path.as_ref().display());
        Ok(())
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Statistics of the most recent optimizer run, if any.
    pub fn last_stats(&self) -> Option<OptimizeStats> {
        self.last_stats
    }
}
