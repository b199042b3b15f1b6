#![allow(dead_code)]

use c_backend::{CCodeGenerator, CodegenError, Warning};
use frontend::{AstBuilder, Node, SymbolTable, SymbolType};

pub const HEADER: &str = "#include <stdio.h>\n\nvoid demo(void);\n\nint main(void) { demo(); return 0; }\n\nvoid demo(void)\n{";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `PROGRAM demo` with the given declarations and statements.
pub fn program(b: &mut AstBuilder, declarations: Vec<Box<Node>>, statements: Vec<Box<Node>>) -> Box<Node> {
    let declarations = b.declarations(declarations);
    let statements = b.statements(statements);
    let block = b.block(declarations, statements);
    b.program("demo", block).unwrap()
}

pub fn generate(tree: &Node, symbols: &mut SymbolTable) -> Result<(String, Vec<Warning>), CodegenError> {
    init_logger();
    let mut generator = CCodeGenerator::new(symbols, String::new());
    generator.generate(Some(tree), 0)?;
    let warnings = generator.take_warnings();
    Ok((generator.into_output(), warnings))
}

pub fn compile(b: AstBuilder, tree: &Node) -> Result<String, CodegenError> {
    let mut symbols = b.into_symbols();
    generate(tree, &mut symbols).map(|(code, _)| code)
}

/// Lines of the generated procedure body, without the braces around it.
pub fn body(code: &str) -> Vec<String> {
    let inner = code
        .strip_prefix(HEADER)
        .and_then(|rest| rest.strip_suffix("\n}\n"))
        .unwrap_or_else(|| panic!("unexpected program layout:\n{}", code));
    inner.lines().skip(1).map(str::to_string).collect()
}

/// A literal value of type `ty`.
pub fn value_of(b: &mut AstBuilder, ty: SymbolType) -> Box<Node> {
    match ty {
        SymbolType::Char => b.char_value(b'a'),
        SymbolType::Int => b.int_value(5),
        SymbolType::Real => {
            let literal = b.real("1.5").unwrap();
            b.constant(literal)
        }
    }
}
