use frontend::{SymbolId, SymbolTable};
use crate::error::CodegenError;

/// C89 keywords, plus the names the generated translation unit defines or calls.
pub const RESERVED_WORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else", "enum",
    "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short", "signed",
    "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void", "volatile",
    "while", "inline", "restrict", "main", "printf", "scanf", "putchar",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Produces `<prefix><counter>` names that no symbol in the table uses yet.
/// The counter only moves forward, so a name is never handed out twice.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix: char,
    counter: u32,
}

impl NameGenerator {
    pub fn new(prefix: char) -> Self {
        Self { prefix, counter: 0 }
    }

    pub fn fresh(&mut self, symbols: &SymbolTable) -> String {
        loop {
            let candidate = format!("{}{}", self.prefix, self.counter);
            self.counter = self.counter.wrapping_add(1);
            if symbols.find(&candidate).is_none() && !is_reserved(&candidate) {
                return candidate;
            }
        }
    }
}

/// Renames `id` when its text is a reserved word. Runs at most once per symbol; later
/// calls return the name chosen the first time.
pub fn sanitize(symbols: &mut SymbolTable, id: SymbolId, names: &mut NameGenerator) -> Result<String, CodegenError> {
    let record = symbols.get(id).ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
    let already_done = record.sanitized;
    let name = symbols
        .name(id)
        .map(str::to_owned)
        .ok_or_else(|| CodegenError::unknown_symbol(id.as_item()))?;
    if already_done {
        return Ok(name);
    }

    let name = if is_reserved(&name) {
        let fresh = names.fresh(symbols);
        symbols.rename(id, &fresh);
        log::debug!("renamed identifier \"{}\" to \"{}\"", name, fresh);
        fresh
    } else {
        name
    };
    if let Some(record) = symbols.get_mut(id) {
        record.sanitized = true;
    }
    Ok(name)
}
