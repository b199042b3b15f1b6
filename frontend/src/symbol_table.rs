use std::fmt;
use string_interner::{DefaultStringInterner, DefaultSymbol};
use thiserror::Error;
use crate::type_decl::SymbolType;

pub const INITIAL_CAPACITY: usize = 2;

/// Index of a record in the global symbol table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts a tree payload into an index, rejecting negative values.
    pub fn from_item(item: i32) -> Option<Self> {
        u32::try_from(item).ok().map(SymbolId)
    }

    pub fn as_item(self) -> i32 {
        self.0 as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolTableError {
    #[error("symbol table storage exhausted while growing to {requested} entries")]
    CapacityExhausted { requested: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord {
    pub name: DefaultSymbol,
    pub ty: Option<SymbolType>,
    pub declared: bool,
    pub initialized: bool,
    pub sanitized: bool,
    pub location: Option<SourceLocation>,
}

impl SymbolRecord {
    pub fn new(name: DefaultSymbol) -> Self {
        Self {
            name,
            ty: None,
            declared: false,
            initialized: false,
            sanitized: false,
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Insertion-ordered storage whose capacity doubles when it fills up.
#[derive(Debug, Clone)]
pub struct DynamicTable<T> {
    entries: Vec<T>,
}

impl<T> DynamicTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Appends `entry` and returns its index.
    pub fn append(&mut self, entry: T) -> Result<usize, SymbolTableError> {
        let in_use = self.entries.len();
        if in_use == self.entries.capacity() {
            let additional = self.entries.capacity().max(INITIAL_CAPACITY);
            self.entries
                .try_reserve_exact(additional)
                .map_err(|_| SymbolTableError::CapacityExhausted { requested: in_use + additional })?;
            log::trace!("symbol table grew from {} to {} slots", in_use, self.entries.capacity());
        }
        self.entries.push(entry);
        Ok(in_use)
    }

    /// Drops the backing storage and starts over at the initial capacity.
    pub fn reset(&mut self) {
        self.entries = Vec::with_capacity(INITIAL_CAPACITY);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<T> Default for DynamicTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The global symbol table: one record per distinct source identifier, addressed by
/// the integer payload of `IdVal` nodes. Real literals are stored here too, with the
/// literal spelling as their text.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    records: DynamicTable<SymbolRecord>,
    string_interner: DefaultStringInterner,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> DefaultSymbol {
        self.string_interner.get_or_intern(text)
    }

    pub fn append(&mut self, record: SymbolRecord) -> Result<SymbolId, SymbolTableError> {
        let index = self.records.append(record)?;
        Ok(SymbolId(index as u32))
    }

    /// Appends a fresh record named `name`.
    pub fn add(&mut self, name: &str) -> Result<SymbolId, SymbolTableError> {
        let name = self.intern(name);
        self.append(SymbolRecord::new(name))
    }

    pub fn add_at(&mut self, name: &str, location: SourceLocation) -> Result<SymbolId, SymbolTableError> {
        let name = self.intern(name);
        self.append(SymbolRecord::new(name).with_location(location))
    }

    /// Returns the lowest index whose text equals `name`.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        let symbol = self.string_interner.get(name)?;
        self.records
            .iter()
            .position(|record| record.name == symbol)
            .map(|index| SymbolId(index as u32))
    }

    pub fn get(&self, id: SymbolId) -> Option<&SymbolRecord> {
        self.records.get(id.index())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut SymbolRecord> {
        self.records.get_mut(id.index())
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        let record = self.get(id)?;
        self.string_interner.resolve(record.name)
    }

    /// Replaces the text of `id`. Returns false when the index is out of range.
    pub fn rename(&mut self, id: SymbolId, name: &str) -> bool {
        let name = self.string_interner.get_or_intern(name);
        match self.records.get_mut(id.index()) {
            Some(record) => {
                record.name = name;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (SymbolId(index as u32), record))
    }

    pub fn reset(&mut self) {
        self.records.reset();
    }
}
