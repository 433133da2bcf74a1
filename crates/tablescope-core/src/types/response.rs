use serde::{Deserialize, Serialize};
use std::fmt;

/// Lineage-relevant kind of a parsed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Truncate,
    Select,
    /// A bare `CALL proc(...)` statement.
    FunctionCall,
    CreateTable,
    CreateView,
    /// Recognised by the parser, ignored for lineage.
    Other,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Select => "SELECT",
            Self::FunctionCall => "FUNCTION_CALL",
            Self::CreateTable => "CREATE_TABLE",
            Self::CreateView => "CREATE_VIEW",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function or procedure as referenced in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    pub name: String,
    pub arg_count: usize,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, arg_count: usize) -> Self {
        Self {
            name: name.into(),
            arg_count,
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arg_count)
    }
}

/// Tables and functions found in one statement, by role.
///
/// Names are raw: quoting and qualification are exactly as the parser
/// rendered them. Each list is duplicate-free in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementLineage {
    pub kind: StatementKind,
    pub reads: Vec<String>,
    pub writes: Vec<String>,
    pub creates: Vec<String>,
    pub functions: Vec<FunctionSignature>,
}

impl StatementLineage {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            reads: Vec::new(),
            writes: Vec::new(),
            creates: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub(crate) fn add_read(&mut self, name: String) {
        push_unique(&mut self.reads, name);
    }

    pub(crate) fn add_write(&mut self, name: String) {
        push_unique(&mut self.writes, name);
    }

    pub(crate) fn add_create(&mut self, name: String) {
        push_unique(&mut self.creates, name);
    }

    pub(crate) fn add_function(&mut self, signature: FunctionSignature) {
        push_unique(&mut self.functions, signature);
    }

    /// True when the statement contributes nothing to lineage.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
            && self.writes.is_empty()
            && self.creates.is_empty()
            && self.functions.is_empty()
    }
}

/// Lineage accumulated by a session over one or more scripts.
///
/// Every list is duplicate-free (exact, case-sensitive comparison) and keeps
/// the order in which entries were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageResult {
    pub tables_read: Vec<String>,
    pub tables_written: Vec<String>,
    pub tables_created: Vec<String>,
    pub functions: Vec<FunctionSignature>,
}

impl LineageResult {
    /// Returns `true` if the name was not already present.
    pub fn add_read(&mut self, name: String) -> bool {
        push_unique(&mut self.tables_read, name)
    }

    pub fn add_written(&mut self, name: String) -> bool {
        push_unique(&mut self.tables_written, name)
    }

    pub fn add_created(&mut self, name: String) -> bool {
        push_unique(&mut self.tables_created, name)
    }

    pub fn add_function(&mut self, signature: FunctionSignature) -> bool {
        push_unique(&mut self.functions, signature)
    }

    pub fn is_empty(&self) -> bool {
        self.tables_read.is_empty()
            && self.tables_written.is_empty()
            && self.tables_created.is_empty()
            && self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables_read.clear();
        self.tables_written.clear();
        self.tables_created.clear();
        self.functions.clear();
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        false
    } else {
        list.push(item);
        true
    }
}
