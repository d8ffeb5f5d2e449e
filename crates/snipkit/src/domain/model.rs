//! Domain models for snippet records and the execution environment.

use std::collections::BTreeMap;

use crate::domain::keyseq::KeySequence;

/// Namespace prefix for every snippet-derived command.
pub const NAMESPACE: &str = "Snippets";
/// Separator between the namespace and the command label.
pub const SEPARATOR: char = '\\';
/// File extension a snippet file must carry to be registered.
pub const SNIPPET_EXTENSION: &str = "py";

pub const EDITOR_ACTION: &str = "Snippets\\Snippet Editor...";
pub const RERUN_ACTION: &str = "Snippets\\Rerun Last Snippet";
pub const RELOAD_ACTION: &str = "Snippets\\Reload All Snippets";

/// Commands that survive every registry rebuild.
pub const PERMANENT_ACTIONS: [&str; 3] = [EDITOR_ACTION, RERUN_ACTION, RELOAD_ACTION];

/// Parsed form of a snippet file: two header lines plus the raw body.
///
/// A file with fewer than three lines, or one that cannot be read at all,
/// parses to the all-empty record. That record means "nothing to register",
/// never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetRecord {
    pub description: Option<String>,
    pub hotkey: Option<KeySequence>,
    pub body: String,
}

impl SnippetRecord {
    /// The "not a real snippet" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this record is the inert sentinel.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.hotkey.is_none() && self.body.is_empty()
    }
}

/// Opaque identifier for an object owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub u64);

/// A value bound to a name in a snippet's execution environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Present but absent, mirroring an unset host field.
    Null,
    Address(u64),
    /// Half-open `(start, end)` pair.
    Range(u64, u64),
    Text(String),
    Object(ObjectRef),
}

impl Value {
    pub fn as_address(&self) -> Option<u64> {
        match self {
            Value::Address(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Name → value mapping a compiled snippet resolves its free variables
/// against. Owned by a single invocation and mutable while it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
