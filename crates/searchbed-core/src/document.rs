//! Fixture document model
//!
//! Tests declare their backend contents declaratively: a [`FixtureSet`] maps
//! manager names to [`DocumentsByType`], which maps document-type names to
//! ordered sequences of [`Document`]s. Order within a type's sequence is
//! preserved on bulk submission; order across types carries no meaning.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved identity field name. Optional on every document.
pub const ID_FIELD: &str = "id";

/// A single fixture document: a field-name → value mapping.
///
/// Field insertion order is retained so serialized fixtures stay stable,
/// but no harness semantics depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field, replacing any existing value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The reserved identity field, if present.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Ordered documents grouped by document-type name.
pub type DocumentsByType = IndexMap<String, Vec<Document>>;

/// Declarative fixture input: manager name → documents by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureSet {
    by_manager: IndexMap<String, DocumentsByType>,
}

impl FixtureSet {
    /// Create an empty fixture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to the sequence for `(manager, doc_type)`,
    /// preserving declaration order.
    pub fn add(
        &mut self,
        manager: impl Into<String>,
        doc_type: impl Into<String>,
        document: Document,
    ) {
        self.by_manager
            .entry(manager.into())
            .or_default()
            .entry(doc_type.into())
            .or_default()
            .push(document);
    }

    /// Builder-style variant of [`add`](Self::add).
    #[must_use]
    pub fn with(
        mut self,
        manager: impl Into<String>,
        doc_type: impl Into<String>,
        document: Document,
    ) -> Self {
        self.add(manager, doc_type, document);
        self
    }

    /// The documents declared for one manager, if any.
    #[must_use]
    pub fn for_manager(&self, manager: &str) -> Option<&DocumentsByType> {
        self.by_manager.get(manager)
    }

    /// Whether no manager has fixture entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_manager.is_empty()
    }

    /// Manager names that have fixture entries, in declaration order.
    pub fn managers(&self) -> impl Iterator<Item = &String> {
        self.by_manager.keys()
    }
}

/// Total number of documents in a [`DocumentsByType`] mapping.
#[must_use]
pub fn document_count(docs: &DocumentsByType) -> usize {
    docs.values().map(Vec::len).sum()
}
