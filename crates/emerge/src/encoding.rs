//! Translating between attribute ids and the categorical values they encode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::AttributeId;

/// A human-readable label for an attribute: the column it came from and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnValue {
    /// The name of the column.
    pub column: String,
    /// The categorical value.
    pub value: String,
}

impl ColumnValue {
    /// Create a new label.
    pub fn new<C: Into<String>, V: Into<String>>(column: C, value: V) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// The label used for an id that the decoder does not know.
    #[must_use]
    pub fn unknown(id: AttributeId) -> Self {
        Self::new("<unknown>", id.to_string())
    }
}

impl core::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

/// Decodes attribute ids for display in explanations.
pub trait AttributeDecoder {
    /// The label of `id`, if it is known.
    fn decode(&self, id: AttributeId) -> Option<ColumnValue>;

    /// The labels of several ids. Unknown ids get `ColumnValue::unknown`.
    fn decode_all(&self, ids: &[AttributeId]) -> Vec<ColumnValue> {
        ids.iter()
            .map(|&id| self.decode(id).unwrap_or_else(|| ColumnValue::unknown(id)))
            .collect()
    }
}

/// Assigns dense ids to `(column, value)` pairs in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct AttributeEncoder {
    /// The id of each known label.
    ids: HashMap<ColumnValue, AttributeId>,
    /// The label of each id, indexed by id.
    labels: Vec<ColumnValue>,
}

impl AttributeEncoder {
    /// Return the id of `(column, value)`, assigning a new one if needed.
    ///
    /// # Panics
    ///
    /// * If more than `u32::MAX` distinct values are encoded.
    pub fn encode(&mut self, column: &str, value: &str) -> AttributeId {
        let label = ColumnValue::new(column, value);
        if let Some(&id) = self.ids.get(&label) {
            return id;
        }

        let id = AttributeId::try_from(self.labels.len())
            .unwrap_or_else(|_| unreachable!("attribute ids are exhausted"));
        self.ids.insert(label.clone(), id);
        self.labels.push(label);
        id
    }

    /// The id of `(column, value)` if it was encoded.
    #[must_use]
    pub fn id_of(&self, column: &str, value: &str) -> Option<AttributeId> {
        self.ids.get(&ColumnValue::new(column, value)).copied()
    }

    /// The number of distinct values encoded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether nothing has been encoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl AttributeDecoder for AttributeEncoder {
    fn decode(&self, id: AttributeId) -> Option<ColumnValue> {
        self.labels.get(id as usize).cloned()
    }
}
