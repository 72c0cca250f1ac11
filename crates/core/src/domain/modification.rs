// Modification Request - field-level diff sent to the server

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::{DomainError, Result};

/// Managed object identifier
pub type ObjectId = u32;

/// Field-level diff for one managed object
///
/// Pages only set the fields the operator actually changed. The runner never
/// looks inside; the session decides how to encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationRequest {
    object_id: ObjectId,
    fields: BTreeMap<String, serde_json::Value>,
}

impl ModificationRequest {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            fields: BTreeMap::new(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Set a field, replacing any previous value for it
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> &mut Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Builder form of [`ModificationRequest::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject requests that would be a no-op round-trip
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(DomainError::EmptyModification(self.object_id));
        }
        Ok(())
    }
}
