//! Building documents
//!
//! A building is an opaque JSON object. The only rule is that the body must
//! be an object; identity lives in `_id` and is always server-assigned.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::ValidationError;

/// Key under which a building's identity is serialized
pub const ID_KEY: &str = "_id";

/// Validated building document body (never contains `_id`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingDoc(Map<String, Value>);

impl BuildingDoc {
    /// Validate a single document body.
    ///
    /// # Example
    /// ```
    /// use indoormap_server::models::BuildingDoc;
    /// use serde_json::json;
    ///
    /// assert!(BuildingDoc::new(json!({"name": "Library"})).is_ok());
    /// assert!(BuildingDoc::new(json!(["Library"])).is_err());
    /// ```
    pub fn new(value: Value) -> Result<Self, ValidationError> {
        Self::parse(value, None)
    }

    /// Validate a batch. Fails on the first non-object so nothing is
    /// handed to the store unless every document is valid.
    pub fn batch(values: Vec<Value>) -> Result<Vec<Self>, ValidationError> {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| Self::parse(value, Some(index)))
            .collect()
    }

    fn parse(value: Value, index: Option<usize>) -> Result<Self, ValidationError> {
        match value {
            Value::Object(mut fields) => {
                fields.remove(ID_KEY);
                Ok(Self(fields))
            }
            _ => Err(ValidationError::NotAnObject { index }),
        }
    }

    /// Overwrite the attributes named in `patch`, keeping the rest.
    pub fn merge(&mut self, patch: &BuildingDoc) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Stored building: identity plus document body
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: Uuid,
    pub doc: BuildingDoc,
}

impl Building {
    /// Rebuild a building from a stored JSONB body. A body that is not an
    /// object is rejected rather than read as empty.
    pub fn from_stored(id: Uuid, value: Value) -> Result<Self, ValidationError> {
        let doc = BuildingDoc::new(value)?;
        Ok(Self { id, doc })
    }
}

impl Serialize for Building {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.doc.fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry(ID_KEY, &self.id)?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
