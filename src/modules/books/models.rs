use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A book as exchanged over the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier, assigned by the server when left empty
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    /// Title of the book
    pub name: String,
    /// Author of the book
    pub author: String,
    pub isbn: String,
    pub genre: String,
}

impl Book {
    /// Assign a fresh random id unless the client supplied one.
    pub fn with_generated_id(mut self) -> Self {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        self
    }

    /// Same record under a different id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// `"id": null` reads the same as an absent id.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
