use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A knowledge-base entry.
///
/// `name` is the lookup and deletion key; it is not required to be unique.
/// `description` is the text that gets embedded. Fields other than the known
/// optional ones, and known optional fields of an unexpected type, are preserved
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: None,
            author: None,
            year: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>, year: Option<i32>) -> Self {
        self.author = Some(author.into());
        self.year = year;
        self
    }

    /// Parse an untrusted JSON body. Returns `None` unless it is an object with
    /// non-blank string `name` and `description`.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let doc = Self::from_map(map).ok()?;
        doc.is_valid().then_some(doc)
    }

    /// `category`, `author` and `year` that do not fit their typed slot move to
    /// `extra` instead of failing the whole document.
    fn from_map(mut map: serde_json::Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut mistyped = serde_json::Map::new();
        for key in ["category", "author", "year"] {
            let fits = match map.get(key) {
                None | Some(Value::Null) => true,
                Some(Value::String(_)) => key != "year",
                Some(Value::Number(n)) => {
                    key == "year" && n.as_i64().is_some_and(|y| i32::try_from(y).is_ok())
                }
                Some(_) => false,
            };
            if !fits && let Some(value) = map.remove(key) {
                mistyped.insert(key.to_owned(), value);
            }
        }
        let mut doc: Self = serde_json::from_value(Value::Object(map))?;
        doc.extra.extend(mistyped);
        Ok(doc)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// One line of retrieval context, e.g. `1984 by George Orwell (1949): ...`.
    #[must_use]
    pub fn context_line(&self) -> String {
        let mut line = self.name.clone();
        if let Some(ref author) = self.author {
            let _ = write!(line, " by {author}");
        }
        if let Some(year) = self.year {
            let _ = write!(line, " ({year})");
        }
        if let Some(ref category) = self.category {
            let _ = write!(line, " [{category}]");
        }
        let _ = write!(line, ": {}", self.description);
        line
    }

    /// # Errors
    ///
    /// Returns an error if the document cannot be represented as a JSON object.
    pub fn to_payload(&self) -> Result<HashMap<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(serde::ser::Error::custom(format!(
                "document serialized to non-object: {other}"
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the payload lacks `name` or `description`.
    pub fn from_payload(payload: HashMap<String, Value>) -> Result<Self, serde_json::Error> {
        Self::from_map(payload.into_iter().collect())
    }
}
