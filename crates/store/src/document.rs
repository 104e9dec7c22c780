use async_trait::async_trait;
use llego_common::Result;
use serde_json::Value;

/// Raw document as returned by a store
///
/// Always a JSON object whose `_id` is the canonical string identifier.
/// Store-native id types (ObjectId) and dates are converted at the store
/// boundary, so entity types only ever see strings and RFC 3339 timestamps.
pub type Document = Value;

/// Scalar value a filter can match on
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Query filter understood by every store backend
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value
    Eq { field: String, value: FieldValue },

    /// Case-insensitive literal substring match on any of the fields
    Contains { fields: Vec<String>, text: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(fields: &[&str], text: impl Into<String>) -> Self {
        Self::Contains {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            text: text.into(),
        }
    }

    /// Evaluate the filter against a raw document
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq { field, value } => match (document.get(field), value) {
                (Some(Value::String(s)), FieldValue::Str(expected)) => s == expected,
                (Some(Value::Bool(b)), FieldValue::Bool(expected)) => b == expected,
                _ => false,
            },
            Self::Contains { fields, text } => {
                let needle = text.to_lowercase();
                fields.iter().any(|field| {
                    document
                        .get(field)
                        .and_then(Value::as_str)
                        .map(|s| s.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        }
    }
}

/// Document database seam
///
/// Not-found is never an error: lookups return `None` or omit the id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Single document by canonical id
    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Documents whose id is in `ids`, in no particular order
    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Documents matching a filter
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// Insert a new document and return its canonical id
    async fn insert(&self, collection: &str, document: Document) -> Result<String>;

    /// Liveness check
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter() {
        let doc = json!({"_id": "p1", "branchId": "b1", "availability": true});
        assert!(Filter::eq("branchId", "b1").matches(&doc));
        assert!(!Filter::eq("branchId", "b2").matches(&doc));
        assert!(Filter::eq("availability", true).matches(&doc));
        assert!(!Filter::eq("availability", "true").matches(&doc));
        assert!(!Filter::eq("missing", "x").matches(&doc));
    }

    #[test]
    fn test_contains_is_case_insensitive_and_literal() {
        let doc = json!({"name": "Café Central", "address": "Calle 23 (Vedado)"});
        assert!(Filter::contains(&["name", "address"], "central").matches(&doc));
        assert!(Filter::contains(&["name", "address"], "(VEDADO)").matches(&doc));
        assert!(!Filter::contains(&["name"], "vedado").matches(&doc));
        assert!(!Filter::contains(&["name"], ".*").matches(&doc));
    }
}
