use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A single ticket booking recorded on the ledger.
///
/// Fields are taken as given; the ledger never inspects their content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub holder: String,
    pub resource_id: String,
    pub sub_resource_id: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
}

impl Transaction {
    pub fn new(
        holder: impl Into<String>,
        resource_id: impl Into<String>,
        sub_resource_id: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            holder: holder.into(),
            resource_id: resource_id.into(),
            sub_resource_id: sub_resource_id.into(),
            date: date.into(),
        }
    }

    pub(crate) fn canonical_value(&self) -> Value {
        json!({
            "holder": self.holder,
            "resource_id": self.resource_id,
            "sub_resource_id": self.sub_resource_id,
            "date": self.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Transaction::new("Alice", "B123", "A1", "2024-05-01");
        let b = Transaction::new("Alice".to_string(), "B123", "A1", "2024-05-01");
        assert_eq!(a, b);
        assert_ne!(a, Transaction::new("Alice", "B123", "A2", "2024-05-01"));
    }

    #[test]
    fn serializes_with_external_field_names() {
        let tx = Transaction::new("Alice", "B123", "A1", "2024-05-01");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["holder"], "Alice");
        assert_eq!(value["resource_id"], "B123");
        assert_eq!(value["sub_resource_id"], "A1");
        assert_eq!(value["date"], "2024-05-01");
    }
}
