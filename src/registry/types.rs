//! Remote bank directory entries

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::validation::is_valid_bank_prefix;

/// A bank known to the central directory
///
/// Wire format follows the central directory (`bankPrefix`, `transactionUrl`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBank {
    pub bank_prefix: String,
    pub name: String,
    pub transaction_url: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<String>,
    pub jwks_url: String,
}

/// Lenient view of one directory entry; every field may be absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRemoteBank {
    bank_prefix: Option<String>,
    name: Option<String>,
    transaction_url: Option<String>,
    api_key: Option<String>,
    // Directories send a name, a list of names or nothing
    owners: Option<serde_json::Value>,
    jwks_url: Option<String>,
}

/// Why a directory entry was left out of the snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryRejection {
    #[error("entry is not a valid bank object: {0}")]
    Malformed(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid bank prefix '{0}'")]
    InvalidPrefix(String),

    #[error("duplicate bank prefix '{0}'")]
    DuplicatePrefix(String),
}

fn required(value: Option<String>, field: &'static str) -> Result<String, EntryRejection> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EntryRejection::MissingField(field)),
    }
}

/// Render `owners` as display text; unusable shapes are dropped, never fatal
fn owners_text(value: Option<serde_json::Value>) -> Option<String> {
    let text = match value? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null | serde_json::Value::Object(_) => return None,
        other => other.to_string(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl TryFrom<RawRemoteBank> for RemoteBank {
    type Error = EntryRejection;

    fn try_from(raw: RawRemoteBank) -> Result<Self, Self::Error> {
        let bank_prefix = required(raw.bank_prefix, "bankPrefix")?;
        if !is_valid_bank_prefix(&bank_prefix) {
            return Err(EntryRejection::InvalidPrefix(bank_prefix));
        }

        Ok(RemoteBank {
            bank_prefix,
            name: required(raw.name, "name")?,
            transaction_url: required(raw.transaction_url, "transactionUrl")?,
            api_key: required(raw.api_key, "apiKey")?,
            owners: owners_text(raw.owners),
            jwks_url: required(raw.jwks_url, "jwksUrl")?,
        })
    }
}

impl RemoteBank {
    /// Parse and validate one entry from the directory response
    pub fn from_json(value: serde_json::Value) -> Result<Self, EntryRejection> {
        let raw: RawRemoteBank = serde_json::from_value(value)
            .map_err(|e| EntryRejection::Malformed(e.to_string()))?;
        RemoteBank::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo_bank() -> serde_json::Value {
        json!({
            "name": "fooBank",
            "transactionUrl": "http://foobank.example/transactions/b2b",
            "apiKey": "94d21b14-b77b-402d-a2f5-35f85889d480",
            "bankPrefix": "755",
            "owners": "Henno",
            "jwksUrl": "http://foobank.example/jwks.json"
        })
    }

    #[test]
    fn test_parse_valid_entry() {
        let bank = RemoteBank::from_json(foo_bank()).unwrap();
        assert_eq!(bank.bank_prefix, "755");
        assert_eq!(bank.name, "fooBank");
        assert_eq!(bank.owners.as_deref(), Some("Henno"));
    }

    #[test]
    fn test_owners_is_optional() {
        let mut value = foo_bank();
        value.as_object_mut().unwrap().remove("owners");
        let bank = RemoteBank::from_json(value).unwrap();
        assert!(bank.owners.is_none());
    }

    #[test]
    fn test_owners_list_is_joined() {
        let mut value = foo_bank();
        value["owners"] = json!(["Henno", "Kerli", ""]);
        let bank = RemoteBank::from_json(value).unwrap();
        assert_eq!(bank.owners.as_deref(), Some("Henno, Kerli"));
    }

    #[test]
    fn test_odd_owners_shape_keeps_bank() {
        for owners in [json!({"lead": "Henno"}), json!(null), json!([]), json!("  ")] {
            let mut value = foo_bank();
            value["owners"] = owners;
            let bank = RemoteBank::from_json(value).unwrap();
            assert_eq!(bank.bank_prefix, "755");
            assert!(bank.owners.is_none());
        }
    }

    #[test]
    fn test_missing_required_field() {
        for field in ["bankPrefix", "name", "transactionUrl", "apiKey", "jwksUrl"] {
            let mut value = foo_bank();
            value.as_object_mut().unwrap().remove(field);
            assert_eq!(
                RemoteBank::from_json(value),
                Err(EntryRejection::MissingField(field)),
                "field {field}"
            );
        }
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let mut value = foo_bank();
        value["apiKey"] = json!("  ");
        assert_eq!(
            RemoteBank::from_json(value),
            Err(EntryRejection::MissingField("apiKey"))
        );
    }

    #[test]
    fn test_invalid_prefix() {
        let mut value = foo_bank();
        value["bankPrefix"] = json!("75");
        assert_eq!(
            RemoteBank::from_json(value),
            Err(EntryRejection::InvalidPrefix("75".to_string()))
        );
    }

    #[test]
    fn test_malformed_entries() {
        assert!(matches!(
            RemoteBank::from_json(json!("not an object")),
            Err(EntryRejection::Malformed(_))
        ));

        let mut value = foo_bank();
        value["name"] = json!(42);
        assert!(matches!(
            RemoteBank::from_json(value),
            Err(EntryRejection::Malformed(_))
        ));
    }
}
