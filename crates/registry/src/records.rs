//! Wire records returned by the registries and their normalized form.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

/// How a person record points at its company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRef {
    pub name: String,
    pub country: String,
}

/// A company as the fetcher stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryCompany {
    pub external_id: String,
    pub name: String,
    pub vat: Option<String>,
    pub country: String,
    pub group_code: &'static str,
    pub status: String,
    pub representative_name: Option<String>,
    pub representative_vat: Option<String>,
    pub representative_country_name: Option<String>,
    pub check_passed: Option<bool>,
    /// Usernames of persons linked from the company side (ECR).
    pub usernames: Vec<String>,
}

/// A contact person as the fetcher stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryPerson {
    pub username: String,
    pub name: String,
    pub email: String,
    /// Company referenced from the person side (BDR, FGases).
    pub company: Option<CompanyRef>,
}

/// A record that could not be normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub key: String,
    pub reason: String,
}

impl Rejected {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared wire pieces
// ---------------------------------------------------------------------------

/// EU representative block of a non-EU company.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireRepresentative {
    pub name: Option<String>,
    #[serde(alias = "vat")]
    pub vatnumber: Option<String>,
    pub address: Option<WireAddress>,
    pub country_name: Option<String>,
}

impl WireRepresentative {
    /// Country name, from the nested address when present.
    pub fn country(&self) -> Option<String> {
        self.address
            .as_ref()
            .map(|a| a.country.name.clone())
            .or_else(|| self.country_name.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireAddress {
    pub country: WireCountry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCountry {
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub country_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub username: String,
}

/// Registries disagree on whether ids are strings or numbers.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Decode every element of a registry list separately.
///
/// An element that does not match `T` becomes a [`Rejected`] keyed by its
/// `key_field` (or its position when that is missing), and the rest of the
/// list is kept.
pub fn decode_each<T: DeserializeOwned>(
    values: Vec<Value>,
    key_field: &str,
) -> Vec<Result<T, Rejected>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let key = record_key(&value, key_field).unwrap_or_else(|| format!("#{index}"));
            serde_json::from_value(value)
                .map_err(|e| Rejected::new(key, format!("invalid record: {e}")))
        })
        .collect()
}

fn record_key(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Trim and turn blank strings into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
