//! API request and response models for the lead relay endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Shortest accepted phone number, counted in characters after trimming.
pub const MIN_PHONE_CHARS: usize = 8;

/// A lead as posted by the landing page form.
///
/// Every field is optional on the wire; the relay decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadSubmission {
    /// How the visitor wants to be addressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact phone, at least 8 characters after trimming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Car make/model/year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<String>,
    /// Symptoms described by the visitor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    /// When the visitor would like to be called back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
    /// Hidden honeypot field, humans leave it empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Campaign tracking parameters taken from the page's query string
    #[serde(skip_serializing_if = "TrackingParams::is_empty", deserialize_with = "tracking_or_empty")]
    #[schema(value_type = Object)]
    pub utm: TrackingParams,
    /// Full URL of the page the form was submitted from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Whether a raw lead body has the honeypot filled in.
///
/// Looked at before the body is read as a [`LeadSubmission`], so that a bot filling every
/// field with junk is still answered as if its lead went through.
pub fn honeypot_filled(body: &Value) -> bool {
    body.get("company")
        .and_then(Value::as_str)
        .is_some_and(|company| !company.is_empty())
}

fn tracking_or_empty<'de, D>(deserializer: D) -> Result<TrackingParams, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TrackingParams>::deserialize(deserializer)?.unwrap_or_default())
}

/// The recognised campaign tracking keys, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackingKey {
    Source,
    Medium,
    Campaign,
    Content,
    Term,
}

impl TrackingKey {
    pub const ALL: [TrackingKey; 5] = [
        TrackingKey::Source,
        TrackingKey::Medium,
        TrackingKey::Campaign,
        TrackingKey::Content,
        TrackingKey::Term,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackingKey::Source => "utm_source",
            TrackingKey::Medium => "utm_medium",
            TrackingKey::Campaign => "utm_campaign",
            TrackingKey::Content => "utm_content",
            TrackingKey::Term => "utm_term",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl std::fmt::Display for TrackingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign tracking parameters keyed by [`TrackingKey`].
///
/// Serialized as a plain string map. When deserializing, keys outside the recognised set
/// are dropped, `null` values are skipped and other non-string values keep their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, String>")]
pub struct TrackingParams(BTreeMap<TrackingKey, String>);

impl TrackingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: TrackingKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: TrackingKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Pairs in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackingKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl From<BTreeMap<String, Value>> for TrackingParams {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(key, value)| {
                let key = TrackingKey::parse(&key)?;
                match value {
                    Value::Null => None,
                    Value::String(s) => Some((key, s)),
                    other => Some((key, other.to_string())),
                }
            })
            .collect()
    }
}

impl From<TrackingParams> for BTreeMap<String, String> {
    fn from(params: TrackingParams) -> Self {
        params.0.into_iter().map(|(k, v)| (k.as_str().to_string(), v)).collect()
    }
}

impl FromIterator<(TrackingKey, String)> for TrackingParams {
    fn from_iter<I: IntoIterator<Item = (TrackingKey, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Acknowledgement returned for accepted (or silently discarded) leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RelayAck {
    pub ok: bool,
}

impl RelayAck {
    pub const OK: RelayAck = RelayAck { ok: true };
}

/// Error body for every non-2xx relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RelayErrorBody {
    /// Human-readable reason, shown to the visitor as-is
    pub error: String,
    /// Diagnostic detail from the bot API, when it rejected the notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RelayErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_accepts_camel_case_and_missing_fields() {
        let lead: LeadSubmission = serde_json::from_value(json!({
            "phone": "+79991234567",
            "preferredTime": "после 18:00",
            "pageUrl": "https://example.com/?utm_source=vk"
        }))
        .unwrap();

        assert_eq!(lead.phone.as_deref(), Some("+79991234567"));
        assert_eq!(lead.preferred_time.as_deref(), Some("после 18:00"));
        assert_eq!(lead.page_url.as_deref(), Some("https://example.com/?utm_source=vk"));
        assert!(lead.name.is_none());
        assert!(lead.utm.is_empty());
    }

    #[test]
    fn test_submission_accepts_nulls() {
        let lead: LeadSubmission = serde_json::from_value(json!({ "name": null, "utm": {} })).unwrap();
        assert!(lead.name.is_none());
    }

    #[test]
    fn test_submission_rejects_wrong_types() {
        assert!(serde_json::from_value::<LeadSubmission>(json!({ "phone": 79991234567u64 })).is_err());
        assert!(serde_json::from_value::<LeadSubmission>(json!(null)).is_err());
        assert!(serde_json::from_value::<LeadSubmission>(json!(42)).is_err());
    }

    #[test]
    fn test_honeypot_filled() {
        assert!(!honeypot_filled(&json!({})));
        assert!(!honeypot_filled(&json!({ "company": "" })));
        assert!(!honeypot_filled(&json!({ "company": null })));
        assert!(!honeypot_filled(&json!({ "company": 7 })));
        assert!(!honeypot_filled(&json!(["company"])));

        assert!(honeypot_filled(&json!({ "company": "acme" })));
        // Whitespace still counts: humans never touch the field at all
        assert!(honeypot_filled(&json!({ "company": " " })));
        // Other fields are not looked at
        assert!(honeypot_filled(&json!({ "company": "acme", "phone": 12345678, "utm": "x" })));
    }

    #[test]
    fn test_null_tracking_params_are_empty() {
        let lead: LeadSubmission = serde_json::from_value(json!({
            "phone": "+79991234567",
            "problem": "стук",
            "utm": null
        }))
        .unwrap();

        assert!(lead.utm.is_empty());
        assert_eq!(lead.phone.as_deref(), Some("+79991234567"));
    }

    #[test]
    fn test_tracking_params_tolerate_non_string_values() {
        let params: TrackingParams = serde_json::from_value(json!({
            "utm_source": 1,
            "utm_medium": null,
            "utm_term": true,
            "fbclid": { "nested": 1 }
        }))
        .unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params.get(TrackingKey::Source), Some("1"));
        assert_eq!(params.get(TrackingKey::Term), Some("true"));
    }

    #[test]
    fn test_tracking_params_drop_unknown_keys() {
        let params: TrackingParams = serde_json::from_value(json!({
            "utm_term": "ремонт двигателя",
            "utm_source": "yandex",
            "gclid": "abc"
        }))
        .unwrap();

        assert_eq!(params.len(), 2);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![TrackingKey::Source, TrackingKey::Term]);
    }

    #[test]
    fn test_tracking_params_serialize_as_plain_map() {
        let mut params = TrackingParams::new();
        params.insert(TrackingKey::Campaign, "spring");

        assert_eq!(serde_json::to_value(&params).unwrap(), json!({ "utm_campaign": "spring" }));
    }

    #[test]
    fn test_empty_tracking_params_are_omitted() {
        let lead = LeadSubmission {
            phone: Some("12345678".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&lead).unwrap(), json!({ "phone": "12345678" }));
    }

    #[test]
    fn test_relay_bodies() {
        assert_eq!(serde_json::to_value(RelayAck::OK).unwrap(), json!({ "ok": true }));
        assert_eq!(serde_json::to_value(RelayErrorBody::new("nope")).unwrap(), json!({ "error": "nope" }));
        assert_eq!(
            serde_json::to_value(RelayErrorBody::new("nope").with_details("why")).unwrap(),
            json!({ "error": "nope", "details": "why" })
        );
    }
}
