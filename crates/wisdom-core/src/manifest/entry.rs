//! The manifest entry record.
//!
//! An entry has five fields every consumer relies on (`issue`, `artifact`,
//! `target`, `intent`, `created`) and an open set of everything else agents
//! attach: per-category artifact arrays, `author`, `status`, `related`,
//! `tags`, and whatever appears next. The five are typed when they hold the
//! expected JSON type; the rest ride along untouched in
//! [`ManifestEntry::extra`].
//!
//! Each required field is read on its own. A required key holding something
//! else (`"created": 20250101`, `"issue": 2.0`, `"issue": null`) stays in
//! `extra` under its own key, is written back unchanged, and still takes part
//! in ordering and index rendering as far as its value allows.

use std::borrow::Cow;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Issue identifier. Agents write it both as a number and as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(i64),
    Text(String),
}

impl IssueId {
    /// Integer used for ordering. Text that is not a decimal integer orders as 0,
    /// the same as a missing issue.
    pub fn sort_value(&self) -> i64 {
        match self {
            IssueId::Number(n) => *n,
            IssueId::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// `38` and `"38"` name the same issue.
    pub fn same_issue(&self, other: &IssueId) -> bool {
        self.to_string().trim() == other.to_string().trim()
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{n}"),
            IssueId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IssueId {
    fn from(n: i64) -> Self {
        IssueId::Number(n)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        IssueId::Text(s.to_string())
    }
}

impl From<IssueId> for Value {
    fn from(issue: IssueId) -> Self {
        match issue {
            IssueId::Number(n) => Value::from(n),
            IssueId::Text(s) => Value::String(s),
        }
    }
}

/// Ordering value of a raw `issue`: integers as-is, floats truncated,
/// integers beyond `i64` saturated, numeric strings parsed, anything else 0.
fn issue_sort_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Text of a raw value as shown in the index: strings bare, the rest as JSON.
fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// A field an entry needs before the index can render it normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    Artifact,
    Issue,
    Target,
    Intent,
    Created,
}

impl RequiredField {
    pub const ALL: [RequiredField; 5] = [
        RequiredField::Artifact,
        RequiredField::Issue,
        RequiredField::Target,
        RequiredField::Intent,
        RequiredField::Created,
    ];

    /// Order in which the fields lead a serialized entry.
    const WRITE_ORDER: [RequiredField; 5] = [
        RequiredField::Issue,
        RequiredField::Artifact,
        RequiredField::Target,
        RequiredField::Intent,
        RequiredField::Created,
    ];

    /// JSON key of the field.
    pub fn key(self) -> &'static str {
        match self {
            RequiredField::Artifact => "artifact",
            RequiredField::Issue => "issue",
            RequiredField::Target => "target",
            RequiredField::Intent => "intent",
            RequiredField::Created => "created",
        }
    }

    fn is_required_key(key: &str) -> bool {
        Self::ALL.iter().any(|f| f.key() == key)
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One recorded contribution to the catalogue.
///
/// Serializes as a single JSON object: the five required keys first (typed
/// value, or the raw value kept in `extra`), then the remaining extras in key
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestEntry {
    pub issue: Option<IssueId>,

    /// Relative artifact path; secondary sort key and index label.
    pub artifact: Option<String>,

    /// Investigation slug.
    pub target: Option<String>,

    pub intent: Option<String>,

    pub created: Option<String>,

    /// All other fields, plus required keys whose value is not of the
    /// expected type, preserved as written.
    pub extra: Map<String, Value>,
}

/// Borrowed view of a complete entry, as rendered in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary<'a> {
    pub issue: Cow<'a, str>,
    pub artifact: Cow<'a, str>,
    pub target: Cow<'a, str>,
    pub intent: Cow<'a, str>,
    pub created: Cow<'a, str>,
}

impl ManifestEntry {
    /// Build a complete entry.
    pub fn new(
        issue: impl Into<IssueId>,
        artifact: impl Into<String>,
        target: impl Into<String>,
        intent: impl Into<String>,
        created: impl Into<String>,
    ) -> Self {
        Self {
            issue: Some(issue.into()),
            artifact: Some(artifact.into()),
            target: Some(target.into()),
            intent: Some(intent.into()),
            created: Some(created.into()),
            extra: Map::new(),
        }
    }

    /// Set a field, required or not, as if it had been read from JSON.
    pub fn with_field(self, key: impl Into<String>, value: Value) -> Self {
        let mut map = self.into_map();
        map.insert(key.into(), value);
        Self::from_map(map)
    }

    /// Convert a JSON value into an entry.
    ///
    /// Any object is accepted and nothing in it is lost. Non-objects are
    /// handed back as `Err`.
    pub fn from_json(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(other),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Self {
        let issue = match map.get("issue") {
            Some(Value::Number(n)) => n.as_i64().map(IssueId::Number),
            Some(Value::String(s)) => Some(IssueId::Text(s.clone())),
            _ => None,
        };
        if issue.is_some() {
            map.remove("issue");
        }

        Self {
            issue,
            artifact: take_string(&mut map, "artifact"),
            target: take_string(&mut map, "target"),
            intent: take_string(&mut map, "intent"),
            created: take_string(&mut map, "created"),
            extra: map,
        }
    }

    fn into_map(self) -> Map<String, Value> {
        let mut map = self.extra;
        if let Some(issue) = self.issue {
            map.insert("issue".to_string(), issue.into());
        }
        for (field, value) in [
            (RequiredField::Artifact, self.artifact),
            (RequiredField::Target, self.target),
            (RequiredField::Intent, self.intent),
            (RequiredField::Created, self.created),
        ] {
            if let Some(value) = value {
                map.insert(field.key().to_string(), Value::String(value));
            }
        }
        map
    }

    fn typed_text(&self, field: RequiredField) -> Option<Cow<'_, str>> {
        match field {
            RequiredField::Issue => self.issue.as_ref().map(|i| match i {
                IssueId::Number(n) => Cow::Owned(n.to_string()),
                IssueId::Text(s) => Cow::Borrowed(s.as_str()),
            }),
            RequiredField::Artifact => self.artifact.as_deref().map(Cow::Borrowed),
            RequiredField::Target => self.target.as_deref().map(Cow::Borrowed),
            RequiredField::Intent => self.intent.as_deref().map(Cow::Borrowed),
            RequiredField::Created => self.created.as_deref().map(Cow::Borrowed),
        }
    }

    /// Raw value of a required key that did not have the expected type.
    /// An explicit `null` is kept but does not count as a value.
    fn untyped(&self, field: RequiredField) -> Option<&Value> {
        self.extra.get(field.key()).filter(|v| !v.is_null())
    }

    /// Display text of a required field, typed or not.
    pub fn field_text(&self, field: RequiredField) -> Option<Cow<'_, str>> {
        self.typed_text(field)
            .or_else(|| self.untyped(field).map(value_text))
    }

    /// Required fields this entry lacks (absent or `null`), in
    /// [`RequiredField::ALL`] order.
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|&field| self.field_text(field).is_none())
            .collect()
    }

    /// Required fields present with a value of the wrong JSON type.
    pub fn mistyped_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|&field| self.typed_text(field).is_none() && self.untyped(field).is_some())
            .collect()
    }

    /// Whether all five required fields carry a value.
    pub fn is_complete(&self) -> bool {
        self.summary().is_some()
    }

    pub fn summary(&self) -> Option<EntrySummary<'_>> {
        Some(EntrySummary {
            issue: self.field_text(RequiredField::Issue)?,
            artifact: self.field_text(RequiredField::Artifact)?,
            target: self.field_text(RequiredField::Target)?,
            intent: self.field_text(RequiredField::Intent)?,
            created: self.field_text(RequiredField::Created)?,
        })
    }

    /// The issue as an identifier, whatever JSON type it was written with.
    pub fn issue_id(&self) -> Option<IssueId> {
        self.issue.clone().or_else(|| {
            self.untyped(RequiredField::Issue)
                .map(|v| IssueId::Text(value_text(v).into_owned()))
        })
    }

    /// Canonical ordering key: issue as an integer (missing = 0), then artifact.
    pub fn sort_key(&self) -> (i64, Cow<'_, str>) {
        let issue = match (&self.issue, self.extra.get("issue")) {
            (Some(issue), _) => issue.sort_value(),
            (None, Some(raw)) => issue_sort_value(raw),
            (None, None) => 0,
        };
        let artifact = self
            .field_text(RequiredField::Artifact)
            .unwrap_or(Cow::Borrowed(""));
        (issue, artifact)
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !matches!(map.get(key), Some(Value::String(_))) {
        return None;
    }
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl Serialize for ManifestEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for field in RequiredField::WRITE_ORDER {
            let key = field.key();
            match field {
                RequiredField::Issue if self.issue.is_some() => {
                    map.serialize_entry(key, &self.issue)?;
                    continue;
                }
                RequiredField::Artifact if self.artifact.is_some() => {
                    map.serialize_entry(key, &self.artifact)?;
                    continue;
                }
                RequiredField::Target if self.target.is_some() => {
                    map.serialize_entry(key, &self.target)?;
                    continue;
                }
                RequiredField::Intent if self.intent.is_some() => {
                    map.serialize_entry(key, &self.intent)?;
                    continue;
                }
                RequiredField::Created if self.created.is_some() => {
                    map.serialize_entry(key, &self.created)?;
                    continue;
                }
                _ => {}
            }
            if let Some(raw) = self.extra.get(key) {
                map.serialize_entry(key, raw)?;
            }
        }
        for (key, value) in &self.extra {
            if !RequiredField::is_required_key(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ManifestEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_map)
    }
}

/// Compact single-line JSON.
impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Stable sort into canonical `(issue, artifact)` order.
pub fn sort_canonical(entries: &mut [ManifestEntry]) {
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Convert a JSON array into entries. `None` if `value` is not an array or
/// holds anything other than objects.
pub(crate) fn entries_from_array(value: Value) -> Option<Vec<ManifestEntry>> {
    let Value::Array(items) = value else {
        return None;
    };
    items
        .into_iter()
        .map(|item| ManifestEntry::from_json(item).ok())
        .collect()
}
