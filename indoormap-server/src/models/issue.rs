//! Indoor issue rows and the inputs that create or change them

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ValidationError;

/// Issue record from database
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub issue_id: i32,
    pub avoid_polygon: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub datetime_open: Option<DateTime<Utc>>,
    pub datetime_closed: Option<DateTime<Utc>>,
    pub datetime_permanent: Option<DateTime<Utc>>,
    pub votes: i32,
}

/// Image row attached to an issue
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IssueImage {
    pub image_id: i32,
    pub issue_id: i32,
    /// Base64 of the uploaded bytes
    pub image: String,
}

/// Raw image bytes from an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload(Vec<u8>);

impl ImageUpload {
    /// Wrap uploaded bytes. An empty upload counts as no image.
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

/// Fields for a new issue, parsed from a multipart form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub avoid_polygon: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub datetime_open: Option<DateTime<Utc>>,
    pub datetime_closed: Option<DateTime<Utc>>,
    pub datetime_permanent: Option<DateTime<Utc>>,
    pub votes: i32,
}

impl NewIssue {
    /// Build from form text fields keyed by their camelCase names.
    ///
    /// Empty values are treated as absent. Unknown fields are ignored.
    /// `votes` falls back to 0.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let text = |name: &str| {
            fields
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Ok(Self {
            avoid_polygon: text("avoidPolygon"),
            location: text("location"),
            latitude: text("latitude").map(|v| parse_f64("latitude", &v)).transpose()?,
            longitude: text("longitude").map(|v| parse_f64("longitude", &v)).transpose()?,
            description: text("description"),
            status: text("status"),
            datetime_open: text("datetimeOpen")
                .map(|v| parse_datetime("datetimeOpen", &v))
                .transpose()?,
            datetime_closed: text("datetimeClosed")
                .map(|v| parse_datetime("datetimeClosed", &v))
                .transpose()?,
            datetime_permanent: text("datetimePermanent")
                .map(|v| parse_datetime("datetimePermanent", &v))
                .transpose()?,
            votes: text("votes")
                .map(|v| parse_votes(&v))
                .transpose()?
                .unwrap_or(0),
        })
    }
}

fn parse_f64(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidValue {
            field,
            value: raw.to_owned(),
        })
}

fn parse_votes(raw: &str) -> Result<i32, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::InvalidValue {
        field: "votes",
        value: raw.to_owned(),
    })
}

/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` read as UTC, or a
/// bare `YYYY-MM-DD` read as midnight UTC.
fn parse_datetime(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw_trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw_trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw_trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidValue {
            field,
            value: raw.to_owned(),
        })
}

/// Typed bind value for one SET assignment
#[derive(Debug, Clone, PartialEq)]
pub enum IssueValue {
    Text(Option<String>),
    Float(Option<f64>),
    Timestamp(Option<DateTime<Utc>>),
    Integer(i32),
}

/// Partial update of an issue.
///
/// Only these attributes can be updated. An outer `None` means the attribute
/// was not supplied; `Some(None)` sets the column to NULL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuePatch {
    #[serde(default, deserialize_with = "nullable")]
    pub avoid_polygon: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub datetime_open: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub datetime_closed: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub datetime_permanent: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub votes: Option<i32>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Same formats as the create form, `null` clears the column.
fn nullable_datetime<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_datetime("datetime", &raw))
        .transpose()
        .map(Some)
        .map_err(serde::de::Error::custom)
}

impl IssuePatch {
    /// Column/value pairs for the supplied attributes, in column order.
    pub fn assignments(&self) -> Vec<(&'static str, IssueValue)> {
        let mut out = Vec::new();
        let mut text = |column: &'static str, value: &Option<Option<String>>| {
            if let Some(v) = value {
                out.push((column, IssueValue::Text(v.clone())));
            }
        };
        text("avoid_polygon", &self.avoid_polygon);
        text("location", &self.location);
        text("description", &self.description);
        text("status", &self.status);

        if let Some(v) = self.latitude {
            out.push(("latitude", IssueValue::Float(v)));
        }
        if let Some(v) = self.longitude {
            out.push(("longitude", IssueValue::Float(v)));
        }
        for (column, value) in [
            ("datetime_open", self.datetime_open),
            ("datetime_closed", self.datetime_closed),
            ("datetime_permanent", self.datetime_permanent),
        ] {
            if let Some(v) = value {
                out.push((column, IssueValue::Timestamp(v)));
            }
        }
        if let Some(v) = self.votes {
            out.push(("votes", IssueValue::Integer(v)));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Apply the supplied attributes to an in-memory row.
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(v) = &self.avoid_polygon {
            issue.avoid_polygon = v.clone();
        }
        if let Some(v) = &self.location {
            issue.location = v.clone();
        }
        if let Some(v) = self.latitude {
            issue.latitude = v;
        }
        if let Some(v) = self.longitude {
            issue.longitude = v;
        }
        if let Some(v) = &self.description {
            issue.description = v.clone();
        }
        if let Some(v) = &self.status {
            issue.status = v.clone();
        }
        if let Some(v) = self.datetime_open {
            issue.datetime_open = v;
        }
        if let Some(v) = self.datetime_closed {
            issue.datetime_closed = v;
        }
        if let Some(v) = self.datetime_permanent {
            issue.datetime_permanent = v;
        }
        if let Some(v) = self.votes {
            issue.votes = v;
        }
    }
}
