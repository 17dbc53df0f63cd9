use serde_json::{Map, Value};

use crate::error::ModelError;
use formats::{Feature, GeoPoint, Geometry};

/// Server-assigned report key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportKey(pub u64);

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a report came in from. Decides how its popup renders.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportSource {
    Twitter,
    Detik,
    /// Direct web submissions and anything else: rendered as linkified text.
    Web,
}

impl ReportSource {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "twitter" => ReportSource::Twitter,
            "detik" => ReportSource::Detik,
            _ => ReportSource::Web,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Confirmed,
    Unconfirmed,
}

impl ReportStatus {
    /// Path segment used by the reports endpoint.
    pub fn as_wire(self) -> &'static str {
        match self {
            ReportStatus::Confirmed => "confirmed",
            ReportStatus::Unconfirmed => "unconfirmed",
        }
    }
}

/// One crowd-sourced flood report. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub key: ReportKey,
    pub source: ReportSource,
    pub status: ReportStatus,
    pub location: GeoPoint,
    pub text: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub image_url: Option<String>,
}

impl Report {
    /// Builds a report from a decoded feature.
    ///
    /// `status` comes from the request, not the payload: the reports endpoint
    /// serves one status per fetch.
    pub fn from_feature(feature: &Feature, status: ReportStatus) -> Result<Self, ModelError> {
        let location = match &feature.geometry {
            Geometry::Point(p) => *p,
            _ => return Err(ModelError::WrongGeometry("a point")),
        };

        let props = &feature.properties;
        Ok(Report {
            key: ReportKey(key_property(props, "pkey")?),
            source: ReportSource::from_wire(
                string_property(props, "source").unwrap_or_default().as_str(),
            ),
            status,
            location,
            text: string_property(props, "text").unwrap_or_default(),
            title: string_property(props, "title"),
            url: string_property(props, "url"),
            created_at: string_property(props, "created_at"),
            image_url: string_property(props, "image_url"),
        })
    }
}

pub(crate) fn key_property(props: &Map<String, Value>, key: &'static str) -> Result<u64, ModelError> {
    let value = props.get(key).ok_or(ModelError::MissingProperty(key))?;
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| ModelError::InvalidProperty {
            key,
            reason: format!("not a non-negative integer: {n}"),
        }),
        Value::String(s) => s.parse::<u64>().map_err(|_| ModelError::InvalidProperty {
            key,
            reason: format!("not an integer: '{s}'"),
        }),
        other => Err(ModelError::InvalidProperty {
            key,
            reason: format!("unexpected value: {other}"),
        }),
    }
}

pub(crate) fn string_property(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
