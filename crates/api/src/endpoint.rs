use serde::Serialize;

use crate::error::ApiError;
use formats::{geojson, topojson, FeatureSet};
use model::{FloodState, InfrastructureKind, RegionId, RegionLevel, ReportKey, ReportStatus};

/// Client-side API configuration. The base path is deployment config, not
/// code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base: "/data/api/v2".to_string(),
        }
    }
}

/// Aggregation time window offered by the map control.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    #[default]
    OneHour,
    ThreeHours,
    SixHours,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [
        TimeWindow::OneHour,
        TimeWindow::ThreeHours,
        TimeWindow::SixHours,
    ];

    pub fn hours(self) -> u32 {
        match self {
            TimeWindow::OneHour => 1,
            TimeWindow::ThreeHours => 3,
            TimeWindow::SixHours => 6,
        }
    }

    pub fn from_hours(hours: u32) -> Option<Self> {
        match hours {
            1 => Some(TimeWindow::OneHour),
            3 => Some(TimeWindow::ThreeHours),
            6 => Some(TimeWindow::SixHours),
            _ => None,
        }
    }
}

/// Payload encoding of a GET endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireFormat {
    TopoJson,
    GeoJson,
}

/// Every GET endpoint the client reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Bulk reports for one status.
    Reports { status: ReportStatus },
    /// One confirmed report; single points ship smaller as plain GeoJSON.
    Report { id: ReportKey },
    /// Aggregate polygons for a level over a time window.
    Aggregates { level: RegionLevel, window: TimeWindow },
    Infrastructure { kind: InfrastructureKind },
    /// Auxiliary server-computed per-region status (DIMS), polygon-keyed.
    DimsStates { level: RegionLevel },
}

impl Endpoint {
    pub fn url(&self, config: &ApiConfig) -> String {
        let base = &config.base;
        match self {
            Endpoint::Reports { status } => {
                format!("{base}/reports/{}?format=topojson", status.as_wire())
            }
            Endpoint::Report { id } => {
                format!("{base}/reports/confirmed/{id}?format=geojson")
            }
            Endpoint::Aggregates { level, window } => format!(
                "{base}/aggregates/live?format=topojson&level={}&hours={}",
                level.as_wire(),
                window.hours()
            ),
            Endpoint::Infrastructure { kind } => {
                format!("{base}/infrastructure/{}?format=topojson", kind.as_wire())
            }
            Endpoint::DimsStates { level } => format!(
                "{base}/states/live?format=topojson&level={}",
                level.as_wire()
            ),
        }
    }

    pub fn wire_format(&self) -> WireFormat {
        match self {
            Endpoint::Report { .. } => WireFormat::GeoJson,
            _ => WireFormat::TopoJson,
        }
    }
}

/// Session endpoint URL; the payload deserializes into `model::UserSession`.
pub fn session_url(config: &ApiConfig) -> String {
    format!("{}/session", config.base)
}

/// PUT target for recording a region's severity state.
pub fn state_update_url(config: &ApiConfig, region: RegionId) -> String {
    format!("{}/rem/states/{region}", config.base)
}

/// PUT body for a severity state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StateUpdate {
    pub state: u8,
}

impl StateUpdate {
    pub fn new(state: FloodState) -> Self {
        StateUpdate {
            state: state.code(),
        }
    }
}

/// Decodes a fetched layer payload.
///
/// `Ok(None)` is the valid empty layer (`features: null`); only transport
/// and parse failures are errors.
pub fn decode_layer(payload: &str, format: WireFormat) -> Result<Option<FeatureSet>, ApiError> {
    let decoded = match format {
        WireFormat::TopoJson => topojson::decode_str(payload),
        WireFormat::GeoJson => geojson::decode_str(payload),
    };
    decoded.map_err(ApiError::from)
}
