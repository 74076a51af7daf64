use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::auth::CredentialErrors;
use crate::capabilities::TimerId;
use crate::dashboard::DashboardState;
use crate::dispatch::DispatchBoard;
use crate::notification::{NotificationChannel, ToastMessage};
use crate::screen::Screen;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(IncidentId);

// --- Coordinates ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
    #[error("coordinates must be finite")]
    NonFinite,
}

#[derive(Deserialize)]
struct RawLatLon {
    lat: f64,
    lon: f64,
}

/// Validated WGS84 position.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLatLon")]
pub struct LatLon {
    lat: f64,
    lon: f64,
}

impl LatLon {
    /// Puerta del Sol, used as the map picker's starting point.
    pub const MADRID: LatLon = LatLon {
        lat: 40.4168,
        lon: -3.7038,
    };

    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl Default for LatLon {
    fn default() -> Self {
        Self::MADRID
    }
}

impl TryFrom<RawLatLon> for LatLon {
    type Error = CoordinateError;

    fn try_from(raw: RawLatLon) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

/// Explicit timestamp unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    pub fn now() -> Self {
        Self(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        )
    }

    /// Gregorian year (UTC) of this instant, or `None` past chrono's range.
    pub fn year(self) -> Option<i32> {
        let ms = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp_millis(ms).map(|d| d.year())
    }
}

// --- Domain enums ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentType {
    Fire,
    #[serde(alias = "rain")]
    Flood,
    Snow,
}

impl IncidentType {
    pub const ALL: [IncidentType; 3] = [Self::Fire, Self::Flood, Self::Snow];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Flood => "flood",
            Self::Snow => "snow",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fire => "Incendio",
            Self::Flood => "Inundación",
            Self::Snow => "Nevada",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "fire" => Some(Self::Fire),
            "flood" | "rain" => Some(Self::Flood),
            "snow" => Some(Self::Snow),
            _ => None,
        }
    }
}

/// Severity is P1 > P2 > P3; the derived `Ord` follows declaration order, so
/// `P1 < P2` numerically. Use [`Priority::is_more_severe_than`] for severity.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::P1, Self::P2, Self::P3];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::P1 => "Crítica",
            Self::P2 => "Alta",
            Self::P3 => "Normal",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "P1" | "p1" => Some(Self::P1),
            "P2" | "p2" => Some(Self::P2),
            "P3" | "p3" => Some(Self::P3),
            _ => None,
        }
    }

    pub fn is_more_severe_than(self, other: Self) -> bool {
        self < other
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentStatus {
    #[serde(alias = "Nueva", alias = "nueva")]
    New,
    #[serde(alias = "En curso", alias = "en-curso")]
    InProgress,
    #[serde(alias = "Asignada", alias = "asignada")]
    Assigned,
    /// Any status this console does not track (closed, resolved, ...).
    #[serde(other)]
    Unrecognized,
}

impl IncidentStatus {
    /// Statuses shown on the dashboard, in histogram order.
    pub const TRACKED: [IncidentStatus; 3] = [Self::New, Self::InProgress, Self::Assigned];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in-progress",
            Self::Assigned => "assigned",
            Self::Unrecognized => "unrecognized",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "Nueva",
            Self::InProgress => "En curso",
            Self::Assigned => "Asignada",
            Self::Unrecognized => "Desconocido",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "new" | "nueva" => Some(Self::New),
            "in-progress" | "en-curso" => Some(Self::InProgress),
            "assigned" | "asignada" => Some(Self::Assigned),
            _ => None,
        }
    }

    pub const fn is_tracked(self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

// --- Incident ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub address: String,
    pub location: LatLon,
    #[serde(default)]
    pub description: String,
    pub status: IncidentStatus,
    pub created_at: UnixTimeMs,
    #[serde(default)]
    pub updated_at: Option<UnixTimeMs>,
}

/// Create payload: everything but id, status and creation time, which the
/// store assigns.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub address: String,
    pub location: LatLon,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<IncidentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IncidentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, incident: &mut Incident, now: UnixTimeMs) {
        if let Some(t) = self.incident_type {
            incident.incident_type = t;
        }
        if let Some(p) = self.priority {
            incident.priority = p;
        }
        if let Some(s) = self.status {
            incident.status = s;
        }
        if let Some(a) = &self.address {
            incident.address.clone_from(a);
        }
        if let Some(l) = self.location {
            incident.location = l;
        }
        if let Some(d) = &self.description {
            incident.description.clone_from(d);
        }
        incident.updated_at = Some(now);
    }
}

// --- Session ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// "Sala": dashboard, classification and dispatch.
    Dispatcher,
    /// "Campo": missions on site.
    Field,
}

impl Role {
    pub const fn home(self) -> Screen {
        match self {
            Self::Dispatcher => Screen::Dashboard,
            Self::Field => Screen::Mission,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dispatcher => "Jefe/a de sala",
            Self::Field => "Jefe/a de campo",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub role: Role,
}

// --- Screen-local state ---

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftErrors {
    pub address: Option<String>,
}

/// New-incident form contents.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IncidentDraft {
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub address: String,
    pub description: String,
    pub location: LatLon,
    pub errors: DraftErrors,
    /// Inline, non-blocking geocoder message.
    pub geocode_message: Option<String>,
    pub is_geocoding: bool,
}

impl Default for IncidentDraft {
    fn default() -> Self {
        Self {
            incident_type: IncidentType::Fire,
            priority: Priority::P2,
            address: String::new(),
            description: String::new(),
            location: LatLon::MADRID,
            errors: DraftErrors::default(),
            geocode_message: None,
            is_geocoding: false,
        }
    }
}

impl IncidentDraft {
    pub fn to_new_incident(&self) -> NewIncident {
        NewIncident {
            incident_type: self.incident_type,
            priority: self.priority,
            address: self.address.trim().to_string(),
            location: self.location,
            description: self.description.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub enum DetailState {
    #[default]
    Idle,
    Loading,
    Loaded(Box<Incident>),
    NotFound,
    Failed,
}

/// Navigation scheduled to happen once its timer fires.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PendingTransition {
    pub timer: TimerId,
    pub target: Screen,
    pub bump_epoch: bool,
    /// Notification emitted when the transition fires.
    pub announce: Option<ToastMessage>,
}

/// Screen-flow state. Mutated only by [`crate::App`]; shells read it
/// through the accessors below or, preferably, through the view model.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub(crate) screen: Screen,
    pub(crate) session: Option<Session>,

    pub(crate) selected_incident_id: Option<IncidentId>,
    pub(crate) last_dispatched_count: u32,
    pub(crate) dashboard_epoch: u64,

    // Deferred work
    pub(crate) pending: Option<PendingTransition>,
    pub(crate) next_timer_id: u64,
    pub(crate) notifications: NotificationChannel,

    // Entry
    pub(crate) auth_errors: CredentialErrors,

    // Dispatcher pipeline
    pub(crate) dashboard: Option<DashboardState>,
    pub(crate) draft: IncidentDraft,
    pub(crate) detail: DetailState,
    pub(crate) delete_confirmation_open: bool,
    pub(crate) dispatch: DispatchBoard,

    // Overlays
    pub(crate) is_busy: bool,
    pub(crate) evidences_open: bool,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn selected_incident_id(&self) -> Option<&IncidentId> {
        self.selected_incident_id.as_ref()
    }

    pub fn last_dispatched_count(&self) -> u32 {
        self.last_dispatched_count
    }

    pub fn dashboard_epoch(&self) -> u64 {
        self.dashboard_epoch
    }

    /// The deferred transition waiting on its timer, if any.
    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub fn auth_errors(&self) -> &CredentialErrors {
        &self.auth_errors
    }

    pub fn dashboard(&self) -> Option<&DashboardState> {
        self.dashboard.as_ref()
    }

    pub fn draft(&self) -> &IncidentDraft {
        &self.draft
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn delete_confirmation_open(&self) -> bool {
        self.delete_confirmation_open
    }

    pub fn dispatch(&self) -> &DispatchBoard {
        &self.dispatch
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    pub fn evidences_open(&self) -> bool {
        self.evidences_open
    }

    pub(crate) fn allocate_timer(&mut self) -> TimerId {
        self.next_timer_id += 1;
        TimerId(self.next_timer_id)
    }
}
