//! Incident search, filtering, sorting and aggregation for the dashboard.
//!
//! Everything here is a pure function of its inputs: the dashboard calls
//! [`query`] on every keystroke or filter change and renders the result.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};

use crate::model::{Incident, IncidentId, IncidentStatus, IncidentType, Priority};
use crate::DEFAULT_FILTER_VALUE;

/// Either every value passes, or only one concrete value does.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: Copy> Filter<T> {
    /// Parse a menu value; `"all"`, an empty string and unknown values mean
    /// [`Filter::All`].
    pub fn from_value(value: &str, parse: impl Fn(&str) -> Option<T>) -> Self {
        if value.is_empty() || value == DEFAULT_FILTER_VALUE {
            return Self::All;
        }
        parse(value).map_or(Self::All, Self::Only)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    MostRecentFirst,
    OldestFirst,
}

impl SortOrder {
    pub const fn as_value(self) -> &'static str {
        match self {
            Self::MostRecentFirst => "recent",
            Self::OldestFirst => "oldest",
        }
    }

    pub fn from_value(value: &str) -> Self {
        match value {
            "oldest" | "antiguas" => Self::OldestFirst,
            _ => Self::MostRecentFirst,
        }
    }
}

/// Dashboard filter configuration. Never mutates incident data.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub type_filter: Filter<IncidentType>,
    pub priority_filter: Filter<Priority>,
    pub status_filter: Filter<IncidentStatus>,
    pub search_text: String,
    pub sort_order: SortOrder,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::P1 => self.p1,
            Priority::P2 => self.p2,
            Priority::P3 => self.p3,
        }
    }

    pub fn total(&self) -> usize {
        self.p1 + self.p2 + self.p3
    }

    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::P1 => self.p1 += 1,
            Priority::P2 => self.p2 += 1,
            Priority::P3 => self.p3 += 1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub new: usize,
    pub in_progress: usize,
    pub assigned: usize,
}

impl StatusCounts {
    pub fn get(&self, status: IncidentStatus) -> usize {
        match status {
            IncidentStatus::New => self.new,
            IncidentStatus::InProgress => self.in_progress,
            IncidentStatus::Assigned => self.assigned,
            IncidentStatus::Unrecognized => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.in_progress + self.assigned
    }

    fn record(&mut self, status: IncidentStatus) {
        match status {
            IncidentStatus::New => self.new += 1,
            IncidentStatus::InProgress => self.in_progress += 1,
            IncidentStatus::Assigned => self.assigned += 1,
            IncidentStatus::Unrecognized => {}
        }
    }
}

/// Map-marker projection of one incident.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: IncidentId,
    pub lat: f64,
    pub lon: f64,
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub address: String,
}

impl From<&Incident> for Marker {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id.clone(),
            lat: incident.location.lat(),
            lon: incident.location.lon(),
            incident_type: incident.incident_type,
            priority: incident.priority,
            status: incident.status,
            address: incident.address.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub list: Vec<Incident>,
    pub priority_counts: PriorityCounts,
    pub status_counts: StatusCounts,
    pub markers: Vec<Marker>,
    /// Dashboard-visible incidents before filtering ("showing X of Y").
    pub total_considered: usize,
}

/// Lowercase, drop every `#` and a leading `inc-` token.
pub fn normalize_id(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace('#', "");
    let trimmed = lowered.trim_start();
    trimmed.strip_prefix("inc-").unwrap_or(trimmed).to_string()
}

#[derive(Debug)]
struct SearchNeedle {
    id: String,
    address: String,
}

impl SearchNeedle {
    fn parse(search_text: &str) -> Option<Self> {
        if search_text.trim().is_empty() {
            return None;
        }
        let address = search_text.trim().to_lowercase().replace('#', "");
        Some(Self {
            id: normalize_id(search_text),
            address: address.trim().to_string(),
        })
    }

    fn matches(&self, incident: &Incident) -> bool {
        normalize_id(incident.id.as_str()).contains(&self.id)
            || incident.address.to_lowercase().contains(&self.address)
    }
}

fn passes(incident: &Incident, needle: Option<&SearchNeedle>, filters: &FilterState) -> bool {
    needle.map_or(true, |n| n.matches(incident))
        && filters.type_filter.accepts(&incident.incident_type)
        && filters.priority_filter.accepts(&incident.priority)
        && filters.status_filter.accepts(&incident.status)
}

/// Derive the dashboard list, histograms and markers.
///
/// Incidents whose status is not one the dashboard tracks are left out
/// entirely, so both histograms always sum to `list.len()`.
pub fn query(incidents: &[Incident], filters: &FilterState) -> QueryResult {
    let needle = SearchNeedle::parse(&filters.search_text);

    let visible = incidents.iter().filter(|inc| inc.status.is_tracked());
    let total_considered = visible.clone().count();

    let mut list: Vec<Incident> = visible
        .filter(|inc| passes(inc, needle.as_ref(), filters))
        .cloned()
        .collect();

    let mut priority_counts = PriorityCounts::default();
    let mut status_counts = StatusCounts::default();
    for incident in &list {
        priority_counts.record(incident.priority);
        status_counts.record(incident.status);
    }

    // `sort_by` is stable; equal timestamps keep their input order.
    match filters.sort_order {
        SortOrder::MostRecentFirst => list.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::OldestFirst => list.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }

    let markers = list.iter().map(Marker::from).collect();

    QueryResult {
        list,
        priority_counts,
        status_counts,
        markers,
        total_considered,
    }
}

/// Markers as GeoJSON points (`[lon, lat]`), one feature per marker.
pub fn markers_to_geojson(markers: &[Marker]) -> FeatureCollection {
    markers
        .iter()
        .map(|marker| {
            let mut feature = Feature::from(Geometry::new(Value::Point(vec![
                marker.lon, marker.lat,
            ])));
            feature.id = Some(geojson::feature::Id::String(marker.id.as_str().to_string()));
            feature.set_property("type", marker.incident_type.as_str());
            feature.set_property("priority", marker.priority.as_str());
            feature.set_property("status", marker.status.as_str());
            feature.set_property("address", marker.address.clone());
            feature
        })
        .collect()
}
