use async_trait::async_trait;
use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::LatLon;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum GeocodeOperation {
    /// Address to coordinates.
    Forward { address: String },
    /// Coordinates to a display address.
    Reverse { location: LatLon },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum GeocodeOutput {
    Located(LatLon),
    Addressed(String),
}

#[derive(Error, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("no match for '{query}'")]
    NoMatch { query: String },

    #[error("geocoder unavailable: {message}")]
    Transport { message: String },
}

impl GeocodeError {
    /// Inline text for the map picker.
    pub fn inline_message(&self) -> &'static str {
        match self {
            Self::NoMatch { .. } => "No se encontró la dirección",
            Self::Transport { .. } => "No se pudo consultar el servicio de mapas",
        }
    }
}

pub type GeocodeResult = Result<GeocodeOutput, GeocodeError>;

impl Operation for GeocodeOperation {
    type Output = GeocodeResult;
}

pub struct Geocode<Ev> {
    context: CapabilityContext<GeocodeOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geocode<Ev> {
    type Operation = GeocodeOperation;
    type MappedSelf<MappedEv> = Geocode<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geocode::new(self.context.map_event(f))
    }
}

impl<Ev> Geocode<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeocodeOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn lookup<F>(&self, operation: GeocodeOperation, callback: F)
    where
        F: FnOnce(GeocodeResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

/// Host-side geocoder a shell resolves [`GeocodeOperation`]s against.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, address: &str) -> Result<LatLon, GeocodeError>;
    async fn reverse(&self, location: LatLon) -> Result<String, GeocodeError>;
}

pub async fn execute<G: Geocoder + ?Sized>(geocoder: &G, operation: GeocodeOperation) -> GeocodeResult {
    match operation {
        GeocodeOperation::Forward { address } => {
            geocoder.forward(&address).await.map(GeocodeOutput::Located)
        }
        GeocodeOperation::Reverse { location } => {
            geocoder.reverse(location).await.map(GeocodeOutput::Addressed)
        }
    }
}

/// Gazetteer-backed geocoder: forward lookups match entries by
/// case-insensitive substring, reverse lookups return the nearest entry.
#[derive(Debug, Clone, Default)]
pub struct FixedGeocoder {
    entries: Vec<(String, LatLon)>,
}

impl FixedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, address: impl Into<String>, location: LatLon) -> Self {
        self.entries.push((address.into(), location));
        self
    }
}

fn squared_distance(a: LatLon, b: LatLon) -> f64 {
    let dlat = a.lat() - b.lat();
    let dlon = a.lon() - b.lon();
    dlat * dlat + dlon * dlon
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    #[instrument(skip(self))]
    async fn forward(&self, address: &str) -> Result<LatLon, GeocodeError> {
        let needle = address.trim().to_lowercase();
        if needle.is_empty() {
            return Err(GeocodeError::NoMatch {
                query: address.to_string(),
            });
        }
        self.entries
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(_, location)| *location)
            .ok_or_else(|| GeocodeError::NoMatch {
                query: address.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn reverse(&self, location: LatLon) -> Result<String, GeocodeError> {
        let nearest = self.entries.iter().min_by(|(_, a), (_, b)| {
            squared_distance(*a, location).total_cmp(&squared_distance(*b, location))
        });
        debug!(found = nearest.is_some(), "reverse lookup");
        nearest
            .map(|(name, _)| name.clone())
            .ok_or_else(|| GeocodeError::NoMatch {
                query: format!("{:.5},{:.5}", location.lat(), location.lon()),
            })
    }
}
