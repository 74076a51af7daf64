//! Incident store capability.
//!
//! The core never talks to storage itself; it requests a [`StoreOperation`]
//! and the shell resolves it with a [`StoreResult`]. [`IncidentStore`] is the
//! contract the shell executes against.

use async_trait::async_trait;
use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::model::{
    Incident, IncidentId, IncidentPatch, IncidentStatus, IncidentType, LatLon, NewIncident,
    Priority, UnixTimeMs,
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StoreOperation {
    List,
    Get { id: IncidentId },
    Create(NewIncident),
    Update { id: IncidentId, patch: IncidentPatch },
    Delete { id: IncidentId },
    SeedSampleData,
}

impl StoreOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get { .. } => "get",
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::SeedSampleData => "seed_sample_data",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StoreOutput {
    Listed(Vec<Incident>),
    Fetched(Incident),
    Created(Incident),
    Updated(Incident),
    Deleted { id: IncidentId },
    Seeded,
}

#[derive(Error, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("incident {id} not found")]
    NotFound { id: IncidentId },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("store rejected the request: {message}")]
    Rejected { message: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type StoreResult = Result<StoreOutput, StoreError>;

impl Operation for StoreOperation {
    type Output = StoreResult;
}

/// What a store reply is for. Captured by the request callback so the core
/// can match replies to the request that caused them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum StoreTag {
    LoadDashboard { epoch: u64 },
    SeedDashboard { epoch: u64 },
    LoadDetail { id: IncidentId },
    CreateIncident,
    Classify { id: IncidentId },
    DeleteIncident { id: IncidentId },
}

pub struct Store<Ev> {
    context: CapabilityContext<StoreOperation, Ev>,
}

impl<Ev> Capability<Ev> for Store<Ev> {
    type Operation = StoreOperation;
    type MappedSelf<MappedEv> = Store<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Store::new(self.context.map_event(f))
    }
}

impl<Ev> Store<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<StoreOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn request<F>(&self, operation: StoreOperation, callback: F)
    where
        F: FnOnce(StoreResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn list_incidents(&self) -> Result<Vec<Incident>, StoreError>;
    async fn get_incident(&self, id: &IncidentId) -> Result<Incident, StoreError>;
    async fn create_incident(&self, fields: NewIncident) -> Result<Incident, StoreError>;
    async fn update_incident(
        &self,
        id: &IncidentId,
        patch: IncidentPatch,
    ) -> Result<Incident, StoreError>;
    async fn delete_incident(&self, id: &IncidentId) -> Result<(), StoreError>;
    async fn seed_sample_data(&self) -> Result<(), StoreError>;
}

/// Run one operation against a store and wrap the outcome for the core.
pub async fn execute<S: IncidentStore + ?Sized>(store: &S, operation: StoreOperation) -> StoreResult {
    match operation {
        StoreOperation::List => store.list_incidents().await.map(StoreOutput::Listed),
        StoreOperation::Get { id } => store.get_incident(&id).await.map(StoreOutput::Fetched),
        StoreOperation::Create(fields) => {
            store.create_incident(fields).await.map(StoreOutput::Created)
        }
        StoreOperation::Update { id, patch } => store
            .update_incident(&id, patch)
            .await
            .map(StoreOutput::Updated),
        StoreOperation::Delete { id } => {
            store.delete_incident(&id).await?;
            Ok(StoreOutput::Deleted { id })
        }
        StoreOperation::SeedSampleData => {
            store.seed_sample_data().await?;
            Ok(StoreOutput::Seeded)
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    incidents: Vec<Incident>,
    next_sequence: u32,
}

/// Process-local incident store. Insertion order is preserved.
#[derive(Debug)]
pub struct MemoryIncidentStore {
    inner: RwLock<Inner>,
    clock: fn() -> UnixTimeMs,
}

impl Default for MemoryIncidentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        Self::with_clock(UnixTimeMs::now)
    }

    /// Store whose creation/update timestamps come from `clock`.
    pub fn with_clock(clock: fn() -> UnixTimeMs) -> Self {
        Self {
            inner: RwLock::new(Inner {
                incidents: Vec::new(),
                next_sequence: FIRST_SEQUENCE,
            }),
            clock,
        }
    }

    pub fn with_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                incidents,
                next_sequence: FIRST_SEQUENCE,
            }),
            clock: UnixTimeMs::now,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.incidents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

const FIRST_SEQUENCE: u32 = 200;

fn format_id(now: UnixTimeMs, sequence: u32) -> Result<IncidentId, StoreError> {
    let year = now.year().ok_or_else(|| StoreError::Rejected {
        message: format!("timestamp {} out of range", now.0),
    })?;
    Ok(IncidentId::new(format!("INC-{year}-{sequence:05}")))
}

#[async_trait]
impl IncidentStore for MemoryIncidentStore {
    #[instrument(skip(self))]
    async fn list_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let inner = self.inner.read().await;
        debug!(count = inner.incidents.len(), "listing incidents");
        Ok(inner.incidents.clone())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_incident(&self, id: &IncidentId) -> Result<Incident, StoreError> {
        let inner = self.inner.read().await;
        inner
            .incidents
            .iter()
            .find(|incident| &incident.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    #[instrument(skip(self, draft), fields(incident_type = draft.incident_type.as_str()))]
    async fn create_incident(&self, draft: NewIncident) -> Result<Incident, StoreError> {
        if draft.address.trim().is_empty() {
            return Err(StoreError::Rejected {
                message: "address is required".into(),
            });
        }

        let now = (self.clock)();
        let mut inner = self.inner.write().await;
        let mut id = format_id(now, inner.next_sequence)?;
        while inner.incidents.iter().any(|incident| incident.id == id) {
            inner.next_sequence += 1;
            id = format_id(now, inner.next_sequence)?;
        }
        inner.next_sequence += 1;

        let incident = Incident {
            id,
            incident_type: draft.incident_type,
            priority: draft.priority,
            address: draft.address,
            location: draft.location,
            description: draft.description,
            status: IncidentStatus::New,
            created_at: now,
            updated_at: None,
        };
        inner.incidents.push(incident.clone());
        info!(id = %incident.id, "incident created");
        Ok(incident)
    }

    #[instrument(skip(self, patch), fields(id = %id))]
    async fn update_incident(
        &self,
        id: &IncidentId,
        patch: IncidentPatch,
    ) -> Result<Incident, StoreError> {
        let now = (self.clock)();
        let mut inner = self.inner.write().await;
        let incident = inner
            .incidents
            .iter_mut()
            .find(|incident| &incident.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        patch.apply(incident, now);
        Ok(incident.clone())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_incident(&self, id: &IncidentId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.incidents.len();
        inner.incidents.retain(|incident| &incident.id != id);
        if inner.incidents.len() == before {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        info!("incident deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn seed_sample_data(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.incidents.is_empty() {
            debug!("store already populated; skipping seed");
            return Ok(());
        }
        inner.incidents = sample_incidents();
        info!(count = inner.incidents.len(), "sample data seeded");
        Ok(())
    }
}

/// Demo dataset for an empty store.
pub fn sample_incidents() -> Vec<Incident> {
    // 2025-01-15T08:00:00Z
    const BASE: u64 = 1_736_928_000_000;
    const HOUR: u64 = 3_600_000;

    let rows: [(&str, IncidentType, Priority, IncidentStatus, &str, f64, f64, &str, u64); 6] = [
        (
            "INC-2025-00123",
            IncidentType::Fire,
            Priority::P1,
            IncidentStatus::New,
            "Calle de Alcalá 123, Madrid",
            40.4237,
            -3.6795,
            "Incendio en cocina de vivienda, humo visible desde la calle",
            5,
        ),
        (
            "INC-2025-00124",
            IncidentType::Flood,
            Priority::P2,
            IncidentStatus::InProgress,
            "Gran Vía 45, Madrid",
            40.4203,
            -3.7058,
            "Inundación en garaje subterráneo",
            4,
        ),
        (
            "INC-2025-00125",
            IncidentType::Snow,
            Priority::P3,
            IncidentStatus::Assigned,
            "Paseo de la Castellana 200, Madrid",
            40.4634,
            -3.6889,
            "Acumulación de nieve en acceso principal",
            3,
        ),
        (
            "INC-2025-00126",
            IncidentType::Fire,
            Priority::P2,
            IncidentStatus::Assigned,
            "Calle de Atocha 80, Madrid",
            40.4120,
            -3.6995,
            "Conato de incendio en contenedor",
            2,
        ),
        (
            "INC-2025-00127",
            IncidentType::Flood,
            Priority::P1,
            IncidentStatus::New,
            "Calle de Toledo 12, Madrid",
            40.4125,
            -3.7085,
            "Rotura de tubería general",
            1,
        ),
        (
            "INC-2025-00128",
            IncidentType::Snow,
            Priority::P2,
            IncidentStatus::InProgress,
            "Plaza de Castilla 1, Madrid",
            40.4669,
            -3.6890,
            "Placas de hielo en calzada",
            0,
        ),
    ];

    rows.into_iter()
        .filter_map(
            |(id, incident_type, priority, status, address, lat, lon, description, offset)| {
                Some(Incident {
                    id: IncidentId::new(id),
                    incident_type,
                    priority,
                    address: address.to_string(),
                    location: LatLon::new(lat, lon).ok()?,
                    description: description.to_string(),
                    status,
                    created_at: UnixTimeMs(BASE + offset * HOUR),
                    updated_at: None,
                })
            },
        )
        .collect()
}
