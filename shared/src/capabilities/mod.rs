mod focus;
mod geocode;
mod store;
mod timer;

pub use crux_core::render::Render;

pub use self::focus::{Focus, FocusOperation};
pub use self::geocode::{
    execute as execute_geocode, FixedGeocoder, Geocode, GeocodeError, GeocodeOperation,
    GeocodeOutput, GeocodeResult, Geocoder,
};
pub use self::store::{
    execute as execute_store, sample_incidents, IncidentStore, MemoryIncidentStore, Store,
    StoreError, StoreOperation, StoreOutput, StoreResult, StoreTag,
};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

use crate::app::App;
use crate::event::Event;

/// Everything the core can ask of its shell.
///
/// The derived `Effect` enum has one variant per field, named after the
/// capability type: `Render`, `Store`, `Timer`, `Geocode` and `Focus`.
#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub store: Store<Event>,
    pub timer: Timer<Event>,
    pub geocode: Geocode<Event>,
    pub focus: Focus<Event>,
}
