//! Resource selection on the dispatch screen.

use serde::{Deserialize, Serialize};

/// One unit that can be sent to an incident.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DispatchResource {
    pub agency: String,
    pub capacity: String,
    pub eta_minutes: u32,
    pub selected: bool,
}

impl DispatchResource {
    fn available(agency: &str, capacity: &str, eta_minutes: u32) -> Self {
        Self {
            agency: agency.to_string(),
            capacity: capacity.to_string(),
            eta_minutes,
            selected: false,
        }
    }
}

/// Resources offered for the selected incident. Rebuilt, with nothing
/// selected, every time the dispatch screen is entered.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DispatchBoard {
    resources: Vec<DispatchResource>,
}

impl Default for DispatchBoard {
    fn default() -> Self {
        Self::new(vec![
            DispatchResource::available(
                "Bomberos Madrid - Estación Central",
                "4 efectivos, 1 autobomba",
                7,
            ),
            DispatchResource::available("SAMUR - Unidad 23", "2 paramédicos, 1 ambulancia", 5),
            DispatchResource::available(
                "Policía Municipal - Patrulla 15",
                "2 agentes, 1 vehículo",
                4,
            ),
            DispatchResource::available(
                "Bomberos Madrid - Estación Norte",
                "6 efectivos, 2 autobombas",
                12,
            ),
        ])
    }
}

impl DispatchBoard {
    pub fn new(resources: Vec<DispatchResource>) -> Self {
        Self { resources }
    }

    pub fn resources(&self) -> &[DispatchResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Flip the selection of the resource at `index`. Returns the new state,
    /// or `None` when there is no such resource.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let resource = self.resources.get_mut(index)?;
        resource.selected = !resource.selected;
        Some(resource.selected)
    }

    pub fn selected_count(&self) -> u32 {
        let count = self.resources.iter().filter(|r| r.selected).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// "1 recurso seleccionado" / "3 recursos seleccionados", hidden when
    /// nothing is selected.
    pub fn summary(&self) -> Option<String> {
        match self.selected_count() {
            0 => None,
            1 => Some("1 recurso seleccionado".to_string()),
            n => Some(format!("{n} recursos seleccionados")),
        }
    }

    pub fn dispatch_label(&self) -> String {
        format!("Despachar recursos ({})", self.selected_count())
    }
}
