use serde::{Deserialize, Serialize};

use crate::filter_menu::{FilterMenu, MenuInput, MenuItem, MenuResponse};
use crate::model::{Incident, IncidentStatus, IncidentType, Priority};
use crate::query::{query, Filter, FilterState, QueryResult, SortOrder};
use crate::DEFAULT_FILTER_VALUE;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Type,
    Priority,
    Status,
    Sort,
}

impl MenuKind {
    pub const ALL: [MenuKind; 4] = [Self::Type, Self::Priority, Self::Status, Self::Sort];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DashboardMenus {
    pub type_menu: FilterMenu,
    pub priority_menu: FilterMenu,
    pub status_menu: FilterMenu,
    pub sort_menu: FilterMenu,
}

impl Default for DashboardMenus {
    fn default() -> Self {
        Self {
            type_menu: FilterMenu::new(
                "Tipo",
                "Todos",
                IncidentType::ALL
                    .iter()
                    .map(|t| MenuItem::new(t.as_str(), t.label())),
            ),
            priority_menu: FilterMenu::new(
                "Prioridad",
                "Todas",
                Priority::ALL
                    .iter()
                    .map(|p| MenuItem::new(p.as_str(), p.label())),
            ),
            status_menu: FilterMenu::new(
                "Estado",
                "Todos",
                IncidentStatus::TRACKED
                    .iter()
                    .map(|s| MenuItem::new(s.as_str(), s.label())),
            ),
            sort_menu: FilterMenu::new(
                "Ordenar",
                "Más recientes",
                [
                    MenuItem::new(SortOrder::MostRecentFirst.as_value(), "Más recientes"),
                    MenuItem::new(SortOrder::OldestFirst.as_value(), "Más antiguas"),
                ],
            ),
        }
    }
}

impl DashboardMenus {
    pub fn get(&self, kind: MenuKind) -> &FilterMenu {
        match kind {
            MenuKind::Type => &self.type_menu,
            MenuKind::Priority => &self.priority_menu,
            MenuKind::Status => &self.status_menu,
            MenuKind::Sort => &self.sort_menu,
        }
    }

    pub fn get_mut(&mut self, kind: MenuKind) -> &mut FilterMenu {
        match kind {
            MenuKind::Type => &mut self.type_menu,
            MenuKind::Priority => &mut self.priority_menu,
            MenuKind::Status => &mut self.status_menu,
            MenuKind::Sort => &mut self.sort_menu,
        }
    }
}

fn filter_value<T>(filter: &Filter<T>, as_str: impl Fn(&T) -> &'static str) -> String {
    match filter {
        Filter::All => DEFAULT_FILTER_VALUE.to_string(),
        Filter::Only(value) => as_str(value).to_string(),
    }
}

/// View state of one mounted dashboard. Replaced wholesale on every mount,
/// so nothing here survives a change of `epoch`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardState {
    pub epoch: u64,
    pub incidents: Vec<Incident>,
    pub loading: bool,
    /// Sample data has already been requested for this mount.
    pub seeded: bool,
    pub filters: FilterState,
    pub menus: DashboardMenus,
}

impl DashboardState {
    pub fn mount(epoch: u64) -> Self {
        Self {
            epoch,
            incidents: Vec::new(),
            loading: true,
            seeded: false,
            filters: FilterState::default(),
            menus: DashboardMenus::default(),
        }
    }

    /// Current value of the filter bound to `kind`, as menu item value.
    pub fn menu_value(&self, kind: MenuKind) -> String {
        match kind {
            MenuKind::Type => filter_value(&self.filters.type_filter, |t| t.as_str()),
            MenuKind::Priority => filter_value(&self.filters.priority_filter, |p| p.as_str()),
            MenuKind::Status => filter_value(&self.filters.status_filter, |s| s.as_str()),
            MenuKind::Sort => self.filters.sort_order.as_value().to_string(),
        }
    }

    pub fn apply_selection(&mut self, kind: MenuKind, value: &str) {
        match kind {
            MenuKind::Type => {
                self.filters.type_filter = Filter::from_value(value, IncidentType::from_value);
            }
            MenuKind::Priority => {
                self.filters.priority_filter = Filter::from_value(value, Priority::from_value);
            }
            MenuKind::Status => {
                self.filters.status_filter = Filter::from_value(value, IncidentStatus::from_value);
            }
            MenuKind::Sort => self.filters.sort_order = SortOrder::from_value(value),
        }
    }

    /// Route one interaction to a menu and apply whatever it selected.
    pub fn handle_menu(&mut self, kind: MenuKind, input: MenuInput) -> MenuResponse {
        let value = self.menu_value(kind);
        let response = self.menus.get_mut(kind).handle(input, &value);
        if let Some(selected) = &response.selected {
            self.apply_selection(kind, selected);
        }
        response
    }

    pub fn trigger_label(&self, kind: MenuKind) -> String {
        self.menus.get(kind).trigger_label(&self.menu_value(kind))
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filters.search_text = text.into();
    }

    pub fn query(&self) -> QueryResult {
        query(&self.incidents, &self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_menu::MenuKey;
    use crate::model::{IncidentId, LatLon, UnixTimeMs};

    fn incident(id: &str, incident_type: IncidentType, created_at: u64) -> Incident {
        Incident {
            id: IncidentId::new(id),
            incident_type,
            priority: Priority::P2,
            address: "Calle Mayor 1".into(),
            location: LatLon::MADRID,
            description: String::new(),
            status: IncidentStatus::New,
            created_at: UnixTimeMs(created_at),
            updated_at: None,
        }
    }

    #[test]
    fn mount_starts_loading_with_defaults() {
        let state = DashboardState::mount(3);
        assert_eq!(state.epoch, 3);
        assert!(state.loading);
        assert!(!state.seeded);
        assert_eq!(state.filters, FilterState::default());
        assert!(MenuKind::ALL.iter().all(|k| !state.menus.get(*k).is_open()));
    }

    #[test]
    fn menu_selection_updates_filters() {
        let mut state = DashboardState::mount(0);
        state.handle_menu(MenuKind::Type, MenuInput::Key(MenuKey::ArrowDown));
        state.handle_menu(MenuKind::Type, MenuInput::Key(MenuKey::ArrowDown));
        let response = state.handle_menu(MenuKind::Type, MenuInput::Key(MenuKey::Enter));

        assert_eq!(response.selected.as_deref(), Some("fire"));
        assert_eq!(state.filters.type_filter, Filter::Only(IncidentType::Fire));
        assert_eq!(state.trigger_label(MenuKind::Type), "Tipo: Incendio");
        assert_eq!(state.menu_value(MenuKind::Type), "fire");
    }

    #[test]
    fn selecting_default_clears_filter() {
        let mut state = DashboardState::mount(0);
        state.apply_selection(MenuKind::Status, "in-progress");
        assert_eq!(
            state.filters.status_filter,
            Filter::Only(IncidentStatus::InProgress)
        );
        state.apply_selection(MenuKind::Status, "all");
        assert_eq!(state.filters.status_filter, Filter::All);
    }

    #[test]
    fn sort_menu_opens_on_current_order() {
        let mut state = DashboardState::mount(0);
        assert_eq!(state.trigger_label(MenuKind::Sort), "Ordenar: Más recientes");

        state.apply_selection(MenuKind::Sort, "oldest");
        assert_eq!(state.filters.sort_order, SortOrder::OldestFirst);
        let response = state.handle_menu(MenuKind::Sort, MenuInput::TriggerClicked);
        assert_eq!(
            response.focus,
            Some(crate::filter_menu::FocusRequest::Item(2))
        );
        assert_eq!(state.trigger_label(MenuKind::Sort), "Ordenar: Más antiguas");
    }

    #[test]
    fn query_uses_current_filters() {
        let mut state = DashboardState::mount(0);
        state.incidents = vec![
            incident("INC-1", IncidentType::Fire, 1),
            incident("INC-2", IncidentType::Snow, 2),
        ];
        state.apply_selection(MenuKind::Type, "snow");
        let result = state.query();
        assert_eq!(result.list.len(), 1);
        assert_eq!(result.list[0].id.as_str(), "INC-2");
    }
}
