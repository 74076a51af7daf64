//! Render-ready projection of the [`Model`].
//!
//! Everything a shell needs to draw a screen is computed here; shells never
//! read the model directly.

use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::dashboard::{DashboardState, MenuKind};
use crate::dispatch::DispatchBoard;
use crate::model::{DetailState, Incident, IncidentDraft, Model, Role};
use crate::notification::{ToastKind, ToastMessage};
use crate::query::{Marker, PriorityCounts, StatusCounts};
use crate::screen::Screen;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub email: String,
    pub role: Role,
    pub role_label: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
}

impl From<&ToastMessage> for ToastView {
    fn from(toast: &ToastMessage) -> Self {
        Self {
            message: toast.message.clone(),
            kind: toast.kind,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthView {
    pub email_error: Option<String>,
    pub password_error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MenuItemView {
    pub value: String,
    pub label: String,
    /// `aria-checked`
    pub checked: bool,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MenuView {
    pub kind: MenuKind,
    pub trigger_label: String,
    /// `aria-expanded`
    pub is_open: bool,
    pub items: Vec<MenuItemView>,
}

impl MenuView {
    fn new(dashboard: &DashboardState, kind: MenuKind) -> Self {
        let menu = dashboard.menus.get(kind);
        let value = dashboard.menu_value(kind);
        let selected = menu.selected_index(&value);
        let items = menu
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| MenuItemView {
                value: item.value.clone(),
                label: item.label.clone(),
                checked: index == selected,
                active: menu.is_open() && index == menu.active_index(),
            })
            .collect();
        Self {
            kind,
            trigger_label: dashboard.trigger_label(kind),
            is_open: menu.is_open(),
            items,
        }
    }
}

/// One row of the incident list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IncidentCard {
    pub id: String,
    pub type_label: String,
    pub priority: String,
    pub priority_label: String,
    pub status_label: String,
    pub address: String,
    pub created_at: u64,
}

impl From<&Incident> for IncidentCard {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id.to_string(),
            type_label: incident.incident_type.label().to_string(),
            priority: incident.priority.as_str().to_string(),
            priority_label: incident.priority.label().to_string(),
            status_label: incident.status.label().to_string(),
            address: incident.address.clone(),
            created_at: incident.created_at.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub epoch: u64,
    pub loading: bool,
    pub search_text: String,
    pub incidents: Vec<IncidentCard>,
    pub priority_counts: PriorityCounts,
    pub status_counts: StatusCounts,
    pub markers: Vec<Marker>,
    /// "Mostrando X de Y incidencias"
    pub summary: String,
    pub menus: Vec<MenuView>,
}

impl From<&DashboardState> for DashboardView {
    fn from(dashboard: &DashboardState) -> Self {
        let result = dashboard.query();
        Self {
            epoch: dashboard.epoch,
            loading: dashboard.loading,
            search_text: dashboard.filters.search_text.clone(),
            summary: format!(
                "Mostrando {} de {} incidencias",
                result.list.len(),
                result.total_considered
            ),
            incidents: result.list.iter().map(IncidentCard::from).collect(),
            priority_counts: result.priority_counts,
            status_counts: result.status_counts,
            markers: result.markers,
            menus: MenuKind::ALL
                .iter()
                .map(|kind| MenuView::new(dashboard, *kind))
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DraftView {
    pub incident_type: String,
    pub priority: String,
    pub address: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    pub address_error: Option<String>,
    pub geocode_message: Option<String>,
    pub is_geocoding: bool,
}

impl From<&IncidentDraft> for DraftView {
    fn from(draft: &IncidentDraft) -> Self {
        Self {
            incident_type: draft.incident_type.as_str().to_string(),
            priority: draft.priority.as_str().to_string(),
            address: draft.address.clone(),
            description: draft.description.clone(),
            lat: draft.location.lat(),
            lon: draft.location.lon(),
            address_error: draft.errors.address.clone(),
            geocode_message: draft.geocode_message.clone(),
            is_geocoding: draft.is_geocoding,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailStatus {
    Loading,
    Loaded,
    NotFound,
    Failed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetailView {
    pub status: DetailStatus,
    pub incident: Option<Incident>,
    pub delete_confirmation_open: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceRow {
    pub agency: String,
    pub capacity: String,
    /// "7 min"
    pub eta: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DispatchView {
    pub resources: Vec<ResourceRow>,
    pub selected_count: u32,
    pub summary: Option<String>,
    pub dispatch_label: String,
    pub can_dispatch: bool,
}

impl From<&DispatchBoard> for DispatchView {
    fn from(board: &DispatchBoard) -> Self {
        Self {
            resources: board
                .resources()
                .iter()
                .map(|r| ResourceRow {
                    agency: r.agency.clone(),
                    capacity: r.capacity.clone(),
                    eta: format!("{} min", r.eta_minutes),
                    selected: r.selected,
                })
                .collect(),
            selected_count: board.selected_count(),
            summary: board.summary(),
            dispatch_label: board.dispatch_label(),
            can_dispatch: board.selected_count() > 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub screen: Screen,
    pub session: Option<SessionView>,
    pub toast: Option<ToastView>,
    pub is_busy: bool,
    pub evidences_open: bool,
    pub auth: AuthView,
    pub dashboard: Option<DashboardView>,
    pub draft: Option<DraftView>,
    pub detail: Option<DetailView>,
    pub dispatch: Option<DispatchView>,
    pub last_dispatched_count: u32,
    pub dashboard_epoch: u64,
    pub pending_transition: Option<TimerId>,
}

impl ViewModel {
    pub fn from_model(model: &Model) -> Self {
        let detail = match &model.detail {
            DetailState::Idle => None,
            DetailState::Loading => Some((DetailStatus::Loading, None)),
            DetailState::Loaded(incident) => Some((DetailStatus::Loaded, Some((**incident).clone()))),
            DetailState::NotFound => Some((DetailStatus::NotFound, None)),
            DetailState::Failed => Some((DetailStatus::Failed, None)),
        }
        .map(|(status, incident)| DetailView {
            status,
            incident,
            delete_confirmation_open: model.delete_confirmation_open,
        });

        Self {
            screen: model.screen,
            session: model.session.as_ref().map(|s| SessionView {
                email: s.email.clone(),
                role: s.role,
                role_label: s.role.label().to_string(),
            }),
            toast: model.notifications.visible().map(ToastView::from),
            is_busy: model.is_busy,
            evidences_open: model.evidences_open,
            auth: AuthView {
                email_error: model.auth_errors.email.as_ref().map(|e| e.user_message()),
                password_error: model.auth_errors.password.as_ref().map(|e| e.user_message()),
            },
            dashboard: model.dashboard.as_ref().map(DashboardView::from),
            draft: (model.screen == Screen::NewIncident).then(|| DraftView::from(&model.draft)),
            detail,
            dispatch: (model.screen == Screen::Dispatch).then(|| DispatchView::from(&model.dispatch)),
            last_dispatched_count: model.last_dispatched_count,
            dashboard_epoch: model.dashboard_epoch,
            pending_transition: model.pending.as_ref().map(|p| p.timer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::sample_incidents;
    use crate::filter_menu::{MenuInput, MenuKey};
    use crate::model::IncidentType;

    fn dashboard_model() -> Model {
        let mut model = Model::new();
        model.screen = Screen::Dashboard;
        let mut dashboard = DashboardState::mount(0);
        dashboard.incidents = sample_incidents();
        dashboard.loading = false;
        model.dashboard = Some(dashboard);
        model
    }

    #[test]
    fn entry_view_has_no_screen_sections() {
        let view = ViewModel::from_model(&Model::new());
        assert_eq!(view.screen, Screen::Entry);
        assert!(view.session.is_none());
        assert!(view.dashboard.is_none());
        assert!(view.draft.is_none());
        assert!(view.detail.is_none());
    }

    #[test]
    fn dashboard_summary_reflects_filters() {
        let mut model = dashboard_model();
        let total = ViewModel::from_model(&model)
            .dashboard
            .unwrap()
            .incidents
            .len();

        if let Some(dashboard) = model.dashboard.as_mut() {
            dashboard.apply_selection(MenuKind::Type, IncidentType::Fire.as_str());
        }
        let view = ViewModel::from_model(&model).dashboard.unwrap();
        assert!(view.incidents.len() < total);
        assert_eq!(
            view.summary,
            format!("Mostrando {} de {} incidencias", view.incidents.len(), total)
        );
        assert_eq!(view.markers.len(), view.incidents.len());
        assert_eq!(view.menus[0].trigger_label, "Tipo: Incendio");
    }

    #[test]
    fn open_menu_marks_checked_and_active_items() {
        let mut model = dashboard_model();
        if let Some(dashboard) = model.dashboard.as_mut() {
            dashboard.handle_menu(MenuKind::Priority, MenuInput::TriggerClicked);
            dashboard.handle_menu(MenuKind::Priority, MenuInput::Key(MenuKey::ArrowDown));
        }
        let view = ViewModel::from_model(&model).dashboard.unwrap();
        let menu = view
            .menus
            .iter()
            .find(|m| m.kind == MenuKind::Priority)
            .unwrap();
        assert!(menu.is_open);
        assert!(menu.items[0].checked);
        assert!(menu.items[1].active);
        assert_eq!(menu.items.iter().filter(|i| i.checked).count(), 1);
    }

    #[test]
    fn draft_only_on_new_incident() {
        let mut model = Model::new();
        model.screen = Screen::NewIncident;
        model.draft.errors.address = Some("La dirección es obligatoria".into());
        let draft = ViewModel::from_model(&model).draft.unwrap();
        assert_eq!(draft.incident_type, "fire");
        assert_eq!(draft.priority, "P2");
        assert_eq!(draft.address_error.as_deref(), Some("La dirección es obligatoria"));
    }

    #[test]
    fn dispatch_view_tracks_selection() {
        let mut model = Model::new();
        model.screen = Screen::Dispatch;
        model.dispatch.toggle(0);
        model.dispatch.toggle(2);
        let dispatch = ViewModel::from_model(&model).dispatch.unwrap();
        assert_eq!(dispatch.resources.len(), 4);
        assert_eq!(dispatch.resources[0].eta, "7 min");
        assert_eq!(dispatch.selected_count, 2);
        assert_eq!(dispatch.summary.as_deref(), Some("2 recursos seleccionados"));
        assert_eq!(dispatch.dispatch_label, "Despachar recursos (2)");
        assert!(dispatch.can_dispatch);

        model.screen = Screen::DispatchConfirmation;
        assert!(ViewModel::from_model(&model).dispatch.is_none());
    }
}
