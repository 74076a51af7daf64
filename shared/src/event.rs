use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::auth::CredentialField;
use crate::capabilities::{GeocodeResult, StoreResult, StoreTag, TimerId};
use crate::dashboard::MenuKind;
use crate::filter_menu::MenuInput;
use crate::model::{IncidentId, IncidentType, Priority, Role};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// One edit to the new-incident form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftEdit {
    Type(IncidentType),
    Priority(Priority),
    Address(String),
    Description(String),
}

/// Every input the core reacts to: user actions from the shell and replies
/// to effects it requested.
///
/// Not `Serialize`: the credential submission carries a secret.
#[derive(Deserialize, Clone, Debug)]
pub enum Event {
    // --- Entry ---
    AuthSubmitted {
        email: String,
        password: SecretString,
        role: Role,
        mode: AuthMode,
    },
    CredentialEdited {
        field: CredentialField,
    },

    // --- Dispatcher pipeline ---
    SearchChanged {
        text: String,
    },
    Menu {
        menu: MenuKind,
        input: MenuInput,
    },
    NewIncidentRequested,
    DraftEdited(DraftEdit),
    AddressLookupRequested,
    LocationPicked {
        lat: f64,
        lon: f64,
    },
    CreateIncidentSubmitted,
    IncidentSelected {
        id: IncidentId,
    },
    ClassifyRequested,
    DispatchRequested,
    DeleteRequested,
    DeleteCancelled,
    DeleteConfirmed,
    ClassificationConfirmed {
        priority: Priority,
        incident_type: IncidentType,
    },
    /// Select or deselect one resource on the dispatch screen.
    ResourceToggled {
        index: usize,
    },
    /// Send every selected resource.
    ResourcesDispatched,
    BackToDetail,
    BackToDashboard,

    // --- Field pipeline ---
    MissionAccepted,
    NoveltyReportRequested,
    NoveltySent,
    NoveltyCancelled,
    ArrivedOnSite,
    EvidencesSent,
    MissionClosed,
    BackToMission,
    EvidencesViewed,
    EvidencesClosed,

    // --- Global ---
    GoHome,
    ToastDismissed,

    // --- Effect replies ---
    StoreResponded {
        tag: StoreTag,
        result: Box<StoreResult>,
    },
    GeocodeResponded {
        result: Box<GeocodeResult>,
    },
    TimerFired {
        id: TimerId,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AuthSubmitted { .. } => "auth_submitted",
            Self::CredentialEdited { .. } => "credential_edited",
            Self::SearchChanged { .. } => "search_changed",
            Self::Menu { .. } => "menu",
            Self::NewIncidentRequested => "new_incident_requested",
            Self::DraftEdited(_) => "draft_edited",
            Self::AddressLookupRequested => "address_lookup_requested",
            Self::LocationPicked { .. } => "location_picked",
            Self::CreateIncidentSubmitted => "create_incident_submitted",
            Self::IncidentSelected { .. } => "incident_selected",
            Self::ClassifyRequested => "classify_requested",
            Self::DispatchRequested => "dispatch_requested",
            Self::DeleteRequested => "delete_requested",
            Self::DeleteCancelled => "delete_cancelled",
            Self::DeleteConfirmed => "delete_confirmed",
            Self::ClassificationConfirmed { .. } => "classification_confirmed",
            Self::ResourceToggled { .. } => "resource_toggled",
            Self::ResourcesDispatched => "resources_dispatched",
            Self::BackToDetail => "back_to_detail",
            Self::BackToDashboard => "back_to_dashboard",
            Self::MissionAccepted => "mission_accepted",
            Self::NoveltyReportRequested => "novelty_report_requested",
            Self::NoveltySent => "novelty_sent",
            Self::NoveltyCancelled => "novelty_cancelled",
            Self::ArrivedOnSite => "arrived_on_site",
            Self::EvidencesSent => "evidences_sent",
            Self::MissionClosed => "mission_closed",
            Self::BackToMission => "back_to_mission",
            Self::EvidencesViewed => "evidences_viewed",
            Self::EvidencesClosed => "evidences_closed",
            Self::GoHome => "go_home",
            Self::ToastDismissed => "toast_dismissed",
            Self::StoreResponded { .. } => "store_responded",
            Self::GeocodeResponded { .. } => "geocode_responded",
            Self::TimerFired { .. } => "timer_fired",
        }
    }

    /// Replies to effects, as opposed to user actions.
    #[must_use]
    pub const fn is_effect_reply(&self) -> bool {
        matches!(
            self,
            Self::StoreResponded { .. } | Self::GeocodeResponded { .. } | Self::TimerFired { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted_in_debug() {
        let event = Event::AuthSubmitted {
            email: "jefe@cceu.sala.es".into(),
            password: SecretString::new("hunter2hunter2".into()),
            role: Role::Dispatcher,
            mode: AuthMode::Login,
        };
        let debug = format!("{event:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(event.name(), "auth_submitted");
    }

    #[test]
    fn events_deserialize_from_shell_json() {
        let event: Event = serde_json::from_str(
            r#"{"Menu":{"menu":"priority","input":{"key":"ArrowDown"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            Event::Menu {
                menu: MenuKind::Priority,
                input: MenuInput::Key(crate::filter_menu::MenuKey::ArrowDown)
            }
        ));

        let event: Event = serde_json::from_str(r#"{"TimerFired":{"id":4}}"#).unwrap();
        assert!(event.is_effect_reply());
    }
}
