use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Role;

/// Every screen of the console. `Entry` is shared; the rest belong to exactly
/// one role pipeline.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Entry,

    // Dispatcher pipeline ("sala")
    Dashboard,
    NewIncident,
    IncidentDetail,
    Classification,
    Dispatch,
    DispatchConfirmation,

    // Field pipeline ("campo")
    Mission,
    Navigation,
    ReportNovelty,
    EvidenceCollection,
    Closure,
    ClosureFeedback,
}

impl Screen {
    pub const fn pipeline(self) -> Option<Role> {
        match self {
            Self::Entry => None,
            Self::Dashboard
            | Self::NewIncident
            | Self::IncidentDetail
            | Self::Classification
            | Self::Dispatch
            | Self::DispatchConfirmation => Some(Role::Dispatcher),
            Self::Mission
            | Self::Navigation
            | Self::ReportNovelty
            | Self::EvidenceCollection
            | Self::Closure
            | Self::ClosureFeedback => Some(Role::Field),
        }
    }

    /// Dispatcher screens other than the dashboard itself.
    pub const fn is_dispatcher_sub_screen(self) -> bool {
        matches!(self.pipeline(), Some(Role::Dispatcher)) && !matches!(self, Self::Dashboard)
    }

    /// Screens offering the evidence overlay.
    pub const fn shows_evidences(self) -> bool {
        matches!(
            self,
            Self::Mission | Self::EvidenceCollection | Self::Closure | Self::ClosureFeedback
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Dashboard => "dashboard",
            Self::NewIncident => "new_incident",
            Self::IncidentDetail => "incident_detail",
            Self::Classification => "classification",
            Self::Dispatch => "dispatch",
            Self::DispatchConfirmation => "dispatch_confirmation",
            Self::Mission => "mission",
            Self::Navigation => "navigation",
            Self::ReportNovelty => "report_novelty",
            Self::EvidenceCollection => "evidence_collection",
            Self::Closure => "closure",
            Self::ClosureFeedback => "closure_feedback",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipelines_are_disjoint() {
        assert_eq!(Screen::Entry.pipeline(), None);
        assert_eq!(Screen::Dispatch.pipeline(), Some(Role::Dispatcher));
        assert_eq!(Screen::ClosureFeedback.pipeline(), Some(Role::Field));
    }

    #[test]
    fn dashboard_is_not_a_sub_screen() {
        assert!(!Screen::Dashboard.is_dispatcher_sub_screen());
        assert!(Screen::DispatchConfirmation.is_dispatcher_sub_screen());
        assert!(!Screen::Mission.is_dispatcher_sub_screen());
    }
}
