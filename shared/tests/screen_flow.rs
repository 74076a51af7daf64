mod common;

use common::TestShell;
use secrecy::SecretString;
use shared::capabilities::FocusOperation;
use shared::dashboard::MenuKind;
use shared::event::{AuthMode, DraftEdit};
use shared::filter_menu::{FocusRequest, MenuInput, MenuKey};
use shared::model::{IncidentId, IncidentType, Priority, Role};
use shared::notification::ToastKind;
use shared::{Event, Screen};

fn shell() -> TestShell {
    TestShell::new()
}

fn login(email: &str, role: Role) -> Event {
    Event::AuthSubmitted {
        email: email.into(),
        password: SecretString::new("correcthorse".into()),
        role,
        mode: AuthMode::Login,
    }
}

async fn dispatcher_on_dashboard() -> TestShell {
    let mut shell = shell();
    shell.dispatch(login("jefe@cceu.sala.es", Role::Dispatcher)).await;
    shell.advance(1200).await;
    assert_eq!(shell.model().screen(), Screen::Dashboard);
    shell
}

#[tokio::test]
async fn login_then_dashboard_seeds_sample_data() {
    let mut shell = shell();

    // 1. Submit credentials; screen only changes after the delay.
    shell.dispatch(login("jefe@cceu.sala.es", Role::Dispatcher)).await;
    assert_eq!(shell.model().screen(), Screen::Entry);
    let view = shell.view();
    assert_eq!(view.toast.as_ref().map(|t| t.kind), Some(ToastKind::Success));
    assert_eq!(view.session.as_ref().map(|s| s.role), Some(Role::Dispatcher));

    shell.advance(1199).await;
    assert_eq!(shell.model().screen(), Screen::Entry);

    // 2. Delay elapses: dashboard mounts, finds the store empty, seeds it.
    shell.advance(1).await;
    assert_eq!(shell.model().screen(), Screen::Dashboard);
    let dashboard = shell.view().dashboard.unwrap();
    assert!(!dashboard.loading);
    assert_eq!(dashboard.incidents.len(), 6);
    assert_eq!(dashboard.summary, "Mostrando 6 de 6 incidencias");
    assert_eq!(shell.store().len().await, 6);
}

#[tokio::test]
async fn rejected_resubmit_keeps_entry() {
    let mut shell = shell();

    // 1. A valid login is accepted and its navigation scheduled.
    shell.dispatch(login("jefe@cceu.sala.es", Role::Dispatcher)).await;
    assert!(shell.view().session.is_some());

    // 2. Resubmitted with a broken email before the delay elapses.
    shell.dispatch(login("bad-email", Role::Dispatcher)).await;
    assert!(shell.pending_timers().is_empty());

    // 3. The original delay passes: still on the entry screen.
    shell.advance(5000).await;
    assert_eq!(shell.model().screen(), Screen::Entry);
    let view = shell.view();
    assert!(view.session.is_none());
    assert!(view.toast.is_none());
    assert!(view.auth.email_error.is_some());
}

#[tokio::test]
async fn field_login_lands_on_mission() {
    let mut shell = shell();
    shell.dispatch(login("equipo@cceu.campo.es", Role::Field)).await;
    shell.advance(1200).await;
    assert_eq!(shell.model().screen(), Screen::Mission);
    assert!(shell.view().dashboard.is_none());
}

#[tokio::test]
async fn wrong_domain_for_role_stays_on_entry() {
    let mut shell = shell();
    shell.dispatch(login("equipo@cceu.campo.es", Role::Dispatcher)).await;
    shell.advance(5000).await;

    assert_eq!(shell.model().screen(), Screen::Entry);
    let view = shell.view();
    assert!(view.session.is_none());
    assert!(view.auth.email_error.is_some());
    assert!(view.auth.password_error.is_none());
}

#[tokio::test]
async fn create_incident_returns_to_fresh_dashboard() {
    let mut shell = dispatcher_on_dashboard().await;
    let epoch_before = shell.model().dashboard_epoch();

    // 1. Fill the form.
    shell.dispatch(Event::NewIncidentRequested).await;
    assert_eq!(shell.model().screen(), Screen::NewIncident);
    shell
        .dispatch(Event::DraftEdited(DraftEdit::Type(IncidentType::Fire)))
        .await;
    shell
        .dispatch(Event::DraftEdited(DraftEdit::Priority(Priority::P1)))
        .await;
    shell
        .dispatch(Event::DraftEdited(DraftEdit::Address("Calle Alcalá 123".into())))
        .await;

    // 2. Submit; the store answers immediately, navigation waits.
    shell.dispatch(Event::CreateIncidentSubmitted).await;
    assert_eq!(shell.model().screen(), Screen::NewIncident);
    assert_eq!(shell.store().len().await, 7);

    shell.advance(600).await;
    assert_eq!(shell.model().screen(), Screen::Dashboard);
    assert_eq!(shell.model().dashboard_epoch(), epoch_before + 1);
    assert_eq!(
        shell.view().toast.map(|t| t.message),
        Some("Incidencia creada correctamente".to_string())
    );

    // 3. Filter to fires: the new P1 fire is counted.
    shell
        .dispatch(Event::Menu {
            menu: MenuKind::Type,
            input: MenuInput::TriggerClicked,
        })
        .await;
    shell
        .dispatch(Event::Menu {
            menu: MenuKind::Type,
            input: MenuInput::ItemClicked(1),
        })
        .await;
    let dashboard = shell.view().dashboard.unwrap();
    assert!(dashboard
        .incidents
        .iter()
        .all(|card| card.type_label == IncidentType::Fire.label()));
    assert!(dashboard.priority_counts.p1 >= 1);
    assert!(dashboard
        .incidents
        .iter()
        .any(|card| card.address == "Calle Alcalá 123"));
}

#[tokio::test]
async fn blank_address_never_reaches_store() {
    let mut shell = dispatcher_on_dashboard().await;
    shell.dispatch(Event::NewIncidentRequested).await;
    shell.dispatch(Event::CreateIncidentSubmitted).await;

    assert_eq!(shell.store().len().await, 6);
    let draft = shell.view().draft.unwrap();
    assert_eq!(draft.address_error.as_deref(), Some("La dirección es obligatoria"));
}

#[tokio::test]
async fn address_lookup_moves_marker() {
    let mut shell = dispatcher_on_dashboard().await;
    shell.dispatch(Event::NewIncidentRequested).await;
    shell
        .dispatch(Event::DraftEdited(DraftEdit::Address("gran vía".into())))
        .await;
    shell.dispatch(Event::AddressLookupRequested).await;

    let draft = shell.view().draft.unwrap();
    assert!(!draft.is_geocoding);
    assert_eq!(draft.geocode_message, None);

    shell
        .dispatch(Event::DraftEdited(DraftEdit::Address("Calle Inexistente".into())))
        .await;
    shell.dispatch(Event::AddressLookupRequested).await;
    let draft = shell.view().draft.unwrap();
    assert_eq!(draft.geocode_message.as_deref(), Some("No se encontró la dirección"));
    assert_eq!(shell.model().screen(), Screen::NewIncident);
}

#[tokio::test]
async fn delete_then_go_home_cancels_return() {
    let mut shell = dispatcher_on_dashboard().await;
    let id = IncidentId::new("INC-2025-00123");

    // 1. Open and delete.
    shell
        .dispatch(Event::IncidentSelected { id: id.clone() })
        .await;
    assert!(shell.view().detail.unwrap().incident.is_some());
    shell.dispatch(Event::DeleteRequested).await;
    shell.dispatch(Event::DeleteConfirmed).await;
    assert_eq!(shell.store().len().await, 5);
    assert_eq!(
        shell.view().toast.map(|t| t.message),
        Some("Incidencia eliminada correctamente".to_string())
    );

    // 2. Leave before the deferred return fires.
    shell.dispatch(Event::GoHome).await;
    assert_eq!(shell.model().screen(), Screen::Entry);
    shell.advance(10_000).await;

    assert_eq!(shell.model().screen(), Screen::Entry);
    assert!(shell.model().session().is_none());
    assert!(shell.pending_timers().is_empty());
}

#[tokio::test]
async fn classify_then_dispatch() {
    let mut shell = dispatcher_on_dashboard().await;

    // 1. Classify; the dispatch screen follows after the delay.
    shell
        .dispatch(Event::IncidentSelected {
            id: IncidentId::new("INC-2025-00125"),
        })
        .await;
    shell.dispatch(Event::ClassifyRequested).await;
    shell
        .dispatch(Event::ClassificationConfirmed {
            priority: Priority::P1,
            incident_type: IncidentType::Snow,
        })
        .await;
    assert_eq!(shell.model().screen(), Screen::Classification);

    shell.advance(300).await;
    assert_eq!(shell.model().screen(), Screen::Dispatch);
    let detail = shell.view().detail.unwrap();
    assert_eq!(detail.incident.map(|i| i.priority), Some(Priority::P1));

    // 2. Nothing selected yet: dispatching does nothing.
    let dispatch = shell.view().dispatch.unwrap();
    assert!(!dispatch.can_dispatch);
    shell.dispatch(Event::ResourcesDispatched).await;
    shell.advance(300).await;
    assert_eq!(shell.model().screen(), Screen::Dispatch);

    for index in [0, 1, 2] {
        shell.dispatch(Event::ResourceToggled { index }).await;
    }
    assert_eq!(
        shell.view().dispatch.unwrap().dispatch_label,
        "Despachar recursos (3)"
    );
    shell.dispatch(Event::ResourcesDispatched).await;
    shell.advance(300).await;
    let view = shell.view();
    assert_eq!(view.screen, Screen::DispatchConfirmation);
    assert_eq!(view.last_dispatched_count, 3);

    // 3. Back to a dashboard that reflects the new priority.
    shell.dispatch(Event::BackToDashboard).await;
    let dashboard = shell.view().dashboard.unwrap();
    assert_eq!(dashboard.priority_counts.p1, 3);
}

#[tokio::test]
async fn menu_keyboard_round_trip_requests_focus() {
    let mut shell = dispatcher_on_dashboard().await;
    let key = |key| Event::Menu {
        menu: MenuKind::Priority,
        input: MenuInput::Key(key),
    };

    shell.dispatch(key(MenuKey::ArrowDown)).await;
    assert_eq!(
        shell.last_focus(),
        Some(FocusOperation {
            menu: MenuKind::Priority,
            target: FocusRequest::Item(0)
        })
    );
    shell.dispatch(key(MenuKey::End)).await;
    shell.dispatch(key(MenuKey::Enter)).await;
    assert_eq!(
        shell.last_focus(),
        Some(FocusOperation {
            menu: MenuKind::Priority,
            target: FocusRequest::Trigger
        })
    );

    let dashboard = shell.view().dashboard.unwrap();
    let menu = dashboard
        .menus
        .iter()
        .find(|m| m.kind == MenuKind::Priority)
        .unwrap();
    assert!(!menu.is_open);
    assert_eq!(menu.trigger_label, "Prioridad: Normal");
    assert!(dashboard.incidents.iter().all(|c| c.priority == "P3"));
}

#[tokio::test]
async fn toast_auto_dismisses_after_duration() {
    let mut shell = dispatcher_on_dashboard().await;
    // The login toast was shown at t=0 and is already gone.
    assert!(shell.view().toast.is_none());

    shell.dispatch(Event::NewIncidentRequested).await;
    shell
        .dispatch(Event::DraftEdited(DraftEdit::Address("Gran Vía 45".into())))
        .await;
    shell.dispatch(Event::CreateIncidentSubmitted).await;
    shell.advance(600).await;
    assert!(shell.view().toast.is_some());
    shell.advance(1199).await;
    assert!(shell.view().toast.is_some());
    shell.advance(1).await;
    assert!(shell.view().toast.is_none());
}

#[tokio::test]
async fn field_pipeline_with_deferred_steps() {
    let mut shell = shell();
    shell.dispatch(login("equipo@cceu.campo.es", Role::Field)).await;
    shell.advance(1200).await;

    shell.dispatch(Event::MissionAccepted).await;
    shell.dispatch(Event::ArrivedOnSite).await;
    shell.dispatch(Event::EvidencesSent).await;
    assert_eq!(shell.model().screen(), Screen::EvidenceCollection);
    shell.advance(600).await;
    assert_eq!(shell.model().screen(), Screen::Closure);

    shell.dispatch(Event::MissionClosed).await;
    shell.dispatch(Event::BackToMission).await;
    assert_eq!(shell.model().screen(), Screen::Mission);

    // Dispatcher-only events are ignored on field screens.
    shell.dispatch(Event::NewIncidentRequested).await;
    assert_eq!(shell.model().screen(), Screen::Mission);
}
