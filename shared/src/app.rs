//! Screen-flow controller.
//!
//! [`App::update`] is the only place the [`Model`] changes. Each event is
//! checked against the current screen by [`App::check`] before anything is
//! touched, so a rejected event leaves the model exactly as it was and
//! requests nothing from the shell.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::validate_credentials;
use crate::capabilities::{
    Capabilities, GeocodeOperation, GeocodeOutput, GeocodeResult, StoreError, StoreOperation,
    StoreOutput, StoreResult, StoreTag, TimerId,
};
use crate::config::AppConfig;
use crate::dashboard::{DashboardState, MenuKind};
use crate::dispatch::DispatchBoard;
use crate::event::{AuthMode, DraftEdit, Event};
use crate::filter_menu::FocusRequest;
use crate::model::{DetailState, IncidentPatch, LatLon, Model, PendingTransition};
use crate::notification::ToastMessage;
use crate::screen::Screen;
use crate::view::ViewModel;
use crate::AppError;

const MSG_LOGIN_OK: &str = "Inicio de sesión correcto";
const MSG_REGISTER_OK: &str = "Cuenta creada correctamente";
const MSG_ADDRESS_REQUIRED: &str = "La dirección es obligatoria";
const MSG_CREATED: &str = "Incidencia creada correctamente";
const MSG_CREATE_FAILED: &str = "Error al crear la incidencia";
const MSG_PRIORITY_UPDATED: &str = "Prioridad actualizada";
const MSG_DISPATCHED: &str = "Recursos despachados";
const MSG_DELETED: &str = "Incidencia eliminada correctamente";
const MSG_NOVELTY_SENT: &str = "Novedad enviada";
const MSG_EVIDENCE_SENT: &str = "Evidencias enviadas";
const MSG_BAD_COORDINATES: &str = "Coordenadas no válidas";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("'{event}' is not valid on screen '{screen}'")]
    InvalidTransition { screen: Screen, event: &'static str },
}

/// Shell requests made while handling one event. Render is coalesced and
/// requested once, after everything else.
struct Requests<'a> {
    caps: &'a Capabilities,
    render: bool,
}

impl<'a> Requests<'a> {
    fn new(caps: &'a Capabilities) -> Self {
        Self {
            caps,
            render: false,
        }
    }

    fn render(&mut self) {
        self.render = true;
    }

    fn store(&self, tag: StoreTag, operation: StoreOperation) {
        debug!(operation = operation.name(), ?tag, "store request");
        self.caps.store.request(operation, move |result| Event::StoreResponded {
            tag,
            result: Box::new(result),
        });
    }

    fn start_timer(&self, id: TimerId, after_ms: u64) {
        self.caps
            .timer
            .start(id, after_ms, |id| Event::TimerFired { id });
    }

    fn cancel_timer(&self, id: TimerId) {
        self.caps.timer.cancel(id);
    }

    fn geocode(&self, operation: GeocodeOperation) {
        self.caps.geocode.lookup(operation, |result| Event::GeocodeResponded {
            result: Box::new(result),
        });
    }

    fn focus(&self, menu: MenuKind, target: FocusRequest) {
        self.caps.focus.move_to(menu, target);
    }

    fn finish(self) {
        if self.render {
            self.caps.render.render();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct App {
    config: AppConfig,
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    /// Events that are not valid on the current screen are logged and
    /// dropped.
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if let Err(err) = self.try_update(event, model, caps) {
            warn!(error = %err, "rejected event");
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[instrument(skip_all, fields(event = event.name(), screen = %model.screen))]
    pub fn try_update(
        &self,
        event: Event,
        model: &mut Model,
        caps: &Capabilities,
    ) -> Result<(), FlowError> {
        self.check(&event, model)?;
        let mut requests = Requests::new(caps);
        self.apply(event, model, &mut requests);
        requests.finish();
        Ok(())
    }

    /// Whether `event` may be applied to `model` as it stands. Pure: this is
    /// the whole screen guard, so [`App::try_update`] can reject before any
    /// mutation.
    pub fn check(&self, event: &Event, model: &Model) -> Result<(), FlowError> {
        let screen = model.screen;
        let valid = match event {
            Event::AuthSubmitted { .. } | Event::CredentialEdited { .. } => screen == Screen::Entry,

            Event::SearchChanged { .. } | Event::Menu { .. } => {
                screen == Screen::Dashboard && model.dashboard.is_some()
            }
            Event::NewIncidentRequested | Event::IncidentSelected { .. } => {
                screen == Screen::Dashboard
            }

            Event::DraftEdited(_)
            | Event::AddressLookupRequested
            | Event::LocationPicked { .. }
            | Event::CreateIncidentSubmitted => screen == Screen::NewIncident,

            Event::ClassifyRequested | Event::DispatchRequested => {
                screen == Screen::IncidentDetail
            }
            Event::DeleteRequested => screen == Screen::IncidentDetail && !model.is_busy,
            Event::DeleteCancelled => {
                screen == Screen::IncidentDetail && model.delete_confirmation_open
            }
            Event::DeleteConfirmed => {
                screen == Screen::IncidentDetail
                    && model.delete_confirmation_open
                    && model.selected_incident_id.is_some()
            }

            Event::ClassificationConfirmed { .. } => {
                screen == Screen::Classification
                    && !model.is_busy
                    && model.selected_incident_id.is_some()
            }
            Event::ResourceToggled { index } => {
                screen == Screen::Dispatch && *index < model.dispatch.len()
            }
            Event::ResourcesDispatched => {
                screen == Screen::Dispatch && model.dispatch.selected_count() > 0
            }
            Event::BackToDetail => matches!(screen, Screen::Classification | Screen::Dispatch),
            Event::BackToDashboard => screen.is_dispatcher_sub_screen(),

            Event::MissionAccepted | Event::NoveltyReportRequested => screen == Screen::Mission,
            Event::NoveltySent | Event::NoveltyCancelled => screen == Screen::ReportNovelty,
            Event::ArrivedOnSite => screen == Screen::Navigation,
            Event::EvidencesSent => screen == Screen::EvidenceCollection,
            Event::MissionClosed => screen == Screen::Closure,
            Event::BackToMission => screen == Screen::ClosureFeedback,
            Event::EvidencesViewed => screen.shows_evidences(),
            Event::EvidencesClosed => screen.shows_evidences() && model.evidences_open,

            Event::GoHome => screen != Screen::Entry,

            // Replies are matched against the model when applied; stale ones
            // are dropped there.
            Event::ToastDismissed
            | Event::TimerFired { .. }
            | Event::StoreResponded { .. }
            | Event::GeocodeResponded { .. } => true,
        };

        if valid {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                screen,
                event: event.name(),
            })
        }
    }

    fn apply(&self, event: Event, model: &mut Model, caps: &mut Requests<'_>) {
        match event {
            // --- Entry ---
            Event::AuthSubmitted {
                email,
                password,
                role,
                mode,
            } => match validate_credentials(&email, &password, role, &self.config.domains) {
                Ok(session) => {
                    info!(role = ?session.role, "session opened");
                    let home = session.role.home();
                    model.auth_errors = Default::default();
                    model.session = Some(session);
                    let message = match mode {
                        AuthMode::Login => MSG_LOGIN_OK,
                        AuthMode::Register => MSG_REGISTER_OK,
                    };
                    self.notify(model, caps, ToastMessage::success(message));
                    self.schedule(model, caps, home, self.config.timings.auth_ms(mode), false, None);
                }
                Err(errors) => {
                    debug!(?errors, "credentials rejected");
                    // An earlier accepted submission must not complete.
                    Self::cancel_pending(model, caps);
                    if let Some(timer) = model.notifications.clear() {
                        caps.cancel_timer(timer);
                    }
                    model.session = None;
                    model.auth_errors = errors;
                    caps.render();
                }
            },
            Event::CredentialEdited { field } => {
                model.auth_errors.clear(field);
                caps.render();
            }

            // --- Dashboard ---
            Event::SearchChanged { text } => {
                if let Some(dashboard) = model.dashboard.as_mut() {
                    dashboard.set_search(text);
                }
                caps.render();
            }
            Event::Menu { menu, input } => {
                if let Some(dashboard) = model.dashboard.as_mut() {
                    let response = dashboard.handle_menu(menu, input);
                    if let Some(selected) = &response.selected {
                        debug!(?menu, selected = %selected, "filter changed");
                    }
                    if let Some(target) = response.focus {
                        caps.focus(menu, target);
                    }
                }
                caps.render();
            }
            Event::NewIncidentRequested => self.navigate(model, caps, Screen::NewIncident),
            Event::IncidentSelected { id } => {
                model.selected_incident_id = Some(id);
                self.navigate(model, caps, Screen::IncidentDetail);
            }

            // --- New incident ---
            Event::DraftEdited(edit) => {
                let draft = &mut model.draft;
                match edit {
                    DraftEdit::Type(incident_type) => draft.incident_type = incident_type,
                    DraftEdit::Priority(priority) => draft.priority = priority,
                    DraftEdit::Address(address) => {
                        draft.address = address;
                        draft.errors.address = None;
                    }
                    DraftEdit::Description(description) => draft.description = description,
                }
                caps.render();
            }
            Event::AddressLookupRequested => {
                let address = model.draft.address.trim().to_string();
                if address.is_empty() {
                    model.draft.errors.address = Some(MSG_ADDRESS_REQUIRED.into());
                } else {
                    model.draft.is_geocoding = true;
                    model.draft.geocode_message = None;
                    caps.geocode(GeocodeOperation::Forward { address });
                }
                caps.render();
            }
            Event::LocationPicked { lat, lon } => {
                match LatLon::new(lat, lon) {
                    Ok(location) => {
                        model.draft.location = location;
                        model.draft.is_geocoding = true;
                        model.draft.geocode_message = None;
                        caps.geocode(GeocodeOperation::Reverse { location });
                    }
                    Err(err) => {
                        warn!(error = %err, "picked location rejected");
                        model.draft.geocode_message = Some(MSG_BAD_COORDINATES.into());
                    }
                }
                caps.render();
            }
            Event::CreateIncidentSubmitted => {
                if model.is_busy {
                    debug!("create already in flight");
                    return;
                }
                if model.draft.address.trim().is_empty() {
                    model.draft.errors.address = Some(MSG_ADDRESS_REQUIRED.into());
                } else {
                    model.is_busy = true;
                    caps.store(
                        StoreTag::CreateIncident,
                        StoreOperation::Create(model.draft.to_new_incident()),
                    );
                }
                caps.render();
            }

            // --- Incident detail ---
            Event::ClassifyRequested => self.navigate(model, caps, Screen::Classification),
            Event::DispatchRequested => self.navigate(model, caps, Screen::Dispatch),
            Event::DeleteRequested => {
                model.delete_confirmation_open = true;
                caps.render();
            }
            Event::DeleteCancelled => {
                model.delete_confirmation_open = false;
                caps.render();
            }
            Event::DeleteConfirmed => {
                let Some(id) = model.selected_incident_id.clone() else {
                    return;
                };
                model.delete_confirmation_open = false;
                model.is_busy = true;
                caps.store(
                    StoreTag::DeleteIncident { id: id.clone() },
                    StoreOperation::Delete { id },
                );
                caps.render();
            }

            // --- Classification / dispatch ---
            Event::ClassificationConfirmed {
                priority,
                incident_type,
            } => {
                let Some(id) = model.selected_incident_id.clone() else {
                    return;
                };
                model.is_busy = true;
                let patch = IncidentPatch {
                    priority: Some(priority),
                    incident_type: Some(incident_type),
                    ..IncidentPatch::default()
                };
                caps.store(
                    StoreTag::Classify { id: id.clone() },
                    StoreOperation::Update { id, patch },
                );
                caps.render();
            }
            Event::ResourceToggled { index } => {
                if let Some(selected) = model.dispatch.toggle(index) {
                    debug!(index, selected, "resource toggled");
                }
                caps.render();
            }
            Event::ResourcesDispatched => {
                let count = model.dispatch.selected_count();
                model.last_dispatched_count = count;
                info!(count, "resources dispatched");
                self.notify(model, caps, ToastMessage::success(MSG_DISPATCHED));
                self.schedule(
                    model,
                    caps,
                    Screen::DispatchConfirmation,
                    self.config.timings.dispatch_ms,
                    false,
                    None,
                );
            }
            Event::BackToDetail => self.navigate(model, caps, Screen::IncidentDetail),
            Event::BackToDashboard => {
                model.dashboard_epoch += 1;
                self.navigate(model, caps, Screen::Dashboard);
            }

            // --- Field pipeline ---
            Event::MissionAccepted => self.navigate(model, caps, Screen::Navigation),
            Event::NoveltyReportRequested => self.navigate(model, caps, Screen::ReportNovelty),
            Event::NoveltySent => {
                self.notify(model, caps, ToastMessage::success(MSG_NOVELTY_SENT));
                self.schedule(
                    model,
                    caps,
                    Screen::Mission,
                    self.config.timings.novelty_ms,
                    false,
                    None,
                );
            }
            Event::NoveltyCancelled => self.navigate(model, caps, Screen::Mission),
            Event::ArrivedOnSite => self.navigate(model, caps, Screen::EvidenceCollection),
            Event::EvidencesSent => {
                self.notify(model, caps, ToastMessage::success(MSG_EVIDENCE_SENT));
                self.schedule(
                    model,
                    caps,
                    Screen::Closure,
                    self.config.timings.evidence_ms,
                    false,
                    None,
                );
            }
            Event::MissionClosed => self.navigate(model, caps, Screen::ClosureFeedback),
            Event::BackToMission => self.navigate(model, caps, Screen::Mission),
            Event::EvidencesViewed => {
                model.evidences_open = true;
                caps.render();
            }
            Event::EvidencesClosed => {
                model.evidences_open = false;
                caps.render();
            }

            // --- Global ---
            Event::GoHome => self.navigate(model, caps, Screen::Entry),
            Event::ToastDismissed => {
                if let Some(timer) = model.notifications.clear() {
                    caps.cancel_timer(timer);
                    caps.render();
                }
            }

            // --- Effect replies ---
            Event::TimerFired { id } => self.on_timer(model, caps, id),
            Event::StoreResponded { tag, result } => self.on_store(model, caps, tag, *result),
            Event::GeocodeResponded { result } => Self::on_geocode(model, caps, *result),
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Change screen now. Any pending deferred transition is cancelled and
    /// per-screen overlays are reset.
    fn navigate(&self, model: &mut Model, caps: &mut Requests<'_>, target: Screen) {
        Self::cancel_pending(model, caps);

        let from = model.screen;
        model.screen = target;
        model.is_busy = false;
        model.delete_confirmation_open = false;
        model.evidences_open = false;

        if target != Screen::Dashboard {
            model.dashboard = None;
        }
        if !matches!(
            target,
            Screen::IncidentDetail
                | Screen::Classification
                | Screen::Dispatch
                | Screen::DispatchConfirmation
        ) {
            model.detail = DetailState::Idle;
        }

        match target {
            Screen::Entry => {
                model.session = None;
                model.selected_incident_id = None;
                model.auth_errors = Default::default();
            }
            Screen::Dashboard => {
                let epoch = model.dashboard_epoch;
                model.dashboard = Some(DashboardState::mount(epoch));
                caps.store(StoreTag::LoadDashboard { epoch }, StoreOperation::List);
            }
            Screen::NewIncident => model.draft = Default::default(),
            Screen::Dispatch => model.dispatch = DispatchBoard::default(),
            Screen::IncidentDetail => match model.selected_incident_id.clone() {
                Some(id) => {
                    model.detail = DetailState::Loading;
                    caps.store(StoreTag::LoadDetail { id: id.clone() }, StoreOperation::Get { id });
                }
                None => model.detail = DetailState::NotFound,
            },
            _ => {}
        }

        info!(from = %from, to = %target, epoch = model.dashboard_epoch, "screen changed");
        caps.render();
    }

    /// Navigate to `target` after `delay_ms`, superseding any earlier
    /// pending transition.
    fn schedule(
        &self,
        model: &mut Model,
        caps: &mut Requests<'_>,
        target: Screen,
        delay_ms: u64,
        bump_epoch: bool,
        announce: Option<ToastMessage>,
    ) {
        Self::cancel_pending(model, caps);
        let timer = model.allocate_timer();
        model.pending = Some(PendingTransition {
            timer,
            target,
            bump_epoch,
            announce,
        });
        debug!(%timer, to = %target, delay_ms, "transition scheduled");
        caps.start_timer(timer, delay_ms);
        caps.render();
    }

    fn cancel_pending(model: &mut Model, caps: &mut Requests<'_>) {
        if let Some(pending) = model.pending.take() {
            debug!(timer = %pending.timer, to = %pending.target, "pending transition cancelled");
            caps.cancel_timer(pending.timer);
        }
    }

    fn notify(&self, model: &mut Model, caps: &mut Requests<'_>, toast: ToastMessage) {
        let timer = model.allocate_timer();
        let duration_ms = self.config.notifications.duration_ms(toast.kind);
        if let Some(replaced) = model.notifications.show(toast, timer) {
            caps.cancel_timer(replaced);
        }
        caps.start_timer(timer, duration_ms);
        caps.render();
    }

    fn notify_error(&self, model: &mut Model, caps: &mut Requests<'_>, error: StoreError) {
        warn!(error = %error, "store request failed");
        let message = AppError::from(error).user_facing_message();
        self.notify(model, caps, ToastMessage::error(message));
    }

    // ------------------------------------------------------------------
    // Effect replies
    // ------------------------------------------------------------------

    fn on_timer(&self, model: &mut Model, caps: &mut Requests<'_>, id: TimerId) {
        let due = model.pending.as_ref().is_some_and(|p| p.timer == id);
        if due {
            if let Some(pending) = model.pending.take() {
                if pending.bump_epoch {
                    model.dashboard_epoch += 1;
                }
                self.navigate(model, caps, pending.target);
                if let Some(toast) = pending.announce {
                    self.notify(model, caps, toast);
                }
            }
        } else if model.notifications.dismiss_if(id) {
            caps.render();
        } else {
            debug!(timer = %id, "ignoring stale timer");
        }
    }

    fn on_store(&self, model: &mut Model, caps: &mut Requests<'_>, tag: StoreTag, result: StoreResult) {
        match tag {
            StoreTag::LoadDashboard { epoch } | StoreTag::SeedDashboard { epoch }
                if model.dashboard.as_ref().map(|d| d.epoch) != Some(epoch) =>
            {
                debug!(epoch, "dropping reply for unmounted dashboard");
            }
            StoreTag::LoadDashboard { epoch } => {
                let Some(dashboard) = model.dashboard.as_mut() else {
                    return;
                };
                match result {
                    Ok(StoreOutput::Listed(incidents)) => {
                        if incidents.is_empty() && !dashboard.seeded {
                            dashboard.seeded = true;
                            info!("store empty; requesting sample data");
                            caps.store(StoreTag::SeedDashboard { epoch }, StoreOperation::SeedSampleData);
                        } else {
                            info!(count = incidents.len(), "dashboard loaded");
                            dashboard.incidents = incidents;
                            dashboard.loading = false;
                        }
                        caps.render();
                    }
                    Ok(other) => {
                        warn!(?other, "unexpected reply to list request");
                        dashboard.loading = false;
                        caps.render();
                    }
                    Err(err) => {
                        dashboard.loading = false;
                        self.notify_error(model, caps, err);
                    }
                }
            }
            StoreTag::SeedDashboard { epoch } => match result {
                Ok(_) => caps.store(StoreTag::LoadDashboard { epoch }, StoreOperation::List),
                Err(err) => {
                    if let Some(dashboard) = model.dashboard.as_mut() {
                        dashboard.loading = false;
                    }
                    self.notify_error(model, caps, err);
                }
            },
            StoreTag::LoadDetail { id } => {
                let showing = matches!(
                    model.screen,
                    Screen::IncidentDetail
                        | Screen::Classification
                        | Screen::Dispatch
                        | Screen::DispatchConfirmation
                );
                if !showing || model.selected_incident_id.as_ref() != Some(&id) {
                    debug!(%id, "dropping stale detail reply");
                    return;
                }
                match result {
                    Ok(StoreOutput::Fetched(incident)) => {
                        model.detail = DetailState::Loaded(Box::new(incident));
                        caps.render();
                    }
                    Ok(other) => {
                        warn!(?other, "unexpected reply to get request");
                        model.detail = DetailState::Failed;
                        caps.render();
                    }
                    Err(StoreError::NotFound { .. }) => {
                        model.detail = DetailState::NotFound;
                        caps.render();
                    }
                    Err(err) => {
                        model.detail = DetailState::Failed;
                        self.notify_error(model, caps, err);
                    }
                }
            }
            StoreTag::CreateIncident => {
                if model.screen != Screen::NewIncident {
                    debug!("dropping create reply; user navigated away");
                    return;
                }
                match result {
                    Ok(StoreOutput::Created(incident)) => {
                        info!(id = %incident.id, "incident created");
                        self.schedule(
                            model,
                            caps,
                            Screen::Dashboard,
                            self.config.timings.create_ms,
                            true,
                            Some(ToastMessage::success(MSG_CREATED)),
                        );
                    }
                    Ok(other) => {
                        warn!(?other, "unexpected reply to create request");
                        model.is_busy = false;
                        self.notify(model, caps, ToastMessage::error(MSG_CREATE_FAILED));
                    }
                    Err(err) => {
                        warn!(error = %err, "create failed");
                        model.is_busy = false;
                        self.notify(model, caps, ToastMessage::error(MSG_CREATE_FAILED));
                    }
                }
            }
            StoreTag::Classify { id } => {
                if model.screen != Screen::Classification {
                    debug!(%id, "dropping classify reply; user navigated away");
                    return;
                }
                match result {
                    Ok(StoreOutput::Updated(incident)) => {
                        model.detail = DetailState::Loaded(Box::new(incident));
                        self.notify(model, caps, ToastMessage::success(MSG_PRIORITY_UPDATED));
                        self.schedule(
                            model,
                            caps,
                            Screen::Dispatch,
                            self.config.timings.classify_ms,
                            false,
                            None,
                        );
                    }
                    Ok(other) => {
                        warn!(?other, "unexpected reply to update request");
                        model.is_busy = false;
                        caps.render();
                    }
                    Err(err) => {
                        model.is_busy = false;
                        self.notify_error(model, caps, err);
                    }
                }
            }
            StoreTag::DeleteIncident { id } => {
                if model.screen != Screen::IncidentDetail {
                    debug!(%id, "dropping delete reply; user navigated away");
                    return;
                }
                match result {
                    Ok(_) => {
                        info!(%id, "incident deleted");
                        self.notify(model, caps, ToastMessage::success(MSG_DELETED));
                        self.schedule(
                            model,
                            caps,
                            Screen::Dashboard,
                            self.config.timings.delete_ms,
                            true,
                            None,
                        );
                    }
                    Err(err) => {
                        model.is_busy = false;
                        self.notify_error(model, caps, err);
                    }
                }
            }
        }
    }

    fn on_geocode(model: &mut Model, caps: &mut Requests<'_>, result: GeocodeResult) {
        if model.screen != Screen::NewIncident {
            debug!("dropping geocoder reply; form not shown");
            return;
        }
        let draft = &mut model.draft;
        draft.is_geocoding = false;
        match result {
            Ok(GeocodeOutput::Located(location)) => {
                draft.location = location;
                draft.geocode_message = None;
            }
            Ok(GeocodeOutput::Addressed(address)) => {
                draft.address = address;
                draft.errors.address = None;
                draft.geocode_message = None;
            }
            Err(err) => {
                warn!(error = %err, "geocoding failed");
                draft.geocode_message = Some(err.inline_message().to_string());
            }
        }
        caps.render();
    }
}
