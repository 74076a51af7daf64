//! Test shell: drives the core through `AppTester`, resolving store and
//! geocoder requests against in-process implementations and timers against
//! a virtual clock.
//!
//! Store and geocoder requests complete before the next queued event is
//! processed. Timers only fire through [`TestShell::advance`], in due order,
//! with ties broken by start order.

#![allow(dead_code)]

use std::collections::VecDeque;

use crux_core::Request;
use crux_core::testing::AppTester;
use shared::capabilities::{
    execute_geocode, execute_store, FixedGeocoder, FocusOperation, MemoryIncidentStore,
    TimerId, TimerOperation, TimerOutput,
};
use shared::model::LatLon;
use shared::{App, Effect, Event, Model, ViewModel};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct ScheduledTimer {
    due_ms: u64,
    seq: u64,
    id: TimerId,
    request: Request<TimerOperation>,
}

pub struct TestShell {
    app: AppTester<App, Effect>,
    model: Model,
    store: MemoryIncidentStore,
    geocoder: FixedGeocoder,
    now_ms: u64,
    next_seq: u64,
    timers: Vec<ScheduledTimer>,
    renders: usize,
    focus: Option<FocusOperation>,
}

impl TestShell {
    pub fn new() -> Self {
        init_tracing();
        Self {
            app: AppTester::default(),
            model: Model::default(),
            store: MemoryIncidentStore::new(),
            geocoder: FixedGeocoder::new()
                .with_entry("Calle Alcalá 123, Madrid", LatLon::MADRID)
                .with_entry("Gran Vía 45, Madrid", LatLon::MADRID),
            now_ms: 0,
            next_seq: 0,
            timers: Vec::new(),
            renders: 0,
            focus: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    pub fn store(&self) -> &MemoryIncidentStore {
        &self.store
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn last_focus(&self) -> Option<FocusOperation> {
        self.focus
    }

    /// Live timers in firing order.
    pub fn pending_timers(&self) -> Vec<TimerId> {
        let mut timers: Vec<_> = self.timers.iter().map(|t| (t.due_ms, t.seq, t.id)).collect();
        timers.sort_unstable();
        timers.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Feed one event and run everything it causes until the core goes
    /// quiet.
    pub async fn dispatch(&mut self, event: Event) {
        self.run(VecDeque::from([event]), VecDeque::new()).await;
    }

    /// Move the clock forward, firing due timers one at a time.
    pub async fn advance(&mut self, ms: u64) {
        let target = self.now_ms.saturating_add(ms);
        while let Some(index) = self.next_due(target) {
            let mut timer = self.timers.remove(index);
            self.now_ms = timer.due_ms;
            let update = self
                .app
                .resolve(&mut timer.request, TimerOutput::Fired)
                .expect("timer resolves");
            self.run(update.events.into(), update.effects.into()).await;
        }
        self.now_ms = target;
    }

    fn next_due(&self, limit: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= limit)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(index, _)| index)
    }

    async fn run(&mut self, mut events: VecDeque<Event>, mut effects: VecDeque<Effect>) {
        loop {
            while let Some(effect) = effects.pop_front() {
                self.execute(effect, &mut events, &mut effects).await;
            }
            let Some(event) = events.pop_front() else {
                break;
            };
            let update = self.app.update(event, &mut self.model);
            events.extend(update.events);
            effects.extend(update.effects);
        }
    }

    async fn execute(
        &mut self,
        effect: Effect,
        events: &mut VecDeque<Event>,
        effects: &mut VecDeque<Effect>,
    ) {
        match effect {
            Effect::Render(_) => self.renders += 1,
            Effect::Store(mut request) => {
                let result = execute_store(&self.store, request.operation.clone()).await;
                let update = self.app.resolve(&mut request, result).expect("store resolves");
                events.extend(update.events);
                effects.extend(update.effects);
            }
            Effect::Geocode(mut request) => {
                let result = execute_geocode(&self.geocoder, request.operation.clone()).await;
                let update = self
                    .app
                    .resolve(&mut request, result)
                    .expect("geocode resolves");
                events.extend(update.events);
                effects.extend(update.effects);
            }
            Effect::Timer(request) => match request.operation {
                TimerOperation::Start { id, after_ms } => {
                    self.next_seq += 1;
                    self.timers.push(ScheduledTimer {
                        due_ms: self.now_ms.saturating_add(after_ms),
                        seq: self.next_seq,
                        id,
                        request,
                    });
                }
                TimerOperation::Cancel { id } => self.timers.retain(|t| t.id != id),
            },
            Effect::Focus(request) => self.focus = Some(request.operation),
        }
    }
}
