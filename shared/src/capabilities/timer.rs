use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for one scheduled timer. Handles are never reused within a model's
/// lifetime, so a late fire for a replaced or cancelled timer can be told
/// apart from the live one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOperation {
    /// Resolve with [`TimerOutput::Fired`] after `after_ms`.
    Start { id: TimerId, after_ms: u64 },
    /// Drop the timer. The shell must never resolve a cancelled start.
    Cancel { id: TimerId },
}

impl TimerOperation {
    pub fn id(&self) -> TimerId {
        match self {
            Self::Start { id, .. } | Self::Cancel { id } => *id,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOutput {
    Fired,
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Ask the shell to fire `id` after `after_ms`; `callback` builds the
    /// event delivered when it does.
    pub fn start<F>(&self, id: TimerId, after_ms: u64, callback: F)
    where
        F: FnOnce(TimerId) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let TimerOutput::Fired = context
                .request_from_shell(TimerOperation::Start { id, after_ms })
                .await;
            context.update_app(callback(id));
        });
    }

    pub fn cancel(&self, id: TimerId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}
