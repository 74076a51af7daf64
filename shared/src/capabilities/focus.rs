use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::dashboard::MenuKind;
use crate::filter_menu::FocusRequest;

/// Move input focus within one of the dashboard menus.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusOperation {
    pub menu: MenuKind,
    pub target: FocusRequest,
}

impl Operation for FocusOperation {
    type Output = ();
}

pub struct Focus<Ev> {
    context: CapabilityContext<FocusOperation, Ev>,
}

impl<Ev> Capability<Ev> for Focus<Ev> {
    type Operation = FocusOperation;
    type MappedSelf<MappedEv> = Focus<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Focus::new(self.context.map_event(f))
    }
}

impl<Ev> Focus<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FocusOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn move_to(&self, menu: MenuKind, target: FocusRequest) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(FocusOperation { menu, target }).await;
        });
    }
}
