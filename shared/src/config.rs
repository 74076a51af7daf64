use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::DomainPolicy;
use crate::event::AuthMode;
use crate::notification::ToastKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{role} domain must not be empty")]
    EmptyDomain { role: &'static str },

    #[error("dispatcher and field domains must differ (both are '{domain}')")]
    DuplicateDomain { domain: String },

    #[error("{name} must be greater than zero")]
    ZeroDelay { name: &'static str },
}

/// Delays, in milliseconds, before each deferred navigation fires.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct FlowTimings {
    pub login_ms: u64,
    pub register_ms: u64,
    pub create_ms: u64,
    pub delete_ms: u64,
    pub classify_ms: u64,
    pub dispatch_ms: u64,
    pub novelty_ms: u64,
    pub evidence_ms: u64,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            login_ms: 1200,
            register_ms: 1500,
            create_ms: 600,
            delete_ms: 600,
            classify_ms: 300,
            dispatch_ms: 300,
            novelty_ms: 600,
            evidence_ms: 600,
        }
    }
}

impl FlowTimings {
    pub fn auth_ms(&self, mode: AuthMode) -> u64 {
        match mode {
            AuthMode::Login => self.login_ms,
            AuthMode::Register => self.register_ms,
        }
    }

    fn entries(&self) -> [(&'static str, u64); 8] {
        [
            ("login_ms", self.login_ms),
            ("register_ms", self.register_ms),
            ("create_ms", self.create_ms),
            ("delete_ms", self.delete_ms),
            ("classify_ms", self.classify_ms),
            ("dispatch_ms", self.dispatch_ms),
            ("novelty_ms", self.novelty_ms),
            ("evidence_ms", self.evidence_ms),
        ]
    }
}

/// Auto-dismiss duration per toast kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationTimings {
    pub success_ms: u64,
    pub warning_ms: u64,
    pub error_ms: u64,
}

impl Default for NotificationTimings {
    fn default() -> Self {
        Self {
            success_ms: ToastKind::Success.default_duration_ms(),
            warning_ms: ToastKind::Warning.default_duration_ms(),
            error_ms: ToastKind::Error.default_duration_ms(),
        }
    }
}

impl NotificationTimings {
    pub fn uniform(duration_ms: u64) -> Self {
        Self {
            success_ms: duration_ms,
            warning_ms: duration_ms,
            error_ms: duration_ms,
        }
    }

    pub fn duration_ms(&self, kind: ToastKind) -> u64 {
        match kind {
            ToastKind::Success => self.success_ms,
            ToastKind::Warning => self.warning_ms,
            ToastKind::Error => self.error_ms,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub domains: DomainPolicy,
    pub timings: FlowTimings,
    pub notifications: NotificationTimings,
}

impl AppConfig {
    /// Parse and validate. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dispatcher = self.domains.dispatcher_domain.trim();
        let field = self.domains.field_domain.trim();
        if dispatcher.is_empty() {
            return Err(ConfigError::EmptyDomain { role: "dispatcher" });
        }
        if field.is_empty() {
            return Err(ConfigError::EmptyDomain { role: "field" });
        }
        if dispatcher.eq_ignore_ascii_case(field) {
            return Err(ConfigError::DuplicateDomain {
                domain: dispatcher.to_string(),
            });
        }

        if let Some((name, _)) = self.timings.entries().into_iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroDelay { name });
        }

        let toasts = [
            ("success_ms", self.notifications.success_ms),
            ("warning_ms", self.notifications.warning_ms),
            ("error_ms", self.notifications.error_ms),
        ];
        if let Some((name, _)) = toasts.into_iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroDelay { name });
        }
        Ok(())
    }
}
