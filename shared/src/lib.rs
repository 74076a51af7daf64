// lib.rs - Emergency incident console core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod auth;
pub mod capabilities;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod event;
pub mod filter_menu;
pub mod model;
pub mod notification;
pub mod query;
pub mod screen;
pub mod view;

use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::capabilities::{GeocodeError, StoreError};
use crate::config::ConfigError;
use crate::model::CoordinateError;

pub use crux_core::App as CruxApp;

pub use app::{App, FlowError};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;
pub use screen::Screen;
pub use view::ViewModel;

/// Menu value meaning "no filter".
pub const DEFAULT_FILTER_VALUE: &str = "all";
pub const DEFAULT_TOAST_DURATION_MS: u64 = 1200;
pub const DEFAULT_DISPATCHER_DOMAIN: &str = "cceu.sala.es";
pub const DEFAULT_FIELD_DOMAIN: &str = "cceu.campo.es";
pub const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Authentication,
    Validation,
    NotFound,
    Configuration,
    InvalidState,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Configuration => "CONFIG_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network => ErrorSeverity::Transient,
            Self::Authentication | Self::Validation | Self::NotFound | Self::InvalidState => {
                ErrorSeverity::Permanent
            }
            Self::Configuration | Self::Internal => ErrorSeverity::Fatal,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    /// Toast text for this error.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "No se pudo conectar con el servidor. Inténtalo de nuevo.".into()
            }
            ErrorKind::Authentication | ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "La incidencia no existe o ha sido eliminada.".into(),
            ErrorKind::Configuration => "La configuración de la aplicación no es válida.".into(),
            ErrorKind::InvalidState => "Esta acción no está disponible ahora mismo.".into(),
            ErrorKind::Internal => "Se produjo un error inesperado. Inténtalo de nuevo.".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let internal = e.to_string();
        match e {
            StoreError::NotFound { .. } => AppError::new(ErrorKind::NotFound, "Incidencia no encontrada"),
            StoreError::Transport { .. } => {
                AppError::new(ErrorKind::Network, "Servicio de incidencias no disponible")
            }
            StoreError::Rejected { message } => AppError::new(ErrorKind::Validation, message),
        }
        .with_internal(internal)
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        let kind = match e {
            GeocodeError::NoMatch { .. } => ErrorKind::NotFound,
            GeocodeError::Transport { .. } => ErrorKind::Network,
        };
        AppError::new(kind, e.inline_message()).with_internal(e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::new(ErrorKind::Authentication, e.user_message()).with_internal(e.to_string())
    }
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, "Coordenadas no válidas").with_internal(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        AppError::new(ErrorKind::InvalidState, e.to_string())
    }
}
