//! Credential validation and role routing.
//!
//! No credential is verified here; the rules below only decide whether an
//! email/password pair is well formed and which pipeline its domain belongs
//! to. Field errors are independent so each input can show its own message.

use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Role, Session};
use crate::{DEFAULT_DISPATCHER_DOMAIN, DEFAULT_FIELD_DOMAIN, MIN_PASSWORD_LENGTH};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    Email,
    Password,
}

#[derive(Error, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0:?} is required")]
    MissingField(CredentialField),

    #[error("email address is not well formed")]
    InvalidEmailFormat,

    #[error("email domain is not authorised")]
    UnauthorizedDomain { allowed: [String; 2] },

    #[error("this role requires an @{expected_domain} account")]
    RoleMismatch { role: Role, expected_domain: String },

    #[error("password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },
}

impl AuthError {
    pub fn field(&self) -> CredentialField {
        match self {
            Self::MissingField(field) => *field,
            Self::InvalidEmailFormat | Self::UnauthorizedDomain { .. } | Self::RoleMismatch { .. } => {
                CredentialField::Email
            }
            Self::WeakPassword { .. } => CredentialField::Password,
        }
    }

    /// Inline message shown next to the offending input.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(CredentialField::Email) => "El email es obligatorio".into(),
            Self::MissingField(CredentialField::Password) => "La contraseña es obligatoria".into(),
            Self::InvalidEmailFormat => "Formato de email inválido".into(),
            Self::UnauthorizedDomain { allowed: [a, b] } => {
                format!("Solo se permiten cuentas @{a} o @{b}")
            }
            Self::RoleMismatch {
                role,
                expected_domain,
            } => format!(
                "Para acceder como {}, usa una cuenta @{expected_domain}",
                role.label()
            ),
            Self::WeakPassword { min_length } => {
                format!("La contraseña debe tener al menos {min_length} caracteres")
            }
        }
    }
}

/// Which email domain routes to which role.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DomainPolicy {
    pub dispatcher_domain: String,
    pub field_domain: String,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            dispatcher_domain: DEFAULT_DISPATCHER_DOMAIN.to_string(),
            field_domain: DEFAULT_FIELD_DOMAIN.to_string(),
        }
    }
}

impl DomainPolicy {
    pub fn new(dispatcher_domain: impl Into<String>, field_domain: impl Into<String>) -> Self {
        Self {
            dispatcher_domain: dispatcher_domain.into(),
            field_domain: field_domain.into(),
        }
    }

    pub fn domain_for(&self, role: Role) -> &str {
        match role {
            Role::Dispatcher => &self.dispatcher_domain,
            Role::Field => &self.field_domain,
        }
    }

    /// Role owning `domain`, compared ASCII case-insensitively.
    pub fn role_for(&self, domain: &str) -> Option<Role> {
        if domain.eq_ignore_ascii_case(&self.dispatcher_domain) {
            Some(Role::Dispatcher)
        } else if domain.eq_ignore_ascii_case(&self.field_domain) {
            Some(Role::Field)
        } else {
            None
        }
    }
}

/// Field-scoped validation outcome.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialErrors {
    pub email: Option<AuthError>,
    pub password: Option<AuthError>,
}

impl CredentialErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    pub fn clear(&mut self, field: CredentialField) {
        match field {
            CredentialField::Email => self.email = None,
            CredentialField::Password => self.password = None,
        }
    }

    /// Email error first, then password.
    pub fn first(&self) -> Option<&AuthError> {
        self.email.as_ref().or(self.password.as_ref())
    }
}

fn check_email(
    email: &str,
    requested_role: Role,
    policy: &DomainPolicy,
) -> Result<Role, AuthError> {
    if email.is_empty() {
        return Err(AuthError::MissingField(CredentialField::Email));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidEmailFormat);
    }

    let domain = email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .ok_or(AuthError::InvalidEmailFormat)?;
    let role = policy
        .role_for(domain)
        .ok_or_else(|| AuthError::UnauthorizedDomain {
            allowed: [
                policy.dispatcher_domain.clone(),
                policy.field_domain.clone(),
            ],
        })?;

    if role != requested_role {
        return Err(AuthError::RoleMismatch {
            role: requested_role,
            expected_domain: policy.domain_for(requested_role).to_string(),
        });
    }
    Ok(role)
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::MissingField(CredentialField::Password));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min_length: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Validate both fields independently.
pub fn validate_credentials(
    email: &str,
    password: &SecretString,
    requested_role: Role,
    policy: &DomainPolicy,
) -> Result<Session, CredentialErrors> {
    let email = email.trim();
    let role = check_email(email, requested_role, policy);
    let password = check_password(password.expose_secret());

    match (role, password) {
        (Ok(role), Ok(())) => Ok(Session {
            email: email.to_string(),
            role,
        }),
        (role, password) => Err(CredentialErrors {
            email: role.err(),
            password: password.err(),
        }),
    }
}

/// Resolve a session for `requested_role`. The role comes from the email
/// domain; the first failing rule is reported, email before password.
pub fn authenticate(
    email: &str,
    password: &SecretString,
    requested_role: Role,
    policy: &DomainPolicy,
) -> Result<Session, AuthError> {
    validate_credentials(email, password, requested_role, policy).map_err(|errors| {
        errors
            .email
            .or(errors.password)
            .unwrap_or(AuthError::InvalidEmailFormat)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn example_policy() -> DomainPolicy {
        DomainPolicy::new("dispatch.example", "field.example")
    }

    #[test]
    fn dispatcher_domain_resolves_dispatcher() {
        let session = authenticate(
            "user@dispatch.example",
            &secret("password123"),
            Role::Dispatcher,
            &example_policy(),
        )
        .unwrap();
        assert_eq!(session.role, Role::Dispatcher);
        assert_eq!(session.email, "user@dispatch.example");
    }

    #[test]
    fn requested_role_must_match_domain() {
        let err = authenticate(
            "user@dispatch.example",
            &secret("password123"),
            Role::Field,
            &example_policy(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AuthError::RoleMismatch {
                role: Role::Field,
                expected_domain: "field.example".into()
            }
        );
        assert_eq!(
            err.user_message(),
            "Para acceder como Jefe/a de campo, usa una cuenta @field.example"
        );
    }

    #[test]
    fn malformed_email() {
        let err = authenticate(
            "bad-email",
            &secret("password123"),
            Role::Dispatcher,
            &example_policy(),
        )
        .unwrap_err();
        assert_eq!(err, AuthError::InvalidEmailFormat);
    }

    #[test]
    fn unknown_domain() {
        let err = authenticate(
            "ana@gmail.com",
            &secret("password123"),
            Role::Dispatcher,
            &DomainPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::UnauthorizedDomain { .. }));
        assert_eq!(
            err.user_message(),
            "Solo se permiten cuentas @cceu.sala.es o @cceu.campo.es"
        );
    }

    #[test]
    fn password_rules() {
        let policy = DomainPolicy::default();
        assert_eq!(
            authenticate("ana@cceu.campo.es", &secret(""), Role::Field, &policy),
            Err(AuthError::MissingField(CredentialField::Password))
        );
        assert_eq!(
            authenticate("ana@cceu.campo.es", &secret("1234567"), Role::Field, &policy),
            Err(AuthError::WeakPassword { min_length: 8 })
        );
        assert!(authenticate("ana@cceu.campo.es", &secret("12345678"), Role::Field, &policy).is_ok());
    }

    #[test]
    fn errors_are_field_scoped() {
        let errors = validate_credentials("", &secret("short"), Role::Dispatcher, &DomainPolicy::default())
            .unwrap_err();
        assert_eq!(
            errors.email,
            Some(AuthError::MissingField(CredentialField::Email))
        );
        assert_eq!(errors.password, Some(AuthError::WeakPassword { min_length: 8 }));

        let errors = validate_credentials(
            "jefe@cceu.sala.es",
            &secret("short"),
            Role::Dispatcher,
            &DomainPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(errors.email, None);
        assert!(errors.password.is_some());
    }

    #[test]
    fn domain_match_ignores_case_and_whitespace() {
        let session = authenticate(
            "  Jefe@CCEU.Sala.ES ",
            &secret("password123"),
            Role::Dispatcher,
            &DomainPolicy::default(),
        )
        .unwrap();
        assert_eq!(session.email, "Jefe@CCEU.Sala.ES");
    }

    #[test]
    fn password_length_counts_characters() {
        // Eight characters, more than eight bytes.
        assert!(check_password("contraseña").is_ok());
        assert!(check_password("ñññññññ").is_err());
    }
}
