//! Common error infrastructure for gacha-core.
//!
//! Domain-specific errors ([`ValidationError`](crate::ValidationError),
//! [`ActionError`](crate::ActionError)) live next to the rules they enforce
//! and share the classification defined here.
//!
//! # Design Principles
//!
//! - **Type Safety**: each rule family has its own error enum
//! - **Severity Classification**: callers pick a reply style from the severity
//! - **Request Scoped**: no error here is fatal to the process

/// Severity level of an error, used to decide how the caller reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Malformed admin input (out-of-range stat, unknown type, duplicate name).
    ///
    /// Nothing was mutated; the request must be corrected.
    Validation,

    /// The action lacks a required resource or context.
    ///
    /// Examples: insufficient SP, no active session, every skill on cooldown.
    /// No turn is consumed.
    Precondition,

    /// A concurrency cap rejected the request.
    ///
    /// Examples: guild at its session cap, user already in a battle.
    ConcurrencyLimit,

    /// An external collaborator failed after the state transition completed.
    ///
    /// Reported as a warning; never rolls back the transition.
    Integration,

    /// Unexpected inconsistency, e.g. a storage failure.
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::ConcurrencyLimit => "concurrency-limit",
            Self::Integration => "integration",
            Self::Internal => "internal",
        }
    }

    /// Returns true if the user can fix the request and retry.
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::Precondition | Self::ConcurrencyLimit
        )
    }

    /// Returns true if this error indicates a bug or infrastructure failure.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all gacha-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity by who can fix the problem, not by impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for metrics, logs and tests. Defaults to the type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
