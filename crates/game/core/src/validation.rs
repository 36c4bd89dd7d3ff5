//! Validation of catalog edits.
//!
//! Admin commands are simple field setters; every value goes through one of
//! the checks below before any record is touched.

use crate::combat::StatKind;
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};

/// Malformed admin input. Nothing was mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("a {kind} named `{name}` already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("no {kind} matches `{name}`")]
    NotFound { kind: &'static str, name: String },

    #[error("weight must be a positive integer")]
    ZeroWeight,

    #[error("{stat} must be between {min} and {max}, got {value}", min = GameConfig::MIN_STAT, max = GameConfig::MAX_STAT)]
    StatOutOfRange { stat: StatKind, value: u32 },

    #[error("reflect percentage must be between 0 and {max}, got {0}", max = GameConfig::MAX_REFLECT_PERCENT)]
    ReflectOutOfRange(u32),

    #[error("pity must be between {min} and {max}, got {0}", min = GameConfig::MIN_PITY_MAX, max = GameConfig::MAX_PITY_MAX)]
    PityOutOfRange(u32),

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("unknown elemental type `{0}`")]
    UnknownElement(String),

    #[error("unknown rarity `{0}`")]
    UnknownRarity(String),

    #[error("unknown object type `{0}`")]
    UnknownObjectKind(String),

    #[error("unknown effect `{0}`")]
    UnknownEffect(String),

    #[error("unknown stat `{0}`")]
    UnknownStat(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("invalid value `{value}` for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("at most {limit} skills may be assigned")]
    TooManySkills { limit: usize },

    #[error("`{0}` is not a character")]
    NotACharacter(String),

    #[error("`{0}` is not collectable")]
    NotCollectable(String),

    #[error("a battle needs at least one character")]
    EmptyParty,
}

impl GameError for ValidationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyName => "EMPTY_NAME",
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ZeroWeight => "ZERO_WEIGHT",
            Self::StatOutOfRange { .. } => "STAT_OUT_OF_RANGE",
            Self::ReflectOutOfRange(_) => "REFLECT_OUT_OF_RANGE",
            Self::PityOutOfRange(_) => "PITY_OUT_OF_RANGE",
            Self::TooLarge { .. } => "TOO_LARGE",
            Self::UnknownElement(_) => "UNKNOWN_ELEMENT",
            Self::UnknownRarity(_) => "UNKNOWN_RARITY",
            Self::UnknownObjectKind(_) => "UNKNOWN_OBJECT_KIND",
            Self::UnknownEffect(_) => "UNKNOWN_EFFECT",
            Self::UnknownStat(_) => "UNKNOWN_STAT",
            Self::UnknownField(_) => "UNKNOWN_FIELD",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::TooManySkills { .. } => "TOO_MANY_SKILLS",
            Self::NotACharacter(_) => "NOT_A_CHARACTER",
            Self::NotCollectable(_) => "NOT_COLLECTABLE",
            Self::EmptyParty => "EMPTY_PARTY",
        }
    }
}

pub fn name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub fn weight(value: u32) -> Result<u32, ValidationError> {
    if value == 0 {
        return Err(ValidationError::ZeroWeight);
    }
    Ok(value)
}

pub fn stat(kind: StatKind, value: u32) -> Result<u32, ValidationError> {
    if !(GameConfig::MIN_STAT..=GameConfig::MAX_STAT).contains(&value) {
        return Err(ValidationError::StatOutOfRange { stat: kind, value });
    }
    Ok(value)
}

pub fn reflect_percent(value: u32) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|pct| *pct <= GameConfig::MAX_REFLECT_PERCENT)
        .ok_or(ValidationError::ReflectOutOfRange(value))
}

pub fn pity_max(value: u32) -> Result<u32, ValidationError> {
    if !(GameConfig::MIN_PITY_MAX..=GameConfig::MAX_PITY_MAX).contains(&value) {
        return Err(ValidationError::PityOutOfRange(value));
    }
    Ok(value)
}

pub fn at_most(field: &'static str, value: u32, max: u32) -> Result<u32, ValidationError> {
    if value > max {
        return Err(ValidationError::TooLarge { field, value, max });
    }
    Ok(value)
}

/// Parse a string field through `FromStr`, mapping failures to `InvalidValue`.
pub fn parse<T: core::str::FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_bounds_are_inclusive() {
        assert_eq!(stat(StatKind::Atk, 1), Ok(1));
        assert_eq!(stat(StatKind::Atk, 1000), Ok(1000));
        assert!(matches!(
            stat(StatKind::Hp, 0),
            Err(ValidationError::StatOutOfRange { stat: StatKind::Hp, value: 0 })
        ));
        assert!(stat(StatKind::Def, 1001).is_err());
    }

    #[test]
    fn pity_bounds() {
        assert!(pity_max(0).is_err());
        assert_eq!(pity_max(1), Ok(1));
        assert_eq!(pity_max(500), Ok(500));
        assert!(pity_max(501).is_err());
    }

    #[test]
    fn reflect_bounds() {
        assert_eq!(reflect_percent(0), Ok(0));
        assert_eq!(reflect_percent(100), Ok(100));
        assert_eq!(
            reflect_percent(101),
            Err(ValidationError::ReflectOutOfRange(101))
        );
        assert_eq!(
            reflect_percent(300),
            Err(ValidationError::ReflectOutOfRange(300))
        );
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(name("  Aria "), Ok("Aria".to_string()));
        assert_eq!(name("   "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn all_validation_errors_share_severity() {
        assert_eq!(ValidationError::ZeroWeight.severity(), ErrorSeverity::Validation);
        assert_eq!(ValidationError::ZeroWeight.error_code(), "ZERO_WEIGHT");
    }
}
