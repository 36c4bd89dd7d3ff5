//! Elemental types used by weaknesses, resistances and reflects.

/// Elemental type of a combatant or skill.
///
/// Parsed case-insensitively; admin input outside this set is rejected.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementalType {
    #[default]
    Neutral,
    Fire,
    Water,
    Earth,
    Wind,
    Thunder,
    Ice,
    Light,
    Dark,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_any_case_and_displays_lowercase() {
        assert_eq!("FIRE".parse::<ElementalType>().ok(), Some(ElementalType::Fire));
        assert_eq!(ElementalType::Thunder.to_string(), "thunder");
        assert!("plasma".parse::<ElementalType>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for element in ElementalType::iter() {
            assert_eq!(element.to_string().parse::<ElementalType>().ok(), Some(element));
        }
    }
}
