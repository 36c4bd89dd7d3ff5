//! Chat platform identifiers.
//!
//! Guilds, users and messages are addressed by 64-bit snowflakes. Each gets a
//! newtype so a user id can never be passed where a guild id is expected.

use core::fmt;
use core::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake!(
    /// Server ("guild") scope; every record and session is partitioned by it.
    GuildId
);
snowflake!(
    /// A chat user.
    UserId
);
snowflake!(
    /// An outbound message; combat interactions must reference the session's message.
    MessageId
);
