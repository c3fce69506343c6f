use std::{fmt::Display, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

/// Server assigned message identifier.
///
/// A `Uid` is only meaningful within the folder it was reported for and may
/// go stale after a server side move.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(transparent)]
pub struct Uid(NonZeroU32);

impl Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<u32> for Uid {
    type Error = &'static str;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(Self(NonZeroU32::new(value).ok_or("uid must not be zero")?))
    }
}

impl TryFrom<&u32> for Uid {
    type Error = <Self as TryFrom<u32>>::Error;

    fn try_from(value: &u32) -> Result<Self, Self::Error> {
        Self::try_from(*value)
    }
}

impl FromStr for Uid {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map_err(|_| "uid should be an unsigned 32 bit number")?
            .try_into()
    }
}

impl From<Uid> for u32 {
    fn from(value: Uid) -> Self {
        value.0.get()
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(1)]
    #[case(4_294_967_295)]
    fn test_uid_roundtrips_through_u32(#[case] value: u32) {
        let uid = assert_ok!(Uid::try_from(value));
        assert_eq!(value, u32::from(uid));
        assert_eq!(value.to_string(), uid.to_string());
    }

    #[rstest]
    fn test_zero_is_not_a_uid() {
        assert_err!(Uid::try_from(0));
        assert_err!("0".parse::<Uid>());
    }

    #[rstest]
    #[case("17", 17)]
    #[case("4711", 4711)]
    fn test_uid_parses_from_str(#[case] input: &str, #[case] expected: u32) {
        let uid = assert_ok!(input.parse::<Uid>());
        assert_eq!(expected, u32::from(uid));
    }

    #[rstest]
    #[case("")]
    #[case("-3")]
    #[case("abc")]
    fn test_uid_rejects_garbage(#[case] input: &str) {
        assert_err!(input.parse::<Uid>());
    }
}
