//! This module contains a common [`Duration`] struct which is able to parse
//! human-readable duration formats, like `2d 2h 20m 42s`. It additionally
//! implements many required traits, like [`JsonSchema`], [`Deserialize`], and
//! [`Serialize`] (see [`serde_impl`]).
//!
//! Every reconciler-tunable timeout or interval in [`crate::model`] (rollout
//! unavailability dwell window, scheduling backoff, retry budgets) uses
//! [`Duration`] instead of the plain [`std::time::Duration`], so that it can
//! be expressed in CRD fields and config files the way an operator expects to
//! write them.

use std::{
    fmt::{Display, Write},
    num::ParseIntError,
    ops::{Deref, DerefMut},
    str::FromStr,
};

use schemars::JsonSchema;
use snafu::Snafu;
use strum::IntoEnumIterator;

mod serde_impl;
pub use serde_impl::*;

/// The error type for [`Duration`] parsing operations.
#[derive(Debug, PartialEq, Snafu)]
pub enum DurationParseError {
    #[snafu(display("invalid input, either empty or contains non-ascii characters"))]
    InvalidInput,

    #[snafu(display("failed to parse duration fragment"))]
    FragmentError { source: DurationFragmentParseError },
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, PartialOrd, JsonSchema)]
pub struct Duration(std::time::Duration);

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input.is_empty() || !input.is_ascii() {
            return Err(DurationParseError::InvalidInput);
        }

        let values: Vec<u128> = input
            .split(' ')
            .map(|p| p.parse::<DurationFragment>())
            .map(|r| r.map(|f| f.millis()))
            .collect::<Result<Vec<_>, DurationFragmentParseError>>()
            .map_err(|source| DurationParseError::FragmentError { source })?;

        Ok(Self(std::time::Duration::from_millis(
            values.iter().fold(0, |acc, v| acc + (*v as u64)),
        )))
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_zero() {
            return write!(f, "0{}", DurationUnit::Milliseconds);
        }

        let mut millis = self.0.as_millis();
        let mut formatted = String::new();

        for unit in DurationUnit::iter() {
            let whole = millis / unit.millis();
            let rest = millis % unit.millis();

            if whole > 0 {
                write!(formatted, "{}{} ", whole, unit)?;
            }

            millis = rest;
        }

        write!(f, "{}", formatted.trim_end())
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Duration {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self(value)
    }
}

impl Duration {
    /// Creates a new [`Duration`] from the specified number of whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(std::time::Duration::from_secs(secs))
    }

    /// Creates a new [`Duration`] from the specified number of whole
    /// milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }
}

/// Defines supported [`DurationUnit`]s. Each [`DurationFragment`] consists of
/// a numeric value followed by a [`DurationUnit`]. The order of variants
/// **MATTERS**: it is the basis for the correct transformation of the
/// [`std::time::Duration`] back to a human-readable format in the
/// [`Display`] implementation of [`Duration`].
#[derive(Debug, strum::EnumString, strum::Display, strum::AsRefStr, strum::EnumIter)]
pub enum DurationUnit {
    #[strum(serialize = "d")]
    Days,

    #[strum(serialize = "h")]
    Hours,

    #[strum(serialize = "m")]
    Minutes,

    #[strum(serialize = "s")]
    Seconds,

    #[strum(serialize = "ms")]
    Milliseconds,
}

impl DurationUnit {
    /// Returns the number of whole milliseconds in each supported
    /// [`DurationUnit`].
    pub fn millis(&self) -> u128 {
        use DurationUnit::*;

        match self {
            Days => 24 * Hours.millis(),
            Hours => 60 * Minutes.millis(),
            Minutes => 60 * Seconds.millis(),
            Seconds => 1000,
            Milliseconds => 1,
        }
    }
}

/// The error type for [`DurationFragment`] parsing operations.
#[derive(Debug, PartialEq, Snafu)]
pub enum DurationFragmentParseError {
    #[snafu(display("invalid input, either empty or contains non-ascii characters"))]
    InvalidInput,

    #[snafu(display("expected number, the duration fragment must start with a numeric character"))]
    ExpectedNumber,

    #[snafu(display("expected character, the duration fragment must end with an alphabetic character"))]
    ExpectedCharacter,

    #[snafu(display("failed to parse fragment value as integer"))]
    ParseIntError { source: ParseIntError },

    #[snafu(display("failed to parse fragment unit"))]
    UnitParseError,
}

/// Each [`DurationFragment`] consists of a numeric value followed by a
/// [`DurationUnit`].
#[derive(Debug)]
pub struct DurationFragment {
    value: u128,
    unit: DurationUnit,
}

impl FromStr for DurationFragment {
    type Err = DurationFragmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input.is_empty() {
            return Err(DurationFragmentParseError::InvalidInput);
        }

        let mut chars = input.char_indices().peekable();
        let mut end_index = 0;

        while let Some((i, _)) = chars.next_if(|(_, c)| char::is_numeric(*c)) {
            end_index = i + 1;
        }

        let value = if end_index != 0 {
            s[0..end_index]
                .parse::<u128>()
                .map_err(|source| DurationFragmentParseError::ParseIntError { source })?
        } else {
            return Err(DurationFragmentParseError::ExpectedNumber);
        };

        let start_index = end_index;
        while let Some((i, _)) = chars.next_if(|(_, c)| char::is_alphabetic(*c)) {
            end_index = i + 1;
        }

        let unit = if end_index != 0 {
            s[start_index..end_index]
                .parse::<DurationUnit>()
                .map_err(|_| DurationFragmentParseError::UnitParseError)?
        } else {
            return Err(DurationFragmentParseError::ExpectedCharacter);
        };

        if chars.peek().is_some() {
            return Err(DurationFragmentParseError::ExpectedCharacter);
        }

        Ok(Self { value, unit })
    }
}

impl Display for DurationFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

impl DurationFragment {
    /// Returns the amount of whole milliseconds encoded by this
    /// [`DurationFragment`].
    pub fn millis(&self) -> u128 {
        self.value * self.unit.millis()
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[rstest]
    #[case("15d 2m 2s", 1296122)]
    #[case("1h", 3600)]
    #[case("1m", 60)]
    #[case("1s", 1)]
    fn parse(#[case] input: &str, #[case] output: u64) {
        let dur: Duration = input.parse().unwrap();
        assert_eq!(dur.as_secs(), output);
    }

    #[rstest]
    #[case(
        "2d2",
        DurationParseError::FragmentError { source: DurationFragmentParseError::ExpectedCharacter }
    )]
    #[case(
        "-1h",
        DurationParseError::FragmentError { source: DurationFragmentParseError::ExpectedNumber }
    )]
    #[case(
        "1D",
        DurationParseError::FragmentError { source: DurationFragmentParseError::UnitParseError }
    )]
    #[case("1ä", DurationParseError::InvalidInput)]
    #[case(" ", DurationParseError::InvalidInput)]
    fn parse_invalid(#[case] input: &str, #[case] expected_err: DurationParseError) {
        let err = Duration::from_str(input).unwrap_err();
        assert_eq!(err, expected_err)
    }

    #[rstest]
    #[case("15d 2m 2s")]
    #[case("1h 20m")]
    #[case("1m")]
    #[case("1s")]
    fn to_string(#[case] duration: &str) {
        let dur: Duration = duration.parse().unwrap();
        assert_eq!(dur.to_string(), duration);
    }

    #[test]
    fn deserialize() {
        #[derive(Deserialize)]
        struct S {
            dur: Duration,
        }

        let s: S = serde_yaml::from_str("dur: 15d 2m 2s").unwrap();
        assert_eq!(s.dur.as_secs(), 1296122);
    }

    #[test]
    fn serialize() {
        #[derive(Serialize)]
        struct S {
            dur: Duration,
        }

        let s = S {
            dur: "15d 2m 2s".parse().unwrap(),
        };
        assert_eq!(serde_yaml::to_string(&s).unwrap(), "dur: 15d 2m 2s\n");
    }
}
