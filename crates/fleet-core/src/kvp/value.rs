use std::{fmt::Debug, ops::Deref, str::FromStr};

/// A value of a [`KeyValuePair`](super::KeyValuePair). Implementors validate
/// and normalize the raw string value according to their own rules (label
/// values are restricted to a narrow ASCII charset, annotation values accept
/// any UTF-8).
pub trait Value:
    Clone + Debug + PartialEq + Eq + PartialOrd + Ord + Deref<Target = str> + FromStr<Err = Self::Error>
{
    type Error: std::error::Error + 'static;
}
