use std::{convert::Infallible, fmt::Display, ops::Deref, str::FromStr};

use crate::kvp::Value;

/// A validated Kubernetes annotation value.
///
/// Unlike [`LabelValue`](crate::kvp::LabelValue), annotation values accept
/// any valid UTF-8 data and parsing can therefore never fail -- see
/// <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotationValue(String);

impl Value for AnnotationValue {
    type Error = Infallible;
}

impl FromStr for AnnotationValue {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self(input.to_string()))
    }
}

impl Deref for AnnotationValue {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
