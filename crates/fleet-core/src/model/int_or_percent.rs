//! A percent-or-int value, used by `maxSurge`/`maxUnavailable` (§4.D),
//! mirroring Kubernetes' own rolling-update percentage semantics.

use std::fmt::{self, Display};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Either a fixed count or a percentage of some `target`, resolved with
/// [`IntOrPercent::resolve`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum IntOrPercent {
    Int(u32),
    Percent(String),
}

impl Display for IntOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrPercent::Int(v) => write!(f, "{v}"),
            IntOrPercent::Percent(p) => write!(f, "{p}"),
        }
    }
}

/// Rounding direction used by [`IntOrPercent::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Used for `maxUnavailable` (§4.D).
    Down,
    /// Used for `maxSurge` (§4.D).
    Up,
}

impl IntOrPercent {
    /// Resolves against `target`, rounding according to `rounding`. A
    /// resolved percentage is floored to a minimum of 1 unless the field was
    /// explicitly set to the literal integer `0`, or `target` itself is `0`
    /// (§4.D, §9: "when `target=0` after a shrink ... treat it as no
    /// advancement allowed" -- there is nothing to round up or down to).
    pub fn resolve(&self, target: u32, rounding: Rounding) -> u32 {
        match self {
            IntOrPercent::Int(v) => *v,
            IntOrPercent::Percent(p) => {
                if target == 0 {
                    return 0;
                }
                let pct: u32 = p.trim_end_matches('%').parse().unwrap_or(0);
                let numerator = target as u64 * pct as u64;
                let value = match rounding {
                    Rounding::Down => numerator / 100,
                    Rounding::Up => numerator.div_ceil(100),
                };
                let value = value as u32;
                if value == 0 && pct > 0 {
                    1
                } else {
                    value
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IntOrPercent::Int(0), 10, Rounding::Down, 0)]
    #[case(IntOrPercent::Int(2), 10, Rounding::Down, 2)]
    #[case(IntOrPercent::Percent("25%".into()), 10, Rounding::Down, 2)]
    #[case(IntOrPercent::Percent("25%".into()), 10, Rounding::Up, 3)]
    #[case(IntOrPercent::Percent("1%".into()), 10, Rounding::Down, 1)]
    #[case(IntOrPercent::Percent("0%".into()), 10, Rounding::Down, 0)]
    #[case(IntOrPercent::Percent("25%".into()), 0, Rounding::Down, 0)]
    #[case(IntOrPercent::Percent("25%".into()), 0, Rounding::Up, 0)]
    #[case(IntOrPercent::Int(3), 0, Rounding::Down, 3)]
    fn resolves(
        #[case] value: IntOrPercent,
        #[case] target: u32,
        #[case] rounding: Rounding,
        #[case] expected: u32,
    ) {
        assert_eq!(value.resolve(target, rounding), expected);
    }
}
