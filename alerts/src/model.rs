use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use common::clock::Clock;

use crate::error::AlertError;

pub type AlertId = uuid::Uuid;

/// Which side of the target price fires the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    /// Both bounds are inclusive: a price equal to the target always fires.
    pub fn is_crossed(self, target: Decimal, price: Decimal) -> bool {
        match self {
            Direction::Above => price >= target,
            Direction::Below => price <= target,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Above => "above",
            Direction::Below => "below",
        };
        f.write_str(s)
    }
}

impl FromStr for Direction {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Direction::Above),
            "below" => Ok(Direction::Below),
            other => Err(AlertError::Validation(format!(
                "direction must be `above` or `below`, got `{other}`"
            ))),
        }
    }
}

/// Reading of `clock` as a UTC timestamp. Out-of-range readings fall back
/// to the system time.
pub(crate) fn timestamp(clock: &dyn Clock) -> DateTime<Utc> {
    i64::try_from(clock.now_ms())
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}

/// A user's price alert for one asset. At most one is live per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub asset_id: String,
    pub asset_name: String,
    pub target_price: Decimal,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_crossed_by(&self, price: Decimal) -> bool {
        self.direction.is_crossed(self.target_price, price)
    }
}

/// Record of an alert firing. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredAlert {
    #[serde(flatten)]
    pub alert: Alert,
    pub triggered_at: DateTime<Utc>,
    pub triggered_price: Decimal,
}

impl TriggeredAlert {
    /// Identity of the alert that fired.
    pub fn source_id(&self) -> AlertId {
        self.alert.id
    }
}

/// Parses user-entered target price text. Rejects non-numeric and
/// non-positive input.
pub fn parse_target_price(input: &str) -> Result<Decimal, AlertError> {
    let trimmed = input.trim();
    let price = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AlertError::Validation(format!("`{trimmed}` is not a valid price")))?;

    validate_target_price(price)?;
    Ok(price)
}

pub(crate) fn validate_target_price(price: Decimal) -> Result<(), AlertError> {
    if price <= Decimal::ZERO {
        return Err(AlertError::Validation(format!(
            "target price must be greater than zero, got {price}"
        )));
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn exactly_one_side_fires_unless_equal(
            target_cents in 1..=10_000_000_000i64,
            price_cents in 0..=10_000_000_000i64,
        ) {
            let target = Decimal::new(target_cents, 2);
            let price = Decimal::new(price_cents, 2);

            let above = Direction::Above.is_crossed(target, price);
            let below = Direction::Below.is_crossed(target, price);

            if price == target {
                prop_assert!(above && below);
            } else {
                prop_assert!(above != below);
            }
        }
    }
}
