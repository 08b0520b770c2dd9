//! Wire encoding for task timestamps.
//!
//! The scheduler speaks Unix seconds. Whole seconds travel as integers; a
//! sub-second part travels as a fractional number with millisecond
//! precision, so retry backoffs shorter than a second survive the trip.

use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use std::fmt;

/// Reads `clock` at the precision the wire format keeps.
pub(crate) fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(3)
}

pub(crate) fn serialize<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    UnixSeconds(*value).serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    UnixSeconds::deserialize(deserializer).map(|seconds| seconds.0)
}

/// Optional variant for patch fields.
pub(crate) mod option {
    use super::UnixSeconds;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[expect(
        clippy::ref_option,
        reason = "serde `with` modules receive the field by reference"
    )]
    pub(crate) fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(UnixSeconds).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<UnixSeconds>::deserialize(deserializer)
            .map(|seconds| seconds.map(|inner| inner.0))
    }
}

#[derive(Debug, Clone, Copy)]
struct UnixSeconds(DateTime<Utc>);

impl Serialize for UnixSeconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = self.0.timestamp_millis();
        if millis.rem_euclid(1_000) == 0 {
            return serializer.serialize_i64(self.0.timestamp());
        }
        let sign = if millis < 0 { "-" } else { "" };
        let magnitude = millis.unsigned_abs();
        let decimal = format!(
            "{sign}{}.{:03}",
            magnitude.div_euclid(1_000),
            magnitude.rem_euclid(1_000)
        );
        let seconds: f64 = decimal
            .parse()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_f64(seconds)
    }
}

impl<'de> Deserialize<'de> for UnixSeconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UnixSecondsVisitor)
    }
}

struct UnixSecondsVisitor;

impl Visitor<'_> for UnixSecondsVisitor {
    type Value = UnixSeconds;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a Unix timestamp in seconds")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        DateTime::from_timestamp(value, 0)
            .map(UnixSeconds)
            .ok_or_else(|| E::custom(format!("timestamp {value} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        let signed = i64::try_from(value)
            .map_err(|_| E::custom(format!("timestamp {value} is out of range")))?;
        self.visit_i64(signed)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        // Rounds to milliseconds through the decimal form; "NaN" and "inf"
        // fail to parse.
        let millis: i64 = format!("{value:.3}")
            .replace('.', "")
            .parse()
            .map_err(|_| E::custom(format!("timestamp {value} is not representable")))?;
        DateTime::from_timestamp_millis(millis)
            .map(UnixSeconds)
            .ok_or_else(|| E::custom(format!("timestamp {value} is out of range")))
    }
}
