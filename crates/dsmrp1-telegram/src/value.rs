//! Parsers for the value formats found inside telegram records.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::Serialize;

use crate::error::{TimestampFormatError, ValueFormatError};

const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// A numeric reading with its unit, e.g. `1234567 Wh`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

/// Parse a `<number>*<unit>` value such as `001234.567*kWh`.
///
/// A `k` unit prefix is folded into the value: `1.5*kW` becomes `1500 W`.
/// No other prefixes are recognised.
pub fn parse_value_with_unit(input: &str) -> Result<Quantity, ValueFormatError> {
    let mut parts = input.split('*');
    let (Some(number), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValueFormatError::MissingUnit {
            input: input.to_string(),
        });
    };

    let mut value: f64 = number
        .parse()
        .map_err(|source| ValueFormatError::InvalidNumber {
            input: input.to_string(),
            source,
        })?;

    let unit = match unit.strip_prefix('k') {
        Some(base) => {
            value *= 1000.0;
            base
        }
        None => unit,
    };

    Ok(Quantity {
        value,
        unit: unit.to_string(),
    })
}

/// A named UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Abbreviation, e.g. `CEST`.
    pub designation: String,
    pub offset: FixedOffset,
}

/// Which offsets the `S` and `W` timestamp suffixes stand for.
///
/// Meters report local time plus a DST flag, so the zone has to be fixed up
/// front; it is never taken from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezonePolicy {
    /// Selected by a trailing `S`.
    pub summer: Zone,
    /// Selected by a trailing `W`.
    pub winter: Zone,
}

impl TimezonePolicy {
    /// Central European time: `CEST` (UTC+2) in summer, `CET` (UTC+1) in winter.
    pub fn central_europe() -> Self {
        Self {
            summer: Zone {
                designation: "CEST".to_string(),
                offset: hours_east(2),
            },
            winter: Zone {
                designation: "CET".to_string(),
                offset: hours_east(1),
            },
        }
    }

    /// The zone for a DST indicator character, if it is one.
    pub fn zone_for(&self, indicator: char) -> Option<&Zone> {
        match indicator {
            'S' => Some(&self.summer),
            'W' => Some(&self.winter),
            _ => None,
        }
    }
}

impl Default for TimezonePolicy {
    fn default() -> Self {
        Self::central_europe()
    }
}

fn hours_east(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Parse a `YYMMDDhhmmssX` timestamp in Central European time.
///
/// `X` is `S` for summer time or `W` for winter time.
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, TimestampFormatError> {
    parse_timestamp_in(input, &TimezonePolicy::central_europe())
}

/// Parse a `YYMMDDhhmmssX` timestamp using an explicit timezone policy.
pub fn parse_timestamp_in(
    input: &str,
    policy: &TimezonePolicy,
) -> Result<DateTime<FixedOffset>, TimestampFormatError> {
    let indicator = input.chars().last().ok_or(TimestampFormatError::Empty)?;
    let zone = policy
        .zone_for(indicator)
        .ok_or_else(|| TimestampFormatError::InvalidDstIndicator {
            input: input.to_string(),
            indicator,
        })?;

    let digits = &input[..input.len() - indicator.len_utf8()];
    let local = NaiveDateTime::parse_from_str(digits, TIMESTAMP_FORMAT).map_err(|source| {
        TimestampFormatError::Invalid {
            input: input.to_string(),
            source,
        }
    })?;

    // A fixed offset maps every local time to exactly one instant.
    Ok(zone.offset.from_utc_datetime(&(local - zone.offset)))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn kilo_prefix_is_scaled() {
        let q = parse_value_with_unit("1234.567*kWh").unwrap();
        assert!((q.value - 1_234_567.0).abs() < 1e-6);
        assert_eq!(q.unit, "Wh");
    }

    #[test]
    fn plain_unit_is_kept() {
        let q = parse_value_with_unit("230.0*V").unwrap();
        assert_eq!(q.value, 230.0);
        assert_eq!(q.unit, "V");

        let q = parse_value_with_unit("12785.123*m3").unwrap();
        assert_eq!(q.value, 12785.123);
        assert_eq!(q.unit, "m3");
    }

    #[test]
    fn leading_zeros() {
        let q = parse_value_with_unit("0001.234*kW").unwrap();
        assert!((q.value - 1234.0).abs() < 1e-9);
        assert_eq!(q.unit, "W");
    }

    #[test]
    fn only_kilo_is_recognised() {
        let q = parse_value_with_unit("5*MW").unwrap();
        assert_eq!(q.value, 5.0);
        assert_eq!(q.unit, "MW");
    }

    #[test]
    fn missing_unit_is_rejected() {
        assert!(matches!(
            parse_value_with_unit("bad"),
            Err(ValueFormatError::MissingUnit { .. })
        ));
        assert!(matches!(
            parse_value_with_unit("1*2*kW"),
            Err(ValueFormatError::MissingUnit { .. })
        ));
    }

    #[test]
    fn invalid_number_is_rejected() {
        assert!(matches!(
            parse_value_with_unit("abc*kWh"),
            Err(ValueFormatError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn summer_timestamp() {
        let ts = parse_timestamp("210315120000S").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2021, 3, 15));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 0, 0));
        assert_eq!(ts.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(ts.to_rfc3339(), "2021-03-15T12:00:00+02:00");
    }

    #[test]
    fn winter_timestamp() {
        let ts = parse_timestamp("101209113020W").unwrap();
        assert_eq!(ts.to_rfc3339(), "2010-12-09T11:30:20+01:00");
    }

    #[test]
    fn bad_dst_indicator() {
        match parse_timestamp("210315120000X") {
            Err(TimestampFormatError::InvalidDstIndicator { indicator, .. }) => {
                assert_eq!(indicator, 'X')
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            parse_timestamp(""),
            Err(TimestampFormatError::Empty)
        ));
    }

    #[test]
    fn invalid_calendar_value() {
        assert!(matches!(
            parse_timestamp("211315120000W"),
            Err(TimestampFormatError::Invalid { .. })
        ));
        assert!(matches!(
            parse_timestamp("2103151200S"),
            Err(TimestampFormatError::Invalid { .. })
        ));
    }

    #[test]
    fn explicit_policy() {
        let policy = TimezonePolicy {
            summer: Zone {
                designation: "UTC".to_string(),
                offset: FixedOffset::east_opt(0).unwrap(),
            },
            winter: Zone {
                designation: "UTC".to_string(),
                offset: FixedOffset::east_opt(0).unwrap(),
            },
        };
        let ts = parse_timestamp_in("210315120000S", &policy).unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-15T12:00:00+00:00");
    }

    #[test]
    fn default_policy_designations() {
        let policy = TimezonePolicy::default();
        assert_eq!(policy.zone_for('S').unwrap().designation, "CEST");
        assert_eq!(policy.zone_for('W').unwrap().designation, "CET");
        assert!(policy.zone_for('X').is_none());
    }
}
