//! Typed access to the commonly used records of a DSMR 4 telegram.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::ReadingError;
use crate::telegram::Records;
use crate::value::{parse_timestamp_in, parse_value_with_unit, Quantity, TimezonePolicy};

/// Well-known OBIS identifier codes.
pub mod obis {
    /// Protocol version of the telegram.
    pub const VERSION: &str = "1-3:0.2.8";
    /// Date-time stamp of the telegram (`YYMMDDhhmmssX`).
    pub const TIMESTAMP: &str = "0-0:1.0.0";
    /// Equipment identifier, hex-encoded ASCII.
    pub const EQUIPMENT_ID: &str = "0-0:96.1.1";
    /// Electricity delivered to the client, tariff 1.
    pub const ENERGY_DELIVERED_TARIFF1: &str = "1-0:1.8.1";
    /// Electricity delivered to the client, tariff 2.
    pub const ENERGY_DELIVERED_TARIFF2: &str = "1-0:1.8.2";
    /// Electricity delivered by the client, tariff 1.
    pub const ENERGY_RECEIVED_TARIFF1: &str = "1-0:2.8.1";
    /// Electricity delivered by the client, tariff 2.
    pub const ENERGY_RECEIVED_TARIFF2: &str = "1-0:2.8.2";
    /// Active tariff.
    pub const TARIFF_INDICATOR: &str = "0-0:96.14.0";
    /// Actual power delivered (+P).
    pub const POWER_DELIVERED: &str = "1-0:1.7.0";
    /// Actual power received (-P).
    pub const POWER_RECEIVED: &str = "1-0:2.7.0";
    /// Gas meter reading on M-Bus channel 1: capture time and volume.
    pub const GAS_DELIVERED: &str = "0-1:24.2.1";
}

/// A meter reading with its own capture time (e.g. the hourly gas value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedQuantity {
    pub captured_at: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub quantity: Quantity,
}

/// The commonly used fields of a telegram.
///
/// Fields whose code is absent from the telegram are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub equipment_id: Option<String>,
    pub tariff: Option<String>,
    pub energy_delivered_tariff1: Option<Quantity>,
    pub energy_delivered_tariff2: Option<Quantity>,
    pub energy_received_tariff1: Option<Quantity>,
    pub energy_received_tariff2: Option<Quantity>,
    pub power_delivered: Option<Quantity>,
    pub power_received: Option<Quantity>,
    pub gas_delivered: Option<TimedQuantity>,
}

impl Reading {
    /// Extract the well-known fields from parsed records.
    ///
    /// A present but malformed value is an error naming its code.
    pub fn from_records(
        records: &Records,
        policy: &TimezonePolicy,
    ) -> Result<Self, ReadingError> {
        let timestamp = first(records, obis::TIMESTAMP)?
            .map(|raw| {
                parse_timestamp_in(raw, policy).map_err(|source| ReadingError::Timestamp {
                    code: obis::TIMESTAMP,
                    source,
                })
            })
            .transpose()?;

        let gas_delivered = match records.get(obis::GAS_DELIVERED) {
            None => None,
            Some(values) if values.len() < 2 => {
                return Err(ReadingError::MissingValue {
                    code: obis::GAS_DELIVERED,
                    expected: 2,
                    found: values.len(),
                })
            }
            Some(values) => Some(TimedQuantity {
                captured_at: parse_timestamp_in(&values[0], policy).map_err(|source| {
                    ReadingError::Timestamp {
                        code: obis::GAS_DELIVERED,
                        source,
                    }
                })?,
                quantity: quantity(obis::GAS_DELIVERED, &values[1])?,
            }),
        };

        Ok(Self {
            timestamp,
            equipment_id: first(records, obis::EQUIPMENT_ID)?.map(decode_equipment_id),
            tariff: first(records, obis::TARIFF_INDICATOR)?.map(str::to_string),
            energy_delivered_tariff1: quantity_of(records, obis::ENERGY_DELIVERED_TARIFF1)?,
            energy_delivered_tariff2: quantity_of(records, obis::ENERGY_DELIVERED_TARIFF2)?,
            energy_received_tariff1: quantity_of(records, obis::ENERGY_RECEIVED_TARIFF1)?,
            energy_received_tariff2: quantity_of(records, obis::ENERGY_RECEIVED_TARIFF2)?,
            power_delivered: quantity_of(records, obis::POWER_DELIVERED)?,
            power_received: quantity_of(records, obis::POWER_RECEIVED)?,
            gas_delivered,
        })
    }
}

fn first<'a>(records: &'a Records, code: &'static str) -> Result<Option<&'a str>, ReadingError> {
    match records.get(code) {
        None => Ok(None),
        Some(values) => values
            .first()
            .map(|v| Some(v.as_str()))
            .ok_or(ReadingError::MissingValue {
                code,
                expected: 1,
                found: 0,
            }),
    }
}

fn quantity(code: &'static str, raw: &str) -> Result<Quantity, ReadingError> {
    parse_value_with_unit(raw).map_err(|source| ReadingError::Value { code, source })
}

fn quantity_of(records: &Records, code: &'static str) -> Result<Option<Quantity>, ReadingError> {
    first(records, code)?.map(|raw| quantity(code, raw)).transpose()
}

/// Equipment identifiers are sent as hex-encoded ASCII; fall back to the raw
/// string when it isn't.
fn decode_equipment_id(raw: &str) -> String {
    let decoded: Option<Vec<u8>> = (0..raw.len())
        .step_by(2)
        .map(|i| raw.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok()))
        .collect();

    match decoded.and_then(|bytes| String::from_utf8(bytes).ok()) {
        Some(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic()) => text,
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(entries: &[(&str, &[&str])]) -> Records {
        entries
            .iter()
            .map(|(code, values)| {
                (
                    code.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn extracts_known_fields() {
        let records = records(&[
            (obis::TIMESTAMP, &["101209113020W"]),
            (obis::EQUIPMENT_ID, &["4B384547303034303436333935353037"]),
            (obis::ENERGY_DELIVERED_TARIFF1, &["123456.789*kWh"]),
            (obis::TARIFF_INDICATOR, &["0002"]),
            (obis::POWER_DELIVERED, &["01.193*kW"]),
            (obis::POWER_RECEIVED, &["00.000*kW"]),
            (obis::GAS_DELIVERED, &["101209112500W", "12785.123*m3"]),
        ]);

        let reading = Reading::from_records(&records, &TimezonePolicy::default()).unwrap();

        assert_eq!(
            reading.timestamp.unwrap().to_rfc3339(),
            "2010-12-09T11:30:20+01:00"
        );
        assert_eq!(reading.equipment_id.as_deref(), Some("K8EG004046395507"));
        assert_eq!(reading.tariff.as_deref(), Some("0002"));
        let power = reading.power_delivered.unwrap();
        assert!((power.value - 1193.0).abs() < 1e-9);
        assert_eq!(power.unit, "W");
        assert_eq!(reading.power_received.unwrap().value, 0.0);
        assert!(reading.energy_delivered_tariff2.is_none());

        let gas = reading.gas_delivered.unwrap();
        assert_eq!(gas.quantity.unit, "m3");
        assert_eq!(gas.captured_at.to_rfc3339(), "2010-12-09T11:25:00+01:00");
    }

    #[test]
    fn empty_records_give_empty_reading() {
        let reading = Reading::from_records(&Records::new(), &TimezonePolicy::default()).unwrap();
        assert_eq!(reading, Reading::default());
    }

    #[test]
    fn malformed_field_names_its_code() {
        let records = records(&[(obis::POWER_DELIVERED, &["garbage"])]);
        let err = Reading::from_records(&records, &TimezonePolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadingError::Value {
                code: obis::POWER_DELIVERED,
                ..
            }
        ));
        assert!(err.to_string().starts_with("1-0:1.7.0: "));
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let records = records(&[(obis::TIMESTAMP, &["210315120000X"])]);
        let err = Reading::from_records(&records, &TimezonePolicy::default()).unwrap_err();
        assert!(matches!(err, ReadingError::Timestamp { .. }));
    }

    #[test]
    fn gas_record_needs_two_values() {
        let records = records(&[(obis::GAS_DELIVERED, &["12785.123*m3"])]);
        let err = Reading::from_records(&records, &TimezonePolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadingError::MissingValue {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn equipment_id_falls_back_to_raw() {
        assert_eq!(decode_equipment_id("XYZ"), "XYZ");
        assert_eq!(decode_equipment_id(""), "");
        assert_eq!(decode_equipment_id("4142"), "AB");
    }

    #[test]
    fn serializes_to_json() {
        let records = records(&[(obis::POWER_DELIVERED, &["0.5*kW"])]);
        let reading = Reading::from_records(&records, &TimezonePolicy::default()).unwrap();
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["power_delivered"]["unit"], "W");
        assert_eq!(json["power_delivered"]["value"], 500.0);
        assert!(json["timestamp"].is_null());
    }
}
