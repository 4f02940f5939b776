use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dsmrp1_telegram::{format_checksum, Quantity, Reading, Records, Telegram};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TelegramOutput<'a> {
    identifier: &'a str,
    checksum: String,
    size: usize,
    reading: &'a Reading,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a Records>,
}

/// Print one decoded telegram. `records` is included when the caller asked
/// for the full record list.
pub fn print_telegram(
    telegram: &Telegram,
    identifier: &str,
    reading: &Reading,
    records: Option<&Records>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = TelegramOutput {
                identifier,
                checksum: format_checksum(telegram.checksum()),
                size: telegram.len(),
                reading,
                records,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            match records {
                Some(records) => {
                    table.set_header(vec!["CODE", "VALUES"]);
                    for (code, values) in records {
                        table.add_row(vec![code.clone(), values.join(" | ")]);
                    }
                }
                None => {
                    table.set_header(vec!["FIELD", "VALUE"]);
                    table.add_row(vec!["meter".to_string(), identifier.to_string()]);
                    for (field, value) in reading_rows(reading) {
                        table.add_row(vec![field.to_string(), value]);
                    }
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}  delivered={}  received={}",
                reading
                    .timestamp
                    .map(|ts| ts.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
                quantity_text(reading.power_delivered.as_ref()),
                quantity_text(reading.power_received.as_ref()),
            );
            if let Some(records) = records {
                for (code, values) in records {
                    println!("  {code:<14} {}", values.join(" "));
                }
            }
        }
        OutputFormat::Raw => {
            print_raw(telegram.as_bytes());
            print_raw(b"\r\n");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn reading_rows(reading: &Reading) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(ts) = reading.timestamp {
        rows.push(("timestamp", ts.to_rfc3339()));
    }
    if let Some(id) = &reading.equipment_id {
        rows.push(("equipment", id.clone()));
    }
    if let Some(tariff) = &reading.tariff {
        rows.push(("tariff", tariff.clone()));
    }
    let quantities = [
        ("delivered t1", &reading.energy_delivered_tariff1),
        ("delivered t2", &reading.energy_delivered_tariff2),
        ("received t1", &reading.energy_received_tariff1),
        ("received t2", &reading.energy_received_tariff2),
        ("power delivered", &reading.power_delivered),
        ("power received", &reading.power_received),
    ];
    for (field, quantity) in quantities {
        if let Some(q) = quantity {
            rows.push((field, quantity_text(Some(q))));
        }
    }
    if let Some(gas) = &reading.gas_delivered {
        rows.push((
            "gas",
            format!(
                "{} at {}",
                quantity_text(Some(&gas.quantity)),
                gas.captured_at.to_rfc3339()
            ),
        ));
    }
    rows
}

fn quantity_text(quantity: Option<&Quantity>) -> String {
    match quantity {
        Some(q) => format!("{} {}", q.value, q.unit),
        None => "-".to_string(),
    }
}
