use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dsmrp1_telegram::{TimezonePolicy, Zone, DEFAULT_MAX_TELEGRAM_SIZE};
use dsmrp1_transport::{SerialConfig, DEFAULT_TELEGRAM_INTERVAL};
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

const ENV_VARS: [&str; 3] = ["DSMRP1_DEVICE", "DSMRP1_BAUD", "DSMRP1_LOG_LEVEL"];

/// Line settings `read` would open the device with.
#[derive(Serialize)]
struct SerialInfo {
    device: String,
    baud_rate: u32,
    data_bits: u8,
    parity: String,
    stop_bits: u8,
    timeout_ms: u128,
}

impl From<&SerialConfig> for SerialInfo {
    fn from(config: &SerialConfig) -> Self {
        Self {
            device: config.device.clone(),
            baud_rate: config.baud_rate,
            data_bits: config.data_bits.count(),
            parity: config.parity.to_string(),
            stop_bits: config.stop_bits.count(),
            timeout_ms: config.timeout.as_millis(),
        }
    }
}

#[derive(Serialize)]
struct DecoderInfo {
    max_telegram_size: usize,
    replay_interval_ms: u128,
    summer_zone: String,
    winter_zone: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: &'static str,
    target: &'static str,
    serial_support: bool,
    serial: SerialInfo,
    defaults: SerialInfo,
    decoder: DecoderInfo,
    environment: BTreeMap<&'static str, Option<String>>,
}

pub fn run(args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let policy = TimezonePolicy::default();
    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION"),
        target: env!("DSMRP1_BUILD_TARGET"),
        serial_support: cfg!(feature = "serial"),
        serial: SerialInfo::from(&args.serial.to_config()),
        defaults: SerialInfo::from(&SerialConfig::default()),
        decoder: DecoderInfo {
            max_telegram_size: DEFAULT_MAX_TELEGRAM_SIZE,
            replay_interval_ms: DEFAULT_TELEGRAM_INTERVAL.as_millis(),
            summer_zone: zone_text(&policy.summer),
            winter_zone: zone_text(&policy.winter),
        },
        environment: ENV_VARS
            .iter()
            .map(|&var| (var, std::env::var(var).ok()))
            .collect(),
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn zone_text(zone: &Zone) -> String {
    format!("{} ({})", zone.designation, zone.offset)
}

fn serial_text(info: &SerialInfo) -> String {
    format!(
        "{} @ {} {}{}{}",
        info.device,
        info.baud_rate,
        info.data_bits,
        info.parity.chars().next().unwrap_or('n').to_ascii_uppercase(),
        info.stop_bits
    )
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SETTING", "VALUE"]);
            for (setting, value) in rows(output) {
                table.add_row(vec![setting, value]);
            }
            println!("{table}");
        }
        OutputFormat::Raw => println!("{}", output.serial.device),
    }
}

fn rows(output: &EnvInfoOutput) -> Vec<(String, String)> {
    let mut rows = vec![
        ("version".to_string(), output.version.to_string()),
        ("target".to_string(), output.target.to_string()),
        ("serial support".to_string(), output.serial_support.to_string()),
        ("serial".to_string(), serial_text(&output.serial)),
        ("serial default".to_string(), serial_text(&output.defaults)),
        (
            "read timeout".to_string(),
            format!("{} ms", output.serial.timeout_ms),
        ),
        (
            "max telegram".to_string(),
            format!("{} bytes", output.decoder.max_telegram_size),
        ),
        ("summer time".to_string(), output.decoder.summer_zone.clone()),
        ("winter time".to_string(), output.decoder.winter_zone.clone()),
    ];
    for (var, value) in &output.environment {
        rows.push((
            var.to_string(),
            value.clone().unwrap_or_else(|| "(not set)".to_string()),
        ));
    }
    rows
}
