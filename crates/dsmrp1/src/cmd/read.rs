use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use dsmrp1_telegram::{
    poll_with_config, PollConfig, Poller, Reading, ReaderConfig, Records, Telegram,
    TimezonePolicy,
};
use dsmrp1_transport::{RateLimited, Source};
use tracing::{info, warn};

use crate::cmd::ReadArgs;
use crate::exit::{
    frame_error, reading_error, structure_error, transport_error, CliError, CliResult, SUCCESS,
    USAGE,
};
use crate::output::{print_telegram, OutputFormat};

/// How often the consumer loop checks for Ctrl-C while waiting.
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = args.ratelimit.as_deref().map(parse_duration).transpose()?;
    let source = open_source(&args)?;
    info!(source = source.kind(), "reading telegrams");

    let config = PollConfig {
        reader: ReaderConfig {
            max_telegram_size: args.max_telegram_size,
            ..ReaderConfig::default()
        },
        ..PollConfig::default()
    };
    let poller = match interval {
        Some(interval) => poll_with_config(RateLimited::new(source, interval), config),
        None => poll_with_config(source, config),
    }
    .map_err(|err| frame_error("failed to start poller", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    consume(poller, &args, format, &running)
}

fn consume(
    poller: Poller,
    args: &ReadArgs,
    format: OutputFormat,
    running: &AtomicBool,
) -> CliResult<i32> {
    let policy = TimezonePolicy::default();
    let mut printed = 0usize;
    let mut last_error = None;

    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }

        let telegram = match poller.recv_timeout(SHUTDOWN_CHECK_INTERVAL) {
            Ok(telegram) => telegram,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                let stats = poller
                    .finish()
                    .map_err(|err| frame_error("reading telegrams failed", err))?;
                info!(
                    telegrams = stats.telegrams,
                    checksum_mismatches = stats.checksum_mismatches,
                    framing_errors = stats.framing_errors,
                    "end of stream"
                );
                return match last_error {
                    Some(err) if printed == 0 => Err(err),
                    _ => Ok(SUCCESS),
                };
            }
        };

        match decode(&telegram, &policy, args.records) {
            Ok((identifier, reading, records)) => {
                print_telegram(&telegram, &identifier, &reading, records.as_ref(), format);
                printed = printed.saturating_add(1);
            }
            Err(err) => {
                warn!(error = %err, "skipping telegram");
                last_error = Some(err);
            }
        }
    }

    info!(printed, "interrupted");
    Ok(SUCCESS)
}

fn decode(
    telegram: &Telegram,
    policy: &TimezonePolicy,
    keep_records: bool,
) -> CliResult<(String, Reading, Option<Records>)> {
    let identifier = telegram
        .identifier()
        .map_err(|err| structure_error("invalid telegram header", err))?
        .to_string();
    let records = telegram
        .parse()
        .map_err(|err| structure_error("invalid telegram body", err))?;
    let reading = Reading::from_records(&records, policy)
        .map_err(|err| reading_error("invalid telegram value", err))?;

    Ok((identifier, reading, keep_records.then_some(records)))
}

fn open_source(args: &ReadArgs) -> CliResult<Source> {
    if let Some(path) = &args.testfile {
        return Source::open_file(path)
            .map_err(|err| transport_error("failed to open test file", err));
    }
    if args.stdin {
        return Ok(Source::stdin());
    }

    Source::open_serial(&args.serial.to_config()).map_err(|err| transport_error("failed to open device", err))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(body: &str) -> Vec<u8> {
        let crc = dsmrp1_telegram::checksum(body.as_bytes());
        let mut wire = body.as_bytes().to_vec();
        wire.extend_from_slice(dsmrp1_telegram::format_checksum(crc).as_bytes());
        wire.extend_from_slice(b"\r\n");
        wire
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn decode_extracts_identifier_and_reading() {
        let wire = framed("/ISk5\\2MT382-1000\r\n\r\n0-0:1.0.0(101209113020W)\r\n1-0:1.7.0(01.193*kW)\r\n!");
        let telegram = Telegram::from_wire(&wire).unwrap();

        let (identifier, reading, records) =
            decode(&telegram, &TimezonePolicy::default(), false).unwrap();
        assert_eq!(identifier, "\\2MT382-1000");
        assert_eq!(reading.power_delivered.unwrap().unit, "W");
        assert!(records.is_none());

        let (_, _, records) = decode(&telegram, &TimezonePolicy::default(), true).unwrap();
        assert_eq!(records.unwrap().len(), 2);
    }

    #[test]
    fn decode_reports_bad_value_as_data_invalid() {
        let wire = framed("/ISk5\\2MT382-1000\r\n\r\n1-0:1.7.0(garbage)\r\n!");
        let telegram = Telegram::from_wire(&wire).unwrap();

        let err = decode(&telegram, &TimezonePolicy::default(), false).unwrap_err();
        assert_eq!(err.code, crate::exit::DATA_INVALID);
        assert!(err.message.contains("1-0:1.7.0"));
    }
}
