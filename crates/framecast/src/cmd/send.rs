use std::fs;
use std::time::Duration;

use framecast_frame::{FrameConfig, FrameWriter};
use framecast_transport::{TcpConnection, TransportError};
use tracing::{debug, warn};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_send_summary, OutputFormat, SendSummary};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let config = FrameConfig {
        write_timeout: write_timeout(&args.timeout)?,
        ..FrameConfig::default()
    };
    let payloads = resolve_payloads(&args, config.max_payload_size)?;

    let conn = connect_with_retries(&args.addr, args.connect_retries, CONNECT_RETRY_PAUSE)
        .map_err(|err| transport_error("connect failed", err))?;
    let peer = conn
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| args.addr.clone());
    let mut writer = FrameWriter::with_config_tcp(conn, config)
        .map_err(|err| frame_error("connect failed", err))?;

    let mut summary = SendSummary {
        frames_sent: 0,
        bytes_sent: 0,
        peer,
    };
    let total = payloads.len() as u64 * u64::from(args.repeat);

    for _ in 0..args.repeat {
        for payload in &payloads {
            writer
                .send(payload)
                .map_err(|err| frame_error("send failed", err))?;
            summary.frames_sent += 1;
            summary.bytes_sent += payload.len() as u64;
            debug!(len = payload.len(), sent = summary.frames_sent, "frame sent");

            if summary.frames_sent < total {
                std::thread::sleep(interval);
            }
        }
    }

    writer.into_inner().close();
    print_send_summary(&summary, format);
    Ok(SUCCESS)
}

const CONNECT_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// `0` disables the timeout; sockets reject a zero duration.
fn write_timeout(input: &str) -> CliResult<Option<Duration>> {
    let timeout = parse_duration(input)?;
    Ok((!timeout.is_zero()).then_some(timeout))
}

fn connect_with_retries(
    addr: &str,
    retries: u32,
    pause: Duration,
) -> Result<TcpConnection, TransportError> {
    let mut attempt = 0;
    loop {
        match framecast_transport::connect(addr) {
            Ok(conn) => return Ok(conn),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!(error = %err, attempt, retries, "receiver not reachable, retrying");
                std::thread::sleep(pause);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Load every payload up front so a bad file fails before anything is sent.
fn resolve_payloads(args: &SendArgs, max_payload: usize) -> CliResult<Vec<Vec<u8>>> {
    let payloads = match &args.data {
        Some(data) => vec![data.as_bytes().to_vec()],
        None => args
            .files
            .iter()
            .map(|path| {
                fs::read(path)
                    .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))
            })
            .collect::<CliResult<Vec<_>>>()?,
    };

    for (index, payload) in payloads.iter().enumerate() {
        if payload.is_empty() || payload.len() > max_payload {
            return Err(CliError::new(
                DATA_INVALID,
                format!(
                    "payload {} is {} bytes; frames must be 1..={max_payload} bytes",
                    index + 1,
                    payload.len()
                ),
            ));
        }
    }

    Ok(payloads)
}
