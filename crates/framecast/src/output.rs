use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framecast_frame::Frame;
use framecast_ingest::{DisplayConfig, IngestStats};
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
struct FrameOutput<'a> {
    sequence: u64,
    payload_size: usize,
    image_format: &'a str,
    expected_width: u32,
    expected_height: u32,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, sequence: u64, display: DisplayConfig, format: OutputFormat) {
    let image_format = sniff_image_format(frame.payload.as_ref());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                sequence,
                payload_size: frame.len(),
                image_format,
                expected_width: display.width,
                expected_height: display.height,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "SIZE", "FORMAT", "SURFACE"])
                .add_row(vec![
                    sequence.to_string(),
                    frame.len().to_string(),
                    image_format.to_string(),
                    format!("{}x{}", display.width, display.height),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame #{sequence} size={} format={image_format} surface={}x{}",
                frame.len(),
                display.width,
                display.height
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

pub fn print_stats(stats: &IngestStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(stats),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"])
                .add_row(vec![
                    "connections_accepted".to_string(),
                    stats.connections_accepted.to_string(),
                ])
                .add_row(vec![
                    "connections_dropped".to_string(),
                    stats.connections_dropped.to_string(),
                ])
                .add_row(vec![
                    "frames_published".to_string(),
                    stats.frames_published.to_string(),
                ])
                .add_row(vec![
                    "frames_overwritten".to_string(),
                    stats.frames_overwritten.to_string(),
                ])
                .add_row(vec![
                    "frames_rejected".to_string(),
                    stats.frames_rejected.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "accepted={} dropped={} published={} overwritten={} rejected={}",
                stats.connections_accepted,
                stats.connections_dropped,
                stats.frames_published,
                stats.frames_overwritten,
                stats.frames_rejected
            );
        }
        // Raw output is reserved for frame bytes.
        OutputFormat::Raw => {}
    }
}

#[derive(Serialize)]
pub struct SendSummary {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub peer: String,
}

pub fn print_send_summary(summary: &SendSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "FRAMES", "BYTES"])
                .add_row(vec![
                    summary.peer.clone(),
                    summary.frames_sent.to_string(),
                    summary.bytes_sent.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} frames ({} bytes) to {}",
                summary.frames_sent, summary.bytes_sent, summary.peer
            );
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Best-effort guess at the image container from its leading bytes.
pub fn sniff_image_format(payload: &[u8]) -> &'static str {
    match payload {
        [0xFF, 0xD8, 0xFF, ..] => "jpeg",
        [0x89, b'P', b'N', b'G', ..] => "png",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'B', b'M', ..] => "bmp",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "unknown",
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
