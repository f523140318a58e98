use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use framecast_frame::Frame;
use framecast_ingest::{tick, DisplayConfig, FrameReceiver, IngestConfig, PresentError, Presenter};
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{ingest_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let tick_interval = parse_duration(&args.tick)?;
    let config = IngestConfig::default().with_bind_addr(SocketAddr::new(args.bind, args.port));
    let display = DisplayConfig {
        width: args.width,
        height: args.height,
    };

    let receiver =
        FrameReceiver::start(config).map_err(|err| ingest_error("bind failed", err))?;
    info!(addr = %receiver.local_addr(), "receiver started");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut presenter = FramePresenter::new(format, display, args.save);
    let mut presented = 0u64;

    while running.load(Ordering::SeqCst) {
        if tick(receiver.channel(), &mut presenter) {
            presented = presented.saturating_add(1);
            if args.count.is_some_and(|count| presented >= count) {
                break;
            }
        }
        std::thread::sleep(tick_interval);
    }

    let stats = receiver
        .shutdown()
        .map_err(|err| ingest_error("shutdown failed", err))?;
    if args.count.is_none() {
        print_stats(&stats, format);
    }

    Ok(SUCCESS)
}

/// Prints a line per frame and optionally mirrors the latest frame to disk.
struct FramePresenter {
    format: OutputFormat,
    display: DisplayConfig,
    save: Option<PathBuf>,
    sequence: u64,
}

impl FramePresenter {
    fn new(format: OutputFormat, display: DisplayConfig, save: Option<PathBuf>) -> Self {
        Self {
            format,
            display,
            save,
            sequence: 0,
        }
    }
}

impl Presenter for FramePresenter {
    fn decode_and_present(&mut self, frame: &Frame) -> Result<(), PresentError> {
        self.sequence += 1;
        print_frame(frame, self.sequence, self.display, self.format);
        if let Some(path) = &self.save {
            replace_file(path, frame.payload.as_ref())?;
        }
        Ok(())
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers never
/// see a half-written image.
fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_file_overwrites_and_leaves_no_temp() {
        let dir = std::env::temp_dir().join(format!(
            "framecast-save-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("latest.jpg");

        replace_file(&path, b"first").unwrap();
        replace_file(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.join("latest.jpg.part").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn presenter_reports_save_failures() {
        let mut presenter = FramePresenter::new(
            OutputFormat::Raw,
            DisplayConfig::default(),
            Some(PathBuf::from("/nonexistent-framecast-dir/latest.jpg")),
        );
        let frame = Frame::new(&b"x"[..]);
        assert!(presenter.decode_and_present(&frame).is_err());
        assert_eq!(presenter.sequence, 1);
    }
}
