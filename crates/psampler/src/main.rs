//! psampler - per-process CPU and memory sampler.
//!
//! Samples every live process at a fixed interval and appends one CSV row
//! per process to a file in the chosen directory, until Ctrl-C or the
//! optional duration elapses.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use psampler_core::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use psampler_core::collector::mock::MockFs;
use psampler_core::collector::ProcfsSource;
use psampler_core::preferences::Preferences;
use psampler_core::sampler::{
    Controller, DEFAULT_FILENAME, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
    SamplerConfig, Status, parse_interval,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-process CPU and memory sampler.
#[derive(Parser, Debug)]
#[command(name = "psampler", about = "Per-process CPU and memory sampler", version)]
struct Args {
    /// Sampling interval in seconds (1-60).
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_INTERVAL_SECS,
        value_parser = parse_interval_arg
    )]
    interval: u64,

    /// Name of the CSV file inside the location directory.
    #[arg(short, long, default_value = DEFAULT_FILENAME)]
    filename: String,

    /// Directory for the CSV file. Defaults to the last location used.
    #[arg(short, long)]
    location: Option<PathBuf>,

    /// Create the location directory if it does not exist.
    #[arg(long)]
    create: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// CPU measurement window per process, in milliseconds.
    #[arg(long, default_value = "100")]
    cpu_window_ms: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_interval_arg(s: &str) -> Result<u64, String> {
    let secs = parse_interval(s).map_err(|e| e.to_string())?;
    if secs > MAX_INTERVAL_SECS {
        return Err(format!(
            "interval must be between {} and {} seconds",
            MIN_INTERVAL_SECS, MAX_INTERVAL_SECS
        ));
    }
    Ok(secs)
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["psampler", "psampler_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let preferences = Preferences::open_default();
    let location = args
        .location
        .clone()
        .unwrap_or_else(|| preferences.last_location_or(Preferences::fallback_location()));

    info!("psampler {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, location={}, file={}, proc={}",
        args.interval,
        location.display(),
        args.filename,
        args.proc_path
    );

    if args.create && !location.is_dir() {
        if let Err(e) = std::fs::create_dir_all(&location) {
            error!("Failed to create {}: {}", location.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Created {}", location.display());
    }

    #[cfg(target_os = "linux")]
    let source = ProcfsSource::new(RealFs::new(), &args.proc_path);
    #[cfg(not(target_os = "linux"))]
    let source = {
        warn!("/proc is not available on this platform; every tick will report an error");
        ProcfsSource::new(MockFs::new(), &args.proc_path)
    };

    let config = SamplerConfig::new(args.interval, args.filename.clone(), location.clone())
        .with_cpu_window(Duration::from_millis(args.cpu_window_ms));

    let mut controller = Controller::new(source);
    if let Err(e) = controller.start(config) {
        error!("Cannot start collection: {}", e);
        return ExitCode::FAILURE;
    }

    match preferences.set_last_location(&location) {
        Ok(()) => debug!("Saved location to {}", preferences.path().display()),
        Err(e) => warn!("Failed to save location preference: {}", e),
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut last_status = controller.status();
    info!("Status: {}", last_status);

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Duration elapsed");
            break;
        }

        let status = controller.status();
        if status != last_status {
            match &status {
                Status::Error(_) => warn!("Status: {}", status),
                _ => info!("Status: {}", status),
            }
            last_status = status;
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    info!("Shutting down...");
    controller.stop();
    info!(
        "Status: {} ({} ticks, {} rows collected)",
        controller.status(),
        controller.ticks(),
        controller.history_len()
    );

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_arg_bounds() {
        assert_eq!(parse_interval_arg("1"), Ok(1));
        assert_eq!(parse_interval_arg("60"), Ok(60));
        assert!(parse_interval_arg("0").is_err());
        assert!(parse_interval_arg("61").is_err());
        assert!(parse_interval_arg("soon").is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["psampler"]).unwrap();
        assert_eq!(args.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(args.filename, "process_data.csv");
        assert_eq!(args.location, None);
        assert_eq!(args.proc_path, "/proc");
        assert_eq!(args.cpu_window_ms, 100);
        assert!(!args.create);
        assert!(args.duration.is_none());
    }

    #[test]
    fn test_args_explicit() {
        let args = Args::try_parse_from([
            "psampler", "-i", "1", "-f", "p.csv", "-l", "/tmp/logs", "--duration", "3", "-vv",
        ])
        .unwrap();
        assert_eq!(args.interval, 1);
        assert_eq!(args.filename, "p.csv");
        assert_eq!(args.location, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(args.duration, Some(3));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_reject_out_of_range_interval() {
        assert!(Args::try_parse_from(["psampler", "-i", "0"]).is_err());
        assert!(Args::try_parse_from(["psampler", "-i", "120"]).is_err());
    }
}
