use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, Once, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const DIAGNOSTICS_FILTER: &str = "debug";

/// Where log events go when `--diagnostics` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// The terminal dialog owns the screen.
    Discard,
}

static HOOK_ONCE: Once = Once::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    pub fn initialize(enabled: bool, sink: LogSink) -> Result<Self> {
        install_panic_hook();

        if !enabled {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
            let builder = tracing_subscriber::fmt().with_env_filter(filter);
            let installed = match sink {
                LogSink::Stderr => builder.with_writer(std::io::stderr).try_init(),
                LogSink::Discard => builder.with_writer(std::io::sink).try_init(),
            };
            installed.map_err(|error| anyhow!("failed to install logger: {error}"))?;
            return Ok(Self { path: None });
        }

        let path = create_diagnostics_log_path()?;
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;
        write_header(&mut file)
            .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(DIAGNOSTICS_FILTER))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|error| anyhow!("failed to install diagnostics logger: {error}"))?;

        let _ = LOG_PATH.set(path.clone());
        info!(path = %path.display(), "diagnostics enabled");

        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn record_failure(&self, failure: &anyhow::Error) {
        if self.path.is_some() {
            error!("{failure:#}");
        }
    }
}

fn write_header(file: &mut File) -> std::io::Result<()> {
    writeln!(
        file,
        "trackrepo diagnostics start\nversion={}\nstart_epoch_ms={}\npid={}",
        env!("CARGO_PKG_VERSION"),
        epoch_millis(),
        std::process::id()
    )?;
    writeln!(file, "argv={:?}", std::env::args().collect::<Vec<String>>())?;
    file.flush()
}

fn install_panic_hook() {
    HOOK_ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|panic_info| {
            let location = panic_info
                .location()
                .map(|value| format!("{}:{}:{}", value.file(), value.line(), value.column()))
                .unwrap_or_else(|| "unknown".to_string());
            error!(
                payload = %panic_payload(panic_info),
                %location,
                backtrace = %std::backtrace::Backtrace::force_capture(),
                "panic captured"
            );

            eprintln!("Fatal internal error in trackrepo.");
            match LOG_PATH.get() {
                Some(path) => eprintln!("Diagnostics written to {}", path.display()),
                None => eprintln!("Run `trackrepo --diagnostics` to capture a diagnostics log."),
            }
        }));
    });
}

fn panic_payload(panic_info: &std::panic::PanicHookInfo<'_>) -> String {
    if let Some(payload) = panic_info.payload().downcast_ref::<&str>() {
        return (*payload).to_string();
    }
    if let Some(payload) = panic_info.payload().downcast_ref::<String>() {
        return payload.clone();
    }
    "unknown panic payload".to_string()
}

fn create_diagnostics_log_path() -> Result<PathBuf> {
    let config_dir = trackrepo_core::config::resolve_config_dir()
        .context("failed to resolve trackrepo config directory for diagnostics")?;

    let diagnostics_dir = config_dir.join("diagnostics");
    fs::create_dir_all(&diagnostics_dir).with_context(|| {
        format!(
            "failed to create diagnostics directory {}",
            diagnostics_dir.display()
        )
    })?;

    Ok(diagnostics_dir.join(format!("{}.log", epoch_millis())))
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
