use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

static HOOK_ONCE: Once = Once::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Diagnostics for one process. The log file, when enabled, receives every
/// `tracing` event at `RUST_LOG` level (default `info`) and panic reports.
pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    pub fn initialize(enabled: bool) -> Result<Self> {
        install_panic_hook();
        if !enabled {
            return Ok(Self { path: None });
        }

        let path = create_diagnostics_log_path()?;
        let file = open_log(&path)?;
        install_subscriber(file)?;
        let _ = LOG_PATH.set(path.clone());

        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

fn open_log(path: &Path) -> Result<File> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;

    writeln!(
        file,
        "stocktake diagnostics start\nversion={}\nstart_epoch_ms={}\npid={}\nargv={:?}",
        env!("CARGO_PKG_VERSION"),
        epoch_ms(),
        std::process::id(),
        std::env::args().collect::<Vec<String>>()
    )
    .and_then(|()| file.flush())
    .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;

    Ok(file)
}

fn install_subscriber(file: File) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|error| anyhow!("failed to install diagnostics logger: {error}"))
}

fn install_panic_hook() {
    HOOK_ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|panic_info| {
            let location = panic_info
                .location()
                .map(|value| format!("{}:{}:{}", value.file(), value.line(), value.column()))
                .unwrap_or_else(|| "unknown".to_string());

            // Without a subscriber this event goes nowhere.
            tracing::error!(
                message = %panic_payload(panic_info),
                location = %location,
                backtrace = %Backtrace::force_capture(),
                "panic captured"
            );

            eprintln!("Fatal internal error in stocktake.");
            match LOG_PATH.get() {
                Some(path) => eprintln!("Diagnostics written to {}", path.display()),
                None => eprintln!("Run `stocktake --diagnostics` to capture a diagnostics log."),
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

fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn create_diagnostics_log_path() -> Result<PathBuf> {
    let diagnostics_dir = stocktake_core::config::resolve_config_dir()
        .context("failed to resolve stocktake config directory for diagnostics")?
        .join("diagnostics");
    fs::create_dir_all(&diagnostics_dir).with_context(|| {
        format!(
            "failed to create diagnostics directory {}",
            diagnostics_dir.display()
        )
    })?;

    Ok(diagnostics_dir.join(format!("{}.log", epoch_ms())))
}
