//! Print hand-off through a short-lived render surface.
//!
//! The rendered document is written to a temporary file, given time for its
//! avatar images to load, handed to the print command, and removed after a
//! further delay. Removal happens on every exit path, including a failed
//! trigger or a dropped future.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ExportError;

/// Timing and command for print hand-off
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Wait after rendering before print is triggered
    pub load_delay: Duration,
    /// Wait after the trigger before the surface is released
    pub cleanup_delay: Duration,
    /// Program that receives the document path as its last argument
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        let (command, args) = default_print_command();
        Self {
            load_delay: Duration::from_millis(800),
            cleanup_delay: Duration::from_millis(5000),
            command: command.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// Program and leading arguments that open a document with its default handler
///
/// On Windows `start` goes through `cmd`, since `explorer.exe` exits with 1 even
/// when it succeeds. The empty argument is the window title `start` expects.
fn default_print_command() -> (&'static str, &'static [&'static str]) {
    const WINDOWS_ARGS: &[&str] = &["/C", "start", ""];
    const NO_ARGS: &[&str] = &[];

    if cfg!(target_os = "macos") {
        ("open", NO_ARGS)
    } else if cfg!(target_os = "windows") {
        ("cmd", WINDOWS_ARGS)
    } else {
        ("xdg-open", NO_ARGS)
    }
}

/// Something that can start printing a rendered document
#[async_trait]
pub trait PrintTrigger: Send + Sync {
    async fn trigger(&self, document: &Path) -> Result<(), ExportError>;
}

/// Runs an external program on the document
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    program: String,
    args: Vec<String>,
}

impl CommandTrigger {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &PrintConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl PrintTrigger for CommandTrigger {
    async fn trigger(&self, document: &Path) -> Result<(), ExportError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(document)
            .status()
            .await
            .map_err(|e| ExportError::PrintTrigger(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(ExportError::PrintTrigger(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// Offscreen copy of a rendered document, deleted when dropped
#[derive(Debug)]
pub struct RenderSurface {
    file: NamedTempFile,
}

impl RenderSurface {
    pub fn create(html: &str) -> Result<Self, ExportError> {
        let mut file = tempfile::Builder::new()
            .prefix("roundtable-print-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;
        debug!("Render surface created at {:?}", file.path());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the surface now, reporting any failure
    pub fn release(self) -> Result<(), ExportError> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        debug!("Render surface {:?} released", path);
        Ok(())
    }
}

/// Outcome of a completed print hand-off
#[derive(Debug, Clone)]
pub struct PrintReport {
    /// Where the surface lived while printing
    pub surface_path: PathBuf,
}

/// Render surface → wait → trigger → wait → release
pub async fn print_document<T>(
    html: &str,
    trigger: &T,
    config: &PrintConfig,
) -> Result<PrintReport, ExportError>
where
    T: PrintTrigger + ?Sized,
{
    let surface = RenderSurface::create(html)?;
    let surface_path = surface.path().to_path_buf();

    tokio::time::sleep(config.load_delay).await;
    let triggered = trigger.trigger(surface.path()).await;
    match &triggered {
        Ok(()) => info!("Print triggered for {:?}", surface_path),
        Err(e) => warn!("Print trigger failed: {}", e),
    }

    tokio::time::sleep(config.cleanup_delay).await;
    let released = surface.release();

    triggered?;
    released?;
    Ok(PrintReport { surface_path })
}
