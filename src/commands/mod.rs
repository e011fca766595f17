//! CLI command implementations
//!
//! Each command works on an [`AnyBridge`](crate::bridges::AnyBridge), so
//! the same code drives a serial link or the in-memory emulator.

mod capture;
mod dpd;
mod list;
mod register;
mod waveform;

pub use capture::run_capture;
pub use dpd::{run_dpd_lut_read, run_dpd_lut_write, run_dpd_read, run_dpd_write};
pub use list::{list_bridges, list_ports};
pub use register::{run_read, run_write};
pub use waveform::{run_download, run_select_file};

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run a blocking bridge operation behind a spinner
///
/// Bulk transfers spend most of their time in settle waits, so a spinner
/// is all the progress there is to show.
fn with_spinner<T, E>(
    message: &str,
    op: impl FnOnce() -> Result<T, E>,
) -> Result<T, Box<dyn std::error::Error>>
where
    E: std::error::Error + 'static,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = op();
    match &result {
        Ok(_) => pb.finish_with_message(format!("{} done", message)),
        Err(_) => pb.abandon_with_message(format!("{} failed", message)),
    }
    Ok(result?)
}
