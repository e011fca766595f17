//! Capture command implementation

use super::with_spinner;
use crate::bridges::AnyBridge;
use crate::iq_file;
use std::path::Path;

/// Run the capture command
pub fn run_capture(
    bridge: &mut AnyBridge,
    samples: usize,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let settle = bridge.timing().capture_settle(samples);
    log::debug!("Capture of {} samples settles for {:?}", samples, settle);

    let message = format!("Capturing {} samples", samples);
    let data = with_spinner(&message, || bridge.read_capture(samples))?;

    iq_file::write_capture_file(output, &data)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
    println!("Wrote {} samples to {}", data.len(), output.display());
    Ok(())
}
