use crate::config::DetectorConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use wall_panelizer::DetectionMode;

/// Where the detector writes its walls: `<image>.csv`
pub fn detection_output_path(image: &Path) -> PathBuf {
    let mut name = image.as_os_str().to_os_string();
    name.push(".csv");
    PathBuf::from(name)
}

/// `[script] --image <image> --output <output> [--corner True]`
pub fn detector_args(
    config: &DetectorConfig,
    image: &Path,
    output: &Path,
    mode: DetectionMode,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if let Some(script) = &config.script {
        args.push(script.into());
    }
    args.push("--image".into());
    args.push(image.into());
    args.push("--output".into());
    args.push(output.into());
    if mode == DetectionMode::CornerSelection {
        args.push("--corner".into());
        args.push("True".into());
    }
    args
}

/// Run the external detector. Failures are not fatal: ingestion proceeds
/// on whatever the detector managed to write. Returns whether it succeeded.
pub fn run_detector(
    config: &DetectorConfig,
    image: &Path,
    output: &Path,
    mode: DetectionMode,
) -> bool {
    let args = detector_args(config, image, output, mode);
    info!("Running wall detector: {} {:?}", config.program, args);

    let output = match Command::new(&config.program).args(&args).output() {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to spawn wall detector {}: {}", config.program, e);
            return false;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("Wall detector exited with {}: {}", output.status, stderr.trim());
        return false;
    }

    info!("Wall detector finished");
    true
}
