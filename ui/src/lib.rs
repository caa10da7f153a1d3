//! This crate collects elements that are shared between the two CLI
//! programs data-to-pics and simulate.

#[cfg(feature = "visualization")]
use colorous::Gradient;
#[cfg(feature = "visualization")]
use data::Precision;
#[cfg(feature = "tui")]
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
#[cfg(feature = "tui")]
use std::time::Duration;

/// Set up logging to stderr, at `info` level unless overridden by `RUST_LOG`
#[cfg(feature = "tui")]
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::debug!("Logger initialized");
}

/// Set up a progress bar for a task with `len` steps
#[cfg(feature = "tui")]
pub fn init_progress_reporting(
    message: &'static str,
    len: usize,
) -> Result<ProgressBar, indicatif::style::TemplateError> {
    let progress = ProgressBar::new(len as u64)
        .with_message(message)
        .with_style(ProgressStyle::with_template(
            "{msg} {pos}/{len} {wide_bar} {elapsed}/~{duration}",
        )?)
        .with_finish(ProgressFinish::AndClear);
    progress.enable_steady_tick(Duration::from_millis(100));
    Ok(progress)
}

/// Color gradient used by heat map visualizations
#[cfg(feature = "visualization")]
pub const GRADIENT: Gradient = colorous::INFERNO;

/// Temperature that maps to the hot end of [`GRADIENT`]
///
/// This is the temperature of the leading edge, which no point of the domain
/// ever exceeds.
#[cfg(feature = "visualization")]
pub const MAX_AMPLITUDE: Precision = 1.0;

/// Amplitude scale factor associated with MAX_AMPLITUDE
#[cfg(feature = "visualization")]
pub const AMPLITUDE_SCALE: Precision = 1.0 / MAX_AMPLITUDE;

/// Map a temperature to an RGB color, clamping it to the gradient's range
#[cfg(feature = "visualization")]
pub fn heat_color(value: Precision) -> [u8; 3] {
    let color = GRADIENT.eval_continuous((AMPLITUDE_SCALE * value).clamp(0.0, 1.0));
    [color.r, color.g, color.b]
}

#[cfg(all(test, feature = "visualization"))]
mod tests {
    use super::*;

    #[test]
    fn heat_color_clamps() {
        assert_eq!(heat_color(-1.0), heat_color(0.0));
        assert_eq!(heat_color(2.0), heat_color(MAX_AMPLITUDE));
        assert_ne!(heat_color(0.0), heat_color(MAX_AMPLITUDE));
    }

    #[test]
    fn heat_color_ends() {
        let cold = GRADIENT.eval_continuous(0.0);
        let hot = GRADIENT.eval_continuous(1.0);
        assert_eq!(heat_color(0.0), [cold.r, cold.g, cold.b]);
        assert_eq!(heat_color(1.0), [hot.r, hot.g, hot.b]);
    }
}
