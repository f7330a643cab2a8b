//! Progress reporting for long-running loops

use indicatif::{ProgressBar, ProgressStyle};

/// Returns a progress bar counting up to `len`, styled for the renderer's output.
pub fn get_progressbar(len: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{prefix:>12.cyan.bold} [{bar:40}] {pos}/{len} ({elapsed_precise}, eta {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");

    ProgressBar::new(len).with_style(style)
}
