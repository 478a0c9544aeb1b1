use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Returns a progress bar counting finished samples.
pub fn bar(prefix: String, length: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(length), ProgressDrawTarget::stderr_with_hz(4));
    pb.set_prefix(prefix);
    pb.set_style(
        ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
            .expect("incorrect progress bar format string")
            .progress_chars("#>-"),
    );
    pb
}
