//! Output formatting for CLI.

pub mod json;
pub mod text;
pub mod waybar;

pub use json::JsonFormatter;
pub use text::TextFormatter;
#[cfg(test)]
mod tests;

use chrono::Duration;

/// Width of the usage bar, in cells.
pub const BAR_WIDTH: usize = 20;

const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Renders a plain usage bar. Partial cells round down; out-of-range input clamps.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn progress_bar(utilization: f64) -> String {
    let filled = if utilization.is_finite() {
        ((utilization / 100.0 * BAR_WIDTH as f64) as usize).min(BAR_WIDTH)
    } else {
        0
    };
    let mut bar = String::with_capacity(BAR_WIDTH * 3);
    bar.extend(std::iter::repeat_n(BAR_FULL, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, BAR_WIDTH - filled));
    bar
}

/// Formats a countdown as `1d 2h 3m`, omitting zero parts, or `expired`.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::zero() {
        return "expired".to_string();
    }

    let total_minutes = d.num_minutes();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.join(" ")
}
