//! Colors and chart scaling for the TUI.

use ratatui::style::Color;

use crate::sim::types::{PhaseId, Status};

/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text and muted labels.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Headings in the advisor panel and the list cursor.
pub const ACCENT: Color = Color::Cyan;

/// Chart line color for a phase.
pub fn phase_color(phase: PhaseId) -> Color {
    match phase {
        PhaseId::R => Color::LightRed,
        PhaseId::S => Color::Yellow,
        PhaseId::T => Color::LightGreen,
    }
}

/// Indicator color for a status.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Normal => Color::Green,
        Status::Warning => Color::Yellow,
        Status::Critical => Color::Red,
    }
}

/// Y-axis bounds covering every series with 0.5 kW of headroom each side.
pub fn auto_bounds_y(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let all = series.iter().flat_map(|s| s.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    [min - 0.5, max + 0.5]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_half_kw() {
        let r = [(0.0, 3.0), (1.0, 3.4)];
        let s = [(0.0, 2.9)];
        let [lo, hi] = auto_bounds_y(&[&r, &s]);
        assert!((lo - 2.4).abs() < 1e-9);
        assert!((hi - 3.9).abs() < 1e-9);
    }

    #[test]
    fn empty_series_have_default_bounds() {
        assert_eq!(auto_bounds_y(&[]), [0.0, 1.0]);
    }

    #[test]
    fn statuses_have_distinct_colors() {
        assert_ne!(status_color(Status::Normal), status_color(Status::Warning));
        assert_ne!(status_color(Status::Warning), status_color(Status::Critical));
    }
}
