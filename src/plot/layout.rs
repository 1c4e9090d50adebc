//! Horizontal allocation of the gap-compressed x-axis.
use crate::utils::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Horizontal space between consecutive windows
    pub gap: f64,
    /// Ticks shared out over the windows in proportion to their span
    pub num_ticks: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin_top: 50.0,
            margin_right: 50.0,
            margin_bottom: 80.0,
            margin_left: 80.0,
            gap: 30.0,
            num_ticks: 10,
        }
    }
}

impl LayoutParams {
    /// Width left for windows once margins and gaps are taken out.
    pub fn available_width(&self, n_windows: usize) -> f64 {
        let n_gaps = n_windows.saturating_sub(1) as f64;
        self.width - (self.margin_left + self.margin_right + n_gaps * self.gap)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSlot {
    /// Share of the available width
    pub ratio: f64,
    pub window_start: f64,
    pub window_end: f64,
    pub tick_count: u32,
}

/// Lays out windows for the given genomic spans, left to right in input order.
///
/// Every window is at least one tick wide regardless of its share.
pub fn layout(spans: &[i64], params: &LayoutParams) -> Result<Vec<LayoutSlot>> {
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    let available = params.available_width(spans.len());
    if available <= 0.0 {
        return Err(format!(
            "Layout infeasible: {} windows do not fit into width {} (available width {})",
            spans.len(),
            params.width,
            available
        ));
    }

    let total: i64 = spans.iter().sum();
    if total <= 0 {
        return Err(format!("Layout infeasible: total genomic span is {}", total));
    }

    let mut slots = Vec::with_capacity(spans.len());
    let mut x = params.margin_left;
    for &span in spans {
        let ratio = span as f64 / total as f64;
        let width = ratio * available;
        slots.push(LayoutSlot {
            ratio,
            window_start: x,
            window_end: x + width,
            tick_count: 1 + (ratio * params.num_ticks as f64).floor() as u32,
        });
        x += width + params.gap;
    }
    Ok(slots)
}
