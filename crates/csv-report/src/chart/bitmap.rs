//! PNG chart rendering with Plotters.

use super::{ChartRenderer, ChartSpec};
use crate::error::{ReportError, Result};
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

const CAPTION_FONT_SIZE: u32 = 24;
const MARKER_RADIUS: i32 = 4;

/// Draws a line-with-markers chart into a PNG file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapChartRenderer;

impl BitmapChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for BitmapChartRenderer {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<()> {
        if spec.width == 0 || spec.height == 0 {
            return Err(ReportError::Render(format!(
                "invalid chart size {}x{}",
                spec.width, spec.height
            )));
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| {
            ReportError::Render(format!("cannot create {}: {e}", parent.display()))
        })?;

        // Draw next to the target and rename on success so a failed render
        // never replaces the previous chart with a partial image.
        let staging = tempfile::Builder::new()
            .prefix(".chart_")
            .suffix(".png")
            .tempfile_in(parent)
            .map_err(render_error)?;
        draw(spec, staging.path())?;
        staging.persist(path).map_err(render_error)?;

        debug!(
            "Rendered chart '{}' ({} points) to {}",
            spec.title,
            spec.points.len(),
            path.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "plotters-bitmap"
    }
}

fn draw(spec: &ChartSpec, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (spec.width, spec.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let ((x0, x1), (y0, y1)) = spec.bounds();
    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), ("sans-serif", CAPTION_FONT_SIZE))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(render_error)?;

    let format_x = |x: &f64| spec.x_tick_label(*x);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str());
    if let Some(categories) = &spec.x_categories {
        mesh.x_labels(categories.len().max(1))
            .x_label_formatter(&format_x);
    }
    mesh.draw().map_err(render_error)?;

    chart
        .draw_series(LineSeries::new(spec.points.iter().copied(), &BLUE))
        .map_err(render_error)?;
    chart
        .draw_series(
            spec.points
                .iter()
                .map(|&point| Circle::new(point, MARKER_RADIUS, BLUE.filled())),
        )
        .map_err(render_error)?;

    root.present().map_err(render_error)
}

fn render_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Render(e.to_string())
}
