// src/heatmap/render.rs

use crate::concurrent::{ProgressCounter, ProgressSink};
use crate::heatmap::{color::ColorSelector, gradient::TRANSPARENT, grid::ScalarGrid, polygon::AreaPolygon};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::Point2D,
};
use image::RgbaImage;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Färbt ein interpoliertes Raster ein.
///
/// Pixel außerhalb der Fläche oder mit `NaN` werden vollständig transparent.
#[derive(Debug, Clone)]
pub struct HeatmapRenderer {
    area: AreaPolygon,
    selector: ColorSelector,
}

impl HeatmapRenderer {
    pub fn new(area: AreaPolygon, selector: ColorSelector) -> Self {
        Self { area, selector }
    }

    /// Rendert zeilenweise und meldet nach jeder Zeile den Fortschritt.
    pub fn render(&self, grid: &ScalarGrid, progress: Arc<dyn ProgressSink>) -> HeatmapResult<RgbaImage> {
        let width = u32::try_from(grid.width()).map_err(|_| HeatmapError::InvalidConfiguration {
            message: format!("grid width {} exceeds image limits", grid.width()),
        })?;
        let height = u32::try_from(grid.height()).map_err(|_| HeatmapError::InvalidConfiguration {
            message: format!("grid height {} exceeds image limits", grid.height()),
        })?;

        info!("Rendering {}x{} heatmap image...", width, height);
        let counter = ProgressCounter::new(grid.len() as u64, progress);
        let mut image = RgbaImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let color = match grid.get(x as usize, y as usize) {
                    Some(value)
                        if !value.is_nan()
                            && self.area.is_point_in_polygon(&Point2D::new(x as f64, y as f64)) =>
                    {
                        self.selector.color_for_value(value)
                    }
                    _ => TRANSPARENT,
                };
                image.put_pixel(x, y, color);
            }
            counter.advance(u64::from(width));
        }
        debug!("Rendering finished");
        Ok(image)
    }

    /// Rendert auf einem eigenen Thread.
    pub fn spawn(
        self,
        grid: Arc<ScalarGrid>,
        progress: Arc<dyn ProgressSink>,
    ) -> HeatmapResult<JoinHandle<HeatmapResult<RgbaImage>>> {
        let handle = thread::Builder::new()
            .name("heatmap-render".to_string())
            .spawn(move || self.render(&grid, progress))?;
        Ok(handle)
    }
}
