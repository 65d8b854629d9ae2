// src/debug/visualization/svg.rs
use crate::heatmap::{polygon::AreaPolygon, sample::Sample, triangulation::TriangleMesh};
use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::{Bounds2D, Point2D},
};
use std::path::Path;
use svg::{Document, Node};
use svg::node::element::{Circle, Polygon, Rectangle};
use tracing::info;

// ===================================================================================
// HILFS-STRUCT für die SVG-Erstellung
// ===================================================================================
/// Baut ein SVG-Dokument mit Strichstärken relativ zur Größe der ViewBox.
struct SvgBuilder {
    document: Document,
    stroke_w_normal: f64,
    stroke_w_thin: f64,
    point_radius: f64,
}

impl SvgBuilder {
    fn new(display_bounds: &Bounds2D, svg_pixel_size: f64) -> Self {
        let viewbox_width = display_bounds.width();
        let viewbox_height = display_bounds.height();
        let mean_extent = (viewbox_width + viewbox_height) / 2.0;

        let document = Document::new()
            .set("width", svg_pixel_size)
            .set("height", svg_pixel_size)
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    display_bounds.min.x, display_bounds.min.y, viewbox_width, viewbox_height
                ),
            )
            .add(
                Rectangle::new()
                    .set("x", display_bounds.min.x)
                    .set("y", display_bounds.min.y)
                    .set("width", viewbox_width)
                    .set("height", viewbox_height)
                    .set("fill", "#f0f0f0"),
            );

        Self {
            document,
            stroke_w_normal: mean_extent * 0.004,
            stroke_w_thin: mean_extent * 0.0015,
            point_radius: mean_extent * 0.006,
        }
    }

    fn draw_polygon(&mut self, vertices: &[Point2D], fill: &str, stroke: &str, stroke_width: f64) {
        if vertices.len() < 2 {
            return;
        }
        let points: String = vertices
            .iter()
            .map(|p| format!("{:.3},{:.3}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let polygon = Polygon::new()
            .set("points", points)
            .set("fill", fill)
            .set("stroke", stroke)
            .set("stroke-width", stroke_width);
        self.document.append(polygon);
    }

    fn draw_circle(&mut self, center: &Point2D, fill: &str) {
        let circle = Circle::new()
            .set("cx", center.x)
            .set("cy", center.y)
            .set("r", self.point_radius)
            .set("fill", fill)
            .set("stroke", "#333333")
            .set("stroke-width", self.stroke_w_thin);
        self.document.append(circle);
    }

    fn finish(self) -> Document {
        self.document
    }
}

/// Erstellt das Debug-Dokument: Maske, Dreiecke und Messpunkte in Rasterkoordinaten.
///
/// Echte Messungen sind blau, die vier synthetischen Eckpunkte (außerhalb des
/// Rasters) rot.
pub fn mesh_svg_document(
    mesh: &TriangleMesh,
    samples: &[Sample],
    area: &AreaPolygon,
    grid_size: (usize, usize),
) -> HeatmapResult<Document> {
    let mut bounds = Bounds2D::from_points_iter(
        samples
            .iter()
            .map(|s| &s.position)
            .chain(area.points().iter()),
    )
    .ok_or(HeatmapError::EmptySampleSet)?;
    for triangle in mesh.triangles() {
        for vertex in triangle.vertices() {
            bounds.expand_to_include_point(vertex);
        }
    }
    let display_bounds = bounds.expand(1.0);

    let mut svg = SvgBuilder::new(&display_bounds, 1024.0);
    let (width, height) = (grid_size.0 as f64, grid_size.1 as f64);
    let stroke_normal = svg.stroke_w_normal;
    let stroke_thin = svg.stroke_w_thin;
    svg.draw_polygon(
        &[
            Point2D::new(0.0, 0.0),
            Point2D::new(width, 0.0),
            Point2D::new(width, height),
            Point2D::new(0.0, height),
        ],
        "none",
        "#888888",
        stroke_thin,
    );
    svg.draw_polygon(area.points(), "rgba(150, 255, 150, 0.4)", "#00aa00", stroke_normal);
    for triangle in mesh.triangles() {
        svg.draw_polygon(&triangle.vertices(), "none", "#5500aa", stroke_thin);
    }
    for sample in samples {
        let outside = sample.x() < 0.0 || sample.y() < 0.0 || sample.x() >= width || sample.y() >= height;
        svg.draw_circle(&sample.position, if outside { "#ffaaaa" } else { "#aaccff" });
    }
    Ok(svg.finish())
}

/// Schreibt [`mesh_svg_document`] nach `path`.
pub fn write_mesh_svg(
    mesh: &TriangleMesh,
    samples: &[Sample],
    area: &AreaPolygon,
    grid_size: (usize, usize),
    path: impl AsRef<Path>,
) -> HeatmapResult<()> {
    let document = mesh_svg_document(mesh, samples, area, grid_size)?;
    svg::save(path.as_ref(), &document)?;
    info!("Debug SVG '{}' wurde erstellt.", path.as_ref().display());
    Ok(())
}
