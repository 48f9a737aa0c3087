//! SVG rendering of the kinship network.
//!
//! Nodes sit at their longitude/latitude inside a Cartesian chart; edges,
//! markers and labels are drawn in backend pixels on top of it, in this
//! order: nest edges, harem edges, nodes, kinship edges, labels. The legend
//! occupies a panel to the right of the chart.

use crate::config::RenderConfig;
use crate::error::{KinError, Result};
use crate::pipeline::Network;
use plotters::coord::Shift;
use plotters::element::{DashedPathElement, DottedPathElement};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;
use tracing::info;

type Point = (i32, i32);

const EDGE_ALPHA: f64 = 0.6;
/// Dash length and gap, in pixels.
const NEST_DASH: (i32, i32) = (8, 5);
/// Dot radius and spacing, in pixels.
const HAREM_DOT: (i32, i32) = (1, 6);
/// Marker areas are in square points; the canvas is laid out at 100 px per inch.
const PX_PER_PT: f64 = 100.0 / 72.0;

pub const NEST_LEGEND: &str = "Harem/nest group connection";
pub const HAREM_LEGEND: &str = "Harem group connection";

fn render_error<E: std::fmt::Display>(e: E) -> KinError {
    KinError::Render(e.to_string())
}

fn dashed(from: Point, to: Point, color: RGBAColor) -> DashedPathElement<std::vec::IntoIter<Point>, i32> {
    let (dash, gap) = NEST_DASH;
    DashedPathElement::new(vec![from, to], dash, gap, color.stroke_width(2))
}

fn dotted(from: Point, to: Point, color: RGBAColor) -> DottedPathElement<std::vec::IntoIter<Point>, i32, Circle<Point, i32>> {
    let (radius, spacing) = HAREM_DOT;
    DottedPathElement::new(vec![from, to], 0, spacing, move |c| Circle::new(c, radius, color.filled()))
}

fn marker_radius(area: f64) -> i32 {
    ((area.sqrt() / 2.0 * PX_PER_PT).round() as i32).max(2)
}

/// Axis range covering `values` with a 5% margin.
fn padded(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return -1.0..1.0;
    }
    if max <= min {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

pub struct Renderer {
    width: u32,
    height: u32,
    legend_width: u32,
    title: String,
}

impl Renderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            legend_width: config.legend_width,
            title: config.title.clone(),
        }
    }

    pub fn render_to_file(&self, network: &Network, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        self.draw(&root, network)?;
        root.present().map_err(render_error)?;
        info!(path = %path.display(), "wrote network plot");
        Ok(())
    }

    pub fn render_to_string(&self, network: &Network) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, network)?;
            root.present().map_err(render_error)?;
        }
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, network: &Network) -> Result<()> {
        root.fill(&WHITE).map_err(render_error)?;
        let (plot, legend) =
            root.split_horizontally(self.width.saturating_sub(self.legend_width) as i32);

        let points = self.project(&plot, network)?;
        let graph = &network.graph;

        let nest_color = BLACK.mix(EDGE_ALPHA);
        for (a, b) in graph.nest_edges() {
            root.draw(&dashed(points[a.index()], points[b.index()], nest_color))
                .map_err(render_error)?;
        }

        let harem_color = RED.mix(EDGE_ALPHA);
        for (a, b) in graph.harem_edges() {
            root.draw(&dotted(points[a.index()], points[b.index()], harem_color))
                .map_err(render_error)?;
        }

        for (point, attrs) in points.iter().zip(&network.attributes) {
            let radius = marker_radius(attrs.size);
            root.draw(&Circle::new(*point, radius, attrs.fill.filled()))
                .map_err(render_error)?;
            root.draw(&Circle::new(*point, radius, attrs.border.stroke_width(2)))
                .map_err(render_error)?;
        }

        for (a, b, edge) in graph.kinship_endpoints() {
            let style = edge.color.mix(EDGE_ALPHA).stroke_width(2);
            root.draw(&PathElement::new(vec![points[a.index()], points[b.index()]], style))
                .map_err(render_error)?;
        }

        let label_style = ("sans-serif", 10)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        for (point, id) in points.iter().zip(graph.node_ids()) {
            root.draw(&Text::new(id.clone(), *point, label_style.clone()))
                .map_err(render_error)?;
        }

        self.draw_legend(&legend, network)
    }

    /// Draws the axes and maps every node position to backend pixels.
    fn project<DB: DrawingBackend>(
        &self,
        plot: &DrawingArea<DB, Shift>,
        network: &Network,
    ) -> Result<Vec<Point>> {
        let positions: Vec<(f64, f64)> = network.attributes.iter().map(|a| a.position).collect();
        let x_range = padded(positions.iter().map(|p| p.0));
        let y_range = padded(positions.iter().map(|p| p.1));

        let mut chart = ChartBuilder::on(plot)
            .caption(&self.title, ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .draw()
            .map_err(render_error)?;

        Ok(positions.iter().map(|p| chart.backend_coord(p)).collect())
    }

    fn draw_legend<DB: DrawingBackend>(&self, legend: &DrawingArea<DB, Shift>, network: &Network) -> Result<()> {
        const ROW: i32 = 24;
        const MARKER: i32 = 7;
        let text = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        let palette = &network.palette;
        let mut y = 40;

        let label = |y: i32, name: &str| {
            legend
                .draw(&Text::new(name.to_string(), (50, y), text.clone()))
                .map_err(render_error)
        };

        for (name, color) in palette.categories() {
            legend
                .draw(&PathElement::new(vec![(10, y), (40, y)], color.stroke_width(4)))
                .map_err(render_error)?;
            label(y, name.as_str())?;
            y += ROW;
        }

        for (code, color) in palette.sexes() {
            legend
                .draw(&Circle::new((25, y), MARKER, color.filled()))
                .map_err(render_error)?;
            label(y, code.as_str())?;
            y += ROW;
        }

        for (code, color) in palette.ranks() {
            legend
                .draw(&Circle::new((25, y), MARKER, WHITE.filled()))
                .map_err(render_error)?;
            legend
                .draw(&Circle::new((25, y), MARKER, color.stroke_width(2)))
                .map_err(render_error)?;
            label(y, code.as_str())?;
            y += ROW;
        }

        legend
            .draw(&dashed((10, y), (40, y), BLACK.to_rgba()))
            .map_err(render_error)?;
        label(y, NEST_LEGEND)?;
        y += ROW;

        legend
            .draw(&dotted((10, y), (40, y), RED.to_rgba()))
            .map_err(render_error)?;
        label(y, HAREM_LEGEND)?;

        Ok(())
    }
}
