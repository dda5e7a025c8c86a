//! Per-layer ordering: contours first, then lines, layers in parallel.

use rayon::prelude::*;
use vcad_slicer_math::Point;

use crate::error::Result;
use crate::line_order::LineOrderOptimizer;
use crate::order::PathOrder;
use crate::path::{PathRef, Polygon, Polyline};
use crate::proximity::SegmentIndex;
use crate::seam::ZSeamConfig;
use crate::shape_order::ShapeOrderOptimizer;
use crate::OrderSettings;

/// The toolpaths of one layer, before ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPaths {
    /// Head position when the layer starts.
    pub start: Point,
    /// Closed contours (walls).
    pub contours: Vec<Polygon>,
    /// Open lines (infill, skin, support).
    pub lines: Vec<Polyline>,
}

impl LayerPaths {
    /// Create an empty layer starting at `start`.
    pub fn new(start: Point) -> Self {
        Self {
            start,
            contours: Vec::new(),
            lines: Vec::new(),
        }
    }
}

/// Ordering of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOrder {
    /// Order and seams of [`LayerPaths::contours`].
    pub contours: PathOrder,
    /// Order and entry ends of [`LayerPaths::lines`].
    pub lines: PathOrder,
    /// Head position after the last path.
    pub end: Point,
}

/// Order one layer.
///
/// Contours are ordered from the layer start. Lines follow from wherever the
/// last contour left the head, with the contours acting as travel obstacles.
pub fn order_layer(
    layer: &LayerPaths,
    seam: &ZSeamConfig,
    settings: &OrderSettings,
) -> Result<LayerOrder> {
    let mut shapes = ShapeOrderOptimizer::with_settings(layer.start, seam, settings.shape)?;
    shapes.add_polygons(&layer.contours)?;
    let contours = shapes.optimize().clone();
    let after_contours = contours.end_point(layer.start, shapes.paths());

    let line_paths: Vec<PathRef<'_>> = layer.lines.iter().map(Polyline::as_path).collect();
    let index = SegmentIndex::from_paths(&line_paths);
    let mut lines = LineOrderOptimizer::new(after_contours)
        .with_boundary(&layer.contours)
        .with_proximity(&index)
        .with_settings(settings.line)?;
    lines.add_polylines(&layer.lines)?;
    let lines_order = lines.optimize().clone();
    let end = lines_order.end_point(after_contours, lines.paths());

    Ok(LayerOrder {
        contours,
        lines: lines_order,
        end,
    })
}

/// Order every layer in parallel.
///
/// Layers are independent: each starts from its own [`LayerPaths::start`].
pub fn order_layers(
    layers: &[LayerPaths],
    seam: &ZSeamConfig,
    settings: &OrderSettings,
) -> Result<Vec<LayerOrder>> {
    settings.validate()?;

    let ordered = layers
        .par_iter()
        .map(|layer| order_layer(layer, seam, settings))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("ordered {} layers", ordered.len());
    Ok(ordered)
}
