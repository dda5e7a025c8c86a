#![warn(missing_docs)]

//! Toolpath ordering for the vcad slicer.
//!
//! Decides in which order a layer's contours and lines are printed, where
//! each contour's seam goes, and from which end each line is entered, so
//! that non-printing travel stays short and direction changes stay gentle.
//!
//! # Example
//!
//! ```ignore
//! use vcad_slicer_order::{ShapeOrderOptimizer, ZSeamConfig, LineOrderOptimizer};
//!
//! let seam = ZSeamConfig::shortest();
//! let mut walls = ShapeOrderOptimizer::new(start, &seam);
//! walls.add_polygons(&contours)?;
//! let order = walls.optimize();
//!
//! for step in order {
//!     println!("contour {} enters at vertex {:?}", step.path, step.entry);
//! }
//!
//! let mut infill = LineOrderOptimizer::new(order.end_point(start, walls.paths()))
//!     .with_boundary(&contours);
//! infill.add_polylines(&lines)?;
//! let lines_order = infill.optimize();
//! ```

pub mod boundary;
pub mod error;
pub mod layers;
pub mod line_order;
pub mod order;
pub mod path;
pub mod proximity;
pub mod seam;
pub mod shape_order;

pub use boundary::TravelBoundary;
pub use error::{OrderError, Result};
pub use layers::{order_layer, order_layers, LayerOrder, LayerPaths};
pub use line_order::{
    angle_score, obstacle_aware_distance, reversal_penalty, LineOrderOptimizer, LineOrderSettings,
};
pub use order::{OptimizerState, OrderStep, PathOrder};
pub use path::{PathRef, Polygon, Polyline};
pub use proximity::{ProximityIndex, SegmentIndex};
pub use seam::{CornerPreference, SeamKind, ZSeamConfig};
pub use shape_order::{ShapeOrderOptimizer, ShapeOrderSettings};

use serde::{Deserialize, Serialize};

/// Ordering parameters for a whole print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSettings {
    /// Contour ordering and seam selection.
    pub shape: ShapeOrderSettings,
    /// Line ordering.
    pub line: LineOrderSettings,
}

impl OrderSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        self.line.validate()
    }
}
