//! # kerfnest CAM Tools
//!
//! The geometric pipeline from drawing to sheet layout.
//!
//! ## Stages
//!
//! - **Flattening**: arcs, circles, bulged polylines and splines become line segments
//! - **Chaining**: unordered segments are joined into contours and classified as outlines or holes
//! - **Kerf offset**: contours are offset by half the kerf width through a geometry kernel
//! - **Nesting**: a cooperative, tick-driven search places parts on the material
//!
//! ## Supporting Infrastructure
//!
//! - **Part store**: id-keyed arena shared by the nesting session and renderers
//! - **DXF adaptor**: reads drawings with the `dxf` crate
//! - **Layout report**: serialisable summary of a nesting run

pub mod chainify;
pub mod dxf_adaptor;
pub mod flatten;
pub mod geometry;
pub mod import;
pub mod kernel;
pub mod layout;
pub mod nesting;
pub mod part;
pub mod polypart;
pub mod spline;

// Re-export commonly used items
pub use chainify::{chainify, classify_contours, Chain};
pub use dxf_adaptor::{import_dxf, load_dxf, read_drawing, DxfContents};
pub use flatten::{ArcDirection, CurveFlattener, PolylineVertex};
pub use geometry::{BoundingBox, LineSegment, Point2D};
pub use import::{DrawingImporter, ImportParameters, RawEntity, RawGeometry};
pub use kernel::{CavalierKernel, GeometryKernel};
pub use layout::{NestingReport, PartPlacement};
pub use nesting::{NestingParameters, NestingSession, NestingState};
pub use part::{Part, PartId, PartStore, PartTransform};
pub use polypart::{build_part, BuildOptions, PolyGon, PolyPart};
pub use spline::SplineDef;
