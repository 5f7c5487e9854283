//! # Kerfnest
//!
//! Nests parts imported from DXF drawings onto rectangular sheet material,
//! keeping a kerf-width gap between every cut outline.
//!
//! ## Architecture
//!
//! Kerfnest is organized as a workspace with multiple crates:
//!
//! 1. **kerfnest-core** - Error types and drawing units
//! 2. **kerfnest-camtools** - Curve flattening, contour chaining, kerf offsets, nesting
//! 3. **kerfnest-settings** - Configuration files
//! 4. **kerfnest** - Command line binary that integrates all crates
//!
//! ## Pipeline
//!
//! - **Import**: DXF entities are flattened into line segments
//! - **Chain**: Segments are joined into contours and classified as inside or outside
//! - **Offset**: Each contour is grown or shrunk by half the kerf width
//! - **Nest**: A tick-driven search rotates and slides each part until it fits

pub use kerfnest_core::{DrawingUnits, GeometryError, ImportError, NestingError};

pub use kerfnest_camtools::{
    build_part, chainify, classify_contours, import_dxf, BoundingBox, BuildOptions,
    CavalierKernel, Chain, CurveFlattener, DrawingImporter, GeometryKernel, ImportParameters,
    LineSegment, NestingParameters, NestingReport, NestingSession, NestingState, Part, PartId,
    PartPlacement, PartStore, PartTransform, Point2D, PolyPart,
};

pub use kerfnest_settings::{Config, SettingsError};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize structured logging with tracing
///
/// Sets up the tracing subscriber with:
/// - RUST_LOG environment variable support
/// - Output on stderr so reports written to stdout stay machine readable
/// - Pretty or JSON formatting
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .pretty();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
