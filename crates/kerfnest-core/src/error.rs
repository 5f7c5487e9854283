//! Error handling for kerfnest
//!
//! Provides error types for every layer of the pipeline:
//! - Geometry errors (primitive math and curve evaluation)
//! - Import errors (drawing files and entity conversion)
//! - Nesting errors (session setup and part lookup)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised by the primitive geometry routines when their input cannot
/// produce a meaningful result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Too few points for the requested operation
    #[error("{operation} needs at least {required} points, got {actual}")]
    NotEnoughPoints {
        /// The operation that rejected the input.
        operation: &'static str,
        /// The minimum number of points accepted.
        required: usize,
        /// The number of points supplied.
        actual: usize,
    },

    /// Arc with a zero or negative radius, or a zero-length chord
    #[error("Degenerate arc: {reason}")]
    DegenerateArc {
        /// What made the arc degenerate.
        reason: String,
    },

    /// Three points that do not define a circle
    #[error("Points ({x1}, {y1}), ({x2}, {y2}), ({x3}, {y3}) are collinear")]
    CollinearPoints {
        /// First point x.
        x1: f64,
        /// First point y.
        y1: f64,
        /// Second point x.
        x2: f64,
        /// Second point y.
        y2: f64,
        /// Third point x.
        x3: f64,
        /// Third point y.
        y3: f64,
    },

    /// Polygon offset collapsed to nothing
    #[error("Offset by {distance} produced no polygon")]
    EmptyOffset {
        /// The offset distance that was requested.
        distance: f64,
    },

    /// Spline definition that cannot be evaluated
    #[error("Invalid spline: {reason}")]
    InvalidSpline {
        /// Why the spline was rejected.
        reason: String,
    },
}

/// Import error type
///
/// Represents errors while reading a drawing and turning its entities
/// into a part.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The drawing file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The DXF parser rejected the file
    #[error("DXF parse error: {reason}")]
    Dxf {
        /// The parser's message.
        reason: String,
    },

    /// Entity kind that the importer does not handle
    #[error("Unsupported entity: {kind}")]
    UnsupportedEntity {
        /// The entity kind name.
        kind: String,
    },

    /// The drawing produced no usable geometry
    #[error("Drawing '{name}' contains no usable geometry")]
    EmptyDrawing {
        /// The name of the drawing.
        name: String,
    },
}

/// Nesting error type
///
/// Represents errors when configuring or feeding a nesting session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NestingError {
    /// Session parameters that cannot drive a search
    #[error("Invalid nesting parameters: {reason}")]
    InvalidParameters {
        /// Why the parameters were rejected.
        reason: String,
    },

    /// A part id that is not in the store
    #[error("Unknown part id {id}")]
    UnknownPart {
        /// The id that failed to resolve.
        id: u64,
    },

    /// A part whose outline produced no offset polygon
    #[error("Part '{name}' has no outer boundary")]
    NoOuterBoundary {
        /// The part's name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enough_points_message() {
        let err = GeometryError::NotEnoughPoints {
            operation: "simplify",
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "simplify needs at least 2 points, got 1");
    }

    #[test]
    fn test_empty_offset_message() {
        let err = GeometryError::EmptyOffset { distance: -0.75 };
        assert_eq!(err.to_string(), "Offset by -0.75 produced no polygon");
    }

    #[test]
    fn test_unknown_part_message() {
        assert_eq!(
            NestingError::UnknownPart { id: 7 }.to_string(),
            "Unknown part id 7"
        );
    }
}
