#![forbid(unsafe_code)]
//! Isosurface extraction from regular 3-D scalar fields

pub mod classify;
pub mod color;
pub mod dat;
pub mod error;
pub mod field;
pub mod interpolate;
pub mod marching_cubes;
pub mod mesh;
pub mod obj;
pub mod stats;
pub mod tables;

pub use classify::{VertexTags, MINUS, PLUS};
pub use color::ColorMode;
pub use error::{IsoError, IsoResult};
pub use field::{GridTransform, ScalarField};
pub use interpolate::{EdgeInterpolator, EdgeVertex};
pub use marching_cubes::{extract, ExtractConfig, MarchingCubes};
pub use mesh::{Aabb, Mesh, MeshBuilder};
pub use stats::{CellOutcome, ExtractionStats};
