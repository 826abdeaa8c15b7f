//! Per-vertex inside/outside tagging against the isovalue

use crate::field::{grid_address, ScalarField};
use crate::tables::CORNER_OFFSETS;
use glam::UVec3;
use rayon::prelude::*;

/// Sample is at or above the isovalue
pub const PLUS: u8 = 1;
/// Sample is below the isovalue
pub const MINUS: u8 = 0;

/// One tag per grid vertex, addressed like the field it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexTags {
    tags: Vec<u8>,
    dims: [usize; 3],
}

impl VertexTags {
    /// Tag every grid vertex of `field`. Equality counts as [`PLUS`].
    pub fn classify(field: &ScalarField, isovalue: f32) -> Self {
        let tags = field
            .values()
            .par_iter()
            .map(|&v| if v >= isovalue { PLUS } else { MINUS })
            .collect();
        Self {
            tags,
            dims: field.dims(),
        }
    }

    #[inline]
    pub fn tag(&self, vox: UVec3) -> u8 {
        self.tags[grid_address(self.dims, vox.x as usize, vox.y as usize, vox.z as usize)]
    }

    /// Pack the tags of the cell's 8 corners, corner 0 in the lowest bit
    #[inline]
    pub fn cell_code(&self, cell: UVec3) -> u8 {
        CORNER_OFFSETS
            .iter()
            .enumerate()
            .fold(0u8, |code, (corner, &offset)| code | (self.tag(cell + offset) << corner))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of vertices tagged [`PLUS`]
    pub fn plus_count(&self) -> usize {
        self.tags.iter().filter(|&&t| t == PLUS).count()
    }
}
