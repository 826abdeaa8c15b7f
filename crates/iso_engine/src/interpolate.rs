//! Surface crossing on a single grid edge
//!
//! Position, normal and color are all blended with the same parameter
//! `t = (isovalue - f(a)) / (f(b) - f(a))`, clamped to `[0, 1]`.

use crate::classify::VertexTags;
use crate::color::ColorMode;
use crate::field::{GridTransform, ScalarField};
use glam::{UVec3, Vec3};

/// Attributes of one output vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

/// Interpolation parameter along an edge. Equal endpoint values give `0`.
#[inline]
pub fn crossing_parameter(isovalue: f32, value_a: f32, value_b: f32) -> f32 {
    if value_a == value_b {
        return 0.0;
    }
    ((isovalue - value_a) / (value_b - value_a)).clamp(0.0, 1.0)
}

pub struct EdgeInterpolator<'a> {
    field: &'a ScalarField,
    tags: &'a VertexTags,
    isovalue: f32,
    transform: GridTransform,
    color: ColorMode,
}

impl<'a> EdgeInterpolator<'a> {
    pub fn new(
        field: &'a ScalarField,
        tags: &'a VertexTags,
        isovalue: f32,
        transform: GridTransform,
        color: ColorMode,
    ) -> Self {
        Self {
            field,
            tags,
            isovalue,
            transform,
            color,
        }
    }

    /// Field gradient at a grid vertex in world units.
    ///
    /// Central differences inside the grid, one-sided differences on the
    /// boundary, zero along an axis with a single sample.
    pub fn grid_gradient(&self, vox: UVec3) -> Vec3 {
        let dims = self.field.dims_uvec();
        let mut gradient = [0.0f32; 3];

        for (axis, g) in gradient.iter_mut().enumerate() {
            let n = dims[axis];
            let mut lo = vox;
            let mut hi = vox;
            if vox[axis] > 0 {
                lo[axis] -= 1;
            }
            if vox[axis] + 1 < n {
                hi[axis] += 1;
            }
            let steps = hi[axis] - lo[axis];
            if steps == 0 {
                continue;
            }
            let run = steps as f32 * self.transform.spacing[axis];
            *g = (self.field.at(hi) - self.field.at(lo)) / run;
        }

        Vec3::from_array(gradient)
    }

    /// Crossing vertex on the edge between adjacent grid vertices `a` and `b`.
    ///
    /// Panics unless `a` and `b` differ by one step along exactly one axis
    /// and carry different tags.
    pub fn edge_vertex(&self, a: UVec3, b: UVec3) -> EdgeVertex {
        let step = (b.as_ivec3() - a.as_ivec3()).abs();
        assert!(
            step.x + step.y + step.z == 1,
            "EdgeInterpolator::edge_vertex -- {a} and {b} are not adjacent"
        );
        assert_ne!(
            self.tags.tag(a),
            self.tags.tag(b),
            "EdgeInterpolator::edge_vertex -- edge {a}-{b} is not crossed"
        );

        let value_a = self.field.at(a);
        let value_b = self.field.at(b);
        let t = crossing_parameter(self.isovalue, value_a, value_b);

        let position = self
            .transform
            .grid_to_world(a)
            .lerp(self.transform.grid_to_world(b), t);
        let normal = self
            .grid_gradient(a)
            .lerp(self.grid_gradient(b), t)
            .normalize_or_zero();
        let color = self
            .color
            .color_at(value_a)
            .lerp(self.color.color_at(value_b), t);

        EdgeVertex {
            position,
            normal,
            color,
        }
    }
}
