//! Dense scalar field on a regular grid
//!
//! Samples are stored in one flat buffer addressed by
//! `i + nx * (j + ny * k)`. Every access is bounds-checked per axis and
//! panics on violation.

use core::ops::{Index, IndexMut};
use glam::{UVec3, Vec3};

/// Placement of the grid in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// World position of grid vertex (0, 0, 0)
    pub origin: Vec3,

    /// Distance between neighbouring grid vertices along each axis
    pub spacing: Vec3,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            spacing: Vec3::ONE,
        }
    }
}

impl GridTransform {
    /// Grid coordinates are used as world coordinates
    pub fn identity() -> Self {
        Self::default()
    }

    /// Panics unless every spacing component is positive and finite.
    pub fn new(origin: Vec3, spacing: Vec3) -> Self {
        assert!(
            Self::valid_spacing(spacing),
            "GridTransform::new -- spacing {spacing} must be positive and finite"
        );
        Self { origin, spacing }
    }

    /// Positive and finite along every axis
    pub fn valid_spacing(spacing: Vec3) -> bool {
        spacing.is_finite() && spacing.cmpgt(Vec3::ZERO).all()
    }

    /// Transform a grid vertex to world space
    #[inline]
    pub fn grid_to_world(&self, vox: UVec3) -> Vec3 {
        self.origin + self.spacing * vox.as_vec3()
    }
}

/// Linear address of grid vertex `(i, j, k)` in a grid of extents `dims`.
///
/// Panics if the vertex lies outside the grid.
#[inline]
pub fn grid_address(dims: [usize; 3], i: usize, j: usize, k: usize) -> usize {
    let [nx, ny, nz] = dims;
    assert!(
        i < nx && j < ny && k < nz,
        "linear_address -- ({i}, {j}, {k}) outside {nx}x{ny}x{nz}"
    );
    i + nx * (j + ny * k)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarField {
    data: Vec<f32>,
    dims: [usize; 3],
}

impl ScalarField {
    /// Zero-filled field. A zero extent on any axis yields the empty field.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self::filled(nx, ny, nz, 0.0)
    }

    pub fn filled(nx: usize, ny: usize, nz: usize, value: f32) -> Self {
        let size = nx * ny * nz;
        if size == 0 {
            return Self::default();
        }
        Self {
            data: vec![value; size],
            dims: [nx, ny, nz],
        }
    }

    /// Wrap an existing sample buffer laid out in linear-address order.
    ///
    /// Panics if `data.len() != nx * ny * nz`.
    pub fn from_vec(nx: usize, ny: usize, nz: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            nx * ny * nz,
            "ScalarField::from_vec -- buffer length does not match extents"
        );
        if data.is_empty() {
            return Self::default();
        }
        Self {
            data,
            dims: [nx, ny, nz],
        }
    }

    /// Sample `f(i, j, k)` at every grid vertex
    pub fn from_fn(nx: usize, ny: usize, nz: usize, mut f: impl FnMut(usize, usize, usize) -> f32) -> Self {
        let mut field = Self::new(nx, ny, nz);
        let [nx, ny, nz] = field.dims;
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let n = field.linear_address(i, j, k);
                    field.data[n] = f(i, j, k);
                }
            }
        }
        field
    }

    /// Concentric spheres around the grid centre: `1 - |p| / sqrt(3)` with
    /// `p` mapped to `[-1, 1]^3`. Denser towards the centre.
    pub fn radial(n: usize) -> Self {
        let step = if n > 1 { 2.0 / (n - 1) as f32 } else { 0.0 };
        Self::from_fn(n, n, n, |i, j, k| {
            let p = Vec3::new(i as f32, j as f32, k as f32) * step - Vec3::ONE;
            1.0 - p.length() / 3.0_f32.sqrt()
        })
    }

    /// Number of samples along axis `axis` (0 = x, 1 = y, 2 = z)
    pub fn dimension(&self, axis: usize) -> usize {
        assert!(axis < 3, "ScalarField::dimension -- invalid axis {axis}");
        self.dims[axis]
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn dims_uvec(&self) -> UVec3 {
        UVec3::new(self.dims[0] as u32, self.dims[1] as u32, self.dims[2] as u32)
    }

    /// Total number of samples
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of cells, `(nx-1)(ny-1)(nz-1)`, zero when any axis has fewer than two samples
    pub fn cell_count(&self) -> usize {
        self.dims.iter().map(|d| d.saturating_sub(1)).product()
    }

    /// Memory location of sample `(i, j, k)`
    #[inline]
    pub fn linear_address(&self, i: usize, j: usize, k: usize) -> usize {
        grid_address(self.dims, i, j, k)
    }

    #[inline]
    pub fn address_of(&self, vox: UVec3) -> usize {
        self.linear_address(vox.x as usize, vox.y as usize, vox.z as usize)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[self.linear_address(i, j, k)]
    }

    #[inline]
    pub fn at(&self, vox: UVec3) -> f32 {
        self.data[self.address_of(vox)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let n = self.linear_address(i, j, k);
        self.data[n] = value;
    }

    /// Raw samples in linear-address order
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// Smallest and largest sample, `None` for the empty field
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Half resolution per axis, rounding up. Each output sample is the mean
    /// of its (up to) 2x2x2 input block; blocks on an odd boundary are
    /// averaged over their real volume.
    pub fn subsampled(&self) -> Self {
        let [nx, ny, nz] = self.dims;
        let mut result = Self::new((nx + 1) / 2, (ny + 1) / 2, (nz + 1) / 2);
        let [rx, ry, rz] = result.dims;

        for k in 0..rz {
            let kmax = (2 * k + 1).min(nz - 1);
            for j in 0..ry {
                let jmax = (2 * j + 1).min(ny - 1);
                for i in 0..rx {
                    let imax = (2 * i + 1).min(nx - 1);

                    let mut sum = 0.0;
                    for z in 2 * k..=kmax {
                        for y in 2 * j..=jmax {
                            for x in 2 * i..=imax {
                                sum += self.get(x, y, z);
                            }
                        }
                    }
                    let volume = (imax + 1 - 2 * i) * (jmax + 1 - 2 * j) * (kmax + 1 - 2 * k);
                    result.set(i, j, k, sum / volume as f32);
                }
            }
        }

        result
    }

    /// In-place variant of [`ScalarField::subsampled`]
    pub fn subsample(&mut self) -> &mut Self {
        *self = self.subsampled();
        self
    }
}

impl Index<(usize, usize, usize)> for ScalarField {
    type Output = f32;
    fn index(&self, i: (usize, usize, usize)) -> &Self::Output {
        &self.data[self.linear_address(i.0, i.1, i.2)]
    }
}

impl IndexMut<(usize, usize, usize)> for ScalarField {
    fn index_mut(&mut self, i: (usize, usize, usize)) -> &mut Self::Output {
        let n = self.linear_address(i.0, i.1, i.2);
        &mut self.data[n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_address_layout() {
        let field = ScalarField::new(4, 3, 2);
        assert_eq!(field.linear_address(0, 0, 0), 0);
        assert_eq!(field.linear_address(1, 0, 0), 1);
        assert_eq!(field.linear_address(0, 1, 0), 4);
        assert_eq!(field.linear_address(0, 0, 1), 12);
        assert_eq!(field.linear_address(3, 2, 1), 23);
        assert_eq!(field.size(), 24);
        assert_eq!(field.cell_count(), 3 * 2);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_access_panics() {
        let field = ScalarField::new(2, 2, 2);
        // Flat index 2 would exist; the per-axis check must still fire.
        field.get(2, 0, 0);
    }

    #[test]
    fn test_zero_extent_is_empty() {
        let field = ScalarField::new(5, 0, 3);
        assert!(field.is_empty());
        assert_eq!(field.dims(), [0, 0, 0]);
        assert_eq!(field.cell_count(), 0);
        assert_eq!(field.value_range(), None);
    }

    #[test]
    fn test_index_operators() {
        let mut field = ScalarField::new(3, 3, 3);
        field[(1, 2, 0)] = 0.25;
        assert_eq!(field.get(1, 2, 0), 0.25);
        assert_eq!(field.at(UVec3::new(1, 2, 0)), 0.25);
    }

    #[test]
    fn test_radial_field_values() {
        let field = ScalarField::radial(5);
        // Centre of the grid maps to p = 0
        assert_relative_eq!(field.get(2, 2, 2), 1.0);
        // Corners map to |p| = sqrt(3)
        assert_relative_eq!(field.get(0, 0, 0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(field.get(4, 4, 4), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_subsample_even_dims() {
        let field = ScalarField::from_fn(4, 2, 2, |i, _, _| i as f32);
        let half = field.subsampled();
        assert_eq!(half.dims(), [2, 1, 1]);
        assert_relative_eq!(half.get(0, 0, 0), 0.5);
        assert_relative_eq!(half.get(1, 0, 0), 2.5);
    }

    #[test]
    fn test_subsample_odd_dims_short_block() {
        // 2m+1 = 5 samples along x
        let field = ScalarField::from_fn(5, 2, 2, |i, _, _| i as f32 * 10.0);
        let half = field.subsampled();
        assert_eq!(half.dims(), [3, 1, 1]);
        assert_relative_eq!(half.get(0, 0, 0), 5.0);
        assert_relative_eq!(half.get(1, 0, 0), 25.0);
        // The last block only holds the slice i = 4
        assert_relative_eq!(half.get(2, 0, 0), 40.0);
    }

    #[test]
    fn test_subsample_single_voxel() {
        let mut field = ScalarField::filled(1, 1, 1, 0.7);
        field.subsample();
        assert_eq!(field.dims(), [1, 1, 1]);
        assert_relative_eq!(field.get(0, 0, 0), 0.7);
    }

    #[test]
    fn test_spacing_validation() {
        assert!(GridTransform::valid_spacing(Vec3::new(0.5, 1.0, 2.0)));
        assert!(!GridTransform::valid_spacing(Vec3::new(1.0, 0.0, 1.0)));
        assert!(!GridTransform::valid_spacing(Vec3::new(1.0, 1.0, -1.0)));
        assert!(!GridTransform::valid_spacing(Vec3::new(f32::NAN, 1.0, 1.0)));
    }

    #[test]
    #[should_panic]
    fn test_zero_spacing_panics() {
        GridTransform::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_grid_transform() {
        let t = GridTransform::new(Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.5, 2.0, 1.0));
        assert_eq!(t.grid_to_world(UVec3::new(2, 1, 3)), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(GridTransform::identity().grid_to_world(UVec3::new(4, 5, 6)), Vec3::new(4.0, 5.0, 6.0));
    }
}
