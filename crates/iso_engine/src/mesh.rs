//! Triangle mesh output
//!
//! [`MeshBuilder`] owns the growing buffers during extraction and hands out
//! an immutable [`Mesh`] when done.

use glam::Vec3;

/// Constants for performance tuning
const INITIAL_VERTEX_CAPACITY: usize = 4096;
const INITIAL_TRIANGLE_CAPACITY: usize = 8192;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Indexed triangle mesh with per-vertex normal and color
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True iff the mesh has no vertices and no triangles
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.triangles.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn position(&self, n: usize) -> Vec3 {
        Vec3::from_array(self.positions[n])
    }

    pub fn normal(&self, n: usize) -> Vec3 {
        Vec3::from_array(self.normals[n])
    }

    pub fn color(&self, n: usize) -> Vec3 {
        Vec3::from_array(self.colors[n])
    }

    pub fn triangle(&self, n: usize) -> [u32; 3] {
        self.triangles[n]
    }

    /// Geometric normal of triangle `n` from its winding (not normalized)
    pub fn face_normal(&self, n: usize) -> Vec3 {
        let [a, b, c] = self.triangles[n].map(|i| self.position(i as usize));
        (b - a).cross(c - a)
    }

    /// Bounding box of all vertices, `None` when there are none
    pub fn bounds(&self) -> Option<Aabb> {
        let first = Vec3::from_array(*self.positions.first()?);
        let (min, max) = self
            .positions
            .iter()
            .map(|&p| Vec3::from_array(p))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Aabb { min, max })
    }
}

/// Incremental mesh construction
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            mesh: Mesh {
                positions: Vec::with_capacity(vertex_count),
                normals: Vec::with_capacity(vertex_count),
                colors: Vec::with_capacity(vertex_count),
                triangles: Vec::with_capacity(triangle_count),
            },
        }
    }

    /// Capacity tuned for a typical extraction
    pub fn for_extraction() -> Self {
        Self::with_capacity(INITIAL_VERTEX_CAPACITY, INITIAL_TRIANGLE_CAPACITY)
    }

    /// Append a vertex and return its index. The normal is normalized;
    /// a zero normal stays zero.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3, color: Vec3) -> u32 {
        let index = self.mesh.positions.len() as u32;
        self.mesh.positions.push(position.to_array());
        self.mesh.normals.push(normal.normalize_or_zero().to_array());
        self.mesh.colors.push(color.to_array());
        index
    }

    /// Append a triangle and return its index.
    ///
    /// Panics if a corner does not reference an existing vertex.
    pub fn add_triangle(&mut self, triangle: [u32; 3]) -> usize {
        let vertex_count = self.mesh.positions.len();
        assert!(
            triangle.iter().all(|&i| (i as usize) < vertex_count),
            "MeshBuilder::add_triangle -- {triangle:?} references a missing vertex ({vertex_count} vertices)"
        );
        self.mesh.triangles.push(triangle);
        self.mesh.triangles.len() - 1
    }

    pub fn build(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> Mesh {
        let mut builder = MeshBuilder::new();
        let a = builder.add_vertex(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), Vec3::ONE);
        let b = builder.add_vertex(Vec3::X, Vec3::ZERO, Vec3::ONE);
        let c = builder.add_vertex(Vec3::Y, Vec3::Z, Vec3::ONE);
        builder.add_triangle([a, b, c]);
        builder.build()
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshBuilder::new().build();
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), None);
    }

    #[test]
    fn test_vertex_indices_are_sequential() {
        let mesh = single_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_normals_normalized_on_insert() {
        let mesh = single_triangle();
        assert_eq!(mesh.normal(0), Vec3::Z);
        assert_eq!(mesh.normal(1), Vec3::ZERO);
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let mesh = single_triangle();
        assert_eq!(mesh.face_normal(0), Vec3::Z);
    }

    #[test]
    fn test_bounds() {
        let bounds = single_triangle().bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(bounds.size(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    #[should_panic]
    fn test_dangling_triangle_panics() {
        let mut builder = MeshBuilder::new();
        builder.add_vertex(Vec3::ZERO, Vec3::Z, Vec3::ONE);
        builder.add_triangle([0, 1, 2]);
    }
}
