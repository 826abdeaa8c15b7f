//! Marching Cubes isosurface extraction
//!
//! Pipeline per call to [`MarchingCubes::compute`]:
//! 1. Tag every grid vertex as above/below the isovalue
//! 2. For every cell, pack the corner tags into an 8-bit code
//! 3. Resolve each crossed edge to one shared output vertex
//! 4. Emit the code's triangles in table order
//!
//! Vertices are shared through a cache keyed by the edge's grid-wide
//! identity, so neighbouring cells reuse the same vertex and the output is
//! a connected mesh rather than a per-cell triangle soup. All state lives
//! for one call only.

use crate::classify::VertexTags;
use crate::color::ColorMode;
use crate::field::{GridTransform, ScalarField};
use crate::interpolate::EdgeInterpolator;
use crate::mesh::{Mesh, MeshBuilder};
use crate::stats::{millis, CellOutcome, ExtractionStats};
use crate::tables::{self, CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_TABLE};
use glam::{IVec3, UVec3};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

/// Extraction configuration
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    /// How vertex colors are derived from field values
    pub color: ColorMode,

    /// World placement of the grid
    pub transform: GridTransform,

    /// Spread cell processing over the rayon thread pool
    pub parallel: bool,
}

/// Grid-wide identity of the edge between adjacent vertices `a` and `b`:
/// `axis * size + linear_address(min(a, b))`.
///
/// Panics unless `a` and `b` are adjacent.
#[inline]
pub fn edge_id(field: &ScalarField, a: UVec3, b: UVec3) -> usize {
    let step = (b.as_ivec3() - a.as_ivec3()).abs();
    assert!(
        step.x + step.y + step.z == 1,
        "edge_id -- {a} and {b} are not adjacent"
    );
    let axis = step.dot(IVec3::new(0, 1, 2)) as usize;
    axis * field.size() + field.address_of(a.min(b))
}

/// Inverse of [`edge_id`]: the edge's lower and upper grid vertex
pub fn edge_endpoints(field: &ScalarField, id: usize) -> (UVec3, UVec3) {
    let size = field.size();
    let axis = id / size;
    assert!(axis < 3, "edge_endpoints -- invalid edge id {id}");
    let address = id % size;
    let [nx, ny, _] = field.dims();
    let lower = UVec3::new(
        (address % nx) as u32,
        ((address / nx) % ny) as u32,
        (address / (nx * ny)) as u32,
    );
    let mut upper = lower;
    upper[axis] += 1;
    (lower, upper)
}

/// Corner positions of edge `edge` in the cell at `cell`
#[inline]
fn edge_corners(cell: UVec3, edge: usize) -> (UVec3, UVec3) {
    let (a, b) = EDGE_CONNECTIONS[edge];
    (
        cell + CORNER_OFFSETS[a as usize],
        cell + CORNER_OFFSETS[b as usize],
    )
}

/// Minimum corners of all cells in one z-slab, x fastest
fn slab_cells(dims: [usize; 3], k: usize) -> impl Iterator<Item = UVec3> {
    let (cx, cy) = (dims[0] - 1, dims[1] - 1);
    (0..cy).flat_map(move |j| (0..cx).map(move |i| UVec3::new(i as u32, j as u32, k as u32)))
}

/// Isosurface extractor over a read-only field
pub struct MarchingCubes<'a> {
    field: &'a ScalarField,
    config: ExtractConfig,
}

impl<'a> MarchingCubes<'a> {
    pub fn new(field: &'a ScalarField) -> Self {
        Self::with_config(field, ExtractConfig::default())
    }

    pub fn with_config(field: &'a ScalarField, config: ExtractConfig) -> Self {
        Self { field, config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract the isosurface at `isovalue`
    pub fn compute(&self, isovalue: f32) -> Mesh {
        self.compute_with_stats(isovalue).0
    }

    pub fn compute_with_stats(&self, isovalue: f32) -> (Mesh, ExtractionStats) {
        let mut stats = ExtractionStats {
            isovalue,
            ..Default::default()
        };

        let start = Instant::now();
        let tags = VertexTags::classify(self.field, isovalue);
        stats.classify_ms = millis(start.elapsed());
        tracing::debug!(
            "Classified {} vertices ({} above iso {}) in {:.2}ms",
            tags.len(),
            tags.plus_count(),
            isovalue,
            stats.classify_ms
        );

        if self.field.cell_count() == 0 {
            if !self.field.is_empty() {
                tracing::warn!(
                    "Field {:?} has fewer than two samples along some axis; no cells to extract",
                    self.field.dims()
                );
            }
            return (Mesh::default(), stats);
        }

        let interp = EdgeInterpolator::new(
            self.field,
            &tags,
            isovalue,
            self.config.transform,
            self.config.color,
        );

        let start = Instant::now();
        let mesh = if self.config.parallel {
            self.triangulate_parallel(&tags, &interp, &mut stats)
        } else {
            self.triangulate(&tags, &interp, &mut stats)
        };
        stats.triangulate_ms = millis(start.elapsed());
        stats.vertices = mesh.vertex_count();
        debug_assert_eq!(stats.triangles, mesh.triangle_count());

        tracing::info!("Extracted {}", stats);
        (mesh, stats)
    }

    fn triangulate(
        &self,
        tags: &VertexTags,
        interp: &EdgeInterpolator<'_>,
        stats: &mut ExtractionStats,
    ) -> Mesh {
        let mut pass = CellPass {
            field: self.field,
            tags,
            interp,
            cache: HashMap::new(),
            builder: MeshBuilder::for_extraction(),
        };

        let dims = self.field.dims();
        for k in 0..dims[2] - 1 {
            for cell in slab_cells(dims, k) {
                stats.record(pass.process_cell(cell));
            }
        }

        tracing::debug!("Resolved {} shared edge vertices", pass.cache.len());
        pass.builder.build()
    }

    /// Slabs are coded in parallel with triangles expressed as edge
    /// identities; each distinct identity then gets exactly one vertex.
    /// Vertices come out ordered by edge identity.
    fn triangulate_parallel(
        &self,
        tags: &VertexTags,
        interp: &EdgeInterpolator<'_>,
        stats: &mut ExtractionStats,
    ) -> Mesh {
        let field = self.field;
        let dims = field.dims();

        let slabs: Vec<(Vec<[usize; 3]>, ExtractionStats)> = (0..dims[2] - 1)
            .into_par_iter()
            .map(|k| {
                let mut triangles = Vec::new();
                let mut slab_stats = ExtractionStats::default();
                for cell in slab_cells(dims, k) {
                    let code = tags.cell_code(cell);
                    if EDGE_TABLE[code as usize] == 0 {
                        slab_stats.record(CellOutcome::Empty);
                        continue;
                    }
                    let before = triangles.len();
                    triangles.extend(tables::triangles(code).map(|tri| {
                        tri.map(|e| {
                            let (a, b) = edge_corners(cell, e as usize);
                            edge_id(field, a, b)
                        })
                    }));
                    slab_stats.record(CellOutcome::Triangulated(triangles.len() - before));
                }
                (triangles, slab_stats)
            })
            .collect();

        let mut edges: Vec<usize> = slabs
            .iter()
            .flat_map(|(triangles, _)| triangles.iter().flatten().copied())
            .collect();
        edges.par_sort_unstable();
        edges.dedup();
        tracing::debug!("Resolved {} shared edge vertices", edges.len());

        let vertices: Vec<_> = edges
            .par_iter()
            .map(|&id| {
                let (a, b) = edge_endpoints(field, id);
                interp.edge_vertex(a, b)
            })
            .collect();

        let triangle_count: usize = slabs.iter().map(|(t, _)| t.len()).sum();
        let mut builder = MeshBuilder::with_capacity(vertices.len(), triangle_count);
        for v in &vertices {
            builder.add_vertex(v.position, v.normal, v.color);
        }
        for (triangles, slab_stats) in &slabs {
            stats.merge_cells(slab_stats);
            for tri in triangles {
                builder.add_triangle(tri.map(|id| match edges.binary_search(&id) {
                    Ok(index) => index as u32,
                    Err(_) => unreachable!("edge {id} has no vertex"),
                }));
            }
        }
        builder.build()
    }
}

/// Mutable state of one sequential pass over the cells
struct CellPass<'f, 'i> {
    field: &'f ScalarField,
    tags: &'f VertexTags,
    interp: &'i EdgeInterpolator<'f>,
    cache: HashMap<usize, u32>,
    builder: MeshBuilder,
}

impl CellPass<'_, '_> {
    fn process_cell(&mut self, cell: UVec3) -> CellOutcome {
        let code = self.tags.cell_code(cell);
        let crossed = EDGE_TABLE[code as usize];
        if crossed == 0 {
            return CellOutcome::Empty;
        }

        let mut resolved = [u32::MAX; 12];
        for (edge, slot) in resolved.iter_mut().enumerate() {
            if crossed & (1 << edge) != 0 {
                let (a, b) = edge_corners(cell, edge);
                *slot = self.resolve_edge(a, b);
            }
        }

        let mut emitted = 0;
        for tri in tables::triangles(code) {
            self.builder.add_triangle(tri.map(|e| resolved[e as usize]));
            emitted += 1;
        }
        CellOutcome::Triangulated(emitted)
    }

    /// Mesh index of the vertex on edge `a`-`b`, created on first use
    fn resolve_edge(&mut self, a: UVec3, b: UVec3) -> u32 {
        let id = edge_id(self.field, a, b);
        let builder = &mut self.builder;
        let interp = self.interp;
        *self.cache.entry(id).or_insert_with(|| {
            let v = interp.edge_vertex(a, b);
            builder.add_vertex(v.position, v.normal, v.color)
        })
    }
}

/// Convenience wrapper: default configuration, one isovalue
pub fn extract(field: &ScalarField, isovalue: f32) -> Mesh {
    MarchingCubes::new(field).compute(isovalue)
}
