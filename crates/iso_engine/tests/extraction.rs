use approx::assert_relative_eq;
use glam::{UVec3, Vec3};
use iso_engine::{extract, ExtractConfig, GridTransform, MarchingCubes, Mesh, ScalarField};

fn wavy_field(n: usize) -> ScalarField {
    ScalarField::from_fn(n, n + 1, n + 2, |i, j, k| {
        let (x, y, z) = (i as f32 * 0.7, j as f32 * 0.55, k as f32 * 0.45);
        x.sin() * y.cos() + (z * 1.3).sin() * 0.5
    })
}

/// Crossed grid edges counted directly from the samples
fn crossed_edge_count(field: &ScalarField, isovalue: f32) -> usize {
    let [nx, ny, nz] = field.dims();
    let above = |i, j, k| field.get(i, j, k) >= isovalue;
    let mut count = 0;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let here = above(i, j, k);
                if i + 1 < nx && here != above(i + 1, j, k) {
                    count += 1;
                }
                if j + 1 < ny && here != above(i, j + 1, k) {
                    count += 1;
                }
                if k + 1 < nz && here != above(i, j, k + 1) {
                    count += 1;
                }
            }
        }
    }
    count
}

fn parallel(field: &ScalarField) -> MarchingCubes<'_> {
    MarchingCubes::with_config(
        field,
        ExtractConfig {
            parallel: true,
            ..Default::default()
        },
    )
}

#[test]
fn uniform_field_is_empty() {
    let field = ScalarField::filled(6, 5, 4, 0.3);
    for iso in [0.0, 0.29, 0.3, 0.31, 1.0] {
        let mesh = extract(&field, iso);
        assert!(mesh.is_empty(), "iso {iso} produced {} vertices", mesh.vertex_count());
    }
}

#[test]
fn isovalue_outside_range_is_empty() {
    let field = ScalarField::radial(10);
    assert!(extract(&field, -1.0).is_empty());
    assert!(extract(&field, 2.0).is_empty());
    assert!(parallel(&field).compute(2.0).is_empty());
}

#[test]
fn one_vertex_per_crossed_edge() {
    let field = wavy_field(9);
    for iso in [-0.4, 0.0, 0.25] {
        let expected = crossed_edge_count(&field, iso);
        assert!(expected > 0);
        assert_eq!(extract(&field, iso).vertex_count(), expected);
        assert_eq!(parallel(&field).compute(iso).vertex_count(), expected);
    }
}

#[test]
fn every_vertex_is_referenced() {
    let field = wavy_field(7);
    let mesh = extract(&field, 0.1);
    let mut used = vec![false; mesh.vertex_count()];
    for tri in mesh.triangles() {
        for &i in tri {
            used[i as usize] = true;
        }
    }
    assert!(used.iter().all(|&u| u));
}

#[test]
fn interpolated_position_is_exact() {
    let (a, b, iso) = (0.2_f32, 0.9_f32, 0.5_f32);
    let field = ScalarField::from_fn(2, 2, 2, |i, _, _| if i == 0 { a } else { b });
    let mesh = extract(&field, iso);
    assert_eq!(mesh.vertex_count(), 4);
    let expected = (iso - a) / (b - a);
    for n in 0..mesh.vertex_count() {
        assert_relative_eq!(mesh.position(n).x, expected, epsilon = 1e-6);
        assert_relative_eq!(mesh.normal(n).x, 1.0, epsilon = 1e-6);
    }

    // Same crossing in world space
    let transform = GridTransform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 2.0, 4.0));
    let mesh = MarchingCubes::with_config(
        &field,
        ExtractConfig {
            transform,
            ..Default::default()
        },
    )
    .compute(iso);
    let bounds = mesh.bounds().unwrap();
    assert_relative_eq!(bounds.min.x, 1.0 + 0.5 * expected, epsilon = 1e-6);
    assert_relative_eq!(bounds.max.x, 1.0 + 0.5 * expected, epsilon = 1e-6);
    assert_relative_eq!(bounds.min.y, 2.0);
    assert_relative_eq!(bounds.max.y, 4.0);
    assert_relative_eq!(bounds.min.z, 3.0);
    assert_relative_eq!(bounds.max.z, 7.0);
}

#[test]
fn radial_field_gives_sphere() {
    for n in [8, 16] {
        let field = ScalarField::radial(n);
        let mesh = extract(&field, 0.5);
        assert!(mesh.triangle_count() > 0);

        let half = (n - 1) as f32 / 2.0;
        let center = Vec3::splat(half);
        let radius = half * 3.0_f32.sqrt() * 0.5;
        for p in mesh.positions() {
            let r = Vec3::from_array(*p).distance(center);
            assert!((r - radius).abs() < 0.1, "n {n}: vertex at r {r}, expected {radius}");
        }
        for (p, nrm) in mesh.positions().iter().zip(mesh.normals()) {
            // Values grow towards the centre
            let outward = Vec3::from_array(*p) - center;
            assert!(Vec3::from_array(*nrm).dot(outward) < 0.0);
        }
    }
}

#[test]
fn triangle_count_grows_with_area() {
    let coarse = extract(&ScalarField::radial(16), 0.5).triangle_count();
    let fine = extract(&ScalarField::radial(32), 0.5).triangle_count();
    let ratio = fine as f32 / coarse as f32;
    assert!((3.0..5.5).contains(&ratio), "ratio {ratio}");
}

#[test]
fn winding_agrees_with_normals() {
    let field = ScalarField::radial(16);
    let mesh = extract(&field, 0.5);
    for n in 0..mesh.triangle_count() {
        let face = mesh.face_normal(n);
        if face.length_squared() < 1e-12 {
            continue;
        }
        let vertex_normals: Vec3 = mesh.triangle(n).iter().map(|&i| mesh.normal(i as usize)).sum();
        assert!(face.dot(vertex_normals) > 0.0, "triangle {n} faces away from its normals");
    }
}

#[test]
fn repeated_extraction_is_identical() {
    let field = wavy_field(8);
    let extractor = MarchingCubes::new(&field);
    let first = extractor.compute(0.2);
    let _other = extractor.compute(-0.3);
    let again = extractor.compute(0.2);
    assert_eq!(first, again);

    let extractor = parallel(&field);
    assert_eq!(extractor.compute(0.2), extractor.compute(0.2));
}

#[test]
fn parallel_matches_sequential() {
    let field = wavy_field(10);
    let sequential = extract(&field, 0.15);
    let parallel = parallel(&field).compute(0.15);
    assert_eq!(sequential.vertex_count(), parallel.vertex_count());
    assert_eq!(sequential.triangle_count(), parallel.triangle_count());

    let nearest = |mesh: &Mesh, p: Vec3| {
        (0..mesh.vertex_count())
            .min_by(|&a, &b| {
                let da = mesh.position(a).distance_squared(p);
                let db = mesh.position(b).distance_squared(p);
                da.total_cmp(&db)
            })
            .unwrap()
    };

    // Map every sequential vertex onto its parallel twin, then compare triangles
    let twin: Vec<u32> = (0..sequential.vertex_count())
        .map(|n| {
            let m = nearest(&parallel, sequential.position(n));
            assert!(parallel.position(m).distance(sequential.position(n)) < 1e-5);
            m as u32
        })
        .collect();

    let canonical = |tri: [u32; 3]| {
        // Rotate so the smallest index leads, keeping winding
        let lead = (0..3).min_by_key(|&i| tri[i]).unwrap();
        [tri[lead], tri[(lead + 1) % 3], tri[(lead + 2) % 3]]
    };
    let mut expected: Vec<[u32; 3]> = sequential
        .triangles()
        .iter()
        .map(|t| canonical(t.map(|i| twin[i as usize])))
        .collect();
    let mut actual: Vec<[u32; 3]> = parallel.triangles().iter().map(|&t| canonical(t)).collect();
    expected.sort_unstable();
    actual.sort_unstable();
    assert_eq!(expected, actual);
}

#[test]
fn subsampling_odd_extent() {
    let field = ScalarField::from_fn(5, 4, 3, |i, j, k| (i * 100 + j * 10 + k) as f32);
    let half = field.subsampled();
    assert_eq!(half.dims(), [3, 2, 2]);

    // Last x block covers only the x = 4 slice
    let expected = [(4, 0, 0), (4, 1, 0), (4, 0, 1), (4, 1, 1)]
        .iter()
        .map(|&(i, j, k)| field.get(i, j, k))
        .sum::<f32>()
        / 4.0;
    assert_relative_eq!(half.get(2, 0, 0), expected);

    // Last z block covers only the z = 2 slice
    let expected = [(0, 0, 2), (1, 0, 2), (0, 1, 2), (1, 1, 2)]
        .iter()
        .map(|&(i, j, k)| field.get(i, j, k))
        .sum::<f32>()
        / 4.0;
    assert_relative_eq!(half.get(0, 0, 1), expected);
}

#[test]
fn extraction_from_imported_volume() {
    let path = std::env::temp_dir().join(format!("iso_engine_it_{}.dat", std::process::id()));
    let field = ScalarField::radial(12);
    field.export_dat(&path).unwrap();
    let imported = ScalarField::import_dat(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(imported.dims(), [12, 12, 12]);
    assert_relative_eq!(imported.at(UVec3::ZERO), field.at(UVec3::ZERO), epsilon = 1.0 / 4095.0);
    let mesh = extract(&imported, 0.5);
    assert!(mesh.triangle_count() > 0);
    assert_eq!(mesh.vertex_count(), crossed_edge_count(&imported, 0.5));
}
