//! Integration tests for meshforge-build.

use meshforge_build::cacheopt::{
    cache_optimize_vertex_and_index_buffer, optimize_triangle_order,
};
use meshforge_build::overlap::find_overlapping_wedges;
use meshforge_build::tangents::{compute_tangents, TangentOptions};
use meshforge_build::weld::weld_vertices;
use meshforge_build::{SourceModel, StaticMeshBuilder, TriangleOrderStrategy};
use meshforge_math::Vec3;
use meshforge_mesh::{generators, RawMesh};
use meshforge_types::constants::THRESH_POINTS_ARE_SAME;
use meshforge_types::MeshForgeError;
use std::collections::BTreeMap;

// ─── Overlap Tests ────────────────────────────────────────────

#[test]
fn overlap_map_is_symmetric() {
    for mesh in [
        generators::quad(1.0),
        generators::grid(5, 3, 2.5),
        generators::cuboid(Vec3::new(1.0, 2.0, 3.0)),
    ] {
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        for w in 0..mesh.wedge_count() as u32 {
            for &other in overlaps.overlaps(w) {
                assert!(
                    overlaps.overlaps(other).contains(&w),
                    "wedge {w} maps to {other} but not back"
                );
            }
        }
    }
}

#[test]
fn overlap_respects_threshold() {
    let mut mesh = generators::quad(1.0);
    // Nudge vertex 0 just past the threshold from its old spot; wedges that
    // resolve to different vertices no longer overlap, same-vertex wedges
    // always do.
    mesh.vertex_positions[0].x += THRESH_POINTS_ARE_SAME * 3.0;
    let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
    // Wedges 0 and 3 both resolve to vertex 0 and still coincide exactly.
    assert!(overlaps.overlaps(0).contains(&3));
}

// ─── Tangent Tests ────────────────────────────────────────────

#[test]
fn tangent_bases_are_orthonormal() {
    for mut mesh in [
        generators::quad(1.0),
        generators::grid(4, 4, 10.0),
        generators::cuboid(Vec3::splat(5.0)),
    ] {
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        for w in 0..mesh.wedge_count() {
            let tx = mesh.wedge_tangent_x[w];
            let tz = mesh.wedge_tangent_z[w];
            assert!((tx.length() - 1.0).abs() < 1e-3, "wedge {w}: |Tx| = {}", tx.length());
            assert!((tz.length() - 1.0).abs() < 1e-3, "wedge {w}: |Tz| = {}", tz.length());
            assert!(tx.dot(tz).abs() < 1e-3, "wedge {w}: Tx·Tz = {}", tx.dot(tz));
        }
    }
}

#[test]
fn cuboid_corners_stay_hard_across_smoothing_groups() {
    let mut mesh = generators::cuboid(Vec3::splat(1.0));
    // One smoothing group per box face.
    for face in 0..mesh.face_count() {
        mesh.face_smoothing_masks[face] = 1 << (face / 2);
    }
    let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
    compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
    // Every face's normals must equal its geometric normal, no blending
    // across the hard corners.
    for face in 0..mesh.face_count() {
        let p0 = mesh.wedge_position(face * 3);
        let p1 = mesh.wedge_position(face * 3 + 1);
        let p2 = mesh.wedge_position(face * 3 + 2);
        let geometric = (p1 - p2).cross(p0 - p2).normalize();
        for corner in 0..3 {
            let normal = mesh.wedge_tangent_z[face * 3 + corner];
            assert!(
                normal.dot(geometric) > 0.999,
                "face {face} corner {corner} blended across a hard edge"
            );
        }
    }
}

// ─── Weld Tests ───────────────────────────────────────────────

/// Feeding a mesh with one wedge per unique vertex (no duplicates in any
/// attribute) through the welder must keep the vertex count.
#[test]
fn weld_is_idempotent_on_unique_vertices() {
    let mut mesh = generators::grid(3, 3, 1.0);
    let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
    compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
    let first = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);

    // Rebuild a raw mesh whose wedges are exactly the welded vertices.
    let mut rewelded = RawMesh {
        vertex_positions: first.vertices.iter().map(|v| v.position).collect(),
        ..RawMesh::default()
    };
    for &index in &first.per_section_indices[0] {
        let v = &first.vertices[index as usize];
        rewelded.wedge_indices.push(index);
        rewelded.wedge_tangent_x.push(v.tangent_x);
        rewelded.wedge_tangent_y.push(v.tangent_y);
        rewelded.wedge_tangent_z.push(v.tangent_z);
        rewelded.wedge_tex_coords[0].push(v.uvs[0]);
    }
    for _ in 0..rewelded.face_count() {
        rewelded.face_material_indices.push(0);
        rewelded.face_smoothing_masks.push(1);
    }

    let overlaps = find_overlapping_wedges(&rewelded, THRESH_POINTS_ARE_SAME);
    let second = weld_vertices(&rewelded, &overlaps, THRESH_POINTS_ARE_SAME);
    assert_eq!(second.vertices.len(), first.vertices.len());
}

#[test]
fn materials_split_into_sections() {
    let mut mesh = generators::quad(1.0);
    mesh.face_material_indices = vec![0, 2];
    let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
    compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
    let output = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);
    assert_eq!(output.per_section_indices[0].len(), 3);
    assert_eq!(output.per_section_indices[2].len(), 3);
    assert!(output.per_section_indices[1].is_empty());
}

// ─── Cache Optimizer Tests ────────────────────────────────────

fn triangle_multiset(indices: &[u32]) -> BTreeMap<[u32; 3], usize> {
    let mut set = BTreeMap::new();
    for triple in indices.chunks_exact(3) {
        let mut key = [triple[0], triple[1], triple[2]];
        key.sort_unstable();
        *set.entry(key).or_insert(0) += 1;
    }
    set
}

#[test]
fn every_strategy_preserves_welded_triangles() {
    let mut mesh = generators::grid(6, 6, 3.0);
    let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
    compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
    let welded = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);
    let expected = triangle_multiset(&welded.per_section_indices[0]);

    for strategy in [
        TriangleOrderStrategy::StripList,
        TriangleOrderStrategy::CacheAwareScore,
        TriangleOrderStrategy::Preserve,
    ] {
        let mut indices = welded.per_section_indices[0].clone();
        optimize_triangle_order(indices.as_mut_slice(), strategy);
        assert_eq!(triangle_multiset(&indices), expected, "{strategy:?}");
    }
}

#[test]
fn reindex_preserves_geometry_for_every_strategy() {
    for strategy in [
        TriangleOrderStrategy::StripList,
        TriangleOrderStrategy::CacheAwareScore,
        TriangleOrderStrategy::Preserve,
    ] {
        let mut mesh = generators::grid(4, 4, 2.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        let mut welded = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);

        // Record triangles by position so renumbering doesn't matter.
        let positions_of = |vertices: &[meshforge_build::BuildVertex], indices: &[u32]| {
            let mut triangles: Vec<[[i32; 3]; 3]> = indices
                .chunks_exact(3)
                .map(|t| {
                    let mut corners: Vec<[i32; 3]> = t
                        .iter()
                        .map(|&i| {
                            let p = vertices[i as usize].position * 1000.0;
                            [p.x.round() as i32, p.y.round() as i32, p.z.round() as i32]
                        })
                        .collect();
                    corners.sort_unstable();
                    [corners[0], corners[1], corners[2]]
                })
                .collect();
            triangles.sort_unstable();
            triangles
        };
        let before = positions_of(&welded.vertices, &welded.per_section_indices[0]);

        cache_optimize_vertex_and_index_buffer(
            &mut welded.vertices,
            &mut welded.per_section_indices,
            &mut welded.wedge_map,
            strategy,
        );
        let after = positions_of(&welded.vertices, &welded.per_section_indices[0]);
        assert_eq!(before, after, "{strategy:?}");

        // Wedge map still points at the wedge's own position.
        for (wedge, entry) in welded.wedge_map.iter().enumerate() {
            let vertex = entry.expect("no degenerate faces in a grid");
            let expected = mesh.wedge_position(wedge);
            let actual = welded.vertices[vertex as usize].position;
            assert!((expected - actual).length() < 1e-5);
        }
    }
}

// ─── Orchestrator Tests ───────────────────────────────────────

#[test]
fn quad_end_to_end() {
    let models = vec![SourceModel {
        raw_mesh: Some(generators::quad(1.0)),
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("quad", None, None);
    let data = builder.build(&models).unwrap();

    assert_eq!(data.lods.len(), 1);
    let lod = &data.lods[0];
    assert_eq!(lod.vertices.len(), 4);
    assert_eq!(lod.indices.len(), 6);
    assert_eq!(lod.sections.len(), 1);
    assert_eq!(lod.sections[0].num_triangles, 2);

    // A coplanar quad blends to parallel tangent bases.
    let reference = lod.vertices[0];
    for vertex in &lod.vertices {
        assert!(vertex.tangent_x.dot(reference.tangent_x) > 1.0 - 1e-3);
        assert!(vertex.tangent_z.dot(reference.tangent_z) > 1.0 - 1e-3);
    }

    // The wedge map covers all six wedges of the unreduced LOD0.
    assert_eq!(data.wedge_map.len(), 6);
    assert!(data.wedge_map.iter().all(Option::is_some));
}

#[test]
fn fully_degenerate_mesh_fails_the_lod() {
    // All wedges collapse onto one point.
    let mesh = RawMesh {
        vertex_positions: vec![Vec3::ZERO],
        wedge_indices: vec![0, 0, 0],
        face_material_indices: vec![0],
        face_smoothing_masks: vec![1],
        ..RawMesh::default()
    };
    let models = vec![SourceModel {
        raw_mesh: Some(mesh),
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("degenerate", None, None);
    let error = builder.build(&models).unwrap_err();
    assert!(matches!(
        error,
        MeshForgeError::DegenerateGeometry { lod: 0, .. }
    ));
}

#[test]
fn aux_buffers_are_emitted_when_requested() {
    let models = vec![SourceModel {
        raw_mesh: Some(generators::cuboid(Vec3::splat(1.0))),
        build_settings: meshforge_build::BuildSettings {
            build_reversed_index_buffer: true,
            build_adjacency_buffer: true,
            ..meshforge_build::BuildSettings::default()
        },
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("box", None, None);
    let data = builder.build(&models).unwrap();
    let lod = &data.lods[0];

    let reversed = lod.reversed_indices.as_ref().unwrap();
    assert_eq!(reversed.len(), lod.indices.len());
    let adjacency = lod.adjacency_indices.as_ref().unwrap();
    assert_eq!(adjacency.len(), lod.indices.len() * 4);
    assert!(!lod.depth_only_indices.is_empty());
}

#[test]
fn mikktspace_path_builds_the_same_quad() {
    let models = vec![SourceModel {
        raw_mesh: Some(generators::quad(1.0)),
        build_settings: meshforge_build::BuildSettings {
            use_mikk_t_space: true,
            ..meshforge_build::BuildSettings::default()
        },
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("quad", None, None);
    let data = builder.build(&models).unwrap();
    assert_eq!(data.lods[0].vertices.len(), 4);
    for vertex in &data.lods[0].vertices {
        assert!((vertex.tangent_x.length() - 1.0).abs() < 1e-3);
        assert!((vertex.tangent_z.length() - 1.0).abs() < 1e-3);
    }
}
