//! Procedural wedge-mesh generators for tests and the CLI.
//!
//! All generators are deterministic, wind faces so that the pipeline's face
//! normal convention `cross(p1 - p2, p0 - p2)` points along the intended
//! outward direction, and tag every face with material 0 and smoothing
//! mask 1 unless noted otherwise.

use meshforge_math::{Vec2, Vec3};

use crate::raw::RawMesh;

/// Appends one triangle to `mesh`, flipping the corner order if needed so
/// the face normal points along `outward`.
fn push_triangle(mesh: &mut RawMesh, corners: [u32; 3], uvs: [Vec2; 3], outward: Vec3) {
    let p = |i: u32| mesh.vertex_positions[i as usize];
    let [a, b, c] = corners;
    let normal = (p(b) - p(c)).cross(p(a) - p(c));
    let (corners, uvs) = if normal.dot(outward) >= 0.0 {
        (corners, uvs)
    } else {
        ([corners[0], corners[2], corners[1]], [uvs[0], uvs[2], uvs[1]])
    };
    mesh.wedge_indices.extend_from_slice(&corners);
    mesh.wedge_tex_coords[0].extend_from_slice(&uvs);
    mesh.face_material_indices.push(0);
    mesh.face_smoothing_masks.push(1);
}

/// A two-triangle unit quad in the XY plane: 4 unique positions, 6 wedges,
/// one smoothing group, one material, UVs matching the corner positions.
pub fn quad(size: f32) -> RawMesh {
    let mut mesh = RawMesh {
        vertex_positions: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(size, size, 0.0),
            Vec3::new(0.0, size, 0.0),
        ],
        ..Default::default()
    };
    let uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    push_triangle(&mut mesh, [0, 1, 2], [uv[0], uv[1], uv[2]], Vec3::Z);
    push_triangle(&mut mesh, [0, 2, 3], [uv[0], uv[2], uv[3]], Vec3::Z);
    mesh
}

/// A flat `cols × rows` grid of quads in the XY plane spanning
/// `[0, size]` on both axes.
pub fn grid(cols: usize, rows: usize, size: f32) -> RawMesh {
    let verts_x = cols + 1;
    let verts_y = rows + 1;
    let mut mesh = RawMesh::default();

    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f32 / cols as f32;
            let v = j as f32 / rows as f32;
            mesh.vertex_positions.push(Vec3::new(u * size, v * size, 0.0));
        }
    }

    for j in 0..rows {
        for i in 0..cols {
            let v00 = (j * verts_x + i) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + verts_x as u32;
            let v11 = v01 + 1;
            let uv = |v: u32| {
                let i = (v as usize % verts_x) as f32 / cols as f32;
                let j = (v as usize / verts_x) as f32 / rows as f32;
                Vec2::new(i, j)
            };
            push_triangle(&mut mesh, [v00, v10, v11], [uv(v00), uv(v10), uv(v11)], Vec3::Z);
            push_triangle(&mut mesh, [v00, v11, v01], [uv(v00), uv(v11), uv(v01)], Vec3::Z);
        }
    }
    mesh
}

/// A closed axis-aligned box centered at the origin. 8 unique positions,
/// 12 triangles, all faces wound outward.
pub fn cuboid(half_extent: Vec3) -> RawMesh {
    let h = half_extent;
    let mut mesh = RawMesh {
        vertex_positions: vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ],
        ..Default::default()
    };

    // (corner indices, outward normal) per face.
    let faces: [([u32; 4], Vec3); 6] = [
        ([0, 3, 2, 1], -Vec3::Z),
        ([4, 5, 6, 7], Vec3::Z),
        ([0, 1, 5, 4], -Vec3::Y),
        ([2, 3, 7, 6], Vec3::Y),
        ([0, 4, 7, 3], -Vec3::X),
        ([1, 2, 6, 5], Vec3::X),
    ];
    let uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    for (corners, outward) in faces {
        push_triangle(
            &mut mesh,
            [corners[0], corners[1], corners[2]],
            [uv[0], uv[1], uv[2]],
            outward,
        );
        push_triangle(
            &mut mesh,
            [corners[0], corners[2], corners[3]],
            [uv[0], uv[2], uv[3]],
            outward,
        );
    }
    mesh
}
