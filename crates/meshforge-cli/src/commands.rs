//! CLI command implementations.

use clap::ValueEnum;
use meshforge_build::{
    BuildSettings, SourceModel, StaticMeshBuilder, TriangleOrderStrategy,
};
use meshforge_distfield::{generate_distance_field_volume, DistanceFieldSettings};
use meshforge_math::Vec3;
use meshforge_mesh::{generators, RawMesh};
use meshforge_types::BlendMode;

/// Built-in procedural test shapes.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shape {
    Quad,
    Grid,
    Cuboid,
}

fn load_mesh(
    input: Option<&str>,
    shape: Option<Shape>,
) -> Result<RawMesh, Box<dyn std::error::Error>> {
    match (input, shape) {
        (Some(path), None) => {
            let data = std::fs::read_to_string(path)?;
            let mesh: RawMesh = serde_json::from_str(&data)
                .map_err(|e| format!("Failed to parse raw mesh from {path}: {e}"))?;
            Ok(mesh)
        }
        (None, Some(Shape::Quad)) => Ok(generators::quad(100.0)),
        (None, Some(Shape::Grid)) => Ok(generators::grid(8, 8, 100.0)),
        (None, Some(Shape::Cuboid)) => Ok(generators::cuboid(Vec3::splat(50.0))),
        (None, None) => Err("Provide either --input or --shape".into()),
        (Some(_), Some(_)) => Err("--input and --shape are mutually exclusive".into()),
    }
}

fn parse_strategy(name: &str) -> Result<TriangleOrderStrategy, Box<dyn std::error::Error>> {
    match name {
        "strip_list" => Ok(TriangleOrderStrategy::StripList),
        "cache_aware_score" => Ok(TriangleOrderStrategy::CacheAwareScore),
        "preserve" => Ok(TriangleOrderStrategy::Preserve),
        other => Err(format!(
            "Unknown triangle order: '{other}'. Available: strip_list, cache_aware_score, preserve"
        )
        .into()),
    }
}

/// Run a mesh through the full build pipeline.
pub fn build(
    input: Option<&str>,
    shape: Option<Shape>,
    mikktspace: bool,
    triangle_order: &str,
    aux_buffers: bool,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(input, shape)?;
    let settings = BuildSettings {
        use_mikk_t_space: mikktspace,
        triangle_order: parse_strategy(triangle_order)?,
        build_reversed_index_buffer: aux_buffers,
        build_adjacency_buffer: aux_buffers,
        ..BuildSettings::default()
    };

    println!("meshforge build");
    println!("───────────────");
    println!("Faces:    {}", mesh.face_count());
    println!("Wedges:   {}", mesh.wedge_count());
    println!();

    let models = vec![SourceModel {
        raw_mesh: Some(mesh),
        build_settings: settings,
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("cli-mesh", None, None);
    let data = builder.build(&models)?;

    for (level, lod) in data.lods.iter().enumerate() {
        println!(
            "LOD {level}: {} vertices, {} triangles, {} sections",
            lod.vertices.len(),
            lod.indices.len() / 3,
            lod.sections.len(),
        );
    }
    println!(
        "Bounds:   origin ({:.2}, {:.2}, {:.2}), radius {:.2}",
        data.bounds.origin.x, data.bounds.origin.y, data.bounds.origin.z, data.bounds.sphere_radius
    );

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&data)?)?;
        println!("Render data written to: {path}");
    }
    Ok(())
}

/// Build a mesh, then voxelize it into a signed distance field.
pub fn distance_field(
    input: Option<&str>,
    shape: Option<Shape>,
    resolution_scale: f32,
    two_sided: bool,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(input, shape)?;
    let models = vec![SourceModel {
        raw_mesh: Some(mesh),
        ..SourceModel::default()
    }];
    let mut builder = StaticMeshBuilder::new("cli-mesh", None, None);
    let data = builder.build(&models)?;

    let settings = DistanceFieldSettings {
        resolution_scale,
        treat_as_two_sided: two_sided,
    };
    let volume =
        generate_distance_field_volume(&data.lods[0], &[BlendMode::Opaque], &data.bounds, &settings);

    println!("meshforge distance field");
    println!("────────────────────────");
    println!(
        "Dimensions:  {} x {} x {}",
        volume.dimensions.x, volume.dimensions.y, volume.dimensions.z
    );
    println!("Closed:      {}", volume.mesh_was_closed);
    println!("Plane:       {}", volume.mesh_was_plane);
    println!("Two-sided:   {}", volume.built_as_if_two_sided);
    if volume.is_empty() {
        println!("Volume was discarded (open mesh or generation disabled).");
    }

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&volume)?)?;
        println!("Volume written to: {path}");
    }
    Ok(())
}

/// Check the structural invariants of a raw mesh file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    let mesh: RawMesh = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse raw mesh from {path}: {e}"))?;

    println!("meshforge validate");
    println!("──────────────────");
    println!("Positions:  {}", mesh.vertex_positions.len());
    println!("Faces:      {}", mesh.face_count());
    println!("UV sets:    {}", mesh.num_tex_coords(usize::MAX));
    println!("Tangents:   {}", if mesh.has_full_tangent_basis() { "full" } else { "missing" });

    mesh.validate(path, 0)?;
    println!();
    println!("OK");
    Ok(())
}
