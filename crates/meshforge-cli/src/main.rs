//! meshforge CLI — build meshes, generate distance fields, validate input.

use clap::{Parser, Subcommand};

mod commands;

use commands::Shape;

#[derive(Parser)]
#[command(name = "meshforge")]
#[command(version, about = "meshforge — raw mesh to renderable mesh build pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mesh through the full build pipeline and print stats.
    Build {
        /// Path to a raw mesh (JSON). Mutually exclusive with --shape.
        #[arg(short, long)]
        input: Option<String>,

        /// Procedural shape to build instead of a file.
        #[arg(short, long, value_enum)]
        shape: Option<Shape>,

        /// Use MikkTSpace for tangent generation.
        #[arg(long)]
        mikktspace: bool,

        /// Triangle ordering: strip_list, cache_aware_score, preserve.
        #[arg(long, default_value = "cache_aware_score")]
        triangle_order: String,

        /// Also build reversed-winding and adjacency index buffers.
        #[arg(long)]
        aux_buffers: bool,

        /// Write the built render data to this path (JSON).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Build a mesh and voxelize it into a signed distance field.
    DistanceField {
        /// Path to a raw mesh (JSON). Mutually exclusive with --shape.
        #[arg(short, long)]
        input: Option<String>,

        /// Procedural shape to voxelize instead of a file.
        #[arg(short, long, value_enum)]
        shape: Option<Shape>,

        /// Voxel density multiplier.
        #[arg(long, default_value_t = 1.0)]
        resolution_scale: f32,

        /// Treat all triangles as two-sided.
        #[arg(long)]
        two_sided: bool,

        /// Write the volume to this path (JSON).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check the structural invariants of a raw mesh file.
    Validate {
        /// Path to a raw mesh (JSON).
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Build {
            input,
            shape,
            mikktspace,
            triangle_order,
            aux_buffers,
            output,
        } => commands::build(
            input.as_deref(),
            shape,
            mikktspace,
            &triangle_order,
            aux_buffers,
            output.as_deref(),
        ),
        Commands::DistanceField {
            input,
            shape,
            resolution_scale,
            two_sided,
            output,
        } => commands::distance_field(
            input.as_deref(),
            shape,
            resolution_scale,
            two_sided,
            output.as_deref(),
        ),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
