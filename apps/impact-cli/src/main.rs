use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use impact_assets::MeshStore;
use impact_physics::{MassPropertiesCalculator, PhysicsConfig, PhysicsWorld, Scene};
use impact_tools::PhysicsInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "impact-cli", about = "Rigid-body physics demos and tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML physics config; defaults apply to missing keys
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective physics config
    Info,
    /// Drop a unit cube onto a resting one and trace every tick
    Drop {
        /// Number of fixed ticks to simulate
        #[arg(short, long, default_value = "30")]
        ticks: u64,
        /// Initial height of the falling cube's center
        #[arg(long, default_value = "0.9")]
        height: f32,
        /// Initial downward speed
        #[arg(short, long, default_value = "2.0")]
        speed: f32,
    },
    /// Scatter a grid of moving cubes and print a report per tick
    Scatter {
        /// Cubes per grid side
        #[arg(short, long, default_value = "4")]
        side: usize,
        /// Number of fixed ticks to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u64,
    },
    /// Import an OBJ mesh and print its mass properties
    Mass {
        path: PathBuf,
        /// Uniform density
        #[arg(short, long, default_value = "1.0")]
        density: f32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("impact-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("{config:#?}");
        }
        Commands::Drop {
            ticks,
            height,
            speed,
        } => {
            let mut scene = Scene::new();
            let falling = scene.spawn_cube(Vec3::new(0.0, height, 0.0), 1.0);
            let resting = scene.spawn_cube(Vec3::ZERO, 1.0);
            scene.components.set_name(falling, "falling");
            scene.components.set_name(resting, "resting");

            tracing::info!(ticks, height, speed, "running drop");
            let mut physics = PhysicsWorld::new(config)?;
            physics.load_all(&mut scene)?;
            if let Some(body) = physics.body_mut(falling) {
                body.velocity = Vec3::new(0.0, -speed, 0.0);
            }

            for _ in 0..ticks {
                let report = physics.fixed_update(&mut scene)?;
                for contact in &report.contacts {
                    println!(
                        "tick {}: contact at ({:.3}, {:.3}, {:.3}) from {} hits, impulse {:?}",
                        report.tick,
                        contact.point.x,
                        contact.point.y,
                        contact.point.z,
                        contact.hits,
                        contact.impulse
                    );
                }
                for id in [falling, resting] {
                    if let Some(info) = PhysicsInspector::body_info(&physics, &scene.world, id) {
                        println!("  {info}");
                    }
                }
            }
            println!("{}", PhysicsInspector::summary(&physics));
        }
        Commands::Scatter { side, ticks } => {
            let mut scene = Scene::new();
            let mut ids = Vec::with_capacity(side * side * 2);
            for x in 0..side {
                for z in 0..side {
                    let base = Vec3::new(x as f32 * 1.1, 0.0, z as f32 * 1.1);
                    ids.push(scene.spawn_cube(base, 1.0));
                    ids.push(scene.spawn_cube(base + Vec3::new(0.25, 1.05, 0.1), 1.0));
                }
            }

            tracing::info!(side, ticks, "running scatter");
            let mut physics = PhysicsWorld::new(config)?;
            let loaded = physics.load_all(&mut scene)?;
            println!("Loaded {loaded} bodies");
            for (i, id) in ids.iter().enumerate() {
                if let Some(body) = physics.body_mut(*id) {
                    let lateral = (i % 3) as f32 - 1.0;
                    body.velocity = Vec3::new(lateral, -1.5, -lateral * 0.5);
                }
            }

            for _ in 0..ticks {
                let report = physics.fixed_update(&mut scene)?;
                println!(
                    "tick {}: candidates={} contacts={} impulses={}",
                    report.tick,
                    report.candidates,
                    report.contacts.len(),
                    report.impulses()
                );
            }
            println!("{}", PhysicsInspector::summary(&physics));
            println!("state hash: {:#x}", scene.world.state_hash());
        }
        Commands::Mass { path, density } => {
            tracing::info!(path = %path.display(), density, "computing mass properties");
            let mut meshes = MeshStore::new();
            let handle = meshes
                .import_obj(&path)
                .with_context(|| format!("importing {}", path.display()))?;
            let mesh = meshes.require(handle)?;
            let props = MassPropertiesCalculator::new(density)?.compute(mesh)?;
            println!(
                "{}: {} vertices, {} triangles",
                mesh.name(),
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            println!("volume: {:.6}", props.volume);
            println!("mass: {:.6}", props.mass);
            let c = props.center_of_mass;
            println!("center of mass: ({:.6}, {:.6}, {:.6})", c.x, c.y, c.z);
            for row in 0..3 {
                let r = props.inertia.row(row);
                println!("inertia[{row}]: {:>12.6} {:>12.6} {:>12.6}", r.x, r.y, r.z);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PhysicsConfig> {
    match path {
        Some(path) => {
            let config = PhysicsConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            tracing::info!(path = %path.display(), fixed_dt = config.fixed_dt, "physics config loaded");
            Ok(config)
        }
        None => {
            tracing::info!("using default physics config");
            Ok(PhysicsConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.fixed_dt, PhysicsConfig::default().fixed_dt);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "restitution: 0.25").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.restitution, 0.25);
    }

    #[test]
    fn unreadable_config_names_the_path() {
        let err = load_config(Some(Path::new("/nonexistent/physics.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/physics.yaml"));
    }
}
