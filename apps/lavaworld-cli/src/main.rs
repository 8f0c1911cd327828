use std::convert::Infallible;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lavaworld_assets::CreatureAsset;
use lavaworld_kernel::{
    Camera, ClockTick, DrawTarget, FrameOrchestrator, LavaScene, ManualSource, SceneConfig,
    SimulationClock,
};
use lavaworld_render::{DebugTextRenderer, Renderer};
use lavaworld_tools::{FrameInspector, FrameSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lavaworld-cli", about = "Headless lava world tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default scene parameters
    Info,
    /// Run the frame loop on a fixed-step clock without a window
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Rain RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Print a summary every N frames
        #[arg(long, default_value = "30")]
        every: u64,
        /// Emit per-frame summaries as JSON
        #[arg(long)]
        json: bool,
        /// Scene config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also load the configured creature model
        #[arg(long)]
        with_creature: bool,
    },
    /// Decode a creature model and list its contents
    InspectAsset {
        path: PathBuf,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective scene config as YAML
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Keeps the text dump of the latest frame instead of drawing pixels.
struct TextTarget {
    renderer: DebugTextRenderer,
    last: String,
}

impl DrawTarget for TextTarget {
    type Error = Infallible;

    fn draw(
        &mut self,
        scene: &LavaScene,
        camera: &Camera,
        _tick: &ClockTick,
    ) -> Result<(), Infallible> {
        self.last = self.renderer.render(scene, camera);
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    })
}

fn simulate(
    mut config: SceneConfig,
    frames: u64,
    fps: f64,
    every: u64,
    json: bool,
    with_creature: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0.0 && fps.is_finite(), "fps must be positive, got {fps}");
    if !with_creature {
        config.creature.path = None;
    }
    let camera = Camera::from_config(&config.camera, 16.0 / 9.0);

    let mut scene = LavaScene::new(config);
    scene.start_creature_load();
    let mut orch = FrameOrchestrator::new(scene, SimulationClock::new(ManualSource::new(0.0)));
    let mut target = TextTarget {
        renderer: DebugTextRenderer::new(),
        last: String::new(),
    };
    let step = 1.0 / fps;
    let every = every.max(1);
    let mut summaries: Vec<FrameSummary> = Vec::new();

    for i in 0..frames {
        if i > 0 {
            orch.clock_mut().source_mut().advance(step);
        }
        let report = orch.run_frame(&camera, &mut target, &|| {});
        let summary = FrameInspector::summary(orch.scene(), &report);
        if json {
            summaries.push(summary);
        } else if report.frame % every == 0 || report.frame == frames {
            println!("{summary}");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        println!();
        print!("{}", target.last);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let config = SceneConfig::default();
            println!("lavaworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "terrain: {}x{} units, {} segments",
                config.terrain.size, config.terrain.size, config.terrain.segments
            );
            println!(
                "wave: height={} frequency={}",
                config.wave.height, config.wave.frequency
            );
            println!(
                "rain: {} particles, speed [{}, {}] per frame",
                config.rain.count, config.rain.min_speed, config.rain.max_speed
            );
            println!(
                "light: radius={} speed={} rad/s color={}",
                config.light.radius, config.light.angular_speed, config.light.color
            );
            match &config.creature.path {
                Some(path) => println!("creature: {}", path.display()),
                None => println!("creature: none"),
            }
        }
        Commands::Simulate {
            frames,
            seed,
            fps,
            every,
            json,
            config,
            with_creature,
        } => {
            let mut config = load_config(config.as_ref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            simulate(config, frames, fps, every, json, with_creature)?;
        }
        Commands::InspectAsset { path, json } => {
            let asset = CreatureAsset::load(&path)?;
            let info = FrameInspector::asset(&asset);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print!("{info}");
            }
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
