use std::{path::PathBuf, time::Instant};

use beatlight_core::{
    compute_output_params, AppConfig, AutoSceneScheduler, BeatlightError, Engine, FrameLoop,
    InternalClock, RealtimeStore, RenderGraph, SceneCollection, SharedAutoScene, SharedScenes,
    TempoSource,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beatlight_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            config,
            seconds,
            seed,
        } => run_live(config.as_ref(), seconds, seed),
        Commands::Eval {
            config,
            beat,
            scene,
            split,
        } => run_eval(config.as_ref(), beat, scene, split),
    }
}

fn load_config(path: Option<&PathBuf>) -> beatlight_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn run_live(
    config: Option<&PathBuf>,
    seconds: f64,
    seed: Option<u64>,
) -> beatlight_core::Result<()> {
    let config = load_config(config)?;
    tracing::info!(bpm = config.tempo.bpm, seconds, "starting live mode");

    let scenes = SharedScenes::new(SceneCollection::new(config.scenes_or_demo()));
    let auto_scene = SharedAutoScene::new(config.auto_scene);
    let realtime = RealtimeStore::new();

    let mut clock = InternalClock::new(config.tempo.bpm);
    clock.set_enabled(config.tempo.enabled);

    let scheduler = match seed {
        Some(seed) => AutoSceneScheduler::with_seed(seed),
        None => AutoSceneScheduler::new(),
    };
    let mut engine = Engine::new(config.engine, scenes, realtime.clone(), RenderGraph::new())
        .with_tempo_source(clock)
        .with_auto_scene(auto_scene)
        .with_scheduler(scheduler);

    let mut frame_loop = FrameLoop::new(&config.engine);
    let started = Instant::now();
    let stats = frame_loop.run(&mut engine, |_, _| started.elapsed().as_secs_f64() < seconds);

    if let Some(snapshot) = realtime.latest() {
        tracing::info!(
            beat = snapshot.time.beat,
            bpm = snapshot.time.bpm,
            "last published frame"
        );
    }
    tracing::info!(
        rendered = stats.rendered,
        skipped = stats.skipped,
        idle = stats.idle,
        scene_changes = stats.scene_changes,
        engine_time_ms = engine.engine_time_ms(),
        "live mode finished"
    );
    Ok(())
}

fn run_eval(
    config: Option<&PathBuf>,
    beat: f64,
    scene: usize,
    split: Option<usize>,
) -> beatlight_core::Result<()> {
    let config = load_config(config)?;
    let scenes = config.scenes_or_demo();
    let scene = scenes.get(scene).ok_or_else(|| {
        BeatlightError::msg(format!(
            "scene {scene} does not exist, {} configured",
            scenes.len()
        ))
    })?;

    let params = compute_output_params(beat, scene, split)?;
    let json = serde_json::to_string_pretty(&params)?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tempo-synced lighting modulation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the frame loop against the internal tempo clock.
    Live {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// How long to run before exiting.
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,
        /// Seed for auto-scene selection, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the output parameters of one scene at one beat position.
    Eval {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Beat position to evaluate at.
        #[arg(short, long)]
        beat: f64,
        /// Scene index.
        #[arg(long, default_value_t = 0)]
        scene: usize,
        /// Split index; omit for the scene root.
        #[arg(long)]
        split: Option<usize>,
    },
}
