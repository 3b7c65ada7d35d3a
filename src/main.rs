// SYNOID Montage Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_montage::config::MontageConfig;
use synoid_montage::generation::{GeminiClient, NarrationAudio, NarrationFailure};
use synoid_montage::inventory::{ClipInventory, ProbeFailure};
use synoid_montage::montage::{self, MontagePlanner, Plan};
use synoid_montage::state::StudioState;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "synoid-montage")]
#[command(about = "SYNOID Story Montage: narrated stories over your own clips", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a short story and its narration audio
    Story {
        /// Story idea
        #[arg(short, long)]
        prompt: String,

        /// Where to write the narration WAV
        #[arg(short, long, default_value = "narration.wav")]
        audio_out: PathBuf,

        /// Prebuilt voice name (overrides SYNOID_TTS_VOICE)
        #[arg(long)]
        voice: Option<String>,
    },

    /// List playable durations of the clips in a directory
    Probe {
        /// Directory with video clips
        #[arg(short, long)]
        clips: PathBuf,
    },

    /// Plan a montage covering a narration
    Plan {
        /// Directory with video clips
        #[arg(short, long)]
        clips: PathBuf,

        /// Narration WAV whose duration is covered
        #[arg(short, long, conflicts_with = "duration")]
        audio: Option<PathBuf>,

        /// Target duration in seconds (instead of --audio)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Write the plan as JSON for a renderer
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Plan a montage and preview it against the narration
    Preview {
        /// Directory with video clips
        #[arg(short, long)]
        clips: PathBuf,

        /// Narration WAV
        #[arg(short, long)]
        audio: PathBuf,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Full workflow: story, narration, clips, montage plan
    Run {
        /// Story idea
        #[arg(short, long)]
        prompt: String,

        /// Directory with video clips
        #[arg(short, long)]
        clips: PathBuf,

        /// Where to write the narration WAV
        #[arg(long, default_value = "narration.wav")]
        audio_out: PathBuf,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Write the plan as JSON for a renderer
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Preview the montage once planned
        #[arg(long)]
        preview: bool,
    },
}

fn planner_for(seed: Option<u64>) -> MontagePlanner<StdRng> {
    match seed {
        Some(s) => MontagePlanner::seeded(s),
        None => MontagePlanner::from_entropy(),
    }
}

async fn load_clips(dir: &Path) -> Result<ClipInventory> {
    if !dir.is_dir() {
        anyhow::bail!("Clip directory not found: {:?}", dir);
    }
    let (inventory, failures) = ClipInventory::probe_directory(dir).await;
    report_failures(&failures);
    if inventory.is_empty() && failures.is_empty() {
        warn!("No valid video files found in {:?}", dir);
    }
    Ok(inventory)
}

fn report_failures(failures: &[ProbeFailure]) {
    for failure in failures {
        println!("⚠️  Skipped {:?}: {}", failure.path, failure.reason);
    }
}

fn print_plan(plan: &Plan) {
    println!(
        "🎬 Montage plan: {} clips, {:.2}s of {:.2}s",
        plan.len(),
        plan.covered_duration,
        plan.target_duration
    );
    for (i, entry) in plan.entries.iter().enumerate() {
        println!(
            "   {:>2}. {} @ {:.2}s for {:.2}s",
            i + 1,
            entry.clip.name,
            entry.start_offset,
            entry.play_duration
        );
    }
    if let Some(advisory) = &plan.advisory {
        println!("⚠️  {}", advisory);
    }
}

fn export_if_requested(plan: &Plan, export: Option<&Path>) -> Result<()> {
    if let Some(path) = export {
        montage::write_plan(plan, path).context("Plan export failed")?;
        println!("💾 Plan exported: {:?}", path);
    }
    Ok(())
}

async fn generate_narration(
    config: MontageConfig,
    prompt: &str,
) -> std::result::Result<(String, NarrationAudio), NarrationFailure> {
    let client = GeminiClient::new(config)?;
    let outcome = client.generate_narration(prompt).await;
    match &outcome {
        Ok((story, _)) => println!("📖 {}", story.trim()),
        Err(NarrationFailure { story: Some(story), .. }) => {
            println!("📖 {}", story.trim());
            error!("[STUDIO] Failed to generate speech for the story above.");
        }
        Err(_) => {}
    }
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // Global panic handler: log panics instead of crashing silently
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("🚨 [SYNOID PANIC] at {}: {}", location, message);
    }));

    info!("--- SYNOID STORY MONTAGE v{} ---", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();
    let mut config = MontageConfig::from_env();

    match args.command {
        Commands::Story {
            prompt,
            audio_out,
            voice,
        } => {
            if let Some(v) = voice {
                config.voice = v;
            }
            let (_, audio) = generate_narration(config, &prompt).await?;
            audio.write_wav(&audio_out)?;
            println!(
                "🔊 Narration saved: {:?} ({:.2}s)",
                audio_out,
                audio.duration_secs()
            );
        }
        Commands::Probe { clips } => {
            let inventory = load_clips(&clips).await?;
            for clip in inventory.clips() {
                println!("🎞️  {:<40} {:>8.2}s", clip.name, clip.duration);
            }
            println!(
                "✅ {} clips, {:.2}s of footage",
                inventory.len(),
                inventory.total_duration()
            );
        }
        Commands::Plan {
            clips,
            audio,
            duration,
            seed,
            export,
        } => {
            let target = match (audio, duration) {
                (Some(path), _) => NarrationAudio::read_wav(&path)?.duration_secs(),
                (None, Some(d)) => d,
                (None, None) => anyhow::bail!("Pass either --audio or --duration"),
            };
            let inventory = load_clips(&clips).await?;
            let plan = planner_for(seed).plan(inventory.clips(), target);
            print_plan(&plan);
            if !plan.is_empty() {
                export_if_requested(&plan, export.as_deref())?;
            }
        }
        Commands::Preview { clips, audio, seed } => {
            let narration = NarrationAudio::read_wav(&audio)?;
            let inventory = load_clips(&clips).await?;
            let plan = planner_for(seed).plan(inventory.clips(), narration.duration_secs());
            print_plan(&plan);
            if plan.is_empty() {
                anyhow::bail!("Nothing to preview.");
            }
            montage::preview::run_preview(plan, &audio).await?;
        }
        Commands::Run {
            prompt,
            clips,
            audio_out,
            seed,
            export,
            preview,
        } => {
            let mut studio = StudioState::new();

            studio.begin_generation();
            let outcome = generate_narration(config, &prompt).await;
            if let Ok((_, audio)) = &outcome {
                audio.write_wav(&audio_out)?;
            }
            if !studio.finish_generation(outcome) {
                anyhow::bail!(studio.message.clone().unwrap_or_default());
            }

            let inventory = load_clips(&clips).await?;
            studio.replace_clips(inventory);

            let mut planner = planner_for(seed);
            let planned = studio.build_montage(&mut planner).cloned();
            let Some(plan) = planned else {
                let reason = studio.message.clone().unwrap_or_default();
                error!("{}", reason);
                anyhow::bail!(reason);
            };
            if let Some(message) = &studio.message {
                warn!("{}", message);
            }

            print_plan(&plan);
            export_if_requested(&plan, export.as_deref())?;
            if preview {
                montage::preview::run_preview(plan, &audio_out).await?;
            }
        }
    }

    Ok(())
}
