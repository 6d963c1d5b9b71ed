//! Corista CLI - karaoke companion: synced lyrics plus live voice effects.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corista")]
#[command(author, version, about = "Karaoke companion: synced lyrics + live voice effects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a karaoke session: scroll lyrics and optionally run the mic chain
    Play(commands::play::PlayArgs),

    /// Parse a lyric file and print the cue table
    Lyrics(commands::lyrics::LyricsArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Render a WAV file through the voice-effects chain offline
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Lyrics(args) => commands::lyrics::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
