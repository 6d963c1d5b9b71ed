//! The karaoke session: scrolling lyrics plus the live mic chain.
//!
//! One cooperative loop drives everything, the way the core is designed to
//! be driven: the lyric sampler polls the playback position at frame rate,
//! and the mic controller is pumped in between so pending device
//! acquisitions resolve without blocking lyric scrolling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;

use corista_config::SessionConfig;
use corista_engine::{
    CaptureConfig, CpalCaptureBackend, CpalRealizer, MicController, MicEvent, Player,
};
use corista_lyrics::{PositionSource, Sampler, parse};

use super::EffectFlags;

/// Built-in demo sheet, used when no lyric file is given.
const DEMO_LYRICS: &str = "\
[00:00.00] Corista - clear the stage
[00:04.00] Lights up, find your cue
[00:08.00] Sing it like the record
[00:12.00] Hold the long note through
[00:16.00] Corista - take a bow
";

#[derive(Args)]
pub struct PlayArgs {
    /// Session configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lyric file (LRC-style timestamped text)
    #[arg(long)]
    lyrics: Option<PathBuf>,

    /// Instrumental WAV to play along
    #[arg(long)]
    instrumental: Option<PathBuf>,

    /// Enable the live microphone chain
    #[arg(long)]
    mic: bool,

    #[command(flatten)]
    effects: EffectFlags,

    /// Playback volume override (0.0 to 1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Playback rate override (0.25 to 4.0)
    #[arg(long)]
    rate: Option<f32>,
}

/// Position source for the session: the instrumental player when one is
/// loaded, otherwise a wall-clock timer.
enum SessionClock {
    File(Arc<Player>),
    Timer { start: Instant, rate: f32 },
}

impl PositionSource for SessionClock {
    fn position_secs(&self) -> f32 {
        match self {
            SessionClock::File(player) => player.position_secs(),
            SessionClock::Timer { start, rate } => start.elapsed().as_secs_f32() * rate,
        }
    }
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(lyrics) = args.lyrics {
        config.lyrics = Some(lyrics);
    }
    if let Some(instrumental) = args.instrumental {
        config.instrumental = Some(instrumental);
    }
    if let Some(volume) = args.volume {
        config.transport.volume = volume;
    }
    if let Some(rate) = args.rate {
        config.transport.rate = rate;
    }
    config.validate()?;
    let toggles = args.effects.apply(config.effects);

    let text = match &config.lyrics {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEMO_LYRICS.to_string(),
    };
    let sequence = Arc::new(parse(&text));
    anyhow::ensure!(!sequence.is_empty(), "no lyric lines to display");

    let player = match &config.instrumental {
        Some(path) => {
            let player = Arc::new(Player::from_file(path)?);
            player.set_volume(config.transport.volume);
            player.set_rate(config.transport.rate);
            player.play();
            println!(
                "Playing {} ({:.0} s)",
                path.display(),
                player.duration_secs()
            );
            Some(player)
        }
        None => None,
    };
    let clock = match &player {
        Some(player) => SessionClock::File(Arc::clone(player)),
        None => SessionClock::Timer {
            start: Instant::now(),
            rate: config.transport.rate,
        },
    };

    let mut sampler = Sampler::new(clock, Arc::clone(&sequence));
    let handle = sampler.handle();
    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || ctrlc_handle.cancel())?;

    let mut mic = if args.mic {
        let mut controller = MicController::new(
            Box::new(CpalCaptureBackend::new()),
            Box::new(CpalRealizer::new(config.audio.buffer_size as usize)),
            CaptureConfig {
                sample_rate: config.audio.sample_rate,
                buffer_size: config.audio.buffer_size,
                device_name: config.audio.input_device.clone(),
            },
        );
        controller.enable(toggles);
        Some(controller)
    } else {
        None
    };

    println!("{} cues loaded. Ctrl+C to stop.\n", sequence.len());
    while !handle.is_cancelled() {
        if let Some(advance) = sampler.poll(Instant::now())
            && advance.changed
            && let Some(cue) = sequence.get(advance.index)
        {
            println!("> {}", cue.text);
        }

        if let Some(controller) = mic.as_mut() {
            for event in controller.pump() {
                match event {
                    MicEvent::Enabled(toggles) => {
                        println!("[mic] live ({toggles:?})");
                    }
                    MicEvent::Failed(error) => {
                        eprintln!("[mic] failed: {error}");
                    }
                }
            }
        }

        // The player parks itself at the end of the file.
        if let Some(player) = &player
            && !player.is_playing()
            && player.position_secs() >= player.duration_secs()
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(4));
    }

    if let Some(mut controller) = mic {
        controller.disable();
    }
    if let Some(player) = &player {
        player.stop();
    }
    println!("\nSession over.");
    Ok(())
}
