//! Lyric file inspection.

use std::path::PathBuf;

use clap::Args;
use corista_lyrics::parse;

#[derive(Args)]
pub struct LyricsArgs {
    /// Lyric file to parse
    file: PathBuf,

    /// Emit the cue table as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: LyricsArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)?;
    let sequence = parse(&text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sequence)?);
        return Ok(());
    }

    println!("{} cues", sequence.len());
    for cue in &sequence {
        let minutes = (cue.time / 60.0).floor() as u32;
        let seconds = cue.time - minutes as f32 * 60.0;
        println!("  [{minutes:02}:{seconds:05.2}] {}", cue.text);
    }
    Ok(())
}
