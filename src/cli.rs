use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "audiosketch", about = "Audio-reactive sketch driven by extracted audio features")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Config file (default: ./audiosketch.toml or ~/.config/audiosketch/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Render ticks per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Samples per analysis buffer (power of two)
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Scripted voice input as SECONDS:TEXT, repeatable
    #[arg(long = "say", value_name = "TIME:TEXT")]
    pub say: Vec<String>,

    /// Recognise voice commands spoken in the track itself
    #[arg(long)]
    pub listen: bool,

    /// Whisper model name (tiny, base, small, medium, large) or path to a ggml model
    #[arg(long, default_value = "base")]
    pub whisper_model: String,

    /// Language code for speech recognition (auto-detect when omitted)
    #[arg(long)]
    pub language: Option<String>,

    /// Write the session statistics as JSON
    #[arg(long)]
    pub stats_out: Option<PathBuf>,

    /// Write per-frame visual parameters as JSON lines
    #[arg(long)]
    pub params_out: Option<PathBuf>,

    /// List extractable features and exit
    #[arg(long)]
    pub list_features: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Values given on the command line win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.canvas.height = height;
        }
        if let Some(fps) = self.fps {
            config.canvas.fps = fps;
        }
        if let Some(size) = self.buffer_size {
            config.analysis.buffer_size = size;
        }
    }
}
