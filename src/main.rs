mod audio;
mod cli;
mod config;
mod error;
mod playback;
mod render;
mod report;
mod sketch;
mod speech;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use audio::features::FeatureSet;
use cli::Cli;
use config::Config;
use playback::Playback;
use render::surface::{CommandList, DrawCommand};
use sketch::{Event, Sketch};
use speech::transcript::Utterance;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .format_timestamp_millis()
        .init();

    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    if cli.list_features {
        let enabled = config.feature_set();
        println!("Extractable features (* = enabled):");
        for name in FeatureSet::all().iter() {
            let mark = if enabled.contains(name) { '*' } else { ' ' };
            println!("  {} {:<22} {:?}", mark, name.as_str(), name.shape());
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("audiosketch - audio-reactive sketch");
    log::info!("Input: {}", input.display());
    log::info!(
        "Canvas: {}x{} @ {}fps, buffer {} samples",
        config.canvas.width,
        config.canvas.height,
        config.canvas.fps,
        config.analysis.buffer_size
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let track = audio::decode::load_track(input)?;
    log::info!(
        "Audio: {:.1}s, {} Hz, {} samples",
        track.duration(),
        track.sample_rate,
        track.samples.len()
    );

    // 2. Extract features, one record per full buffer
    let features = config.feature_set();
    let records = audio::extract::analyze_track(&track, config.analysis.buffer_size, &features)
        .context("Feature extraction failed")?;
    log::info!("Extracted {} analysis records", records.len());

    // 3. Voice input
    let utterances = collect_utterances(&cli, &config, &track)?;

    // 4. Replay playback through the sketch
    let playback = Playback {
        sample_rate: track.sample_rate,
        buffer_size: config.analysis.buffer_size,
        fps: config.canvas.fps,
        duration: track.duration(),
    };
    let events = playback.timeline(records, utterances);

    let mut surface = CommandList::new(config.canvas.width, config.canvas.height);
    let mut sketch = Sketch::new(config)?;
    let mut params_out = cli
        .params_out
        .as_deref()
        .map(report::params_file)
        .transpose()?;

    let pb = ProgressBar::new(events.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} events ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let mut summary = None;
    let mut shapes = 0usize;
    for timed in events {
        let is_render = matches!(timed.event, Event::Render);
        if is_render {
            surface.clear();
        }
        if let Some(s) = sketch.dispatch(timed.event, &mut surface) {
            summary = Some(s);
        }
        if is_render {
            shapes += surface.count(|c| {
                matches!(c, DrawCommand::Circle { .. } | DrawCommand::Rect { .. })
            });
            if let (Some(writer), Some(params)) = (params_out.as_mut(), sketch.params()) {
                writer.write_frame(sketch.frame_count() - 1, timed.time, params)?;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    log::info!(
        "Rendered {} frames ({} shapes)",
        sketch.frame_count(),
        shapes
    );
    if let (Some(writer), Some(path)) = (params_out, cli.params_out.as_ref()) {
        let frames = writer.finish()?;
        log::info!("Wrote parameters for {} frames to {}", frames, path.display());
    }

    // 5. Summarise the session
    let summary = summary.context("Playback ended without a session")?;
    report::log_summary(&summary);
    print!("{}", report::ranking_table(&summary));
    if let Some(path) = &cli.stats_out {
        report::write_summary(path, &summary)?;
    }

    Ok(())
}

/// Explicit --config path, else ./audiosketch.toml, else the user config dirs.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("audiosketch.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("audiosketch").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        let platform = dirs::config_dir()?.join("audiosketch").join("config.toml");
        platform.exists().then_some(platform)
    });

    match path {
        Some(path) => {
            let config = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => {
            log::debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn collect_utterances(cli: &Cli, config: &Config, track: &audio::decode::Track) -> Result<Vec<Utterance>> {
    let mut utterances = cli
        .say
        .iter()
        .map(|s| speech::transcript::parse_utterance(s))
        .collect::<Result<Vec<_>, _>>()?;

    if cli.listen {
        utterances.extend(listen(cli, config, track)?);
    }
    if !utterances.is_empty() {
        log::info!("{} voice inputs scheduled", utterances.len());
    }
    Ok(utterances)
}

#[cfg(feature = "speech")]
fn listen(cli: &Cli, config: &Config, track: &audio::decode::Track) -> Result<Vec<Utterance>> {
    log::info!("Recognising speech in the track...");
    let model = speech::model::locate_model(&cli.whisper_model)?;
    let recognizer = speech::transcribe::Recognizer::new(&model, cli.language.as_deref())?;
    let words = recognizer.recognize(&track.samples, track.sample_rate)?;
    for w in &words {
        log::debug!("  {:.2}s - {:.2}s  {:?}", w.start_time, w.end_time, w.text);
    }
    Ok(speech::transcript::interim_utterances(&words, config.speech.phrase_gap))
}

#[cfg(not(feature = "speech"))]
fn listen(_cli: &Cli, _config: &Config, _track: &audio::decode::Track) -> Result<Vec<Utterance>> {
    anyhow::bail!("--listen requires building with the 'speech' feature")
}
