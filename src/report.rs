use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::sketch::mapper::VisualParameters;
use crate::sketch::stats::SessionSummary;

pub fn log_summary(summary: &SessionSummary) {
    log::info!("Session summary over {} analysis records", summary.records);
    for stats in &summary.features {
        log::info!(
            "{}: mean={:.4} std={:.4} min={:.4} max={:.4} ({} samples)",
            stats.feature,
            stats.mean,
            stats.std,
            stats.min,
            stats.max,
            stats.samples
        );
    }
}

/// Features ordered from most to least stable, one row each.
pub fn ranking_table(summary: &SessionSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:<20} {:>10} {:>10} {:>10} {:>10}\n",
        "rank", "feature", "std", "mean", "min", "max"
    ));
    for (i, stats) in summary.features.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<20} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
            i + 1,
            stats.feature.as_str(),
            stats.std,
            stats.mean,
            stats.min,
            stats.max
        ));
    }
    out
}

pub fn write_summary(path: &Path, summary: &SessionSummary) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)
        .with_context(|| format!("Failed to write statistics to {}", path.display()))?;
    writer.flush()?;
    log::info!("Statistics written to {}", path.display());
    Ok(())
}

pub fn params_file(path: &Path) -> Result<ParamsWriter<BufWriter<File>>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(ParamsWriter::new(BufWriter::new(file)))
}

#[derive(Serialize)]
struct FrameLine<'a> {
    frame: u64,
    time: f32,
    #[serde(flatten)]
    params: &'a VisualParameters,
}

/// Writes the parameters behind every drawn frame as JSON lines.
pub struct ParamsWriter<W: Write> {
    out: W,
    lines: usize,
}

impl<W: Write> ParamsWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn write_frame(&mut self, frame: u64, time: f32, params: &VisualParameters) -> Result<()> {
        serde_json::to_writer(&mut self.out, &FrameLine { frame, time, params })?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and return the number of frames written.
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.lines)
    }
}
