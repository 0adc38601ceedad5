use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const MODEL_REPO: &str = "ggerganov/whisper.cpp";

/// Model names accepted by `--whisper-model` and the files they resolve to.
const MODELS: &[(&str, &str)] = &[
    ("tiny", "ggml-tiny.bin"),
    ("tiny.en", "ggml-tiny.en.bin"),
    ("base", "ggml-base.bin"),
    ("base.en", "ggml-base.en.bin"),
    ("small", "ggml-small.bin"),
    ("small.en", "ggml-small.en.bin"),
    ("medium", "ggml-medium.bin"),
    ("medium.en", "ggml-medium.en.bin"),
    ("large", "ggml-large-v3-turbo.bin"),
];

fn model_file(name: &str) -> Option<&'static str> {
    MODELS.iter().find(|(n, _)| *n == name).map(|(_, file)| *file)
}

/// Turn a model name or path into a local file, downloading named models once.
pub fn locate_model(name_or_path: &str) -> Result<PathBuf> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let file = model_file(name_or_path).with_context(|| {
        let names: Vec<&str> = MODELS.iter().map(|(n, _)| *n).collect();
        format!(
            "Unknown speech model '{}', expected a file or one of: {}",
            name_or_path,
            names.join(", ")
        )
    })?;

    let dir = cache_dir()?;
    let cached = dir.join(file);
    if cached.is_file() {
        log::info!("Using cached speech model {}", cached.display());
        return Ok(cached);
    }

    log::info!("Fetching speech model '{}'", name_or_path);
    let api = hf_hub::api::sync::Api::new().context("Failed to initialize HuggingFace Hub API")?;
    let fetched = api
        .model(MODEL_REPO.to_string())
        .get(file)
        .with_context(|| format!("Failed to download {}", file))?;
    std::fs::copy(&fetched, &cached)
        .with_context(|| format!("Failed to cache model at {}", cached.display()))?;
    Ok(cached)
}

fn cache_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .context("No cache directory available")?
        .join("audiosketch")
        .join("models");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}
