// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine for MediCloak.
//
// Produces positioned word tokens from page images using the `ocrs` crate, a
// pure-Rust OCR engine backed by neural network models executed via `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// medicloak-document = { path = "crates/medicloak-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to the
// default cache directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::DynamicImage;
use medicloak_core::error::MedicloakError;
use medicloak_core::types::{BoundingBox, Token};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, OcrInput, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::capabilities::OcrCapability;

/// Default directory for cached OCR model files.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Model locations for an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models from one directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<(), MedicloakError> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(MedicloakError::OcrError(format!(
                    "{role} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Word-level OCR over page images.
///
/// Model loading is the expensive step, so build one engine and hand it to
/// every session.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models named in `config`.
    ///
    /// **Important:** `ocrs` and `rten` must be compiled in release mode; debug
    /// builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self, MedicloakError> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            MedicloakError::OcrError(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&config.recognition_model_path).map_err(|err| {
            MedicloakError::OcrError(format!(
                "failed to load recognition model from {}: {}",
                config.recognition_model_path.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| MedicloakError::OcrError(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self, MedicloakError> {
        Self::new(OcrConfig::default())
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self, MedicloakError> {
        Self::new(OcrConfig::from_dir(dir))
    }

    fn prepare(&self, image: &DynamicImage) -> Result<OcrInput, MedicloakError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            MedicloakError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        self.engine
            .prepare_input(source)
            .map_err(|err| MedicloakError::OcrError(format!("OCR preprocessing failed: {}", err)))
    }
}

impl OcrCapability for OcrEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    /// Words of every recognised line, each line followed by a blank token.
    #[instrument(skip_all, fields(page_index = page_index, width = image.width(), height = image.height()))]
    fn tokens(&self, image: &DynamicImage, page_index: usize) -> Result<Vec<Token>, MedicloakError> {
        let input = self.prepare(image)?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| MedicloakError::OcrError(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(words = word_rects.len(), lines = line_rects.len(), "Text layout found");

        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| MedicloakError::OcrError(format!("line recognition failed: {}", err)))?;

        let mut tokens = Vec::new();
        for line in lines.iter().flatten() {
            for word in line.words() {
                let text = word.to_string();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = word.bounding_rect();
                let bbox = BoundingBox::new(
                    rect.left(),
                    rect.top(),
                    rect.width().max(0) as u32,
                    rect.height().max(0) as u32,
                );
                let position = tokens.len();
                tokens.push(Token::new(text, bbox, page_index, position));
            }
            let position = tokens.len();
            tokens.push(Token::new("", BoundingBox::new(0, 0, 0, 0), page_index, position));
        }

        info!(tokens = tokens.len(), "OCR tokens recognised");
        Ok(tokens)
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn transcribe(&self, image: &DynamicImage) -> Result<String, MedicloakError> {
        let input = self.prepare(image)?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| MedicloakError::OcrError(format!("OCR text recognition failed: {}", err)))?;
        debug!(line_count = text.lines().count(), "OCR transcription complete");
        Ok(text)
    }
}

/// Whether both models are present in the default cache directory.
pub fn models_available() -> bool {
    OcrConfig::default().validate().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_to_cache_dir() {
        let config = OcrConfig::default();
        assert!(config
            .detection_model_path
            .to_string_lossy()
            .ends_with(DETECTION_MODEL_FILENAME));
        assert!(config
            .recognition_model_path
            .to_string_lossy()
            .ends_with(RECOGNITION_MODEL_FILENAME));
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
    }

    #[test]
    fn missing_models_are_an_ocr_error() {
        let result = OcrEngine::from_model_dir("/nonexistent/path/ocr-models");
        assert!(matches!(result, Err(MedicloakError::OcrError(_))));
    }
}
