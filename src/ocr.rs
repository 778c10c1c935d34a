use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::parser;
use crate::parser::candidate::Candidate;
use crate::parser::patterns::PatternLibrary;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("tesseract not usable at {path}: {reason}")]
    EngineUnavailable { path: String, reason: String },
    #[error("recognition failed: {0}")]
    Recognition(String),
}

struct OcrConfig {
    lang: &'static str,
    extra: &'static [&'static str],
}

/// Retry ladder, tried in order until one configuration yields enough text.
const CONFIGS: &[OcrConfig] = &[
    OcrConfig { lang: "chi_sim", extra: &["--oem", "3", "--psm", "6"] },
    OcrConfig { lang: "chi_sim+eng", extra: &["--oem", "3", "--psm", "6"] },
    OcrConfig { lang: "eng", extra: &["--oem", "3", "--psm", "6"] },
    OcrConfig { lang: "chi_sim", extra: &["--oem", "3", "--psm", "3"] },
    OcrConfig { lang: "chi_sim", extra: &["--oem", "1", "--psm", "6"] },
];

/// A result at least this long stops the retry ladder early.
const EARLY_ACCEPT_CHARS: usize = 20;
/// Below this the image counts as recognition-degraded.
const DEGRADED_CHARS: usize = 10;

/// OCR collaborator: bytes of one pre-rendered image in, raw recognized
/// text out. Pre-processing lives behind this boundary.
pub trait OcrEngine {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Shells out to the tesseract binary, retrying across the configuration
/// ladder and keeping the longest recognized text.
pub struct TesseractCli {
    binary: PathBuf,
}

impl TesseractCli {
    pub fn new(binary: Option<PathBuf>) -> Result<TesseractCli, OcrError> {
        let binary = binary.unwrap_or_else(|| PathBuf::from("tesseract"));
        let unavailable = |reason: String| OcrError::EngineUnavailable {
            path: binary.display().to_string(),
            reason,
        };
        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .map_err(|e| unavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(unavailable(format!("--version exited with {}", output.status)));
        }
        Ok(TesseractCli { binary })
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut file =
            NamedTempFile::new().map_err(|e| OcrError::Recognition(e.to_string()))?;
        file.write_all(image).map_err(|e| OcrError::Recognition(e.to_string()))?;

        let mut best = String::new();
        for config in CONFIGS {
            let output = Command::new(&self.binary)
                .arg(file.path())
                .arg("stdout")
                .args(["-l", config.lang])
                .args(config.extra)
                .output();
            let output = match output {
                Ok(o) => o,
                Err(e) => {
                    debug!(lang = config.lang, error = %e, "tesseract invocation failed");
                    continue;
                }
            };
            if !output.status.success() {
                debug!(lang = config.lang, status = %output.status, "tesseract attempt failed");
                continue;
            }

            let text = String::from_utf8_lossy(&output.stdout).into_owned();
            let len = text.trim().chars().count();
            if len > best.trim().chars().count() {
                best = text;
            }
            if len > EARLY_ACCEPT_CHARS {
                break;
            }
        }

        Ok(best)
    }
}

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static TOLERANCE_FIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*[十+]").unwrap());

// Frequent CJK shape confusions in drawing annotations.
const CONFUSIONS: &[(char, char)] = &[('土', '±'), ('巳', '已'), ('曰', '日')];

/// Collapse space runs and repair common recognition confusions. Newlines
/// survive so line provenance stays meaningful.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = SPACE_RUN_RE.replace_all(text, " ").into_owned();
    for (wrong, right) in CONFUSIONS {
        cleaned = cleaned.replace(*wrong, &right.to_string());
    }
    let cleaned = TOLERANCE_FIX_RE.replace_all(&cleaned, "$1±");
    cleaned.trim().to_string()
}

/// Recognize each image of a page and run the line matchers over the
/// cleaned text. Degraded or failed images log and yield zero candidates;
/// they never abort the run.
pub fn extract_images(
    engine: &dyn OcrEngine,
    page: u32,
    images: &[Vec<u8>],
    lib: &PatternLibrary,
) -> Vec<Candidate> {
    let mut out = Vec::new();

    for (idx, image) in images.iter().enumerate() {
        let image_number = idx as u32 + 1;
        match engine.recognize(image) {
            Ok(text) => {
                let cleaned = clean_text(&text);
                if cleaned.chars().count() < DEGRADED_CHARS {
                    warn!(page, image = image_number, "recognition degraded, no usable text");
                    continue;
                }
                out.extend(parser::extract_ocr_text(&cleaned, page, image_number, lib));
            }
            Err(e) => {
                warn!(page, image = image_number, error = %e, "image recognition failed");
            }
        }
    }

    out
}
