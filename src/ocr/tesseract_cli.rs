//! Recognizer backed by the external `tesseract` executable, fed a PNG on
//! stdin. Keeps the engine fully opaque and the crate free of native OCR
//! bindings.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use image::{GrayImage, ImageFormat};

use crate::config::OcrConfig;

use super::TextRecognizer;

pub struct TesseractCli {
    binary: String,
    language: String,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            language: config.language.clone(),
        }
    }

    /// Probe the engine once at startup so a missing install fails loudly
    /// instead of producing silent empty text forever.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &GrayImage, whitelist: Option<&str>) -> Result<String> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .context("failed to encode frame for recognition")?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(["stdin", "stdout", "-l", &self.language])
            .args(["--psm", "6", "--oem", "3"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(chars) = whitelist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={chars}"));
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to launch {}", self.binary))?;

        child
            .stdin
            .take()
            .context("recognizer stdin unavailable")?
            .write_all(png.get_ref())
            .context("failed to stream frame to recognizer")?;

        let output = child
            .wait_with_output()
            .context("recognizer did not exit")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "recognizer exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
