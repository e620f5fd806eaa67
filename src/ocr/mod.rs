pub mod tesseract_cli;

use std::sync::Arc;

use image::{imageops, imageops::FilterType, GrayImage};
use log::debug;

use crate::config::OcrConfig;
use crate::window::{CapturedFrame, WindowId};

/// Latency/completeness trade-off for one recognition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Preprocessed, cropped to the bottom of the frame, whitelisted
    /// character set. Cheap enough to run across many windows per cycle.
    Fast,
    /// Full frame; retries on the bottom half when the yield is thin.
    Thorough,
}

/// Best-effort text for one captured frame. Empty text is a valid outcome
/// (no signal), not an error.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub mode: ExtractMode,
    pub window_id: WindowId,
}

/// Opaque recognition engine. Implementations must not panic; failures
/// surface as `Err` and the extractor downgrades them to empty text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage, whitelist: Option<&str>) -> anyhow::Result<String>;
}

/// Turns captured frames into text, owning the preprocessing pipeline and
/// delegating recognition to the injected engine.
pub struct TextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    config: OcrConfig,
}

impl TextExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: OcrConfig) -> Self {
        Self { recognizer, config }
    }

    pub fn extract(&self, frame: &CapturedFrame, mode: ExtractMode) -> ExtractedText {
        let prepared = preprocess(&frame.image.to_luma8(), &self.config);

        let text = match mode {
            ExtractMode::Fast => {
                // Prompts append at the bottom of scrolling output, so fast
                // mode only reads the bottom 60% of the frame.
                let region = crop_vertical(&prepared, 0.4, 1.0);
                self.recognize(&region, Some(self.config.fast_mode_whitelist.as_str()))
            }
            ExtractMode::Thorough => {
                let full = self.recognize(&prepared, None);
                if full.len() >= self.config.min_chars_before_retry {
                    full
                } else {
                    let bottom = crop_vertical(&prepared, 0.5, 1.0);
                    self.recognize(&bottom, None)
                }
            }
        };

        ExtractedText {
            text,
            mode,
            window_id: frame.window.id,
        }
    }

    fn recognize(&self, image: &GrayImage, whitelist: Option<&str>) -> String {
        match self.recognizer.recognize(image, whitelist) {
            Ok(text) => text,
            Err(err) => {
                debug!("recognition failed: {err:#}");
                String::new()
            }
        }
    }
}

/// Grayscale input is contrast-boosted, sharpened, and upscaled when narrow
/// so terminal fonts stay legible to the engine.
pub fn preprocess(gray: &GrayImage, config: &OcrConfig) -> GrayImage {
    let contrasted = imageops::contrast(gray, (config.contrast_boost - 1.0) * 50.0);

    let sharpened = imageops::filter3x3(
        &contrasted,
        &[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
    );

    let (width, height) = sharpened.dimensions();
    if width > 0 && width < config.min_scale_width {
        let scale = config.min_scale_width as f32 / width as f32;
        let new_height = ((height as f32 * scale).round() as u32).max(1);
        imageops::resize(
            &sharpened,
            config.min_scale_width,
            new_height,
            FilterType::Lanczos3,
        )
    } else {
        sharpened
    }
}

/// Crop to the vertical band `[top_frac, bottom_frac)` of the image.
pub fn crop_vertical(image: &GrayImage, top_frac: f32, bottom_frac: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let top = ((height as f32 * top_frac) as u32).min(height.saturating_sub(1));
    let bottom = ((height as f32 * bottom_frac) as u32).clamp(top + 1, height);
    imageops::crop_imm(image, 0, top, width, bottom - top).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use image::{DynamicImage, Luma};
    use std::sync::Mutex;

    use crate::window::{CapturedFrame, WindowBounds, WindowInfo};

    fn frame(width: u32, height: u32) -> CapturedFrame {
        CapturedFrame {
            image: DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([128u8]))),
            window: WindowInfo {
                id: 7,
                title: "claude".into(),
                class_name: "ConsoleWindowClass".into(),
                bounds: WindowBounds {
                    x: 0,
                    y: 0,
                    width,
                    height,
                },
                visible: true,
                minimized: false,
                tool_window: false,
                no_activate: false,
            },
            captured_at: Utc::now(),
        }
    }

    /// Records each recognition call and replays scripted responses.
    struct ScriptedRecognizer {
        responses: Mutex<Vec<anyhow::Result<String>>>,
        calls: Mutex<Vec<(u32, u32, bool)>>,
    }

    impl ScriptedRecognizer {
        fn new(responses: Vec<anyhow::Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, image: &GrayImage, whitelist: Option<&str>) -> anyhow::Result<String> {
            let (w, h) = image.dimensions();
            self.calls.lock().unwrap().push((w, h, whitelist.is_some()));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(String::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn extractor(recognizer: Arc<ScriptedRecognizer>) -> TextExtractor {
        TextExtractor::new(recognizer, OcrConfig::default())
    }

    #[test]
    fn preprocess_upscales_narrow_images() {
        let cfg = OcrConfig::default();
        let out = preprocess(&GrayImage::from_pixel(600, 300, Luma([90u8])), &cfg);
        assert_eq!(out.dimensions(), (1200, 600));

        let out = preprocess(&GrayImage::from_pixel(1600, 300, Luma([90u8])), &cfg);
        assert_eq!(out.dimensions(), (1600, 300));
    }

    #[test]
    fn crop_vertical_takes_bottom_band() {
        let img = GrayImage::from_pixel(100, 200, Luma([0u8]));
        let band = crop_vertical(&img, 0.4, 1.0);
        assert_eq!(band.dimensions(), (100, 120));
    }

    #[test]
    fn fast_mode_crops_and_whitelists() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![Ok("1. Yes".into())]));
        let result = extractor(recognizer.clone()).extract(&frame(400, 400), ExtractMode::Fast);
        assert_eq!(result.text, "1. Yes");
        assert_eq!(result.window_id, 7);

        let calls = recognizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (w, h, whitelisted) = calls[0];
        // 400px-wide frame is upscaled to 1200 before the bottom-60% crop.
        assert_eq!(w, 1200);
        assert_eq!(h, 720);
        assert!(whitelisted);
    }

    #[test]
    fn thorough_mode_retries_bottom_half_on_thin_yield() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![
            Ok("short".into()),
            Ok("Do you want to proceed? 1. Yes 2. No".into()),
        ]));
        let result = extractor(recognizer.clone()).extract(&frame(1600, 400), ExtractMode::Thorough);
        assert!(result.text.starts_with("Do you want"));

        let calls = recognizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (1600, 400, false));
        assert_eq!(calls[1], (1600, 200, false));
    }

    #[test]
    fn recognizer_failure_yields_empty_text() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![Err(anyhow::anyhow!("engine down"))]));
        let result = extractor(recognizer).extract(&frame(1600, 400), ExtractMode::Fast);
        assert!(result.text.is_empty());
    }
}
