// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Cover image acquisition: fetch a random photo from an external service,
//! falling back to a solid-colour PNG of the same dimensions on any failure.
//!
//! Mirrors `original_source/random_image.py`: the external fetch is best
//! effort, network failures never propagate past this module.

use image::imageops::FilterType;
use image::RgbImage;
use rand::Rng;

use crate::error::PipelineError;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Where to fetch a cover photo from. `endpoint` is a URL template containing
/// `{width}`/`{height}` placeholders; `None` always synthesizes a solid
/// colour image, which is what every test in this crate uses (no real
/// network access).
#[derive(Debug, Clone, Default)]
pub struct CoverSource {
    pub endpoint: Option<String>,
}

impl CoverSource {
    pub fn disabled() -> Self {
        Self { endpoint: None }
    }

    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
        }
    }

    /// Obtain a cover image of exactly `width` x `height`, trying the
    /// configured remote endpoint first and falling back to a random solid
    /// colour on any error.
    pub async fn obtain(&self, width: u32, height: u32) -> RgbImage {
        if let Some(endpoint) = &self.endpoint {
            match Self::try_fetch(endpoint, width, height).await {
                Ok(img) => return img,
                Err(err) => {
                    tracing::warn!(%err, "cover image fetch failed, falling back to a solid colour");
                }
            }
        }
        solid_color_image(width, height)
    }

    async fn try_fetch(endpoint: &str, width: u32, height: u32) -> Result<RgbImage, PipelineError> {
        let url = endpoint
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string());

        let response = reqwest::get(&url)
            .await
            .map_err(|e| PipelineError::CoverFetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PipelineError::CoverFetch(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::CoverFetch(e.to_string()))?;

        let img = image::load_from_memory(&bytes)
            .map_err(|e| PipelineError::CoverFetch(e.to_string()))?
            .to_rgb8();

        Ok(image::imageops::resize(&img, width, height, FilterType::Lanczos3))
    }
}

fn solid_color_image(width: u32, height: u32) -> RgbImage {
    let mut rng = rand::thread_rng();
    let color = image::Rgb([rng.gen(), rng.gen(), rng.gen()]);
    RgbImage::from_pixel(width, height, color)
}
