#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lookbook::{HostKeySurface, Result};

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-3-pro-image-preview:generateContent";

pub fn build_studio_client(base_url: &str) -> lookbook::Client {
    lookbook::Client::builder()
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

pub fn payload_b64(index: usize) -> String {
    STANDARD.encode(format!("payload-{index}"))
}

pub fn inline_image_body(payload: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": payload}}
                ]
            },
            "finishReason": "STOP"
        }]
    })
}

/// Mounts one success mock per variation, keyed on the variation's style text.
pub async fn mount_variation_mocks(server: &MockServer, calls_per_variation: u64) {
    for (index, variation) in lookbook::VARIATIONS.iter().enumerate() {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_string_contains(variation.style))
            .respond_with(ResponseTemplate::new(200).set_body_json(inline_image_body(&payload_b64(index))))
            .expect(calls_per_variation)
            .mount(server)
            .await;
    }
}

/// Host surface stub with a fixed selection answer.
pub struct StaticKeySurface {
    pub selected: bool,
}

#[async_trait]
impl HostKeySurface for StaticKeySurface {
    async fn has_selected_key(&self) -> Result<bool> {
        Ok(self.selected)
    }

    async fn open_key_picker(&self) -> Result<()> {
        Ok(())
    }
}
