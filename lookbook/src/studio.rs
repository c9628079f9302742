//! Studio session: variations, generation orchestration, and session state.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures_util::future::try_join_all;
use serde::Serialize;

use lookbook_types::config::{GenerationConfig, ImageConfig};
use lookbook_types::content::{Content, Part, Role};
use lookbook_types::models::GenerateContentConfig;
use lookbook_types::response::GenerateContentResponse;

use crate::auth::KeyGate;
use crate::client::Client;
use crate::error::{Error, Result};

/// 默认使用的图像生成模型。
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// 输出纵横比（竖屏）。
pub const OUTPUT_ASPECT_RATIO: &str = "9:16";

/// 输出分辨率档位。
pub const OUTPUT_IMAGE_SIZE: &str = "4K";

/// 下载文件名前缀。
pub const DOWNLOAD_PREFIX: &str = "lookbook";

/// 密钥被拒绝时的用户提示。
pub const KEY_REJECTED_MESSAGE: &str =
    "Your API key has expired or was not found. Please select a key again.";

/// 通用生成失败提示。
pub const GENERATION_FAILED_MESSAGE: &str =
    "Image generation failed. Check your connection and try again.";

const TASK_PROMPT: &str = "TASK: Ultra-realistic 4K Fashion Generation.\n\
IMAGE 1: Reference for model and background.\n\
IMAGE 2: Reference for product/clothing.\n\
RESULT: The model from Image 1 wearing the product from Image 2 in the same setting.";

/// 风格变体。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    /// 展示标签。
    pub label: &'static str,
    /// 追加到任务模板后的风格指令。
    pub style: &'static str,
}

/// 固定的四种风格变体。
pub const VARIATIONS: [Variation; 4] = [
    Variation {
        label: "Editorial Vogue",
        style: "High-end luxury fashion editorial, sharp focus, dramatic studio lighting, Vogue style, ultra-realistic skin and fabric textures, 8k rendering.",
    },
    Variation {
        label: "Street Lifestyle",
        style: "Professional street style photography, natural daylight, urban luxury background, candid aesthetic, hyper-realistic details.",
    },
    Variation {
        label: "Macro Detail",
        style: "Extreme close-up focusing on fabric texture and product quality, soft bokeh, professional fashion campaign lighting.",
    },
    Variation {
        label: "Cinematic Motion",
        style: "Cinematic wide shot, motion blur in background, high fashion pose, epic mood, masterwork quality rendering.",
    },
];

/// 会话图像素材。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAsset {
    /// 从原始字节创建素材。
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// 从 PNG 字节创建素材。
    #[must_use]
    pub fn png(data: Vec<u8>) -> Self {
        Self::new(data, "image/png")
    }

    /// 从 base64 文本创建素材（按 `image/png` 处理）。
    ///
    /// # Errors
    /// 当 base64 解码失败时返回错误。
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let data = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::InvalidConfig {
                message: format!("Invalid base64 image payload: {e}"),
            })?;
        Ok(Self::png(data))
    }

    /// 读取文件创建素材，MIME 按扩展名推断，未知时按 `image/png` 处理。
    ///
    /// # Errors
    /// 当文件读取失败时返回错误。
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path).first().map_or_else(
            || "image/png".to_string(),
            |mime| mime.essence_str().to_string(),
        );
        Ok(Self::new(data, mime_type))
    }

    /// 素材的 base64 文本。
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// 单个变体的生成结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// 变体序号（"0".."3"）。
    pub id: String,
    /// 变体标签。
    #[serde(rename = "variationType")]
    pub variation: String,
    /// 可直接展示的 data URL。
    pub url: String,
}

impl GenerationResult {
    /// 下载文件名（`lookbook-<标签 slug>.png`）。
    #[must_use]
    pub fn download_file_name(&self) -> String {
        let slug = self.variation.to_lowercase().replace(' ', "-");
        format!("{DOWNLOAD_PREFIX}-{slug}.png")
    }
}

/// 会话状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    Idle,
    Generating,
    Completed,
    Error,
}

/// 工作室会话。
///
/// 持有两张源图、生成结果与状态机；所有状态迁移都通过方法完成。
pub struct Studio {
    client: Client,
    gate: KeyGate,
    model: String,
    model_photo: Option<ImageAsset>,
    product_photo: Option<ImageAsset>,
    results: Vec<GenerationResult>,
    state: SessionState,
    error_message: Option<String>,
}

impl Studio {
    /// 创建会话（环境变量密钥门）。
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_gate(client, KeyGate::new())
    }

    /// 创建会话并指定密钥门。
    #[must_use]
    pub fn with_gate(client: Client, gate: KeyGate) -> Self {
        Self {
            client,
            gate,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            model_photo: None,
            product_photo: None,
            results: Vec::new(),
            state: SessionState::Idle,
            error_message: None,
        }
    }

    /// 覆盖使用的模型。
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 设置模特照片。
    pub fn set_model_photo(&mut self, asset: ImageAsset) {
        self.model_photo = Some(asset);
    }

    /// 设置商品照片。
    pub fn set_product_photo(&mut self, asset: ImageAsset) {
        self.product_photo = Some(asset);
    }

    /// 当前状态。
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// 当前结果集（成功后与 `VARIATIONS` 等长，其余情况为空）。
    #[must_use]
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    /// 当前用户可见错误信息。
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// 密钥门。
    #[must_use]
    pub const fn gate(&self) -> &KeyGate {
        &self.gate
    }

    /// 密钥门（可变）。
    pub fn gate_mut(&mut self) -> &mut KeyGate {
        &mut self.gate
    }

    /// 并发生成四个变体。
    ///
    /// 两张源图齐备且状态允许时才会发起调用；任一调用失败则整批失败，
    /// 不保留部分结果。缺少素材或状态不允许时直接返回，不改变状态。
    ///
    /// # Errors
    /// 当任一生成调用失败或响应中没有内联图像时返回错误。
    pub async fn generate(&mut self) -> Result<()> {
        let (Some(model_photo), Some(product_photo)) = (&self.model_photo, &self.product_photo)
        else {
            return Ok(());
        };
        if matches!(self.state, SessionState::Generating | SessionState::Completed) {
            return Ok(());
        }
        let model_photo = model_photo.clone();
        let product_photo = product_photo.clone();

        self.state = SessionState::Generating;
        self.results.clear();
        self.error_message = None;

        tracing::debug!(
            model = %self.model,
            variations = VARIATIONS.len(),
            "dispatching variation renders"
        );

        let models = self.client.models();
        let calls = VARIATIONS.iter().map(|variation| {
            let models = models.clone();
            let model = self.model.clone();
            let contents = vec![Content::from_parts(
                vec![
                    Part::inline_data(model_photo.data.clone(), model_photo.mime_type.clone()),
                    Part::inline_data(product_photo.data.clone(), product_photo.mime_type.clone()),
                    Part::text(compose_prompt(variation)),
                ],
                Role::User,
            )];
            async move {
                let response = models
                    .generate_content_with_config(model, contents, request_config())
                    .await?;
                extract_image_data_url(&response)
            }
        });

        match try_join_all(calls).await {
            Ok(urls) => {
                self.results = urls
                    .into_iter()
                    .enumerate()
                    .map(|(index, url)| GenerationResult {
                        id: index.to_string(),
                        variation: VARIATIONS[index].label.to_string(),
                        url,
                    })
                    .collect();
                self.state = SessionState::Completed;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation batch failed");
                if err.is_key_rejection() {
                    self.gate.revoke();
                    self.error_message = Some(KEY_REJECTED_MESSAGE.to_string());
                } else {
                    self.error_message = Some(GENERATION_FAILED_MESSAGE.to_string());
                }
                self.state = SessionState::Error;
                Err(err)
            }
        }
    }

    /// 清空结果并回到 Idle（生成进行中时不生效）。
    pub fn reset(&mut self) {
        if matches!(self.state, SessionState::Generating) {
            return;
        }
        self.results.clear();
        self.error_message = None;
        self.state = SessionState::Idle;
    }
}

fn compose_prompt(variation: &Variation) -> String {
    format!("{TASK_PROMPT}\nSTYLE: {}", variation.style)
}

fn request_config() -> GenerateContentConfig {
    GenerateContentConfig {
        generation_config: Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: Some(OUTPUT_ASPECT_RATIO.to_string()),
                image_size: Some(OUTPUT_IMAGE_SIZE.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn extract_image_data_url(response: &GenerateContentResponse) -> Result<String> {
    let blob = response
        .first_inline_image()
        .ok_or_else(|| Error::MissingImage {
            message: "generation response carried no inline image part".into(),
        })?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&blob.data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composed_prompt_contains_style_verbatim() {
        for variation in &VARIATIONS {
            let prompt = compose_prompt(variation);
            assert!(prompt.starts_with("TASK: Ultra-realistic 4K Fashion Generation."));
            assert!(prompt.contains(variation.style));
        }
    }

    #[test]
    fn request_config_carries_output_format() {
        let config = request_config();
        let image_config = config
            .generation_config
            .unwrap()
            .image_config
            .unwrap();
        assert_eq!(image_config.aspect_ratio.as_deref(), Some("9:16"));
        assert_eq!(image_config.image_size.as_deref(), Some("4K"));
    }

    #[test]
    fn generation_result_serializes_host_shape() {
        let result = GenerationResult {
            id: "1".into(),
            variation: "Macro Detail".into(),
            url: "data:image/png;base64,QUFB".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"id": "1", "variationType": "Macro Detail", "url": "data:image/png;base64,QUFB"})
        );
    }

    #[test]
    fn download_file_name_slugifies_label() {
        let result = GenerationResult {
            id: "0".into(),
            variation: "Editorial Vogue".into(),
            url: "data:image/png;base64,QUFB".into(),
        };
        assert_eq!(result.download_file_name(), "lookbook-editorial-vogue.png");
    }

    #[test]
    fn image_asset_base64_roundtrip() {
        let asset = ImageAsset::from_base64("QUFB").unwrap();
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.data, b"AAA".to_vec());
        assert_eq!(asset.to_base64(), "QUFB");
    }

    #[test]
    fn image_asset_rejects_bad_base64() {
        assert!(ImageAsset::from_base64("not base64!").is_err());
    }

    #[tokio::test]
    async fn image_asset_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("look.jpg");
        tokio::fs::write(&jpg, b"jpeg-bytes").await.unwrap();
        let asset = ImageAsset::from_path(&jpg).await.unwrap();
        assert_eq!(asset.mime_type, "image/jpeg");
        assert_eq!(asset.data, b"jpeg-bytes".to_vec());

        let raw = dir.path().join("look.asset");
        tokio::fs::write(&raw, b"raw-bytes").await.unwrap();
        let asset = ImageAsset::from_path(&raw).await.unwrap();
        assert_eq!(asset.mime_type, "image/png");
    }

    #[test]
    fn extract_image_data_url_reencodes_payload() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"inlineData": {"mimeType": "image/png", "data": "cGF5bG9hZA=="}}]
                }
            }]
        }))
        .unwrap();
        let url = extract_image_data_url(&response).unwrap();
        assert_eq!(url, "data:image/png;base64,cGF5bG9hZA==");
    }

    #[test]
    fn extract_image_data_url_requires_inline_part() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "words only"}]}
            }]
        }))
        .unwrap();
        let err = extract_image_data_url(&response).err().unwrap();
        assert!(matches!(err, Error::MissingImage { .. }));
    }

    #[tokio::test]
    async fn generate_is_noop_without_both_assets() {
        let client = Client::builder()
            .api_key("test-key")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let mut studio = Studio::new(client);
        studio.set_model_photo(ImageAsset::png(b"model".to_vec()));

        studio.generate().await.unwrap();
        assert_eq!(studio.state(), SessionState::Idle);
        assert!(studio.results().is_empty());
        assert!(studio.error_message().is_none());
    }

    #[test]
    fn reset_returns_to_idle() {
        let client = Client::new("test-key").unwrap();
        let mut studio = Studio::new(client);
        studio.reset();
        assert_eq!(studio.state(), SessionState::Idle);
        assert!(studio.results().is_empty());
    }
}
