//! API key availability gate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::env_api_key;
use crate::error::Result;

/// 宿主端密钥能力接口。
///
/// 嵌入环境（如托管 IDE 的 key picker）实现该接口；没有宿主时走环境变量。
#[async_trait]
pub trait HostKeySurface: Send + Sync {
    /// 查询宿主是否已选择 API 密钥。
    async fn has_selected_key(&self) -> Result<bool>;

    /// 请求宿主打开密钥选择器。选择结果需通过 `has_selected_key` 回查确认。
    async fn open_key_picker(&self) -> Result<()>;
}

/// 密钥可用性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAvailability {
    /// 检查尚未完成。
    Unknown,
    /// 存在可用密钥。
    Available,
    /// 没有可用密钥，所有生成功能应被挂起。
    Unavailable,
}

/// 密钥可用性门。
#[derive(Clone)]
pub struct KeyGate {
    surface: Option<Arc<dyn HostKeySurface>>,
    availability: KeyAvailability,
}

impl KeyGate {
    /// 创建仅依赖环境变量的门。
    #[must_use]
    pub const fn new() -> Self {
        Self {
            surface: None,
            availability: KeyAvailability::Unknown,
        }
    }

    /// 创建带宿主能力接口的门。
    #[must_use]
    pub fn with_surface(surface: Arc<dyn HostKeySurface>) -> Self {
        Self {
            surface: Some(surface),
            availability: KeyAvailability::Unknown,
        }
    }

    /// 当前可用性。
    #[must_use]
    pub const fn availability(&self) -> KeyAvailability {
        self.availability
    }

    /// 是否存在可用密钥。
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.availability, KeyAvailability::Available)
    }

    /// 初始化检查：优先查询宿主，否则检查部署环境。
    pub async fn initialize(&mut self) -> KeyAvailability {
        let selected = match &self.surface {
            Some(surface) => surface.has_selected_key().await.unwrap_or(false),
            None => env_api_key().is_some(),
        };
        self.availability = if selected {
            KeyAvailability::Available
        } else {
            KeyAvailability::Unavailable
        };
        tracing::debug!(available = selected, "key gate initialized");
        self.availability
    }

    /// 请求选择密钥，并回查结果确认可用性。
    ///
    /// 没有宿主接口时重新检查环境变量。
    ///
    /// # Errors
    /// 当宿主选择器调用失败时返回错误。
    pub async fn request_key_selection(&mut self) -> Result<KeyAvailability> {
        if let Some(surface) = self.surface.clone() {
            surface.open_key_picker().await?;
        }
        Ok(self.initialize().await)
    }

    /// 撤销缓存的可用性（生成失败表明密钥被拒绝时调用）。
    pub fn revoke(&mut self) {
        tracing::warn!("key availability revoked");
        self.availability = KeyAvailability::Unavailable;
    }
}

impl Default for KeyGate {
    fn default() -> Self {
        Self::new()
    }
}
