use crate::error::{ChatClientError, ChatClientResult};

/// Переменная окружения с базовым URL бэкенда.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
/// Базовый URL по умолчанию.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Конфигурация клиента. Читается один раз при создании клиента.
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// Проверяет и сохраняет базовый URL, например `http://127.0.0.1:8000`.
    pub fn new(base_url: impl Into<String>) -> ChatClientResult<Self> {
        let base_url = base_url.into().trim().to_string();
        if base_url.is_empty() {
            return Err(ChatClientError::Config(
                "base url must not be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ChatClientError::Config(format!(
                "base url must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self { base_url })
    }

    /// Берёт базовый URL из `API_BASE_URL`, иначе `http://localhost:8000`.
    pub fn from_env() -> ChatClientResult<Self> {
        let raw = std::env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(raw)
    }

    /// Базовый URL без изменений.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
