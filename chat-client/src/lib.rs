//! Клиентская библиотека для REST API истории чатов.
//!
//! Предоставляет `ChatApiClient` с типизированным доступом к ресурсам:
//! - чаты (`/api/chats/`)
//! - сообщения (`/api/messages/`)
//!
//! а также к служебным эндпоинтам `/health`, `/api/notebooks/`,
//! `/api/chat/completion` и загрузке файлов `/api/files/upload`.
//! Каждый вызов отправляет один HTTP-запрос.
#![warn(missing_docs)]

mod config;
mod error;
mod http_client;
mod models;
mod query;
mod resource;

pub use config::{API_BASE_URL_ENV, ClientConfig, DEFAULT_API_BASE_URL};
pub use error::{ChatClientError, ChatClientResult};
pub use models::{
    Chat, ChatCreate, ChatDetail, ChatUpdate, CompletionMessage, CompletionRequest,
    CompletionResponse, FileUploadResponse, HealthStatus, Message, MessageCreate, MessageRole,
    MessageUpdate, Page, Timestamp,
};
pub use query::PageQuery;
pub use resource::{Chats, Messages, Resource, ResourceClient};

use http_client::HttpClient;
use reqwest::Method;
use reqwest::multipart::{Form, Part};

#[derive(Debug, Clone)]
/// Клиент бэкенда истории чатов.
///
/// Клонирование дешёвое: копии разделяют пул соединений `reqwest`.
pub struct ChatApiClient {
    http: HttpClient,
    chats: ResourceClient<Chats>,
    messages: ResourceClient<Messages>,
}

impl ChatApiClient {
    /// Создаёт клиент по готовой конфигурации.
    pub fn new(config: ClientConfig) -> ChatClientResult<Self> {
        let http = HttpClient::new(&config)?;

        Ok(Self {
            chats: ResourceClient::new(http.clone()),
            messages: ResourceClient::new(http.clone()),
            http,
        })
    }

    /// Создаёт клиент, читая базовый URL из `API_BASE_URL`.
    pub fn from_env() -> ChatClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Базовый URL, с которым работает клиент.
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Операции над чатами.
    pub fn chats(&self) -> &ResourceClient<Chats> {
        &self.chats
    }

    /// Операции над сообщениями.
    pub fn messages(&self) -> &ResourceClient<Messages> {
        &self.messages
    }

    /// Проверяет доступность бэкенда.
    pub async fn health(&self) -> ChatClientResult<HealthStatus> {
        self.http.get_json("/health").await
    }

    /// Идентификаторы доступных блокнотов (RAG-коллекций).
    pub async fn notebooks(&self) -> ChatClientResult<Vec<String>> {
        self.http.get_json("/api/notebooks/").await
    }

    /// Генерирует ответ модели по переданной истории. Сервер ничего не
    /// сохраняет: записать ответ в чат нужно отдельным `messages().create`.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> ChatClientResult<CompletionResponse> {
        self.http
            .send_json(Method::POST, "/api/chat/completion", request)
            .await
    }

    /// Загружает PDF или изображение в блокнот. Сервер извлекает текст и
    /// добавляет его в RAG-коллекцию блокнота.
    ///
    /// `source` по умолчанию равен имени файла на стороне сервера.
    pub async fn upload_file(
        &self,
        notebook_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        source: Option<&str>,
    ) -> ChatClientResult<FileUploadResponse> {
        let mut form = Form::new()
            .text("notebook_id", notebook_id.to_string())
            .part("file", Part::bytes(bytes).file_name(filename.to_string()));
        if let Some(source) = source {
            form = form.text("source", source.to_string());
        }

        self.http.send_multipart("/api/files/upload", form).await
    }
}
