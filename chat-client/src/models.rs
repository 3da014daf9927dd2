use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Метка времени, назначенная сервером.
///
/// Хранится в исходном строковом виде: бэкенд может отдавать ISO 8601 как со
/// смещением, так и без него.
pub struct Timestamp(String);

impl Timestamp {
    /// Оборачивает строку без проверки формата.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Исходная строка.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Разбирает метку как UTC. Значение без смещения считается UTC.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(&self.0) {
            return Some(with_offset.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Публичная модель чата.
pub struct Chat {
    /// Идентификатор чата.
    pub id: i64,
    /// Название чата.
    #[serde(default)]
    pub name: Option<String>,
    /// Идентификаторы подключённых блокнотов.
    #[serde(default)]
    pub notebooks: Vec<String>,
    /// Дата и время создания.
    pub created_at: Timestamp,
    /// Дата и время последнего обновления.
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Чат вместе с количеством сообщений, посчитанным сервером.
pub struct ChatDetail {
    #[serde(flatten)]
    /// Данные чата.
    pub chat: Chat,
    /// Количество сообщений в чате.
    #[serde(default)]
    pub messages_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Payload создания чата.
pub struct ChatCreate {
    /// Название чата.
    pub name: Option<String>,
    /// Идентификаторы блокнотов.
    pub notebooks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Частичное обновление чата: отсутствующие поля не отправляются.
pub struct ChatUpdate {
    /// Новое название.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Новый набор блокнотов (заменяет прежний целиком).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebooks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Автор сообщения.
pub enum MessageRole {
    /// Пользователь.
    User,
    /// Ответ модели.
    Ai,
    /// Системная инструкция.
    System,
}

impl MessageRole {
    /// Имя роли на проводе.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::System => "system",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Публичная модель сообщения.
pub struct Message {
    /// Идентификатор сообщения.
    pub id: i64,
    /// Чат, которому принадлежит сообщение.
    pub chat_id: i64,
    /// Автор.
    pub role: MessageRole,
    /// Текст.
    pub content: String,
    /// Дата и время создания.
    pub created_at: Timestamp,
    /// Дата и время последнего обновления.
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Payload создания сообщения.
pub struct MessageCreate {
    /// Чат, в который добавляется сообщение.
    pub chat_id: i64,
    /// Автор.
    pub role: MessageRole,
    /// Текст; сервер отклоняет пустую строку.
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Частичное обновление сообщения.
pub struct MessageUpdate {
    /// Новый текст.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Новый автор.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Одна страница упорядоченной сервером выборки.
pub struct Page<T> {
    /// Элементы текущей страницы.
    pub items: Vec<T>,
    /// Общее количество элементов.
    pub total: u64,
    /// Номер страницы (с единицы).
    pub page: u32,
    /// Размер страницы.
    pub page_size: u32,
    /// Общее количество страниц.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Количество страниц для `total` элементов при размере `page_size`.
    ///
    /// Для пустой выборки или нулевого размера страницы возвращает 0.
    pub fn expected_total_pages(total: u64, page_size: u32) -> u32 {
        if total == 0 || page_size == 0 {
            return 0;
        }
        let pages = total.div_ceil(u64::from(page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Проверяет инварианты `total_pages == ceil(total / page_size)` и
    /// `items.len() <= page_size`.
    pub fn is_consistent(&self) -> bool {
        if self.page_size == 0 {
            return self.items.is_empty();
        }
        self.items.len() <= self.page_size as usize
            && self.total_pages == Self::expected_total_pages(self.total, self.page_size)
    }

    /// Есть ли страницы после текущей.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Количество элементов на странице.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Страница без элементов.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ `/health`.
pub struct HealthStatus {
    /// `healthy`, если бэкенд работает.
    pub status: String,
}

impl HealthStatus {
    /// Бэкенд отчитался как работоспособный.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Реплика диалога для `/api/chat/completion`.
///
/// Роль здесь свободная строка: эндпоинт принимает `assistant` наряду с
/// `user` и `system`.
pub struct CompletionMessage {
    /// Роль: `user`, `assistant` или `system`.
    pub role: String,
    /// Текст реплики.
    pub content: String,
}

impl CompletionMessage {
    /// Реплика пользователя.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Реплика модели.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&Message> for CompletionMessage {
    fn from(value: &Message) -> Self {
        let role = match value.role {
            MessageRole::Ai => "assistant",
            other => other.as_str(),
        };
        Self {
            role: role.to_string(),
            content: value.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Запрос генерации ответа без сохранения состояния на сервере.
pub struct CompletionRequest {
    /// История диалога, последняя реплика в конце.
    pub messages: Vec<CompletionMessage>,
    /// Блокноты, из которых подтягивается контекст.
    #[serde(default)]
    pub notebooks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ модели вместе с подгруженным контекстом и вызовами инструментов.
pub struct CompletionResponse {
    /// Текст ответа.
    pub response: String,
    /// Контекст, подгруженный из блокнотов до вызова модели.
    #[serde(default)]
    pub prefetch_content: Option<Map<String, Value>>,
    /// Вызовы инструментов, сделанные моделью.
    #[serde(default)]
    pub tool_calls: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Результат загрузки файла в блокнот.
pub struct FileUploadResponse {
    /// Сообщение сервера.
    pub message: String,
    /// Блокнот, в который добавлен текст.
    pub notebook_id: String,
    /// Имя загруженного файла.
    pub filename: String,
    /// Тип файла, определённый сервером (`pdf`, `image`, ...).
    pub file_type: String,
    /// Длина извлечённого текста в символах.
    pub text_length: u64,
    /// Метаданные извлечения.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// `success` при успешной обработке.
    #[serde(default)]
    pub status: String,
}
