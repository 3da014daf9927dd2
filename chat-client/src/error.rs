use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `chat-client`.
///
/// Клиент не классифицирует HTTP-статусы: `NotFound`/`ValidationError`
/// остаются интерпретацией на стороне вызывающего кода
/// (см. [`ChatClientError::is_not_found`], [`ChatClientError::is_validation_error`]).
pub enum ChatClientError {
    /// Ошибка HTTP-транспорта (`reqwest`): соединение, IO, декодирование ответа.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Сервер ответил статусом вне диапазона 2xx.
    #[error("http status {status}: {body}")]
    Http {
        /// Код ответа.
        status: u16,
        /// Тело ответа как есть.
        body: String,
    },

    /// Некорректная конфигурация клиента.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Результат операций `chat-client`.
pub type ChatClientResult<T> = Result<T, ChatClientError>;

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    detail: Option<ErrorDetailDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetailDto {
    Message(String),
    Validation(Vec<ValidationItemDto>),
}

#[derive(Debug, Deserialize)]
struct ValidationItemDto {
    msg: String,
}

impl ChatClientError {
    /// HTTP-статус ответа, если ошибка пришла от сервера.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::Config(_) => None,
        }
    }

    /// Сервер сообщил, что ресурс не найден (404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Сервер отклонил payload (400 или 422).
    pub fn is_validation_error(&self) -> bool {
        matches!(self.status(), Some(400 | 422))
    }

    /// Человекочитаемое сообщение из поля `detail` тела ошибки.
    ///
    /// Для списка ошибок валидации сообщения склеиваются через `"; "`.
    pub fn detail(&self) -> Option<String> {
        let Self::Http { body, .. } = self else {
            return None;
        };

        let dto = serde_json::from_str::<ErrorResponseDto>(body).ok()?;
        match dto.detail? {
            ErrorDetailDto::Message(message) => Some(message),
            ErrorDetailDto::Validation(items) => {
                let joined = items
                    .into_iter()
                    .map(|item| item.msg)
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
        }
    }
}
