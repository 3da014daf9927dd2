use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ChatClientError, ChatClientResult};

#[derive(Debug, Clone)]
/// HTTP-транспорт поверх REST API бэкенда.
///
/// Каждый вызов отправляет ровно один запрос; таймауты и повторы не
/// настраиваются, действуют умолчания `reqwest`.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(config: &ClientConfig) -> ChatClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("chat-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatClientError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: Response) -> ChatClientError {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(status = status.as_u16(), error = %err, "failed to read error body");
                String::new()
            }
        };
        warn!(status = status.as_u16(), %body, "request rejected");
        ChatClientError::Http {
            status: status.as_u16(),
            body,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ChatClientResult<Response> {
        let response = request.send().await?;
        debug!(status = response.status().as_u16(), url = %response.url(), "response");
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "request");
        self.client.request(method, url)
    }

    /// GET с разбором JSON-ответа.
    pub(crate) async fn get_json<TRes>(&self, path: &str) -> ChatClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = self.execute(self.request(Method::GET, path)).await?;
        Ok(response.json::<TRes>().await?)
    }

    /// GET с query-параметрами из сериализуемой структуры.
    ///
    /// Пустой набор параметров не добавляет `?` к URL.
    pub(crate) async fn get_json_with_query<TQuery, TRes>(
        &self,
        path: &str,
        query: &TQuery,
    ) -> ChatClientResult<TRes>
    where
        TQuery: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = self.execute(request).await?;
        Ok(response.json::<TRes>().await?)
    }

    /// универсальный helper для отправки запросов с json-payload
    pub(crate) async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
    ) -> ChatClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let response = self.execute(self.request(method, path).json(body)).await?;
        Ok(response.json::<TRes>().await?)
    }

    /// POST `multipart/form-data` с разбором JSON-ответа.
    pub(crate) async fn send_multipart<TRes>(&self, path: &str, form: Form) -> ChatClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path).multipart(form))
            .await?;
        Ok(response.json::<TRes>().await?)
    }

    /// Запрос без тела ответа (например, `DELETE` со статусом 204).
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> ChatClientResult<()> {
        self.execute(self.request(method, path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        let config = ClientConfig::new(base).expect("valid url");
        HttpClient::new(&config).expect("client builds")
    }

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = client("http://localhost:8000/");
        assert_eq!(client.endpoint("/api/chats/"), "http://localhost:8000/api/chats/");
    }

    #[test]
    fn endpoint_accepts_path_without_leading_slash() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.endpoint("api/messages/chat/3"),
            "http://localhost:8000/api/messages/chat/3"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = client("https://example.com/backend/");
        assert_eq!(
            client.endpoint("/api/messages/7"),
            "https://example.com/backend/api/messages/7"
        );
    }
}
