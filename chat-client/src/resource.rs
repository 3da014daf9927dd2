use std::fmt::Display;
use std::marker::PhantomData;

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ChatClientResult;
use crate::http_client::HttpClient;
use crate::models::{
    Chat, ChatCreate, ChatDetail, ChatUpdate, Message, MessageCreate, MessageUpdate, Page,
};
use crate::query::PageQuery;

/// Описание CRUD-ресурса бэкенда: путь коллекции и типы payload.
pub trait Resource {
    /// Путь коллекции с завершающим `/`, например `/api/chats/`.
    const COLLECTION: &'static str;

    /// Тип идентификатора.
    type Id: Display + Copy;
    /// Элемент списка и результат `create`/`update`.
    type Item: DeserializeOwned;
    /// Результат `get`.
    type Detail: DeserializeOwned;
    /// Payload `create`.
    type Create: Serialize;
    /// Payload `update`; отсутствующие поля сервер не трогает.
    type Update: Serialize;
}

#[derive(Debug, Clone, Copy)]
/// Чаты: `/api/chats/`.
pub struct Chats;

impl Resource for Chats {
    const COLLECTION: &'static str = "/api/chats/";

    type Id = i64;
    type Item = Chat;
    type Detail = ChatDetail;
    type Create = ChatCreate;
    type Update = ChatUpdate;
}

#[derive(Debug, Clone, Copy)]
/// Сообщения: `/api/messages/`.
pub struct Messages;

impl Resource for Messages {
    const COLLECTION: &'static str = "/api/messages/";

    type Id = i64;
    type Item = Message;
    type Detail = Message;
    type Create = MessageCreate;
    type Update = MessageUpdate;
}

#[derive(Debug, Clone)]
/// Типизированный доступ к одному ресурсу.
///
/// Каждая операция отправляет ровно один запрос и возвращает ошибку
/// вызывающему коду без повторов и интерпретации.
pub struct ResourceClient<R> {
    http: HttpClient,
    _resource: PhantomData<R>,
}

impl<R: Resource> ResourceClient<R> {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self {
            http,
            _resource: PhantomData,
        }
    }

    fn item_path(id: R::Id) -> String {
        format!("{}{id}", R::COLLECTION)
    }

    async fn list_at(&self, path: &str, query: PageQuery) -> ChatClientResult<Page<R::Item>> {
        self.http.get_json_with_query(path, &query).await
    }

    /// Возвращает полное представление ресурса по идентификатору.
    pub async fn get(&self, id: R::Id) -> ChatClientResult<R::Detail> {
        self.http.get_json(&Self::item_path(id)).await
    }

    /// Создаёт ресурс; идентификатор и метки времени назначает сервер.
    pub async fn create(&self, payload: &R::Create) -> ChatClientResult<R::Item> {
        self.http
            .send_json(Method::POST, R::COLLECTION, payload)
            .await
    }

    /// Частично обновляет ресурс.
    pub async fn update(&self, id: R::Id, payload: &R::Update) -> ChatClientResult<R::Item> {
        self.http
            .send_json(Method::PUT, &Self::item_path(id), payload)
            .await
    }

    /// Удаляет ресурс.
    pub async fn delete(&self, id: R::Id) -> ChatClientResult<()> {
        self.http
            .send_empty(Method::DELETE, &Self::item_path(id))
            .await
    }
}

impl ResourceClient<Chats> {
    /// Список чатов. Нулевые `page`/`page_size` не передаются серверу.
    pub async fn list(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> ChatClientResult<Page<Chat>> {
        self.list_at(Chats::COLLECTION, PageQuery::new(page, page_size))
            .await
    }
}

impl ResourceClient<Messages> {
    /// Сообщения чата, от старых к новым.
    pub async fn list_by_chat(
        &self,
        chat_id: i64,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> ChatClientResult<Page<Message>> {
        let path = format!("{}chat/{chat_id}", Messages::COLLECTION);
        self.list_at(&path, PageQuery::new(page, page_size)).await
    }
}
