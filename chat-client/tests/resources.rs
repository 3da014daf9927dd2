use chat_client::{
    ChatApiClient, ChatClientError, ChatCreate, ChatUpdate, ClientConfig, CompletionMessage,
    CompletionRequest, MessageCreate, MessageRole, MessageUpdate,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn client_for(server: &ServerGuard) -> ChatApiClient {
    let config = ClientConfig::new(server.url()).expect("mock url must be valid");
    ChatApiClient::new(config).expect("client must build")
}

/// Путь коллекции независимо от того, сравнивает ли mockito путь с query или без.
fn collection(path: &str) -> Matcher {
    Matcher::Regex(format!(r"^{path}(\?.*)?$"))
}

fn chat_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "notebooks": ["nb-1"],
        "created_at": "2025-01-01T10:00:00",
        "updated_at": "2025-01-01T10:00:00"
    })
}

fn message_json(id: i64, chat_id: i64, role: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "chat_id": chat_id,
        "role": role,
        "content": content,
        "created_at": "2025-01-01T10:00:00",
        "updated_at": "2025-01-01T10:00:00"
    })
}

#[tokio::test]
async fn list_chats_sends_page_and_page_size() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", collection("/api/chats/"))
        .match_query(Matcher::Exact("page=2&page_size=10".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [chat_json(11, "first")],
                "total": 11,
                "page": 2,
                "page_size": 10,
                "total_pages": 2
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let page = client
        .chats()
        .list(Some(2), Some(10))
        .await
        .expect("list must succeed");

    mock.assert_async().await;
    assert_eq!(page.page, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].name.as_deref(), Some("first"));
    assert!(page.is_consistent());
    assert!(!page.has_next());
}

#[tokio::test]
async fn list_chats_without_parameters_has_no_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", collection("/api/chats/"))
        .match_query(Matcher::Exact(String::new()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [],
                "total": 0,
                "page": 1,
                "page_size": 1,
                "total_pages": 0
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let page = client
        .chats()
        .list(None, None)
        .await
        .expect("list must succeed");

    mock.assert_async().await;
    assert!(page.is_empty());
}

#[tokio::test]
async fn list_chats_drops_zero_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", collection("/api/chats/"))
        .match_query(Matcher::Exact("page_size=5".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [],
                "total": 0,
                "page": 1,
                "page_size": 5,
                "total_pages": 0
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .chats()
        .list(Some(0), Some(5))
        .await
        .expect("list must succeed");

    mock.assert_async().await;
}

#[tokio::test]
async fn list_messages_targets_chat_scope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", collection("/api/messages/chat/7"))
        .match_query(Matcher::Exact("page=1".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    message_json(1, 7, "user", "hello"),
                    message_json(2, 7, "ai", "hi there")
                ],
                "total": 2,
                "page": 1,
                "page_size": 20,
                "total_pages": 1
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let page = client
        .messages()
        .list_by_chat(7, Some(1), None)
        .await
        .expect("list must succeed");

    mock.assert_async().await;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].role, MessageRole::User);
    assert_eq!(page.items[1].role, MessageRole::Ai);
}

#[tokio::test]
async fn get_chat_returns_detail_with_message_count() {
    let mut server = Server::new_async().await;
    let mut body = chat_json(5, "detail");
    body["messages_count"] = json!(3);
    let mock = server
        .mock("GET", "/api/chats/5")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let detail = client.chats().get(5).await.expect("get must succeed");

    mock.assert_async().await;
    assert_eq!(detail.chat.id, 5);
    assert_eq!(detail.messages_count, 3);
    assert!(detail.chat.created_at.parse().is_some());
}

#[tokio::test]
async fn get_missing_chat_surfaces_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/chats/404")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Chat with id 404 not found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .chats()
        .get(404)
        .await
        .expect_err("missing chat must fail");

    assert!(err.is_not_found());
    assert!(matches!(err, ChatClientError::Http { status: 404, .. }));
    assert_eq!(err.detail().as_deref(), Some("Chat with id 404 not found"));
}

#[tokio::test]
async fn create_message_rejected_by_validation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/messages/")
        .match_body(Matcher::Json(json!({
            "chat_id": 1,
            "role": "user",
            "content": ""
        })))
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"detail":[{"loc":["body","content"],"msg":"String should have at least 1 character","type":"string_too_short"}]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .messages()
        .create(&MessageCreate {
            chat_id: 1,
            role: MessageRole::User,
            content: String::new(),
        })
        .await
        .expect_err("empty content must be rejected by server");

    mock.assert_async().await;
    assert!(err.is_validation_error());
    assert_eq!(
        err.detail().as_deref(),
        Some("String should have at least 1 character")
    );
}

#[tokio::test]
async fn update_message_sends_only_present_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/messages/9")
        .match_body(Matcher::Json(json!({ "content": "edited" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(message_json(9, 2, "user", "edited").to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let message = client
        .messages()
        .update(
            9,
            &MessageUpdate {
                content: Some("edited".to_string()),
                role: None,
            },
        )
        .await
        .expect("update must succeed");

    mock.assert_async().await;
    assert_eq!(message.content, "edited");
}

#[tokio::test]
async fn empty_update_sends_empty_object() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/chats/3")
        .match_body(Matcher::Json(json!({})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_json(3, "unchanged").to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let chat = client
        .chats()
        .update(3, &ChatUpdate::default())
        .await
        .expect("update must succeed");

    mock.assert_async().await;
    assert_eq!(chat.name.as_deref(), Some("unchanged"));
    assert_eq!(chat.notebooks, vec!["nb-1".to_string()]);
}

#[tokio::test]
async fn chat_lifecycle_create_get_delete() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let create = server
        .mock("POST", "/api/chats/")
        .match_body(Matcher::Json(json!({
            "name": "lifecycle",
            "notebooks": ["nb-1"]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(chat_json(21, "lifecycle").to_string())
        .create_async()
        .await;

    let created = client
        .chats()
        .create(&ChatCreate {
            name: Some("lifecycle".to_string()),
            notebooks: vec!["nb-1".to_string()],
        })
        .await
        .expect("create must succeed");
    create.assert_async().await;

    let mut detail_body = chat_json(21, "lifecycle");
    detail_body["messages_count"] = json!(0);
    let get = server
        .mock("GET", "/api/chats/21")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(detail_body.to_string())
        .create_async()
        .await;

    let fetched = client.chats().get(created.id).await.expect("get must succeed");
    get.assert_async().await;
    get.remove_async().await;
    assert_eq!(fetched.chat.id, created.id);
    assert_eq!(fetched.chat.name, created.name);
    assert_eq!(fetched.chat.notebooks, created.notebooks);

    let delete = server
        .mock("DELETE", "/api/chats/21")
        .with_status(204)
        .create_async()
        .await;
    client
        .chats()
        .delete(created.id)
        .await
        .expect("delete must succeed");
    delete.assert_async().await;

    let _gone = server
        .mock("GET", "/api/chats/21")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Chat with id 21 not found"}"#)
        .create_async()
        .await;

    let after_delete = client.chats().get(created.id).await;
    assert!(matches!(after_delete, Err(ref err) if err.is_not_found()));
}

#[tokio::test]
async fn delete_missing_message_surfaces_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/api/messages/77")
        .with_status(404)
        .with_body(r#"{"detail":"Message with id 77 not found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .messages()
        .delete(77)
        .await
        .expect_err("delete of missing message must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn server_error_keeps_raw_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/messages/1")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .messages()
        .get(1)
        .await
        .expect_err("500 must fail");

    match err {
        ChatClientError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn health_notebooks_and_completion() {
    let mut server = Server::new_async().await;
    let health = server
        .mock("GET", "/health")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"healthy"}"#)
        .create_async()
        .await;
    let notebooks = server
        .mock("GET", collection("/api/notebooks/"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"["physics","history"]"#)
        .create_async()
        .await;
    let completion = server
        .mock("POST", "/api/chat/completion")
        .match_body(Matcher::Json(json!({
            "messages": [{ "role": "user", "content": "what is rust?" }],
            "notebooks": ["physics"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "response": "a language",
                "prefetch_content": { "keywords": ["rust"] },
                "tool_calls": []
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);

    assert!(client.health().await.expect("health").is_healthy());
    assert_eq!(
        client.notebooks().await.expect("notebooks"),
        vec!["physics".to_string(), "history".to_string()]
    );

    let response = client
        .complete(&CompletionRequest {
            messages: vec![CompletionMessage::user("what is rust?")],
            notebooks: vec!["physics".to_string()],
        })
        .await
        .expect("completion");
    assert_eq!(response.response, "a language");
    assert!(response.prefetch_content.is_some());
    assert_eq!(response.tool_calls.map(|calls| calls.len()), Some(0));

    health.assert_async().await;
    notebooks.assert_async().await;
    completion.assert_async().await;
}

#[tokio::test]
async fn upload_file_sends_multipart_form() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/files/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="notebook_id"\s+physics"#.to_string()),
            Matcher::Regex(r#"name="file"; filename="notes.txt""#.to_string()),
            Matcher::Regex(r#"name="source"\s+lecture-1"#.to_string()),
            Matcher::Regex("newton's laws".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "File 'notes.txt' processed and added to notebook 'physics'",
                "notebook_id": "physics",
                "filename": "notes.txt",
                "file_type": "image",
                "text_length": 13,
                "metadata": {},
                "status": "success"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let uploaded = client
        .upload_file(
            "physics",
            "notes.txt",
            b"newton's laws".to_vec(),
            Some("lecture-1"),
        )
        .await
        .expect("upload must succeed");

    mock.assert_async().await;
    assert_eq!(uploaded.notebook_id, "physics");
    assert_eq!(uploaded.text_length, 13);
    assert_eq!(uploaded.status, "success");
}

#[tokio::test]
async fn upload_to_missing_notebook_surfaces_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/files/upload")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Notebook 'ghost' not found. Create it first using the notebook creation endpoint."}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .upload_file("ghost", "a.pdf", b"%PDF-1.4".to_vec(), None)
        .await
        .expect_err("unknown notebook must fail");

    assert!(err.is_not_found());
    assert!(err.detail().is_some_and(|d| d.starts_with("Notebook 'ghost'")));
}

#[tokio::test]
async fn truncated_error_body_still_reports_status() {
    // Content-Length больше фактического тела: чтение тела обрывается.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\nshort")
            .await
            .expect("write");
    });

    let config = ClientConfig::new(format!("http://{addr}")).expect("valid url");
    let client = ChatApiClient::new(config).expect("client must build");
    let err = client
        .messages()
        .get(1)
        .await
        .expect_err("503 must fail");
    server.await.expect("server task");

    match err {
        ChatClientError::Http { status, body } => {
            assert_eq!(status, 503);
            assert!(body.is_empty());
        }
        other => panic!("expected http error, got {other:?}"),
    }
}
