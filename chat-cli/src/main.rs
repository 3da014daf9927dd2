mod logging;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chat_client::{
    API_BASE_URL_ENV, Chat, ChatApiClient, ChatClientError, ChatCreate, ChatDetail, ChatUpdate,
    ClientConfig, CompletionMessage, CompletionRequest, CompletionResponse, FileUploadResponse,
    Message, MessageCreate, MessageRole, MessageUpdate, Page,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "chat-cli", version, about = "CLI клиент для API истории чатов")]
struct Cli {
    /// Адрес бэкенда (по умолчанию API_BASE_URL или http://localhost:8000).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Печатать ответы как JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Подробные логи запросов (уровень debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Операции с чатами.
    #[command(subcommand)]
    Chats(ChatsCommand),
    /// Операции с сообщениями.
    #[command(subcommand)]
    Messages(MessagesCommand),
    /// Загрузка файлов в блокноты.
    #[command(subcommand)]
    Files(FilesCommand),
    /// Проверка доступности бэкенда.
    Health,
    /// Список доступных блокнотов.
    Notebooks,
    /// Генерация ответа модели (история не сохраняется).
    Complete {
        /// Реплика пользователя; можно указать несколько раз.
        #[arg(long = "message", required = true)]
        messages: Vec<String>,
        /// Блокнот для поиска контекста; можно указать несколько раз.
        #[arg(long = "notebook")]
        notebooks: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct PageArgs {
    /// Номер страницы (с единицы; 0 означает «не передавать»).
    #[arg(long)]
    page: Option<u32>,
    /// Размер страницы (0 означает «не передавать»).
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum ChatsCommand {
    /// Список чатов.
    List {
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Чат по id вместе с количеством сообщений.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Создание чата.
    Create {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "notebook")]
        notebooks: Vec<String>,
    },
    /// Обновление чата. Неуказанные поля не меняются.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "notebook")]
        notebooks: Option<Vec<String>>,
    },
    /// Удаление чата вместе с сообщениями.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum MessagesCommand {
    /// Сообщения чата.
    List {
        #[arg(long)]
        chat_id: i64,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Сообщение по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Создание сообщения.
    Create {
        #[arg(long)]
        chat_id: i64,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        content: String,
    },
    /// Обновление сообщения. Неуказанные поля не меняются.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Удаление сообщения.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum FilesCommand {
    /// Загрузка PDF или изображения в блокнот.
    Upload {
        #[arg(long)]
        notebook_id: String,
        /// Путь к файлу.
        #[arg(long)]
        path: PathBuf,
        /// Источник; по умолчанию имя файла.
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    User,
    Ai,
    System,
}

impl From<RoleArg> for MessageRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::User => MessageRole::User,
            RoleArg::Ai => MessageRole::Ai,
            RoleArg::System => MessageRole::System,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env необязателен
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init_logging(if cli.verbose { "debug" } else { "warn" })?;

    let config = resolve_config(cli.server)?;
    let client = ChatApiClient::new(config).context("не удалось создать клиент")?;
    let output = Output { json: cli.json };

    match cli.command {
        Command::Chats(command) => run_chats(&client, &output, command).await,
        Command::Messages(command) => run_messages(&client, &output, command).await,
        Command::Files(FilesCommand::Upload {
            notebook_id,
            path,
            source,
        }) => {
            let filename = upload_file_name(&path)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("не удалось прочитать {}", path.display()))?;
            let uploaded = client
                .upload_file(&notebook_id, &filename, bytes, source.as_deref())
                .await
                .map_err(map_client_error)?;
            output.emit(&uploaded, || print_upload(&uploaded))
        }
        Command::Health => {
            let health = client.health().await.map_err(map_client_error)?;
            output.emit(&health, || println!("status: {}", health.status))
        }
        Command::Notebooks => {
            let notebooks = client.notebooks().await.map_err(map_client_error)?;
            output.emit(&notebooks, || {
                println!("Блокнотов: {}", notebooks.len());
                for notebook in &notebooks {
                    println!("- {notebook}");
                }
            })
        }
        Command::Complete {
            messages,
            notebooks,
        } => {
            let request = CompletionRequest {
                messages: messages.into_iter().map(CompletionMessage::user).collect(),
                notebooks,
            };
            let response = client
                .complete(&request)
                .await
                .map_err(map_client_error)?;
            output.emit(&response, || print_completion(&response))
        }
    }
}

async fn run_chats(client: &ChatApiClient, output: &Output, command: ChatsCommand) -> Result<()> {
    let chats = client.chats();
    match command {
        ChatsCommand::List { paging } => {
            let page = chats
                .list(paging.page, paging.page_size)
                .await
                .map_err(map_client_error)?;
            output.emit(&page, || print_chat_page(&page))
        }
        ChatsCommand::Get { id } => {
            let detail = chats.get(id).await.map_err(map_client_error)?;
            output.emit(&detail, || print_chat_detail(&detail))
        }
        ChatsCommand::Create { name, notebooks } => {
            let chat = chats
                .create(&ChatCreate { name, notebooks })
                .await
                .map_err(map_client_error)?;
            output.emit(&chat, || print_chat("Чат создан", &chat))
        }
        ChatsCommand::Update {
            id,
            name,
            notebooks,
        } => {
            let chat = chats
                .update(id, &ChatUpdate { name, notebooks })
                .await
                .map_err(map_client_error)?;
            output.emit(&chat, || print_chat("Чат обновлён", &chat))
        }
        ChatsCommand::Delete { id } => {
            chats.delete(id).await.map_err(map_client_error)?;
            println!("Чат удалён: id={id}");
            Ok(())
        }
    }
}

async fn run_messages(
    client: &ChatApiClient,
    output: &Output,
    command: MessagesCommand,
) -> Result<()> {
    let messages = client.messages();
    match command {
        MessagesCommand::List { chat_id, paging } => {
            let page = messages
                .list_by_chat(chat_id, paging.page, paging.page_size)
                .await
                .map_err(map_client_error)?;
            output.emit(&page, || print_message_page(&page))
        }
        MessagesCommand::Get { id } => {
            let message = messages.get(id).await.map_err(map_client_error)?;
            output.emit(&message, || print_message("Сообщение", &message))
        }
        MessagesCommand::Create {
            chat_id,
            role,
            content,
        } => {
            let message = messages
                .create(&MessageCreate {
                    chat_id,
                    role: role.into(),
                    content,
                })
                .await
                .map_err(map_client_error)?;
            output.emit(&message, || print_message("Сообщение создано", &message))
        }
        MessagesCommand::Update { id, role, content } => {
            let message = messages
                .update(
                    id,
                    &MessageUpdate {
                        content,
                        role: role.map(MessageRole::from),
                    },
                )
                .await
                .map_err(map_client_error)?;
            output.emit(&message, || print_message("Сообщение обновлено", &message))
        }
        MessagesCommand::Delete { id } => {
            messages.delete(id).await.map_err(map_client_error)?;
            println!("Сообщение удалено: id={id}");
            Ok(())
        }
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            let rendered =
                serde_json::to_string_pretty(value).context("не удалось сериализовать ответ")?;
            println!("{rendered}");
        } else {
            text();
        }
        Ok(())
    }
}

fn resolve_config(server: Option<String>) -> Result<ClientConfig> {
    let config = match server {
        Some(server) => ClientConfig::new(normalize_server(server)),
        None => ClientConfig::from_env(),
    };
    config.with_context(|| format!("некорректный адрес сервера (--server или {API_BASE_URL_ENV})"))
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_client_error(err: ChatClientError) -> anyhow::Error {
    let detail = err.detail();
    let message = match &err {
        _ if err.is_not_found() => match detail {
            Some(detail) => format!("ресурс не найден: {detail}"),
            None => "ресурс не найден".to_string(),
        },
        _ if err.is_validation_error() => match detail {
            Some(detail) => format!("некорректный запрос: {detail}"),
            None => "некорректный запрос".to_string(),
        },
        ChatClientError::Http { status, body } => {
            let text = detail.unwrap_or_else(|| body.clone());
            format!("сервер вернул {status}: {text}")
        }
        ChatClientError::Transport(inner) => format!("ошибка HTTP: {inner}"),
        ChatClientError::Config(message) => format!("ошибка конфигурации: {message}"),
    };
    anyhow::anyhow!(message)
}

fn print_chat(title: &str, chat: &Chat) {
    println!("{title}");
    println!("id: {}", chat.id);
    println!("name: {}", chat.name.as_deref().unwrap_or("-"));
    println!("notebooks: {}", format_notebooks(&chat.notebooks));
    println!("created_at: {}", chat.created_at);
    println!("updated_at: {}", chat.updated_at);
}

fn print_chat_detail(detail: &ChatDetail) {
    print_chat("Чат", &detail.chat);
    println!("messages_count: {}", detail.messages_count);
}

fn print_message(title: &str, message: &Message) {
    println!("{title}");
    println!("id: {}", message.id);
    println!("chat_id: {}", message.chat_id);
    println!("role: {}", message.role);
    println!("content: {}", message.content);
    println!("created_at: {}", message.created_at);
    println!("updated_at: {}", message.updated_at);
}

fn print_page_header<T>(label: &str, page: &Page<T>) {
    println!(
        "{label}: {} (page={}/{}, page_size={}, total={})",
        page.len(),
        page.page,
        page.total_pages,
        page.page_size,
        page.total
    );
}

fn print_chat_page(page: &Page<Chat>) {
    print_page_header("Чатов", page);
    for chat in &page.items {
        println!(
            "- [{}] {} (notebooks: {})",
            chat.id,
            chat.name.as_deref().unwrap_or("-"),
            format_notebooks(&chat.notebooks)
        );
    }
}

fn print_message_page(page: &Page<Message>) {
    print_page_header("Сообщений", page);
    for message in &page.items {
        println!("- [{}] {}: {}", message.id, message.role, message.content);
    }
}

fn print_completion(response: &CompletionResponse) {
    println!("{}", response.response);
    if let Some(calls) = response.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
        println!("tool_calls: {}", calls.len());
    }
}

fn print_upload(uploaded: &FileUploadResponse) {
    println!("{}", uploaded.message);
    println!("notebook_id: {}", uploaded.notebook_id);
    println!("filename: {}", uploaded.filename);
    println!("file_type: {}", uploaded.file_type);
    println!("text_length: {}", uploaded.text_length);
}

fn upload_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("у пути нет имени файла: {}", path.display()))
}

fn format_notebooks(notebooks: &[String]) -> String {
    if notebooks.is_empty() {
        return "-".to_string();
    }
    notebooks.join(", ")
}
