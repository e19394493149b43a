//! デモAPI（書籍、挨拶、バリデーション、タグ）
//!
//! 各エンドポイントはパラメータやボディのバインド・検証に失敗すると
//! [`Error`] を返し、[`FaultBridge`] がエラーレスポンスに変換する。

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::{ArgumentResolver, Request};
use crate::error::Error;
use crate::handler::{async_get, get, post, post_raw};
use crate::resolver::RequestContextResolver;
use crate::validation::{Constraint, Field, ParamValidator, Schema, Validate};
use crate::{FaultBridge, FaultBridgeBuilder};

/// 注文優先度の範囲
pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 5;

const ISBN_PATTERN: &str = r"97[89][0-9]{10}|97[89]-[0-9]{1,5}-[0-9]{1,7}-[0-9]{1,7}-[0-9]";
const TAG_PATTERN: &str = "[0-9a-zA-Z]{2,10}";

/// 書籍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub price: i32,
    pub priority: i32,
}

impl Validate for Book {
    fn schema() -> Result<Schema, Error> {
        Ok(Schema::new()
            .field(Field::new("isbn").with(Constraint::max_size(13)))
            .field(Field::new("title").with(Constraint::size(1, 50)))
            .field(Field::new("price").with(Constraint::min(0)))
            .field(Field::new("priority").with(Constraint::range(MIN_PRIORITY, MAX_PRIORITY))))
    }
}

/// バリデーション確認用のメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub name: String,
    pub nickname: Option<String>,
    pub message: Option<String>,
    pub num1: Option<i32>,
    #[serde(default = "default_num2")]
    pub num2: i32,
    #[serde(default = "default_tags")]
    pub tags: Option<Vec<String>>,
}

fn default_num2() -> i32 {
    10
}

fn default_tags() -> Option<Vec<String>> {
    Some(Vec::new())
}

impl Validate for RequestMessage {
    fn schema() -> Result<Schema, Error> {
        Ok(Schema::new()
            .field(
                Field::new("name")
                    .with(Constraint::not_blank())
                    .with(Constraint::not_null())
                    .with(Constraint::max_size(100)),
            )
            .field(
                Field::new("nickname")
                    .with(Constraint::not_blank())
                    .with(Constraint::not_null())
                    .with(Constraint::max_size(200)),
            )
            .field(
                Field::new("message")
                    .with(Constraint::not_blank())
                    .with(Constraint::max_size(300)),
            )
            .field(
                Field::new("num1")
                    .with(Constraint::not_null())
                    .with(Constraint::max(1000)),
            )
            .field(
                Field::new("tags")
                    .with(Constraint::not_empty())
                    .with(Constraint::not_null())
                    .with(Constraint::max_size(10))
                    .each(Constraint::pattern(TAG_PATTERN)?),
            ))
    }
}

/// クエリからバインドするタグ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagQuery {
    pub tag: String,
}

impl Validate for TagQuery {
    fn schema() -> Result<Schema, Error> {
        Ok(Schema::new().field(Field::new("tag").with(Constraint::pattern(TAG_PATTERN)?)))
    }
}

fn sample_books() -> Vec<Book> {
    vec![
        Book {
            isbn: "9784297109059".to_string(),
            title: "Foo books".to_string(),
            price: 580,
            priority: MAX_PRIORITY as i32,
        },
        Book {
            isbn: "9784777519699".to_string(),
            title: "Foo books".to_string(),
            price: 580,
            priority: MIN_PRIORITY as i32,
        },
    ]
}

fn search_books(req: Request) -> Result<Value, Error> {
    let isbn: Option<String> = req.query("isbn")?;
    let title: String = req.query_or("title", String::new())?;
    let price: i32 = req.query_or("price", 0)?;

    let books: Vec<Book> = sample_books()
        .into_iter()
        .filter(|b| isbn.as_deref().map_or(true, |isbn| b.isbn == isbn))
        .filter(|b| title.is_empty() || b.title.contains(&title))
        .filter(|b| b.price >= price)
        .collect();
    Ok(json!(books))
}

fn get_book(req: Request) -> Result<Book, Error> {
    let isbn: String = req.path_param("isbn")?;

    let mut validator = ParamValidator::new("getBook");
    validator.check(
        "isbn",
        isbn.as_str(),
        &[Constraint::pattern(ISBN_PATTERN)?.message("invalid ISBN")],
    );
    validator.finish()?;

    Ok(Book {
        isbn,
        title: "Foo books".to_string(),
        price: 580,
        priority: MAX_PRIORITY as i32,
    })
}

fn add_book(_req: Request, book: Book) -> Result<Book, Error> {
    info!("Received: books: {:?}", book);
    Ok(book)
}

fn upload_cover(req: Request) -> Result<Value, Error> {
    let isbn: String = req.path_param("isbn")?;
    let file = req.require_part("file")?;
    Ok(json!({ "isbn": isbn, "size": file.len() }))
}

async fn hello(req: Request) -> Result<String, Error> {
    let context = RequestContextResolver::new().resolve(&req)?;
    let message: String = req.query_or("m", "hello".to_string())?;

    let mut validator = ParamValidator::new("hello");
    validator.check(
        "message",
        message.as_str(),
        &[Constraint::max_size(10).message("length of query 'm' must be less than or equal to {max}")],
    );
    validator.finish()?;

    if let Some(context) = context {
        info!(
            "hello from {} ({}), request_id={}",
            context.client_address, context.user_agent, context.request_id
        );
    }
    Ok(message)
}

fn greeting_by_id(req: Request) -> Result<i32, Error> {
    req.path_param("id")
}

fn get_validation(req: Request) -> Result<Value, Error> {
    let id: String = req.path_param("id")?;
    let page: i32 = req.query_or("page", 0)?;
    let count: i32 = req.query_or("count", 10)?;
    let tags: Vec<String> = req
        .query::<String>("tags")?
        .map(|raw| raw.split(',').map(|t| t.trim().to_string()).collect())
        .unwrap_or_default();

    let mut validator = ParamValidator::new("get");
    validator
        .check(
            "id",
            id.as_str(),
            &[Constraint::pattern("u[0-9]{5}")?.message("This ID is invalid.")],
        )
        .check("page", page, &[Constraint::min(0)])
        .check("count", count, &[Constraint::max(50), Constraint::min(1)]);
    let tag_pattern = [Constraint::pattern(TAG_PATTERN)?];
    for (i, tag) in tags.iter().enumerate() {
        validator.check(&format!("tags[{}].tag", i), tag.as_str(), &tag_pattern);
    }
    validator.finish()?;

    Ok(json!({
        "id": id,
        "count": count,
        "page": page,
        "tags": tags,
    }))
}

fn post_validation(_req: Request, message: RequestMessage) -> Result<RequestMessage, Error> {
    Ok(message)
}

fn find_tag(req: Request) -> Result<TagQuery, Error> {
    req.bind_query::<TagQuery>("tagquery")
}

/// デモAPIのルートを登録したビルダーを返す
pub fn routes() -> Result<FaultBridgeBuilder, Error> {
    Ok(FaultBridge::builder()
        .handler(get(r"^/api/books$", search_books)?)
        .handler(get(r"^/api/books/(?P<isbn>[^/]+)$", get_book)?)
        .handler(post(r"^/api/books$", add_book)?)
        .handler(post_raw(r"^/api/books/(?P<isbn>[^/]+)/cover$", upload_cover)?)
        .handler(async_get(r"^/api/greetings$", hello)?)
        .handler(get(r"^/api/greetings/(?P<id>[^/]+)$", greeting_by_id)?)
        .handler(get(r"^/api/validations/(?P<id>[^/]+)$", get_validation)?)
        .handler(post(r"^/api/validations$", post_validation)?)
        .handler(get(r"^/api/tags$", find_tag)?))
}

/// デモAPIのアプリケーションを構築
pub fn app() -> Result<FaultBridge, Error> {
    Ok(routes()?.build())
}
