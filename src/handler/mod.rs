//! ハンドラーの実装（ルーティング、ボディのバインド、レスポンス変換）

pub mod response;
pub mod pattern;
pub mod body;
pub mod core;
pub mod builders;

pub use response::{Created, ResponseWrapper};
pub use self::core::{AsyncRouteHandler, Route, RouteHandler};
pub use builders::{async_get, async_post, get, post, post_raw};
pub use pattern::ensure_safe_pattern;
