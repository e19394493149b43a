//! 共通の抽象化レイヤーとトレイト定義

pub mod http;
pub mod params;
pub mod traits;
pub mod utils;

pub use http::{Method, Request, Response, StatusCode};
pub use params::{ParamType, TypeDescriptor};
pub use traits::{ArgumentResolver, Handler};
pub use utils::{get_max_body_size, parse_query_string, percent_decode};
