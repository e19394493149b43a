//! コアトレイト定義（Handler、ArgumentResolver）

use async_trait::async_trait;
use crate::error::Error;
use super::http::{Request, Response, Method};

/// ハンドラーの特性
#[async_trait]
pub trait Handler: Send + Sync {
    /// パスとメソッドがこのハンドラにマッチするかどうかを判定
    fn matches(&self, path: &str, method: &Method) -> bool;

    /// ハンドラに関連付けられたパスパターン文字列を取得
    fn path_pattern(&self) -> &str;

    /// リクエストを処理
    async fn handle(&self, req: Request) -> Result<Response, Error>;
}

/// リクエストからハンドラ引数を導出する特性
///
/// `Ok(None)` は解決できなかったことを表し、エラーとしては伝播しない。
pub trait ArgumentResolver: Send + Sync {
    /// 解決される値の型
    type Output;

    /// リクエストから値を解決
    fn resolve(&self, req: &Request) -> Result<Option<Self::Output>, Error>;
}
