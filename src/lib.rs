//! FaultBridge: リクエストのバインド・バリデーション失敗を構造化エラーレスポンスに変換するライブラリ
//!
//! ハンドラーが返した失敗を固定のカテゴリに分類し、カテゴリごとのメッセージと
//! ステータスコードを持つJSONボディとして返却する。

pub mod advice;
pub mod api;
pub mod common;
pub mod error;
pub mod handler;
pub mod resolver;
pub mod validation;

#[cfg(feature = "cloud_run")]
pub mod cloudrun;

use std::sync::Arc;

use log::debug;

pub use advice::{ErrorAdvice, ErrorKind, ErrorLog, ErrorResponse, RequestInfo, WarnLog};
pub use common::*;
pub use error::{Cause, Error};
pub use handler::*;
pub use resolver::{RequestContext, RequestContextResolver};

/// リクエストを処理するアプリケーションを構築するためのビルダー
pub struct FaultBridgeBuilder {
    handlers: Vec<Box<dyn common::Handler>>,
    advice: Option<ErrorAdvice>,
}

impl Default for FaultBridgeBuilder {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            advice: None,
        }
    }
}

impl FaultBridgeBuilder {
    /// 新しいFaultBridgeBuilderインスタンスを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ハンドラを追加
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: common::Handler + 'static,
    {
        self.handlers.push(Box::new(handler));
        // ハンドラーを追加するたびにパスの `/` の数で降順ソート
        self.handlers.sort_by(|a, b| {
            let count_a = a.path_pattern().matches('/').count();
            let count_b = b.path_pattern().matches('/').count();
            // 降順ソート (多い方が先)
            count_b.cmp(&count_a)
        });
        self
    }

    /// エラーレスポンスの変換設定を指定
    pub fn advice(mut self, advice: ErrorAdvice) -> Self {
        self.advice = Some(advice);
        self
    }

    /// 失敗ログの出力先を指定（その他の設定は環境変数から）
    pub fn error_log(self, log: Arc<dyn ErrorLog>) -> Self {
        self.advice(ErrorAdvice::from_env(log))
    }

    /// アプリケーションをビルドして返却
    pub fn build(self) -> FaultBridge {
        FaultBridge {
            handlers: self.handlers,
            advice: self
                .advice
                .unwrap_or_else(|| ErrorAdvice::from_env(Arc::new(WarnLog))),
        }
    }
}

/// リクエストを処理するアプリケーション
pub struct FaultBridge {
    handlers: Vec<Box<dyn common::Handler>>,
    advice: ErrorAdvice,
}

impl FaultBridge {
    /// 新しいFaultBridgeBuilderインスタンスを作成
    pub fn builder() -> FaultBridgeBuilder {
        FaultBridgeBuilder::new()
    }

    /// 指定されたパスにマッチするハンドラを取得
    pub fn find_handler(&self, path: &str, method: &common::Method) -> Option<&dyn common::Handler> {
        self.handlers
            .iter()
            .find(|handler| handler.matches(path, method))
            .map(|handler| handler.as_ref())
    }

    /// エラーレスポンスの変換設定
    pub fn advice(&self) -> &ErrorAdvice {
        &self.advice
    }

    /// リクエストをディスパッチし、失敗はエラーレスポンスに変換する
    pub async fn handle(&self, req: common::Request) -> common::Response {
        // ハンドラーがリクエストを消費するため、ログ用の情報を先に取得
        let info = RequestInfo::from_request(&req);

        let result = match self.find_handler(&req.path, &req.method) {
            Some(handler) => handler.handle(req).await,
            None => {
                debug!("No handler found for {} {}", req.method, req.path);
                Err(Error::NotFound(Some(format!(
                    "No handler found for {} {}",
                    req.method, req.path
                ))))
            }
        };

        match result {
            Ok(response) => response,
            Err(err) => self.advice.handle(&err, &info),
        }
    }
}
