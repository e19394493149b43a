use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use serde::de::DeserializeOwned;

#[cfg(debug_assertions)]
use std::time::{Duration, Instant};

use crate::common::{Handler, Method, Request, Response};
use crate::error::Error;
use crate::validation::Validate;

use super::body::bind_json_body;
use super::pattern::{capture_path_params, compile_pattern};
use super::response::ResponseWrapper;

/// ルート定義（メソッド、パスパターン、ボディの扱い）
#[derive(Debug, Clone)]
pub struct Route {
    /// HTTPメソッド
    pub method: Method,
    /// ルートパス（アンカー付き正規表現パターン）
    pub path_pattern: String,
    /// コンパイル済み正規表現
    regex: Regex,
    /// JSONボディをバインドするかどうか
    pub binds_body: bool,
}

impl Route {
    /// パターンを検証・コンパイルしてルートを作成
    pub fn try_new(method: Method, path_pattern: impl Into<String>, binds_body: bool) -> Result<Self, Error> {
        let pattern = path_pattern.into();

        // パターンの安全性チェック（アンカーを付与してコンパイル）
        let regex = compile_pattern(&pattern)?;
        let safe_pattern = regex.as_str().to_string();

        // 開発時はinfo、本番相当ではdebugに落とす
        #[cfg(debug_assertions)]
        info!("Registering handler for {} with pattern: {}", method, safe_pattern);
        #[cfg(not(debug_assertions))]
        debug!("Registering handler for {} with pattern: {}", method, safe_pattern);

        Ok(Self {
            method,
            path_pattern: safe_pattern,
            regex,
            binds_body,
        })
    }

    /// パスとメソッドがマッチするかどうか
    pub fn matches(&self, path: &str, method: &Method) -> bool {
        if method != &self.method {
            return false;
        }

        // デバッグビルド時のみ所要時間を監視
        #[cfg(debug_assertions)]
        {
            let start_time = Instant::now();
            let is_match = self.regex.is_match(path);
            let elapsed = start_time.elapsed();

            if elapsed > Duration::from_millis(100) {
                warn!(
                    "Slow regex matching detected: pattern '{}' took {:?} for path '{}'",
                    self.path_pattern, elapsed, path
                );
            }

            debug!(
                "Path matching: {} against pattern {}: {} (took {:?})",
                path, self.path_pattern, is_match, elapsed
            );
            is_match
        }
        #[cfg(not(debug_assertions))]
        {
            let is_match = self.regex.is_match(path);
            debug!("Path matching: {} against pattern {}: {}", path, self.path_pattern, is_match);
            is_match
        }
    }

    /// パス変数を埋めてボディをバインドする
    fn prepare<T>(&self, mut req: Request) -> Result<(Request, Option<T>), Error>
    where
        T: DeserializeOwned + Validate,
    {
        req.path_params.extend(capture_path_params(&self.regex, &req.path));
        let body = if self.binds_body {
            Some(bind_json_body::<T>(&req)?)
        } else {
            None
        };
        Ok((req, body))
    }
}

/// ルートハンドラー
pub struct RouteHandler<F, T, R>
where
    F: Fn(Request, Option<T>) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    /// ルート定義
    pub route: Route,
    /// ハンドラー関数
    pub handler_fn: F,
    /// リクエストボディ・レスポンスの型
    _types: PhantomData<fn() -> (T, R)>,
}

impl<F, T, R> RouteHandler<F, T, R>
where
    F: Fn(Request, Option<T>) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    /// 新しいRouteHandlerを作成
    pub fn new(route: Route, handler_fn: F) -> Self {
        Self {
            route,
            handler_fn,
            _types: PhantomData,
        }
    }
}

/// 非同期ルートハンドラー
pub struct AsyncRouteHandler<F, T, R, Fut>
where
    F: Fn(Request, Option<T>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    /// ルート定義
    pub route: Route,
    /// 非同期ハンドラー関数
    pub handler_fn: F,
    /// リクエストボディ・レスポンス・Futureの型
    _types: PhantomData<fn() -> (T, R, Fut)>,
}

impl<F, T, R, Fut> AsyncRouteHandler<F, T, R, Fut>
where
    F: Fn(Request, Option<T>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    /// 新しいAsyncRouteHandlerを作成
    pub fn new(route: Route, handler_fn: F) -> Self {
        Self {
            route,
            handler_fn,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T, R> Handler for RouteHandler<F, T, R>
where
    F: Fn(Request, Option<T>) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    fn matches(&self, path: &str, method: &Method) -> bool {
        self.route.matches(path, method)
    }

    fn path_pattern(&self) -> &str {
        &self.route.path_pattern
    }

    async fn handle(&self, req: Request) -> Result<Response, Error> {
        let (req, body_data) = self.route.prepare::<T>(req)?;
        let result = (self.handler_fn)(req, body_data)?;
        result.into_response()
    }
}

#[async_trait]
impl<F, T, R, Fut> Handler for AsyncRouteHandler<F, T, R, Fut>
where
    F: Fn(Request, Option<T>) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    fn matches(&self, path: &str, method: &Method) -> bool {
        self.route.matches(path, method)
    }

    fn path_pattern(&self) -> &str {
        &self.route.path_pattern
    }

    async fn handle(&self, req: Request) -> Result<Response, Error> {
        let (req, body_data) = self.route.prepare::<T>(req)?;
        let result = (self.handler_fn)(req, body_data).await?;
        result.into_response()
    }
}
