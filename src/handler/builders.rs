use std::future::Future;

use futures::future::{self, Ready};
use serde::de::DeserializeOwned;

use crate::common::Method;
use crate::common::Request;
use crate::error::Error;
use crate::validation::Validate;

use super::core::{AsyncRouteHandler, Route, RouteHandler};
use super::response::ResponseWrapper;

// 可読性のための型エイリアス（ボディ必須の非同期ハンドラー）
pub type BodyOrError<Fut, R> = future::Either<Ready<Result<R, Error>>, Fut>;

fn missing_body() -> Error {
    Error::not_readable("Required request body is missing", None)
}

// 同期: Option<T> から T を要求し、なければエラーにする薄いアダプタ
fn require_body_sync<F, T, R>(handler: F) -> impl Fn(Request, Option<T>) -> Result<R, Error> + Send + Sync + 'static
where
    F: Fn(Request, T) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    move |req, body_data| match body_data {
        Some(data) => handler(req, data),
        None => Err(missing_body()),
    }
}

// 非同期: Option<T> から T を要求し、なければ即時エラーfutureを返すアダプタ
fn require_body_async<F, T, R, Fut>(handler: F) -> impl Fn(Request, Option<T>) -> BodyOrError<Fut, R> + Send + Sync + 'static
where
    F: Fn(Request, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    move |req, body_data| match body_data {
        Some(data) => future::Either::Right(handler(req, data)),
        None => future::Either::Left(future::ready(Err(missing_body()))),
    }
}

/// GETハンドラーを作成（パターンが不正な場合は `Error::Configuration`）
pub fn get<F, R>(path: impl Into<String>, handler: F) -> Result<RouteHandler<impl Fn(Request, Option<()>) -> Result<R, Error> + Send + Sync + 'static, (), R>, Error>
where
    F: Fn(Request) -> Result<R, Error> + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    let route = Route::try_new(Method::GET, path, false)?;
    Ok(RouteHandler::new(route, move |req, _| handler(req)))
}

/// 非同期GETハンドラーを作成
pub fn async_get<F, R, Fut>(path: impl Into<String>, handler: F) -> Result<AsyncRouteHandler<impl Fn(Request, Option<()>) -> Fut + Send + Sync + 'static, (), R, Fut>, Error>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    let route = Route::try_new(Method::GET, path, false)?;
    Ok(AsyncRouteHandler::new(route, move |req, _| handler(req)))
}

/// JSONボディを受け取るPOSTハンドラーを作成
///
/// ボディは型の制約で検査されてからハンドラーに渡される。
pub fn post<F, T, R>(path: impl Into<String>, handler: F) -> Result<RouteHandler<impl Fn(Request, Option<T>) -> Result<R, Error> + Send + Sync + 'static, T, R>, Error>
where
    F: Fn(Request, T) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    let route = Route::try_new(Method::POST, path, true)?;
    Ok(RouteHandler::new(route, require_body_sync(handler)))
}

/// 非同期POSTハンドラーを作成
pub fn async_post<F, T, R, Fut>(path: impl Into<String>, handler: F) -> Result<AsyncRouteHandler<impl Fn(Request, Option<T>) -> BodyOrError<Fut, R> + Send + Sync + 'static, T, R, BodyOrError<Fut, R>>, Error>
where
    F: Fn(Request, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    let route = Route::try_new(Method::POST, path, true)?;
    Ok(AsyncRouteHandler::new(route, require_body_async(handler)))
}

/// ボディをバインドしないPOSTハンドラーを作成（マルチパート等をハンドラー側で読む）
pub fn post_raw<F, R>(path: impl Into<String>, handler: F) -> Result<RouteHandler<impl Fn(Request, Option<()>) -> Result<R, Error> + Send + Sync + 'static, (), R>, Error>
where
    F: Fn(Request) -> Result<R, Error> + Send + Sync + 'static,
    R: ResponseWrapper + Send + Sync + 'static,
{
    let route = Route::try_new(Method::POST, path, false)?;
    Ok(RouteHandler::new(route, move |req, _| handler(req)))
}
