use serde::Serialize;

use crate::common::{Response, StatusCode};
use crate::error::Error;

/// レスポンス変換トレイト
pub trait ResponseWrapper {
    /// 自身をResponseに変換（シリアライズ失敗は `Error::Conversion`）
    fn into_response(self) -> Result<Response, Error>;
}

/// 通常のシリアライズ可能なデータ型に対するResponseWrapper実装
impl<T: Serialize> ResponseWrapper for T {
    fn into_response(self) -> Result<Response, Error> {
        Response::ok().json(&self)
    }
}

/// Response型に対するResponseWrapper実装（恒等関数）
impl ResponseWrapper for Response {
    fn into_response(self) -> Result<Response, Error> {
        Ok(self)
    }
}

/// 201 Createdとして返すデータ
#[derive(Debug, Clone, PartialEq)]
pub struct Created<T>(pub T);

impl<T: Serialize> ResponseWrapper for Created<T> {
    fn into_response(self) -> Result<Response, Error> {
        Response::with_status(StatusCode::Created).json(&self.0)
    }
}
