//! actix-webによるHTTPサーバー実装（Cloud Run等のコンテナ環境向け）

use std::collections::HashMap;
use std::sync::Arc;
use log::{info, warn};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use actix_web::http::header::HeaderMap;
use actix_web::web::Bytes;

use crate::common::utils::is_header_value_valid;
use crate::common::{Method, Request, Response, parse_query_string, get_max_body_size};
use crate::FaultBridge;

/// actix-webのHeaderMapから共通形式のヘッダーに変換
///
/// 同名ヘッダーが複数ある場合は `", "` で連結する。
fn convert_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut result: HashMap<String, String> = HashMap::new();

    for (key, value) in headers.iter() {
        let value_str = match value.to_str() {
            Ok(v) if is_header_value_valid(v) => v,
            _ => {
                warn!("Dropping header '{}' with non-visible characters", key);
                continue;
            }
        };
        result
            .entry(key.as_str().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value_str);
            })
            .or_insert_with(|| value_str.to_string());
    }

    result
}

/// actix-webのリクエストから共通形式のRequestに変換
fn convert_request(req: &HttpRequest, method: Method, body: Option<Bytes>) -> Request {
    let mut request = Request::new(method, req.path().to_string());
    request.query_params = parse_query_string(req.query_string());
    request.headers = convert_headers(req.headers());
    request.body = body.map(|b| b.to_vec()).filter(|b| !b.is_empty());
    request.remote_addr = req.peer_addr().map(|addr| addr.ip().to_string());
    request
}

/// 共通形式のResponseからactix-webのHttpResponseに変換
fn convert_to_http_response(response: Response) -> HttpResponse {
    let status = actix_web::http::StatusCode::from_u16(response.status)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);

    // ヘッダーの設定
    for (key, value) in response.headers {
        builder.insert_header((key, value));
    }

    // ボディの設定
    match response.body {
        Some(body) => builder.body(body),
        None => builder.finish(),
    }
}

/// FaultBridgeアプリケーションに委譲するactix-web用ハンドラー
async fn handle_request(
    req: HttpRequest,
    body: Bytes,
    app: web::Data<Arc<FaultBridge>>,
) -> HttpResponse {
    info!("Received request: {} {}", req.method(), req.path());

    // ボディサイズ上限チェック（共通設定）
    let max = get_max_body_size();
    if body.len() > max {
        warn!("Request body too large: {} bytes (limit {})", body.len(), max);
        return HttpResponse::PayloadTooLarge().finish();
    }

    let method = match Method::from_str(req.method().as_str()) {
        Some(m) => m,
        None => {
            warn!("Unsupported method: {}", req.method());
            return HttpResponse::MethodNotAllowed().finish();
        }
    };

    let request = convert_request(&req, method, Some(body));
    convert_to_http_response(app.handle(request).await)
}

/// すべてのパス・メソッドを `handle_request` に流すルート設定
pub fn configure(app: Arc<FaultBridge>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(app))
            // リクエストボディサイズの上限（共通設定）
            .app_data(web::PayloadConfig::new(get_max_body_size()))
            .default_service(web::to(handle_request));
    }
}

/// アプリケーションをHTTPサーバーとして実行
pub async fn run_cloud_run(app: FaultBridge, host: &str, port: u16) -> std::io::Result<()> {
    info!("Starting HTTP server on {}:{}", host, port);

    // アプリケーションをArcで包んでスレッド間で共有可能にする
    let app_data = Arc::new(app);

    HttpServer::new(move || App::new().configure(configure(app_data.clone())))
        .bind((host, port))?
        .run()
        .await
}
