//! リクエストヘッダーと接続元からの呼び出し元情報の導出

use log::debug;

use crate::common::utils::is_header_value_valid;
use crate::common::{ArgumentResolver, Request};
use crate::error::Error;

/// ヘッダーが無い場合のプレースホルダー
pub const UNDEFINED: &str = "<undefined>";

/// このリクエストIDを受け取ると `IllegalArgument` を返す
pub const REJECTED_REQUEST_ID: &str = "error";

/// 呼び出し元の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_agent: String,
    pub client_address: String,
    pub request_id: String,
}

/// [`RequestContext`] のリゾルバ
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestContextResolver;

impl RequestContextResolver {
    pub fn new() -> Self {
        Self
    }

    fn header_value(req: &Request, name: &str) -> Result<Option<String>, String> {
        match req.header(name) {
            Some(value) if !is_header_value_valid(value) => {
                Err(format!("header '{}' contains invalid characters", name))
            }
            Some(value) => Ok(Some(value.to_string())),
            None => Ok(None),
        }
    }

    fn build(req: &Request) -> Result<RequestContext, String> {
        let user_agent = Self::header_value(req, "user-agent")?;
        let request_id = Self::header_value(req, "x-request-id")?;
        Ok(RequestContext {
            user_agent: user_agent.unwrap_or_else(|| UNDEFINED.to_string()),
            client_address: req.remote_addr.clone().unwrap_or_default(),
            request_id: request_id.unwrap_or_else(|| UNDEFINED.to_string()),
        })
    }
}

impl ArgumentResolver for RequestContextResolver {
    type Output = RequestContext;

    fn resolve(&self, req: &Request) -> Result<Option<RequestContext>, Error> {
        if req.header("x-request-id") == Some(REJECTED_REQUEST_ID) {
            return Err(Error::IllegalArgument("Request ID must be specified".to_string()));
        }

        match Self::build(req) {
            Ok(context) => Ok(Some(context)),
            Err(reason) => {
                debug!("Request context could not be resolved: {}", reason);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Method;

    fn request() -> Request {
        Request::new(Method::GET, "/api/greetings".to_string())
    }

    #[test]
    fn test_resolves_headers_and_remote_address() {
        let req = request()
            .with_header("User-Agent", "curl/8.0")
            .with_header("X-Request-Id", "req-1")
            .with_remote_addr("203.0.113.7");

        let context = RequestContextResolver::new().resolve(&req).unwrap();
        assert_eq!(
            context,
            Some(RequestContext {
                user_agent: "curl/8.0".to_string(),
                client_address: "203.0.113.7".to_string(),
                request_id: "req-1".to_string(),
            })
        );
    }

    #[test]
    fn test_placeholders_for_missing_values() {
        let context = RequestContextResolver::new().resolve(&request()).unwrap().unwrap();
        assert_eq!(context.user_agent, UNDEFINED);
        assert_eq!(context.request_id, UNDEFINED);
        assert_eq!(context.client_address, "");
    }

    #[test]
    fn test_sentinel_request_id_is_rejected() {
        let req = request().with_header("X-Request-Id", "error");
        match RequestContextResolver::new().resolve(&req) {
            Err(Error::IllegalArgument(message)) => {
                assert_eq!(message, "Request ID must be specified");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_sentinel_is_case_sensitive() {
        let req = request().with_header("X-Request-Id", "ERROR");
        let context = RequestContextResolver::new().resolve(&req).unwrap().unwrap();
        assert_eq!(context.request_id, "ERROR");
    }

    #[test]
    fn test_invalid_header_yields_none() {
        let mut req = request();
        req.headers.insert("user-agent".to_string(), "bad\r\nvalue".to_string());
        assert_eq!(RequestContextResolver::new().resolve(&req).unwrap(), None);
    }
}
