//! パラメータバインド（クエリ、パス変数、ヘッダー、マルチパート）

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Cause, Error};
use crate::validation::{FieldRejection, Validate};
use super::http::Request;

/// 宣言されたパラメータ型の記述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    primitive: bool,
}

impl TypeDescriptor {
    /// プリミティブ型
    pub fn primitive(name: impl Into<String>) -> Self {
        Self { name: name.into(), primitive: true }
    }

    /// 参照型（パス付きの型名）
    pub fn reference(name: impl Into<String>) -> Self {
        Self { name: name.into(), primitive: false }
    }

    /// 宣言された型名
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// パス部分を除いた型名
    pub fn simple_name(&self) -> &str {
        let tail = self.name.rsplit("::").next().unwrap_or(self.name.as_str());
        tail.rsplit('.').next().unwrap_or(tail)
    }

    /// メッセージ表示用の型名（小文字）
    pub fn display_name(&self) -> String {
        if self.primitive {
            self.name.to_lowercase()
        } else {
            self.simple_name().to_lowercase()
        }
    }
}

/// 文字列パラメータから変換可能な型
pub trait ParamType: Sized {
    /// 型の記述
    fn descriptor() -> TypeDescriptor;

    /// 生の文字列から変換
    fn parse_param(raw: &str) -> Result<Self, Cause>;
}

fn number_format(raw: &str) -> Cause {
    Cause::NumberFormat(format!("For input string: \"{}\"", raw))
}

macro_rules! numeric_param {
    ($ty:ty, $name:literal) => {
        impl ParamType for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::primitive($name)
            }

            fn parse_param(raw: &str) -> Result<Self, Cause> {
                raw.trim().parse::<$ty>().map_err(|_| number_format(raw))
            }
        }
    };
}

numeric_param!(i32, "int");
numeric_param!(i64, "long");
numeric_param!(f64, "double");

impl ParamType for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive("boolean")
    }

    fn parse_param(raw: &str) -> Result<Self, Cause> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err(Cause::Other(format!("Invalid boolean value '{}'", raw))),
        }
    }
}

impl ParamType for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::reference("std::string::String")
    }

    fn parse_param(raw: &str) -> Result<Self, Cause> {
        Ok(raw.to_string())
    }
}

fn convert<T: ParamType>(name: &str, raw: &str) -> Result<T, Error> {
    T::parse_param(raw).map_err(|cause| Error::TypeMismatch {
        name: name.to_string(),
        value: raw.to_string(),
        required_type: Some(T::descriptor()),
        cause: Some(cause),
    })
}

impl Request {
    /// 任意のクエリパラメータを取得（空文字は未指定扱い）
    pub fn query<T: ParamType>(&self, name: &str) -> Result<Option<T>, Error> {
        match self.query_params.get(name).filter(|v| !v.is_empty()) {
            Some(raw) => convert(name, raw).map(Some),
            None => Ok(None),
        }
    }

    /// クエリパラメータを取得し、未指定ならデフォルト値を使用
    pub fn query_or<T: ParamType>(&self, name: &str, default: T) -> Result<T, Error> {
        Ok(self.query(name)?.unwrap_or(default))
    }

    /// 必須クエリパラメータを取得
    pub fn require_query<T: ParamType>(&self, name: &str) -> Result<T, Error> {
        self.query(name)?.ok_or_else(|| Error::MissingParameter {
            name: name.to_string(),
            type_name: T::descriptor().simple_name().to_string(),
        })
    }

    /// パス変数を取得
    pub fn path_param<T: ParamType>(&self, name: &str) -> Result<T, Error> {
        let raw = self.path_params.get(name).ok_or_else(|| {
            Error::Binding(format!(
                "Required URI template variable '{}' for method parameter type {} is not present",
                name,
                T::descriptor().simple_name()
            ))
        })?;
        convert(name, raw)
    }

    /// 必須ヘッダーを取得
    pub fn require_header(&self, name: &str) -> Result<&str, Error> {
        self.header(name).ok_or_else(|| {
            Error::Binding(format!(
                "Required request header '{}' for method parameter type String is not present",
                name
            ))
        })
    }

    /// multipart/form-data から必須パートの内容を取得
    pub fn require_part(&self, name: &str) -> Result<Vec<u8>, Error> {
        let missing = || Error::MissingPart(name.to_string());
        let boundary = self
            .header("content-type")
            .and_then(multipart_boundary)
            .ok_or_else(missing)?;
        let body = self.body.as_deref().ok_or_else(missing)?;
        find_part(body, &boundary, name).ok_or_else(missing)
    }

    /// クエリパラメータをモデルにバインドしてバリデーション
    pub fn bind_query<T: DeserializeOwned + Validate>(&self, target: &str) -> Result<T, Error> {
        let object = |coerce: fn(&str) -> Value| -> Value {
            Value::Object(
                self.query_params
                    .iter()
                    .map(|(k, v)| (k.clone(), coerce(v)))
                    .collect::<Map<String, Value>>(),
            )
        };
        let value = object(scalar_value);

        // 数値に見える文字列フィールドのため、全て文字列として再試行する
        let parsed = serde_json::from_value::<T>(value.clone())
            .or_else(|e| serde_json::from_value::<T>(object(string_value)).map_err(|_| e));
        let model: T = parsed.map_err(|e| {
            let reason = e.to_string();
            let rejection = match reason.strip_prefix("missing field `").and_then(|r| r.split('`').next()) {
                Some(field) => FieldRejection::new(field, Value::Null, "must not be null"),
                None => FieldRejection::new(target, value.clone(), reason.clone()),
            };
            Error::Bind {
                target: target.to_string(),
                rejections: vec![rejection],
            }
        })?;

        let rejections = crate::validation::validate(&model)?;
        if rejections.is_empty() {
            Ok(model)
        } else {
            Err(Error::Bind {
                target: target.to_string(),
                rejections,
            })
        }
    }
}

/// クエリ値を数値・真偽値ならそのまま、それ以外は文字列として扱う
fn scalar_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => string_value(raw),
    }
}

fn string_value(raw: &str) -> Value {
    Value::String(raw.to_string())
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    let main_type = parts.next()?.trim().to_ascii_lowercase();
    if main_type != "multipart/form-data" {
        return None;
    }
    parts.find_map(|p| {
        p.trim()
            .strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

fn find_part(body: &[u8], boundary: &str, name: &str) -> Option<Vec<u8>> {
    let delimiter = format!("--{}", boundary);

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .skip(1)
        .find_map(|section| {
            let section = section.strip_prefix(b"\r\n").unwrap_or(section);
            let header_end = position(section, b"\r\n\r\n")?;
            let headers = String::from_utf8_lossy(&section[..header_end]);
            let is_target = headers
                .lines()
                .filter_map(disposition_name)
                .any(|part_name| part_name == name);
            if !is_target {
                return None;
            }
            let content = &section[header_end + 4..];
            Some(content.strip_suffix(b"\r\n").unwrap_or(content).to_vec())
        })
}

/// Content-Dispositionヘッダー行から `name` パラメータを取り出す
fn disposition_name(line: &str) -> Option<&str> {
    let (header, value) = line.split_once(':')?;
    if !header.trim().eq_ignore_ascii_case("content-disposition") {
        return None;
    }
    value.split(';').skip(1).find_map(|param| {
        let (key, v) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("name") {
            Some(v.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_on<'a>(mut haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut sections = Vec::new();
    while let Some(pos) = position(haystack, needle) {
        sections.push(&haystack[..pos]);
        haystack = &haystack[pos + needle.len()..];
    }
    sections.push(haystack);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::http::Method;

    #[test]
    fn test_type_descriptor_display_name() {
        assert_eq!(TypeDescriptor::primitive("int").display_name(), "int");
        assert_eq!(
            TypeDescriptor::reference("std::string::String").display_name(),
            "string"
        );
        assert_eq!(
            TypeDescriptor::reference("java.lang.Integer").display_name(),
            "integer"
        );
        assert_eq!(TypeDescriptor::reference("Tag").simple_name(), "Tag");
    }

    #[test]
    fn test_query_type_mismatch() {
        let req = Request::new(Method::GET, "/api/books".to_string())
            .with_query_param("price", "evil");

        match req.query::<i32>("price") {
            Err(Error::TypeMismatch { name, value, required_type, cause }) => {
                assert_eq!(name, "price");
                assert_eq!(value, "evil");
                assert_eq!(required_type, Some(TypeDescriptor::primitive("int")));
                assert_eq!(
                    cause,
                    Some(Cause::NumberFormat("For input string: \"evil\"".to_string()))
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_query_defaults() {
        let req = Request::new(Method::GET, "/api/books".to_string())
            .with_query_param("price", "")
            .with_query_param("count", "25");

        assert_eq!(req.query::<i32>("price").unwrap(), None);
        assert_eq!(req.query_or::<i32>("page", 0).unwrap(), 0);
        assert_eq!(req.query_or::<i32>("count", 10).unwrap(), 25);
    }

    #[test]
    fn test_require_query_missing() {
        let req = Request::new(Method::GET, "/api/books".to_string());
        let err = req.require_query::<String>("isbn").unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));
        assert_eq!(
            err.to_string(),
            "Required request parameter 'isbn' for method parameter type String is not present"
        );
    }

    #[test]
    fn test_path_param_missing_is_binding_error() {
        let req = Request::new(Method::GET, "/api/greetings".to_string());
        let err = req.path_param::<i32>("id").unwrap_err();
        assert!(matches!(err, Error::Binding(_)));
    }

    #[test]
    fn test_bool_param() {
        assert_eq!(bool::parse_param("on"), Ok(true));
        assert_eq!(bool::parse_param("No"), Ok(false));
        assert!(matches!(bool::parse_param("maybe"), Err(Cause::Other(_))));
    }

    #[test]
    fn test_require_part() {
        let body = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\r\n\
Foo books\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n\
Content-Type: image/png\r\n\r\n\
PNGDATA\r\n\
--XyZ--\r\n";
        let req = Request::new(Method::POST, "/api/books/1/cover".to_string())
            .with_header("Content-Type", "multipart/form-data; boundary=XyZ")
            .with_body(body.to_vec());

        assert_eq!(req.require_part("file").unwrap(), b"PNGDATA".to_vec());
        assert_eq!(req.require_part("title").unwrap(), b"Foo books".to_vec());
        assert!(matches!(req.require_part("other"), Err(Error::MissingPart(_))));
    }

    #[test]
    fn test_require_part_ignores_filename() {
        let body = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"cover\"; filename=\"file\"\r\n\r\n\
PNGDATA\r\n\
--XyZ--\r\n";
        let req = Request::new(Method::POST, "/api/books/1/cover".to_string())
            .with_header("Content-Type", "multipart/form-data; boundary=XyZ")
            .with_body(body.to_vec());

        assert!(matches!(req.require_part("file"), Err(Error::MissingPart(ref name)) if name == "file"));
        assert_eq!(req.require_part("cover").unwrap(), b"PNGDATA".to_vec());
    }

    #[test]
    fn test_disposition_name() {
        assert_eq!(
            disposition_name("Content-Disposition: form-data; filename=\"file\"; name=\"cover\""),
            Some("cover")
        );
        assert_eq!(disposition_name("content-disposition: form-data; name=file"), Some("file"));
        assert_eq!(disposition_name("Content-Type: image/png; name=\"file\""), None);
        assert_eq!(disposition_name("Content-Disposition: form-data; filename=\"file\""), None);
    }

    #[test]
    fn test_require_part_not_multipart() {
        let req = Request::new(Method::POST, "/api/books/1/cover".to_string())
            .with_header("Content-Type", "application/json")
            .with_body(b"{}".to_vec());
        let err = req.require_part("file").unwrap_err();
        assert_eq!(err.to_string(), "Required request part 'file' is not present");
    }
}
