use log::warn;
use serde::de::DeserializeOwned;

use crate::common::Request;
use crate::error::Error;
use crate::validation::{validate, Validate};

/// JSONボディとして受け付けるContent-Type
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &["application/json", "application/*+json"];

/// Content-Typeの許容範囲を判定
pub fn is_json_like_content_type(ct: &str) -> bool {
    let main_type = ct
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    main_type == "application/json" || main_type.ends_with("+json")
}

/// ボディをJSONとしてバインドし、型に付与された制約で検査する
///
/// ボディが無い場合は `MessageNotReadable`、JSON以外のContent-Typeは
/// `UnsupportedMediaType`、制約違反は `MethodArgumentNotValid` になる。
pub fn bind_json_body<T>(req: &Request) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    let has_non_empty_body = req.body.as_ref().map(|b| !b.is_empty()).unwrap_or(false);
    if !has_non_empty_body {
        return Err(Error::not_readable("Required request body is missing", None));
    }

    // 取込み時にヘッダーは小文字化されている前提
    let content_type = req.header("content-type");
    if !content_type.map(is_json_like_content_type).unwrap_or(false) {
        warn!("Unsupported Content-Type for JSON parsing: {:?}", content_type);
        return Err(Error::UnsupportedMediaType {
            content_type: content_type.map(str::to_string),
            supported: SUPPORTED_MEDIA_TYPES.iter().map(|s| s.to_string()).collect(),
        });
    }

    let data = req.json::<T>()?;
    let rejections = validate(&data)?;
    if rejections.is_empty() {
        Ok(data)
    } else {
        Err(Error::MethodArgumentNotValid {
            target: target_name::<T>(),
            rejections,
        })
    }
}

/// 検証対象名（型の単純名を小文字化）
fn target_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}
