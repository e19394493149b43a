//! フィールド制約とバリデーション
//!
//! 制約は [`Field`] に明示的に付与し、[`Schema`] がシリアライズ済みの値
//! （`serde_json::Value`）を走査して [`FieldRejection`] を生成する。
//! 値が無いフィールドは `not_null` / `not_blank` / `not_empty` 以外の制約を満たす。

pub mod range;

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

pub use range::{is_valid, RangeConstraint};

/// フィールド単位のバリデーション失敗
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRejection {
    pub field: String,
    pub rejected_value: Value,
    pub reason: String,
}

impl FieldRejection {
    pub fn new(field: impl Into<String>, rejected_value: Value, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rejected_value,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' value as '{}' rejected. {}",
            self.field,
            display_value(&self.rejected_value),
            self.reason
        )
    }
}

/// パラメータ単位の制約違反
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// `メソッド名.パラメータ名`
    pub property_path: String,
    pub invalid_value: Value,
    pub message: String,
}

/// 文字列は引用符なし、値なしは `null` として表示
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(display_value).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
enum ConstraintKind {
    NotNull,
    NotBlank,
    NotEmpty,
    Size { min: usize, max: usize },
    Min(i64),
    Max(i64),
    Pattern { regexp: String, regex: Regex },
    Range(RangeConstraint),
}

/// 単一の制約とメッセージテンプレート
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    message: Option<String>,
}

impl Constraint {
    fn of(kind: ConstraintKind) -> Self {
        Self { kind, message: None }
    }

    pub fn not_null() -> Self {
        Self::of(ConstraintKind::NotNull)
    }

    pub fn not_blank() -> Self {
        Self::of(ConstraintKind::NotBlank)
    }

    pub fn not_empty() -> Self {
        Self::of(ConstraintKind::NotEmpty)
    }

    /// 文字数または要素数の範囲
    pub fn size(min: usize, max: usize) -> Self {
        Self::of(ConstraintKind::Size { min, max })
    }

    pub fn max_size(max: usize) -> Self {
        Self::size(0, max)
    }

    pub fn min(value: i64) -> Self {
        Self::of(ConstraintKind::Min(value))
    }

    pub fn max(value: i64) -> Self {
        Self::of(ConstraintKind::Max(value))
    }

    /// 文字列全体が正規表現にマッチすること
    pub fn pattern(regexp: &str) -> Result<Self, Error> {
        let regex = Regex::new(&format!("^(?:{})$", regexp))
            .map_err(|e| Error::Configuration(format!("invalid pattern '{}': {}", regexp, e)))?;
        Ok(Self::of(ConstraintKind::Pattern {
            regexp: regexp.to_string(),
            regex,
        }))
    }

    /// 整数値の閉区間
    pub fn range(min: i64, max: i64) -> Self {
        Self::of(ConstraintKind::Range(RangeConstraint::new(min, max)))
    }

    /// メッセージテンプレートを指定（`{min}` `{max}` `{value}` `{regexp}` を展開）
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// 値を検査し、違反していればメッセージを返す
    pub fn check(&self, value: &Value) -> Option<String> {
        if self.accepts(value) {
            None
        } else {
            Some(self.render_message())
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (ConstraintKind::NotNull, v) => !v.is_null(),
            (ConstraintKind::NotBlank, Value::Null) => false,
            (ConstraintKind::NotBlank, Value::String(s)) => !s.trim().is_empty(),
            (ConstraintKind::NotEmpty, Value::Null) => false,
            (ConstraintKind::NotEmpty, Value::String(s)) => !s.is_empty(),
            (ConstraintKind::NotEmpty, Value::Array(items)) => !items.is_empty(),
            (ConstraintKind::NotEmpty, Value::Object(map)) => !map.is_empty(),
            (_, Value::Null) => true,
            (ConstraintKind::Size { min, max }, v) => match length(v) {
                Some(len) => *min <= len && len <= *max,
                None => true,
            },
            (ConstraintKind::Min(min), Value::Number(n)) => match n.as_i64() {
                Some(i) => i >= *min,
                None => n.as_f64().map_or(false, |f| f >= *min as f64),
            },
            (ConstraintKind::Max(max), Value::Number(n)) => match n.as_i64() {
                Some(i) => i <= *max,
                None => n.as_f64().map_or(false, |f| f <= *max as f64),
            },
            (ConstraintKind::Pattern { regex, .. }, Value::String(s)) => regex.is_match(s),
            (ConstraintKind::Range(bounds), Value::Number(n)) => {
                n.as_i64().is_some() && is_valid(n.as_i64(), bounds)
            }
            _ => true,
        }
    }

    fn default_template(&self) -> &'static str {
        match self.kind {
            ConstraintKind::NotNull => "must not be null",
            ConstraintKind::NotBlank => "must not be blank",
            ConstraintKind::NotEmpty => "must not be empty",
            ConstraintKind::Size { .. } => "size must be between {min} and {max}",
            ConstraintKind::Min(_) => "must be greater than or equal to {value}",
            ConstraintKind::Max(_) => "must be less than or equal to {value}",
            ConstraintKind::Pattern { .. } => "must match \"{regexp}\"",
            ConstraintKind::Range(_) => "must be between {min} and {max}",
        }
    }

    fn render_message(&self) -> String {
        let template = self.message.as_deref().unwrap_or_else(|| self.default_template());
        let mut rendered = template.to_string();
        let mut replace = |key: &str, value: String| {
            rendered = rendered.replace(key, &value);
        };
        match &self.kind {
            ConstraintKind::Size { min, max } => {
                replace("{min}", min.to_string());
                replace("{max}", max.to_string());
            }
            ConstraintKind::Min(v) | ConstraintKind::Max(v) => replace("{value}", v.to_string()),
            ConstraintKind::Pattern { regexp, .. } => replace("{regexp}", regexp.clone()),
            ConstraintKind::Range(bounds) => {
                replace("{min}", bounds.min.to_string());
                replace("{max}", bounds.max.to_string());
            }
            _ => {}
        }
        rendered
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

/// 制約付きのフィールド記述
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    constraints: Vec<Constraint>,
    element_constraints: Vec<Constraint>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
            element_constraints: Vec::new(),
        }
    }

    /// フィールド自体に制約を追加
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// 配列の各要素に制約を追加
    pub fn each(mut self, constraint: Constraint) -> Self {
        self.element_constraints.push(constraint);
        self
    }

    fn validate(&self, value: &Value, rejections: &mut Vec<FieldRejection>) {
        for constraint in &self.constraints {
            if let Some(reason) = constraint.check(value) {
                rejections.push(FieldRejection::new(&self.name, value.clone(), reason));
            }
        }
        if let Value::Array(items) = value {
            for (i, item) in items.iter().enumerate() {
                for constraint in &self.element_constraints {
                    if let Some(reason) = constraint.check(item) {
                        rejections.push(FieldRejection::new(
                            format!("{}[{}]", self.name, i),
                            item.clone(),
                            reason,
                        ));
                    }
                }
            }
        }
    }
}

/// オブジェクトのバリデーションスキーマ
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// オブジェクト値を検査（宣言順に違反を返す）
    pub fn validate(&self, object: &Value) -> Vec<FieldRejection> {
        let mut rejections = Vec::new();
        for field in &self.fields {
            let value = object.get(&field.name).unwrap_or(&Value::Null);
            field.validate(value, &mut rejections);
        }
        rejections
    }
}

/// バリデーション対象の型
pub trait Validate: Serialize {
    /// 型に付与された制約
    fn schema() -> Result<Schema, Error> {
        Ok(Schema::new())
    }
}

impl Validate for () {}

impl Validate for Value {}

/// 値をスキーマで検査
pub fn validate<T: Validate>(target: &T) -> Result<Vec<FieldRejection>, Error> {
    let schema = T::schema()?;
    if schema.is_empty() {
        return Ok(Vec::new());
    }
    let value = serde_json::to_value(target)?;
    Ok(schema.validate(&value))
}

/// ハンドラ引数（パス変数・クエリ）の制約チェックを集約
#[derive(Debug)]
pub struct ParamValidator {
    method: String,
    violations: Vec<ConstraintViolation>,
}

impl ParamValidator {
    /// `method` は違反のプロパティパスの接頭辞になる
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            violations: Vec::new(),
        }
    }

    pub fn check(&mut self, name: &str, value: impl Into<Value>, constraints: &[Constraint]) -> &mut Self {
        let value = value.into();
        for constraint in constraints {
            if let Some(message) = constraint.check(&value) {
                self.violations.push(ConstraintViolation {
                    property_path: format!("{}.{}", self.method, name),
                    invalid_value: value.clone(),
                    message,
                });
            }
        }
        self
    }

    /// 違反があれば `Error::ConstraintViolation` を返す
    pub fn finish(self) -> Result<(), Error> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::ConstraintViolation(self.violations))
        }
    }
}
