//! 閉区間による整数値の範囲チェック

/// 許容範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeConstraint {
    pub min: i64,
    pub max: i64,
}

impl Default for RangeConstraint {
    fn default() -> Self {
        Self { min: 0, max: i64::MAX }
    }
}

impl RangeConstraint {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// 値が範囲内かどうか判定する。値が無い場合は常に有効
///
/// 必須かどうかは別の制約（`not_null`）で宣言する。
pub fn is_valid(value: Option<i64>, bounds: &RangeConstraint) -> bool {
    match value {
        Some(v) => bounds.min <= v && v <= bounds.max,
        None => true,
    }
}
