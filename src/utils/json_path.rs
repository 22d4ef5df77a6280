// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;

/// 按键路径逐层查找 JSON 值
///
/// 任意一层缺失或不是对象时返回 `None`，不会 panic。
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// 查找数值节点
///
/// 节点存在但不是数字（例如 `null` 或对象）时同样返回 `None`。
pub fn lookup_number<'a>(value: &'a Value, path: &[&str]) -> Option<&'a serde_json::Number> {
    match lookup(value, path)? {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// 查找浮点数
pub fn lookup_f64(value: &Value, path: &[&str]) -> Option<f64> {
    lookup_number(value, path).and_then(|n| n.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_value() {
        let doc = json!({"a": {"b": {"c": 42}}});
        assert_eq!(lookup(&doc, &["a", "b", "c"]), Some(&json!(42)));
        assert_eq!(lookup(&doc, &[]), Some(&doc));
    }

    #[test]
    fn test_lookup_missing_levels() {
        let doc = json!({"a": {"b": 1}});
        assert!(lookup(&doc, &["x"]).is_none());
        assert!(lookup(&doc, &["a", "x", "y"]).is_none());
        // "b" is a number, so descending into it must not fail loudly
        assert!(lookup(&doc, &["a", "b", "c"]).is_none());
    }

    #[test]
    fn test_lookup_number_rejects_non_numbers() {
        let doc = json!({"score": null, "obj": {}, "n": 0.5, "s": "12"});
        assert!(lookup_number(&doc, &["score"]).is_none());
        assert!(lookup_number(&doc, &["obj"]).is_none());
        assert!(lookup_number(&doc, &["s"]).is_none());
        assert_eq!(lookup_f64(&doc, &["n"]), Some(0.5));
    }
}
