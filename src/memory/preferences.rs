//! 用户偏好：从对话中提取的长期事实（饮食限制、过敏、口味、厨艺水平等）
//!
//! 合并规则为按键 last-write-wins；新结果中没有的键保持不变，偏好只增不丢。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 偏好值：字符串或基本类型
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PreferenceValue {
    /// 将 LLM 返回的任意 JSON 值收敛为偏好值。
    ///
    /// - 字符串 / 布尔 / 数字原样保留
    /// - 数组按元素拼成逗号分隔字符串（`["peanuts","shellfish"]` -> `peanuts, shellfish`）
    /// - 嵌套对象压缩为 JSON 文本
    /// - `null` 与空字符串视为「未提到」，返回 None
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Text(s.to_string()))
                }
            }
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(Self::from_json)
                    .map(|v| v.to_string())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(Self::Text(parts.join(", ")))
                }
            }
            Value::Object(map) => {
                if map.is_empty() {
                    None
                } else {
                    Some(Self::Text(value.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PreferenceValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PreferenceValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// 偏好集合：键唯一、按键排序，保证 prompt 渲染与快照稳定
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSet {
    entries: BTreeMap<String, PreferenceValue>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象构建；无法收敛的值（null、空串、空数组）被跳过
    pub fn from_json_object(map: &serde_json::Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .filter(|(k, _)| !k.trim().is_empty())
            .filter_map(|(k, v)| PreferenceValue::from_json(v).map(|v| (k.trim().to_string(), v)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&PreferenceValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PreferenceValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// last-write-wins 合并：同键覆盖，其余键保留
    pub fn merge(&mut self, facts: &PreferenceSet) {
        for (k, v) in &facts.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// 合并的不可变版本：返回新集合，自身不变
    pub fn merged(&self, facts: &PreferenceSet) -> PreferenceSet {
        let mut next = self.clone();
        next.merge(facts);
        next
    }

    /// 显式清空（仅由调用方主动触发）
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PreferenceValue)> {
        self.entries.iter()
    }

    /// 渲染为 `k1: v1, k2: v2`，用于注入 Generator 的 system 消息
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PreferenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.render())
    }
}

impl<K: Into<String>, V: Into<PreferenceValue>> FromIterator<(K, V)> for PreferenceSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(value: Value) -> PreferenceSet {
        PreferenceSet::from_json_object(value.as_object().unwrap())
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut prefs = facts(json!({"skill_level": "beginner"}));
        prefs.merge(&facts(json!({"skill_level": "advanced", "favorite_cuisine": "thai"})));

        let expected: PreferenceSet =
            [("skill_level", "advanced"), ("favorite_cuisine", "thai")].into_iter().collect();
        assert_eq!(prefs, expected);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = facts(json!({"allergies": "peanuts"}));
        let new = facts(json!({"dietary_restriction": "vegan", "allergies": "shellfish"}));

        let once = base.merged(&new);
        let twice = once.merged(&new);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let base = facts(json!({"allergies": "peanuts", "skill_level": "beginner"}));
        let next = base.merged(&facts(json!({"skill_level": "intermediate"})));
        assert_eq!(next.get("allergies"), Some(&PreferenceValue::from("peanuts")));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_coerce_values() {
        let prefs = facts(json!({
            "allergies": ["peanuts", "shellfish"],
            "servings": 4,
            "spicy_ok": true,
            "notes": null,
            "empty": "  ",
            "detail": {"level": "high"}
        }));
        assert_eq!(prefs.get("allergies"), Some(&PreferenceValue::from("peanuts, shellfish")));
        assert_eq!(prefs.get("servings"), Some(&PreferenceValue::Integer(4)));
        assert_eq!(prefs.get("spicy_ok"), Some(&PreferenceValue::Bool(true)));
        assert!(prefs.get("notes").is_none());
        assert!(prefs.get("empty").is_none());
        assert_eq!(prefs.get("detail"), Some(&PreferenceValue::from(r#"{"level":"high"}"#)));
    }

    #[test]
    fn test_render_sorted() {
        let prefs: PreferenceSet =
            [("skill_level", "beginner"), ("dietary_restriction", "vegan")].into_iter().collect();
        assert_eq!(prefs.render(), "dietary_restriction: vegan, skill_level: beginner");
    }

    #[test]
    fn test_serde_transparent() {
        let prefs: PreferenceSet = [("dietary_restriction", "vegan")].into_iter().collect();
        let json = serde_json::to_string(&prefs).unwrap();
        assert_eq!(json, r#"{"dietary_restriction":"vegan"}"#);
        let back: PreferenceSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prefs);
    }
}
