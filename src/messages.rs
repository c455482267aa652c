//! 外部消息契约
//!
//! 请求按 `type` 字段分派，应答是不带标签的三种固定形态之一。
//! 字段名与线上调用方保持一致（驼峰命名），不随内部结构演化。

use serde::{Deserialize, Serialize};

use crate::config::constants::DEFAULT_TARGET_LANGUAGE;

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

/// 外部请求
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// 翻译一段文本
    #[serde(rename = "TRANSLATE_TEXT")]
    TranslateText { payload: TranslatePayload },
    /// 清空译文缓存
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatePayload {
    pub text: String,
    /// 缺省目标语言为中文
    #[serde(rename = "targetLanguage", default = "default_target_language")]
    pub target_language: String,
}

/// 外部应答
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Translated {
        success: bool,
        translation: String,
        cached: bool,
    },
    CacheCleared {
        success: bool,
        #[serde(rename = "clearedItems")]
        cleared_items: usize,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl Response {
    pub fn translated(translation: String, cached: bool) -> Self {
        Self::Translated {
            success: true,
            translation,
            cached,
        }
    }

    pub fn cache_cleared(cleared_items: usize) -> Self {
        Self::CacheCleared {
            success: true,
            cleared_items,
        }
    }

    pub fn failure(error: &str) -> Self {
        Self::Failure {
            success: false,
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_request_parses_with_explicit_language() {
        let json = r#"{"type":"TRANSLATE_TEXT","payload":{"text":"Hello","targetLanguage":"en"}}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        match request {
            Request::TranslateText { payload } => {
                assert_eq!(payload.text, "Hello");
                assert_eq!(payload.target_language, "en");
            }
            other => panic!("解析出了错误的变体: {other:?}"),
        }
    }

    #[test]
    fn test_target_language_defaults_to_chinese() {
        let json = r#"{"type":"TRANSLATE_TEXT","payload":{"text":"Hello"}}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        match request {
            Request::TranslateText { payload } => assert_eq!(payload.target_language, "zh"),
            other => panic!("解析出了错误的变体: {other:?}"),
        }
    }

    #[test]
    fn test_clear_cache_request_parses() {
        let request: Request = serde_json::from_str(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
        assert!(matches!(request, Request::ClearCache));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"type":"PING"}"#).is_err());
    }

    #[test]
    fn test_translated_response_shape() {
        let json = serde_json::to_value(Response::translated("你好".to_string(), true)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["translation"], "你好");
        assert_eq!(json["cached"], true);
    }

    #[test]
    fn test_cache_cleared_response_shape() {
        let json = serde_json::to_value(Response::cache_cleared(7)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["clearedItems"], 7);
    }

    #[test]
    fn test_failure_response_shape() {
        let json = serde_json::to_value(Response::failure("没有提供文本")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "没有提供文本");
    }
}
