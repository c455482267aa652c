//! 豆包（Volcengine Ark）翻译接口客户端
//!
//! 负责单个文本块的远程翻译：清洗输入、构造 responses 请求体、
//! 解析两种已知的响应形态，并剥离模型偶发附带的元话语。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TranslationConfig;
use crate::error::{TranslationError, TranslationResult};
use crate::sanitizer::sanitize;

/// 整行的「注：/Note:/Warning:」元话语
static META_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(注：|Note:|Warning:).*$").expect("内置正则必然合法"));

/// 括号内提及 translation/AI 的说明性插入语
static META_PAREN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\([^)]*(translation|AI)[^)]*\)").expect("内置正则必然合法"));

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    model: &'a str,
    input: Vec<InputItem<'a>>,
}

#[derive(Debug, Serialize)]
struct InputItem<'a> {
    role: &'a str,
    content: Vec<ContentItem<'a>>,
}

#[derive(Debug, Serialize)]
struct ContentItem<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
    translation_options: TranslationOptions<'a>,
}

/// 只携带目标语言，源语言交给服务端自动检测
#[derive(Debug, Serialize)]
struct TranslationOptions<'a> {
    target_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// 豆包翻译客户端，内部持有连接池，可被多任务共享
pub struct DoubaoClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_input_chars: usize,
}

impl DoubaoClient {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::Config(format!("HTTP 客户端初始化失败: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_input_chars: config.max_input_chars,
        })
    }

    /// 翻译单个文本块
    ///
    /// 空输入直接返回空译文，不触发网络请求。清洗阶段发现的空白输入
    /// 同样就地短路。
    pub async fn translate(&self, text: &str, target_language: &str) -> TranslationResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if self.api_key.trim().is_empty() {
            return Err(TranslationError::MissingCredential);
        }

        let clean = match sanitize(text, self.max_input_chars) {
            Ok(clean) => clean,
            Err(TranslationError::EmptyInput) => return Ok(String::new()),
            Err(e) => return Err(e),
        };
        let target = normalize_language_tag(target_language);

        let request = TranslateRequest {
            model: &self.model,
            input: vec![InputItem {
                role: "user",
                content: vec![ContentItem {
                    kind: "input_text",
                    text: &clean,
                    translation_options: TranslationOptions { target_language: &target },
                }],
            }],
        };

        tracing::debug!("发送翻译请求: {} 字符 -> {}", clean.chars().count(), target);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }

        let parsed: ApiResponse = response.json().await.map_err(|e| {
            TranslationError::InvalidResponseFormat(format!("响应不是合法 JSON: {e}"))
        })?;

        let translation = extract_translation(&parsed).ok_or_else(|| {
            TranslationError::InvalidResponseFormat("响应中没有可用的译文字段".to_string())
        })?;

        Ok(strip_artifacts(&translation))
    }
}

/// 把 `zh-CN` / `zh_TW` 这类地区化标签规范为服务端接受的主语言码
pub fn normalize_language_tag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .trim()
        .to_lowercase()
}

/// 按两种已知形态提取译文：优先 chat 风格的 choices，
/// 其次 responses 风格的 output
fn extract_translation(response: &ApiResponse) -> Option<String> {
    if let Some(content) = response
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.as_ref())
    {
        if !content.is_empty() {
            return Some(content.clone());
        }
    }

    response
        .output
        .first()
        .and_then(|o| o.content.first())
        .and_then(|c| c.text.as_ref())
        .filter(|t| !t.is_empty())
        .cloned()
}

/// 剥离模型附带的元话语行与括号说明，返回修剪后的译文
fn strip_artifacts(translation: &str) -> String {
    let without_lines = META_LINE_REGEX.replace_all(translation, "");
    let without_parens = META_PAREN_REGEX.replace_all(&without_lines, "");
    without_parens.trim().to_string()
}

/// 把非 2xx 状态码映射成带可读说明的错误
fn classify_http_error(status: u16, body: &str) -> TranslationError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    let message = match status {
        401 => "API Key 无效或未授权".to_string(),
        429 => "请求过于频繁，已触发限流".to_string(),
        500 => "翻译服务内部错误".to_string(),
        _ => format!("翻译请求失败（HTTP {status}）"),
    };

    let message = if detail.trim().is_empty() {
        message
    } else {
        format!("{message}: {detail}")
    };

    TranslationError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_language_tag() {
        assert_eq!(normalize_language_tag("zh-CN"), "zh");
        assert_eq!(normalize_language_tag("zh_TW"), "zh");
        assert_eq!(normalize_language_tag("EN"), "en");
        assert_eq!(normalize_language_tag("ja"), "ja");
    }

    #[test]
    fn test_strip_artifacts_removes_meta_lines() {
        let raw = "你好，世界\n注：以上内容由模型生成\nNote: machine output";
        assert_eq!(strip_artifacts(raw), "你好，世界");
    }

    #[test]
    fn test_strip_artifacts_removes_parenthetical_meta() {
        let raw = "译文正文 (this is an AI translation) 结尾";
        assert_eq!(strip_artifacts(raw), "译文正文  结尾");
    }

    #[test]
    fn test_strip_artifacts_keeps_ordinary_parentheses() {
        let raw = "函数 main()（入口）返回零";
        assert_eq!(strip_artifacts(raw), raw);
    }

    #[test]
    fn test_classify_http_error_known_statuses() {
        assert!(matches!(
            classify_http_error(401, ""),
            TranslationError::Http { status: 401, .. }
        ));
        let err = classify_http_error(429, r#"{"error":{"message":"slow down"}}"#);
        match err {
            TranslationError::Http { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("限流"));
                assert!(message.contains("slow down"));
            }
            other => panic!("意料之外的错误类型: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits() {
        let config = TranslationConfig::default();
        let client = DoubaoClient::new(&config).unwrap();
        assert_eq!(client.translate("   ", "zh").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected_before_network() {
        let config = TranslationConfig::default();
        let client = DoubaoClient::new(&config).unwrap();
        let err = client.translate("hello", "zh").await.unwrap_err();
        assert!(matches!(err, TranslationError::MissingCredential));
    }

    #[test]
    fn test_extract_translation_prefers_choices() {
        let json = r#"{
            "choices": [{"message": {"content": "来自 choices"}}],
            "output": [{"content": [{"text": "来自 output"}]}]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_translation(&parsed).as_deref(), Some("来自 choices"));
    }

    #[test]
    fn test_extract_translation_falls_back_to_output() {
        let json = r#"{"output": [{"content": [{"text": "译文"}]}]}"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_translation(&parsed).as_deref(), Some("译文"));
    }

    #[test]
    fn test_extract_translation_rejects_empty_shapes() {
        let parsed: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_translation(&parsed).is_none());
    }
}
