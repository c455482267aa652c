//! 输入文本清洗
//!
//! 文本进入传输层之前先在这里去除控制字符并截断到长度上限。
//! 所有函数都是纯函数，没有任何副作用。

use crate::error::{TranslationError, TranslationResult};

/// 去除不可打印的 ASCII 控制字符
///
/// 保留换行（0x0A）、制表符（0x09）和回车（0x0D），其余
/// 0x00–0x08、0x0B–0x0C、0x0E–0x1F 全部删除。
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}'
            )
        })
        .collect()
}

/// 清洗一段待发送的文本
///
/// 处理顺序：先按字符数截断到 `max_chars`（参考值 800，约对应豆包
/// 1k token 预算），再去除控制字符，最后做空判定——截断发生在空判定
/// 之前，截断后为空的文本同样算清洗失败。
///
/// # 错误
///
/// 清洗后只剩空白时返回 [`TranslationError::EmptyInput`]。
pub fn sanitize(text: &str, max_chars: usize) -> TranslationResult<String> {
    let truncated: String = if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    };

    let cleaned = strip_control_chars(&truncated);

    if cleaned.trim().is_empty() {
        return Err(TranslationError::EmptyInput);
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize("Hello\x00World\x01", 800).unwrap(), "HelloWorld");
    }

    #[test]
    fn test_preserves_newline_tab_and_cr() {
        assert_eq!(
            sanitize("第一行\n\t第二行\r\n", 800).unwrap(),
            "第一行\n\t第二行\r\n"
        );
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long_text = "a".repeat(1000);
        let result = sanitize(&long_text, 800).unwrap();
        assert_eq!(result.chars().count(), 800);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 多字节字符按字符数截断，不能切在字节中间
        let text = "译".repeat(1000);
        let result = sanitize(&text, 800).unwrap();
        assert_eq!(result.chars().count(), 800);
        assert!(result.chars().all(|c| c == '译'));
    }

    #[test]
    fn test_empty_after_sanitization_fails() {
        let result = sanitize("\x00\x01\x02", 800);
        assert!(matches!(result, Err(TranslationError::EmptyInput)));
    }

    #[test]
    fn test_whitespace_only_fails() {
        assert!(matches!(
            sanitize("   \n\t  ", 800),
            Err(TranslationError::EmptyInput)
        ));
    }

    #[test]
    fn test_valid_text_passes_through() {
        assert_eq!(sanitize("Hello World!", 800).unwrap(), "Hello World!");
    }
}
