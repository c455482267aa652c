//! 文本分块与归并
//!
//! 超长文本按 Markdown 结构拆分成传输安全的块，翻译完成后按块索引
//! 原样拼接。拆分点是原文中的切割偏移（分隔符文本保留在某一侧的块
//! 里），因此 `merge_chunks(split_text(t))` 能逐字节还原原文，归并时
//! 不需要再插入任何分隔符。

use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown 分隔符，按优先级从结构最强到最弱排列
static MD_DELIMITERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\n#{1,6} ",            // 标题
        r"\n```[\s\S]*?\n```",   // 围栏代码块
        r"\n!\[[^\]]*\]\([^)]*\)", // 图片
        r"\n\[[^\]]*\]\([^)]*\)",  // 链接
        r"\n---",                // 分隔线
        r"\n\*\*",               // 粗体
        r"\n\*",                 // 斜体/列表
        r"\n- ",                 // 无序列表
        r"\n[0-9]+\. ",          // 有序列表
        r"\n\n",                 // 段落分隔
        r"\n",                   // 换行
        r" ",                    // 空格
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("内置分块正则必然合法"))
    .collect()
});

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// 把长文本拆分成若干不超过 `max_chunk_size` 个字符的块
///
/// 短文本（长度不超过上限）直接作为单块返回，不产生管道开销。
/// 其余情况依次尝试各分隔符类：第一个能切出多于一个片段、且其中至少
/// 两个片段各自装得下的分隔符类胜出，片段随后被贪心合并成尽量满的块。
/// 没有任何结构化拆分可用时退化为按固定字符宽度硬切（有损的最后手段，
/// 可能切断单词）。
pub fn split_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    if char_len(text) <= max_chunk_size {
        return vec![text.to_string()];
    }

    for delimiter in MD_DELIMITERS.iter() {
        let parts = split_at_matches(text, delimiter);
        if parts.len() > 1 {
            let fitting = parts
                .iter()
                .filter(|part| char_len(part) <= max_chunk_size)
                .count();
            if fitting > 1 {
                return coalesce_parts(&parts, max_chunk_size);
            }
        }
    }

    slice_fixed(text, max_chunk_size)
}

/// 归并翻译后的块：按索引顺序直接拼接，不补分隔符
pub fn merge_chunks<I>(chunks: I) -> String
where
    I: IntoIterator<Item = String>,
{
    chunks.into_iter().collect()
}

/// 以分隔符匹配的起止偏移为切割点拆分原文
///
/// 分隔符文本本身成为独立片段保留下来，保证所有片段拼回去与原文
/// 完全一致。
fn split_at_matches<'a>(text: &'a str, delimiter: &Regex) -> Vec<&'a str> {
    let mut offsets = vec![0, text.len()];
    for found in delimiter.find_iter(text) {
        offsets.push(found.start());
        offsets.push(found.end());
    }
    offsets.sort_unstable();
    offsets.dedup();

    offsets
        .windows(2)
        .map(|window| &text[window[0]..window[1]])
        .filter(|part| !part.is_empty())
        .collect()
}

/// 贪心合并片段：够装就继续累积，装不下就落盘开新块
///
/// 单个片段本身超限时按固定宽度硬切，确保所有产出块都不超过
/// 传输上限。
fn coalesce_parts(parts: &[&str], max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for part in parts {
        let part_len = char_len(part);

        if part_len > max_chunk_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(slice_fixed(part, max_chunk_size));
            continue;
        }

        if current_len + part_len <= max_chunk_size {
            current.push_str(part);
            current_len += part_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = (*part).to_string();
            current_len = part_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 按固定字符宽度硬切
fn slice_fixed(text: &str, max_chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chunk_size)
        .map(|slice| slice.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_lossless(text: &str, max_chunk_size: usize) {
        let chunks = split_text(text, max_chunk_size);
        assert!(
            chunks
                .iter()
                .all(|chunk| char_len(chunk) <= max_chunk_size),
            "存在超限的块"
        );
        assert_eq!(merge_chunks(chunks), text, "拆分后拼接必须还原原文");
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "短文本不需要拆分";
        assert_eq!(split_text(text, 800), vec![text.to_string()]);
    }

    #[test]
    fn test_exactly_at_limit_is_single_chunk() {
        let text = "a".repeat(800);
        assert_eq!(split_text(&text, 800).len(), 1);
    }

    #[test]
    fn test_paragraph_split_is_lossless() {
        let paragraph = "Lorem ipsum dolor sit amet. ".repeat(20);
        let text = format!("{p}\n\n{p}\n\n{p}", p = paragraph.trim_end());
        assert_lossless(&text, 800);
        assert!(split_text(&text, 800).len() > 1);
    }

    #[test]
    fn test_heading_split_is_lossless() {
        let body = "content line ".repeat(50);
        let text = format!("intro {b}\n# First {b}\n## Second {b}", b = body.trim_end());
        assert_lossless(&text, 800);
    }

    #[test]
    fn test_space_split_when_no_structure() {
        let text = "word ".repeat(400);
        assert_lossless(text.trim_end(), 800);
    }

    #[test]
    fn test_fixed_slicing_fallback() {
        // 既没有换行也没有空格，只能硬切
        let text = "a".repeat(2000);
        let chunks = split_text(&text, 800);
        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0]), 800);
        assert_eq!(char_len(&chunks[1]), 800);
        assert_eq!(char_len(&chunks[2]), 400);
        assert_eq!(merge_chunks(chunks), text);
    }

    #[test]
    fn test_multibyte_text_is_lossless() {
        let text = "翻译管道需要处理中文文本。".repeat(120);
        assert_lossless(&text, 800);
    }

    #[test]
    fn test_greedy_coalescing_fills_chunks() {
        // 大量小段落应当被合并成尽量满的块，而不是一段一块
        let text = (0..100)
            .map(|i| format!("段落 {i} 的内容"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = split_text(&text, 800);
        assert!(chunks.len() < 20, "贪心合并应显著减少块数: {}", chunks.len());
        assert_eq!(merge_chunks(chunks), text);
    }

    #[test]
    fn test_merge_preserves_index_order() {
        let chunks = vec!["一".to_string(), "二".to_string(), "三".to_string()];
        assert_eq!(merge_chunks(chunks), "一二三");
    }
}
