//! 文档扫描器
//!
//! 按文档顺序遍历文本节点，产出可翻译的文本片段。扫描过程不修改文档。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{get_node_attr, get_node_name, get_parent_element};
use crate::translation::config::constants;
use crate::translation::storage::fragments::{FragmentArena, FragmentId};

/// 可翻译的文本片段
#[derive(Debug, Clone)]
pub struct TextFragment {
    /// 片段标识
    pub id: FragmentId,
    /// 文本节点
    pub node: Handle,
    /// 父元素
    pub parent: Handle,
    /// 去除首尾空白后的文本
    pub text: String,
}

impl TextFragment {
    /// 字符数
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 扫描统计
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub nodes_visited: usize,
    pub text_nodes_found: usize,
    pub accepted: usize,
    pub rejected_short: usize,
    pub rejected_skipped_parent: usize,
    pub rejected_code: usize,
}

impl ScanStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 文本片段被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    NoParentElement,
    SkippedParent,
    CodeLike,
}

/// 文档扫描器
#[derive(Debug, Default)]
pub struct DocumentScanner {
    stats: ScanStats,
}

impl DocumentScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 扫描 `root` 下的全部文本节点
    pub fn scan(&mut self, root: &Handle, arena: &mut FragmentArena) -> Vec<TextFragment> {
        self.stats.reset();
        let mut fragments = Vec::new();
        self.scan_recursive(root, arena, &mut fragments);

        tracing::debug!(
            "扫描完成: 访问 {} 个节点, {} 个文本节点, 接受 {} 个片段",
            self.stats.nodes_visited,
            self.stats.text_nodes_found,
            self.stats.accepted
        );

        fragments
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn scan_recursive(&mut self, node: &Handle, arena: &mut FragmentArena, out: &mut Vec<TextFragment>) {
        self.stats.nodes_visited += 1;

        if let NodeData::Text { ref contents } = node.data {
            self.stats.text_nodes_found += 1;
            let text = contents.borrow().trim().to_string();

            match Self::evaluate(node, &text) {
                Ok(parent) => {
                    self.stats.accepted += 1;
                    out.push(TextFragment {
                        id: arena.intern(node),
                        node: node.clone(),
                        parent,
                        text,
                    });
                }
                Err(Rejection::TooShort) | Err(Rejection::NoParentElement) => {
                    self.stats.rejected_short += 1
                }
                Err(Rejection::SkippedParent) => self.stats.rejected_skipped_parent += 1,
                Err(Rejection::CodeLike) => self.stats.rejected_code += 1,
            }
            return;
        }

        for child in node.children.borrow().iter() {
            self.scan_recursive(child, arena, out);
        }
    }

    /// 判断一个文本节点是否可翻译，可翻译时返回其父元素
    pub fn evaluate(node: &Handle, trimmed: &str) -> Result<Handle, Rejection> {
        if trimmed.chars().count() < constants::MIN_FRAGMENT_CHARS {
            return Err(Rejection::TooShort);
        }

        let parent = get_parent_element(node).ok_or(Rejection::NoParentElement)?;

        let parent_name = get_node_name(&parent).unwrap_or_default();
        if constants::SKIP_PARENT_ELEMENTS.contains(&parent_name) {
            return Err(Rejection::SkippedParent);
        }

        if Self::is_code_like(&parent) {
            return Err(Rejection::CodeLike);
        }

        Ok(parent)
    }

    /// 从 `element` 开始向上检查有限层祖先，任一层像代码块即返回 true
    pub fn is_code_like(element: &Handle) -> bool {
        let mut current = Some(element.clone());
        let mut depth = 0;

        while let Some(el) = current {
            if depth >= constants::MAX_ANCESTOR_DEPTH {
                break;
            }

            if let Some(name) = get_node_name(&el) {
                if constants::CODE_ELEMENTS.contains(&name) {
                    return true;
                }
            }

            if let Some(class) = get_node_attr(&el, "class") {
                if constants::CODE_CLASS_MARKERS
                    .iter()
                    .any(|marker| class.contains(marker))
                {
                    return true;
                }
            }

            current = get_parent_element(&el);
            depth += 1;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{get_body, html_to_dom};

    fn scan(html: &str) -> (Vec<String>, ScanStats) {
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        let mut arena = FragmentArena::new();
        let mut scanner = DocumentScanner::new();
        let fragments = scanner.scan(&get_body(&dom.document), &mut arena);
        (
            fragments.into_iter().map(|f| f.text).collect(),
            scanner.stats().clone(),
        )
    }

    #[test]
    fn test_short_text_rejected() {
        let (texts, stats) = scan("<html><body><p>ab</p><p>  abc  </p></body></html>");
        assert_eq!(texts, vec!["abc"]);
        assert_eq!(stats.rejected_short, 1);
    }

    #[test]
    fn test_skipped_parents() {
        let (texts, _) = scan(
            "<html><body><script>var long_script = 1;</script><style>.a { color: red }</style>\
             <noscript>enable javascript please</noscript><p>visible text</p></body></html>",
        );
        assert_eq!(texts, vec!["visible text"]);
    }

    #[test]
    fn test_code_like_ancestors() {
        let (texts, stats) = scan(
            "<html><body>\
             <pre><span>fn main() {}</span></pre>\
             <div class=\"hljs\"><span><b>highlighted</b></span></div>\
             <p class=\"language-rust\">let x = 1;</p>\
             <p><kbd>Ctrl</kbd> to copy</p>\
             <p>plain prose here</p>\
             </body></html>",
        );
        assert_eq!(texts, vec!["to copy", "plain prose here"]);
        assert_eq!(stats.rejected_code, 4);
    }

    #[test]
    fn test_code_ancestor_beyond_depth_is_ignored() {
        // 父元素为第 0 层，<code> 位于第 10 层
        let mut html = String::from("<html><body><code>");
        for _ in 0..10 {
            html.push_str("<span>");
        }
        html.push_str("deep text");
        for _ in 0..10 {
            html.push_str("</span>");
        }
        html.push_str("</code></body></html>");

        let (texts, _) = scan(&html);
        assert_eq!(texts, vec!["deep text"]);
    }

    #[test]
    fn test_document_order_and_identity() {
        let dom = html_to_dom(
            b"<html><body><p>first one</p><div><span>second</span> third</div></body></html>",
            "utf-8",
        )
        .unwrap();
        let mut arena = FragmentArena::new();
        let mut scanner = DocumentScanner::new();

        let first = scanner.scan(&get_body(&dom.document), &mut arena);
        let texts: Vec<&str> = first.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["first one", "second", "third"]);

        let second = scanner.scan(&get_body(&dom.document), &mut arena);
        let ids_a: Vec<FragmentId> = first.iter().map(|f| f.id).collect();
        let ids_b: Vec<FragmentId> = second.iter().map(|f| f.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
