//! 翻译优先级
//!
//! 按"是否在视口内"和"是否属于主要内容"把段落分成三个层级，
//! 调度器按层级顺序依次翻译。

use markup5ever_rcdom::Handle;

use crate::page::Page;
use crate::parsers::html::dom::{get_node_attr, get_node_name, get_parent_element};
use crate::translation::config::constants;

/// 优先级层级，顺序即翻译顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// 视口内的主要内容
    VisibleMain,
    /// 视口外的主要内容
    HiddenMain,
    /// 导航、侧边栏等
    NonMain,
}

impl Region {
    pub const ORDER: [Region; 3] = [Region::VisibleMain, Region::HiddenMain, Region::NonMain];

    pub fn label(&self) -> &'static str {
        match self {
            Region::VisibleMain => "visible-main",
            Region::HiddenMain => "hidden-main",
            Region::NonMain => "non-main",
        }
    }
}

/// 单层祖先的结构特征
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    Main,
    NonMain,
    Neutral,
}

/// 优先级分类器
pub struct PriorityClassifier<'a> {
    page: &'a Page,
}

impl<'a> PriorityClassifier<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// 元素是否与视口重叠
    pub fn is_visible(&self, element: &Handle) -> bool {
        self.page.is_in_viewport(element)
    }

    /// 元素是否属于主要内容
    ///
    /// 从元素自身开始向上检查有限层；每层先看非主要特征再看主要特征，
    /// 都没有命中时视为主要内容。
    pub fn is_main_content(element: &Handle) -> bool {
        let mut current = Some(element.clone());
        let mut depth = 0;

        while let Some(el) = current {
            if depth >= constants::MAX_ANCESTOR_DEPTH {
                break;
            }

            match Self::signature(&el) {
                Signature::NonMain => return false,
                Signature::Main => return true,
                Signature::Neutral => {}
            }

            current = get_parent_element(&el);
            depth += 1;
        }

        true
    }

    fn signature(element: &Handle) -> Signature {
        let name = get_node_name(element).unwrap_or_default();
        let role = get_node_attr(element, "role").unwrap_or_default();
        let class = get_node_attr(element, "class").unwrap_or_default();

        if constants::NON_MAIN_ELEMENTS.contains(&name)
            || constants::NON_MAIN_ROLES.contains(&role.as_str())
            || constants::NON_MAIN_CLASS_MARKERS
                .iter()
                .any(|marker| class.contains(marker))
        {
            return Signature::NonMain;
        }

        let id = get_node_attr(element, "id").unwrap_or_default();
        if constants::MAIN_ELEMENTS.contains(&name)
            || constants::MAIN_ROLES.contains(&role.as_str())
            || constants::MAIN_CLASS_MARKERS
                .iter()
                .any(|marker| class.contains(marker))
            || constants::MAIN_IDS.contains(&id.as_str())
        {
            return Signature::Main;
        }

        Signature::Neutral
    }

    /// 段落所属层级，`anchor` 为段落第一个片段的父元素
    pub fn classify(&self, anchor: &Handle) -> Region {
        match (Self::is_main_content(anchor), self.is_visible(anchor)) {
            (true, true) => Region::VisibleMain,
            (true, false) => Region::HiddenMain,
            (false, _) => Region::NonMain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{DeclaredLayout, Rect};
    use crate::parsers::html::dom::get_element_by_id;

    fn page(html: &str) -> Page {
        Page::from_html(
            html.as_bytes(),
            None,
            Box::new(DeclaredLayout),
            Rect::new(0.0, 0.0, 1024.0, 768.0),
            "https://example.com/",
        )
        .unwrap()
    }

    fn element_by_id(page: &Page, id: &str) -> Handle {
        get_element_by_id(page.document(), id).unwrap()
    }

    #[test]
    fn test_main_content_signatures() {
        let page = page(
            r#"<html><body>
            <nav><ul><li><span id="nav-item">Home</span></li></ul></nav>
            <article><div class="sidebar"><p id="side">related</p></div><p id="body-text">story</p></article>
            <div role="complementary"><p id="compl">aside text</p></div>
            <div id="content"><p id="in-content">content</p></div>
            <div class="main-content navbar"><p id="mixed">mixed</p></div>
            <section><p id="plain">no signature</p></section>
            </body></html>"#,
        );

        assert!(!PriorityClassifier::is_main_content(&element_by_id(&page, "nav-item")));
        // 最近的一层先命中 sidebar
        assert!(!PriorityClassifier::is_main_content(&element_by_id(&page, "side")));
        assert!(PriorityClassifier::is_main_content(&element_by_id(&page, "body-text")));
        assert!(!PriorityClassifier::is_main_content(&element_by_id(&page, "compl")));
        assert!(PriorityClassifier::is_main_content(&element_by_id(&page, "in-content")));
        // 同一层同时有两种特征时非主要优先
        assert!(!PriorityClassifier::is_main_content(&element_by_id(&page, "mixed")));
        assert!(PriorityClassifier::is_main_content(&element_by_id(&page, "plain")));
    }

    #[test]
    fn test_element_itself_is_checked() {
        let page = page(r#"<html><body><footer id="foot">copyright</footer></body></html>"#);
        assert!(!PriorityClassifier::is_main_content(&element_by_id(&page, "foot")));
    }

    #[test]
    fn test_regions() {
        let page = page(
            r#"<html><body>
            <main><p id="top" data-rect="0 10 500 20">top</p><p id="below" data-rect="0 5000 500 20">below</p>
            <p id="unknown">no layout</p></main>
            <aside><p id="aside" data-rect="0 10 200 20">aside</p></aside>
            </body></html>"#,
        );
        let classifier = PriorityClassifier::new(&page);

        assert_eq!(classifier.classify(&element_by_id(&page, "top")), Region::VisibleMain);
        assert_eq!(classifier.classify(&element_by_id(&page, "below")), Region::HiddenMain);
        assert_eq!(classifier.classify(&element_by_id(&page, "unknown")), Region::HiddenMain);
        assert_eq!(classifier.classify(&element_by_id(&page, "aside")), Region::NonMain);
    }
}
