//! 布局信息提供者
//!
//! 引擎只需要元素的包围矩形来判断可见性。浏览器宿主可以直接提供真实布局；
//! 无头运行时使用 `DeclaredLayout`（由 `data-rect` 属性声明）或
//! `FlowLayout`（按文档顺序堆叠文本的估算布局）。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{get_node_attr, get_node_name};

/// 文档坐标系中的矩形
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// 是否与另一矩形有任何部分重叠（边缘相接不算）
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.top() < other.bottom()
            && self.bottom() > other.top()
            && self.left() < other.right()
            && self.right() > other.left()
    }

    /// 包含两个矩形的最小矩形
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// 解析 `"x y w h"` 形式的矩形描述，逗号和空白都可作为分隔符
    pub fn parse(value: &str) -> Option<Rect> {
        let numbers: Vec<f64> = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .ok()?;

        match numbers.as_slice() {
            [x, y, w, h] if *w >= 0.0 && *h >= 0.0 => Some(Rect::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

/// 布局提供者
pub trait LayoutProvider {
    /// 元素在文档坐标系中的包围矩形；没有布局信息的元素返回 `None`
    fn bounding_rect(&self, document: &Handle, element: &Handle) -> Option<Rect>;

    /// 文档结构变化后丢弃缓存的布局
    fn invalidate(&self) {}
}

/// 从 `data-rect` 属性读取布局
#[derive(Debug, Clone, Default)]
pub struct DeclaredLayout;

impl DeclaredLayout {
    pub const ATTRIBUTE: &'static str = "data-rect";
}

impl LayoutProvider for DeclaredLayout {
    fn bounding_rect(&self, _document: &Handle, element: &Handle) -> Option<Rect> {
        get_node_attr(element, Self::ATTRIBUTE).and_then(|value| Rect::parse(&value))
    }
}

/// 估算布局：所有非空白文本按文档顺序纵向堆叠
///
/// 每个文本节点按字符数折行，元素的矩形是其后代文本矩形的并集。
#[derive(Debug)]
pub struct FlowLayout {
    content_width: f64,
    char_width: f64,
    line_height: f64,
    cache: RefCell<Option<HashMap<usize, Rect>>>,
}

/// 不参与渲染的元素
const NON_RENDERED: &[&str] = &["head", "script", "style", "noscript", "template", "title"];

impl FlowLayout {
    pub fn new(content_width: f64, char_width: f64, line_height: f64) -> Self {
        Self {
            content_width: content_width.max(1.0),
            char_width: char_width.max(0.1),
            line_height: line_height.max(1.0),
            cache: RefCell::new(None),
        }
    }

    fn node_key(node: &Handle) -> usize {
        Rc::as_ptr(node) as usize
    }

    fn compute(&self, document: &Handle) -> HashMap<usize, Rect> {
        let mut rects = HashMap::new();
        let mut cursor_y = 0.0;
        self.flow(document, &mut cursor_y, &mut rects);
        rects
    }

    fn flow(&self, node: &Handle, cursor_y: &mut f64, rects: &mut HashMap<usize, Rect>) -> Option<Rect> {
        match &node.data {
            NodeData::Text { contents } => {
                let chars = contents.borrow().trim().chars().count();
                if chars == 0 {
                    return None;
                }
                let text_width = chars as f64 * self.char_width;
                let lines = (text_width / self.content_width).ceil().max(1.0);
                let rect = Rect::new(
                    0.0,
                    *cursor_y,
                    text_width.min(self.content_width),
                    lines * self.line_height,
                );
                *cursor_y += rect.height;
                Some(rect)
            }
            NodeData::Element { .. } => {
                let name = get_node_name(node).unwrap_or_default();
                if NON_RENDERED.contains(&name) || get_node_attr(node, "hidden").is_some() {
                    return None;
                }
                let rect = self.flow_children(node, cursor_y, rects);
                if let Some(rect) = rect {
                    rects.insert(Self::node_key(node), rect);
                }
                rect
            }
            NodeData::Document => self.flow_children(node, cursor_y, rects),
            _ => None,
        }
    }

    fn flow_children(&self, node: &Handle, cursor_y: &mut f64, rects: &mut HashMap<usize, Rect>) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for child in node.children.borrow().iter() {
            if let Some(rect) = self.flow(child, cursor_y, rects) {
                bounds = Some(match bounds {
                    Some(current) => current.union(&rect),
                    None => rect,
                });
            }
        }
        bounds
    }
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self::new(800.0, 8.0, 20.0)
    }
}

impl LayoutProvider for FlowLayout {
    fn bounding_rect(&self, document: &Handle, element: &Handle) -> Option<Rect> {
        let mut cache = self.cache.borrow_mut();
        let rects = cache.get_or_insert_with(|| self.compute(document));
        rects.get(&Self::node_key(element)).copied()
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, html_to_dom};

    #[test]
    fn test_rect_overlap_is_strict() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(Rect::new(10.0, 10.0, 5.0, 5.0).overlaps(&viewport));
        assert!(Rect::new(90.0, 90.0, 50.0, 50.0).overlaps(&viewport));
        // 恰好贴在视口下边缘
        assert!(!Rect::new(0.0, 100.0, 10.0, 10.0).overlaps(&viewport));
        assert!(!Rect::new(0.0, -10.0, 10.0, 10.0).overlaps(&viewport));
    }

    #[test]
    fn test_rect_parse() {
        assert_eq!(Rect::parse("0 10 200 30"), Some(Rect::new(0.0, 10.0, 200.0, 30.0)));
        assert_eq!(Rect::parse("0,10, 200,30"), Some(Rect::new(0.0, 10.0, 200.0, 30.0)));
        assert_eq!(Rect::parse("0 10 200"), None);
        assert_eq!(Rect::parse("0 10 -5 30"), None);
        assert_eq!(Rect::parse("a b c d"), None);
    }

    #[test]
    fn test_declared_layout() {
        let dom = html_to_dom(
            br#"<html><body><p data-rect="0 0 10 10">a</p><p>b</p></body></html>"#,
            "utf-8",
        )
        .unwrap();
        let ps = find_nodes(&dom.document, &["p"]);
        let layout = DeclaredLayout;

        assert!(layout.bounding_rect(&dom.document, &ps[0]).is_some());
        assert!(layout.bounding_rect(&dom.document, &ps[1]).is_none());
    }

    #[test]
    fn test_flow_layout_stacks_in_document_order() {
        let dom = html_to_dom(
            b"<html><head><title>ignored</title></head><body><p>first</p><p>second</p><p hidden>gone</p></body></html>",
            "utf-8",
        )
        .unwrap();
        let ps = find_nodes(&dom.document, &["p"]);
        let layout = FlowLayout::new(100.0, 10.0, 20.0);

        let first = layout.bounding_rect(&dom.document, &ps[0]).unwrap();
        let second = layout.bounding_rect(&dom.document, &ps[1]).unwrap();
        assert_eq!(first.top(), 0.0);
        assert_eq!(second.top(), first.bottom());
        assert!(layout.bounding_rect(&dom.document, &ps[2]).is_none());
    }

    #[test]
    fn test_flow_layout_wraps_long_text() {
        let long = "x".repeat(25);
        let html = format!("<html><body><p>{long}</p></body></html>");
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        let p = find_nodes(&dom.document, &["p"]).remove(0);
        let layout = FlowLayout::new(100.0, 10.0, 20.0);

        let rect = layout.bounding_rect(&dom.document, &p).unwrap();
        assert_eq!(rect.height, 60.0);
        assert_eq!(rect.width, 100.0);
    }
}
