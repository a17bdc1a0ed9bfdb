//! 页面文档模型
//!
//! `Page` 把解析后的 DOM、布局提供者、可变视口和当前地址组合在一起，
//! 相当于浏览器里一个标签页的文档视图。所有方法都通过 `&self` 调用，
//! 以便在单线程异步任务之间共享。

pub mod layout;

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::html::dom::{get_body, get_charset, html_to_dom};
use crate::parsers::html::serializer::serialize_document;

pub use layout::{DeclaredLayout, FlowLayout, LayoutProvider, Rect};

/// 文档视图
pub struct Page {
    dom: RcDom,
    encoding: String,
    layout: Box<dyn LayoutProvider>,
    viewport: Cell<Rect>,
    location: RefCell<String>,
}

impl Page {
    /// 用已解析的 DOM 创建页面
    pub fn new(
        dom: RcDom,
        layout: Box<dyn LayoutProvider>,
        viewport: Rect,
        location: impl Into<String>,
    ) -> Self {
        Self {
            dom,
            encoding: "utf-8".to_string(),
            layout,
            viewport: Cell::new(viewport),
            location: RefCell::new(location.into()),
        }
    }

    /// 从 HTML 字节创建页面
    ///
    /// 先按 `encoding_hint`（缺省 UTF-8）解析；若文档声明了不同的可识别字符集，
    /// 则按声明的字符集重新解析。
    pub fn from_html(
        data: &[u8],
        encoding_hint: Option<&str>,
        layout: Box<dyn LayoutProvider>,
        viewport: Rect,
        location: impl Into<String>,
    ) -> io::Result<Self> {
        let mut encoding = encoding_hint.unwrap_or("utf-8").to_string();
        let mut dom = html_to_dom(data, &encoding)?;

        if let Some(declared) = get_charset(&dom.document) {
            let known = encoding_rs::Encoding::for_label(declared.as_bytes());
            let current = encoding_rs::Encoding::for_label(encoding.as_bytes());
            if known.is_some() && known != current {
                tracing::debug!("按文档声明的字符集重新解析: {}", declared);
                dom = html_to_dom(data, &declared)?;
                encoding = declared;
            }
        }

        let mut page = Self::new(dom, layout, viewport, location);
        page.encoding = encoding;
        Ok(page)
    }

    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    /// 文档根节点
    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    /// body 元素
    pub fn body(&self) -> Handle {
        get_body(&self.dom.document)
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn viewport(&self) -> Rect {
        self.viewport.get()
    }

    /// 滚动到指定位置，视口大小不变
    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut viewport = self.viewport.get();
        viewport.x = x;
        viewport.y = y;
        self.viewport.set(viewport);
    }

    pub fn resize(&self, width: f64, height: f64) {
        let mut viewport = self.viewport.get();
        viewport.width = width;
        viewport.height = height;
        self.viewport.set(viewport);
    }

    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    /// 页内导航（只改变地址，不重新加载文档）
    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.borrow_mut() = location.into();
    }

    pub fn bounding_rect(&self, element: &Handle) -> Option<Rect> {
        self.layout.bounding_rect(&self.dom.document, element)
    }

    /// 元素是否与当前视口重叠
    pub fn is_in_viewport(&self, element: &Handle) -> bool {
        self.bounding_rect(element)
            .is_some_and(|rect| rect.overlaps(&self.viewport.get()))
    }

    pub fn invalidate_layout(&self) {
        self.layout.invalidate();
    }

    /// 用新的 HTML 片段替换 body 的全部内容，模拟单页应用的路由切换
    pub fn replace_body(&self, html: &str) -> io::Result<()> {
        let fresh = html_to_dom(html.as_bytes(), "utf-8")?;
        let new_body = get_body(&fresh.document);
        let body = self.body();

        for old in body.children.borrow_mut().drain(..) {
            old.parent.set(None);
        }

        let moved: Vec<Handle> = new_body.children.borrow_mut().drain(..).collect();
        for child in moved {
            child.parent.set(Some(Rc::downgrade(&body)));
            body.children.borrow_mut().push(child);
        }

        self.invalidate_layout();
        Ok(())
    }

    /// 按文档字符集序列化当前 DOM
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        serialize_document(&self.dom, &self.encoding)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("encoding", &self.encoding)
            .field("viewport", &self.viewport.get())
            .field("location", &*self.location.borrow())
            .finish_non_exhaustive()
    }
}
