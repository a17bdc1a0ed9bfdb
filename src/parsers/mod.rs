//! # 解析器模块
//!
//! 页面翻译引擎所需的 HTML 解析、DOM 操作与序列化功能。

pub mod html;

pub use html::{html_to_dom, serialize_document};
