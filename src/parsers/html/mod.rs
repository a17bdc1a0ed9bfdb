//! HTML解析和处理模块
//!
//! - `dom`: 解析、节点查询与文本读写
//! - `serializer`: 序列化并按原字符集重新编码

pub mod dom;
pub mod serializer;

pub use dom::{
    find_nodes, get_body, get_charset, get_child_node_by_name, get_element_by_id, get_node_attr, get_node_name,
    get_parent_element, get_parent_node, get_text, html_to_dom, set_text, text_content,
};
pub use serializer::serialize_document;
