//! 文本片段身份管理
//!
//! 每个文本节点在整个文档生命周期内对应唯一的 `FragmentId`。
//! 竞技场只保存弱引用，节点被移出文档并释放后，其 id 不再可解析。

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

/// 文本片段标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(usize);

impl FragmentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frag_{}", self.0)
    }
}

/// 片段竞技场
#[derive(Debug, Default)]
pub struct FragmentArena {
    nodes: Vec<Weak<Node>>,
    index: HashMap<usize, FragmentId>,
}

impl FragmentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为节点分配 id；同一节点重复调用返回同一个 id
    pub fn intern(&mut self, node: &Handle) -> FragmentId {
        let key = Rc::as_ptr(node) as usize;

        if let Some(&id) = self.index.get(&key) {
            // 弱引用仍占用这块内存，地址不会被其他节点复用
            return id;
        }

        let id = FragmentId(self.nodes.len());
        self.nodes.push(Rc::downgrade(node));
        self.index.insert(key, id);
        id
    }

    /// 查找已登记节点的 id
    pub fn lookup(&self, node: &Handle) -> Option<FragmentId> {
        self.index.get(&(Rc::as_ptr(node) as usize)).copied()
    }

    pub fn resolve(&self, id: FragmentId) -> Option<Handle> {
        self.nodes.get(id.0).and_then(Weak::upgrade)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, html_to_dom};

    #[test]
    fn test_intern_is_stable() {
        let dom = html_to_dom(b"<p>one</p><p>two</p>", "utf-8").unwrap();
        let texts: Vec<Handle> = find_nodes(&dom.document, &["p"])
            .iter()
            .map(|p| p.children.borrow()[0].clone())
            .collect();

        let mut arena = FragmentArena::new();
        let a = arena.intern(&texts[0]);
        let b = arena.intern(&texts[1]);
        assert_ne!(a, b);
        assert_eq!(arena.intern(&texts[0]), a);
        assert_eq!(arena.lookup(&texts[1]), Some(b));
        assert_eq!(arena.len(), 2);

        let resolved = arena.resolve(a).unwrap();
        assert!(Rc::ptr_eq(&resolved, &texts[0]));
    }

    #[test]
    fn test_released_nodes_do_not_resolve() {
        let mut arena = FragmentArena::new();
        let id = {
            let dom = html_to_dom(b"<p>gone</p>", "utf-8").unwrap();
            let p = find_nodes(&dom.document, &["p"]).remove(0);
            let text = p.children.borrow()[0].clone();
            arena.intern(&text)
        };
        assert!(arena.resolve(id).is_none());
        assert_eq!(id.to_string(), "frag_0");
    }
}
