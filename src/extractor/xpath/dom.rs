//! HTML 文档的扁平化节点表
//! 节点按文档先序存放，下标即文档顺序
use std::collections::HashMap;

use scraper::{ElementRef, Html, Node};

pub enum NodeKind<'a> {
    Document,
    Element(ElementRef<'a>),
    Text(&'a str),
    Comment(&'a str),
}

pub struct DomNode<'a> {
    pub kind: NodeKind<'a>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

pub struct Dom<'a> {
    nodes: Vec<DomNode<'a>>,
}

impl<'a> Dom<'a> {
    /// 文档类型声明、处理指令不入表
    pub fn build(html: &'a Html) -> Self {
        let mut nodes: Vec<DomNode<'a>> = Vec::new();
        let mut index = HashMap::new();

        for node in html.tree.root().descendants() {
            let kind = match node.value() {
                Node::Document | Node::Fragment => NodeKind::Document,
                Node::Element(_) => match ElementRef::wrap(node) {
                    Some(element) => NodeKind::Element(element),
                    None => continue,
                },
                Node::Text(text) => NodeKind::Text(&text.text),
                Node::Comment(comment) => NodeKind::Comment(&comment.comment),
                _ => continue,
            };

            let parent = node.parent().and_then(|p| index.get(&p.id()).copied());
            let idx = nodes.len();
            index.insert(node.id(), idx);
            if let Some(p) = parent {
                nodes[p].children.push(idx);
            }
            nodes.push(DomNode {
                kind,
                parent,
                children: Vec::new(),
            });
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: usize) -> &DomNode<'a> {
        &self.nodes[idx]
    }

    pub fn element(&self, idx: usize) -> Option<&ElementRef<'a>> {
        match &self.nodes[idx].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_name(&self, idx: usize) -> Option<&'a str> {
        self.element(idx).map(|el| el.value().name())
    }

    pub fn attributes(&self, idx: usize) -> Vec<(&'a str, &'a str)> {
        match self.element(idx) {
            Some(el) => el.value().attrs().collect(),
            None => Vec::new(),
        }
    }

    pub fn attribute(&self, idx: usize, nth: usize) -> Option<(&'a str, &'a str)> {
        self.element(idx).and_then(|el| el.value().attrs().nth(nth))
    }

    /// 子树结束位置（不含）
    pub fn subtree_end(&self, idx: usize) -> usize {
        let mut last = idx;
        while let Some(&child) = self.nodes[last].children.last() {
            last = child;
        }
        last + 1
    }

    pub fn ancestors(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = self.nodes[idx].parent;
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p].parent;
        }
        out
    }

    /// 节点的字符串值（文本内容）
    pub fn string_value(&self, idx: usize) -> String {
        match &self.nodes[idx].kind {
            NodeKind::Element(el) => el.text().collect(),
            NodeKind::Text(text) | NodeKind::Comment(text) => text.to_string(),
            NodeKind::Document => (idx..self.subtree_end(idx))
                .filter_map(|i| match self.nodes[i].kind {
                    NodeKind::Text(text) => Some(text),
                    _ => None,
                })
                .collect(),
        }
    }

    /// 元素的外层 HTML，其他节点退化为字符串值
    pub fn outer_html(&self, idx: usize) -> String {
        match self.element(idx) {
            Some(el) => el.html(),
            None => self.string_value(idx),
        }
    }
}
