//! 文档树访问层
//!
//! 对 `markup5ever_rcdom` 的节点句柄做一层薄封装：
//!
//! - HTML 解析与节点定位
//! - 文本和属性的读写
//! - 以指针身份为键的 [`NodeKey`]（引擎端记录不持有节点）
//! - 遍历入口 [`for_each_node`] 与扫描策略 [`ScanPolicy`]
//!
//! 树本身由宿主持有并变更，引擎只读写既有节点的内容。

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use crate::config::{constants, SyncConfig};

/// 将 HTML 字符串解析为 DOM
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .unwrap()
}

/// 查找文档中的 body 节点，找不到时退回文档根
pub fn find_body(dom: &RcDom) -> Handle {
    find_first_element(&dom.document, "body").unwrap_or_else(|| dom.document.clone())
}

/// 深度优先查找第一个指定名称的元素
pub fn find_first_element(node: &Handle, element_name: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == element_name {
            return Some(node.clone());
        }
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_first_element(child, element_name) {
            return Some(found);
        }
    }
    None
}

/// 获取元素名称
pub fn node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 读取文本节点内容，非文本节点返回 None
pub fn node_text(node: &Handle) -> Option<String> {
    match node.data {
        NodeData::Text { ref contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 覆写文本节点内容，返回是否写入
pub fn set_node_text(node: &Handle, value: &str) -> bool {
    match node.data {
        NodeData::Text { ref contents } => {
            let mut text = contents.borrow_mut();
            text.clear();
            text.push_slice(value);
            true
        }
        _ => false,
    }
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 设置节点属性，`None` 表示删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();

        if let Some(position) = attrs_mut
            .iter()
            .position(|attr| &*attr.name.local == attr_name)
        {
            match attr_value {
                Some(value) => {
                    attrs_mut[position].value.clear();
                    attrs_mut[position].value.push_slice(value.as_str());
                }
                None => {
                    attrs_mut.remove(position);
                }
            }
        } else if let Some(value) = attr_value {
            attrs_mut.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                value: format_tendril!("{}", value),
            });
        }
    }
}

/// 在父节点下追加一个文本节点
///
/// 宿主在模拟或转发 DOM 变更时使用，新节点随后通过变更通知交给引擎。
pub fn append_text_node(parent: &Handle, text: &str) -> Handle {
    let node = Node::new(NodeData::Text {
        contents: RefCell::new(format_tendril!("{}", text)),
    });
    node.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(node.clone());
    node
}

/// 在父节点下追加一个元素节点
pub fn append_element(dom: &RcDom, parent: &Handle, tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attributes = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: format_tendril!("{}", value),
        })
        .collect();
    let node = create_element(
        dom,
        QualName::new(None, ns!(), LocalName::from(tag)),
        attributes,
    );
    node.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(node.clone());
    node
}

/// 深度优先遍历，回调返回是否继续深入子节点
pub fn for_each_node<F>(root: &Handle, visit: &mut F)
where
    F: FnMut(&Handle) -> bool,
{
    if visit(root) {
        for child in root.children.borrow().iter() {
            for_each_node(child, visit);
        }
    }
}

// ============================================================================
// 节点身份
// ============================================================================

/// 节点的不透明身份键
///
/// 以 `Rc` 指针地址为身份，相等即同一个节点。引擎端的各类记录用它做
/// 哈希键，配合记录里的弱引用实现"记录不持有节点、节点脱离后记录可显式
/// 失效"的约定。地址复用由记录层的弱引用存活检查兜底。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn of(node: &Handle) -> Self {
        NodeKey(Rc::as_ptr(node) as usize)
    }
}

// ============================================================================
// 扫描策略
// ============================================================================

/// 文档扫描策略：哪些子树整体跳过、哪些属性参与翻译
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    skip_elements: HashSet<String>,
    translatable_attrs: Vec<String>,
}

impl ScanPolicy {
    pub fn new(skip_elements: Vec<String>, translatable_attrs: Vec<String>) -> Self {
        Self {
            skip_elements: skip_elements.into_iter().collect(),
            translatable_attrs,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.skip_elements.clone(),
            config.translatable_attrs.clone(),
        )
    }

    /// 节点是否属于整棵子树跳过的容器
    pub fn should_skip(&self, node: &Handle) -> bool {
        match node_name(node) {
            Some(name) => self.skip_elements.contains(name),
            None => false,
        }
    }

    /// 参与翻译的属性名列表
    pub fn translatable_attrs(&self) -> &[String] {
        &self.translatable_attrs
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::new(
            constants::SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            constants::TRANSLATABLE_ATTRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_find_body() {
        let dom = parse_html("<html><body><p>你好</p></body></html>");
        let body = find_body(&dom);
        assert_eq!(node_name(&body), Some("body"));
    }

    #[test]
    fn test_text_read_write() {
        let dom = parse_html("<p>Hello</p>");
        let body = find_body(&dom);
        let p = find_first_element(&body, "p").expect("p element should exist");
        let text_node = p.children.borrow()[0].clone();

        assert_eq!(node_text(&text_node), Some("Hello".to_string()));
        assert!(set_node_text(&text_node, "Bonjour"));
        assert_eq!(node_text(&text_node), Some("Bonjour".to_string()));
        // 元素节点不可写文本
        assert!(!set_node_text(&p, "x"));
    }

    #[test]
    fn test_attr_read_write() {
        let dom = parse_html(r#"<input placeholder="Name">"#);
        let body = find_body(&dom);
        let input = find_first_element(&body, "input").expect("input element should exist");

        assert_eq!(get_node_attr(&input, "placeholder"), Some("Name".into()));
        set_node_attr(&input, "placeholder", Some("姓名".into()));
        assert_eq!(get_node_attr(&input, "placeholder"), Some("姓名".into()));
        set_node_attr(&input, "title", Some("提示".into()));
        assert_eq!(get_node_attr(&input, "title"), Some("提示".into()));
        set_node_attr(&input, "title", None);
        assert_eq!(get_node_attr(&input, "title"), None);
    }

    #[test]
    fn test_append_nodes() {
        let dom = parse_html("<div></div>");
        let body = find_body(&dom);
        let div = find_first_element(&body, "div").expect("div element should exist");

        let text = append_text_node(&div, "新内容");
        assert_eq!(node_text(&text), Some("新内容".to_string()));

        let span = append_element(&dom, &div, "span", &[("title", "说明")]);
        assert_eq!(node_name(&span), Some("span"));
        assert_eq!(get_node_attr(&span, "title"), Some("说明".into()));
        assert_eq!(div.children.borrow().len(), 2);
    }

    #[test]
    fn test_node_key_identity() {
        let dom = parse_html("<p>a</p><p>a</p>");
        let body = find_body(&dom);
        let paragraphs: Vec<Handle> = body
            .children
            .borrow()
            .iter()
            .filter(|n| node_name(n) == Some("p"))
            .cloned()
            .collect();
        assert_eq!(paragraphs.len(), 2);

        // 同一节点的键相等，不同节点不等（即使内容相同）
        assert_eq!(NodeKey::of(&paragraphs[0]), NodeKey::of(&paragraphs[0].clone()));
        assert_ne!(NodeKey::of(&paragraphs[0]), NodeKey::of(&paragraphs[1]));
    }

    #[test]
    fn test_scan_policy_skips_script() {
        let dom = parse_html("<body><script>var x;</script><p>text</p></body>");
        let body = find_body(&dom);
        let policy = ScanPolicy::default();

        let script = find_first_element(&body, "script").expect("script element should exist");
        let p = find_first_element(&body, "p").expect("p element should exist");
        assert!(policy.should_skip(&script));
        assert!(!policy.should_skip(&p));
    }

    #[test]
    fn test_for_each_node_descend_control() {
        let dom = parse_html("<div><span>inner</span></div><p>outer</p>");
        let body = find_body(&dom);

        let mut visited = Vec::new();
        for_each_node(&body, &mut |node| {
            if let Some(name) = node_name(node) {
                visited.push(name.to_string());
                // 不深入 div 的子树
                return name != "div";
            }
            true
        });

        assert!(visited.contains(&"div".to_string()));
        assert!(visited.contains(&"p".to_string()));
        assert!(!visited.contains(&"span".to_string()));
    }
}
