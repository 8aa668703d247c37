//! Round-trip check: rebuild a template through its compiled unit and compare
//! the result with the source tree, ignoring comments, formatting whitespace
//! and attribute order.
//!
//! Both sides are reduced to pre-order node lists carrying their depth, so
//! trees of any nesting are walked and compared without recursion.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::builder::DomBuilder;
use crate::codegen::created_namespace;
use crate::component::CompiledComponent;
use crate::validate::{
    normalize_class_list, CompilerError, NodeKind, TemplateIR, ERR_ROUND_TRIP, XHTML_NAMESPACE,
};
use crate::whitespace::{significant_text, text_node_significant_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomTree {
    Element {
        namespace: String,
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<DomTree>,
    },
    Text(String),
}

impl Drop for DomTree {
    // Flattens the teardown so deep trees do not drop recursively.
    fn drop(&mut self) {
        let DomTree::Element { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut tree) = pending.pop() {
            if let DomTree::Element { children, .. } = &mut tree {
                pending.append(children);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatKind {
    Element {
        namespace: String,
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

/// One node of a tree in pre-order. Depth 0 is a top-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub depth: usize,
    pub node: FlatKind,
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum BuiltKind {
    Element {
        namespace: String,
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
    Fragment,
}

#[derive(Debug, Clone)]
struct BuiltNode {
    kind: BuiltKind,
    children: Vec<usize>,
}

/// A [`DomBuilder`] that records the tree it is asked to build.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<BuiltNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, kind: BuiltKind) -> usize {
        self.nodes.push(BuiltNode {
            kind,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn element(&mut self, namespace: &str, tag: &str, class_name: Option<&str>) -> usize {
        let mut attributes = BTreeMap::new();
        if let Some(class_name) = class_name {
            attributes.insert("class".to_string(), class_name.to_string());
        }
        self.push(BuiltKind::Element {
            namespace: namespace.to_string(),
            tag: tag.to_string(),
            attributes,
        })
    }

    /// Descendants of `node` in pre-order, as built.
    pub fn flatten(&self, node: &usize) -> Vec<FlatNode> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, usize)> = self.nodes[*node]
            .children
            .iter()
            .rev()
            .map(|child| (*child, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let built = &self.nodes[id];
            let node = match &built.kind {
                BuiltKind::Element {
                    namespace,
                    tag,
                    attributes,
                } => FlatKind::Element {
                    namespace: namespace.clone(),
                    tag: tag.clone(),
                    attributes: attributes.clone(),
                },
                BuiltKind::Text(text) => FlatKind::Text(text.clone()),
                BuiltKind::Fragment => continue,
            };
            out.push(FlatNode { depth, node });
            stack.extend(built.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        out
    }

    /// Children of `node`, as built.
    pub fn tree(&self, node: &usize) -> Vec<DomTree> {
        unflatten(self.flatten(node))
    }
}

impl DomBuilder for TreeBuilder {
    type Node = usize;

    fn create_element(&mut self, tag: &str, class_name: Option<&str>) -> usize {
        self.element(XHTML_NAMESPACE, tag, class_name)
    }

    fn create_element_ns(
        &mut self,
        namespace_uri: &str,
        tag: &str,
        class_name: Option<&str>,
    ) -> usize {
        self.element(namespace_uri, tag, class_name)
    }

    fn create_text_node(&mut self, text: &str) -> usize {
        self.push(BuiltKind::Text(text.to_string()))
    }

    fn create_document_fragment(&mut self) -> usize {
        self.push(BuiltKind::Fragment)
    }

    fn set_attribute(&mut self, node: &usize, name: &str, value: &str) {
        if let BuiltKind::Element { attributes, .. } = &mut self.nodes[*node].kind {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn append(&mut self, parent: &usize, child: &usize) {
        self.nodes[*parent].children.push(*child);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

fn normalize_attributes(mut attributes: BTreeMap<String, String>) -> BTreeMap<String, String> {
    if let Some(class) = attributes.remove("class") {
        if let Some(class) = normalize_class_list(&class) {
            attributes.insert("class".to_string(), class);
        }
    }
    attributes
}

/// Drops insignificant text and normalizes what remains. Text at depth 0 has
/// no parent element and is never significant.
fn clean(nodes: Vec<FlatNode>) -> Vec<FlatNode> {
    let mut tags: Vec<String> = Vec::new();
    let mut out = Vec::with_capacity(nodes.len());

    for FlatNode { depth, node } in nodes {
        tags.truncate(depth);
        match node {
            FlatKind::Text(text) => {
                let parent_tag = depth.checked_sub(1).and_then(|d| tags.get(d));
                if let Some(text) = parent_tag.and_then(|tag| significant_text(&text, tag)) {
                    out.push(FlatNode {
                        depth,
                        node: FlatKind::Text(text),
                    });
                }
            }
            FlatKind::Element {
                namespace,
                tag,
                attributes,
            } => {
                tags.push(tag.clone());
                out.push(FlatNode {
                    depth,
                    node: FlatKind::Element {
                        namespace,
                        tag,
                        attributes: normalize_attributes(attributes),
                    },
                });
            }
        }
    }
    out
}

/// Rebuilds nested trees from a pre-order list.
fn unflatten(nodes: Vec<FlatNode>) -> Vec<DomTree> {
    fn attach(open: &mut [DomTree], roots: &mut Vec<DomTree>, tree: DomTree) {
        match open.last_mut() {
            Some(DomTree::Element { children, .. }) => children.push(tree),
            _ => roots.push(tree),
        }
    }

    let mut roots = Vec::new();
    let mut open: Vec<DomTree> = Vec::new();

    for FlatNode { depth, node } in nodes {
        while open.len() > depth {
            if let Some(done) = open.pop() {
                attach(&mut open, &mut roots, done);
            }
        }
        match node {
            FlatKind::Element {
                namespace,
                tag,
                attributes,
            } => open.push(DomTree::Element {
                namespace,
                tag,
                attributes,
                children: Vec::new(),
            }),
            FlatKind::Text(text) => attach(&mut open, &mut roots, DomTree::Text(text)),
        }
    }
    while let Some(done) = open.pop() {
        attach(&mut open, &mut roots, done);
    }
    roots
}

/// The template's content, cleaned, in pre-order. Namespaces are the ones
/// the builder will give each element.
pub fn expected_nodes(template: &TemplateIR) -> Vec<FlatNode> {
    let mut out = Vec::new();
    let mut stack: Vec<(usize, usize)> =
        template.roots.iter().rev().map(|id| (*id, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let node = template.node(id);
        match &node.kind {
            NodeKind::Comment { .. } => {}
            NodeKind::Text { .. } => {
                if let Some(text) = text_node_significant_text(template, id) {
                    out.push(FlatNode {
                        depth,
                        node: FlatKind::Text(text),
                    });
                }
            }
            NodeKind::Element {
                tag,
                namespace,
                attributes,
            } => {
                let attributes = attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect();
                out.push(FlatNode {
                    depth,
                    node: FlatKind::Element {
                        namespace: created_namespace(namespace).to_string(),
                        tag: tag.clone(),
                        attributes: normalize_attributes(attributes),
                    },
                });
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
    }
    out
}

/// The nodes a compiled unit builds, cleaned the same way as [`expected_nodes`].
pub fn built_nodes(component: &CompiledComponent) -> Result<Vec<FlatNode>, CompilerError> {
    let mut builder = TreeBuilder::new();
    let fragment = component.build(&mut builder)?;
    Ok(clean(builder.flatten(&fragment)))
}

/// The template's content with comments and insignificant text removed.
pub fn expected_tree(template: &TemplateIR) -> Vec<DomTree> {
    unflatten(expected_nodes(template))
}

/// The tree a compiled unit builds, cleaned the same way as [`expected_tree`].
pub fn built_tree(component: &CompiledComponent) -> Result<Vec<DomTree>, CompilerError> {
    built_nodes(component).map(unflatten)
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPARISON
// ═══════════════════════════════════════════════════════════════════════════════

fn describe(node: &FlatKind) -> String {
    match node {
        FlatKind::Element { tag, .. } => format!("<{}>", tag),
        FlatKind::Text(text) => format!("text {:?}", text),
    }
}

fn node_divergence(expected: &FlatNode, actual: &FlatNode) -> Option<String> {
    if expected.depth != actual.depth {
        return Some(format!(
            "expected {} at depth {}, built {} at depth {}",
            describe(&expected.node),
            expected.depth,
            describe(&actual.node),
            actual.depth
        ));
    }

    match (&expected.node, &actual.node) {
        (
            FlatKind::Element {
                namespace: en,
                tag: et,
                attributes: ea,
            },
            FlatKind::Element {
                namespace: an,
                tag: at,
                attributes: aa,
            },
        ) => {
            if et != at || en != an {
                return Some(format!("expected <{}> in {}, built <{}> in {}", et, en, at, an));
            }
            if ea != aa {
                return Some(format!(
                    "attributes differ on <{}>: expected {:?}, built {:?}",
                    et, ea, aa
                ));
            }
            None
        }
        (FlatKind::Text(et), FlatKind::Text(at)) if et == at => None,
        (e, a) => Some(format!("expected {}, built {}", describe(e), describe(a))),
    }
}

/// First differing node, prefixed with its path, e.g. `/0<div>/2: …`.
fn first_divergence(expected: &[FlatNode], actual: &[FlatNode]) -> Option<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut next_index: Vec<usize> = Vec::new();

    for (e, a) in expected.iter().zip(actual) {
        labels.truncate(e.depth);
        next_index.resize(e.depth + 1, 0);
        let index = next_index[e.depth];
        next_index[e.depth] += 1;

        if let Some(found) = node_divergence(e, a) {
            return Some(format!("{}/{}: {}", labels.concat(), index, found));
        }
        if let FlatKind::Element { tag, .. } = &e.node {
            labels.push(format!("/{}<{}>", index, tag));
        }
    }

    match expected.len().cmp(&actual.len()) {
        Ordering::Equal => None,
        Ordering::Greater => Some(format!(
            "built tree ends after {} nodes, expected {} next",
            actual.len(),
            describe(&expected[actual.len()].node)
        )),
        Ordering::Less => Some(format!(
            "built tree has {} extra nodes, starting with {}",
            actual.len() - expected.len(),
            describe(&actual[expected.len()].node)
        )),
    }
}

/// Checks that `component` rebuilds `template`'s content.
pub fn verify_round_trip(
    template: &TemplateIR,
    component: &CompiledComponent,
) -> Result<(), CompilerError> {
    let expected = expected_nodes(template);
    let actual = built_nodes(component)?;

    match first_divergence(&expected, &actual) {
        None => Ok(()),
        Some(divergence) => Err(CompilerError::with_details(
            ERR_ROUND_TRIP,
            &format!("component '{}' does not rebuild its template", template.id),
            "",
            Some(divergence),
            vec![],
        )),
    }
}
