use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "TPL-ERR-PARSE";
pub const ERR_UNKNOWN_COMPONENT: &str = "TPL-ERR-UNKNOWN-COMPONENT";
pub const ERR_INVALID_COMPONENT_ID: &str = "TPL-ERR-INVALID-COMPONENT-ID";
pub const ERR_DUPLICATE_COMPONENT: &str = "TPL-ERR-DUPLICATE-COMPONENT";
pub const ERR_UNBOUND_VARIABLE: &str = "TPL-ERR-UNBOUND-VARIABLE";
pub const ERR_MISSING_RETURN: &str = "TPL-ERR-MISSING-RETURN";
pub const ERR_OUTPUT_SYNTAX: &str = "TPL-ERR-OUTPUT-SYNTAX";
pub const ERR_OUTPUT_SCOPE: &str = "TPL-ERR-OUTPUT-SCOPE";
pub const ERR_ROUND_TRIP: &str = "TPL-ERR-ROUND-TRIP";
pub const ERR_IO: &str = "TPL-ERR-IO";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_PARSE => "Every template in the source document is read before any code is emitted.",
        ERR_UNKNOWN_COMPONENT => {
            "Only compiled components can be created; nothing is built for an unknown name."
        }
        ERR_INVALID_COMPONENT_ID => "Every component id yields a valid JavaScript function name.",
        ERR_DUPLICATE_COMPONENT => "Component ids are unique across all loaded sources.",
        ERR_UNBOUND_VARIABLE | ERR_OUTPUT_SCOPE => {
            "Every node variable is defined before it is referenced."
        }
        ERR_MISSING_RETURN => "Every construction unit returns its fragment.",
        ERR_OUTPUT_SYNTAX => "Generated output is a syntactically valid ES module.",
        ERR_ROUND_TRIP => {
            "Generated units rebuild the source tree, ignoring comments and formatting whitespace."
        }
        ERR_IO => "Sources are read and outputs are written whole.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str) -> Self {
        Self::with_details(code, message, file, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            context,
            hints,
        }
    }

    pub fn unknown_component(name: &str) -> Self {
        Self::with_details(
            ERR_UNKNOWN_COMPONENT,
            &format!("unexpected component: {}", name),
            "",
            None,
            vec!["Check the `id` attribute of the <template> you meant to compile.".to_string()],
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE IR
// ═══════════════════════════════════════════════════════════════════════════════

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeIR {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Element {
        tag: String,
        namespace: String,
        attributes: Vec<AttributeIR>,
    },
    Text {
        value: String,
    },
    Comment {
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    pub kind: NodeKind,
    /// Lookup-only back reference; `None` for the content's top-level nodes.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TemplateNode {
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// One `<template>`: its id plus the content tree, stored as an arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateIR {
    pub id: String,
    pub nodes: Vec<TemplateNode>,
    /// Top-level nodes of the template content, in document order.
    pub roots: Vec<NodeId>,
}

impl TemplateIR {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &TemplateNode {
        &self.nodes[id]
    }

    pub fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TemplateNode {
            kind,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn push_element(
        &mut self,
        parent: Option<NodeId>,
        tag: &str,
        namespace: &str,
        attributes: &[(&str, &str)],
    ) -> NodeId {
        let attributes = attributes
            .iter()
            .map(|(name, value)| AttributeIR {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        self.push_node(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                namespace: namespace.to_string(),
                attributes,
            },
        )
    }

    pub fn push_text(&mut self, parent: Option<NodeId>, value: &str) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Text {
                value: value.to_string(),
            },
        )
    }

    pub fn push_comment(&mut self, parent: Option<NodeId>, value: &str) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Comment {
                value: value.to_string(),
            },
        )
    }

    /// Space-joined class list of an element, `None` when it has no classes.
    pub fn class_name(&self, id: NodeId) -> Option<String> {
        let NodeKind::Element { attributes, .. } = &self.node(id).kind else {
            return None;
        };
        let value = attributes.iter().find(|a| a.name == "class")?;
        normalize_class_list(&value.value)
    }

    /// Top-level element nodes, the part of the content that gets compiled.
    pub fn root_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(move |id| self.node(*id).is_element())
    }
}

pub fn normalize_class_list(value: &str) -> Option<String> {
    let joined = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
