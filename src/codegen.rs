//! Codegen module for the components compiler
//!
//! Walks one template's element tree and emits the flat list of DOM
//! construction statements that rebuild it through the builder object.

use serde::{Deserialize, Serialize};

use crate::renamer::{BindingTarget, VariableNamer};
use crate::validate::{NodeId, NodeKind, TemplateIR, XHTML_NAMESPACE};
use crate::whitespace::{is_insignificant, normalize_text};

pub const SVG_NAMESPACE_SUFFIX: &str = "/svg";

// ═══════════════════════════════════════════════════════════════════════════════
// INSTRUCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Instruction {
    CreateElement {
        var: String,
        tag: String,
        class_name: Option<String>,
    },
    CreateElementNs {
        var: String,
        namespace: String,
        tag: String,
        class_name: Option<String>,
    },
    SetAttribute {
        var: String,
        name: String,
        value: String,
    },
    /// Creates a text node through the builder's document and appends it to `parent`.
    CreateTextNode {
        parent: String,
        text: String,
    },
    AppendChild {
        parent: String,
        child: String,
    },
    CreateFragment {
        var: String,
    },
    Return {
        var: String,
    },
}

impl Instruction {
    /// Renders the statement against a builder bound to `builder`.
    pub fn to_js(&self, builder: &str) -> String {
        match self {
            Instruction::CreateElement {
                var,
                tag,
                class_name,
            } => {
                let mut args = vec![tag.as_str()];
                if let Some(class_name) = class_name {
                    args.push(class_name);
                }
                format!(
                    "const {} = {}.createElement({});",
                    var,
                    builder,
                    serialize_arguments(&args)
                )
            }
            Instruction::CreateElementNs {
                var,
                namespace,
                tag,
                class_name,
            } => {
                let mut args = vec![namespace.as_str(), tag.as_str()];
                if let Some(class_name) = class_name {
                    args.push(class_name);
                }
                format!(
                    "const {} = {}.createElementNS({});",
                    var,
                    builder,
                    serialize_arguments(&args)
                )
            }
            Instruction::SetAttribute { var, name, value } => format!(
                "{}.setAttribute({});",
                var,
                serialize_arguments(&[name, value])
            ),
            Instruction::CreateTextNode { parent, text } => format!(
                "{}.append({}.document().createTextNode({}));",
                parent,
                builder,
                js_string_literal(text)
            ),
            Instruction::AppendChild { parent, child } => {
                format!("{}.append({});", parent, child)
            }
            Instruction::CreateFragment { var } => format!(
                "const {} = {}.document().createDocumentFragment();",
                var, builder
            ),
            Instruction::Return { var } => format!("return {};", var),
        }
    }
}

/// Double-quoted, escaped literal safe to embed in generated source.
pub fn js_string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

pub fn serialize_arguments(args: &[&str]) -> String {
    args.iter()
        .map(|arg| js_string_literal(arg))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn is_svg_namespace(namespace: &str) -> bool {
    namespace.ends_with(SVG_NAMESPACE_SUFFIX)
}

/// Namespace an element ends up in once built: its own for SVG, the HTML
/// namespace for everything created through `createElement`.
pub fn created_namespace(namespace: &str) -> &str {
    if is_svg_namespace(namespace) {
        namespace
    } else {
        XHTML_NAMESPACE
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE COMPILER
// ═══════════════════════════════════════════════════════════════════════════════

enum Task {
    Visit(NodeId),
    Text { parent: String, text: String },
    Append { parent: NodeId, child: NodeId },
}

/// Compiles the top-level elements of a template into construction statements
/// ending in the creation and return of the fragment that holds them.
pub fn compile_template(template: &TemplateIR) -> Vec<Instruction> {
    let mut namer = VariableNamer::new();
    let mut instructions = Vec::new();

    let roots: Vec<NodeId> = template.root_elements().collect();
    for &root in &roots {
        compile_element(template, root, &mut namer, &mut instructions);
    }

    let fragment = namer.name_for(BindingTarget::Fragment);
    instructions.push(Instruction::CreateFragment {
        var: fragment.clone(),
    });
    for &root in &roots {
        instructions.push(Instruction::AppendChild {
            parent: fragment.clone(),
            child: namer.name_for(BindingTarget::Node(root)),
        });
    }
    instructions.push(Instruction::Return { var: fragment });

    log::debug!(
        "compiled template '{}' into {} statements ({} variables)",
        template.id,
        instructions.len(),
        namer.len()
    );
    instructions
}

/// Emits the subtree rooted at `root`. An explicit stack keeps the emission
/// order of a pre-order walk: a parent is created before its children, and a
/// child element is appended right after its own subtree is complete.
fn compile_element(
    template: &TemplateIR,
    root: NodeId,
    namer: &mut VariableNamer,
    out: &mut Vec<Instruction>,
) {
    let mut stack = vec![Task::Visit(root)];

    while let Some(task) = stack.pop() {
        match task {
            Task::Visit(id) => {
                let NodeKind::Element {
                    tag,
                    namespace,
                    attributes,
                } = &template.node(id).kind
                else {
                    continue;
                };

                let var = namer.name_for(BindingTarget::Node(id));
                let class_name = template.class_name(id);
                if is_svg_namespace(namespace) {
                    out.push(Instruction::CreateElementNs {
                        var: var.clone(),
                        namespace: namespace.clone(),
                        tag: tag.clone(),
                        class_name,
                    });
                } else {
                    out.push(Instruction::CreateElement {
                        var: var.clone(),
                        tag: tag.clone(),
                        class_name,
                    });
                }

                for attr in attributes.iter().filter(|a| a.name != "class") {
                    out.push(Instruction::SetAttribute {
                        var: var.clone(),
                        name: attr.name.clone(),
                        value: attr.value.clone(),
                    });
                }

                let mut pending = Vec::new();
                for &child in retained_children(template, id) {
                    match &template.node(child).kind {
                        NodeKind::Comment { .. } => {}
                        NodeKind::Text { value } => {
                            if value.is_empty() {
                                continue;
                            }
                            pending.push(Task::Text {
                                parent: var.clone(),
                                text: normalize_text(value, tag),
                            });
                        }
                        NodeKind::Element { .. } => {
                            pending.push(Task::Visit(child));
                            pending.push(Task::Append { parent: id, child });
                        }
                    }
                }
                stack.extend(pending.into_iter().rev());
            }
            Task::Text { parent, text } => {
                out.push(Instruction::CreateTextNode { parent, text });
            }
            Task::Append { parent, child } => {
                out.push(Instruction::AppendChild {
                    parent: namer.name_for(BindingTarget::Node(parent)),
                    child: namer.name_for(BindingTarget::Node(child)),
                });
            }
        }
    }
}

/// Children left after dropping whitespace-only text at the first and last
/// positions. Interior positions are not inspected.
pub fn retained_children(template: &TemplateIR, id: NodeId) -> &[NodeId] {
    let children = &template.node(id).children;
    let is_blank_text = |child: NodeId| match &template.node(child).kind {
        NodeKind::Text { value } => is_insignificant(value),
        _ => false,
    };

    let mut lower = 0;
    let mut upper = children.len();
    if !children.is_empty() && is_blank_text(children[0]) {
        lower += 1;
    }
    if children.len() > 1 && is_blank_text(children[children.len() - 1]) {
        upper -= 1;
    }
    &children[lower..upper]
}
