//! Parse Module for the components compiler
//!
//! Reads a source document with html5ever and lowers the content of every
//! `<template id="…">` into the template IR.

use html5ever::parse_document;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tendril::TendrilSink;

use crate::validate::{
    AttributeIR, CompilerError, NodeId, NodeKind, TemplateIR, ERR_PARSE, XHTML_NAMESPACE,
};

/// Parses `html` and returns its templates in document order.
pub fn parse_document_templates(
    html: &str,
    file_path: &str,
) -> Result<Vec<TemplateIR>, CompilerError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| {
            CompilerError::new(
                ERR_PARSE,
                &format!("Failed to parse HTML: {}", e),
                file_path,
            )
        })?;

    let mut templates = Vec::new();
    collect_templates(&dom.document, file_path, &mut templates);
    log::debug!("found {} template(s) in {}", templates.len(), file_path);
    Ok(templates)
}

/// Walks the main tree only. Template contents live outside it, so nested
/// templates are not discovered.
fn collect_templates(document: &Handle, file_path: &str, templates: &mut Vec<TemplateIR>) {
    let mut stack = vec![document.clone()];

    while let Some(handle) = stack.pop() {
        if let NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } = &handle.data
        {
            if &*name.local == "template" && &*name.ns == XHTML_NAMESPACE {
                let id = attrs
                    .borrow()
                    .iter()
                    .find(|a| a.name.prefix.is_none() && &*a.name.local == "id")
                    .map(|a| a.value.to_string())
                    .unwrap_or_default();

                if id.is_empty() {
                    log::warn!("skipping <template> without an id in {}", file_path);
                } else if let Some(contents) = template_contents.borrow().as_ref() {
                    templates.push(lower_template(&id, contents));
                }
            }
        }

        stack.extend(handle.children.borrow().iter().rev().cloned());
    }
}

/// Lowers the content into the arena in document order, using an explicit
/// stack so nesting depth is bounded by the heap rather than the call stack.
fn lower_template(id: &str, contents: &Handle) -> TemplateIR {
    let mut ir = TemplateIR::new(id);
    let mut stack: Vec<(Handle, Option<NodeId>)> = contents
        .children
        .borrow()
        .iter()
        .rev()
        .map(|child| (child.clone(), None))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        let Some(kind) = lower_node(&handle) else {
            continue;
        };
        let id = ir.push_node(parent, kind);
        stack.extend(
            handle
                .children
                .borrow()
                .iter()
                .rev()
                .map(|child| (child.clone(), Some(id))),
        );
    }
    ir
}

fn lower_node(handle: &Handle) -> Option<NodeKind> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| AttributeIR {
                    name: match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    },
                    value: attr.value.to_string(),
                })
                .collect();
            Some(NodeKind::Element {
                tag: name.local.to_string(),
                namespace: name.ns.to_string(),
                attributes,
            })
        }
        NodeData::Text { contents } => Some(NodeKind::Text {
            value: contents.borrow().to_string(),
        }),
        NodeData::Comment { contents } => Some(NodeKind::Comment {
            value: contents.to_string(),
        }),
        _ => None,
    }
}
