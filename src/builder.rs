//! The builder contract generated units are written against, and an
//! interpreter that runs an instruction list through any implementation of it.

use std::collections::HashMap;

use crate::codegen::Instruction;
use crate::validate::{CompilerError, ERR_MISSING_RETURN, ERR_UNBOUND_VARIABLE};

pub trait DomBuilder {
    type Node: Clone;

    fn create_element(&mut self, tag: &str, class_name: Option<&str>) -> Self::Node;

    fn create_element_ns(
        &mut self,
        namespace_uri: &str,
        tag: &str,
        class_name: Option<&str>,
    ) -> Self::Node;

    /// Document-scoped in the generated code: `dom.document().createTextNode(…)`.
    fn create_text_node(&mut self, text: &str) -> Self::Node;

    fn create_document_fragment(&mut self) -> Self::Node;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn append(&mut self, parent: &Self::Node, child: &Self::Node);
}

/// Runs `instructions` against `builder` and returns the node named by the
/// final `Return`.
pub fn execute<B: DomBuilder>(
    instructions: &[Instruction],
    builder: &mut B,
) -> Result<B::Node, CompilerError> {
    let mut vars: HashMap<&str, B::Node> = HashMap::new();

    fn lookup<'v, N>(vars: &'v HashMap<&str, N>, name: &str) -> Result<&'v N, CompilerError> {
        vars.get(name).ok_or_else(|| {
            CompilerError::new(
                ERR_UNBOUND_VARIABLE,
                &format!("variable '{}' is referenced before it is defined", name),
                "",
            )
        })
    }

    for instruction in instructions {
        match instruction {
            Instruction::CreateElement {
                var,
                tag,
                class_name,
            } => {
                let node = builder.create_element(tag, class_name.as_deref());
                vars.insert(var.as_str(), node);
            }
            Instruction::CreateElementNs {
                var,
                namespace,
                tag,
                class_name,
            } => {
                let node = builder.create_element_ns(namespace, tag, class_name.as_deref());
                vars.insert(var.as_str(), node);
            }
            Instruction::SetAttribute { var, name, value } => {
                let node = lookup(&vars, var)?;
                builder.set_attribute(node, name, value);
            }
            Instruction::CreateTextNode { parent, text } => {
                let parent = lookup(&vars, parent)?;
                let text = builder.create_text_node(text);
                builder.append(parent, &text);
            }
            Instruction::AppendChild { parent, child } => {
                let parent = lookup(&vars, parent)?;
                let child = lookup(&vars, child)?;
                builder.append(parent, child);
            }
            Instruction::CreateFragment { var } => {
                let node = builder.create_document_fragment();
                vars.insert(var.as_str(), node);
            }
            Instruction::Return { var } => return lookup(&vars, var).cloned(),
        }
    }

    Err(CompilerError::new(
        ERR_MISSING_RETURN,
        "instruction list ended without returning a node",
        "",
    ))
}
