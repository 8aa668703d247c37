//! Component assembly
//!
//! Wraps compiled statement lists into named construction functions and
//! builds the dispatcher that maps a component id to its function, both as
//! generated JavaScript and as an in-process registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::builder::{execute, DomBuilder};
use crate::codegen::{compile_template, js_string_literal, Instruction};
use crate::finalize::EmitOptions;
use crate::validate::{CompilerError, TemplateIR};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledComponent {
    pub component_name: String,
    pub function_name: String,
    pub instructions: Vec<Instruction>,
}

impl CompiledComponent {
    pub fn compile(template: &TemplateIR) -> Self {
        Self {
            component_name: template.id.clone(),
            function_name: component_function_name(&template.id),
            instructions: compile_template(template),
        }
    }

    pub fn function_code(&self, options: &EmitOptions) -> String {
        let body: Vec<String> = self
            .instructions
            .iter()
            .map(|i| i.to_js(&options.builder_param))
            .collect();
        let jsdoc = format!("/**\n * @param {{DOM}} {}\n */", options.builder_param);
        format!(
            "{}\n{}",
            jsdoc,
            create_function_code(
                &self.function_name,
                &body,
                &[options.builder_param.as_str()]
            )
        )
    }

    /// Builds this component's fragment with `builder`.
    pub fn build<B: DomBuilder>(&self, builder: &mut B) -> Result<B::Node, CompilerError> {
        execute(&self.instructions, builder)
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn component_function_name(component_name: &str) -> String {
    format!("create{}Component", upper_first(component_name))
}

pub fn create_function_code(name: &str, body_lines: &[String], params: &[&str]) -> String {
    let body = body_lines
        .iter()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n");
    format!("function {}({}) {{\n{}\n}}", name, params.join(", "), body)
}

/// Generic `createComponent(dom, componentName)` switching over every unit.
pub fn dispatcher_code(components: &[CompiledComponent], options: &EmitOptions) -> String {
    let builder = options.builder_param.as_str();
    let mut lines = Vec::new();
    lines.push("switch (componentName) {".to_string());
    for component in components {
        lines.push(format!(
            "  case {}: return {}({});",
            js_string_literal(&component.component_name),
            component.function_name,
            builder
        ));
    }
    lines.push("}".to_string());
    lines.push("throw new Error('unexpected component: ' + componentName);".to_string());

    let param_type = if components.is_empty() {
        "never".to_string()
    } else {
        components
            .iter()
            .map(|c| js_string_literal(&c.component_name))
            .collect::<Vec<_>>()
            .join("|")
    };
    let jsdoc = format!(
        concat!(
            "/** @typedef {{{}}} ComponentName */\n",
            "/**\n",
            " * @param {{DOM}} {}\n",
            " * @param {{ComponentName}} componentName\n",
            " * @return {{DocumentFragment}}\n",
            " */",
        ),
        param_type, builder
    );
    let export = if options.export_dispatcher { "export " } else { "" };

    format!(
        "{}\n{}{}",
        jsdoc,
        export,
        create_function_code(
            &options.dispatcher_name,
            &lines,
            &[builder, "componentName"]
        )
    )
}

/// Id-to-unit table used to build components in process.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, CompiledComponent>,
}

impl ComponentRegistry {
    pub fn new(components: impl IntoIterator<Item = CompiledComponent>) -> Self {
        Self {
            components: components
                .into_iter()
                .map(|c| (c.component_name.clone(), c))
                .collect(),
        }
    }

    pub fn get(&self, component_name: &str) -> Option<&CompiledComponent> {
        self.components.get(component_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Fails with an unknown-component error, before touching the builder,
    /// when no unit was compiled under `component_name`.
    pub fn create_component<B: DomBuilder>(
        &self,
        builder: &mut B,
        component_name: &str,
    ) -> Result<B::Node, CompilerError> {
        let component = self
            .get(component_name)
            .ok_or_else(|| CompilerError::unknown_component(component_name))?;
        component.build(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roundtrip::{DomTree, TreeBuilder};
    use crate::validate::{ERR_UNKNOWN_COMPONENT, XHTML_NAMESPACE};

    fn sample(id: &str) -> CompiledComponent {
        let mut ir = TemplateIR::new(id);
        let div = ir.push_element(None, "div", XHTML_NAMESPACE, &[("class", "lh-audit")]);
        ir.push_text(Some(div), "hello");
        CompiledComponent::compile(&ir)
    }

    #[test]
    fn test_function_name_derivation() {
        assert_eq!(component_function_name("audit"), "createAuditComponent");
        assert_eq!(component_function_name("3pFilter"), "create3pFilterComponent");
        assert_eq!(component_function_name("crcChain"), "createCrcChainComponent");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_function_code_layout() {
        let code = sample("audit").function_code(&EmitOptions::default());
        assert_eq!(
            code,
            concat!(
                "/**\n * @param {DOM} dom\n */\n",
                "function createAuditComponent(dom) {\n",
                "  const v0 = dom.createElement(\"div\", \"lh-audit\");\n",
                "  v0.append(dom.document().createTextNode(\"hello\"));\n",
                "  const v1 = dom.document().createDocumentFragment();\n",
                "  v1.append(v0);\n",
                "  return v1;\n",
                "}",
            )
        );
    }

    #[test]
    fn test_dispatcher_code_lists_every_component() {
        let components = vec![sample("audit"), sample("snippet")];
        let code = dispatcher_code(&components, &EmitOptions::default());

        assert!(code.contains("/** @typedef {\"audit\"|\"snippet\"} ComponentName */"));
        assert!(code.contains("export function createComponent(dom, componentName) {"));
        assert!(code.contains("    case \"audit\": return createAuditComponent(dom);"));
        assert!(code.contains("    case \"snippet\": return createSnippetComponent(dom);"));
        assert!(code.contains("throw new Error('unexpected component: ' + componentName);"));
    }

    #[test]
    fn test_dispatcher_without_export() {
        let options = EmitOptions {
            export_dispatcher: false,
            dispatcher_name: "build".to_string(),
            ..EmitOptions::default()
        };
        let code = dispatcher_code(&[sample("a")], &options);
        assert!(code.contains("\nfunction build(dom, componentName) {"));
        assert!(!code.contains("export"));
    }

    #[test]
    fn test_registry_dispatches_by_name() {
        let registry = ComponentRegistry::new(vec![sample("snippet"), sample("audit")]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["audit", "snippet"]);

        let mut builder = TreeBuilder::new();
        let fragment = registry.create_component(&mut builder, "audit").unwrap();
        let children = builder.tree(&fragment);
        assert_eq!(children.len(), 1);
        match &children[0] {
            DomTree::Element { tag, children, .. } => {
                assert_eq!(tag, "div");
                assert_eq!(children, &vec![DomTree::Text("hello".to_string())]);
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_unknown_component_builds_nothing() {
        let registry = ComponentRegistry::new(vec![sample("audit")]);
        let mut builder = TreeBuilder::new();
        let err = registry
            .create_component(&mut builder, "unknown-component")
            .unwrap_err();

        assert_eq!(err.code, ERR_UNKNOWN_COMPONENT);
        assert!(err.message.contains("unknown-component"));
        assert_eq!(builder.node_count(), 0);
    }
}
