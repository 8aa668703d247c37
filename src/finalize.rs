//! Finalize Module for the components compiler
//!
//! Compiles every template of a source document, orders the units by
//! component id and serializes them with the dispatcher into one ES module.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::cache::{source_hash, SOURCE_HASH_PREFIX};
use crate::component::{dispatcher_code, CompiledComponent};
use crate::parse::parse_document_templates;
use crate::scope::verify_generated_code;
use crate::validate::{
    CompilerError, TemplateIR, ERR_DUPLICATE_COMPONENT, ERR_INVALID_COMPONENT_ID,
};

lazy_static! {
    static ref COMPONENT_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_$]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmitOptions {
    /// Named in the `// auto-generated by …` banner.
    pub generator: String,
    /// Module that exports the `DOM` builder type, for the JSDoc typedef.
    pub dom_type_import: Option<String>,
    pub builder_param: String,
    pub dispatcher_name: String,
    pub export_dispatcher: bool,
    /// Check the generated module with the oxc parser before returning it.
    pub verify: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            generator: "build-components".to_string(),
            dom_type_import: Some("./dom.js".to_string()),
            builder_param: "dom".to_string(),
            dispatcher_name: "createComponent".to_string(),
            export_dispatcher: true,
            verify: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedOutput {
    pub code: String,
    /// Component ids in emission order.
    pub components: Vec<String>,
    pub source_hash: Option<String>,
}

pub fn validate_component_id(id: &str, file_path: &str) -> Result<(), CompilerError> {
    if COMPONENT_ID_RE.is_match(id) {
        return Ok(());
    }
    Err(CompilerError::with_details(
        ERR_INVALID_COMPONENT_ID,
        &format!(
            "Template id '{}' cannot be used in the function name '{}'.",
            id,
            crate::component::component_function_name(id)
        ),
        file_path,
        None,
        vec!["Use letters, digits, '_' or '$' in template ids, e.g. `crcChain`.".to_string()],
    ))
}

/// Compiles each template independently and returns the units sorted by
/// component id.
pub fn compile_components(templates: &[TemplateIR]) -> Vec<CompiledComponent> {
    let mut components: Vec<CompiledComponent> = templates
        .par_iter()
        .map(CompiledComponent::compile)
        .collect();
    components.sort_by(|a, b| a.component_name.cmp(&b.component_name));
    components
}

pub fn serialize_output(
    components: &[CompiledComponent],
    options: &EmitOptions,
    source_hash: Option<&str>,
) -> String {
    let mut header = vec![
        "'use strict';".to_string(),
        String::new(),
        format!("// auto-generated by {}", options.generator),
    ];
    if let Some(hash) = source_hash {
        header.push(format!("{}{}", SOURCE_HASH_PREFIX, hash));
    }
    header.push(String::new());
    if let Some(import) = &options.dom_type_import {
        header.push(format!("/** @typedef {{import('{}').DOM}} DOM */", import));
        header.push(String::new());
    }
    header.push("/* eslint-disable max-len */".to_string());

    let mut sections = vec![header.join("\n")];
    sections.extend(components.iter().map(|c| c.function_code(options)));
    sections.push(dispatcher_code(components, options));

    let mut code = sections.join("\n\n");
    code.push('\n');
    code
}

/// Compiles already-parsed templates into the final module.
pub fn compile_templates(
    templates: &[TemplateIR],
    options: &EmitOptions,
    file_path: &str,
    source_hash: Option<String>,
) -> Result<FinalizedOutput, CompilerError> {
    let mut seen = HashSet::new();
    for template in templates {
        validate_component_id(&template.id, file_path)?;
        if !seen.insert(template.id.as_str()) {
            return Err(CompilerError::new(
                ERR_DUPLICATE_COMPONENT,
                &format!("Component '{}' is declared more than once.", template.id),
                file_path,
            ));
        }
    }

    let components = compile_components(templates);
    let code = serialize_output(&components, options, source_hash.as_deref());

    if options.verify {
        verify_generated_code(&code, file_path)?;
    }

    log::info!(
        "emitted {} component(s) for {}",
        components.len(),
        if file_path.is_empty() { "<memory>" } else { file_path }
    );

    Ok(FinalizedOutput {
        code,
        components: components.into_iter().map(|c| c.component_name).collect(),
        source_hash,
    })
}

/// Parses `html`, compiles every `<template id>` in it and serializes the result.
pub fn compile_document(
    html: &str,
    file_path: &str,
    options: &EmitOptions,
) -> Result<FinalizedOutput, CompilerError> {
    let templates = parse_document_templates(html, file_path)?;
    let hash = source_hash(&[html], options);
    compile_templates(&templates, options, file_path, Some(hash))
}
