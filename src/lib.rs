//! # Components Compiler
//!
//! Compiles the `<template id="…">` fragments of an HTML document into an ES
//! module of imperative construction functions, so the runtime can rebuild
//! each fragment through a small DOM builder object without shipping an HTML
//! parser or the original markup.
//!
//! ## Output Invariants
//!
//! 1. **One Function Per Template**: `<template id="audit">` becomes
//!    `function createAuditComponent(dom)`, returning a `DocumentFragment`.
//!
//! 2. **Definition Before Use**: every `vN` variable is declared by a creation
//!    statement before any `append`/`setAttribute`/`return` refers to it.
//!
//! 3. **Class At Creation**: the class list is passed to
//!    `createElement`/`createElementNS`, never set with `setAttribute`.
//!
//! 4. **SVG Is Namespaced**: elements whose namespace ends in `/svg` use
//!    `createElementNS` with the namespace URI as first argument.
//!
//! 5. **Formatting Whitespace Is Dropped**: whitespace-only text at the first
//!    and last child positions and all comments are skipped; other text is
//!    collapsed to single spaces outside whitespace-preserving parents.
//!
//! 6. **Stable Output**: functions are sorted by component id, and naming
//!    restarts at `v0` for every template.
//!
//! 7. **Closed Dispatch**: `createComponent(dom, name)` throws for a name
//!    that was not compiled.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod builder;
pub mod cache;
pub mod codegen;
pub mod component;
pub mod discovery;
pub mod finalize;
pub mod parse;
pub mod renamer;
pub mod roundtrip;
pub mod scope;
pub mod validate;
pub mod whitespace;

#[cfg(test)]
mod round_trip_tests;

pub use builder::{execute, DomBuilder};
pub use codegen::{compile_template, Instruction};
pub use component::{CompiledComponent, ComponentRegistry};
pub use finalize::{compile_document, compile_templates, EmitOptions, FinalizedOutput};
pub use parse::parse_document_templates;
pub use roundtrip::verify_round_trip;
pub use validate::{CompilerError, TemplateIR};
pub use whitespace::significant_text;

#[cfg(feature = "napi")]
#[napi]
pub fn compile_components_native(html: String, file_path: String) -> napi::Result<String> {
    compile_document(&html, &file_path, &EmitOptions::default())
        .map(|output| output.code)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
