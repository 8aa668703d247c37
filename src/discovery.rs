//! Discovery Module for the components compiler
//!
//! Collects template source documents from a directory and loads the
//! templates they declare.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::parse::parse_document_templates;
use crate::validate::{CompilerError, TemplateIR, ERR_DUPLICATE_COMPONENT, ERR_IO};

/// A source document and the templates parsed out of it.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub path: PathBuf,
    pub html: String,
    pub templates: Vec<TemplateIR>,
}

/// Every `.html` file below `dir`, sorted so output never depends on
/// directory iteration order.
pub fn find_template_sources(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "html"))
        .collect();
    files.sort();
    files
}

pub fn load_source(path: &Path) -> Result<TemplateSource, CompilerError> {
    let path_str = path.to_string_lossy().to_string();
    let html = fs::read_to_string(path).map_err(|e| {
        CompilerError::new(ERR_IO, &format!("Failed to read file: {}", e), &path_str)
    })?;
    let templates = parse_document_templates(&html, &path_str)?;
    Ok(TemplateSource {
        path: path.to_path_buf(),
        html,
        templates,
    })
}

/// Loads all `paths`, rejecting a component id declared more than once.
pub fn load_templates(paths: &[PathBuf]) -> Result<Vec<TemplateSource>, CompilerError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let source = load_source(path)?;
        for template in &source.templates {
            if let Some(first) = seen.insert(template.id.clone(), path.clone()) {
                return Err(CompilerError::with_details(
                    ERR_DUPLICATE_COMPONENT,
                    &format!("Component '{}' is declared more than once.", template.id),
                    &path.to_string_lossy(),
                    Some(format!("first declared in {}", first.display())),
                    vec!["Rename one of the <template> ids.".to_string()],
                ));
            }
        }
        sources.push(source);
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "components-compiler-discovery-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_finds_html_files_sorted() {
        let dir = scratch_dir();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.html"), "").unwrap();
        fs::write(dir.join("nested/a.html"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();

        let files = find_template_sources(&dir);
        assert_eq!(files, vec![dir.join("b.html"), dir.join("nested/a.html")]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_templates_from_several_files() {
        let dir = scratch_dir();
        fs::write(dir.join("a.html"), r#"<template id="audit"><div></div></template>"#).unwrap();
        fs::write(dir.join("b.html"), r#"<template id="snippet"><p></p></template>"#).unwrap();

        let sources = load_templates(&find_template_sources(&dir)).unwrap();
        let ids: Vec<_> = sources
            .iter()
            .flat_map(|s| s.templates.iter().map(|t| t.id.clone()))
            .collect();
        assert_eq!(ids, vec!["audit", "snippet"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let dir = scratch_dir();
        fs::write(dir.join("a.html"), r#"<template id="audit"><div></div></template>"#).unwrap();
        fs::write(dir.join("b.html"), r#"<template id="audit"><p></p></template>"#).unwrap();

        let err = load_templates(&find_template_sources(&dir)).unwrap_err();
        assert_eq!(err.code, ERR_DUPLICATE_COMPONENT);
        assert!(err.file.ends_with("b.html"));
        assert!(err.context.unwrap().contains("a.html"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_source(Path::new("/definitely/not/here.html")).unwrap_err();
        assert_eq!(err.code, ERR_IO);
    }
}
