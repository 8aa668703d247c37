use crate::validate::{CompilerError, ERR_OUTPUT_SCOPE, ERR_OUTPUT_SYNTAX};
use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::BindingPattern;
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use oxc_syntax::scope::ScopeFlags;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref NODE_VARIABLE_RE: Regex = Regex::new(r"^v\d+$").unwrap();
}

/// Checks generated output: it must parse as an ES module, and inside each
/// function every `vN` variable must be declared before it is referenced.
pub fn verify_generated_code(code: &str, file_path: &str) -> Result<(), CompilerError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);

    let ret = Parser::new(&allocator, code, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(CompilerError::with_details(
            ERR_OUTPUT_SYNTAX,
            &format!("Generated code does not parse: {:?}", error),
            file_path,
            None,
            vec![format!("{} parse error(s) in total", ret.errors.len())],
        ));
    }

    let mut collector = DeclarationOrderCollector {
        frames: vec![HashSet::new()],
        violations: vec![],
    };
    collector.visit_program(&ret.program);

    if let Some((name, span)) = collector.violations.first() {
        let context = code
            .get(span.start as usize..)
            .and_then(|rest| rest.lines().next())
            .map(|line| line.to_string());
        return Err(CompilerError::with_details(
            ERR_OUTPUT_SCOPE,
            &format!("'{}' is referenced before it is declared.", name),
            file_path,
            context,
            vec![],
        ));
    }

    Ok(())
}

/// Tracks `const` bindings per function. An initializer is visited before its
/// binding is recorded, so `const v0 = v0` is reported.
struct DeclarationOrderCollector {
    frames: Vec<HashSet<String>>,
    violations: Vec<(String, oxc_span::Span)>,
}

impl<'a> Visit<'a> for DeclarationOrderCollector {
    fn visit_function(&mut self, func: &oxc_ast::ast::Function<'a>, flags: ScopeFlags) {
        self.frames.push(HashSet::new());
        oxc_ast_visit::walk::walk_function(self, func, flags);
        self.frames.pop();
    }

    fn visit_variable_declarator(&mut self, decl: &oxc_ast::ast::VariableDeclarator<'a>) {
        if let Some(init) = &decl.init {
            self.visit_expression(init);
        }
        if let BindingPattern::BindingIdentifier(id) = &decl.id {
            if let Some(frame) = self.frames.last_mut() {
                frame.insert(id.name.to_string());
            }
        }
    }

    fn visit_identifier_reference(&mut self, ident: &oxc_ast::ast::IdentifierReference<'a>) {
        let name = ident.name.to_string();
        if !NODE_VARIABLE_RE.is_match(&name) {
            return;
        }
        let declared = self
            .frames
            .last()
            .map(|frame| frame.contains(&name))
            .unwrap_or(false);
        if !declared {
            self.violations.push((name, ident.span));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_construction_function_passes() {
        let code = r#"
function createAComponent(dom) {
  const v0 = dom.createElement("div");
  const v1 = dom.document().createDocumentFragment();
  v1.append(v0);
  return v1;
}
export function createComponent(dom, componentName) {
  switch (componentName) {
    case "a": return createAComponent(dom);
  }
  throw new Error('unexpected component: ' + componentName);
}
"#;
        assert!(verify_generated_code(code, "components.js").is_ok());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = verify_generated_code("function (", "out.js").unwrap_err();
        assert_eq!(err.code, ERR_OUTPUT_SYNTAX);
        assert_eq!(err.file, "out.js");
    }

    #[test]
    fn test_use_before_declaration_is_reported() {
        let code = r#"
function f(dom) {
  v0.append(v1);
  const v0 = dom.createElement("div");
  const v1 = dom.createElement("p");
  return v0;
}
"#;
        let err = verify_generated_code(code, "out.js").unwrap_err();
        assert_eq!(err.code, ERR_OUTPUT_SCOPE);
        assert!(err.message.contains("'v0'"));
        assert_eq!(err.context.as_deref(), Some("v0.append(v1);"));
    }

    #[test]
    fn test_bindings_do_not_leak_between_functions() {
        let code = r#"
function f(dom) {
  const v0 = dom.createElement("div");
  return v0;
}
function g(dom) {
  return v0;
}
"#;
        let err = verify_generated_code(code, "out.js").unwrap_err();
        assert_eq!(err.code, ERR_OUTPUT_SCOPE);
    }
}
