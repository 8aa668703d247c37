//! Round-trip tests: every compiled template, run through the in-memory
//! builder, must rebuild its source content once comments and formatting
//! whitespace are ignored.

#[cfg(test)]
mod tests {
    use crate::codegen::Instruction;
    use crate::component::CompiledComponent;
    use crate::finalize::{compile_document, EmitOptions};
    use crate::parse::parse_document_templates;
    use crate::roundtrip::{built_tree, expected_tree, verify_round_trip, DomTree};
    use crate::validate::{TemplateIR, SVG_NAMESPACE};

    const REPORT_TEMPLATES: &str = r#"<!doctype html>
<html>
<head><title>report templates</title></head>
<body>
<!-- Audit row -->
<template id="audit">
  <div class="lh-audit">
    <details class="lh-expandable-details">
      <summary>
        <div class="lh-audit__header lh-expandable-details__summary">
          <span class="lh-audit__score-icon"></span>
          <span class="lh-audit__title-and-text">
            <span class="lh-audit__title"></span>
            <span class="lh-audit__display-text"></span>
          </span>
          <div class="lh-chevron-container"></div>
        </div>
      </summary>
      <div class="lh-audit__description"></div>
      <div class="lh-audit__stackpacks"></div>
    </details>
  </div>
</template>

<template id="chevron">
  <svg class="lh-chevron" title="See audits" viewBox="0 0 100 100">
    <g class="lh-chevron__lines">
      <path class="lh-chevron__line lh-chevron__line-left" d="M10 50h40"></path>
      <path class="lh-chevron__line lh-chevron__line-right" d="M90 50H50"></path>
    </g>
  </svg>
</template>

<template id="snippet">
  <style>
    .lh-snippet {
      overflow: auto;
    }
  </style>
  <div class="lh-snippet">
    <!-- header goes here -->
    <pre class="lh-snippet__code">  indented
      more</pre>
    <p>Show <b>all</b>   <em>lines</em> &amp; more</p>
  </div>
</template>
</body>
</html>"#;

    fn templates() -> Vec<TemplateIR> {
        parse_document_templates(REPORT_TEMPLATES, "templates.html").unwrap()
    }

    fn compiled(id: &str) -> (TemplateIR, CompiledComponent) {
        let template = templates().into_iter().find(|t| t.id == id).unwrap();
        let component = CompiledComponent::compile(&template);
        (template, component)
    }

    fn rendered(component: &CompiledComponent) -> Vec<String> {
        component.instructions.iter().map(|i| i.to_js("dom")).collect()
    }

    #[test]
    fn test_every_template_matches_html_source() {
        let templates = templates();
        assert_eq!(templates.len(), 3);
        for template in &templates {
            let component = CompiledComponent::compile(template);
            if let Err(err) = verify_round_trip(template, &component) {
                panic!("{} component does not match: {:?}", template.id, err.context);
            }
        }
    }

    #[test]
    fn test_audit_tree_shape() {
        let (template, component) = compiled("audit");
        let expected = expected_tree(&template);
        assert_eq!(expected.len(), 1);
        assert_eq!(built_tree(&component).unwrap(), expected);

        let lines = rendered(&component);
        assert_eq!(lines[0], r#"const v0 = dom.createElement("div", "lh-audit");"#);
        assert_eq!(
            lines[1],
            r#"const v1 = dom.createElement("details", "lh-expandable-details");"#
        );
        assert_eq!(lines.last().unwrap(), &format!("return v{};", 11));
    }

    #[test]
    fn test_interior_whitespace_between_siblings_is_emitted_as_single_space() {
        let (_, component) = compiled("audit");
        let spaces = component
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::CreateTextNode { text, .. } if text == " "))
            .count();
        // details: 2 gaps, header div: 2 gaps, title span: 1 gap.
        assert_eq!(spaces, 5);
    }

    #[test]
    fn test_svg_component_is_namespaced() {
        let (_, component) = compiled("chevron");
        let lines = rendered(&component);
        assert_eq!(
            lines[0],
            format!(
                r#"const v0 = dom.createElementNS("{}", "svg", "lh-chevron");"#,
                SVG_NAMESPACE
            )
        );
        assert_eq!(lines[1], r#"v0.setAttribute("title", "See audits");"#);
        assert_eq!(lines[2], r#"v0.setAttribute("viewBox", "0 0 100 100");"#);
        assert!(lines.iter().all(|l| !l.contains("dom.createElement(")));
    }

    #[test]
    fn test_preformatted_and_style_text_is_verbatim() {
        let (_, component) = compiled("snippet");
        let lines = rendered(&component);

        assert_eq!(lines[0], r#"const v0 = dom.createElement("style");"#);
        assert_eq!(
            lines[1],
            concat!(
                r#"v0.append(dom.document().createTextNode("#,
                r#""\n    .lh-snippet {\n      overflow: auto;\n    }\n  "));"#,
            )
        );
        assert!(lines.contains(
            &r#"v2.append(dom.document().createTextNode("  indented\n      more"));"#
                .to_string()
        ));
    }

    #[test]
    fn test_mixed_inline_text() {
        let (template, component) = compiled("snippet");
        let lines = rendered(&component);
        let texts: Vec<&str> = component
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::CreateTextNode { parent, text } if parent == "v3" => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Show ", " ", " & more"]);
        assert!(lines.contains(&r#"v3.append(v4);"#.to_string()));

        let expected = expected_tree(&template);
        match &expected[1] {
            DomTree::Element { tag, children, .. } => {
                assert_eq!(tag, "div");
                assert_eq!(children.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mathml_template_round_trips() {
        let html = concat!(
            r#"<template id="formula">"#,
            r#"<math><mi>x</mi><mo>=</mo><mn>1</mn></math>"#,
            r#"</template>"#,
        );
        let template = parse_document_templates(html, "math.html").unwrap().remove(0);
        let component = CompiledComponent::compile(&template);

        assert!(verify_round_trip(&template, &component).is_ok());
        assert_eq!(rendered(&component)[0], r#"const v0 = dom.createElement("math");"#);
    }

    #[test]
    fn test_deeply_nested_template_compiles_and_round_trips() {
        let depth = 20_000;
        let html = format!(
            "<template id=\"deep\">{}<span class=\"leaf\">x</span>{}</template>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let template = parse_document_templates(&html, "deep.html").unwrap().remove(0);
        let component = CompiledComponent::compile(&template);
        assert!(verify_round_trip(&template, &component).is_ok());

        let output = compile_document(&html, "deep.html", &EmitOptions::default()).unwrap();
        assert_eq!(output.components, vec!["deep"]);
        assert!(output.code.contains(r#"const v20000 = dom.createElement("span", "leaf");"#));
        assert!(output.code.contains("  return v20001;\n"));
    }
}
