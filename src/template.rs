//! Scaffold template interpolation
//!
//! Templates reference values as `{{ name }}` or `{{ .name }}`; dotted keys
//! such as `{{ config.hostname }}` are looked up verbatim. `${...}` is left
//! alone so Terraform interpolation passes through untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DeckhandError, Result};

#[allow(clippy::expect_used)]
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z_][A-Za-z0-9_\-]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Values available to a template
pub type TemplateVars = BTreeMap<String, String>;

/// Render `template` against `vars`
///
/// `name` identifies the template in error messages. Fails when a referenced
/// key is missing or when a `{{` opener is not a well-formed reference.
pub fn render(name: &str, template: &str, vars: &TemplateVars) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for captures in VAR_REGEX.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        check_literal(name, &template[last..whole.start()])?;
        output.push_str(&template[last..whole.start()]);

        let key = &captures[1];
        let value = vars.get(key).ok_or_else(|| DeckhandError::TemplateFailed {
            template: name.to_string(),
            reason: format!("missing value for '{}'", key),
        })?;
        output.push_str(value);
        last = whole.end();
    }

    check_literal(name, &template[last..])?;
    output.push_str(&template[last..]);
    Ok(output)
}

fn check_literal(name: &str, literal: &str) -> Result<()> {
    if let Some(position) = literal.find("{{") {
        let snippet: String = literal[position..].chars().take(24).collect();
        return Err(DeckhandError::TemplateFailed {
            template: name.to_string(),
            reason: format!("malformed reference near '{}'", snippet.trim_end()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_values() {
        let rendered = render(
            "backend.tf",
            "bucket = \"{{ bucket }}\"\nregion = \"{{ .region }}\"",
            &vars(&[("bucket", "state"), ("region", "us-east-1")]),
        )
        .unwrap();

        assert_eq!(rendered, "bucket = \"state\"\nregion = \"us-east-1\"");
    }

    #[test]
    fn test_render_dotted_keys() {
        let rendered = render(
            "values.yaml",
            "host: {{config.hostname}}",
            &vars(&[("config.hostname", "console.example.com")]),
        )
        .unwrap();

        assert_eq!(rendered, "host: console.example.com");
    }

    #[test]
    fn test_render_leaves_terraform_interpolation() {
        let rendered = render("main.tf", "name = \"${var.cluster}\"", &TemplateVars::new()).unwrap();
        assert_eq!(rendered, "name = \"${var.cluster}\"");
    }

    #[test]
    fn test_render_missing_key() {
        let err = render("main.tf", "{{ cluster }}", &TemplateVars::new()).unwrap_err();
        match err {
            DeckhandError::TemplateFailed { template, reason } => {
                assert_eq!(template, "main.tf");
                assert!(reason.contains("cluster"));
            }
            other => panic!("Expected TemplateFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_render_unterminated_reference() {
        let result = render("main.tf", "value = {{ cluster", &vars(&[("cluster", "c")]));
        assert!(matches!(result, Err(DeckhandError::TemplateFailed { .. })));
    }
}
