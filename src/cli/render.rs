//! Render templates against JSON parameters

use std::collections::HashMap;

use tracing::debug;

use super::{CliError, json_to_param};
use crate::{
    config::EngineConfig,
    render::{BoundSql, TemplateEvaluator},
    resolver::Parameters,
    template::Template,
    value::TypeTag,
};

/// Options for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Template text
    pub template: String,
    /// JSON parameters
    pub params: Option<String>,
    /// Overrides the configured root parameter name
    pub root_name: Option<String>,
    pub config: EngineConfig,
    /// Extra declared types, merged over the configured ones
    pub types: Vec<(String, TypeTag)>,
    /// Only validate template syntax, don't render
    pub syntax_only: bool,
}

/// Result of a render operation
#[derive(Debug)]
pub enum RenderResult {
    /// Syntax validation passed
    SyntaxValid { nodes: usize },
    /// Template rendered successfully
    Rendered(BoundSql),
}

/// Execute a twoway render operation
pub fn execute_render(options: &RenderOptions) -> Result<RenderResult, CliError> {
    let template = Template::parse(&options.template)?;

    if options.syntax_only {
        return Ok(RenderResult::SyntaxValid {
            nodes: template.root().count(),
        });
    }

    let json_str = options.params.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;

    let mut config = options.config.clone();
    if let Some(name) = &options.root_name {
        config.root_name = name.clone();
    }
    let evaluator = TemplateEvaluator::new(&config)?;

    let mut declared_types: HashMap<String, TypeTag> = config.declared_types.clone();
    declared_types.extend(options.types.iter().cloned());
    debug!(
        root_name = %config.root_name,
        declared = declared_types.len(),
        "rendering from CLI"
    );

    let params = Parameters::new(config.root_name, json_to_param(json_value))
        .with_declared_types(declared_types);

    let bound = evaluator.evaluate(template.root(), &params)?;
    Ok(RenderResult::Rendered(bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ParamValue;

    fn options(template: &str, params: &str) -> RenderOptions {
        RenderOptions {
            template: template.to_string(),
            params: Some(params.to_string()),
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_render_from_json() {
        let opts = options(
            "SELECT * FROM MEMBER WHERE MEMBER_ID IN /*pmb.ids*/(1, 2)",
            r#"{ "ids": [3, 4] }"#,
        );
        let RenderResult::Rendered(bound) = execute_render(&opts).unwrap() else {
            panic!("expected rendered output");
        };
        assert_eq!(bound.sql, "SELECT * FROM MEMBER WHERE MEMBER_ID IN (?, ?)");
        assert_eq!(bound.bind_values[1].value, ParamValue::Integer(4));
    }

    #[test]
    fn test_declared_type_for_null() {
        let mut opts = options(
            "WHERE BIRTHDATE = /*param.birthdate:nullable*/'2000-01-01'",
            r#"{ "birthdate": null }"#,
        );
        opts.root_name = Some("param".to_string());
        opts.types = vec![("birthdate".to_string(), TypeTag::String)];

        let RenderResult::Rendered(bound) = execute_render(&opts).unwrap() else {
            panic!("expected rendered output");
        };
        assert_eq!(bound.bind_values[0].declared_type, TypeTag::String);
    }

    #[test]
    fn test_syntax_only_needs_no_params() {
        let opts = RenderOptions {
            template: "SELECT 1 /*IF pmb.x*/WHERE X = 1/*END*/".to_string(),
            syntax_only: true,
            ..RenderOptions::default()
        };
        assert!(matches!(
            execute_render(&opts),
            Ok(RenderResult::SyntaxValid { nodes: 4 })
        ));
    }

    #[test]
    fn test_missing_params() {
        let opts = RenderOptions {
            template: "SELECT 1".to_string(),
            ..RenderOptions::default()
        };
        assert!(matches!(execute_render(&opts), Err(CliError::NoInput)));
    }
}
