//! Scanning and rewriting of runtime expressions embedded in workflow strings.
//!
//! Expressions such as `$steps.find_pet.outputs.petId` or `$inputs.status` are kept as
//! opaque strings. The engine never parses them; it only detects identifier references
//! behind a fixed prefix and substitutes them textually. A reference is bounded: the
//! identifier ends at the first character outside `[A-Za-z0-9_-]`, so `$steps.find`
//! is never mistaken for a reference inside `$steps.find_pet`.

use arazzo_types::{Reusable, Step, is_identifier_char};
use indexmap::IndexSet;
use serde_json::Value;

/// Prefix of a reference to a sibling step.
pub const STEP_REFERENCE_PREFIX: &str = "$steps.";

/// Prefix of a reference to a workflow input.
pub const INPUT_REFERENCE_PREFIX: &str = "$inputs.";

/// Context tokens that are always available inside a step.
pub const CONTEXT_TOKENS: &[&str] = &["$url", "$method", "$statusCode", "$request.body", "$response.body"];

/// A string inside a step that may carry expressions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExpressionSite {
    /// Field path of the string within the step (for example, `parameters.petId`).
    pub source_path: String,
    /// Raw string value.
    pub expression: String,
}

/// Returns the step identifiers referenced through `$steps.<stepId>`, in order of appearance.
pub fn find_step_references(expression: &str) -> IndexSet<String> {
    scan_identifiers(expression, STEP_REFERENCE_PREFIX)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Returns the input names referenced through `$inputs.<name>`, in order of appearance.
pub fn find_input_references(expression: &str) -> IndexSet<String> {
    scan_identifiers(expression, INPUT_REFERENCE_PREFIX)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Returns true when `expression` references `step_id`.
pub fn references_step(expression: &str, step_id: &str) -> bool {
    scan_identifiers(expression, STEP_REFERENCE_PREFIX).contains(&step_id)
}

/// Returns true when `expression` references the workflow input `input_name`.
pub fn references_input(expression: &str, input_name: &str) -> bool {
    scan_identifiers(expression, INPUT_REFERENCE_PREFIX).contains(&input_name)
}

/// Returns true when `expression` reads `$steps.<step_id>.outputs.<output_name>`.
pub fn references_step_output(expression: &str, step_id: &str, output_name: &str) -> bool {
    let needle = format!("{STEP_REFERENCE_PREFIX}{step_id}.outputs.{output_name}");
    let mut remainder = expression;
    while let Some(start) = remainder.find(&needle) {
        let after = &remainder[start + needle.len()..];
        if after.chars().next().is_none_or(|character| !is_identifier_char(character)) {
            return true;
        }
        remainder = after;
    }
    false
}

/// Replaces every bounded `$steps.<old_id>` with `$steps.<new_id>`.
///
/// Text outside the matched prefix is preserved byte for byte.
pub fn rewrite_step_reference(expression: &str, old_id: &str, new_id: &str) -> String {
    let needle = format!("{STEP_REFERENCE_PREFIX}{old_id}");
    let mut rewritten = String::with_capacity(expression.len());
    let mut remainder = expression;

    while let Some(start) = remainder.find(&needle) {
        let end = start + needle.len();
        rewritten.push_str(&remainder[..start]);
        let bounded = remainder[end..]
            .chars()
            .next()
            .is_none_or(|character| !is_identifier_char(character));
        if bounded {
            rewritten.push_str(STEP_REFERENCE_PREFIX);
            rewritten.push_str(new_id);
        } else {
            rewritten.push_str(&needle);
        }
        remainder = &remainder[end..];
    }

    rewritten.push_str(remainder);
    rewritten
}

/// Rewrites step references in a string in place. Returns true when the text changed.
pub fn rewrite_text(text: &mut String, old_id: &str, new_id: &str) -> bool {
    if !references_step(text, old_id) {
        return false;
    }
    *text = rewrite_step_reference(text, old_id, new_id);
    true
}

/// Rewrites step references in every string leaf of a JSON value.
pub fn rewrite_value_references(value: &mut Value, old_id: &str, new_id: &str) -> bool {
    match value {
        Value::String(text) => rewrite_text(text, old_id, new_id),
        Value::Array(values) => values
            .iter_mut()
            .fold(false, |changed, nested| rewrite_value_references(nested, old_id, new_id) | changed),
        Value::Object(map) => map
            .values_mut()
            .fold(false, |changed, nested| rewrite_value_references(nested, old_id, new_id) | changed),
        _ => false,
    }
}

/// Rewrites `$steps.<old_id>` across every expression-bearing field of a step.
///
/// Covers inline parameter values, the request payload and its replacements, success
/// criteria, and outputs. Parameters written as registry references are left untouched.
pub fn rewrite_step_expressions(step: &mut Step, old_id: &str, new_id: &str) -> bool {
    let mut changed = false;

    for parameter in step.parameters.iter_mut().filter_map(Reusable::as_inline_mut) {
        changed |= rewrite_value_references(&mut parameter.value, old_id, new_id);
    }

    if let Some(request_body) = step.request_body.as_mut() {
        if let Some(payload) = request_body.payload.as_mut() {
            changed |= rewrite_value_references(payload, old_id, new_id);
        }
        for replacement in &mut request_body.replacements {
            changed |= rewrite_value_references(&mut replacement.value, old_id, new_id);
        }
    }

    for criterion in &mut step.success_criteria {
        changed |= rewrite_text(&mut criterion.condition, old_id, new_id);
        if let Some(context) = criterion.context.as_mut() {
            changed |= rewrite_text(context, old_id, new_id);
        }
    }

    for expression in step.outputs.values_mut() {
        changed |= rewrite_text(expression, old_id, new_id);
    }

    changed
}

/// Lists every expression-bearing string of a step, in field order.
pub fn step_expression_sites(step: &Step) -> Vec<ExpressionSite> {
    let mut sites = Vec::new();

    for parameter in step.parameters.iter().filter_map(Reusable::as_inline) {
        collect_value_sites(&parameter.value, &format!("parameters.{}", parameter.name), &mut sites);
    }

    if let Some(request_body) = &step.request_body {
        if let Some(payload) = &request_body.payload {
            collect_value_sites(payload, "requestBody.payload", &mut sites);
        }
        for (index, replacement) in request_body.replacements.iter().enumerate() {
            collect_value_sites(&replacement.value, &format!("requestBody.replacements[{index}]"), &mut sites);
        }
    }

    for (index, criterion) in step.success_criteria.iter().enumerate() {
        sites.push(ExpressionSite {
            source_path: format!("successCriteria[{index}]"),
            expression: criterion.condition.clone(),
        });
        if let Some(context) = &criterion.context {
            sites.push(ExpressionSite {
                source_path: format!("successCriteria[{index}].context"),
                expression: context.clone(),
            });
        }
    }

    for (name, expression) in &step.outputs {
        sites.push(ExpressionSite {
            source_path: format!("outputs.{name}"),
            expression: expression.clone(),
        });
    }

    sites
}

/// Returns true when any expression inside the step references `step_id`.
pub fn step_references_step(step: &Step, step_id: &str) -> bool {
    step_expression_sites(step)
        .iter()
        .any(|site| references_step(&site.expression, step_id))
}

fn collect_value_sites(value: &Value, source_path: &str, sites: &mut Vec<ExpressionSite>) {
    match value {
        Value::String(text) => sites.push(ExpressionSite {
            source_path: source_path.to_string(),
            expression: text.clone(),
        }),
        Value::Array(values) => {
            for (index, nested_value) in values.iter().enumerate() {
                collect_value_sites(nested_value, &format!("{source_path}[{index}]"), sites);
            }
        }
        Value::Object(map) => {
            for (key, nested_value) in map {
                collect_value_sites(nested_value, &format!("{source_path}.{key}"), sites);
            }
        }
        _ => {}
    }
}

fn scan_identifiers<'a>(expression: &'a str, prefix: &str) -> Vec<&'a str> {
    let mut identifiers = Vec::new();
    let mut remainder = expression;

    while let Some(start) = remainder.find(prefix) {
        let after_prefix = &remainder[start + prefix.len()..];
        let length = after_prefix
            .find(|character: char| !is_identifier_char(character))
            .unwrap_or(after_prefix.len());
        if length > 0 {
            identifiers.push(&after_prefix[..length]);
        }
        remainder = &after_prefix[length..];
    }

    identifiers
}
