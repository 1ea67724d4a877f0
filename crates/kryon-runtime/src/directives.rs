// crates/kryon-runtime/src/directives.rs
//
// The `@for`/`@if` expander (§4.5): clone the directive's template
// children once per iteration value, substituting the iteration
// variable into bound properties, and attach the clones as siblings
// right after the directive node. Re-running is idempotent: the
// previously generated siblings are destroyed first every time.

use kryon_core::{
    AstExpr, AstValue, Element, ElementId, ElementTree, ElementType, PropertyValue, TemplateSegment,
    VariableRegistry,
};

use crate::error::ErrorLog;

/// Re-expand every `@for`/`@if` directive in the tree. Safe to call on
/// every frame where the variable registry changed; idempotent when it
/// didn't, since the token list recomputes to the same values. Returns
/// every element destroyed while clearing previously-generated output,
/// so the caller can notify the script engine before their ids are gone
/// for good.
pub fn expand_all(tree: &mut ElementTree, vars: &VariableRegistry, errors: &mut ErrorLog) -> Vec<Element> {
    let mut destroyed = Vec::new();
    if let Some(root) = tree.root() {
        expand_recursive(tree, root, vars, errors, &mut destroyed);
    }
    destroyed
}

fn expand_recursive(
    tree: &mut ElementTree,
    id: ElementId,
    vars: &VariableRegistry,
    errors: &mut ErrorLog,
    destroyed: &mut Vec<Element>,
) {
    let children = match tree.get(id) {
        Some(e) => e.children.clone(),
        None => return,
    };

    for child_id in children {
        let element_type = match tree.get(child_id) {
            Some(e) => e.element_type,
            None => continue,
        };

        match element_type {
            ElementType::For => destroyed.extend(expand_for(tree, child_id, vars, errors)),
            ElementType::If => destroyed.extend(expand_if(tree, child_id, vars, errors)),
            _ => {}
        }

        // Recurse into whatever now lives under this child, including
        // freshly generated siblings (nested directives inside them).
        expand_recursive(tree, child_id, vars, errors, destroyed);
    }

    // Newly generated siblings of a directive appear after it in the
    // parent's own children list; walk those too so nested directives
    // one level down from `id` are caught on this same pass.
    if let Some(element) = tree.get(id) {
        let generated: Vec<ElementId> =
            element.children.iter().filter(|c| tree.get(**c).map(|e| e.generated_by_directive.is_some()).unwrap_or(false)).copied().collect();
        for gen_id in generated {
            expand_recursive(tree, gen_id, vars, errors, destroyed);
        }
    }
}

fn expand_for(tree: &mut ElementTree, for_id: ElementId, vars: &VariableRegistry, errors: &mut ErrorLog) -> Vec<Element> {
    let Some(parent) = tree.get(for_id).and_then(|e| e.parent) else {
        errors.push("`@for` element has no parent, skipping expansion");
        return Vec::new();
    };

    let mut destroyed = tree.destroy_generated_after(parent, for_id);

    let (variable, array_spec, template_children) = {
        let Some(element) = tree.get(for_id) else { return destroyed };
        let variable = element.properties.get("variable").and_then(|v| v.as_string()).map(str::to_string);
        let array_spec = element.properties.get("array").and_then(|v| v.as_string()).map(str::to_string);
        (variable, array_spec, element.children.clone())
    };

    let (Some(variable), Some(array_spec)) = (variable, array_spec) else {
        errors.push(format!("`@for` element {for_id} is missing `variable` or `array`"));
        return destroyed;
    };

    let values = resolve_array_tokens(&array_spec, vars);

    let mut insert_at = tree.index_in_parent(for_id).map(|i| i + 1).unwrap_or(0);
    for value in &values {
        for template_id in &template_children {
            let new_id = clone_into(tree, *template_id, Some((&variable, value)), for_id, parent, insert_at);
            insert_at = tree.index_in_parent(new_id).map(|i| i + 1).unwrap_or(insert_at + 1);
        }
    }
    destroyed
}

fn expand_if(tree: &mut ElementTree, if_id: ElementId, vars: &VariableRegistry, errors: &mut ErrorLog) -> Vec<Element> {
    let Some(parent) = tree.get(if_id).and_then(|e| e.parent) else {
        errors.push("`@if` element has no parent, skipping expansion");
        return Vec::new();
    };

    let destroyed = tree.destroy_generated_after(parent, if_id);

    let (condition, template_children) = {
        let Some(element) = tree.get(if_id) else { return destroyed };
        let condition = element.properties.get("condition").cloned();
        (condition, element.children.clone())
    };

    let Some(condition) = condition else {
        errors.push(format!("`@if` element {if_id} is missing `condition`"));
        return destroyed;
    };

    if !evaluate_condition(&condition, vars) {
        return destroyed;
    }

    let mut insert_at = tree.index_in_parent(if_id).map(|i| i + 1).unwrap_or(0);
    for template_id in &template_children {
        let new_id = clone_into(tree, *template_id, None, if_id, parent, insert_at);
        insert_at = tree.index_in_parent(new_id).map(|i| i + 1).unwrap_or(insert_at + 1);
    }
    destroyed
}

fn evaluate_condition(value: &PropertyValue, vars: &VariableRegistry) -> bool {
    let resolve = |name: &str| vars.get(name).map(|s| s.to_string());
    match value {
        PropertyValue::Bool(b) => *b,
        PropertyValue::AstExpression(expr) => expr.eval(&resolve).truthy(),
        PropertyValue::Reference { binding_path } => resolve(binding_path)
            .map(|v| AstValue::String(v).truthy())
            .unwrap_or(false),
        other => other.as_bool().unwrap_or(false),
    }
}

/// Tokenize an `array` spec (§4.5 step 3): a literal `[a, b, c]` list, or
/// a variable-registry lookup that resolves to the same comma-separated
/// shape. Trims whitespace, surrounding brackets, and surrounding double
/// quotes from each token; empty tokens are skipped.
fn resolve_array_tokens(spec: &str, vars: &VariableRegistry) -> Vec<String> {
    let raw = if spec.trim_start().starts_with('[') {
        spec.to_string()
    } else {
        match vars.get(spec) {
            Some(v) => v.to_string(),
            None => return Vec::new(),
        }
    };

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);

    trimmed
        .split(',')
        .map(|tok| tok.trim().trim_matches('"').to_string())
        .filter(|tok| !tok.is_empty())
        .collect()
}

/// Deep-clone `template_id`'s subtree under `new_parent` at `insert_index`,
/// substituting `substitution` (the `@for` iteration variable/value pair)
/// into matching `REFERENCE`/`TEMPLATE` properties, and marking every
/// clone as generated by `directive_id` so the next pass can clear it.
fn clone_into(
    tree: &mut ElementTree,
    template_id: ElementId,
    substitution: Option<(&str, &str)>,
    directive_id: ElementId,
    new_parent: ElementId,
    insert_index: usize,
) -> ElementId {
    let template = tree.get(template_id).expect("template id must exist").clone();
    let new_id = tree.alloc_id();

    let mut clone = Element::new(new_id, template.element_type);
    clone.user_id = template.user_id.clone();
    clone.classes = template.classes.clone();
    clone.event_handlers = template.event_handlers.clone();
    clone.generated_by_directive = Some(directive_id);

    for (name, value) in template.properties.iter() {
        let substituted = match substitution {
            Some((var_name, value_str)) => substitute_template(value, var_name, value_str),
            None => value.clone(),
        };
        clone.properties.set(name, substituted);
    }

    tree.insert_at(clone, new_parent, insert_index);

    for (i, child_id) in template.children.iter().enumerate() {
        clone_into(tree, *child_id, substitution, directive_id, new_id, i);
    }

    new_id
}

/// §4.5 step 4: substitute `var_name`'s value into a bound property.
/// `REFERENCE` whose path matches becomes a plain `STRING`. `TEMPLATE`
/// segments referencing `var_name` are resolved in place; once no
/// `VARIABLE` segment remains the whole property collapses to `STRING`.
fn substitute_template(value: &PropertyValue, var_name: &str, value_str: &str) -> PropertyValue {
    match value {
        PropertyValue::Reference { binding_path } if binding_path == var_name => {
            PropertyValue::String(value_str.to_string())
        }
        PropertyValue::Template(segments) => {
            let resolved: Vec<TemplateSegment> = segments
                .iter()
                .map(|seg| match seg {
                    TemplateSegment::Variable(name) if name == var_name => {
                        TemplateSegment::Literal(value_str.to_string())
                    }
                    other => other.clone(),
                })
                .collect();

            if resolved.iter().all(|s| matches!(s, TemplateSegment::Literal(_))) {
                let joined = resolved
                    .into_iter()
                    .map(|s| match s {
                        TemplateSegment::Literal(l) => l,
                        TemplateSegment::Variable(_) => unreachable!(),
                    })
                    .collect::<String>();
                PropertyValue::String(joined)
            } else {
                PropertyValue::Template(resolved)
            }
        }
        PropertyValue::AstExpression(AstExpr::Var(name)) if name == var_name => {
            PropertyValue::String(value_str.to_string())
        }
        other => other.clone(),
    }
}
