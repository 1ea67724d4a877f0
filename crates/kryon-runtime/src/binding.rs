// crates/kryon-runtime/src/binding.rs
//
// The §4.2 property-access contract, implemented against a live tree,
// variable registry, and component-instance scope. `Reference`/
// `Template`/`AstExpression` properties are resolved here at read time;
// everything else is a pure conversion already covered by
// `kryon_core::PropertyValue`'s own accessors.

use crate::component::{resolve_scoped, ComponentInstanceManager};
use glam::Vec4;
use kryon_core::{
    AstExpr, Element, ElementTree, PropertyAccessor, PropertyRegistry, PropertyValue, TemplateSegment,
    VariableRegistry,
};

pub struct Binder<'a> {
    pub tree: &'a ElementTree,
    pub vars: &'a VariableRegistry,
    pub components: &'a ComponentInstanceManager,
    registry: PropertyRegistry,
}

impl<'a> Binder<'a> {
    pub fn new(tree: &'a ElementTree, vars: &'a VariableRegistry, components: &'a ComponentInstanceManager) -> Self {
        Self { tree, vars, components, registry: PropertyRegistry::new() }
    }

    fn scoped(&self, element: &Element, name: &str) -> Option<String> {
        resolve_scoped(self.tree, self.components, self.vars, element.id, name)
    }

    /// Step 4-6 of §4.2: resolve a `Reference`/`Template`/`AstExpression`
    /// value down to plain text.
    fn resolve_bound(&self, element: &Element, value: &PropertyValue) -> Option<String> {
        match value {
            PropertyValue::Reference { binding_path } => self.scoped(element, binding_path),
            PropertyValue::Template(segments) => Some(self.resolve_template(element, segments)),
            PropertyValue::AstExpression(expr) => Some(self.eval_ast(element, expr).as_string()),
            _ => None,
        }
    }

    fn resolve_template(&self, element: &Element, segments: &[TemplateSegment]) -> String {
        let mut out = String::new();
        for seg in segments {
            match seg {
                TemplateSegment::Literal(l) => out.push_str(l),
                TemplateSegment::Variable(name) => {
                    if let Some(v) = self.scoped(element, name) {
                        out.push_str(&v);
                    }
                }
            }
        }
        out
    }

    fn eval_ast(&self, element: &Element, expr: &AstExpr) -> kryon_core::AstValue {
        let resolve = |name: &str| self.scoped(element, name);
        expr.eval(&resolve)
    }

    /// Find the named property (by its exact name or its canonical
    /// alias) and, if it is bound, resolve it down to a plain
    /// `PropertyValue::String`. Unbound values pass through unchanged.
    fn resolved(&self, element: &Element, name: &str) -> Option<PropertyValue> {
        let canonical = self.registry.canonical_name(name);
        let prop = element.properties.get(name).or_else(|| element.properties.get(canonical))?;
        match prop {
            PropertyValue::Reference { .. } | PropertyValue::Template(_) | PropertyValue::AstExpression(_) => {
                self.resolve_bound(element, prop).map(PropertyValue::String)
            }
            other => Some(other.clone()),
        }
    }

    /// The canonical text form any resolved value displays as, used by
    /// `get_string` for non-string/non-function variants.
    fn display(value: &PropertyValue) -> String {
        match value {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Function(s) => s.clone(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Color(c) => format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                (c.x * 255.0).round() as u8,
                (c.y * 255.0).round() as u8,
                (c.z * 255.0).round() as u8,
                (c.w * 255.0).round() as u8
            ),
            PropertyValue::Array(items) => items.join(","),
            PropertyValue::Reference { .. } | PropertyValue::Template(_) | PropertyValue::AstExpression(_) => {
                String::new()
            }
        }
    }
}

impl<'a> PropertyAccessor for Binder<'a> {
    fn get_string(&self, element: &Element, name: &str, default: &str) -> String {
        self.resolved(element, name).map(|v| Self::display(&v)).unwrap_or_else(|| default.to_string())
    }

    fn get_int(&self, element: &Element, name: &str, default: i64) -> i64 {
        self.resolved(element, name).and_then(|v| v.as_int()).unwrap_or(default)
    }

    fn get_float(&self, element: &Element, name: &str, default: f64) -> f64 {
        self.resolved(element, name).and_then(|v| v.as_float()).unwrap_or(default)
    }

    fn get_bool(&self, element: &Element, name: &str, default: bool) -> bool {
        self.resolved(element, name).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_color(&self, element: &Element, name: &str, default: Vec4) -> Vec4 {
        self.resolved(element, name).and_then(|v| v.as_color()).unwrap_or(default)
    }

    fn get_array(&self, element: &Element, name: &str) -> Vec<String> {
        match self.resolved(element, name) {
            Some(PropertyValue::Array(items)) => items,
            Some(PropertyValue::String(s)) => s.split(',').map(|t| t.trim().to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{Element, ElementId, ElementType};

    fn setup() -> (ElementTree, VariableRegistry, ComponentInstanceManager, ElementId) {
        let mut tree = ElementTree::new();
        let id = tree.alloc_id();
        let mut el = Element::new(id, ElementType::Text);
        el.properties.set("text", PropertyValue::Reference { binding_path: "count".to_string() });
        tree.insert(el, None);

        let mut vars = VariableRegistry::new();
        vars.set("count", "0");
        (tree, vars, ComponentInstanceManager::new(), id)
    }

    #[test]
    fn reactive_counter_reads_current_value() {
        let (tree, mut vars, components, id) = setup();
        {
            let binder = Binder::new(&tree, &vars, &components);
            let element = tree.get(id).unwrap();
            assert_eq!(binder.get_string(element, "text", ""), "0");
        }
        vars.set("count", "1");
        let binder = Binder::new(&tree, &vars, &components);
        let element = tree.get(id).unwrap();
        assert_eq!(binder.get_string(element, "text", ""), "1");
    }

    #[test]
    fn alias_and_canonical_agree() {
        let mut tree = ElementTree::new();
        let id = tree.alloc_id();
        let mut el = Element::new(id, ElementType::Container);
        el.properties.set("z-index", PropertyValue::Int(3));
        tree.insert(el, None);
        let vars = VariableRegistry::new();
        let components = ComponentInstanceManager::new();
        let binder = Binder::new(&tree, &vars, &components);
        let element = tree.get(id).unwrap();
        assert_eq!(binder.get_int(element, "z_index", 0), binder.get_int(element, "z-index", 0));
    }

    #[test]
    fn template_concatenates_literal_and_variable_segments() {
        let mut tree = ElementTree::new();
        let id = tree.alloc_id();
        let mut el = Element::new(id, ElementType::Text);
        el.properties.set(
            "text",
            PropertyValue::Template(vec![
                TemplateSegment::Literal("hi ".to_string()),
                TemplateSegment::Variable("name".to_string()),
            ]),
        );
        tree.insert(el, None);
        let mut vars = VariableRegistry::new();
        vars.set("name", "world");
        let components = ComponentInstanceManager::new();
        let binder = Binder::new(&tree, &vars, &components);
        let element = tree.get(id).unwrap();
        assert_eq!(binder.get_string(element, "text", ""), "hi world");
    }
}
