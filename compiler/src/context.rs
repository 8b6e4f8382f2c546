// context.rs — Program context
//
// Top-level registries populated while checking a program: element kinds
// by name, function signatures by name, and the symbol stack for the
// scope currently being checked. Element kinds and functions are
// immutable once registered; a second registration under the same name
// is a caller-side diagnostic, guarded here by the `contains_*` checks.
//
// Preconditions: none.
// Postconditions: registries only grow; the symbol stack returns to the
//   global scope after a balanced walk.
// Failure modes: none (duplicate detection is by query, not panic).
// Side effects: none beyond the context itself.

use std::collections::HashMap;

use crate::ir::{ComponentType, ElementType, Func, Type, Var};
use crate::symtab::{Access, Symbol, SymbolTable};

// ── Program context ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ProgramContext {
    symtab: SymbolTable,
    element_types: HashMap<String, ElementType>,
    functions: HashMap<String, Func>,
}

impl ProgramContext {
    /// An empty context with no built-ins. Used by tests that want full
    /// control over the function registry.
    pub fn new() -> Self {
        Self {
            symtab: SymbolTable::new(),
            element_types: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// The context the checker starts from: empty registries plus the
    /// built-in intrinsics.
    pub fn with_intrinsics() -> Self {
        let mut ctx = Self::new();
        for func in intrinsics() {
            ctx.functions.insert(func.name.clone(), func);
        }
        ctx
    }

    // ── Symbols ──────────────────────────────────────────────────────────

    pub fn scope(&mut self) {
        self.symtab.scope();
    }

    pub fn unscope(&mut self) {
        self.symtab.unscope();
    }

    pub fn scope_depth(&self) -> usize {
        self.symtab.depth()
    }

    pub fn add_symbol(&mut self, var: Var, access: Access) {
        let name = var.name.clone();
        self.symtab.insert(name, Symbol::new(var, access));
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symtab.get(name)
    }

    pub fn has_symbol(&self, name: &str, local_only: bool) -> bool {
        self.symtab.has_symbol(name, local_only)
    }

    // ── Element kinds ────────────────────────────────────────────────────

    pub fn contains_element_type(&self, name: &str) -> bool {
        self.element_types.contains_key(name)
    }

    pub fn add_element_type(&mut self, element: ElementType) {
        self.element_types.insert(element.name.clone(), element);
    }

    pub fn get_element_type(&self, name: &str) -> Option<&ElementType> {
        self.element_types.get(name)
    }

    pub fn element_types(&self) -> &HashMap<String, ElementType> {
        &self.element_types
    }

    // ── Functions ────────────────────────────────────────────────────────

    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn add_function(&mut self, func: Func) {
        self.functions.insert(func.name.clone(), func);
    }

    pub fn get_function(&self, name: &str) -> Option<&Func> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> &HashMap<String, Func> {
        &self.functions
    }
}

impl Default for ProgramContext {
    fn default() -> Self {
        Self::with_intrinsics()
    }
}

// ── Intrinsics ───────────────────────────────────────────────────────────

/// Names of the built-in intrinsics, for phases (like the call
/// rewriter) that need the set without building a full context.
pub fn intrinsic_names() -> Vec<String> {
    intrinsics().into_iter().map(|f| f.name).collect()
}

fn scalar_var(name: &str, component: ComponentType) -> Var {
    Var::new(name, Some(Type::scalar(component)))
}

/// The built-in function signatures every program starts with.
///
/// `norm` and `dot` are shape generic: they are registered with zero
/// declared arguments, which exempts them from the call arity and
/// argument type checks, and a scalar `float` result.
fn intrinsics() -> Vec<Func> {
    use ComponentType::{Float, Int};

    let mut funcs = Vec::new();

    funcs.push(Func::intrinsic(
        "mod",
        vec![scalar_var("x", Int), scalar_var("y", Int)],
        vec![scalar_var("r", Int)],
    ));

    for name in ["sin", "cos", "tan", "asin", "acos", "atan", "sqrt", "log", "exp"] {
        funcs.push(Func::intrinsic(
            name,
            vec![scalar_var("x", Float)],
            vec![scalar_var("r", Float)],
        ));
    }

    for name in ["atan2", "pow"] {
        funcs.push(Func::intrinsic(
            name,
            vec![scalar_var("x", Float), scalar_var("y", Float)],
            vec![scalar_var("r", Float)],
        ));
    }

    for name in ["norm", "dot"] {
        funcs.push(Func::intrinsic(
            name,
            Vec::new(),
            vec![scalar_var("r", Float)],
        ));
    }

    funcs
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FuncKind;

    #[test]
    fn element_type_registry() {
        let mut ctx = ProgramContext::new();
        assert!(!ctx.contains_element_type("Point"));
        ctx.add_element_type(ElementType::new("Point", Vec::new()));
        assert!(ctx.contains_element_type("Point"));
        assert_eq!(ctx.get_element_type("Point").unwrap().name, "Point");
    }

    #[test]
    fn function_registry() {
        let mut ctx = ProgramContext::new();
        assert!(!ctx.contains_function("f"));
        ctx.add_function(Func::new("f", Vec::new(), Vec::new()));
        assert!(ctx.contains_function("f"));
    }

    #[test]
    fn intrinsics_are_preregistered() {
        let ctx = ProgramContext::with_intrinsics();
        for name in ["mod", "sin", "atan2", "norm", "dot"] {
            let func = ctx.get_function(name).unwrap_or_else(|| {
                panic!("missing intrinsic '{}'", name)
            });
            assert_eq!(func.kind, FuncKind::Intrinsic);
        }
    }

    #[test]
    fn shape_generic_intrinsics_have_no_declared_args() {
        let ctx = ProgramContext::with_intrinsics();
        assert!(ctx.get_function("norm").unwrap().args.is_empty());
        assert!(ctx.get_function("dot").unwrap().args.is_empty());
        assert_eq!(
            ctx.get_function("norm").unwrap().result_types(),
            vec![Type::float()]
        );
    }

    #[test]
    fn symbol_stack_round_trip() {
        let mut ctx = ProgramContext::new();
        ctx.add_symbol(Var::new("points", None), Access::ReadWrite);
        ctx.scope();
        assert!(ctx.has_symbol("points", false));
        assert!(!ctx.has_symbol("points", true));
        ctx.unscope();
        assert_eq!(ctx.scope_depth(), 1);
    }
}
