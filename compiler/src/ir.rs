// ir.rs — Typed intermediate representation
//
// Value types produced by the semantic analyzer: scalars (modeled as
// order-0 tensors), tensors with index-set dimensions and block nesting,
// element records, sets, edge sets, and fixed-length tuples, plus the
// variable/field/function carriers that reference them.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Component type ───────────────────────────────────────────────────────

/// The scalar kind stored in a tensor's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Int,
    Float,
    Bool,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Int => write!(f, "int"),
            ComponentType::Float => write!(f, "float"),
            ComponentType::Bool => write!(f, "bool"),
        }
    }
}

// ── Index sets and domains ───────────────────────────────────────────────

/// The domain of one tensor axis: a statically-known range, a named set
/// symbol, or the dynamic wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSet {
    Range(i64),
    Set(String),
    Dynamic,
}

impl IndexSet {
    /// A unit range, the "trivial" dimension tolerated by constant
    /// initializer shape slack.
    pub fn is_unit_range(&self) -> bool {
        matches!(self, IndexSet::Range(1))
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSet::Range(n) => write!(f, "{}", n),
            IndexSet::Set(name) => write!(f, "{}", name),
            IndexSet::Dynamic => write!(f, "*"),
        }
    }
}

/// One tensor dimension. The first index set is the outer axis; any
/// following sets describe the block nesting introduced when a tensor
/// type is built from a tensor-typed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDomain {
    pub index_sets: Vec<IndexSet>,
}

impl IndexDomain {
    pub fn new(index_set: IndexSet) -> Self {
        Self {
            index_sets: vec![index_set],
        }
    }

    pub fn from_sets(index_sets: Vec<IndexSet>) -> Self {
        Self { index_sets }
    }

    /// The outer axis of this dimension.
    pub fn outer(&self) -> &IndexSet {
        &self.index_sets[0]
    }
}

// ── Tensor type ──────────────────────────────────────────────────────────

/// A tensor: component scalar kind, ordered dimensions, and a column
/// vector flag that is significant only at order 1.
///
/// An order-0 tensor is how scalars are represented throughout the IR,
/// so `int`, `float`, and `bool` compare equal to the corresponding
/// dimensionless tensor by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorType {
    pub component: ComponentType,
    pub dims: Vec<IndexDomain>,
    pub column_vector: bool,
}

impl TensorType {
    pub fn new(component: ComponentType, dims: Vec<IndexDomain>, column_vector: bool) -> Self {
        Self {
            component,
            dims,
            column_vector,
        }
    }

    /// Number of dimensions.
    pub fn order(&self) -> usize {
        self.dims.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// The outer axis of each dimension, in order.
    pub fn outer_dims(&self) -> Vec<&IndexSet> {
        self.dims.iter().map(|d| d.outer()).collect()
    }

    /// The type of one dense block: this tensor with the outer axis of
    /// every dimension stripped. A tensor without block nesting yields
    /// its scalar component type.
    pub fn block_type(&self) -> Type {
        if self.is_scalar() {
            return Type::scalar(self.component);
        }
        let inner: Vec<IndexDomain> = self
            .dims
            .iter()
            .filter(|d| d.index_sets.len() > 1)
            .map(|d| IndexDomain::from_sets(d.index_sets[1..].to_vec()))
            .collect();
        if inner.is_empty() {
            Type::scalar(self.component)
        } else {
            Type::Tensor(TensorType::new(self.component, inner, false))
        }
    }
}

// ── Element, set, and tuple types ────────────────────────────────────────

/// A named field of an element kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// A named record of scalar/tensor fields declared at top level.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl ElementType {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A set of elements. Vertex sets have no endpoints; a k-ary edge set
/// lists the k sets its edges connect, in order. Endpoint order is
/// significant for equality.
#[derive(Debug, Clone, PartialEq)]
pub struct SetType {
    pub element: ElementType,
    pub endpoints: Vec<String>,
}

impl SetType {
    pub fn new(element: ElementType, endpoints: Vec<String>) -> Self {
        Self { element, endpoints }
    }

    pub fn is_edge_set(&self) -> bool {
        !self.endpoints.is_empty()
    }
}

/// A fixed-length homogeneous tuple of elements. Length is at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleType {
    pub element: ElementType,
    pub length: i64,
}

impl TupleType {
    pub fn new(element: ElementType, length: i64) -> Self {
        debug_assert!(length >= 1, "tuple length must be at least one");
        Self { element, length }
    }
}

// ── Type ─────────────────────────────────────────────────────────────────

/// A value type in the typed IR.
///
/// Equality is structural; tensor equality includes the column vector
/// flag. "Undefined" (the did-not-check marker) is represented as
/// `Option<Type>::None` at every API boundary rather than as a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Tensor(TensorType),
    Element(ElementType),
    Set(SetType),
    Tuple(TupleType),
}

impl Type {
    /// An order-0 tensor of the given component kind.
    pub fn scalar(component: ComponentType) -> Self {
        Type::Tensor(TensorType::new(component, Vec::new(), false))
    }

    pub fn int() -> Self {
        Type::scalar(ComponentType::Int)
    }

    pub fn float() -> Self {
        Type::scalar(ComponentType::Float)
    }

    pub fn boolean() -> Self {
        Type::scalar(ComponentType::Bool)
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Type::Tensor(_))
    }

    pub fn as_tensor(&self) -> Option<&TensorType> {
        match self {
            Type::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Type::Set(_))
    }

    pub fn as_set(&self) -> Option<&SetType> {
        match self {
            Type::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Type::Element(_))
    }

    pub fn as_element(&self) -> Option<&ElementType> {
        match self {
            Type::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleType> {
        match self {
            Type::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// An order-0 tensor.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Tensor(t) if t.is_scalar())
    }

    /// A scalar of boolean kind.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Type::Tensor(t) if t.is_scalar() && t.component == ComponentType::Bool
        )
    }

    /// A scalar of integer kind.
    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Type::Tensor(t) if t.is_scalar() && t.component == ComponentType::Int
        )
    }

    /// A tensor whose cells are not boolean. Boolean tensors are not
    /// valid operands of numeric operators.
    pub fn is_numeric_tensor(&self) -> bool {
        matches!(self, Type::Tensor(t) if t.component != ComponentType::Bool)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Tensor(t) => {
                if t.is_scalar() {
                    return write!(f, "{}", t.component);
                }
                write!(f, "tensor[")?;
                for (i, outer) in t.outer_dims().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", outer)?;
                }
                write!(f, "]({})", t.block_type())?;
                if t.column_vector {
                    write!(f, "'")?;
                }
                Ok(())
            }
            Type::Element(e) => write!(f, "{}", e.name),
            Type::Set(s) => {
                write!(f, "set{{{}}}", s.element.name)?;
                if !s.endpoints.is_empty() {
                    write!(f, "({})", s.endpoints.join(","))?;
                }
                Ok(())
            }
            Type::Tuple(t) => write!(f, "({}*{})", t.element.name, t.length),
        }
    }
}

// ── Variables and functions ──────────────────────────────────────────────

/// A named value carrying its type. A `None` type records that the
/// declaration failed to check; referencing such a variable does not
/// re-report the original fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub ty: Option<Type>,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    /// Declared in the program being compiled.
    Internal,
    /// Built-in. An intrinsic with zero declared arguments is shape
    /// generic and exempt from call arity and argument type checks.
    Intrinsic,
}

/// A function signature: arguments and results as typed variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub kind: FuncKind,
    pub args: Vec<Var>,
    pub results: Vec<Var>,
}

impl Func {
    pub fn new(name: impl Into<String>, args: Vec<Var>, results: Vec<Var>) -> Self {
        Self {
            name: name.into(),
            kind: FuncKind::Internal,
            args,
            results,
        }
    }

    pub fn intrinsic(name: impl Into<String>, args: Vec<Var>, results: Vec<Var>) -> Self {
        Self {
            name: name.into(),
            kind: FuncKind::Intrinsic,
            args,
            results,
        }
    }

    /// The result types, in declaration order. Results whose declared
    /// type failed to check are skipped at registration, so these are
    /// always present.
    pub fn result_types(&self) -> Vec<Type> {
        self.results.iter().filter_map(|r| r.ty.clone()).collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: i64, m: i64) -> Type {
        Type::Tensor(TensorType::new(
            ComponentType::Float,
            vec![
                IndexDomain::new(IndexSet::Range(n)),
                IndexDomain::new(IndexSet::Range(m)),
            ],
            false,
        ))
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::float().to_string(), "float");
        assert_eq!(Type::boolean().to_string(), "bool");
    }

    #[test]
    fn tensor_display() {
        assert_eq!(matrix(3, 4).to_string(), "tensor[3,4](float)");
    }

    #[test]
    fn column_vector_display() {
        let v = Type::Tensor(TensorType::new(
            ComponentType::Float,
            vec![IndexDomain::new(IndexSet::Set("points".to_string()))],
            true,
        ));
        assert_eq!(v.to_string(), "tensor[points](float)'");
    }

    #[test]
    fn blocked_tensor_display() {
        let blocked = Type::Tensor(TensorType::new(
            ComponentType::Float,
            vec![IndexDomain::from_sets(vec![
                IndexSet::Set("points".to_string()),
                IndexSet::Range(3),
            ])],
            false,
        ));
        assert_eq!(blocked.to_string(), "tensor[points](tensor[3](float))");
    }

    #[test]
    fn block_type_of_flat_tensor_is_scalar() {
        let t = matrix(3, 4);
        assert_eq!(t.as_tensor().unwrap().block_type(), Type::float());
    }

    #[test]
    fn block_type_strips_outer_axes() {
        let blocked = TensorType::new(
            ComponentType::Float,
            vec![
                IndexDomain::from_sets(vec![IndexSet::Set("p".to_string()), IndexSet::Range(3)]),
                IndexDomain::from_sets(vec![IndexSet::Set("p".to_string()), IndexSet::Range(3)]),
            ],
            false,
        );
        assert_eq!(blocked.block_type(), matrix(3, 3));
    }

    #[test]
    fn scalar_equals_order_zero_tensor() {
        let explicit = Type::Tensor(TensorType::new(ComponentType::Int, Vec::new(), false));
        assert_eq!(Type::int(), explicit);
    }

    #[test]
    fn column_vector_flag_breaks_equality() {
        let row = TensorType::new(
            ComponentType::Float,
            vec![IndexDomain::new(IndexSet::Range(3))],
            false,
        );
        let mut col = row.clone();
        col.column_vector = true;
        assert_ne!(Type::Tensor(row), Type::Tensor(col));
    }

    #[test]
    fn set_display_with_endpoints() {
        let elem = ElementType::new("Spring", Vec::new());
        let s = Type::Set(SetType::new(
            elem,
            vec!["points".to_string(), "points".to_string()],
        ));
        assert_eq!(s.to_string(), "set{Spring}(points,points)");
    }

    #[test]
    fn tuple_display() {
        let elem = ElementType::new("Point", Vec::new());
        assert_eq!(
            Type::Tuple(TupleType::new(elem, 2)).to_string(),
            "(Point*2)"
        );
    }
}
