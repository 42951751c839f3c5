//! Shape descriptors: the field/variant structure of records and sum types.
//!
//! Descriptors are produced lazily through [`ShapeFn`] pointers, so a type that
//! mentions itself can still be described. [`Shape::check`] walks the graph
//! once and rejects self-reference before any converter runs.

use std::any::TypeId;
use std::collections::HashSet;

use crate::convert::{ReadConfig, short_type_name};
use crate::error::DerivationError;

/// Lazily produced shape, typically `<T as ReadConfig>::shape`.
pub type ShapeFn = fn() -> Shape;

#[derive(Debug, Clone)]
pub struct Shape {
    type_id: TypeId,
    type_name: &'static str,
    kind: ShapeKind,
}

#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// A scalar or a type with a hand-written reader.
    Leaf,
    /// A container; its element shapes are walked transparently.
    Wrapper(Vec<ShapeFn>),
    Record(Vec<FieldShape>),
    /// Variants in declaration order.
    Sum(Vec<VariantShape>),
}

#[derive(Debug, Clone)]
pub struct FieldShape {
    name: &'static str,
    has_default: bool,
    shape: ShapeFn,
}

impl FieldShape {
    pub fn new<F: ReadConfig>(name: &'static str, has_default: bool) -> Self {
        Self {
            name: name.strip_prefix("r#").unwrap_or(name),
            has_default,
            shape: F::shape,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

#[derive(Debug, Clone)]
pub struct VariantShape {
    name: &'static str,
    fields: Vec<FieldShape>,
}

impl VariantShape {
    pub fn new(name: &'static str, fields: Vec<FieldShape>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

impl Shape {
    pub fn leaf<T: 'static>() -> Self {
        Self::of::<T>(ShapeKind::Leaf)
    }

    pub fn wrapper<T: 'static>(inner: Vec<ShapeFn>) -> Self {
        Self::of::<T>(ShapeKind::Wrapper(inner))
    }

    pub fn record<T: 'static>(fields: Vec<FieldShape>) -> Self {
        Self::of::<T>(ShapeKind::Record(fields))
    }

    pub fn sum<T: 'static>(variants: Vec<VariantShape>) -> Self {
        Self::of::<T>(ShapeKind::Sum(variants))
    }

    fn of<T: 'static>(kind: ShapeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            kind,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Field names of a record shape, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        match &self.kind {
            ShapeKind::Record(fields) => fields.iter().map(FieldShape::name).collect(),
            _ => Vec::new(),
        }
    }

    /// Reject shapes where a record or sum type contains itself, directly or
    /// through other records, variants, containers or boxes.
    ///
    /// Each record or sum type is walked once, however many fields share it.
    pub fn check(&self) -> Result<(), DerivationError> {
        let mut walk = Walk {
            stack: Vec::new(),
            cleared: HashSet::new(),
            root: self.type_name,
        };
        self.visit(&mut walk)
    }

    fn visit(&self, walk: &mut Walk) -> Result<(), DerivationError> {
        let composite = matches!(self.kind, ShapeKind::Record(_) | ShapeKind::Sum(_));
        if composite && walk.cleared.contains(&self.type_id) {
            return Ok(());
        }
        if composite
            && let Some(start) = walk.stack.iter().position(|(id, _)| *id == self.type_id)
        {
            let stack = &walk.stack;
            let mut cycle: Vec<&str> = stack[start..].iter().map(|(_, s)| s.as_str()).collect();
            cycle.push(self.type_name);
            return Err(DerivationError::CyclicShape {
                root: walk.root,
                cycle: cycle.join(" -> "),
            });
        }

        let walked = match &self.kind {
            ShapeKind::Leaf => Ok(()),
            ShapeKind::Wrapper(inner) => inner.iter().try_for_each(|f| f().visit(walk)),
            ShapeKind::Record(fields) => {
                self.visit_fields(walk, self.type_name.to_string(), fields)
            }
            ShapeKind::Sum(variants) => variants.iter().try_for_each(|variant| {
                let label = format!("{}::{}", self.type_name, variant.name);
                self.visit_fields(walk, label, &variant.fields)
            }),
        };
        walked?;

        if composite {
            walk.cleared.insert(self.type_id);
        }
        Ok(())
    }

    fn visit_fields(
        &self,
        walk: &mut Walk,
        label: String,
        fields: &[FieldShape],
    ) -> Result<(), DerivationError> {
        for field in fields {
            walk.stack.push((self.type_id, format!("{label} -> {}", field.name)));
            let result = field.shape().visit(walk);
            walk.stack.pop();
            result?;
        }
        Ok(())
    }
}

/// State of one [`Shape::check`]: the current derivation path and the
/// composite types already proven acyclic.
struct Walk {
    stack: Vec<(TypeId, String)>,
    cleared: HashSet<TypeId>,
    root: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Figure, Holiday, Node, Tree};

    #[test]
    fn record_shape_lists_fields() {
        let shape = Holiday::shape();
        assert_eq!(shape.type_name(), "Holiday");
        assert_eq!(shape.field_names(), vec!["where", "how_long"]);
        match shape.kind() {
            ShapeKind::Record(fields) => assert!(fields.iter().all(FieldShape::has_default)),
            other => panic!("Expected a record shape, got: {other:?}"),
        }
    }

    #[test]
    fn acyclic_shapes_pass() {
        assert!(Holiday::shape().check().is_ok());
        assert!(Figure::shape().check().is_ok());
        assert!(<Vec<Option<Holiday>>>::shape().check().is_ok());
    }

    #[test]
    fn self_referential_record_is_rejected() {
        let err = Node::shape().check().unwrap_err();
        let DerivationError::CyclicShape { root, cycle } = err;
        assert_eq!(root, "Node");
        assert_eq!(cycle, "Node -> next -> Node");
    }

    #[test]
    fn cycle_through_sum_variant_is_rejected() {
        let err = Tree::shape().check().unwrap_err();
        let DerivationError::CyclicShape { cycle, .. } = err;
        assert!(cycle.starts_with("Tree::Branch -> children"), "{cycle}");
    }

    #[test]
    fn shared_records_are_walked_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use crate::cursor::ConfigCursor;
        use crate::failure::ReadResult;

        static LEAF_VISITS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        struct Mid;
        struct Top;

        impl ReadConfig for Counted {
            fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                u8::read_config(cursor).map(|_| Counted)
            }

            fn shape() -> Shape {
                LEAF_VISITS.fetch_add(1, Ordering::SeqCst);
                Shape::leaf::<Self>()
            }
        }

        impl ReadConfig for Mid {
            fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                u8::read_config(cursor).map(|_| Mid)
            }

            fn shape() -> Shape {
                Shape::record::<Self>(vec![
                    FieldShape::new::<Counted>("a", false),
                    FieldShape::new::<Counted>("b", false),
                ])
            }
        }

        impl ReadConfig for Top {
            fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                u8::read_config(cursor).map(|_| Top)
            }

            fn shape() -> Shape {
                Shape::record::<Self>(vec![
                    FieldShape::new::<Mid>("left", false),
                    FieldShape::new::<Mid>("right", false),
                    FieldShape::new::<Option<Mid>>("spare", false),
                ])
            }
        }

        assert!(Top::shape().check().is_ok());
        assert_eq!(LEAF_VISITS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn raw_identifiers_are_described_bare() {
        assert_eq!(FieldShape::new::<String>("r#type", false).name(), "type");
    }
}
