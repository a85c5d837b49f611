//! The Fabrique type system: structural types, subtyping, and the interning
//! context that hands out stable identities for them.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

/// Stable handle into a [`TypeContext`]. Two `TypeId`s compare equal iff they
/// were interned from structurally identical [`TypeKind`]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Direction tag carried by `file` types. Untagged files may flow freely
/// between record fields and local bindings, but an action's input/output
/// parameter must carry an explicit tag (see the open question on untagged
/// file parameters).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileTag {
    Untagged,
    In,
    Out,
}

impl Display for FileTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FileTag::Untagged => Ok(()),
            FileTag::In => write!(f, "[in]"),
            FileTag::Out => write!(f, "[out]"),
        }
    }
}

/// A field of a record type, kept in declaration order: records use width
/// and depth subtyping, not set equality, so field order matters only for
/// display, while field *names* drive the subtype check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeId,
}

/// Structural shape of a type. Equality of two `TypeKind`s (not `TypeId`s)
/// is what [`TypeContext::intern`] uses to decide whether a type already
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Nil,
    Boolean,
    Integer,
    Str,
    File(FileTag),
    List(TypeId),
    Maybe(TypeId),
    Record(Vec<RecordField>),
    Function(Vec<TypeId>, TypeId),
    /// A name introduced by a `type` declaration, wrapping an underlying
    /// structural type. Distinct from its wrapped type for identifier
    /// ordering purposes, but subtyping looks straight through it.
    User(String, TypeId),
}

/// Interning table for every type that appears during a single compilation.
/// Mirrors the reference implementation's signature holder: a type is never
/// mutated after it is interned, and identity is index equality.
#[derive(Debug, Default)]
pub struct TypeContext {
    kinds: Vec<TypeKind>,
    by_kind: IndexMap<TypeKind, TypeId>,
    nil: Option<TypeId>,
    boolean: Option<TypeId>,
    integer: Option<TypeId>,
    string: Option<TypeId>,
}

impl TypeContext {
    pub fn new() -> Self {
        let mut context = TypeContext::default();
        context.nil = Some(context.intern(TypeKind::Nil));
        context.boolean = Some(context.intern(TypeKind::Boolean));
        context.integer = Some(context.intern(TypeKind::Integer));
        context.string = Some(context.intern(TypeKind::Str));
        context
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(id) = self.by_kind.get(&kind) {
            return *id;
        }

        let id = TypeId(self.kinds.len());
        self.kinds.push(kind.clone());
        self.by_kind.insert(kind, id);
        id
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.0]
    }

    pub fn nil(&self) -> TypeId {
        self.nil.unwrap()
    }

    pub fn boolean(&self) -> TypeId {
        self.boolean.unwrap()
    }

    pub fn integer(&self) -> TypeId {
        self.integer.unwrap()
    }

    pub fn string(&self) -> TypeId {
        self.string.unwrap()
    }

    pub fn file_type(&mut self, tag: FileTag) -> TypeId {
        self.intern(TypeKind::File(tag))
    }

    pub fn input_file_type(&mut self) -> TypeId {
        self.file_type(FileTag::In)
    }

    pub fn output_file_type(&mut self) -> TypeId {
        self.file_type(FileTag::Out)
    }

    pub fn list_of(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeKind::List(element))
    }

    pub fn maybe_of(&mut self, inner: TypeId) -> TypeId {
        // maybe[maybe[T]] collapses to maybe[T]: there is no nested-option
        // distinction in the language, only "present or nil".
        if let TypeKind::Maybe(_) = self.kind(inner) {
            return inner;
        }
        self.intern(TypeKind::Maybe(inner))
    }

    pub fn record_type(&mut self, mut fields: Vec<RecordField>) -> TypeId {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        fields.dedup_by(|a, b| a.name == b.name);
        self.intern(TypeKind::Record(fields))
    }

    pub fn function_type(&mut self, params: Vec<TypeId>, result: TypeId) -> TypeId {
        self.intern(TypeKind::Function(params, result))
    }

    pub fn user_type(&mut self, name: impl Into<String>, underlying: TypeId) -> TypeId {
        self.intern(TypeKind::User(name.into(), underlying))
    }

    /// Looks a type up by a well-known builtin name. Returns `None` for
    /// anything parametric (`list[...]`, `maybe[...]`, records, functions),
    /// which are constructed directly by the caller instead.
    pub fn find(&self, name: &str) -> Option<TypeId> {
        match name {
            "nil" => Some(self.nil()),
            "bool" => Some(self.boolean()),
            "int" => Some(self.integer()),
            "string" => Some(self.string()),
            _ => None,
        }
    }

    fn resolve_user(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::User(_, underlying) => self.resolve_user(*underlying),
            _ => id,
        }
    }

    pub fn has_fields(&self, id: TypeId) -> bool {
        matches!(self.kind(self.resolve_user(id)), TypeKind::Record(_))
    }

    pub fn fields(&self, id: TypeId) -> &[RecordField] {
        match self.kind(self.resolve_user(id)) {
            TypeKind::Record(fields) => fields,
            _ => &[],
        }
    }

    /// Structural subtyping per the data model: `nil` is a subtype of every
    /// `maybe[T]`, lists and `maybe` are covariant in their element, records
    /// admit width and depth subtyping, and functions are contravariant in
    /// their parameters and covariant in their result.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.resolve_user(a);
        let b = self.resolve_user(b);

        if a == b {
            return true;
        }

        if a == self.nil() {
            if let TypeKind::Maybe(_) = self.kind(b) {
                return true;
            }
        }

        match (self.kind(a), self.kind(b)) {
            (TypeKind::Maybe(inner_a), TypeKind::Maybe(inner_b)) => self.is_subtype(*inner_a, *inner_b),
            (_, TypeKind::Maybe(inner_b)) => self.is_subtype(a, *inner_b),
            (TypeKind::List(inner_a), TypeKind::List(inner_b)) => self.is_subtype(*inner_a, *inner_b),
            (TypeKind::Record(fields_a), TypeKind::Record(fields_b)) => fields_b.iter().all(|wanted| {
                fields_a
                    .iter()
                    .find(|have| have.name == wanted.name)
                    .is_some_and(|have| self.is_subtype(have.ty, wanted.ty))
            }),
            (TypeKind::Function(params_a, result_a), TypeKind::Function(params_b, result_b)) => {
                params_a.len() == params_b.len()
                    && self.is_subtype(*result_a, *result_b)
                    && params_a.iter().zip(params_b.iter()).all(|(pa, pb)| self.is_subtype(*pb, *pa))
            }
            (TypeKind::File(tag_a), TypeKind::File(FileTag::Untagged)) if *tag_a != FileTag::Untagged => true,
            _ => false,
        }
    }

    pub fn is_supertype(&self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype(b, a)
    }

    /// Least upper bound used to unify the branches of a conditional
    /// expression. Returns `nil` when neither side is a subtype of the
    /// other, per the tie-break rule in the design notes.
    pub fn supertype(&self, a: TypeId, b: TypeId) -> TypeId {
        if self.is_subtype(a, b) {
            b
        } else if self.is_subtype(b, a) {
            a
        } else {
            self.nil()
        }
    }

    pub fn describe(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Nil => "nil".to_string(),
            TypeKind::Boolean => "bool".to_string(),
            TypeKind::Integer => "int".to_string(),
            TypeKind::Str => "string".to_string(),
            TypeKind::File(tag) => format!("file{tag}"),
            TypeKind::List(inner) => format!("list[{}]", self.describe(*inner)),
            TypeKind::Maybe(inner) => format!("maybe[{}]", self.describe(*inner)),
            TypeKind::Record(fields) => {
                let body = fields.iter().map(|f| format!("{}: {}", f.name, self.describe(f.ty))).collect::<Vec<_>>().join(", ");
                format!("{{{body}}}")
            }
            TypeKind::Function(params, result) => {
                let body = params.iter().map(|p| self.describe(*p)).collect::<Vec<_>>().join(", ");
                format!("function({body}) -> {}", self.describe(*result))
            }
            TypeKind::User(name, _) => name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_subtype_of_maybe() {
        let mut ctx = TypeContext::new();
        let maybe_int = ctx.maybe_of(ctx.integer());
        assert!(ctx.is_subtype(ctx.nil(), maybe_int));
        assert!(!ctx.is_subtype(maybe_int, ctx.nil()));
    }

    #[test]
    fn record_width_and_depth_subtyping() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer();
        let maybe_int = ctx.maybe_of(int);

        let narrow = ctx.record_type(vec![RecordField { name: "x".into(), ty: int }]);
        let wide = ctx.record_type(vec![
            RecordField { name: "x".into(), ty: maybe_int },
            RecordField { name: "y".into(), ty: int },
        ]);

        assert!(ctx.is_subtype(wide, narrow), "extra field + narrower field type should still satisfy {{x: maybe[int]}}");
        assert!(!ctx.is_subtype(narrow, wide));
    }

    #[test]
    fn function_contravariance() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer();
        let maybe_int = ctx.maybe_of(int);

        let accepts_maybe = ctx.function_type(vec![maybe_int], int);
        let accepts_int = ctx.function_type(vec![int], int);

        assert!(ctx.is_subtype(accepts_maybe, accepts_int), "a function taking a wider param type is a subtype of one taking a narrower type");
    }

    #[test]
    fn supertype_falls_back_to_nil() {
        let mut ctx = TypeContext::new();
        let a = ctx.list_of(ctx.integer());
        let b = ctx.list_of(ctx.string());
        assert_eq!(ctx.supertype(a, b), ctx.nil());
    }
}
