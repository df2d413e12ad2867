//! The IR type algebra.
//!
//! Types are structural except for nominal structs and enums, which compare
//! by declaration identity, and opaque type aliases, which compare by name.
//! Declarations keep their payload behind a `RefCell` so that recursive
//! nominals (an enum case mentioning its own enum) can be filled in after
//! the `Rc` handle exists.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ir::value::ElementKey;

/// A named product type declaration.
#[derive(Debug)]
pub struct StructDecl {
    pub name: String,
    fields: RefCell<Vec<(String, Type)>>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fields: RefCell::new(Vec::new()),
        })
    }

    /// Append a field. Fields keep declaration order.
    pub fn append_field(&self, name: impl Into<String>, ty: Type) {
        self.fields.borrow_mut().push((name.into(), ty));
    }

    pub fn fields(&self) -> Ref<'_, Vec<(String, Type)>> {
        self.fields.borrow()
    }

    pub fn field_type(&self, name: &str) -> Option<Type> {
        self.fields
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.borrow().iter().position(|(n, _)| n == name)
    }
}

/// A single case of an enum declaration.
#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub associated_types: Vec<Type>,
}

/// A named sum type declaration.
#[derive(Debug)]
pub struct EnumDecl {
    pub name: String,
    cases: RefCell<Vec<EnumCase>>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            cases: RefCell::new(Vec::new()),
        })
    }

    /// Append a case. Cases keep declaration order.
    pub fn append_case(&self, name: impl Into<String>, associated_types: Vec<Type>) {
        self.cases.borrow_mut().push(EnumCase {
            name: name.into(),
            associated_types,
        });
    }

    pub fn cases(&self) -> Ref<'_, Vec<EnumCase>> {
        self.cases.borrow()
    }

    pub fn case_types(&self, name: &str) -> Option<Vec<Type>> {
        self.cases
            .borrow()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.associated_types.clone())
    }

    pub fn case_names(&self) -> Vec<String> {
        self.cases.borrow().iter().map(|c| c.name.clone()).collect()
    }
}

/// A named type alias. An alias with no target type is opaque: it stands for
/// a type whose layout is unknown here, and compares by name.
#[derive(Debug)]
pub struct TypeAlias {
    pub name: String,
    ty: RefCell<Option<Type>>,
}

impl TypeAlias {
    pub fn new(name: impl Into<String>, ty: Option<Type>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ty: RefCell::new(ty),
        })
    }

    pub fn set_type(&self, ty: Type) {
        *self.ty.borrow_mut() = Some(ty);
    }

    pub fn ty(&self) -> Option<Type> {
        self.ty.borrow().clone()
    }

    pub fn is_opaque(&self) -> bool {
        self.ty.borrow().is_none()
    }
}

/// An IR type. `Void` is spelled `Tuple([])`.
#[derive(Debug, Clone)]
pub enum Type {
    Bool,
    Tuple(Vec<Type>),
    Struct(Rc<StructDecl>),
    Enum(Rc<EnumDecl>),
    Pointer(Box<Type>),
    Function(Vec<Type>, Box<Type>),
    Alias(Rc<TypeAlias>),
    Invalid,
}

impl Type {
    /// The unit type: the empty tuple.
    pub fn void() -> Type {
        Type::Tuple(Vec::new())
    }

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn function(arguments: Vec<Type>, ret: Type) -> Type {
        Type::Function(arguments, Box::new(ret))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.canonical(), Type::Tuple(ref elements) if elements.is_empty())
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    /// The canonical form: aliases unfolded recursively, components
    /// canonicalized. Opaque aliases survive canonicalization. Unfolding a
    /// cyclic alias chain yields `Invalid`.
    pub fn canonical(&self) -> Type {
        self.canonical_guarded(&mut Vec::new())
    }

    fn canonical_guarded(&self, unfolding: &mut Vec<*const TypeAlias>) -> Type {
        match self {
            Type::Alias(alias) => match alias.ty() {
                None => self.clone(),
                Some(target) => {
                    let key = Rc::as_ptr(alias);
                    if unfolding.contains(&key) {
                        return Type::Invalid;
                    }
                    unfolding.push(key);
                    let canonical = target.canonical_guarded(unfolding);
                    unfolding.pop();
                    canonical
                }
            },
            Type::Tuple(elements) => Type::Tuple(
                elements
                    .iter()
                    .map(|t| t.canonical_guarded(unfolding))
                    .collect(),
            ),
            Type::Pointer(pointee) => Type::Pointer(Box::new(pointee.canonical_guarded(unfolding))),
            Type::Function(arguments, ret) => Type::Function(
                arguments
                    .iter()
                    .map(|t| t.canonical_guarded(unfolding))
                    .collect(),
                Box::new(ret.canonical_guarded(unfolding)),
            ),
            other => other.clone(),
        }
    }

    fn canonical_eq(a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Bool, Type::Bool) | (Type::Invalid, Type::Invalid) => true,
            (Type::Tuple(x), Type::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(u, v)| Type::canonical_eq(u, v))
            }
            (Type::Struct(x), Type::Struct(y)) => Rc::ptr_eq(x, y),
            (Type::Enum(x), Type::Enum(y)) => Rc::ptr_eq(x, y),
            (Type::Pointer(x), Type::Pointer(y)) => Type::canonical_eq(x, y),
            (Type::Function(xa, xr), Type::Function(ya, yr)) => {
                xa.len() == ya.len()
                    && xa.iter().zip(ya).all(|(u, v)| Type::canonical_eq(u, v))
                    && Type::canonical_eq(xr, yr)
            }
            // Only opaque aliases survive canonicalization; they compare by name.
            (Type::Alias(x), Type::Alias(y)) => x.name == y.name,
            _ => false,
        }
    }

    /// The type of the element reached by walking `keys`, or `None` when the
    /// path does not exist. Tuples are keyed by index, structs by field name,
    /// pointers consume one index or value key to reach their pointee.
    pub fn element_type(&self, keys: &[ElementKey]) -> Option<Type> {
        let Some((first, rest)) = keys.split_first() else {
            return Some(self.clone());
        };
        match self.canonical() {
            Type::Tuple(elements) => match first {
                ElementKey::Index(i) => elements.get(*i)?.element_type(rest),
                _ => None,
            },
            Type::Struct(decl) => match first {
                ElementKey::Name(field) => decl.field_type(field)?.element_type(rest),
                _ => None,
            },
            Type::Pointer(pointee) => match first {
                ElementKey::Index(_) | ElementKey::Value(_) => pointee.element_type(rest),
                ElementKey::Name(_) => None,
            },
            _ => None,
        }
    }

    /// A type is valid when every transitively referenced non-`Invalid`
    /// component is valid. Nominal recursion (an enum case naming its own
    /// enum) is legal; a cyclic alias chain is not.
    pub fn is_valid(&self) -> bool {
        self.validity(&mut Vec::new(), &mut Vec::new())
    }

    fn validity(&self, nominals: &mut Vec<*const ()>, aliases: &mut Vec<*const TypeAlias>) -> bool {
        match self {
            Type::Invalid => false,
            Type::Bool => true,
            Type::Tuple(elements) => elements.iter().all(|t| t.validity(nominals, aliases)),
            Type::Pointer(pointee) => pointee.validity(nominals, aliases),
            Type::Function(arguments, ret) => {
                arguments.iter().all(|t| t.validity(nominals, aliases))
                    && ret.validity(nominals, aliases)
            }
            Type::Struct(decl) => {
                let key = Rc::as_ptr(decl) as *const ();
                if nominals.contains(&key) {
                    return true;
                }
                nominals.push(key);
                let ok = decl
                    .fields()
                    .iter()
                    .all(|(_, t)| t.validity(nominals, aliases));
                nominals.pop();
                ok
            }
            Type::Enum(decl) => {
                let key = Rc::as_ptr(decl) as *const ();
                if nominals.contains(&key) {
                    return true;
                }
                nominals.push(key);
                let ok = decl.cases().iter().all(|case| {
                    case.associated_types
                        .iter()
                        .all(|t| t.validity(nominals, aliases))
                });
                nominals.pop();
                ok
            }
            Type::Alias(alias) => match alias.ty() {
                None => true,
                Some(target) => {
                    let key = Rc::as_ptr(alias);
                    if aliases.contains(&key) {
                        return false;
                    }
                    aliases.push(key);
                    let ok = target.validity(nominals, aliases);
                    aliases.pop();
                    ok
                }
            },
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Type::canonical_eq(&self.canonical(), &other.canonical())
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Tuple(elements) => {
                write!(f, "(")?;
                for (i, t) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Type::Struct(decl) => write!(f, "${}", decl.name),
            Type::Enum(decl) => write!(f, "${}", decl.name),
            Type::Pointer(pointee) => write!(f, "*{}", pointee),
            Type::Function(arguments, ret) => {
                write!(f, "(")?;
                for (i, t) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Alias(alias) => write!(f, "${}", alias.name),
            Type::Invalid => write!(f, "invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_is_empty_tuple() {
        assert!(Type::void().is_void());
        assert_eq!(Type::void(), Type::Tuple(vec![]));
        assert!(!Type::Bool.is_void());
    }

    #[test]
    fn test_alias_canonicalization() {
        let alias = TypeAlias::new("Flag", Some(Type::Bool));
        let ty = Type::Alias(alias);
        assert_eq!(ty, Type::Bool);
        assert_eq!(ty.canonical().to_string(), "bool");
    }

    #[test]
    fn test_opaque_alias_compares_by_name() {
        let a = Type::Alias(TypeAlias::new("Handle", None));
        let b = Type::Alias(TypeAlias::new("Handle", None));
        let c = Type::Alias(TypeAlias::new("Other", None));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Type::Bool);
    }

    #[test]
    fn test_nominal_identity() {
        let s1 = StructDecl::new("S");
        s1.append_field("x", Type::Bool);
        let s2 = StructDecl::new("S");
        s2.append_field("x", Type::Bool);
        assert_eq!(Type::Struct(s1.clone()), Type::Struct(s1.clone()));
        assert_ne!(Type::Struct(s1), Type::Struct(s2));
    }

    #[test]
    fn test_alias_cycle_is_invalid() {
        let a = TypeAlias::new("A", None);
        let b = TypeAlias::new("B", Some(Type::Alias(a.clone())));
        a.set_type(Type::Alias(b.clone()));
        let ty = Type::Alias(a);
        assert!(matches!(ty.canonical(), Type::Invalid));
        assert!(!ty.is_valid());
    }

    #[test]
    fn test_recursive_enum_is_valid() {
        let e = EnumDecl::new("List");
        e.append_case("nil", vec![]);
        e.append_case("cons", vec![Type::Bool, Type::Enum(e.clone())]);
        assert!(Type::Enum(e).is_valid());
    }

    #[test]
    fn test_element_type_tuple() {
        let ty = Type::Tuple(vec![Type::Bool, Type::Tuple(vec![Type::Bool])]);
        assert_eq!(ty.element_type(&[ElementKey::Index(0)]), Some(Type::Bool));
        assert_eq!(
            ty.element_type(&[ElementKey::Index(1), ElementKey::Index(0)]),
            Some(Type::Bool)
        );
        assert_eq!(ty.element_type(&[ElementKey::Index(2)]), None);
        assert_eq!(ty.element_type(&[ElementKey::Name("x".into())]), None);
    }

    #[test]
    fn test_element_type_struct_and_pointer() {
        let s = StructDecl::new("S");
        s.append_field("flag", Type::Bool);
        let ty = Type::Struct(s);
        assert_eq!(
            ty.element_type(&[ElementKey::Name("flag".into())]),
            Some(Type::Bool)
        );

        let ptr = Type::pointer(ty.clone());
        assert_eq!(ptr.element_type(&[ElementKey::Index(0)]), Some(ty));
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::Bool.to_string(), "bool");
        assert_eq!(Type::void().to_string(), "()");
        assert_eq!(Type::pointer(Type::Bool).to_string(), "*bool");
        assert_eq!(
            Type::function(vec![Type::Bool, Type::Bool], Type::Bool).to_string(),
            "(bool, bool) -> bool"
        );
        assert_eq!(
            Type::Tuple(vec![Type::Bool, Type::void()]).to_string(),
            "(bool, ())"
        );
    }
}
