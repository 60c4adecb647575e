use std::fmt;

/// Primitive types, including `void` for return positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    pub fn from_descriptor(c: u8) -> Option<Self> {
        Some(match c {
            b'Z' => PrimitiveType::Boolean,
            b'B' => PrimitiveType::Byte,
            b'C' => PrimitiveType::Char,
            b'S' => PrimitiveType::Short,
            b'I' => PrimitiveType::Int,
            b'J' => PrimitiveType::Long,
            b'F' => PrimitiveType::Float,
            b'D' => PrimitiveType::Double,
            b'V' => PrimitiveType::Void,
            _ => return None,
        })
    }

    pub fn descriptor(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
            PrimitiveType::Void => 'V',
        }
    }

    pub fn source_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Void => "void",
        }
    }
}

/// A plain (non-generic) reference to a class by internal name, e.g. `java/util/Map$Entry`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefType {
    name: String,
}

impl RefType {
    pub fn new(internal_name: impl Into<String>) -> Self {
        Self {
            name: internal_name.into(),
        }
    }

    pub fn object() -> Self {
        Self::new("java/lang/Object")
    }

    /// Internal (slash separated) name.
    pub fn internal_name(&self) -> &str {
        &self.name
    }

    /// Dotted name, e.g. `java.util.Map$Entry`.
    pub fn source_name(&self) -> String {
        self.name.replace('/', ".")
    }

    /// Name without package or enclosing classes.
    pub fn simple_name(&self) -> &str {
        let name = match self.name.rfind('/') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        };
        match name.rfind('$') {
            Some(pos) if pos + 1 < name.len() => &name[pos + 1..],
            _ => name,
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.name.rfind('/').map(|pos| &self.name[..pos])
    }

    /// Whether the name is that of a nested class (`Outer$Inner`).
    pub fn is_inner_class(&self) -> bool {
        self.outer_class_name().is_some()
    }

    /// The enclosing class implied by the name, i.e. everything before the last `$`.
    pub fn outer_class_name(&self) -> Option<&str> {
        let start = self.name.rfind('/').map_or(0, |p| p + 1);
        let pos = self.name[start..].rfind('$')? + start;
        if pos == start || pos + 1 == self.name.len() {
            return None;
        }
        Some(&self.name[..pos])
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_name())
    }
}

/// A reference type applied to type arguments.
///
/// The instance is *unbound* when every argument is a type variable, as in the
/// declaration `Map<K, V>`, and bound otherwise (`Map<String, List<T>>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericRefType {
    pub base: RefType,
    pub args: Vec<JavaType>,
}

impl GenericRefType {
    pub fn new(base: RefType, args: Vec<JavaType>) -> Self {
        Self { base, args }
    }

    pub fn is_unbound(&self) -> bool {
        self.args.iter().all(|a| matches!(a, JavaType::TypeVar(_)))
    }
}

/// Wildcard bound in a type argument position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<JavaType>),
    Super(Box<JavaType>),
}

/// A type reference as it appears in descriptors and generic signatures.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(PrimitiveType),
    Ref(RefType),
    Generic(GenericRefType),
    TypeVar(String),
    Wildcard(WildcardBound),
    Array(Box<JavaType>),
}

impl JavaType {
    pub fn class(internal_name: impl Into<String>) -> Self {
        JavaType::Ref(RefType::new(internal_name))
    }

    pub fn generic(internal_name: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Generic(GenericRefType::new(RefType::new(internal_name), args))
    }

    pub fn type_var(name: impl Into<String>) -> Self {
        JavaType::TypeVar(name.into())
    }

    pub fn array_of(element: JavaType) -> Self {
        JavaType::Array(Box::new(element))
    }

    /// The class a reference type is backed by, if any.
    pub fn ref_type(&self) -> Option<&RefType> {
        match self {
            JavaType::Ref(r) => Some(r),
            JavaType::Generic(g) => Some(&g.base),
            _ => None,
        }
    }

    /// Remove type arguments and type variables, leaving the runtime type.
    pub fn erased(&self) -> JavaType {
        match self {
            JavaType::Generic(g) => JavaType::Ref(g.base.clone()),
            JavaType::TypeVar(_) | JavaType::Wildcard(_) => JavaType::Ref(RefType::object()),
            JavaType::Array(inner) => JavaType::Array(Box::new(inner.erased())),
            other => other.clone(),
        }
    }

    /// JVM descriptor of the erased type.
    pub fn descriptor(&self) -> String {
        match self.erased() {
            JavaType::Primitive(p) => p.descriptor().to_string(),
            JavaType::Ref(r) => format!("L{};", r.internal_name()),
            JavaType::Array(inner) => format!("[{}", inner.descriptor()),
            _ => "Ljava/lang/Object;".into(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => f.write_str(p.source_name()),
            JavaType::Ref(r) => write!(f, "{}", r),
            JavaType::Generic(g) => {
                write!(f, "{}<", g.base)?;
                for (i, arg) in g.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            JavaType::TypeVar(name) => f.write_str(name),
            JavaType::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            JavaType::Wildcard(WildcardBound::Extends(b)) => write!(f, "? extends {}", b),
            JavaType::Wildcard(WildcardBound::Super(b)) => write!(f, "? super {}", b),
            JavaType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// A declared type parameter, e.g. `T extends Comparable<T>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormalTypeParameter {
    pub name: String,
    pub class_bound: Option<JavaType>,
    pub interface_bounds: Vec<JavaType>,
}

impl fmt::Display for FormalTypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let bounds: Vec<&JavaType> = self
            .class_bound
            .iter()
            .chain(self.interface_bounds.iter())
            .filter(|b| !matches!(b, JavaType::Ref(r) if r.internal_name() == "java/lang/Object"))
            .collect();
        for (i, bound) in bounds.iter().enumerate() {
            f.write_str(if i == 0 { " extends " } else { " & " })?;
            write!(f, "{}", bound)?;
        }
        Ok(())
    }
}

/// Generic supertype information of a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSignature {
    pub formal_type_parameters: Option<Vec<FormalTypeParameter>>,
    pub super_class: Option<JavaType>,
    pub interfaces: Vec<JavaType>,
}

impl ClassSignature {
    pub fn has_formal_type_parameters(&self) -> bool {
        self.formal_type_parameters
            .as_ref()
            .is_some_and(|p| !p.is_empty())
    }

    /// The unbound generic form of the class this signature belongs to: `Fred<X>`
    /// for a class `Fred` declaring `X`, or the plain reference otherwise.
    pub fn this_general_type(&self, class_type: &RefType) -> JavaType {
        match &self.formal_type_parameters {
            Some(params) if !params.is_empty() => JavaType::Generic(GenericRefType::new(
                class_type.clone(),
                params.iter().map(|p| JavaType::TypeVar(p.name.clone())).collect(),
            )),
            _ => JavaType::Ref(class_type.clone()),
        }
    }
}

/// Generic method signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub formal_type_parameters: Vec<FormalTypeParameter>,
    pub parameters: Vec<JavaType>,
    pub return_type: JavaType,
    pub throws: Vec<JavaType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_type_names() {
        let entry = RefType::new("java/util/Map$Entry");
        assert_eq!(entry.source_name(), "java.util.Map$Entry");
        assert_eq!(entry.simple_name(), "Entry");
        assert_eq!(entry.package(), Some("java/util"));
        assert_eq!(entry.outer_class_name(), Some("java/util/Map"));

        let top = RefType::new("Widget");
        assert_eq!(top.simple_name(), "Widget");
        assert_eq!(top.package(), None);
        assert!(!top.is_inner_class());
        // a leading or trailing '$' is part of the name, not a nesting marker
        assert!(!RefType::new("pkg/$Proxy").is_inner_class());
    }

    #[test]
    fn test_display_generic() {
        let ty = JavaType::generic(
            "java/util/Map",
            vec![
                JavaType::class("java/lang/String"),
                JavaType::Wildcard(WildcardBound::Extends(Box::new(JavaType::type_var("T")))),
            ],
        );
        assert_eq!(ty.to_string(), "java.util.Map<java.lang.String, ? extends T>");
        assert_eq!(ty.erased(), JavaType::class("java/util/Map"));
        assert_eq!(ty.descriptor(), "Ljava/util/Map;");
        assert_eq!(
            JavaType::array_of(JavaType::type_var("T")).descriptor(),
            "[Ljava/lang/Object;"
        );
    }

    #[test]
    fn test_this_general_type() {
        let sig = ClassSignature {
            formal_type_parameters: Some(vec![FormalTypeParameter {
                name: "X".into(),
                class_bound: Some(JavaType::class("java/lang/Object")),
                interface_bounds: Vec::new(),
            }]),
            super_class: Some(JavaType::class("java/lang/Object")),
            interfaces: Vec::new(),
        };
        let this = sig.this_general_type(&RefType::new("Fred"));
        assert_eq!(this, JavaType::generic("Fred", vec![JavaType::type_var("X")]));
        match this {
            JavaType::Generic(g) => assert!(g.is_unbound()),
            _ => unreachable!(),
        }
    }
}
