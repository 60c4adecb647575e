use std::collections::BTreeMap;

use crate::signature::{GenericRefType, JavaType, WildcardBound};

/// A substitution from formal type variable names to the types bound to them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenericTypeBinder {
    bindings: BTreeMap<String, JavaType>,
}

impl GenericTypeBinder {
    /// Bind every type variable of `unbound` to itself.
    pub fn build_identity_bindings(unbound: &GenericRefType) -> Self {
        let bindings = unbound
            .args
            .iter()
            .filter_map(|arg| match arg {
                JavaType::TypeVar(name) => Some((name.clone(), arg.clone())),
                _ => None,
            })
            .collect();
        Self { bindings }
    }

    /// Unify the declaration `unbound` (e.g. `Map<K, V>`) with an instance of the
    /// same class (e.g. `Map<String, List<T>>`) position by position.
    ///
    /// Returns `None` when the two name different classes or disagree in arity;
    /// callers fall back to unbound behaviour.
    pub fn extract_bindings(unbound: &GenericRefType, bound: &GenericRefType) -> Option<Self> {
        if unbound.base != bound.base || unbound.args.len() != bound.args.len() {
            return None;
        }
        let bindings = unbound
            .args
            .iter()
            .zip(&bound.args)
            .filter_map(|(formal, actual)| match formal {
                JavaType::TypeVar(name) => Some((name.clone(), actual.clone())),
                _ => None,
            })
            .collect();
        Some(Self { bindings })
    }

    pub fn get_binding(&self, name: &str) -> Option<&JavaType> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JavaType)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace every bound type variable in `ty`. Unbound variables stay as they are.
    pub fn substitute(&self, ty: &JavaType) -> JavaType {
        match ty {
            JavaType::TypeVar(name) => self.bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
            JavaType::Generic(g) => JavaType::Generic(g.bound_instance(Some(self))),
            JavaType::Array(inner) => JavaType::Array(Box::new(self.substitute(inner))),
            JavaType::Wildcard(WildcardBound::Extends(b)) => {
                JavaType::Wildcard(WildcardBound::Extends(Box::new(self.substitute(b))))
            }
            JavaType::Wildcard(WildcardBound::Super(b)) => {
                JavaType::Wildcard(WildcardBound::Super(Box::new(self.substitute(b))))
            }
            JavaType::Primitive(_) | JavaType::Ref(_) | JavaType::Wildcard(WildcardBound::Unbounded) => {
                ty.clone()
            }
        }
    }
}

impl GenericRefType {
    /// A copy of this type with `binder` applied to its arguments.
    ///
    /// Without a binder the copy is unchanged; `self` is never modified.
    pub fn bound_instance(&self, binder: Option<&GenericTypeBinder>) -> GenericRefType {
        match binder {
            Some(binder) => GenericRefType {
                base: self.base.clone(),
                args: self.args.iter().map(|a| binder.substitute(a)).collect(),
            },
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::RefType;

    fn generic(name: &str, args: Vec<JavaType>) -> GenericRefType {
        GenericRefType::new(RefType::new(name), args)
    }

    #[test]
    fn test_extract_bindings_positional() {
        let map = generic("java/util/Map", vec![JavaType::type_var("K"), JavaType::type_var("V")]);
        let bound = generic(
            "java/util/Map",
            vec![
                JavaType::class("java/lang/String"),
                JavaType::generic("java/util/List", vec![JavaType::type_var("T")]),
            ],
        );
        let binder = GenericTypeBinder::extract_bindings(&map, &bound).unwrap();
        assert_eq!(binder.len(), 2);
        assert_eq!(binder.get_binding("K"), Some(&JavaType::class("java/lang/String")));
    }

    #[test]
    fn test_extract_bindings_mismatch() {
        let map = generic("java/util/Map", vec![JavaType::type_var("K"), JavaType::type_var("V")]);
        let short = generic("java/util/Map", vec![JavaType::class("java/lang/String")]);
        let other = generic(
            "java/util/HashMap",
            vec![JavaType::class("a/A"), JavaType::class("a/B")],
        );
        assert!(GenericTypeBinder::extract_bindings(&map, &short).is_none());
        assert!(GenericTypeBinder::extract_bindings(&map, &other).is_none());
    }

    #[test]
    fn test_bound_instance_is_pure() {
        let decl = generic("a/Joe", vec![JavaType::type_var("X"), JavaType::class("java/lang/Double")]);
        let this = generic("a/Fred", vec![JavaType::type_var("X")]);
        let fred_string = generic("a/Fred", vec![JavaType::class("java/lang/String")]);
        let binder = GenericTypeBinder::extract_bindings(&this, &fred_string).unwrap();

        let bound = decl.bound_instance(Some(&binder));
        assert_eq!(
            bound.args,
            vec![JavaType::class("java/lang/String"), JavaType::class("java/lang/Double")]
        );
        assert_eq!(decl.args[0], JavaType::type_var("X"));
        assert_eq!(decl.bound_instance(None), decl);
    }

    #[test]
    fn test_substitute_nested() {
        let this = generic("a/Box", vec![JavaType::type_var("T")]);
        let binder = GenericTypeBinder::build_identity_bindings(&this);
        assert_eq!(binder.substitute(&JavaType::type_var("T")), JavaType::type_var("T"));

        let bound = generic("a/Box", vec![JavaType::class("a/Item")]);
        let binder = GenericTypeBinder::extract_bindings(&this, &bound).unwrap();
        let ty = JavaType::array_of(JavaType::generic(
            "java/util/List",
            vec![JavaType::Wildcard(WildcardBound::Extends(Box::new(JavaType::type_var("T"))))],
        ));
        assert_eq!(binder.substitute(&ty).to_string(), "java.util.List<? extends a.Item>[]");
        assert_eq!(binder.substitute(&JavaType::type_var("U")), JavaType::type_var("U"));
    }
}
