//! Descriptor and generic signature parsing (JVMS 4.3, 4.7.9.1).
//!
//! Every `parse_*_at` function takes the full string and a start position and
//! returns the parsed value together with the position just after it.

use super::types::*;

/// Parse a field descriptor or a field type signature starting at `pos`.
pub fn parse_type_at(desc: &str, pos: usize) -> Option<(JavaType, usize)> {
    let bytes = desc.as_bytes();
    let c = *bytes.get(pos)?;
    if let Some(p) = PrimitiveType::from_descriptor(c) {
        return Some((JavaType::Primitive(p), pos + 1));
    }
    match c {
        b'L' => parse_class_type_at(desc, pos),
        b'T' => {
            let semi = desc[pos + 1..].find(';')? + pos + 1;
            let name = &desc[pos + 1..semi];
            if name.is_empty() {
                return None;
            }
            Some((JavaType::TypeVar(name.to_string()), semi + 1))
        }
        b'[' => {
            let (inner, next) = parse_type_at(desc, pos + 1)?;
            Some((JavaType::Array(Box::new(inner)), next))
        }
        _ => None,
    }
}

/// `L pkg/Outer<args> . Inner<args> ;`
///
/// Inner class suffixes fold into a single `Outer$Inner` base carrying the type
/// arguments of the innermost segment.
fn parse_class_type_at(desc: &str, pos: usize) -> Option<(JavaType, usize)> {
    let bytes = desc.as_bytes();
    let mut name = String::new();
    let mut args = Vec::new();
    let mut i = pos + 1;
    loop {
        match *bytes.get(i)? {
            b';' => break,
            b'<' => {
                let (parsed, next) = parse_type_args_at(desc, i)?;
                args = parsed;
                i = next;
            }
            b'.' => {
                name.push('$');
                args.clear();
                i += 1;
            }
            _ => {
                let ch = desc[i..].chars().next()?;
                name.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    if name.is_empty() {
        return None;
    }
    let base = RefType::new(name);
    let ty = if args.is_empty() {
        JavaType::Ref(base)
    } else {
        JavaType::Generic(GenericRefType::new(base, args))
    };
    Some((ty, i + 1))
}

fn parse_type_args_at(desc: &str, pos: usize) -> Option<(Vec<JavaType>, usize)> {
    let bytes = desc.as_bytes();
    let mut args = Vec::new();
    let mut i = pos + 1;
    while *bytes.get(i)? != b'>' {
        let (arg, next) = match bytes[i] {
            b'*' => (JavaType::Wildcard(WildcardBound::Unbounded), i + 1),
            b'+' => {
                let (bound, next) = parse_type_at(desc, i + 1)?;
                (JavaType::Wildcard(WildcardBound::Extends(Box::new(bound))), next)
            }
            b'-' => {
                let (bound, next) = parse_type_at(desc, i + 1)?;
                (JavaType::Wildcard(WildcardBound::Super(Box::new(bound))), next)
            }
            _ => parse_type_at(desc, i)?,
        };
        args.push(arg);
        i = next;
    }
    if args.is_empty() {
        return None;
    }
    Some((args, i + 1))
}

/// `< Ident : [ClassBound] {: InterfaceBound} ... >`
fn parse_formal_type_parameters_at(
    desc: &str,
    pos: usize,
) -> Option<(Vec<FormalTypeParameter>, usize)> {
    let bytes = desc.as_bytes();
    if bytes.get(pos) != Some(&b'<') {
        return Some((Vec::new(), pos));
    }
    let mut params = Vec::new();
    let mut i = pos + 1;
    while *bytes.get(i)? != b'>' {
        let colon = desc[i..].find(':')? + i;
        let name = desc[i..colon].to_string();
        if name.is_empty() {
            return None;
        }
        i = colon + 1;
        let class_bound = match bytes.get(i)? {
            b':' => None,
            _ => {
                let (bound, next) = parse_type_at(desc, i)?;
                i = next;
                Some(bound)
            }
        };
        let mut interface_bounds = Vec::new();
        while bytes.get(i) == Some(&b':') {
            let (bound, next) = parse_type_at(desc, i + 1)?;
            interface_bounds.push(bound);
            i = next;
        }
        params.push(FormalTypeParameter {
            name,
            class_bound,
            interface_bounds,
        });
    }
    Some((params, i + 1))
}

/// Parse a complete field descriptor or field type signature.
pub fn parse_field_type(desc: &str) -> Option<JavaType> {
    match parse_type_at(desc, 0)? {
        (ty, end) if end == desc.len() => Some(ty),
        _ => None,
    }
}

/// Parse a method descriptor, e.g. `(ILjava/lang/String;)V`.
pub fn parse_method_descriptor(desc: &str) -> Option<(Vec<JavaType>, JavaType)> {
    let sig = parse_method_signature(desc)?;
    if !sig.formal_type_parameters.is_empty() || !sig.throws.is_empty() {
        return None;
    }
    Some((sig.parameters, sig.return_type))
}

/// Parse a method signature: `[<T:...>](params)ret{^throws}`.
pub fn parse_method_signature(desc: &str) -> Option<MethodSignature> {
    let bytes = desc.as_bytes();
    let (formal_type_parameters, mut i) = parse_formal_type_parameters_at(desc, 0)?;
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    i += 1;
    let mut parameters = Vec::new();
    while *bytes.get(i)? != b')' {
        let (ty, next) = parse_type_at(desc, i)?;
        if ty == JavaType::Primitive(PrimitiveType::Void) {
            return None;
        }
        parameters.push(ty);
        i = next;
    }
    let (return_type, mut i) = parse_type_at(desc, i + 1)?;
    let mut throws = Vec::new();
    while bytes.get(i) == Some(&b'^') {
        let (ty, next) = parse_type_at(desc, i + 1)?;
        throws.push(ty);
        i = next;
    }
    if i != desc.len() {
        return None;
    }
    Some(MethodSignature {
        formal_type_parameters,
        parameters,
        return_type,
        throws,
    })
}

/// Parse a class signature: `[<T:...>]Super{Interface}`.
pub fn parse_class_signature(desc: &str) -> Option<ClassSignature> {
    let (params, mut i) = parse_formal_type_parameters_at(desc, 0)?;
    let (super_class, next) = parse_type_at(desc, i)?;
    i = next;
    let mut interfaces = Vec::new();
    while i < desc.len() {
        let (iface, next) = parse_type_at(desc, i)?;
        interfaces.push(iface);
        i = next;
    }
    Some(ClassSignature {
        formal_type_parameters: if params.is_empty() { None } else { Some(params) },
        super_class: Some(super_class),
        interfaces,
    })
}

/// Interpret a `CONSTANT_Class` name, which is either an internal class name or,
/// for array classes, a field descriptor.
pub fn class_name_to_type(name: &str) -> Option<JavaType> {
    if name.starts_with('[') {
        parse_field_type(name)
    } else if name.is_empty() {
        None
    } else {
        Some(JavaType::Ref(RefType::new(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> JavaType {
        JavaType::class("java/lang/Object")
    }

    #[test]
    fn test_parse_primitives_and_arrays() {
        assert_eq!(
            parse_field_type("I"),
            Some(JavaType::Primitive(PrimitiveType::Int))
        );
        assert_eq!(
            parse_field_type("[[Ljava/lang/String;"),
            Some(JavaType::array_of(JavaType::array_of(JavaType::class(
                "java/lang/String"
            ))))
        );
        assert_eq!(parse_field_type("Ljava/lang/String"), None);
        assert_eq!(parse_field_type("II"), None);
    }

    #[test]
    fn test_parse_method_descriptor() {
        let (params, ret) = parse_method_descriptor("(JLjava/lang/String;[I)V").unwrap();
        assert_eq!(
            params,
            vec![
                JavaType::Primitive(PrimitiveType::Long),
                JavaType::class("java/lang/String"),
                JavaType::array_of(JavaType::Primitive(PrimitiveType::Int)),
            ]
        );
        assert_eq!(ret, JavaType::Primitive(PrimitiveType::Void));
        assert!(parse_method_descriptor("(V)V").is_none());
        assert!(parse_method_descriptor("I").is_none());
    }

    #[test]
    fn test_parse_class_signature_with_bounds() {
        let sig = parse_class_signature(
            "<K::Ljava/lang/Comparable<TK;>;V:Ljava/lang/Object;>Ljava/util/AbstractMap<TK;TV;>;Ljava/io/Serializable;",
        )
        .unwrap();
        let params = sig.formal_type_parameters.as_ref().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "K");
        assert_eq!(params[0].class_bound, None);
        assert_eq!(
            params[0].interface_bounds,
            vec![JavaType::generic(
                "java/lang/Comparable",
                vec![JavaType::type_var("K")]
            )]
        );
        assert_eq!(params[1].class_bound, Some(object()));
        assert_eq!(
            sig.super_class,
            Some(JavaType::generic(
                "java/util/AbstractMap",
                vec![JavaType::type_var("K"), JavaType::type_var("V")]
            ))
        );
        assert_eq!(sig.interfaces, vec![JavaType::class("java/io/Serializable")]);
    }

    #[test]
    fn test_parse_wildcards_and_inner_suffix() {
        let ty = parse_field_type("Ljava/util/List<+Ljava/lang/Number;>;").unwrap();
        assert_eq!(
            ty,
            JavaType::generic(
                "java/util/List",
                vec![JavaType::Wildcard(WildcardBound::Extends(Box::new(
                    JavaType::class("java/lang/Number")
                )))]
            )
        );
        let ty = parse_field_type("Lpkg/Outer<TT;>.Inner<*>;").unwrap();
        assert_eq!(
            ty,
            JavaType::generic(
                "pkg/Outer$Inner",
                vec![JavaType::Wildcard(WildcardBound::Unbounded)]
            )
        );
        let ty = parse_field_type("Lpkg/Outer<TT;>.Plain;").unwrap();
        assert_eq!(ty, JavaType::class("pkg/Outer$Plain"));
    }

    #[test]
    fn test_parse_method_signature() {
        let sig = parse_method_signature(
            "<T:Ljava/lang/Object;>(Ljava/util/List<TT;>;)TT;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(sig.formal_type_parameters.len(), 1);
        assert_eq!(
            sig.parameters,
            vec![JavaType::generic("java/util/List", vec![JavaType::type_var("T")])]
        );
        assert_eq!(sig.return_type, JavaType::type_var("T"));
        assert_eq!(sig.throws, vec![JavaType::class("java/io/IOException")]);
    }

    #[test]
    fn test_class_name_to_type() {
        assert_eq!(class_name_to_type("a/B"), Some(JavaType::class("a/B")));
        assert_eq!(
            class_name_to_type("[I"),
            Some(JavaType::array_of(JavaType::Primitive(PrimitiveType::Int)))
        );
        assert_eq!(class_name_to_type(""), None);
    }
}
