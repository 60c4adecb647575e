mod common;

use classfile_recover::expr::LValue;
use classfile_recover::signature::{GenericRefType, JavaType, RefType};
use classfile_recover::*;
use common::*;
use proptest::prelude::*;

fn class_with_members(fields: usize, methods: usize) -> Vec<u8> {
    let mut builder = ClassBuilder::new("p/Shape");
    for i in 0..fields {
        builder.field(ACC_PUBLIC, &format!("f{i}"), "I", None);
    }
    for i in 0..methods {
        builder.method(ACC_PUBLIC, &format!("m{i}"), "()V", None);
    }
    builder.build()
}

fn type_args() -> impl Strategy<Value = Vec<JavaType>> {
    prop::collection::vec(
        prop_oneof![
            Just(JavaType::class("java/lang/String")),
            Just(JavaType::class("java/lang/Integer")),
            Just(JavaType::type_var("Q")),
        ],
        0..5,
    )
}

proptest! {
    #[test]
    fn prop_versions_count_up_per_location(slots in prop::collection::vec(0u16..4, 0..64)) {
        let mut factory = SsaIdentifierFactory::new();
        let mut expected = [0u32; 4];
        for slot in slots {
            let ident = factory.ident(&LValue::local(slot));
            prop_assert_eq!(ident.version(), expected[slot as usize]);
            expected[slot as usize] += 1;
        }
        for slot in 0..4u16 {
            prop_assert_eq!(factory.allocated(&LValue::local(slot)), expected[slot as usize]);
        }
    }

    #[test]
    fn prop_layout_covers_whole_buffer(fields in 0usize..12, methods in 0usize..12) {
        let bytes = class_with_members(fields, methods);
        let class = decode_class(&bytes).unwrap();
        prop_assert_eq!(class.fields().len(), fields);
        prop_assert_eq!(class.methods().len(), methods);

        let tables = class.layout().tables();
        prop_assert_eq!(tables[0].1.offset, 0);
        for pair in tables.windows(2) {
            prop_assert_eq!(pair[0].1.end(), pair[1].1.offset);
        }
        prop_assert_eq!(class.layout().end(), bytes.len());
        prop_assert_eq!(class.layout().trailing, 0);
    }

    #[test]
    fn prop_truncated_class_is_rejected(fields in 0usize..4, cut in any::<prop::sample::Index>()) {
        let bytes = class_with_members(fields, 1);
        let cut = cut.index(bytes.len());
        let result = decode_class(&bytes[..cut]);
        let is_malformed = matches!(result, Err(ReadError::MalformedContainer { .. }));
        prop_assert!(is_malformed);
    }

    #[test]
    fn prop_bindings_require_matching_arity(formals in 0usize..5, actual in type_args()) {
        let unbound = GenericRefType::new(
            RefType::new("p/Box"),
            (0..formals).map(|i| JavaType::type_var(format!("T{i}"))).collect(),
        );
        let bound = GenericRefType::new(RefType::new("p/Box"), actual.clone());
        match GenericTypeBinder::extract_bindings(&unbound, &bound) {
            Some(binder) => {
                prop_assert_eq!(formals, actual.len());
                prop_assert_eq!(binder.len(), formals);
                for (i, arg) in actual.iter().enumerate() {
                    prop_assert_eq!(binder.get_binding(&format!("T{i}")), Some(arg));
                }
            }
            None => prop_assert_ne!(formals, actual.len()),
        }
    }
}
