mod common;

use classfile_recover::attribute_info::AttributeInfoVariant;
use classfile_recover::constant_info::{ConstantInfo, ReferenceKind};
use classfile_recover::method_info::MethodPrototype;
use classfile_recover::signature::JavaType;
use classfile_recover::*;
use common::*;

fn widget_builder() -> ClassBuilder {
    let mut builder = ClassBuilder::new("a/Widget");
    builder.long(42);
    builder
        .interface("java/lang/Runnable")
        .interface("java/io/Serializable")
        .field(0x0002, "count", "I", None)
        .field(
            0x0002,
            "items",
            "Ljava/util/List;",
            Some("Ljava/util/List<Ljava/lang/String;>;"),
        )
        .method(ACC_PUBLIC, "<init>", "()V", None)
        .method(ACC_PUBLIC, "run", "()V", None)
        .method(ACC_STATIC, "<clinit>", "()V", None);
    let source_file = builder.utf8("Widget.java");
    builder.attribute("SourceFile", source_file.to_be_bytes().to_vec());
    builder
}

#[test]
fn test_decode_identity_and_members() {
    let class = decode_class(&widget_builder().build()).unwrap();

    assert_eq!(class.class_type().internal_name(), "a/Widget");
    assert_eq!(class.version(), ClassFileVersion::new(52, 0));
    assert_eq!(
        class.raw_super_class().map(|c| c.name.as_str()),
        Some("java/lang/Object")
    );
    let interfaces: Vec<&str> = class.raw_interfaces().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(interfaces, vec!["java/lang/Runnable", "java/io/Serializable"]);
    assert_eq!(class.fields().len(), 2);
    assert_eq!(class.methods().len(), 3);

    let items = class.field_by_name("items").unwrap();
    assert_eq!(
        items.field_type,
        JavaType::generic("java/util/List", vec![JavaType::class("java/lang/String")])
    );
    assert!(class.field_by_name("missing").is_none());

    match &class.attribute("SourceFile").unwrap().info_parsed {
        AttributeInfoVariant::SourceFile(sf) => assert_eq!(sf.file_name, "Widget.java"),
        other => panic!("unexpected attribute {:?}", other),
    }
    assert_eq!(class.to_string(), "a.Widget");
}

#[test]
fn test_layout_reaches_end_of_buffer() {
    let bytes = widget_builder().build();
    let class = decode_class(&bytes).unwrap();
    let layout = class.layout();

    let tables = layout.tables();
    assert_eq!(tables[0].1.offset, 0);
    for pair in tables.windows(2) {
        assert_eq!(pair[0].1.end(), pair[1].1.offset, "gap before {}", pair[1].0);
    }
    let summed: usize = tables.iter().map(|(_, t)| t.length).sum();
    assert_eq!(summed, bytes.len());
    assert_eq!(layout.end(), bytes.len());
    assert_eq!(layout.trailing, 0);
    assert_eq!(
        layout.constant_pool.length,
        2 + class.constant_pool().raw_byte_length()
    );
}

#[test]
fn test_trailing_bytes_are_recorded() {
    let mut builder = widget_builder();
    builder.trailing(&[0, 0, 0]);
    let bytes = builder.build();
    let class = decode_class(&bytes).unwrap();
    assert_eq!(class.layout().trailing, 3);
    assert_eq!(class.layout().end(), bytes.len() - 3);
}

#[test]
fn test_bad_magic() {
    let mut bytes = widget_builder().build();
    bytes[0] = 0xca;
    bytes[3] = 0x00;
    match decode_class(&bytes) {
        Err(ReadError::MalformedContainer { offset, .. }) => assert_eq!(offset, 0),
        other => panic!("expected bad magic, got {:?}", other.map(|c| c.to_string())),
    }
}

#[test]
fn test_truncated_buffers_are_malformed() {
    let bytes = widget_builder().build();
    for cut in [2, 9, 40, bytes.len() - 1] {
        let result = decode_class(&bytes[..cut]);
        assert!(
            matches!(result, Err(ReadError::MalformedContainer { .. })),
            "cut at {} gave {:?}",
            cut,
            result.map(|c| c.to_string())
        );
    }
}

#[test]
fn test_unknown_constant_tag() {
    let mut bytes = widget_builder().build();
    // first pool entry starts right after the count
    bytes[10] = 2;
    match decode_class(&bytes) {
        Err(ReadError::MalformedContainer { offset, reason }) => {
            assert_eq!(offset, 10);
            assert_eq!(reason, "unknown constant pool tag 2");
        }
        other => panic!("unexpected {:?}", other.map(|c| c.to_string())),
    }
}

#[test]
fn test_broken_references() {
    let mut builder = widget_builder();
    let not_a_class = builder.utf8("not a class");
    builder.super_class_index(not_a_class);
    assert_eq!(
        decode_class(&builder.build()).unwrap_err(),
        ReadError::BrokenReference {
            index: not_a_class,
            expected: "Class",
        }
    );

    builder.super_class_index(500);
    assert_eq!(
        decode_class(&builder.build()).unwrap_err(),
        ReadError::BrokenReference {
            index: 500,
            expected: "constant pool entry",
        }
    );
}

#[test]
fn test_version_heuristic() {
    let mut builder = widget_builder();
    builder.version(49, 0);
    let class = decode_class(&builder.build()).unwrap();
    assert_eq!(class.version(), ClassFileVersion::JAVA_6);
    assert_eq!(class.declared_version(), ClassFileVersion::new(49, 0));
    assert_eq!(
        class.comments(),
        ["This class specifies class file version 49.0 but uses Java 6 signatures.  Assuming Java 6."]
    );

    let mut plain = ClassBuilder::new("a/Plain");
    plain.version(49, 0).method(ACC_PUBLIC, "run", "()V", None);
    let class = decode_class(&plain.build()).unwrap();
    assert_eq!(class.version(), ClassFileVersion::new(49, 0));
    assert!(class.comments().is_empty());
}

struct PresentAsInterface;

impl ConfigCallback for PresentAsInterface {
    fn configure_with(&self, setup: &mut ClassSetup<'_>) {
        assert!(setup.constant_pool().len() > 1);
        assert_eq!(setup.dumper(), ClassDumper::Normal);
        setup.set_dumper(ClassDumper::Interface);
        setup.mark_hidden();
        setup.add_comment(format!("configured {}", setup.class_type()));
    }
}

#[test]
fn test_config_callback_attaches_settings() {
    let mut builder = widget_builder();
    builder.version(49, 0);
    let bytes = builder.build();
    let callback = PresentAsInterface;
    let decoder = ClassDecoder::new(DecodeOptions::default()).with_config_callback(&callback);
    let class = decoder.decode(&bytes).unwrap();

    assert_eq!(class.dumper(), ClassDumper::Interface);
    assert!(class.is_hidden());
    assert_eq!(class.comments().len(), 2);
    assert_eq!(class.comments()[0], "configured a.Widget");
    assert_eq!(class.fields().len(), 2);
}

#[test]
fn test_synthesized_class_signature() {
    let class = decode_class(&widget_builder().build()).unwrap();
    let sig = class.class_signature();
    assert_eq!(sig.interfaces.len(), class.raw_interfaces().len());
    assert_eq!(sig.super_class, Some(JavaType::class("java/lang/Object")));
    assert!(!class.has_formal_type_parameters());
    assert_eq!(class.this_general_type(), JavaType::class("a/Widget"));

    let mut root = ClassBuilder::new("java/lang/Object");
    root.super_class(None);
    let class = decode_class(&root.build()).unwrap();
    assert!(class.raw_super_class().is_none());
    assert!(class.class_signature().super_class.is_none());
    assert!(class.class_signature().interfaces.is_empty());
}

#[test]
fn test_generic_class_signature() {
    let mut builder = ClassBuilder::new("a/Box");
    builder
        .super_class(Some("java/util/AbstractList"))
        .interface("java/lang/Comparable")
        .class_signature(
            "<T:Ljava/lang/Object;>Ljava/util/AbstractList<TT;>;Ljava/lang/Comparable<La/Box<TT;>;>;",
        );
    let class = decode_class(&builder.build()).unwrap();

    assert!(class.has_formal_type_parameters());
    assert_eq!(
        class.this_general_type(),
        JavaType::generic("a/Box", vec![JavaType::type_var("T")])
    );
    let sig = class.class_signature();
    assert_eq!(
        sig.super_class,
        Some(JavaType::generic("java/util/AbstractList", vec![JavaType::type_var("T")]))
    );
    assert_eq!(sig.interfaces[0].to_string(), "java.lang.Comparable<a.Box<T>>");
    // derived once and shared
    assert!(std::ptr::eq(sig, class.class_signature()));
}

#[test]
fn test_dump_class() {
    let mut builder = ClassBuilder::new("a/Widget");
    builder
        .interface("java/lang/Runnable")
        .field(0x0002, "count", "I", None)
        .method(ACC_PUBLIC, "<init>", "()V", None)
        .method(ACC_PUBLIC, "run", "()V", None)
        .method(ACC_STATIC, "<clinit>", "()V", None);
    let class = decode_class(&builder.build()).unwrap();
    assert_eq!(
        class.dumped(),
        "public class Widget implements java.lang.Runnable {\n    private int count;\n    public Widget();\n    public void run();\n}\n"
    );
}

#[test]
fn test_method_lookup_and_overloads() {
    let mut builder = ClassBuilder::new("a/Bag");
    builder
        .method(ACC_PUBLIC, "add", "(I)V", None)
        .method(ACC_PUBLIC, "add", "(Ljava/lang/Object;)V", Some("(TT;)V"))
        .method(ACC_PUBLIC | 0x0080, "add", "([I)V", None)
        .method(ACC_PUBLIC | ACC_STATIC, "add", "(J)V", None);
    let class = decode_class(&builder.build()).unwrap();

    assert_eq!(class.methods_by_name("add").len(), 4);
    assert!(class.methods_by_name("remove").is_empty());
    assert!(class.constructors().is_empty());

    let exact = MethodPrototype::from_descriptor("add", "(I)V", true, false).unwrap();
    let found = class.method_by_prototype(&exact).unwrap();
    assert_eq!(found.descriptor, "(I)V");

    let by_erasure = MethodPrototype::from_descriptor("add", "(Ljava/lang/String;)V", true, false).unwrap();
    let found = class.method_by_prototype(&by_erasure).unwrap();
    assert_eq!(found.descriptor, "(Ljava/lang/Object;)V");
    assert_eq!(found.prototype.to_string(), "void add(T)");

    let set = class.overload_method_set(&exact);
    let rendered: Vec<String> = set.candidates.iter().map(|p| p.to_string()).collect();
    assert_eq!(rendered, vec!["void add(int)", "void add(T)", "void add(int...)"]);
    assert_eq!(set.requested(), &exact);
    assert!(set.is_overloaded());
}

#[test]
fn test_bootstrap_methods_resolve() {
    let mut builder = ClassBuilder::new("a/Lambdas");
    let factory = builder.method_ref(
        "java/lang/invoke/LambdaMetafactory",
        "metafactory",
        "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;",
    );
    let handle = builder.method_handle(6, factory);
    let method_type = builder.method_type("()V");
    let call_site = builder.invoke_dynamic(0, "run", "()Ljava/lang/Runnable;");

    let mut payload = Vec::new();
    for value in [1u16, handle, 1, method_type] {
        payload.extend_from_slice(&value.to_be_bytes());
    }
    builder.attribute("BootstrapMethods", payload);
    let class = decode_class(&builder.build()).unwrap();

    let bootstrap = class.bootstrap_method(0).unwrap();
    assert_eq!(bootstrap.handle.kind, ReferenceKind::InvokeStatic);
    assert_eq!(bootstrap.handle.member.name, "metafactory");
    assert_eq!(
        bootstrap.handle.member.class_name,
        "java/lang/invoke/LambdaMetafactory"
    );
    assert_eq!(bootstrap.arguments.len(), 1);
    assert!(matches!(bootstrap.arguments[0], ConstantInfo::MethodType(_)));
    assert_eq!(class.constant_pool().method_type(method_type).unwrap(), "()V");

    let site = class.constant_pool().invoke_dynamic(call_site).unwrap();
    assert_eq!(site.bootstrap_method_index, 0);
    assert_eq!(site.name, "run");

    assert!(matches!(
        class.bootstrap_method(1),
        Err(ReadError::BrokenReference { index: 1, .. })
    ));
}
