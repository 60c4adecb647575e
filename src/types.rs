use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use binrw::binrw;
use tracing::warn;

use crate::attribute_info::{AttributeInfo, AttributeInfoVariant, InnerClassEntry, SIGNATURE};
use crate::constant_info::{ClassRef, ConstantInfo, ConstantPool, MethodHandleRef};
use crate::dumper::{Dumpable, Dumper};
use crate::error::{ReadError, ReadResult};
use crate::field_info::{signature_of, FieldInfo};
use crate::method_info::{MethodInfo, MethodPrototype, OverloadMethodSet, STATIC_INIT_NAME};
use crate::signature::{parse_class_signature, ClassSignature, JavaType, RefType};

/// The fixed prefix of every class file.
#[derive(Clone, Debug)]
#[binrw]
#[brw(big, magic = b"\xca\xfe\xba\xbe")]
pub struct ClassHeader {
    pub minor_version: u16,
    pub major_version: u16,
    pub const_pool_count: u16,
}

/// Fields between the constant pool and the interface table.
#[derive(Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct ClassIdentity {
    pub access_flags: ClassAccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces_count: u16,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[binrw]
pub struct ClassAccessFlags(u16);

bitflags! {
    impl ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;     //	Declared public; may be accessed from outside its package.
        const FINAL = 0x0010;      //	Declared final; no subclasses allowed.
        const SUPER = 0x0020;      //	Treat superclass methods specially when invoked by the invokespecial instruction.
        const INTERFACE = 0x0200;  //	Is an interface, not a class.
        const ABSTRACT = 0x0400;   //	Declared abstract; must not be instantiated.
        const SYNTHETIC = 0x1000;  //	Declared synthetic; not present in the source code.
        const ANNOTATION = 0x2000; //	Declared as an annotation type.
        const ENUM = 0x4000;       //	Declared as an enum type.
        const MODULE = 0x8000;     //	Declared as a module type.
    }
}

/// `major.minor` class file version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassFileVersion {
    pub major: u16,
    pub minor: u16,
}

impl ClassFileVersion {
    /// The first version whose classes may carry generic signatures.
    pub const JAVA_6: ClassFileVersion = ClassFileVersion {
        major: 50,
        minor: 0,
    };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn before(self, other: ClassFileVersion) -> bool {
        self < other
    }
}

impl fmt::Display for ClassFileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Which declaration form a class is presented with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassDumper {
    Normal,
    Interface,
    Annotation,
}

impl ClassDumper {
    /// Default presentation for the given access flags.
    pub fn for_flags(flags: ClassAccessFlags) -> Self {
        if flags.contains(ClassAccessFlags::ANNOTATION) {
            ClassDumper::Annotation
        } else if flags.contains(ClassAccessFlags::INTERFACE) {
            ClassDumper::Interface
        } else {
            ClassDumper::Normal
        }
    }
}

/// Position and size of one table, count prefix included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableExtent {
    pub offset: usize,
    pub length: usize,
}

impl TableExtent {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Where each table of a decoded class file sat in its buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableLayout {
    /// Magic and version.
    pub header: TableExtent,
    pub constant_pool: TableExtent,
    /// Access flags, this class and super class.
    pub identity: TableExtent,
    pub interfaces: TableExtent,
    pub fields: TableExtent,
    pub methods: TableExtent,
    pub attributes: TableExtent,
    /// Bytes after the attribute table.
    pub trailing: usize,
}

impl TableLayout {
    /// Tables in file order.
    pub fn tables(&self) -> [(&'static str, TableExtent); 7] {
        [
            ("header", self.header),
            ("constant_pool", self.constant_pool),
            ("identity", self.identity),
            ("interfaces", self.interfaces),
            ("fields", self.fields),
            ("methods", self.methods),
            ("attributes", self.attributes),
        ]
    }

    /// End of the last table.
    pub fn end(&self) -> usize {
        self.attributes.end()
    }
}

/// A nested class that this class directly encloses.
#[derive(Clone, Debug)]
pub struct NestedClass {
    pub entry: InnerClassEntry,
    pub class: Arc<ClassFile>,
}

/// A resolved `BootstrapMethods` row.
#[derive(Clone, Debug)]
pub struct BootstrapMethodRef<'a> {
    pub handle: MethodHandleRef<'a>,
    pub arguments: Vec<&'a ConstantInfo>,
}

/// A decoded class file.
///
/// Everything is fixed once the decoder returns. The class signature and the
/// name lookup tables are derived on first use and shared afterwards.
#[derive(Clone, Debug)]
pub struct ClassFile {
    pub(crate) version: ClassFileVersion,
    pub(crate) declared_version: ClassFileVersion,
    pub(crate) const_pool: ConstantPool,
    pub(crate) access_flags: ClassAccessFlags,
    pub(crate) this_class: ClassRef,
    pub(crate) class_type: RefType,
    pub(crate) raw_super_class: Option<ClassRef>,
    pub(crate) raw_interfaces: Vec<ClassRef>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) attributes: Vec<AttributeInfo>,
    pub(crate) inner_classes: Vec<NestedClass>,
    pub(crate) comments: Vec<String>,
    pub(crate) dumper: ClassDumper,
    pub(crate) hidden: bool,
    pub(crate) is_static_inner: bool,
    pub(crate) hide_synthetic_this: bool,
    pub(crate) layout: TableLayout,
    pub(crate) class_signature: OnceLock<ClassSignature>,
    pub(crate) fields_by_name: OnceLock<HashMap<String, usize>>,
    pub(crate) methods_by_name: OnceLock<HashMap<String, Vec<usize>>>,
}

impl ClassFile {
    /// Effective version, possibly raised by the signature heuristic.
    pub fn version(&self) -> ClassFileVersion {
        self.version
    }

    /// Version as written in the file.
    pub fn declared_version(&self) -> ClassFileVersion {
        self.declared_version
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.const_pool
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    pub fn this_class(&self) -> &ClassRef {
        &self.this_class
    }

    pub fn class_type(&self) -> &RefType {
        &self.class_type
    }

    pub fn raw_super_class(&self) -> Option<&ClassRef> {
        self.raw_super_class.as_ref()
    }

    pub fn raw_interfaces(&self) -> &[ClassRef] {
        &self.raw_interfaces
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Directly enclosed classes in `InnerClasses` order.
    pub fn inner_classes(&self) -> &[NestedClass] {
        &self.inner_classes
    }

    /// Informational notes attached during decoding or configuration.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn dumper(&self) -> ClassDumper {
        self.dumper
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Set on a nested class that captures no enclosing instance.
    pub fn is_static_inner(&self) -> bool {
        self.is_static_inner
    }

    /// Whether the leading constructor parameter (the enclosing instance) is
    /// left out of presentation.
    pub fn hide_synthetic_this(&self) -> bool {
        self.hide_synthetic_this
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_inner_class(&self) -> bool {
        self.class_type.is_inner_class()
    }

    /// The generic supertype declaration.
    ///
    /// Parsed from the `Signature` attribute, or synthesized from the raw super
    /// class and interfaces when there is none.
    pub fn class_signature(&self) -> &ClassSignature {
        self.class_signature.get_or_init(|| {
            if let Some(sig) = signature_of(&self.attributes) {
                match parse_class_signature(sig) {
                    Some(parsed) => return parsed,
                    None => warn!(
                        class = %self.class_type,
                        signature = sig,
                        "unparsable class signature, using raw supertypes"
                    ),
                }
            }
            self.raw_class_signature()
        })
    }

    fn raw_class_signature(&self) -> ClassSignature {
        ClassSignature {
            formal_type_parameters: None,
            super_class: self
                .raw_super_class
                .as_ref()
                .map(|c| JavaType::class(c.name.as_str())),
            interfaces: self
                .raw_interfaces
                .iter()
                .map(|c| JavaType::class(c.name.as_str()))
                .collect(),
        }
    }

    /// `Fred<X>` for a class `Fred` declaring `X`, `Fred` otherwise.
    pub fn this_general_type(&self) -> JavaType {
        self.class_signature().this_general_type(&self.class_type)
    }

    pub fn has_formal_type_parameters(&self) -> bool {
        self.class_signature().has_formal_type_parameters()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldInfo> {
        let index = self.fields_by_name.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect()
        });
        index.get(name).map(|&i| &self.fields[i])
    }

    /// All methods called `name`, in declaration order.
    pub fn methods_by_name(&self, name: &str) -> Vec<&MethodInfo> {
        let index = self.methods_by_name.get_or_init(|| {
            let mut map: HashMap<String, Vec<usize>> = HashMap::new();
            for (i, m) in self.methods.iter().enumerate() {
                map.entry(m.name.clone()).or_default().push(i);
            }
            map
        });
        index
            .get(name)
            .map(|ids| ids.iter().map(|&i| &self.methods[i]).collect())
            .unwrap_or_default()
    }

    pub fn constructors(&self) -> Vec<&MethodInfo> {
        self.methods.iter().filter(|m| m.is_constructor()).collect()
    }

    /// The method declared with `prototype`: an exact erased match if there is
    /// one, otherwise the last match modulo type variables.
    pub fn method_by_prototype(&self, prototype: &MethodPrototype) -> Option<&MethodInfo> {
        let mut generic_match = None;
        for method in self.methods_by_name(&prototype.name) {
            if method.prototype.equals_match(prototype) {
                return Some(method);
            }
            if method.prototype.equals_generic(prototype) {
                generic_match = Some(method);
            }
        }
        generic_match
    }

    /// Methods a call with `prototype` could resolve to.
    ///
    /// Candidates share the name and instance-ness and have a compatible arity:
    /// a varargs side accepts any count at least as long as the fixed side.
    pub fn overload_method_set(&self, prototype: &MethodPrototype) -> OverloadMethodSet {
        let num_args = prototype.parameters.len();
        let mut seen = HashSet::new();
        let mut candidates = vec![prototype.clone()];
        seen.insert(prototype.to_string());
        for method in self.methods_by_name(&prototype.name) {
            let other = &method.prototype;
            if other.is_instance != prototype.is_instance {
                continue;
            }
            let arity_ok = match (prototype.is_varargs, other.is_varargs) {
                (true, true) => true,
                (true, false) => other.parameters.len() >= num_args,
                (false, true) => other.parameters.len() <= num_args,
                (false, false) => other.parameters.len() == num_args,
            };
            if arity_ok && seen.insert(other.to_string()) {
                candidates.push(other.clone());
            }
        }
        OverloadMethodSet {
            class_type: self.class_type.clone(),
            candidates,
        }
    }

    /// This class followed by every nested class, depth first.
    pub fn all_class_types(&self) -> Vec<RefType> {
        let mut out = Vec::new();
        self.collect_class_types(&mut out);
        out
    }

    fn collect_class_types(&self, out: &mut Vec<RefType>) {
        out.push(self.class_type.clone());
        for nested in &self.inner_classes {
            nested.class.collect_class_types(out);
        }
    }

    /// Resolve entry `index` of the `BootstrapMethods` attribute.
    pub fn bootstrap_method(&self, index: u16) -> ReadResult<BootstrapMethodRef<'_>> {
        let method = self
            .attributes
            .iter()
            .find_map(|a| match &a.info_parsed {
                AttributeInfoVariant::BootstrapMethods(b) => {
                    b.bootstrap_methods.get(index as usize)
                }
                _ => None,
            })
            .ok_or_else(|| ReadError::broken(index, "BootstrapMethods entry"))?;
        Ok(BootstrapMethodRef {
            handle: self.const_pool.method_handle(method.bootstrap_method_ref)?,
            arguments: method
                .bootstrap_arguments
                .iter()
                .map(|&i| self.const_pool.entry(i))
                .collect::<ReadResult<Vec<_>>>()?,
        })
    }

    /// Whether the class or any member carries a generic signature.
    pub(crate) fn uses_signatures(&self) -> bool {
        self.attribute(SIGNATURE).is_some()
            || self.fields.iter().any(FieldInfo::has_signature)
            || self.methods.iter().any(MethodInfo::has_signature)
    }

    fn dump_declaration<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        let flags = self.access_flags;
        let mut words: Vec<&str> = Vec::new();
        if flags.contains(ClassAccessFlags::PUBLIC) {
            words.push("public");
        }
        if self.is_static_inner {
            words.push("static");
        }
        let is_enum = flags.contains(ClassAccessFlags::ENUM);
        match self.dumper {
            ClassDumper::Normal => {
                if flags.contains(ClassAccessFlags::ABSTRACT) {
                    words.push("abstract");
                }
                if flags.contains(ClassAccessFlags::FINAL) && !is_enum {
                    words.push("final");
                }
                words.push(if is_enum { "enum" } else { "class" });
            }
            ClassDumper::Interface => words.push("interface"),
            ClassDumper::Annotation => words.push("@interface"),
        }
        d.print(&words.join(" ")).print(" ");
        d.print(self.class_type.simple_name());

        let sig = self.class_signature();
        if let Some(params) = sig.formal_type_parameters.as_ref().filter(|p| !p.is_empty()) {
            let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
            d.print("<").print(&rendered.join(", ")).print(">");
        }
        let is_object = |t: &&JavaType| {
            matches!(t, JavaType::Ref(r) if r.internal_name() == "java/lang/Object")
        };
        let superclass = sig.super_class.as_ref().filter(|t| !is_object(t));
        match self.dumper {
            ClassDumper::Normal => {
                if let Some(superclass) = superclass.filter(|_| !is_enum) {
                    d.print(" extends ").dump(superclass);
                }
                if !sig.interfaces.is_empty() {
                    d.print(" implements ").separated(&sig.interfaces, ", ");
                }
            }
            ClassDumper::Interface => {
                if !sig.interfaces.is_empty() {
                    d.print(" extends ").separated(&sig.interfaces, ", ");
                }
            }
            ClassDumper::Annotation => {}
        }
        d.print(" {").newln()
    }

    fn dump_method<'d>(&self, method: &MethodInfo, d: &'d mut Dumper) -> &'d mut Dumper {
        let names = method.access_flags.display_names();
        if !names.is_empty() {
            d.print(&names.join(" ")).print(" ");
        }
        if method.is_constructor() {
            let skip = usize::from(self.hide_synthetic_this);
            let params = method.prototype.parameters.get(skip..).unwrap_or_default();
            d.print(self.class_type.simple_name())
                .print("(")
                .separated(params, ", ")
                .print(")");
        } else {
            d.dump(&method.prototype);
        }
        d.print(";").newln()
    }

    /// Append every named, non-hidden nested class.
    pub fn dump_named_inner_classes<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        for nested in &self.inner_classes {
            if nested.entry.inner_name.is_none() || nested.class.hidden {
                continue;
            }
            d.newln();
            nested.class.dump(d);
        }
        d
    }
}

impl Dumpable for ClassFile {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        if !self.comments.is_empty() {
            d.print("/*").newln();
            for comment in &self.comments {
                d.print(" * ").print(comment).newln();
            }
            d.print(" */").newln();
        }
        self.dump_declaration(d);
        d.indent();
        for field in &self.fields {
            let modifiers = field.access_flags.modifiers();
            if !modifiers.is_empty() {
                d.print(&modifiers.join(" ")).print(" ");
            }
            d.dump(&field.field_type).print(" ").print(&field.name).print(";").newln();
        }
        for method in self.methods.iter().filter(|m| m.name != STATIC_INIT_NAME) {
            self.dump_method(method, d);
        }
        self.dump_named_inner_classes(d);
        d.outdent().print("}").newln()
    }
}

impl fmt::Display for ClassFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_type)
    }
}
