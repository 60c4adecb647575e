use binrw::binrw;

use crate::constant_info::ClassRef;

/// An attribute as laid out in the class file, before its payload is interpreted.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug)]
pub struct RawAttribute {
    pub attribute_name_index: u16,
    #[br(temp)]
    #[bw(try_calc(u32::try_from(info.len())))]
    attribute_length: u32,
    #[br(count = attribute_length)]
    pub info: Vec<u8>,
}

impl RawAttribute {
    pub fn new(attribute_name_index: u16, info: Vec<u8>) -> Self {
        Self {
            attribute_name_index,
            info,
        }
    }
}

/// A decoded attribute: its resolved name, raw payload, and interpretation.
#[derive(Clone, Debug)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub name: String,
    pub info: Vec<u8>,
    pub info_parsed: AttributeInfoVariant,
}

impl AttributeInfo {
    /// Bytes taken by this attribute in the class file, header included.
    pub fn encoded_length(&self) -> usize {
        6 + self.info.len()
    }
}

#[derive(Clone, Debug)]
pub enum AttributeInfoVariant {
    Signature(SignatureAttribute),
    InnerClasses(InnerClassesAttribute),
    BootstrapMethods(BootstrapMethodsAttribute),
    SourceFile(SourceFileAttribute),
    ConstantValue(ConstantValueAttribute),
    Exceptions(ExceptionsAttribute),
    EnclosingMethod(EnclosingMethodAttribute),
    MethodParameters(MethodParametersAttribute),
    Code(CodeAttribute),
    Deprecated,
    Synthetic,
    /// Any attribute this crate does not interpret; the payload stays in `info`.
    Unknown,
}

#[derive(Clone, Debug)]
pub struct SignatureAttribute {
    pub signature_index: u16,
    pub signature: String,
}

#[derive(Clone, Debug)]
pub struct InnerClassesAttribute {
    pub classes: Vec<InnerClassEntry>,
}

/// One `classes[]` row of an `InnerClasses` attribute, as stored.
#[derive(Clone, Debug)]
pub struct InnerClassInfo {
    pub inner_class_info_index: u16,
    pub outer_class_info_index: u16,
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

/// One `classes[]` row with its constant pool references resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class: ClassRef,
    /// Declared enclosing class; `None` for local and anonymous classes.
    pub outer_class: Option<ClassRef>,
    /// Simple source name; `None` for anonymous classes.
    pub inner_name: Option<String>,
    pub access_flags: InnerClassAccessFlags,
}

impl InnerClassEntry {
    /// The class this entry says encloses `inner_class`.
    ///
    /// Local and anonymous classes carry no outer class index, so their
    /// enclosing class is taken from the binary name.
    pub fn enclosing_class_name(&self) -> Option<&str> {
        match &self.outer_class {
            Some(outer) => Some(outer.name.as_str()),
            None => {
                let name = self.inner_class.name.as_str();
                let start = name.rfind('/').map_or(0, |p| p + 1);
                let pos = name[start..].rfind('$')? + start;
                (pos > start).then(|| &name[..pos])
            }
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    pub struct InnerClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

#[derive(Clone, Debug)]
pub struct BootstrapMethodsAttribute {
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

#[derive(Clone, Debug)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}

#[derive(Clone, Debug)]
pub struct SourceFileAttribute {
    pub sourcefile_index: u16,
    pub file_name: String,
}

#[derive(Clone, Debug)]
pub struct ConstantValueAttribute {
    pub constant_value_index: u16,
}

#[derive(Clone, Debug)]
pub struct ExceptionsAttribute {
    pub exceptions: Vec<ClassRef>,
}

#[derive(Clone, Debug)]
pub struct EnclosingMethodAttribute {
    pub class: ClassRef,
    /// Name and descriptor of the enclosing method, absent for initialiser blocks.
    pub method: Option<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct MethodParametersAttribute {
    pub parameters: Vec<MethodParameter>,
}

#[derive(Clone, Debug)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: u16,
}

#[derive(Clone, Debug)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Clone, Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionEntry>,
    pub attributes: Vec<AttributeInfo>,
}
