use std::fmt;

use binrw::binrw;
use tracing::warn;

use crate::attribute_info::{
    decode_attributes, AttributeInfo, AttributeInfoVariant, CodeAttribute, SIGNATURE,
};
use crate::byte_cursor::ByteCursor;
use crate::constant_info::ConstantPool;
use crate::error::{ReadError, ReadResult};
use crate::field_info::signature_of;
use crate::signature::{
    parse_method_descriptor, parse_method_signature, FormalTypeParameter, JavaType, RefType,
};

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INIT_NAME: &str = "<clinit>";

/// Fixed-size prefix of a `method_info` record.
#[derive(Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct MethodHeader {
    pub access_flags: MethodAccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes_count: u16,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[binrw]
pub struct MethodAccessFlags(u16);

bitflags! {
    impl MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccessFlags {
    /// Presentation names in flag order. Flags with no source keyword render as comments.
    pub fn display_names(self) -> Vec<&'static str> {
        [
            (Self::PUBLIC, "public"),
            (Self::PRIVATE, "private"),
            (Self::PROTECTED, "protected"),
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
            (Self::SYNCHRONIZED, "synchronized"),
            (Self::BRIDGE, "/* bridge */"),
            (Self::VARARGS, "/* varargs */"),
            (Self::NATIVE, "/* native */"),
            (Self::ABSTRACT, "abstract"),
            (Self::STRICT, "strictfp"),
            (Self::SYNTHETIC, "/* synthetic */"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

/// The callable shape of a method: what overload resolution and rendering need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodPrototype {
    pub name: String,
    pub formal_type_parameters: Vec<FormalTypeParameter>,
    pub parameters: Vec<JavaType>,
    pub return_type: JavaType,
    pub throws: Vec<JavaType>,
    pub is_instance: bool,
    pub is_varargs: bool,
}

impl MethodPrototype {
    /// Build a prototype from an erased method descriptor.
    pub fn from_descriptor(
        name: impl Into<String>,
        descriptor: &str,
        is_instance: bool,
        is_varargs: bool,
    ) -> Option<Self> {
        let (parameters, return_type) = parse_method_descriptor(descriptor)?;
        Some(Self {
            name: name.into(),
            formal_type_parameters: Vec::new(),
            parameters,
            return_type,
            throws: Vec::new(),
            is_instance,
            is_varargs,
        })
    }

    /// Replace types with those of a generic method signature.
    ///
    /// Signatures omit compiler-added leading parameters (outer instance, enum
    /// name and ordinal), so a shorter signature keeps the descriptor's leading
    /// parameters. A longer one is rejected.
    pub fn with_signature(mut self, signature: &str) -> Result<Self, Self> {
        let Some(sig) = parse_method_signature(signature) else {
            return Err(self);
        };
        if sig.parameters.len() > self.parameters.len() {
            return Err(self);
        }
        let leading = self.parameters.len() - sig.parameters.len();
        self.parameters.truncate(leading);
        self.parameters.extend(sig.parameters);
        self.return_type = sig.return_type;
        self.formal_type_parameters = sig.formal_type_parameters;
        self.throws = sig.throws;
        Ok(self)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    /// Erased JVM descriptor.
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for p in &self.parameters {
            out.push_str(&p.descriptor());
        }
        out.push(')');
        out.push_str(&self.return_type.descriptor());
        out
    }

    /// Same name and the same erased parameter and return types.
    pub fn equals_match(&self, other: &MethodPrototype) -> bool {
        self.name == other.name && self.descriptor() == other.descriptor()
    }

    /// Same name and arity, with parameters equal after erasure or where either
    /// side is a type variable.
    pub fn equals_generic(&self, other: &MethodPrototype) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| generic_compatible(a, b))
    }
}

fn generic_compatible(a: &JavaType, b: &JavaType) -> bool {
    match (a, b) {
        (JavaType::TypeVar(_), JavaType::Primitive(_))
        | (JavaType::Primitive(_), JavaType::TypeVar(_)) => false,
        (JavaType::TypeVar(_), _) | (_, JavaType::TypeVar(_)) => true,
        (JavaType::Array(x), JavaType::Array(y)) => generic_compatible(x, y),
        _ => a.erased() == b.erased(),
    }
}

impl fmt::Display for MethodPrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.formal_type_parameters.is_empty() {
            f.write_str("<")?;
            for (i, p) in self.formal_type_parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", p)?;
            }
            f.write_str("> ")?;
        }
        if !self.is_constructor() {
            write!(f, "{} ", self.return_type)?;
        }
        write!(f, "{}(", self.name)?;
        let last = self.parameters.len().saturating_sub(1);
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match p {
                JavaType::Array(inner) if self.is_varargs && i == last => {
                    write!(f, "{}...", inner)?
                }
                _ => write!(f, "{}", p)?,
            }
        }
        f.write_str(")")
    }
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub access_flags: MethodAccessFlags,
    pub name_index: u16,
    pub name: String,
    pub descriptor_index: u16,
    pub descriptor: String,
    pub prototype: MethodPrototype,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
    /// Decode one method record at `offset`, returning it with its byte length.
    pub fn decode(
        cursor: &ByteCursor<'_>,
        offset: usize,
        pool: &ConstantPool,
    ) -> ReadResult<(MethodInfo, usize)> {
        let (header, header_len) = cursor.read_at::<MethodHeader>(offset)?;
        let name = pool.utf8(header.name_index)?.to_string();
        let descriptor = pool.utf8(header.descriptor_index)?.to_string();
        let (attributes, attributes_len) =
            decode_attributes(cursor, offset + header_len, header.attributes_count, pool)?;

        let flags = header.access_flags;
        let erased = MethodPrototype::from_descriptor(
            name.as_str(),
            &descriptor,
            !flags.contains(MethodAccessFlags::STATIC),
            flags.contains(MethodAccessFlags::VARARGS),
        )
        .ok_or_else(|| {
            ReadError::malformed(
                cursor.base() + offset,
                format!("invalid method descriptor {:?}", descriptor),
            )
        })?;
        let prototype = match signature_of(&attributes) {
            Some(sig) => erased.with_signature(sig).unwrap_or_else(|erased| {
                warn!(method = %name, signature = sig, "unusable method signature, using descriptor");
                erased
            }),
            None => erased,
        };
        Ok((
            MethodInfo {
                access_flags: flags,
                name_index: header.name_index,
                name,
                descriptor_index: header.descriptor_index,
                descriptor,
                prototype,
                attributes,
            },
            header_len + attributes_len,
        ))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_signature(&self) -> bool {
        self.attribute(SIGNATURE).is_some()
    }

    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|a| match &a.info_parsed {
            AttributeInfoVariant::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_synthetic(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::SYNTHETIC)
    }
}

/// Methods of one class that a call site with a given prototype could bind to.
///
/// The requested prototype is always the first candidate; exact duplicates by
/// rendered form are dropped.
#[derive(Clone, Debug)]
pub struct OverloadMethodSet {
    pub class_type: RefType,
    pub candidates: Vec<MethodPrototype>,
}

impl OverloadMethodSet {
    pub fn requested(&self) -> &MethodPrototype {
        &self.candidates[0]
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether more than the requested prototype is applicable.
    pub fn is_overloaded(&self) -> bool {
        self.candidates.len() > 1
    }
}
