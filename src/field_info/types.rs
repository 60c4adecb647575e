use binrw::binrw;
use tracing::warn;

use crate::attribute_info::{decode_attributes, AttributeInfo, AttributeInfoVariant, SIGNATURE};
use crate::byte_cursor::ByteCursor;
use crate::constant_info::ConstantPool;
use crate::error::{ReadError, ReadResult};
use crate::signature::{parse_field_type, JavaType};

/// Fixed-size prefix of a `field_info` record.
#[derive(Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct FieldHeader {
    pub access_flags: FieldAccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes_count: u16,
}

#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub access_flags: FieldAccessFlags,
    pub name_index: u16,
    pub name: String,
    pub descriptor_index: u16,
    pub descriptor: String,
    /// Declared type: the generic signature when present and parsable, else the descriptor.
    pub field_type: JavaType,
    pub attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    /// Decode one field record at `offset`, returning it with its byte length.
    pub fn decode(
        cursor: &ByteCursor<'_>,
        offset: usize,
        pool: &ConstantPool,
    ) -> ReadResult<(FieldInfo, usize)> {
        let (header, header_len) = cursor.read_at::<FieldHeader>(offset)?;
        let name = pool.utf8(header.name_index)?.to_string();
        let descriptor = pool.utf8(header.descriptor_index)?.to_string();
        let erased = parse_field_type(&descriptor).ok_or_else(|| {
            ReadError::malformed(
                cursor.base() + offset,
                format!("invalid field descriptor {:?}", descriptor),
            )
        })?;
        let (attributes, attributes_len) =
            decode_attributes(cursor, offset + header_len, header.attributes_count, pool)?;

        let field_type = match signature_of(&attributes) {
            Some(sig) => parse_field_type(sig).unwrap_or_else(|| {
                warn!(field = %name, signature = sig, "unparsable field signature, using descriptor");
                erased.clone()
            }),
            None => erased,
        };
        Ok((
            FieldInfo {
                access_flags: header.access_flags,
                name_index: header.name_index,
                name,
                descriptor_index: header.descriptor_index,
                descriptor,
                field_type,
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

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(FieldAccessFlags::STATIC)
    }

    pub fn is_synthetic(&self) -> bool {
        self.access_flags.contains(FieldAccessFlags::SYNTHETIC)
    }
}

pub(crate) fn signature_of(attributes: &[AttributeInfo]) -> Option<&str> {
    attributes.iter().find_map(|a| match &a.info_parsed {
        AttributeInfoVariant::Signature(s) => Some(s.signature.as_str()),
        _ => None,
    })
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[binrw]
pub struct FieldAccessFlags(u16);

bitflags! {
    impl FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;     // 	Declared public; may be accessed from outside its package.
        const PRIVATE = 0x0002;    // 	Declared private; usable only within the defining class.
        const PROTECTED = 0x0004;  // 	Declared protected; may be accessed within subclasses.
        const STATIC = 0x0008;     // 	Declared static.
        const FINAL = 0x0010;      // 	Declared final; never directly assigned to after object construction.
        const VOLATILE = 0x0040;   // 	Declared volatile; cannot be cached.
        const TRANSIENT = 0x0080;  // 	Declared transient; not written or read by a persistent object manager.
        const SYNTHETIC = 0x1000;  // 	Declared synthetic; not present in the source code.
        const ENUM = 0x4000;       // 	Declared as an element of an enum.
    }
}

impl FieldAccessFlags {
    /// Source modifiers in declaration order.
    pub fn modifiers(self) -> Vec<&'static str> {
        [
            (Self::PUBLIC, "public"),
            (Self::PRIVATE, "private"),
            (Self::PROTECTED, "protected"),
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
            (Self::VOLATILE, "volatile"),
            (Self::TRANSIENT, "transient"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}
