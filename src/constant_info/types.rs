use binrw::binrw;

/// One constant pool entry, selected by its leading tag byte.
#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub enum ConstantInfo {
    #[brw(magic = 1u8)]
    Utf8(Utf8Constant),
    #[brw(magic = 3u8)]
    Integer(IntegerConstant),
    #[brw(magic = 4u8)]
    Float(FloatConstant),
    #[brw(magic = 5u8)]
    Long(LongConstant),
    #[brw(magic = 6u8)]
    Double(DoubleConstant),
    #[brw(magic = 7u8)]
    Class(ClassConstant),
    #[brw(magic = 8u8)]
    String(StringConstant),
    #[brw(magic = 9u8)]
    FieldRef(FieldRefConstant),
    #[brw(magic = 10u8)]
    MethodRef(MethodRefConstant),
    #[brw(magic = 11u8)]
    InterfaceMethodRef(InterfaceMethodRefConstant),
    #[brw(magic = 12u8)]
    NameAndType(NameAndTypeConstant),
    #[brw(magic = 15u8)]
    MethodHandle(MethodHandleConstant),
    #[brw(magic = 16u8)]
    MethodType(MethodTypeConstant),
    #[brw(magic = 17u8)]
    Dynamic(DynamicConstant),
    #[brw(magic = 18u8)]
    InvokeDynamic(InvokeDynamicConstant),
    #[brw(magic = 19u8)]
    Module(ModuleConstant),
    #[brw(magic = 20u8)]
    Package(PackageConstant),
}

impl ConstantInfo {
    /// Long and double entries take up two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, ConstantInfo::Long(_) | ConstantInfo::Double(_))
    }

    /// Short name used in resolution errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantInfo::Utf8(_) => "Utf8",
            ConstantInfo::Integer(_) => "Integer",
            ConstantInfo::Float(_) => "Float",
            ConstantInfo::Long(_) => "Long",
            ConstantInfo::Double(_) => "Double",
            ConstantInfo::Class(_) => "Class",
            ConstantInfo::String(_) => "String",
            ConstantInfo::FieldRef(_) => "Fieldref",
            ConstantInfo::MethodRef(_) => "Methodref",
            ConstantInfo::InterfaceMethodRef(_) => "InterfaceMethodref",
            ConstantInfo::NameAndType(_) => "NameAndType",
            ConstantInfo::MethodHandle(_) => "MethodHandle",
            ConstantInfo::MethodType(_) => "MethodType",
            ConstantInfo::Dynamic(_) => "Dynamic",
            ConstantInfo::InvokeDynamic(_) => "InvokeDynamic",
            ConstantInfo::Module(_) => "Module",
            ConstantInfo::Package(_) => "Package",
        }
    }
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
pub struct Utf8Constant {
    #[br(temp)]
    #[bw(try_calc(u16::try_from(encode_modified_utf8(value).len())))]
    length: u16,
    #[br(count = length, map = |bytes: Vec<u8>| decode_modified_utf8(&bytes))]
    #[bw(map = |s: &String| encode_modified_utf8(s))]
    pub value: String,
}

impl Utf8Constant {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct IntegerConstant {
    pub value: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct FloatConstant {
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct LongConstant {
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct DoubleConstant {
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct ClassConstant {
    pub name_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct StringConstant {
    pub string_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct FieldRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct MethodRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct InterfaceMethodRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct NameAndTypeConstant {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct MethodHandleConstant {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct MethodTypeConstant {
    pub descriptor_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct DynamicConstant {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct InvokeDynamicConstant {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct ModuleConstant {
    pub name_index: u16,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
pub struct PackageConstant {
    pub name_index: u16,
}

/// Method handle reference kinds (JVMS 4.4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl ReferenceKind {
    pub fn from_u8(kind: u8) -> Option<Self> {
        Some(match kind {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            _ => return None,
        })
    }

    /// Whether a handle of this kind needs a receiver instance.
    pub fn is_instance(self) -> bool {
        matches!(
            self,
            ReferenceKind::GetField
                | ReferenceKind::PutField
                | ReferenceKind::InvokeVirtual
                | ReferenceKind::InvokeSpecial
                | ReferenceKind::InvokeInterface
        )
    }
}

/// Decode the JVM's modified UTF-8 (JVMS 4.4.7).
///
/// Standard UTF-8 is accepted as is. Otherwise the two-byte null form and
/// surrogate pairs encoded as two three-byte sequences are folded back; anything
/// undecodable becomes U+FFFD.
pub fn decode_modified_utf8(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_owned();
    }
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xe0 == 0xc0 && i + 1 < bytes.len() {
            units.push((((b & 0x1f) as u16) << 6) | (bytes[i + 1] & 0x3f) as u16);
            i += 2;
        } else if b & 0xf0 == 0xe0 && i + 2 < bytes.len() {
            units.push(
                (((b & 0x0f) as u16) << 12)
                    | (((bytes[i + 1] & 0x3f) as u16) << 6)
                    | (bytes[i + 2] & 0x3f) as u16,
            );
            i += 3;
        } else {
            units.push(0xfffd);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}

/// Encode `value` as modified UTF-8, the inverse of [`decode_modified_utf8`].
///
/// NUL takes the two-byte form and characters outside the BMP are written as
/// a surrogate pair of three-byte sequences.
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modified_utf8_null_and_surrogates() {
        assert_eq!(decode_modified_utf8(b"plain"), "plain");
        assert_eq!(decode_modified_utf8(&[b'a', 0xc0, 0x80, b'b']), "a\u{0}b");
        // U+1F600 as a CESU-8 surrogate pair
        let smiley = [0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80];
        assert_eq!(decode_modified_utf8(&smiley), "\u{1F600}");
    }

    #[test]
    fn test_modified_utf8_encoding() {
        assert_eq!(encode_modified_utf8("a\u{0}b"), vec![b'a', 0xc0, 0x80, b'b']);
        assert_eq!(
            encode_modified_utf8("\u{1F600}"),
            vec![0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80]
        );
        assert_eq!(encode_modified_utf8("caf\u{e9}"), "caf\u{e9}".as_bytes());
    }

    #[test]
    fn test_utf8_constant_written_as_modified_utf8() {
        use binrw::{BinRead, BinWrite};
        use std::io::Cursor;

        let original = Utf8Constant::new("nul\u{0} and \u{1F600}");
        let mut out = Cursor::new(Vec::new());
        original.write_be(&mut out).unwrap();
        let bytes = out.into_inner();
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]) as usize, bytes.len() - 2);
        assert!(!bytes[2..].contains(&0));

        let read = Utf8Constant::read_be(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(read, original);
    }
}
