use tracing::debug;

use crate::byte_cursor::ByteCursor;
use crate::error::{ReadError, ReadResult};
use crate::signature::{class_name_to_type, JavaType};

use super::types::*;

/// The decoded constant pool.
///
/// Slot 0 and the slot following every long/double entry are unusable and hold
/// `None`, so indices from the class file address `entries` directly.
#[derive(Clone, Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Option<ConstantInfo>>,
    raw_byte_length: usize,
}

/// A resolved `CONSTANT_Class` reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub index: u16,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameAndType<'a> {
    pub name: &'a str,
    pub descriptor: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    InterfaceMethod,
}

/// A resolved field, method or interface method reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub kind: MemberKind,
    pub class_name: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodHandleRef<'a> {
    pub kind: ReferenceKind,
    pub member: MemberRef<'a>,
}

/// A resolved `CONSTANT_InvokeDynamic` or `CONSTANT_Dynamic` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynamicCallSite<'a> {
    pub bootstrap_method_index: u16,
    pub name: &'a str,
    pub descriptor: &'a str,
}

const KNOWN_TAGS: [u8; 17] = [1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 15, 16, 17, 18, 19, 20];

impl ConstantPool {
    /// Decode `count - 1` usable slots from the start of `cursor`.
    ///
    /// Entries are variable length, so the table is walked one entry at a time
    /// and its byte length is only known once the walk completes.
    pub fn decode(cursor: &ByteCursor<'_>, count: u16) -> ReadResult<Self> {
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(None);
        let mut offset = 0;
        while entries.len() < count as usize {
            let tag = cursor.u8_at(offset)?;
            if !KNOWN_TAGS.contains(&tag) {
                return Err(ReadError::malformed(
                    cursor.base() + offset,
                    format!("unknown constant pool tag {}", tag),
                ));
            }
            let (entry, length) = cursor.read_at::<ConstantInfo>(offset)?;
            offset += length;
            let wide = entry.is_wide();
            entries.push(Some(entry));
            if wide {
                if entries.len() >= count as usize {
                    return Err(ReadError::malformed(
                        cursor.base() + offset,
                        "wide constant occupies the last pool slot",
                    ));
                }
                entries.push(None);
            }
        }
        debug!(count, byte_length = offset, "decoded constant pool");
        Ok(Self {
            entries,
            raw_byte_length: offset,
        })
    }

    /// Build a pool from already decoded entries (slot 0 is implicit).
    pub fn from_entries(decoded: impl IntoIterator<Item = ConstantInfo>) -> Self {
        let mut entries = vec![None];
        for entry in decoded {
            let wide = entry.is_wide();
            entries.push(Some(entry));
            if wide {
                entries.push(None);
            }
        }
        Self {
            entries,
            raw_byte_length: 0,
        }
    }

    /// Number of slots including the unusable slot 0, i.e. `constant_pool_count`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Encoded size of the table in bytes, excluding the count.
    pub fn raw_byte_length(&self) -> usize {
        self.raw_byte_length
    }

    /// Usable entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantInfo)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i as u16, e)))
    }

    pub fn entry(&self, index: u16) -> ReadResult<&ConstantInfo> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| ReadError::broken(index, "constant pool entry"))
    }

    pub fn utf8(&self, index: u16) -> ReadResult<&str> {
        match self.entry(index)? {
            ConstantInfo::Utf8(u) => Ok(&u.value),
            _ => Err(ReadError::broken(index, "Utf8")),
        }
    }

    pub fn class_name(&self, index: u16) -> ReadResult<&str> {
        match self.entry(index)? {
            ConstantInfo::Class(c) => self.utf8(c.name_index),
            _ => Err(ReadError::broken(index, "Class")),
        }
    }

    pub fn class_ref(&self, index: u16) -> ReadResult<ClassRef> {
        Ok(ClassRef {
            index,
            name: self.class_name(index)?.to_string(),
        })
    }

    /// The type named by a `CONSTANT_Class` entry; array classes carry a descriptor.
    pub fn class_type(&self, index: u16) -> ReadResult<JavaType> {
        class_name_to_type(self.class_name(index)?)
            .ok_or_else(|| ReadError::broken(index, "class name or array descriptor"))
    }

    pub fn name_and_type(&self, index: u16) -> ReadResult<NameAndType<'_>> {
        match self.entry(index)? {
            ConstantInfo::NameAndType(nt) => Ok(NameAndType {
                name: self.utf8(nt.name_index)?,
                descriptor: self.utf8(nt.descriptor_index)?,
            }),
            _ => Err(ReadError::broken(index, "NameAndType")),
        }
    }

    pub fn member_ref(&self, index: u16) -> ReadResult<MemberRef<'_>> {
        let (kind, class_index, nat_index) = match self.entry(index)? {
            ConstantInfo::FieldRef(r) => (MemberKind::Field, r.class_index, r.name_and_type_index),
            ConstantInfo::MethodRef(r) => {
                (MemberKind::Method, r.class_index, r.name_and_type_index)
            }
            ConstantInfo::InterfaceMethodRef(r) => (
                MemberKind::InterfaceMethod,
                r.class_index,
                r.name_and_type_index,
            ),
            _ => return Err(ReadError::broken(index, "Fieldref or Methodref")),
        };
        let nat = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            kind,
            class_name: self.class_name(class_index)?,
            name: nat.name,
            descriptor: nat.descriptor,
        })
    }

    pub fn method_handle(&self, index: u16) -> ReadResult<MethodHandleRef<'_>> {
        match self.entry(index)? {
            ConstantInfo::MethodHandle(h) => {
                let kind = ReferenceKind::from_u8(h.reference_kind)
                    .ok_or_else(|| ReadError::broken(index, "method handle reference kind"))?;
                Ok(MethodHandleRef {
                    kind,
                    member: self.member_ref(h.reference_index)?,
                })
            }
            _ => Err(ReadError::broken(index, "MethodHandle")),
        }
    }

    /// Descriptor string of a `CONSTANT_MethodType` entry.
    pub fn method_type(&self, index: u16) -> ReadResult<&str> {
        match self.entry(index)? {
            ConstantInfo::MethodType(t) => self.utf8(t.descriptor_index),
            _ => Err(ReadError::broken(index, "MethodType")),
        }
    }

    pub fn invoke_dynamic(&self, index: u16) -> ReadResult<DynamicCallSite<'_>> {
        let (bootstrap_method_index, nat_index) = match self.entry(index)? {
            ConstantInfo::InvokeDynamic(d) => (d.bootstrap_method_attr_index, d.name_and_type_index),
            ConstantInfo::Dynamic(d) => (d.bootstrap_method_attr_index, d.name_and_type_index),
            _ => return Err(ReadError::broken(index, "InvokeDynamic")),
        };
        let nat = self.name_and_type(nat_index)?;
        Ok(DynamicCallSite {
            bootstrap_method_index,
            name: nat.name,
            descriptor: nat.descriptor,
        })
    }
}
