#![allow(dead_code)]

//! Assembles class files in memory for the integration tests.

use std::collections::HashMap;
use std::io::Cursor;

use binrw::BinWrite;
use classfile_recover::attribute_info::RawAttribute;
use classfile_recover::constant_info::*;
use classfile_recover::field_info::{FieldAccessFlags, FieldHeader};
use classfile_recover::method_info::{MethodAccessFlags, MethodHeader};
use classfile_recover::{ClassAccessFlags, ClassHeader, ClassIdentity};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

struct Member {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<RawAttribute>,
}

/// Builds a class file one table at a time. Pool entries are shared.
pub struct ClassBuilder {
    major: u16,
    minor: u16,
    pool: Vec<ConstantInfo>,
    next_index: u16,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<RawAttribute>,
    inner_classes: Vec<[u16; 4]>,
    trailing: Vec<u8>,
}

impl ClassBuilder {
    /// A public class extending `java/lang/Object`, version 52.0.
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            major: 52,
            minor: 0,
            pool: Vec::new(),
            next_index: 1,
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            inner_classes: Vec::new(),
            trailing: Vec::new(),
        };
        builder.this_class = builder.class(name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    fn push(&mut self, entry: ConstantInfo) -> u16 {
        let index = self.next_index;
        self.next_index += if entry.is_wide() { 2 } else { 1 };
        self.pool.push(entry);
        index
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8s.get(value) {
            return index;
        }
        let index = self.push(ConstantInfo::Utf8(Utf8Constant::new(value)));
        self.utf8s.insert(value.to_string(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let index = self.push(ConstantInfo::Class(ClassConstant { name_index }));
        self.classes.insert(name.to_string(), index);
        index
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.push(ConstantInfo::Long(LongConstant { value }))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.push(ConstantInfo::NameAndType(NameAndTypeConstant {
            name_index,
            descriptor_index,
        }))
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.push(ConstantInfo::MethodRef(MethodRefConstant {
            class_index,
            name_and_type_index,
        }))
    }

    pub fn method_handle(&mut self, reference_kind: u8, reference_index: u16) -> u16 {
        self.push(ConstantInfo::MethodHandle(MethodHandleConstant {
            reference_kind,
            reference_index,
        }))
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.utf8(descriptor);
        self.push(ConstantInfo::MethodType(MethodTypeConstant { descriptor_index }))
    }

    pub fn invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.push(ConstantInfo::InvokeDynamic(InvokeDynamicConstant {
            bootstrap_method_attr_index: bootstrap,
            name_and_type_index,
        }))
    }

    /// Append a raw pool entry without interning.
    pub fn raw_entry(&mut self, entry: ConstantInfo) -> u16 {
        self.push(entry)
    }

    pub fn version(&mut self, major: u16, minor: u16) -> &mut Self {
        self.major = major;
        self.minor = minor;
        self
    }

    pub fn access(&mut self, access_flags: u16) -> &mut Self {
        self.access_flags = access_flags;
        self
    }

    pub fn super_class(&mut self, name: Option<&str>) -> &mut Self {
        self.super_class = match name {
            Some(name) => self.class(name),
            None => 0,
        };
        self
    }

    /// Point the super class at an arbitrary pool index.
    pub fn super_class_index(&mut self, index: u16) -> &mut Self {
        self.super_class = index;
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    fn member(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
    ) -> Member {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attributes = signature
            .map(|sig| vec![self.signature_attribute(sig)])
            .unwrap_or_default();
        Member {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        }
    }

    fn signature_attribute(&mut self, signature: &str) -> RawAttribute {
        let name_index = self.utf8("Signature");
        let signature_index = self.utf8(signature);
        RawAttribute::new(name_index, signature_index.to_be_bytes().to_vec())
    }

    pub fn field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
    ) -> &mut Self {
        let field = self.member(access_flags, name, descriptor, signature);
        self.fields.push(field);
        self
    }

    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
    ) -> &mut Self {
        let method = self.member(access_flags, name, descriptor, signature);
        self.methods.push(method);
        self
    }

    /// Attach an attribute with an arbitrary payload to the last method.
    pub fn method_attribute(&mut self, name: &str, payload: Vec<u8>) -> &mut Self {
        let name_index = self.utf8(name);
        if let Some(method) = self.methods.last_mut() {
            method.attributes.push(RawAttribute::new(name_index, payload));
        }
        self
    }

    pub fn class_signature(&mut self, signature: &str) -> &mut Self {
        let attribute = self.signature_attribute(signature);
        self.attributes.push(attribute);
        self
    }

    /// Add a row to the class's `InnerClasses` attribute.
    pub fn inner_class(
        &mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        access_flags: u16,
    ) -> &mut Self {
        let inner_index = self.class(inner);
        let outer_index = outer.map_or(0, |o| self.class(o));
        let name_index = inner_name.map_or(0, |n| self.utf8(n));
        self.inner_classes
            .push([inner_index, outer_index, name_index, access_flags]);
        self
    }

    pub fn attribute(&mut self, name: &str, payload: Vec<u8>) -> &mut Self {
        let name_index = self.utf8(name);
        self.attributes.push(RawAttribute::new(name_index, payload));
        self
    }

    pub fn trailing(&mut self, bytes: &[u8]) -> &mut Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        let mut attributes = self.attributes.clone();
        if !self.inner_classes.is_empty() {
            let name_index = self.utf8("InnerClasses");
            let mut payload = (self.inner_classes.len() as u16).to_be_bytes().to_vec();
            for row in &self.inner_classes {
                for value in row {
                    payload.extend_from_slice(&value.to_be_bytes());
                }
            }
            attributes.push(RawAttribute::new(name_index, payload));
        }

        let mut out = Cursor::new(Vec::new());
        ClassHeader {
            minor_version: self.minor,
            major_version: self.major,
            const_pool_count: self.next_index,
        }
        .write(&mut out)
        .unwrap();
        for entry in &self.pool {
            entry.write(&mut out).unwrap();
        }
        ClassIdentity {
            access_flags: ClassAccessFlags::from_bits_retain(self.access_flags),
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces_count: self.interfaces.len() as u16,
        }
        .write(&mut out)
        .unwrap();
        for interface in &self.interfaces {
            interface.write_be(&mut out).unwrap();
        }

        (self.fields.len() as u16).write_be(&mut out).unwrap();
        for field in &self.fields {
            FieldHeader {
                access_flags: FieldAccessFlags::from_bits_retain(field.access_flags),
                name_index: field.name_index,
                descriptor_index: field.descriptor_index,
                attributes_count: field.attributes.len() as u16,
            }
            .write(&mut out)
            .unwrap();
            for attribute in &field.attributes {
                attribute.write(&mut out).unwrap();
            }
        }

        (self.methods.len() as u16).write_be(&mut out).unwrap();
        for method in &self.methods {
            MethodHeader {
                access_flags: MethodAccessFlags::from_bits_retain(method.access_flags),
                name_index: method.name_index,
                descriptor_index: method.descriptor_index,
                attributes_count: method.attributes.len() as u16,
            }
            .write(&mut out)
            .unwrap();
            for attribute in &method.attributes {
                attribute.write(&mut out).unwrap();
            }
        }

        (attributes.len() as u16).write_be(&mut out).unwrap();
        for attribute in &attributes {
            attribute.write(&mut out).unwrap();
        }

        let mut bytes = out.into_inner();
        bytes.extend_from_slice(&self.trailing);
        bytes
    }
}

/// A builder for `Outer$Inner` with the usual constructor shape of an inner
/// (non-static) class.
pub fn inner_class_bytes(outer: &str, inner: &str, captures_outer: bool) -> Vec<u8> {
    let mut builder = ClassBuilder::new(inner);
    let descriptor = if captures_outer {
        format!("(L{};I)V", outer)
    } else {
        "(I)V".to_string()
    };
    builder
        .field(0x1010, "this$0", &format!("L{};", outer), None)
        .method(ACC_PUBLIC, "<init>", &descriptor, None)
        .inner_class(inner, Some(outer), inner.rsplit('$').next(), 0);
    builder.build()
}
