//! Class-file decoding: header, constant pool, identity, members, attributes,
//! then the nested classes this class directly encloses.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::attribute_info::{decode_attributes, AttributeInfoVariant, InnerClassEntry};
use crate::byte_cursor::ByteCursor;
use crate::constant_info::{ClassRef, ConstantPool};
use crate::error::{LocateError, ReadError, ReadResult};
use crate::field_info::FieldInfo;
use crate::method_info::MethodInfo;
use crate::signature::RefType;
use crate::types::*;

const MAGIC: u32 = 0xCAFE_BABE;
const HEADER_LENGTH: usize = 8;
const OFFSET_OF_CONSTANT_POOL: usize = 10;
const IDENTITY_LENGTH: usize = 6;

/// Options for decoding a class.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Decode the nested classes listed in `InnerClasses` through the locator.
    pub with_inner_classes: bool,
    /// Hide the enclosing-instance parameter of inner class constructors.
    pub remove_inner_class_synthetics: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            with_inner_classes: true,
            remove_inner_class_synthetics: true,
        }
    }
}

/// Finds and decodes other classes by internal name.
pub trait ClassLocator {
    fn locate(&self, name: &str, with_inner_classes: bool) -> Result<ClassFile, LocateError>;
}

/// External policy applied to each class once its pool and identity are known.
pub trait ConfigCallback {
    fn configure_with(&self, setup: &mut ClassSetup<'_>);
}

/// The in-progress class as seen by a [`ConfigCallback`].
///
/// Decoded data is only readable; the callback may attach presentation and
/// analysis settings.
#[derive(Debug)]
pub struct ClassSetup<'a> {
    class_type: &'a RefType,
    const_pool: &'a ConstantPool,
    access_flags: ClassAccessFlags,
    version: ClassFileVersion,
    dumper: ClassDumper,
    hidden: bool,
    comments: Vec<String>,
}

impl<'a> ClassSetup<'a> {
    pub fn class_type(&self) -> &'a RefType {
        self.class_type
    }

    pub fn constant_pool(&self) -> &'a ConstantPool {
        self.const_pool
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    pub fn version(&self) -> ClassFileVersion {
        self.version
    }

    pub fn dumper(&self) -> ClassDumper {
        self.dumper
    }

    pub fn set_dumper(&mut self, dumper: ClassDumper) {
        self.dumper = dumper;
    }

    /// Keep this class out of its enclosing class's output.
    pub fn mark_hidden(&mut self) {
        self.hidden = true;
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }
}

/// Decodes class files into [`ClassFile`]s.
#[derive(Clone, Default)]
pub struct ClassDecoder<'a> {
    options: DecodeOptions,
    locator: Option<&'a dyn ClassLocator>,
    config: Option<&'a dyn ConfigCallback>,
}

impl<'a> ClassDecoder<'a> {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            locator: None,
            config: None,
        }
    }

    pub fn with_locator(mut self, locator: &'a dyn ClassLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_config_callback(mut self, config: &'a dyn ConfigCallback) -> Self {
        self.config = Some(config);
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode `bytes`, following nested classes if the options say so.
    pub fn decode(&self, bytes: &[u8]) -> ReadResult<ClassFile> {
        self.decode_with(bytes, self.options.with_inner_classes)
    }

    pub fn decode_with(&self, bytes: &[u8], with_inner_classes: bool) -> ReadResult<ClassFile> {
        let cursor = ByteCursor::new(bytes);
        let magic = cursor.u32_at(0)?;
        if magic != MAGIC {
            return Err(ReadError::malformed(
                0,
                format!("bad magic {:#010x}, expected {:#010x}", magic, MAGIC),
            ));
        }
        let (header, _) = cursor.read_at::<ClassHeader>(0)?;
        let declared_version = ClassFileVersion::new(header.major_version, header.minor_version);

        let const_pool = ConstantPool::decode(
            &cursor.offset_cursor(OFFSET_OF_CONSTANT_POOL)?,
            header.const_pool_count,
        )?;
        let mut layout = TableLayout {
            header: TableExtent {
                offset: 0,
                length: HEADER_LENGTH,
            },
            constant_pool: TableExtent {
                offset: HEADER_LENGTH,
                length: 2 + const_pool.raw_byte_length(),
            },
            ..TableLayout::default()
        };

        let offset_of_access_flags = layout.constant_pool.end();
        let (identity, _) = cursor.read_at::<ClassIdentity>(offset_of_access_flags)?;
        layout.identity = TableExtent {
            offset: offset_of_access_flags,
            length: IDENTITY_LENGTH,
        };
        let this_class = const_pool.class_ref(identity.this_class)?;
        let class_type = RefType::new(this_class.name.as_str());

        let offset_of_interfaces = layout.identity.end();
        let raw_interfaces = (0..identity.interfaces_count as usize)
            .map(|i| -> ReadResult<ClassRef> {
                let index = cursor.u16_at(offset_of_interfaces + 2 + 2 * i)?;
                const_pool.class_ref(index)
            })
            .collect::<ReadResult<Vec<_>>>()?;
        layout.interfaces = TableExtent {
            offset: offset_of_interfaces,
            length: 2 + 2 * raw_interfaces.len(),
        };
        debug!(class = %class_type, version = %declared_version, "decoded class identity");

        let mut setup = ClassSetup {
            class_type: &class_type,
            const_pool: &const_pool,
            access_flags: identity.access_flags,
            version: declared_version,
            dumper: ClassDumper::for_flags(identity.access_flags),
            hidden: false,
            comments: Vec::new(),
        };
        if let Some(config) = self.config {
            config.configure_with(&mut setup);
        }
        let ClassSetup {
            dumper,
            hidden,
            mut comments,
            ..
        } = setup;

        let offset_of_fields = layout.interfaces.end();
        let (fields, fields_length) =
            decode_members(&cursor, offset_of_fields, &const_pool, FieldInfo::decode)?;
        layout.fields = TableExtent {
            offset: offset_of_fields,
            length: fields_length,
        };

        let offset_of_methods = layout.fields.end();
        let (methods, methods_length) =
            decode_members(&cursor, offset_of_methods, &const_pool, MethodInfo::decode)?;
        layout.methods = TableExtent {
            offset: offset_of_methods,
            length: methods_length,
        };

        let offset_of_attributes = layout.methods.end();
        let attributes_count = cursor.u16_at(offset_of_attributes)?;
        let (attributes, attributes_length) =
            decode_attributes(&cursor, offset_of_attributes + 2, attributes_count, &const_pool)?;
        layout.attributes = TableExtent {
            offset: offset_of_attributes,
            length: 2 + attributes_length,
        };
        layout.trailing = bytes.len().saturating_sub(layout.end());
        if layout.trailing > 0 {
            warn!(class = %class_type, trailing = layout.trailing, "trailing bytes after class file");
        }

        let raw_super_class = match identity.super_class {
            0 => None,
            index => Some(const_pool.class_ref(index)?),
        };

        let mut class = ClassFile {
            version: declared_version,
            declared_version,
            const_pool,
            access_flags: identity.access_flags,
            this_class,
            class_type,
            raw_super_class,
            raw_interfaces,
            fields,
            methods,
            attributes,
            inner_classes: Vec::new(),
            comments: Vec::new(),
            dumper,
            hidden,
            is_static_inner: false,
            hide_synthetic_this: false,
            layout,
            class_signature: OnceLock::new(),
            fields_by_name: OnceLock::new(),
            methods_by_name: OnceLock::new(),
        };

        if declared_version.before(ClassFileVersion::JAVA_6) && class.uses_signatures() {
            comments.push(format!(
                "This class specifies class file version {} but uses Java 6 signatures.  Assuming Java 6.",
                declared_version
            ));
            class.version = ClassFileVersion::JAVA_6;
        }
        class.comments = comments;

        if with_inner_classes {
            self.load_inner_classes(&mut class);
        }
        Ok(class)
    }

    fn load_inner_classes(&self, class: &mut ClassFile) {
        let entries: Vec<InnerClassEntry> = class
            .attributes
            .iter()
            .filter_map(|a| match &a.info_parsed {
                AttributeInfoVariant::InnerClasses(ic) => Some(ic.classes.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();
        if entries.is_empty() {
            return;
        }
        let Some(locator) = self.locator else {
            debug!(class = %class.class_type, "no class locator, nested classes not loaded");
            return;
        };

        let this_name = class.class_type.internal_name().to_string();
        for entry in entries {
            // entries may describe classes nested in some other class
            if entry.enclosing_class_name() != Some(this_name.as_str())
                || entry.inner_class.name == this_name
            {
                continue;
            }
            debug!(class = %this_name, nested = %entry.inner_class.name, "decoding nested class");
            match locator.locate(&entry.inner_class.name, true) {
                Ok(mut inner) => {
                    self.mark_inner_class_as_static(&mut inner, &class.class_type);
                    class.inner_classes.push(NestedClass {
                        entry,
                        class: Arc::new(inner),
                    });
                }
                Err(error) => {
                    warn!(
                        class = %this_name,
                        nested = %entry.inner_class.name,
                        %error,
                        "skipping nested class"
                    );
                }
            }
        }
    }

    /// A nested class is static unless every constructor takes the enclosing
    /// instance as its first parameter.
    fn mark_inner_class_as_static(&self, inner: &mut ClassFile, outer: &RefType) {
        let captures_outer = inner.constructors().iter().all(|c| {
            c.prototype
                .parameters
                .first()
                .and_then(|p| p.ref_type())
                .is_some_and(|p| p == outer)
        });
        if !captures_outer {
            inner.is_static_inner = true;
        } else if self.options.remove_inner_class_synthetics {
            inner.hide_synthetic_this = true;
        }
    }
}

/// Decode a `u16`-counted table of variable-length member records.
fn decode_members<T>(
    cursor: &ByteCursor<'_>,
    offset: usize,
    pool: &ConstantPool,
    decode: fn(&ByteCursor<'_>, usize, &ConstantPool) -> ReadResult<(T, usize)>,
) -> ReadResult<(Vec<T>, usize)> {
    let count = cursor.u16_at(offset)?;
    let mut members = Vec::with_capacity(count as usize);
    let mut length = 2;
    for _ in 0..count {
        let (member, member_length) = decode(cursor, offset + length, pool)?;
        members.push(member);
        length += member_length;
    }
    Ok((members, length))
}

/// Decode a class without following nested classes.
pub fn decode_class(bytes: &[u8]) -> ReadResult<ClassFile> {
    ClassDecoder::new(DecodeOptions {
        with_inner_classes: false,
        ..DecodeOptions::default()
    })
    .decode(bytes)
}

/// A [`ClassLocator`] over class bytes held in memory, keyed by internal name.
///
/// Every class it decodes, nested ones included, goes through the same
/// options and config callback.
#[derive(Clone, Default)]
pub struct InMemoryClassSource {
    classes: BTreeMap<String, Vec<u8>>,
    options: DecodeOptions,
    config: Option<Arc<dyn ConfigCallback>>,
}

impl fmt::Debug for InMemoryClassSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryClassSource")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .field("config", &self.config.is_some())
            .finish()
    }
}

impl InMemoryClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            classes: BTreeMap::new(),
            options,
            config: None,
        }
    }

    pub fn with_config_callback(mut self, config: Arc<dyn ConfigCallback>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.classes.insert(name.into(), bytes);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Decode `name` with this source's options, nested classes included.
    pub fn load(&self, name: &str) -> Result<ClassFile, LocateError> {
        self.locate(name, self.options.with_inner_classes)
    }
}

impl ClassLocator for InMemoryClassSource {
    fn locate(&self, name: &str, with_inner_classes: bool) -> Result<ClassFile, LocateError> {
        let bytes = self
            .classes
            .get(name)
            .ok_or_else(|| LocateError::NotFound(name.to_string()))?;
        let mut decoder = ClassDecoder::new(self.options.clone()).with_locator(self);
        if let Some(config) = &self.config {
            decoder = decoder.with_config_callback(config.as_ref());
        }
        Ok(decoder.decode_with(bytes, with_inner_classes)?)
    }
}
