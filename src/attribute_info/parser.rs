use nom::{
    bytes::complete::take,
    error::Error,
    multi::count,
    number::complete::{be_u16, be_u32, be_u8},
    Err as BaseErr,
};

use crate::attribute_info::types::*;
use crate::byte_cursor::ByteCursor;
use crate::constant_info::ConstantPool;
use crate::error::{ReadError, ReadResult};

// Using a type alias here evades a Clippy warning about complex types.
type Err<E> = BaseErr<Error<E>>;

pub const SIGNATURE: &str = "Signature";
pub const INNER_CLASSES: &str = "InnerClasses";
pub const BOOTSTRAP_METHODS: &str = "BootstrapMethods";
pub const SOURCE_FILE: &str = "SourceFile";
pub const CONSTANT_VALUE: &str = "ConstantValue";
pub const EXCEPTIONS: &str = "Exceptions";
pub const ENCLOSING_METHOD: &str = "EnclosingMethod";
pub const METHOD_PARAMETERS: &str = "MethodParameters";
pub const CODE: &str = "Code";
pub const DEPRECATED: &str = "Deprecated";
pub const SYNTHETIC: &str = "Synthetic";

pub fn raw_attribute_parser(input: &[u8]) -> Result<(&[u8], RawAttribute), Err<&[u8]>> {
    let (input, attribute_name_index) = be_u16(input)?;
    let (input, attribute_length) = be_u32(input)?;
    let (input, info) = take(attribute_length)(input)?;
    Ok((input, RawAttribute::new(attribute_name_index, info.to_owned())))
}

fn exception_entry_parser(input: &[u8]) -> Result<(&[u8], ExceptionEntry), Err<&[u8]>> {
    let (input, start_pc) = be_u16(input)?;
    let (input, end_pc) = be_u16(input)?;
    let (input, handler_pc) = be_u16(input)?;
    let (input, catch_type) = be_u16(input)?;
    Ok((
        input,
        ExceptionEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        },
    ))
}

/// The `Code` payload with its nested attributes still raw.
struct RawCode {
    max_stack: u16,
    max_locals: u16,
    code: Vec<u8>,
    exception_table: Vec<ExceptionEntry>,
    attributes: Vec<RawAttribute>,
}

fn code_attribute_parser(input: &[u8]) -> Result<(&[u8], RawCode), Err<&[u8]>> {
    let (input, max_stack) = be_u16(input)?;
    let (input, max_locals) = be_u16(input)?;
    let (input, code_length) = be_u32(input)?;
    let (input, code) = take(code_length)(input)?;
    let (input, exception_table_length) = be_u16(input)?;
    let (input, exception_table) =
        count(exception_entry_parser, exception_table_length as usize)(input)?;
    let (input, attributes_count) = be_u16(input)?;
    let (input, attributes) = count(raw_attribute_parser, attributes_count as usize)(input)?;
    Ok((
        input,
        RawCode {
            max_stack,
            max_locals,
            code: code.to_owned(),
            exception_table,
            attributes,
        },
    ))
}

pub fn inner_class_info_parser(input: &[u8]) -> Result<(&[u8], InnerClassInfo), Err<&[u8]>> {
    let (input, inner_class_info_index) = be_u16(input)?;
    let (input, outer_class_info_index) = be_u16(input)?;
    let (input, inner_name_index) = be_u16(input)?;
    let (input, inner_class_access_flags) = be_u16(input)?;
    Ok((
        input,
        InnerClassInfo {
            inner_class_info_index,
            outer_class_info_index,
            inner_name_index,
            inner_class_access_flags,
        },
    ))
}

pub fn inner_classes_attribute_parser(
    input: &[u8],
) -> Result<(&[u8], Vec<InnerClassInfo>), Err<&[u8]>> {
    let (input, number_of_classes) = be_u16(input)?;
    count(inner_class_info_parser, number_of_classes as usize)(input)
}

fn bootstrap_method_parser(input: &[u8]) -> Result<(&[u8], BootstrapMethod), Err<&[u8]>> {
    let (input, bootstrap_method_ref) = be_u16(input)?;
    let (input, num_bootstrap_arguments) = be_u16(input)?;
    let (input, bootstrap_arguments) = count(be_u16, num_bootstrap_arguments as usize)(input)?;
    Ok((
        input,
        BootstrapMethod {
            bootstrap_method_ref,
            bootstrap_arguments,
        },
    ))
}

pub fn bootstrap_methods_attribute_parser(
    input: &[u8],
) -> Result<(&[u8], BootstrapMethodsAttribute), Err<&[u8]>> {
    let (input, num_bootstrap_methods) = be_u16(input)?;
    let (input, bootstrap_methods) =
        count(bootstrap_method_parser, num_bootstrap_methods as usize)(input)?;
    Ok((input, BootstrapMethodsAttribute { bootstrap_methods }))
}

/// Index lists: `Exceptions`.
fn u16_table_parser(input: &[u8]) -> Result<(&[u8], Vec<u16>), Err<&[u8]>> {
    let (input, length) = be_u16(input)?;
    count(be_u16, length as usize)(input)
}

fn u16_pair_parser(input: &[u8]) -> Result<(&[u8], (u16, u16)), Err<&[u8]>> {
    let (input, first) = be_u16(input)?;
    let (input, second) = be_u16(input)?;
    Ok((input, (first, second)))
}

fn method_parameters_attribute_parser(
    input: &[u8],
) -> Result<(&[u8], Vec<(u16, u16)>), Err<&[u8]>> {
    let (input, parameters_count) = be_u8(input)?;
    count(u16_pair_parser, parameters_count as usize)(input)
}

fn optional_utf8(pool: &ConstantPool, index: u16) -> ReadResult<Option<String>> {
    match index {
        0 => Ok(None),
        i => Ok(Some(pool.utf8(i)?.to_string())),
    }
}

/// Resolve an attribute's name and interpret its payload against `pool`.
///
/// `offset` is the absolute position of the attribute in the class file and is
/// only used for diagnostics. Attributes with unrecognised names are kept as
/// [`AttributeInfoVariant::Unknown`].
pub fn interpret_attribute(
    raw: RawAttribute,
    pool: &ConstantPool,
    offset: usize,
) -> ReadResult<AttributeInfo> {
    let name = pool.utf8(raw.attribute_name_index)?.to_string();
    let payload = offset + 6;
    let input = raw.info.as_slice();
    let fail =
        |_: Err<&[u8]>| ReadError::malformed(payload, format!("truncated {} attribute", name));
    let info_parsed = match name.as_str() {
        SIGNATURE => {
            let (_, signature_index) = be_u16(input).map_err(&fail)?;
            AttributeInfoVariant::Signature(SignatureAttribute {
                signature_index,
                signature: pool.utf8(signature_index)?.to_string(),
            })
        }
        INNER_CLASSES => {
            let (_, rows) = inner_classes_attribute_parser(input).map_err(&fail)?;
            let classes = rows
                .iter()
                .map(|row| -> ReadResult<InnerClassEntry> {
                    Ok(InnerClassEntry {
                        inner_class: pool.class_ref(row.inner_class_info_index)?,
                        outer_class: match row.outer_class_info_index {
                            0 => None,
                            i => Some(pool.class_ref(i)?),
                        },
                        inner_name: optional_utf8(pool, row.inner_name_index)?,
                        access_flags: InnerClassAccessFlags::from_bits_retain(
                            row.inner_class_access_flags,
                        ),
                    })
                })
                .collect::<ReadResult<Vec<_>>>()?;
            AttributeInfoVariant::InnerClasses(InnerClassesAttribute { classes })
        }
        BOOTSTRAP_METHODS => {
            let (_, attr) = bootstrap_methods_attribute_parser(input).map_err(&fail)?;
            for method in &attr.bootstrap_methods {
                pool.method_handle(method.bootstrap_method_ref)?;
                for &arg in &method.bootstrap_arguments {
                    pool.entry(arg)?;
                }
            }
            AttributeInfoVariant::BootstrapMethods(attr)
        }
        SOURCE_FILE => {
            let (_, sourcefile_index) = be_u16(input).map_err(&fail)?;
            AttributeInfoVariant::SourceFile(SourceFileAttribute {
                sourcefile_index,
                file_name: pool.utf8(sourcefile_index)?.to_string(),
            })
        }
        CONSTANT_VALUE => {
            let (_, constant_value_index) = be_u16(input).map_err(&fail)?;
            pool.entry(constant_value_index)?;
            AttributeInfoVariant::ConstantValue(ConstantValueAttribute {
                constant_value_index,
            })
        }
        EXCEPTIONS => {
            let (_, indices) = u16_table_parser(input).map_err(&fail)?;
            let exceptions = indices
                .into_iter()
                .map(|i| pool.class_ref(i))
                .collect::<ReadResult<Vec<_>>>()?;
            AttributeInfoVariant::Exceptions(ExceptionsAttribute { exceptions })
        }
        ENCLOSING_METHOD => {
            let (_, (class_index, method_index)) = u16_pair_parser(input).map_err(&fail)?;
            let method = match method_index {
                0 => None,
                i => {
                    let nat = pool.name_and_type(i)?;
                    Some((nat.name.to_string(), nat.descriptor.to_string()))
                }
            };
            AttributeInfoVariant::EnclosingMethod(EnclosingMethodAttribute {
                class: pool.class_ref(class_index)?,
                method,
            })
        }
        METHOD_PARAMETERS => {
            let (_, rows) = method_parameters_attribute_parser(input).map_err(&fail)?;
            let parameters = rows
                .into_iter()
                .map(|(name_index, access_flags)| -> ReadResult<MethodParameter> {
                    Ok(MethodParameter {
                        name: optional_utf8(pool, name_index)?,
                        access_flags,
                    })
                })
                .collect::<ReadResult<Vec<_>>>()?;
            AttributeInfoVariant::MethodParameters(MethodParametersAttribute { parameters })
        }
        CODE => {
            let (_, code) = code_attribute_parser(input).map_err(&fail)?;
            // nested attributes follow the code array and exception table
            let mut nested_offset = payload
                + 12
                + code.code.len()
                + 8 * code.exception_table.len();
            let mut attributes = Vec::with_capacity(code.attributes.len());
            for nested in code.attributes {
                let attr = interpret_attribute(nested, pool, nested_offset)?;
                nested_offset += attr.encoded_length();
                attributes.push(attr);
            }
            AttributeInfoVariant::Code(CodeAttribute {
                max_stack: code.max_stack,
                max_locals: code.max_locals,
                code: code.code,
                exception_table: code.exception_table,
                attributes,
            })
        }
        DEPRECATED => AttributeInfoVariant::Deprecated,
        SYNTHETIC => AttributeInfoVariant::Synthetic,
        _ => AttributeInfoVariant::Unknown,
    };
    Ok(AttributeInfo {
        name_index: raw.attribute_name_index,
        name,
        info: raw.info,
        info_parsed,
    })
}

/// Decode `count` consecutive attributes starting at `offset` in `cursor`.
///
/// Returns the attributes and the number of bytes they occupy.
pub fn decode_attributes(
    cursor: &ByteCursor<'_>,
    offset: usize,
    count: u16,
    pool: &ConstantPool,
) -> ReadResult<(Vec<AttributeInfo>, usize)> {
    let mut attributes = Vec::with_capacity(count as usize);
    let mut length = 0;
    for _ in 0..count {
        let (raw, len) = cursor.read_at::<RawAttribute>(offset + length)?;
        attributes.push(interpret_attribute(
            raw,
            pool,
            cursor.base() + offset + length,
        )?);
        length += len;
    }
    Ok((attributes, length))
}
