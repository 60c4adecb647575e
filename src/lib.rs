//! Structural recovery for [Java class files](https://docs.oracle.com/javase/specs/jvms/se10/html/jvms-4.html)
//!
//! Decodes a class file into a [`ClassFile`] entity graph, binds generic
//! supertypes across a [`ClassHierarchy`], and provides the SSA identifier and
//! expression rewrite layers used by method analysis.
//!
//! ```rust
//! use classfile_recover::{ClassDecoder, DecodeOptions, ReadError};
//!
//! let decoder = ClassDecoder::new(DecodeOptions::default());
//! match decoder.decode(&[0xde, 0xad, 0xbe, 0xef]) {
//!     Err(ReadError::MalformedContainer { offset, .. }) => assert_eq!(offset, 0),
//!     other => panic!("unexpected result: {:?}", other.map(|c| c.class_type().clone())),
//! }
//! ```

#[macro_use]
extern crate bitflags;

pub mod analysis;
pub mod attribute_info;
pub mod byte_cursor;
pub mod constant_info;
pub mod decoder;
pub mod dumper;
pub mod error;
pub mod expr;
pub mod field_info;
pub mod generics;
pub mod method_info;
pub mod signature;
pub mod ssa;
pub mod types;

pub use analysis::{AnalysisOptions, ClassAnalyser, MethodAnalyser};
pub use decoder::{
    decode_class, ClassDecoder, ClassLocator, ClassSetup, ConfigCallback, DecodeOptions,
    InMemoryClassSource,
};
pub use dumper::{Dumpable, Dumper};
pub use error::{AnalysisError, LocateError, MemberFailure, ReadError, ReadResult, UnsupportedOperation};
pub use generics::{BindingSuperContainer, ClassHierarchy, ClassId, GenericTypeBinder, Route};
pub use ssa::{SsaIdent, SsaIdentifierFactory, SsaIdentifiers};
pub use types::*;
