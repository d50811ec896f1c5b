//! The in-memory value graph (§1.1 of SPEC_FULL.md).
//!
//! `Value` is a thin dynamic wrapper standing in for the dynamically-typed
//! host value this codec was designed around. Heap-allocated variants use
//! `Rc<RefCell<_>>` so that two `Value` handles can alias one heap node
//! (graph sharing) and so the decoder can build an empty shell and mutate it
//! while descending into children (cycle realisation, spec §4.8/§4.9).

use std::cell::RefCell;
use std::rc::Rc;

/// An arbitrary-precision integer, split into sign and big-endian magnitude.
/// Magnitude is stored most-significant-byte first with no leading zero
/// bytes (except for zero itself, which is represented as an empty
/// magnitude with `negative = false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigIntValue {
    /// `true` when the value is strictly negative.
    pub negative: bool,
    /// Big-endian magnitude bytes, no leading zeros.
    pub magnitude: Vec<u8>,
}

impl BigIntValue {
    /// Build a [`BigIntValue`] from an `i64`.
    pub fn from_i64(value: i64) -> Self {
        let negative = value < 0;
        let magnitude = (value as i128).unsigned_abs() as u128;
        Self {
            negative,
            magnitude: trim_leading_zeros(&magnitude.to_be_bytes()),
        }
    }

    /// `true` if this value's magnitude fits in a signed 64-bit integer.
    pub fn fits_in_i64(&self) -> bool {
        if self.magnitude.len() > 8 {
            return false;
        }
        let mut buf = [0u8; 8];
        let start = 8 - self.magnitude.len();
        buf[start..].copy_from_slice(&self.magnitude);
        let unsigned = u64::from_be_bytes(buf);
        if self.negative {
            unsigned <= (i64::MAX as u64) + 1
        } else {
            unsigned <= i64::MAX as u64
        }
    }

    /// The magnitude as a `u64`, zero-padded on the left. Only valid when
    /// [`Self::fits_in_i64`] is true; this is the 8-byte payload the wire
    /// format stores for `BIGINT_*_SMALL` (sign lives in the tag, not the
    /// payload).
    pub fn magnitude_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        let start = 8 - self.magnitude.len();
        buf[start..].copy_from_slice(&self.magnitude);
        u64::from_be_bytes(buf)
    }

    /// Build a [`BigIntValue`] from a sign and a raw magnitude.
    pub fn from_parts(negative: bool, magnitude: Vec<u8>) -> Self {
        Self {
            negative,
            magnitude: trim_leading_zeros(&magnitude),
        }
    }

    /// Convert to `i64`. Only valid when [`Self::fits_in_i64`] is true.
    pub fn to_i64(&self) -> i64 {
        let mut buf = [0u8; 8];
        let start = 8 - self.magnitude.len();
        buf[start..].copy_from_slice(&self.magnitude);
        let unsigned = u64::from_be_bytes(buf);
        if self.negative {
            (unsigned as i128 * -1) as i64
        } else {
            unsigned as i64
        }
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(idx) => bytes[idx..].to_vec(),
        None => Vec::new(),
    }
}

/// Element kind of a [`TypedArray`], one per numeric typed-array tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedArrayKind {
    /// Unsigned 8-bit integers.
    U8,
    /// Signed 8-bit integers.
    I8,
    /// Unsigned 8-bit integers, clamped on write (content-identical on wire).
    U8Clamped,
    /// Unsigned 16-bit integers.
    U16,
    /// Signed 16-bit integers.
    I16,
    /// Unsigned 32-bit integers.
    U32,
    /// Signed 32-bit integers.
    I32,
    /// 32-bit floats.
    F32,
    /// 64-bit floats.
    F64,
    /// Signed 64-bit integers.
    I64,
    /// Unsigned 64-bit integers.
    U64,
}

impl TypedArrayKind {
    /// Size in bytes of one element of this kind.
    pub fn elem_size(self) -> usize {
        match self {
            TypedArrayKind::U8 | TypedArrayKind::I8 | TypedArrayKind::U8Clamped => 1,
            TypedArrayKind::U16 | TypedArrayKind::I16 => 2,
            TypedArrayKind::U32 | TypedArrayKind::I32 | TypedArrayKind::F32 => 4,
            TypedArrayKind::F64 | TypedArrayKind::I64 | TypedArrayKind::U64 => 8,
        }
    }

    /// `true` for the two 64-bit integer element kinds, which the wire
    /// format emits elementwise as aligned i64 words regardless of
    /// signedness (spec §4.6).
    pub fn is_big_integer_elem(self) -> bool {
        matches!(self, TypedArrayKind::I64 | TypedArrayKind::U64)
    }
}

/// A typed array view over an [`ArrayBuffer`]/[`SharedArrayBuffer`].
#[derive(Debug)]
pub struct TypedArray {
    /// Element kind.
    pub kind: TypedArrayKind,
    /// The backing buffer. Always `Value::ArrayBuffer` or
    /// `Value::SharedArrayBuffer`.
    pub buffer: Value,
    /// Byte offset into the backing buffer where this view starts.
    pub byte_offset: u32,
    /// Number of elements in this view.
    pub length: u32,
}

/// A `DataView`-style untyped byte window over an [`ArrayBuffer`].
#[derive(Debug)]
pub struct DataView {
    /// The backing buffer.
    pub buffer: Value,
    /// Byte offset into the backing buffer where this view starts.
    pub byte_offset: u32,
    /// Length in bytes of this view.
    pub length: u32,
}

/// A property descriptor's value: either plain data or an accessor pair.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A plain data property.
    Data(Value),
    /// An accessor property with an optional getter and/or setter.
    Accessor {
        /// The getter function, if any.
        getter: Option<Value>,
        /// The setter function, if any.
        setter: Option<Value>,
    },
}

/// One own property of an [`ObjectValue`], carrying its descriptor flags.
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    /// The property key.
    pub key: Rc<str>,
    /// The property's value or accessor pair.
    pub value: PropertyValue,
    /// Whether the property shows up in `for-in`-style enumeration.
    pub enumerable: bool,
    /// Whether the property can be reassigned.
    pub writable: bool,
    /// Whether the property can be deleted or reconfigured.
    pub configurable: bool,
}

impl PropertyEntry {
    /// Build a data property with the standard literal defaults: all three
    /// descriptor flags set.
    pub fn data(key: impl Into<Rc<str>>, value: Value) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Data(value),
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// `true` when every descriptor flag is at its standard-literal default
    /// and this is a plain data property, i.e. nothing here forces the
    /// classifier toward `OBJECT_WITH_DESCRIPTORS`.
    pub fn has_default_descriptor(&self) -> bool {
        matches!(self.value, PropertyValue::Data(_))
            && self.enumerable
            && self.writable
            && self.configurable
    }

    /// `true` when this property's value is directly a callable.
    pub fn is_method(&self) -> bool {
        matches!(&self.value, PropertyValue::Data(Value::Function(_)))
    }
}

/// An object's own properties plus an optional constructor name. A `None`
/// constructor name with an empty prototype chain classifies as
/// `OBJECT_LITERAL`; `Some(name)` classifies as `OBJECT_CONSTRUCTOR` unless
/// descriptors or methods take priority (spec §4.5).
#[derive(Debug, Clone, Default)]
pub struct ObjectValue {
    /// Name of the non-default constructor that produced this object, if
    /// its prototype is not the default object prototype.
    pub constructor_name: Option<Rc<str>>,
    /// Own properties, in insertion order.
    pub properties: Vec<PropertyEntry>,
}

/// An array slot: present or a hole. Sparse arrays are represented as a
/// vector of slots so that holes (`None`) are distinguishable from an
/// explicit value.
pub type ArraySlot = Option<Value>;

/// One of the nine well-known symbols the wire format has a dedicated
/// subtype for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownSymbol {
    /// `Symbol.iterator`
    Iterator,
    /// `Symbol.asyncIterator`
    AsyncIterator,
    /// `Symbol.hasInstance`
    HasInstance,
    /// `Symbol.isConcatSpreadable`
    IsConcatSpreadable,
    /// `Symbol.species`
    Species,
    /// `Symbol.toPrimitive`
    ToPrimitive,
    /// `Symbol.toStringTag`
    ToStringTag,
    /// `Symbol.unscopables`
    Unscopables,
    /// `Symbol.match`
    Match,
    /// `Symbol.replace`
    Replace,
    /// `Symbol.search`
    Search,
    /// `Symbol.split`
    Split,
}

/// A symbolic identifier, one of the four `SYMBOL*` wire subtypes.
#[derive(Debug, Clone)]
pub enum SymbolValue {
    /// Looked up (or inserted) in a process-wide global symbol registry.
    Global(Rc<str>),
    /// One of the fixed well-known symbols.
    WellKnown(WellKnownSymbol),
    /// A symbol with no description.
    NoDescription,
    /// A plain symbol with a (possibly empty) description.
    Described(Rc<str>),
}

/// Which built-in error constructor produced an [`ErrorValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `Error`.
    Plain,
    /// `EvalError`.
    Eval,
    /// `RangeError`.
    Range,
    /// `ReferenceError`.
    Reference,
    /// `SyntaxError`.
    Syntax,
    /// `TypeError`.
    Type,
    /// `URIError`.
    Uri,
    /// `AggregateError`, carrying nested errors.
    Aggregate,
    /// A custom, host-defined error subclass.
    Custom,
}

/// An error object: message, stack trace, and (for aggregate errors) the
/// nested error values.
///
/// `errors` is wrapped in a `RefCell` so the decoder can register this
/// value's shell into the object table (for back-references) before
/// filling in its nested errors, the same shell-before-children discipline
/// used for arrays/objects/maps/sets (spec §4.8 step 4).
#[derive(Debug, Clone)]
pub struct ErrorValue {
    /// Which error constructor produced this value.
    pub kind: ErrorKind,
    /// The error message.
    pub message: Rc<str>,
    /// The captured stack trace text.
    pub stack: Rc<str>,
    /// Nested errors, populated only for `ErrorKind::Aggregate`.
    pub errors: RefCell<Vec<Value>>,
}

/// A regular expression literal: source pattern and flags.
#[derive(Debug, Clone)]
pub struct RegexValue {
    /// The pattern source text.
    pub source: Rc<str>,
    /// The flags string (e.g. `"gi"`).
    pub flags: Rc<str>,
}

/// A callable value. Source-text capture only happens when
/// `CodecOptions::serialize_functions` is enabled on the encoding side;
/// otherwise callables inside method-object bodies are written as a
/// `FUNCTION_PLACEHOLDER` marker (spec §4.6/§9).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    /// The function's `name` property, if any.
    pub name: Option<Rc<str>>,
    /// The function's source text, captured only when function
    /// serialization is enabled on encode.
    pub source: Option<Rc<str>>,
}

/// An opaque binary blob. Content serialization is host-specific and not
/// defined by this codec (spec §9, Open Question b) — the wire slot exists,
/// but its payload is always two zero varints.
#[derive(Debug, Clone, Default)]
pub struct BlobValue;

/// An opaque file handle. Same unspecified-content caveat as [`BlobValue`].
#[derive(Debug, Clone, Default)]
pub struct FileValue {
    /// The file's display name, if the host chooses to carry one. Not
    /// written to the wire (see [`BlobValue`]'s doc comment).
    pub name: Option<Rc<str>>,
}

/// The dynamic value graph this codec serializes and deserializes.
///
/// Heap-allocated variants are `Rc<RefCell<_>>`; two `Value`s can therefore
/// alias the same heap node, and `Rc::as_ptr` doubles as the identity key
/// the reference tracker (C7) needs in place of native object identity.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// The undefined/absent value. Also stands in for top-level callables,
    /// which are never serialized directly (spec §4.5).
    Undefined,
    /// A boolean.
    Bool(bool),
    /// A numeric scalar. NaN, +/-infinity, and negative zero are all valid
    /// `f64` bit patterns here; the classifier inspects the bit pattern to
    /// pick the narrowest wire tag.
    Number(f64),
    /// An arbitrary-precision integer.
    BigInt(BigIntValue),
    /// A UTF-8 string.
    String(Rc<str>),
    /// An array, possibly sparse (holes represented as `None` slots).
    Array(Rc<RefCell<Vec<ArraySlot>>>),
    /// A plain or constructed object.
    Object(Rc<RefCell<ObjectValue>>),
    /// An insertion-ordered key/value map.
    Map(Rc<RefCell<Vec<(Value, Value)>>>),
    /// An insertion-ordered set.
    Set(Rc<RefCell<Vec<Value>>>),
    /// A contiguous byte store, transferable but not shareable across
    /// isolates.
    ArrayBuffer(Rc<RefCell<Vec<u8>>>),
    /// A contiguous byte store shareable across isolates.
    SharedArrayBuffer(Rc<RefCell<Vec<u8>>>),
    /// A typed view over an array buffer.
    TypedArray(Rc<TypedArray>),
    /// An untyped byte-range view over an array buffer.
    DataView(Rc<DataView>),
    /// A timestamp in milliseconds since the Unix epoch. Non-finite values
    /// classify as `DATE_INVALID` on encode.
    Date(f64),
    /// A regular expression literal.
    Regex(Rc<RegexValue>),
    /// An error object.
    Error(Rc<ErrorValue>),
    /// A symbolic identifier.
    Symbol(Rc<SymbolValue>),
    /// An opaque binary blob (content unspecified, see [`BlobValue`]).
    Blob(Rc<BlobValue>),
    /// An opaque file handle (content unspecified, see [`FileValue`]).
    File(Rc<FileValue>),
    /// A callable.
    Function(Rc<FunctionValue>),
}

/// Identity key for a heap-allocated [`Value`] in the object/array/
/// collection table (spec §3.3), used by the reference tracker in place of
/// native object identity (spec §9). `None` for values that are not
/// heap-allocated (primitives, numbers, bigints, dates). Strings are
/// intentionally excluded: the string table dedups by content, not
/// identity. Buffers are also excluded: they have their own identity-keyed
/// table (see [`buffer_identity`]) so that typed-array views can alias a
/// buffer independently of whether the buffer itself was ever walked as a
/// standalone value.
pub fn heap_identity(value: &Value) -> Option<usize> {
    match value {
        Value::Array(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Object(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Map(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Set(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::TypedArray(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::DataView(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Regex(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Error(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Symbol(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Blob(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::File(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::Function(rc) => Some(Rc::as_ptr(rc) as usize),
        _ => None,
    }
}

/// Identity key for a value's backing array buffer, used by the buffer
/// table to detect typed-array views that alias the same store.
pub fn buffer_identity(value: &Value) -> Option<usize> {
    match value {
        Value::ArrayBuffer(rc) => Some(Rc::as_ptr(rc) as usize),
        Value::SharedArrayBuffer(rc) => Some(Rc::as_ptr(rc) as usize),
        _ => None,
    }
}

/// Borrow the raw byte store backing an `ArrayBuffer`/`SharedArrayBuffer`
/// value, if `value` is one of those two variants.
pub fn as_buffer_bytes(value: &Value) -> Option<&Rc<RefCell<Vec<u8>>>> {
    match value {
        Value::ArrayBuffer(rc) | Value::SharedArrayBuffer(rc) => Some(rc),
        _ => None,
    }
}

impl Value {
    /// Construct an array from owned values, with no holes.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items.into_iter().map(Some).collect())))
    }

    /// Construct a plain-literal object from key/value pairs, each property
    /// getting the standard literal descriptor defaults.
    pub fn object(entries: Vec<(&str, Value)>) -> Value {
        let properties = entries
            .into_iter()
            .map(|(k, v)| PropertyEntry::data(k, v))
            .collect();
        Value::Object(Rc::new(RefCell::new(ObjectValue {
            constructor_name: None,
            properties,
        })))
    }

    /// Construct a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }
}
