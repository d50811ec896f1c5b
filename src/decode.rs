//! Reader driver (C9): the inverse of the writer driver. Dispatches on tag,
//! reconstructs values via [`crate::reader::Reader`], and maintains the
//! decode-side mirror of the three reference tables so that forward
//! references into cyclic or shared structure resolve correctly (spec
//! §4.8/§4.9).
//!
//! The decode side ignores [`CodecOptions`] entirely: "disabling any option
//! only weakens the encoder; the decoder must accept any output from any
//! configuration" (spec §6.2). Concretely this means every first-seen heap
//! object, string longer than three characters, and buffer is registered
//! into its mirror table unconditionally — if the encoder that produced
//! this blob never emitted a matching `REFERENCE`/`STRING_REF`/`BUFFER_REF`,
//! the registration is simply never looked up again, and costs nothing.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::header;
use crate::reader::Reader;
use crate::refs::DecodeRefs;
use crate::tag::{Group, Tag};
use crate::value::{
    ArraySlot, BigIntValue, DataView, ErrorKind, ErrorValue, FunctionValue, ObjectValue,
    PropertyEntry, PropertyValue, RegexValue, SymbolValue, TypedArray, TypedArrayKind, Value,
};
use crate::writer::well_known_from_index;

/// Read and validate the header, then decode exactly one root value.
pub fn deserialize(bytes: &[u8]) -> Result<Value> {
    let mut reader = Reader::new(bytes);
    header::read_header(&mut reader)?;
    let mut refs = DecodeRefs::default();
    let value = decode_value(&mut reader, &mut refs)?;
    crate::log_debug!("deserialized {} bytes", bytes.len());
    Ok(value)
}

/// Read one tag byte and decode the value it introduces.
fn decode_value(reader: &mut Reader, refs: &mut DecodeRefs) -> Result<Value> {
    let byte = reader.read_u8()?;
    let tag = Tag::from_u8(byte)?;
    decode_tagged(reader, tag, refs)
}

/// Decode a value given an already-consumed tag byte. Split out from
/// [`decode_value`] so the method-object body decoder (which must peek a
/// raw byte to distinguish a `FUNCTION_PLACEHOLDER` marker from a full
/// source-text string) can resume the normal dispatch once it knows the
/// peeked byte is a real tag.
fn decode_tagged(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    match tag {
        Tag::Reference => {
            let id = reader.read_varint()?;
            refs.get_object(id)
        }
        Tag::StrRef => {
            let id = reader.read_varint()?;
            Ok(Value::String(refs.get_string(id)?))
        }
        Tag::BufferRef => {
            let id = reader.read_varint()?;
            refs.get_buffer(id)
        }
        Tag::CircularRef => {
            // The referenced slot holds the in-construction shell; handing
            // back the same `Value` (sharing the underlying `Rc`) realises
            // the back-edge (spec §4.9).
            let id = reader.read_varint()?;
            refs.get_object(id)
        }
        _ => decode_payload(reader, tag, refs),
    }
}

fn empty_as_none(s: Rc<str>) -> Option<Rc<str>> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn expect_string(value: Value) -> Result<Rc<str>> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(Error::unsupported_value("expected a string value")),
    }
}

fn decode_string_field(reader: &mut Reader, refs: &mut DecodeRefs) -> Result<Rc<str>> {
    expect_string(decode_value(reader, refs)?)
}

fn decode_payload(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    match tag.group() {
        Group::Primitive => decode_primitive(tag),
        Group::Number => decode_number(reader, tag),
        Group::BigInt => decode_bigint(reader, tag),
        Group::String => decode_string(reader, tag, refs),
        Group::Array => decode_array(reader, tag, refs),
        Group::Object => decode_object(reader, tag, refs),
        Group::Typed => decode_typed(reader, tag, refs),
        Group::Buffer => decode_buffer(reader, tag, refs),
        Group::Collection => decode_collection(reader, tag, refs),
        Group::Date => decode_date(reader, tag),
        Group::Error => decode_error(reader, tag, refs),
        Group::Regex => decode_regex(reader, refs),
        Group::Binary => decode_binary(reader, tag, refs),
        Group::Special => decode_symbol(reader, tag, refs),
        // `FUNCTION_PLACEHOLDER` only ever appears inline inside a
        // method-object body, consumed directly by `decode_method_body`;
        // reaching it here means it was the outermost tag of a value, which
        // never happens on a well-formed wire (callables are never
        // top-level encoded values, spec §4.5).
        Group::Extension | Group::Reference => Err(Error::unsupported_value(format!(
            "tag {:#04x} cannot appear as a standalone value",
            tag as u8
        ))),
    }
}

fn decode_primitive(tag: Tag) -> Result<Value> {
    Ok(match tag {
        Tag::Null => Value::Null,
        Tag::Undefined => Value::Undefined,
        Tag::False => Value::Bool(false),
        Tag::True => Value::Bool(true),
        _ => unreachable!("non-primitive tag routed to decode_primitive"),
    })
}

fn decode_number(reader: &mut Reader, tag: Tag) -> Result<Value> {
    let n = match tag {
        Tag::I8 => (reader.read_u8()? as i8) as f64,
        Tag::I16 => reader.read_i16_le()? as f64,
        Tag::I32 => reader.read_i32_le()? as f64,
        Tag::U32 => reader.read_u32_le()? as f64,
        Tag::F32 => reader.read_f32_le()? as f64,
        Tag::F64 => reader.read_f64_le()?,
        Tag::Nan => f64::NAN,
        Tag::PosInf => f64::INFINITY,
        Tag::NegInf => f64::NEG_INFINITY,
        Tag::NegZero => -0.0,
        Tag::Varint => reader.read_varint()? as f64,
        _ => unreachable!("non-number tag routed to decode_number"),
    };
    Ok(Value::Number(n))
}

fn decode_bigint(reader: &mut Reader, tag: Tag) -> Result<Value> {
    let negative = matches!(tag, Tag::BigIntNegSmall | Tag::BigIntNegLarge);
    let big = match tag {
        Tag::BigIntPosSmall | Tag::BigIntNegSmall => {
            let magnitude = reader.read_u64_le()?;
            BigIntValue::from_parts(negative, magnitude.to_be_bytes().to_vec())
        }
        Tag::BigIntPosLarge | Tag::BigIntNegLarge => {
            let len = reader.read_varint()? as usize;
            let bytes = reader.read_bulk(len)?.to_vec();
            BigIntValue::from_parts(negative, bytes)
        }
        _ => unreachable!("non-bigint tag routed to decode_bigint"),
    };
    Ok(Value::BigInt(big))
}

/// Decode a full string payload and, if it is long enough to have
/// participated in deduplication (spec §3.3), register it into the mirror
/// table unconditionally — see the module doc comment for why this does not
/// consult any option. This is the *only* place strings are registered:
/// a string reached via `STR_REF` is already registered by definition, and
/// registering it again here would assign it a second, wrong id and desync
/// every subsequent `STR_REF` in the stream.
fn decode_string(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let bytes = match tag {
        Tag::StrEmpty => Vec::new(),
        Tag::StrAsciiTiny | Tag::StrAsciiShort | Tag::StrUtf8Tiny | Tag::StrUtf8Short => {
            let len = reader.read_u8()? as usize;
            reader.read_bulk(len)?.to_vec()
        }
        Tag::StrAsciiLong | Tag::StrUtf8Long => {
            let len = reader.read_varint()? as usize;
            reader.read_bulk(len)?.to_vec()
        }
        _ => unreachable!("non-string tag routed to decode_string"),
    };
    let s: Rc<str> = String::from_utf8(bytes)
        .map_err(|e| Error::unsupported_value(format!("invalid utf-8 string payload: {e}")))?
        .into();
    if s.chars().count() > 3 {
        refs.push_string(s.clone());
    }
    Ok(Value::String(s))
}

fn decode_array(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let shell: Rc<RefCell<Vec<ArraySlot>>> = Rc::new(RefCell::new(Vec::new()));
    let shell_value = Value::Array(shell.clone());
    refs.push_object(shell_value.clone());

    match tag {
        Tag::ArrEmpty => {}
        Tag::ArrDense => {
            let len = reader.read_varint()? as usize;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                let v = decode_value(reader, refs)?;
                items.push(Some(v));
            }
            *shell.borrow_mut() = items;
        }
        Tag::ArrSparse => {
            let total_len = reader.read_varint()? as usize;
            let filled_count = reader.read_varint()? as usize;
            let mut items: Vec<ArraySlot> = vec![None; total_len];
            for _ in 0..filled_count {
                let index = reader.read_varint()? as usize;
                let v = decode_value(reader, refs)?;
                if index >= total_len {
                    return Err(Error::unsupported_value(
                        "sparse array index beyond declared length",
                    ));
                }
                items[index] = Some(v);
            }
            *shell.borrow_mut() = items;
        }
        Tag::ArrPackI8 | Tag::ArrPackI16 | Tag::ArrPackI32 | Tag::ArrPackF32 | Tag::ArrPackF64 => {
            let numbers = decode_packed_numbers(reader, tag)?;
            *shell.borrow_mut() = numbers.into_iter().map(|n| Some(Value::Number(n))).collect();
        }
        _ => unreachable!("non-array tag routed to decode_array"),
    }
    Ok(shell_value)
}

fn decode_packed_numbers(reader: &mut Reader, tag: Tag) -> Result<Vec<f64>> {
    match tag {
        Tag::ArrPackI8 => reader.read_packed_array(1, |r| Ok((r.read_u8()? as i8) as f64)),
        Tag::ArrPackI16 => reader.read_packed_array(2, |r| Ok(r.read_i16_le()? as f64)),
        Tag::ArrPackI32 => reader.read_packed_array(4, |r| Ok(r.read_i32_le()? as f64)),
        Tag::ArrPackF32 => reader.read_packed_array(4, |r| Ok(r.read_f32_le()? as f64)),
        Tag::ArrPackF64 => reader.read_packed_array(8, |r| r.read_f64_le()),
        _ => unreachable!(),
    }
}

fn decode_object(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let shell: Rc<RefCell<ObjectValue>> = Rc::new(RefCell::new(ObjectValue::default()));
    let shell_value = Value::Object(shell.clone());
    refs.push_object(shell_value.clone());

    match tag {
        Tag::ObjEmpty => {}
        // spec §9 Open Question (a): the classifier only ever emits
        // `OBJ_LITERAL`, but the reader must also accept `OBJ_PLAIN` —
        // both decode through the identical plain-body path.
        Tag::ObjPlain | Tag::ObjLiteral => decode_plain_body(reader, refs, &shell)?,
        Tag::ObjConstructor => {
            let name = decode_string_field(reader, refs)?;
            shell.borrow_mut().constructor_name = empty_as_none(name);
            decode_plain_body(reader, refs, &shell)?;
        }
        Tag::ObjWithDescriptors => decode_descriptor_body(reader, refs, &shell)?,
        Tag::ObjWithMethods => decode_method_body(reader, refs, &shell)?,
        _ => unreachable!("non-object tag routed to decode_object"),
    }
    Ok(shell_value)
}

fn decode_plain_body(
    reader: &mut Reader,
    refs: &mut DecodeRefs,
    shell: &Rc<RefCell<ObjectValue>>,
) -> Result<()> {
    let count = reader.read_varint()?;
    for _ in 0..count {
        let key = decode_string_field(reader, refs)?;
        let value = decode_value(reader, refs)?;
        shell.borrow_mut().properties.push(PropertyEntry::data(key, value));
    }
    Ok(())
}

fn decode_descriptor_body(
    reader: &mut Reader,
    refs: &mut DecodeRefs,
    shell: &Rc<RefCell<ObjectValue>>,
) -> Result<()> {
    let count = reader.read_varint()?;
    for _ in 0..count {
        let key = decode_string_field(reader, refs)?;
        let flags = reader.read_u8()?;
        let enumerable = flags & 0x01 != 0;
        let writable = flags & 0x02 != 0;
        let configurable = flags & 0x04 != 0;
        let has_getter = flags & 0x08 != 0;
        let has_setter = flags & 0x10 != 0;

        let value = if has_getter || has_setter {
            let getter = if has_getter {
                let v = decode_value(reader, refs)?;
                Some(v)
            } else {
                None
            };
            let setter = if has_setter {
                let v = decode_value(reader, refs)?;
                Some(v)
            } else {
                None
            };
            PropertyValue::Accessor { getter, setter }
        } else {
            let v = decode_value(reader, refs)?;
            PropertyValue::Data(v)
        };

        shell.borrow_mut().properties.push(PropertyEntry {
            key,
            value,
            enumerable,
            writable,
            configurable,
        });
    }
    Ok(())
}

fn decode_method_body(
    reader: &mut Reader,
    refs: &mut DecodeRefs,
    shell: &Rc<RefCell<ObjectValue>>,
) -> Result<()> {
    let count = reader.read_varint()?;
    for _ in 0..count {
        let key = decode_string_field(reader, refs)?;
        let is_callable = reader.read_u8()? != 0;
        let value = if is_callable {
            let peek = reader.read_u8()?;
            let peek_tag = Tag::from_u8(peek)?;
            if peek_tag == Tag::FunctionPlaceholder {
                Value::Function(Rc::new(FunctionValue {
                    name: None,
                    source: None,
                }))
            } else {
                let source = expect_string(decode_tagged(reader, peek_tag, refs)?)?;
                let name = decode_string_field(reader, refs)?;
                Value::Function(Rc::new(FunctionValue {
                    name: empty_as_none(name),
                    source: empty_as_none(source),
                }))
            }
        } else {
            let v = decode_value(reader, refs)?;
            v
        };
        shell.borrow_mut().properties.push(PropertyEntry::data(key, value));
    }
    Ok(())
}

fn typed_array_kind(tag: Tag) -> TypedArrayKind {
    match tag {
        Tag::TypedU8 => TypedArrayKind::U8,
        Tag::TypedI8 => TypedArrayKind::I8,
        Tag::TypedU8Clamped => TypedArrayKind::U8Clamped,
        Tag::TypedU16 => TypedArrayKind::U16,
        Tag::TypedI16 => TypedArrayKind::I16,
        Tag::TypedU32 => TypedArrayKind::U32,
        Tag::TypedI32 => TypedArrayKind::I32,
        Tag::TypedF32 => TypedArrayKind::F32,
        Tag::TypedF64 => TypedArrayKind::F64,
        Tag::TypedI64 => TypedArrayKind::I64,
        Tag::TypedU64 => TypedArrayKind::U64,
        _ => unreachable!("non-typed-array tag routed to typed_array_kind"),
    }
}

/// Read the shared `(share-flag, [buffer_ref], byte_offset, length, [bytes])`
/// prefix common to typed arrays and data views (spec §4.6), returning the
/// resolved backing buffer value and the declared byte offset/length.
fn decode_view_prefix(
    reader: &mut Reader,
    refs: &mut DecodeRefs,
    elem_size: usize,
) -> Result<(Value, u32, u32)> {
    let shared = reader.read_u8()? != 0;
    if shared {
        let buffer_id = reader.read_varint()?;
        let byte_offset = reader.read_varint()?;
        let length = reader.read_varint()?;
        let buffer = refs.get_buffer(buffer_id)?;
        Ok((buffer, byte_offset, length))
    } else {
        let byte_offset = reader.read_varint()?;
        let length = reader.read_varint()?;
        reader.align(elem_size.min(8))?;
        let byte_len = length as usize * elem_size;
        let bytes = reader.read_bulk(byte_len)?.to_vec();
        let buffer = Value::ArrayBuffer(Rc::new(RefCell::new(bytes)));
        refs.push_buffer(buffer.clone());
        Ok((buffer, byte_offset, length))
    }
}

fn decode_typed(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    if tag == Tag::DataView {
        let (buffer, byte_offset, length) = decode_view_prefix(reader, refs, 1)?;
        let value = Value::DataView(Rc::new(DataView {
            buffer,
            byte_offset,
            length,
        }));
        refs.push_object(value.clone());
        return Ok(value);
    }
    let kind = typed_array_kind(tag);
    let (buffer, byte_offset, length) = decode_view_prefix(reader, refs, kind.elem_size())?;
    let value = Value::TypedArray(Rc::new(TypedArray {
        kind,
        buffer,
        byte_offset,
        length,
    }));
    refs.push_object(value.clone());
    Ok(value)
}

fn decode_buffer(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let len = reader.read_varint()? as usize;
    let bytes = reader.read_bulk(len)?.to_vec();
    let value = match tag {
        Tag::ArrayBuffer => Value::ArrayBuffer(Rc::new(RefCell::new(bytes))),
        Tag::SharedArrayBuffer => Value::SharedArrayBuffer(Rc::new(RefCell::new(bytes))),
        _ => unreachable!("non-buffer tag routed to decode_buffer"),
    };
    refs.push_buffer(value.clone());
    Ok(value)
}

fn decode_collection(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    match tag {
        Tag::Map => {
            let shell: Rc<RefCell<Vec<(Value, Value)>>> = Rc::new(RefCell::new(Vec::new()));
            let shell_value = Value::Map(shell.clone());
            refs.push_object(shell_value.clone());
            let count = reader.read_varint()?;
            for _ in 0..count {
                let k = decode_value(reader, refs)?;
                let v = decode_value(reader, refs)?;
                shell.borrow_mut().push((k, v));
            }
            Ok(shell_value)
        }
        Tag::Set => {
            let shell: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
            let shell_value = Value::Set(shell.clone());
            refs.push_object(shell_value.clone());
            let count = reader.read_varint()?;
            for _ in 0..count {
                let v = decode_value(reader, refs)?;
                shell.borrow_mut().push(v);
            }
            Ok(shell_value)
        }
        _ => unreachable!("non-collection tag routed to decode_collection"),
    }
}

fn decode_date(reader: &mut Reader, tag: Tag) -> Result<Value> {
    match tag {
        Tag::Date => Ok(Value::Date(reader.read_f64_le()?)),
        Tag::DateInvalid => Ok(Value::Date(f64::NAN)),
        _ => unreachable!("non-date tag routed to decode_date"),
    }
}

fn decode_error(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let kind = match tag {
        Tag::ErrorPlain => ErrorKind::Plain,
        Tag::ErrorEval => ErrorKind::Eval,
        Tag::ErrorRange => ErrorKind::Range,
        Tag::ErrorRef => ErrorKind::Reference,
        Tag::ErrorSyntax => ErrorKind::Syntax,
        Tag::ErrorType => ErrorKind::Type,
        Tag::ErrorUri => ErrorKind::Uri,
        Tag::ErrorAggregate => ErrorKind::Aggregate,
        Tag::ErrorCustom => ErrorKind::Custom,
        _ => unreachable!("non-error tag routed to decode_error"),
    };
    let message = decode_string_field(reader, refs)?;
    let stack = decode_string_field(reader, refs)?;
    let value = Value::Error(Rc::new(ErrorValue {
        kind,
        message,
        stack,
        errors: RefCell::new(Vec::new()),
    }));
    // Register the shell before descending into nested errors so that a
    // back-reference to this aggregate (spec §4.8 step 4) resolves to the
    // same id the encoder assigned it, before its payload was emitted.
    refs.push_object(value.clone());
    if kind == ErrorKind::Aggregate {
        let count = reader.read_varint()?;
        let mut errors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let inner = decode_value(reader, refs)?;
            errors.push(inner);
        }
        let Value::Error(err) = &value else {
            unreachable!()
        };
        *err.errors.borrow_mut() = errors;
    }
    Ok(value)
}

fn decode_regex(reader: &mut Reader, refs: &mut DecodeRefs) -> Result<Value> {
    let source = decode_string_field(reader, refs)?;
    let flags = decode_string_field(reader, refs)?;
    let value = Value::Regex(Rc::new(RegexValue { source, flags }));
    refs.push_object(value.clone());
    Ok(value)
}

fn decode_binary(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    // Blob/File payloads are an unspecified extension slot (spec §9, Open
    // Question b): always two zero varints, content undefined.
    reader.read_varint()?;
    reader.read_varint()?;
    let value = match tag {
        Tag::Blob => Value::Blob(Rc::new(crate::value::BlobValue)),
        Tag::File => Value::File(Rc::new(crate::value::FileValue { name: None })),
        _ => unreachable!("non-binary tag routed to decode_binary"),
    };
    refs.push_object(value.clone());
    Ok(value)
}

fn decode_symbol(reader: &mut Reader, tag: Tag, refs: &mut DecodeRefs) -> Result<Value> {
    let sym = match tag {
        Tag::SymbolGlobal => {
            let key = decode_string_field(reader, refs)?;
            SymbolValue::Global(key)
        }
        Tag::SymbolWellknown => {
            let index = reader.read_u8()?;
            SymbolValue::WellKnown(well_known_from_index(index)?)
        }
        Tag::SymbolNoDesc => SymbolValue::NoDescription,
        Tag::Symbol => {
            let desc = decode_string_field(reader, refs)?;
            SymbolValue::Described(desc)
        }
        _ => unreachable!("non-symbol tag routed to decode_symbol"),
    };
    let value = Value::Symbol(Rc::new(sym));
    refs.push_object(value.clone());
    Ok(value)
}
