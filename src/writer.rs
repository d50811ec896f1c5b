//! Writer driver (C8): walks the value graph, consults the classifier and
//! reference tracker, and emits tagged records via the buffer (spec
//! §4.6/§4.7).
//!
//! Each `serialize` call is an atomic transaction over a fresh [`Buffer`],
//! [`EncodeRefs`] table, and [`CycleSet`] — nothing survives across calls
//! (spec §5).

use crate::buffer::Buffer;
use crate::classify::{self, classify};
use crate::core::config::CodecOptions;
use crate::error::{Error, Result};
use crate::header;
use crate::refs::{children, CycleSet, EncodeRefs, Lookup};
use crate::tag::Tag;
use crate::value::{as_buffer_bytes, buffer_identity, heap_identity, ObjectValue, PropertyValue, Value};

/// Serialize `root` into an owned byte sequence per `opts`. Pure: never
/// mutates `root`, never retains the returned buffer.
pub fn serialize(root: &Value, opts: &CodecOptions) -> Result<Vec<u8>> {
    let mut buf = Buffer::new(opts.memory_pool_size);
    header::write_header(&mut buf);

    let cycles = if opts.detect_circular {
        CycleSet::compute(root)
    } else {
        CycleSet::default()
    };
    let mut refs = EncodeRefs::default();

    write_value(&mut buf, root, opts, &mut refs, &cycles)?;

    let bytes = buf.into_vec();
    crate::log_debug!("serialized value into {} bytes", bytes.len());
    Ok(bytes)
}

fn write_value(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    if let Some(key) = heap_identity(value) {
        if cycles.contains(key) {
            if refs.has_object(key) {
                let id = refs.object_lookup_by_key(key).id();
                buf.write_u8(Tag::CircularRef as u8);
                buf.write_varint(id);
                return Ok(());
            }
            // First sighting of a cyclic node: assign its id now, before
            // descending, then fall through to normal emission (spec §4.6
            // step 1 / §4.9).
            refs.object_lookup_by_key(key);
        } else if opts.deduplication {
            match refs.object_lookup(value) {
                Some(Lookup::Existing(id)) => {
                    buf.write_u8(Tag::Reference as u8);
                    buf.write_varint(id);
                    return Ok(());
                }
                Some(Lookup::Fresh(_)) | None => {}
            }
        }
    }

    if let Value::String(s) = value {
        if opts.deduplication {
            if let Some(lookup) = refs.string_lookup(s) {
                if lookup.is_existing() {
                    buf.write_u8(Tag::StrRef as u8);
                    buf.write_varint(lookup.id());
                    return Ok(());
                }
            }
        }
    }

    if opts.share_array_buffers && buffer_identity(value).is_some() {
        if let Some(lookup) = refs.buffer_lookup(value) {
            if lookup.is_existing() {
                buf.write_u8(Tag::BufferRef as u8);
                buf.write_varint(lookup.id());
                return Ok(());
            }
        }
    }

    let tag = classify(value, opts);
    buf.write_u8(tag as u8);
    emit_payload(buf, value, tag, opts, refs, cycles)
}

fn emit_payload(
    buf: &mut Buffer,
    value: &Value,
    tag: Tag,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    match tag {
        // No-payload groups.
        Tag::Null
        | Tag::Undefined
        | Tag::False
        | Tag::True
        | Tag::Nan
        | Tag::PosInf
        | Tag::NegInf
        | Tag::NegZero
        | Tag::StrEmpty
        | Tag::ArrEmpty
        | Tag::ObjEmpty
        | Tag::DateInvalid
        | Tag::SymbolNoDesc => Ok(()),

        Tag::I8 => {
            let n = as_number(value)?;
            buf.write_u8((n as i64 as i8) as u8);
            Ok(())
        }
        Tag::I16 => {
            buf.write_i16_le(as_number(value)? as i64 as i16);
            Ok(())
        }
        Tag::I32 => {
            buf.write_i32_le(as_number(value)? as i64 as i32);
            Ok(())
        }
        Tag::U32 => {
            buf.write_u32_le(as_number(value)? as u32);
            Ok(())
        }
        Tag::F32 => {
            buf.write_f32_le(as_number(value)? as f32);
            Ok(())
        }
        Tag::F64 => {
            buf.write_f64_le(as_number(value)?);
            Ok(())
        }
        Tag::Varint => {
            buf.write_varint(as_number(value)? as u32);
            Ok(())
        }

        Tag::BigIntPosSmall | Tag::BigIntNegSmall => {
            let big = as_bigint(value)?;
            buf.write_u64_le(big.magnitude_u64());
            Ok(())
        }
        Tag::BigIntPosLarge | Tag::BigIntNegLarge => {
            let big = as_bigint(value)?;
            buf.write_varint(big.magnitude.len() as u32);
            buf.bulk(&big.magnitude);
            Ok(())
        }

        Tag::StrAsciiTiny | Tag::StrUtf8Tiny | Tag::StrAsciiShort | Tag::StrUtf8Short => {
            let s = as_str(value)?;
            buf.write_u8(s.len() as u8);
            buf.bulk(s.as_bytes());
            Ok(())
        }
        Tag::StrAsciiLong | Tag::StrUtf8Long => {
            let s = as_str(value)?;
            buf.write_varint(s.len() as u32);
            buf.bulk(s.as_bytes());
            Ok(())
        }

        Tag::ArrDense => write_dense_array(buf, value, opts, refs, cycles),
        Tag::ArrSparse => write_sparse_array(buf, value, opts, refs, cycles),
        Tag::ArrPackI8 | Tag::ArrPackI16 | Tag::ArrPackI32 | Tag::ArrPackF32 | Tag::ArrPackF64 => {
            write_packed_array(buf, value, tag)
        }

        Tag::ObjPlain | Tag::ObjLiteral => write_plain_body(buf, value, opts, refs, cycles),
        Tag::ObjConstructor => {
            let Value::Object(rc) = value else {
                return Err(Error::unsupported_value("constructor body on non-object"));
            };
            let name = rc
                .borrow()
                .constructor_name
                .clone()
                .unwrap_or_else(|| "".into());
            write_value(buf, &Value::String(name), opts, refs, cycles)?;
            write_plain_body(buf, value, opts, refs, cycles)
        }
        Tag::ObjWithDescriptors => write_descriptor_body(buf, value, opts, refs, cycles),
        Tag::ObjWithMethods => write_method_body(buf, value, opts, refs, cycles),

        Tag::TypedU8
        | Tag::TypedI8
        | Tag::TypedU8Clamped
        | Tag::TypedU16
        | Tag::TypedI16
        | Tag::TypedU32
        | Tag::TypedI32
        | Tag::TypedF32
        | Tag::TypedF64
        | Tag::TypedI64
        | Tag::TypedU64 => write_typed_array(buf, value, opts, refs),
        Tag::DataView => write_data_view(buf, value, opts, refs),

        Tag::ArrayBuffer | Tag::SharedArrayBuffer => {
            let rc = as_buffer_bytes(value)
                .ok_or_else(|| Error::unsupported_value("buffer tag on non-buffer value"))?;
            let bytes = rc.borrow();
            buf.write_varint(bytes.len() as u32);
            buf.bulk(&bytes);
            Ok(())
        }

        Tag::Map => write_map(buf, value, opts, refs, cycles),
        Tag::Set => write_set(buf, value, opts, refs, cycles),

        Tag::Date => {
            let Value::Date(ts) = value else {
                return Err(Error::unsupported_value("date tag on non-date value"));
            };
            buf.write_f64_le(*ts);
            Ok(())
        }

        Tag::ErrorPlain
        | Tag::ErrorEval
        | Tag::ErrorRange
        | Tag::ErrorRef
        | Tag::ErrorSyntax
        | Tag::ErrorType
        | Tag::ErrorUri
        | Tag::ErrorAggregate
        | Tag::ErrorCustom => write_error(buf, value, opts, refs, cycles),

        Tag::Regex => {
            let Value::Regex(r) = value else {
                return Err(Error::unsupported_value("regex tag on non-regex value"));
            };
            write_value(buf, &Value::String(r.source.clone()), opts, refs, cycles)?;
            write_value(buf, &Value::String(r.flags.clone()), opts, refs, cycles)
        }

        Tag::Blob | Tag::File => {
            buf.write_varint(0);
            buf.write_varint(0);
            Ok(())
        }

        Tag::Reference | Tag::StrRef | Tag::BufferRef | Tag::CircularRef => {
            // These are only ever produced by the short-circuit paths in
            // `write_value`, never reached via classify+emit.
            unreachable!("reference tags are emitted directly, not via classify")
        }

        Tag::Symbol | Tag::SymbolGlobal | Tag::SymbolWellknown => write_symbol(buf, value, opts, refs, cycles),

        Tag::FunctionPlaceholder => Ok(()),
    }
}

fn as_number(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(Error::unsupported_value("number tag on non-number value")),
    }
}

fn as_bigint(value: &Value) -> Result<&crate::value::BigIntValue> {
    match value {
        Value::BigInt(b) => Ok(b),
        _ => Err(Error::unsupported_value("bigint tag on non-bigint value")),
    }
}

fn as_str(value: &Value) -> Result<&str> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(Error::unsupported_value("string tag on non-string value")),
    }
}

fn array_slots(value: &Value) -> Result<std::cell::Ref<'_, Vec<Option<Value>>>> {
    match value {
        Value::Array(rc) => Ok(rc.borrow()),
        _ => Err(Error::unsupported_value("array tag on non-array value")),
    }
}

fn write_dense_array(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let slots = array_slots(value)?;
    buf.write_varint(slots.len() as u32);
    for slot in slots.iter() {
        let item = slot.clone().unwrap_or(Value::Undefined);
        write_value(buf, &item, opts, refs, cycles)?;
    }
    Ok(())
}

fn write_sparse_array(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let slots = array_slots(value)?;
    let filled: Vec<(usize, Value)> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.clone().map(|v| (i, v)))
        .collect();
    buf.write_varint(slots.len() as u32);
    buf.write_varint(filled.len() as u32);
    for (index, item) in filled {
        buf.write_varint(index as u32);
        write_value(buf, &item, opts, refs, cycles)?;
    }
    Ok(())
}

fn write_packed_array(buf: &mut Buffer, value: &Value, tag: Tag) -> Result<()> {
    let slots = array_slots(value)?;
    let numbers: Vec<f64> = slots
        .iter()
        .map(|s| match s {
            Some(Value::Number(n)) => Ok(*n),
            _ => Err(Error::unsupported_value("packed array element is not a number")),
        })
        .collect::<Result<_>>()?;
    match tag {
        Tag::ArrPackI8 => buf.write_packed_array(&numbers, 1, |b, &n| b.write_u8((n as i64 as i8) as u8)),
        Tag::ArrPackI16 => buf.write_packed_array(&numbers, 2, |b, &n| b.write_i16_le(n as i64 as i16)),
        Tag::ArrPackI32 => buf.write_packed_array(&numbers, 4, |b, &n| b.write_i32_le(n as i64 as i32)),
        Tag::ArrPackF32 => buf.write_packed_array(&numbers, 4, |b, &n| b.write_f32_le(n as f32)),
        Tag::ArrPackF64 => buf.write_packed_array(&numbers, 8, |b, &n| b.write_f64_le(n)),
        _ => unreachable!(),
    }
    Ok(())
}

fn sorted_plain_keys(obj: &ObjectValue) -> Vec<&crate::value::PropertyEntry> {
    let mut entries: Vec<&crate::value::PropertyEntry> = obj
        .properties
        .iter()
        .filter(|p| classify::is_plain_body_key(&p.value))
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

fn write_plain_body(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Object(rc) = value else {
        return Err(Error::unsupported_value("plain body on non-object"));
    };
    let obj = rc.borrow();
    let entries = sorted_plain_keys(&obj);
    buf.write_varint(entries.len() as u32);
    for entry in entries {
        write_value(buf, &Value::String(entry.key.clone()), opts, refs, cycles)?;
        let data = match &entry.value {
            PropertyValue::Data(v) => v.clone(),
            PropertyValue::Accessor { .. } => Value::Undefined,
        };
        write_value(buf, &data, opts, refs, cycles)?;
    }
    Ok(())
}

fn descriptor_flags(entry: &crate::value::PropertyEntry) -> u8 {
    let mut flags = 0u8;
    if entry.enumerable {
        flags |= 0x01;
    }
    if entry.writable {
        flags |= 0x02;
    }
    if entry.configurable {
        flags |= 0x04;
    }
    if let PropertyValue::Accessor { getter, setter } = &entry.value {
        if getter.is_some() {
            flags |= 0x08;
        }
        if setter.is_some() {
            flags |= 0x10;
        }
    }
    flags
}

fn write_descriptor_body(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Object(rc) = value else {
        return Err(Error::unsupported_value("descriptor body on non-object"));
    };
    let obj = rc.borrow();
    buf.write_varint(obj.properties.len() as u32);
    for entry in &obj.properties {
        write_value(buf, &Value::String(entry.key.clone()), opts, refs, cycles)?;
        buf.write_u8(descriptor_flags(entry));
        match &entry.value {
            PropertyValue::Data(v) => write_value(buf, v, opts, refs, cycles)?,
            PropertyValue::Accessor { getter, setter } => {
                if let Some(g) = getter {
                    write_value(buf, g, opts, refs, cycles)?;
                }
                if let Some(s) = setter {
                    write_value(buf, s, opts, refs, cycles)?;
                }
            }
        }
    }
    Ok(())
}

fn write_method_body(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Object(rc) = value else {
        return Err(Error::unsupported_value("method body on non-object"));
    };
    let obj = rc.borrow();
    buf.write_varint(obj.properties.len() as u32);
    for entry in &obj.properties {
        write_value(buf, &Value::String(entry.key.clone()), opts, refs, cycles)?;
        let is_callable = matches!(&entry.value, PropertyValue::Data(Value::Function(_)));
        buf.write_u8(is_callable as u8);
        if is_callable {
            let PropertyValue::Data(Value::Function(func)) = &entry.value else {
                unreachable!()
            };
            if opts.serialize_functions {
                let source = func.source.clone().unwrap_or_else(|| "".into());
                write_value(buf, &Value::String(source), opts, refs, cycles)?;
                let name = func.name.clone().unwrap_or_else(|| "".into());
                write_value(buf, &Value::String(name), opts, refs, cycles)?;
            } else {
                buf.write_u8(Tag::FunctionPlaceholder as u8);
            }
        } else {
            let data = match &entry.value {
                PropertyValue::Data(v) => v.clone(),
                PropertyValue::Accessor { .. } => Value::Undefined,
            };
            write_value(buf, &data, opts, refs, cycles)?;
        }
    }
    Ok(())
}

fn write_map(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Map(rc) = value else {
        return Err(Error::unsupported_value("map tag on non-map value"));
    };
    let entries = rc.borrow();
    buf.write_varint(entries.len() as u32);
    for (k, v) in entries.iter() {
        write_value(buf, k, opts, refs, cycles)?;
        write_value(buf, v, opts, refs, cycles)?;
    }
    Ok(())
}

fn write_set(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Set(rc) = value else {
        return Err(Error::unsupported_value("set tag on non-set value"));
    };
    let items = rc.borrow();
    buf.write_varint(items.len() as u32);
    for item in items.iter() {
        write_value(buf, item, opts, refs, cycles)?;
    }
    Ok(())
}

/// Shared by typed arrays and data views: look up (or register) the
/// backing buffer's id in the buffer table and report whether this view
/// can piggyback a `BUFFER_REF` on an earlier emission.
fn resolve_buffer_sharing(
    buffer: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
) -> Option<u32> {
    if !opts.share_array_buffers {
        return None;
    }
    match refs.buffer_lookup(buffer) {
        Some(Lookup::Existing(id)) => Some(id),
        _ => None,
    }
}

fn write_typed_array(buf: &mut Buffer, value: &Value, opts: &CodecOptions, refs: &mut EncodeRefs) -> Result<()> {
    let Value::TypedArray(ta) = value else {
        return Err(Error::unsupported_value("typed array tag on non-typed-array value"));
    };
    let elem_size = ta.kind.elem_size();
    if let Some(buffer_id) = resolve_buffer_sharing(&ta.buffer, opts, refs) {
        buf.write_u8(1);
        buf.write_varint(buffer_id);
        buf.write_varint(ta.byte_offset);
        buf.write_varint(ta.length);
        return Ok(());
    }
    // Not shared (or sharing disabled): register this buffer for any
    // later view that might alias it, then write the raw window inline.
    if opts.share_array_buffers {
        refs.buffer_lookup(&ta.buffer);
    }
    buf.write_u8(0);
    buf.write_varint(ta.byte_offset);
    buf.write_varint(ta.length);
    let rc = as_buffer_bytes(&ta.buffer)
        .ok_or_else(|| Error::unsupported_value("typed array buffer is not a byte store"))?;
    let bytes = rc.borrow();
    let start = ta.byte_offset as usize;
    let end = start + ta.length as usize * elem_size;
    let window = bytes
        .get(start..end)
        .ok_or_else(|| Error::unsupported_value("typed array view out of buffer bounds"))?;
    buf.align(elem_size.min(8));
    buf.bulk(window);
    Ok(())
}

fn write_data_view(buf: &mut Buffer, value: &Value, opts: &CodecOptions, refs: &mut EncodeRefs) -> Result<()> {
    let Value::DataView(dv) = value else {
        return Err(Error::unsupported_value("data view tag on non-data-view value"));
    };
    if let Some(buffer_id) = resolve_buffer_sharing(&dv.buffer, opts, refs) {
        buf.write_u8(1);
        buf.write_varint(buffer_id);
        buf.write_varint(dv.byte_offset);
        buf.write_varint(dv.length);
        return Ok(());
    }
    if opts.share_array_buffers {
        refs.buffer_lookup(&dv.buffer);
    }
    buf.write_u8(0);
    buf.write_varint(dv.byte_offset);
    buf.write_varint(dv.length);
    let rc = as_buffer_bytes(&dv.buffer)
        .ok_or_else(|| Error::unsupported_value("data view buffer is not a byte store"))?;
    let bytes = rc.borrow();
    let start = dv.byte_offset as usize;
    let end = start + dv.length as usize;
    let window = bytes
        .get(start..end)
        .ok_or_else(|| Error::unsupported_value("data view out of buffer bounds"))?;
    buf.bulk(window);
    Ok(())
}

fn write_error(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Error(err) = value else {
        return Err(Error::unsupported_value("error tag on non-error value"));
    };
    write_value(buf, &Value::String(err.message.clone()), opts, refs, cycles)?;
    write_value(buf, &Value::String(err.stack.clone()), opts, refs, cycles)?;
    if err.kind == crate::value::ErrorKind::Aggregate {
        let inner_errors = err.errors.borrow();
        buf.write_varint(inner_errors.len() as u32);
        for inner in inner_errors.iter() {
            write_value(buf, inner, opts, refs, cycles)?;
        }
    }
    Ok(())
}

fn write_symbol(
    buf: &mut Buffer,
    value: &Value,
    opts: &CodecOptions,
    refs: &mut EncodeRefs,
    cycles: &CycleSet,
) -> Result<()> {
    let Value::Symbol(sym) = value else {
        return Err(Error::unsupported_value("symbol tag on non-symbol value"));
    };
    match sym.as_ref() {
        crate::value::SymbolValue::Global(key) => {
            write_value(buf, &Value::String(key.clone()), opts, refs, cycles)
        }
        crate::value::SymbolValue::Described(desc) => {
            write_value(buf, &Value::String(desc.clone()), opts, refs, cycles)
        }
        crate::value::SymbolValue::WellKnown(wk) => {
            buf.write_u8(well_known_index(*wk));
            Ok(())
        }
        crate::value::SymbolValue::NoDescription => Ok(()),
    }
}

fn well_known_index(wk: crate::value::WellKnownSymbol) -> u8 {
    use crate::value::WellKnownSymbol as W;
    match wk {
        W::Iterator => 0,
        W::AsyncIterator => 1,
        W::HasInstance => 2,
        W::IsConcatSpreadable => 3,
        W::Species => 4,
        W::ToPrimitive => 5,
        W::ToStringTag => 6,
        W::Unscopables => 7,
        W::Match => 8,
        W::Replace => 9,
        W::Search => 10,
        W::Split => 11,
    }
}

/// Map a raw well-known-symbol index back to the enum variant (used by the
/// reader driver).
pub fn well_known_from_index(index: u8) -> Result<crate::value::WellKnownSymbol> {
    use crate::value::WellKnownSymbol as W;
    Ok(match index {
        0 => W::Iterator,
        1 => W::AsyncIterator,
        2 => W::HasInstance,
        3 => W::IsConcatSpreadable,
        4 => W::Species,
        5 => W::ToPrimitive,
        6 => W::ToStringTag,
        7 => W::Unscopables,
        8 => W::Match,
        9 => W::Replace,
        10 => W::Search,
        11 => W::Split,
        _ => return Err(Error::unsupported_value(format!("unknown well-known symbol index {index}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CodecOptions;
    use crate::value::Value;

    fn opts() -> CodecOptions {
        CodecOptions::default()
    }

    #[test]
    fn primitive_round_trips_header() {
        let bytes = serialize(&Value::Null, &opts()).unwrap();
        assert_eq!(&bytes[0..4], &header::MAGIC.to_le_bytes());
        assert_eq!(bytes[4], header::VERSION);
        assert_eq!(bytes[5], Tag::Null as u8);
    }

    #[test]
    fn integer_aligns_to_two() {
        let bytes = serialize(&Value::Number(1000.0), &opts()).unwrap();
        assert_eq!(bytes[5], Tag::I16 as u8);
        assert_eq!(&bytes[6..8], &1000i16.to_le_bytes());
    }

    #[test]
    fn plain_object_keys_are_sorted() {
        let value = Value::object(vec![("b", Value::Number(1.0)), ("a", Value::Number(2.0))]);
        let bytes = serialize(&value, &opts()).unwrap();
        assert_eq!(bytes[5], Tag::ObjLiteral as u8);
        // count = 2
        assert_eq!(bytes[6], 2);
    }

    #[test]
    fn cyclic_self_reference_emits_circular_ref() {
        let obj = Value::object(vec![]);
        if let Value::Object(rc) = &obj {
            rc.borrow_mut()
                .properties
                .push(crate::value::PropertyEntry::data("self", obj.clone()));
        }
        let bytes = serialize(&obj, &opts()).unwrap();
        assert!(bytes.contains(&(Tag::CircularRef as u8)));
    }

    #[test]
    fn shared_string_emits_string_ref() {
        let s: std::rc::Rc<str> = "repeated-string".into();
        let value = Value::array(vec![Value::String(s.clone()), Value::String(s)]);
        let bytes = serialize(&value, &opts()).unwrap();
        assert!(bytes.contains(&(Tag::StrRef as u8)));
    }
}
