//! Type-classification front end (C6): maps a runtime [`Value`] to the
//! wire [`Tag`] that will carry it. A type-directed match, not a runtime
//! reflection call chain (spec §9's design note).

use crate::core::config::CodecOptions;
use crate::numeric_array::{analyze, PackRecommendation};
use crate::tag::Tag;
use crate::value::{ArraySlot, ObjectValue, PropertyValue, Value};

/// ASCII/UTF-8 string length thresholds (spec §4.5): tiny/short/long.
const STRING_TINY_MAX: usize = 16;
const STRING_SHORT_MAX: usize = 256;

/// `true` if every byte of `s` is ASCII.
fn is_ascii(s: &str) -> bool {
    s.is_ascii()
}

/// Classify a string by its effective length (char count if ASCII, byte
/// count otherwise) against the tiny/short/long thresholds, selecting
/// between the ASCII and UTF-8 tag families.
pub fn classify_string(s: &str) -> Tag {
    if s.is_empty() {
        return Tag::StrEmpty;
    }
    if is_ascii(s) {
        match s.len() {
            n if n < STRING_TINY_MAX => Tag::StrAsciiTiny,
            n if n < STRING_SHORT_MAX => Tag::StrAsciiShort,
            _ => Tag::StrAsciiLong,
        }
    } else {
        let byte_len = s.len();
        match byte_len {
            n if n < STRING_TINY_MAX => Tag::StrUtf8Tiny,
            n if n < STRING_SHORT_MAX => Tag::StrUtf8Short,
            _ => Tag::StrUtf8Long,
        }
    }
}

/// Classify a numeric scalar (spec §4.5's Number rules): NaN/+Inf/-Inf/-0
/// get dedicated tags via IEEE-754 bit-pattern inspection; integers that
/// fit i8/i16/i32 get those tags; otherwise f32 if the value survives a
/// round-trip through single precision, else f64.
pub fn classify_number(n: f64) -> Tag {
    if n.is_nan() {
        return Tag::Nan;
    }
    if n == f64::INFINITY {
        return Tag::PosInf;
    }
    if n == f64::NEG_INFINITY {
        return Tag::NegInf;
    }
    if n == 0.0 && n.is_sign_negative() {
        return Tag::NegZero;
    }
    if n.fract() == 0.0 {
        if n >= i8::MIN as f64 && n <= i8::MAX as f64 {
            return Tag::I8;
        }
        if n >= i16::MIN as f64 && n <= i16::MAX as f64 {
            return Tag::I16;
        }
        if n >= i32::MIN as f64 && n <= i32::MAX as f64 {
            return Tag::I32;
        }
        if n >= 0.0 && n <= u32::MAX as f64 {
            return Tag::U32;
        }
    }
    if (n as f32) as f64 == n {
        Tag::F32
    } else {
        Tag::F64
    }
}

/// Classify a big integer by sign and magnitude, per spec §4.5.
pub fn classify_bigint(value: &crate::value::BigIntValue) -> Tag {
    match (value.negative, value.fits_in_i64()) {
        (false, true) => Tag::BigIntPosSmall,
        (true, true) => Tag::BigIntNegSmall,
        (false, false) => Tag::BigIntPosLarge,
        (true, false) => Tag::BigIntNegLarge,
    }
}

/// Count of array slots that are present (not holes).
fn filled_count(slots: &[ArraySlot]) -> usize {
    slots.iter().filter(|s| s.is_some()).count()
}

/// `true` if the array is sparse enough to route to `ARR_SPARSE`: any hole
/// present, or filled ratio below 3/4 (spec §4.5).
fn is_sparse(slots: &[ArraySlot]) -> bool {
    let len = slots.len();
    if len == 0 {
        return false;
    }
    let filled = filled_count(slots);
    let has_hole = filled < len;
    let threshold = (3 * len).div_ceil(4);
    has_hole || filled < threshold
}

/// Classify an array per spec §4.5: empty / sparse / packed-numeric /
/// dense.
pub fn classify_array(slots: &[ArraySlot], opts: &CodecOptions) -> Tag {
    if slots.is_empty() {
        return Tag::ArrEmpty;
    }
    if is_sparse(slots) {
        return Tag::ArrSparse;
    }
    if opts.simd_optimization {
        match analyze(slots) {
            PackRecommendation::PackedI8 => return Tag::ArrPackI8,
            PackRecommendation::PackedI16 => return Tag::ArrPackI16,
            PackRecommendation::PackedI32 => return Tag::ArrPackI32,
            PackRecommendation::PackedF32 => return Tag::ArrPackF32,
            PackRecommendation::PackedF64 => return Tag::ArrPackF64,
            PackRecommendation::Dense => {}
        }
    }
    Tag::ArrDense
}

/// Classify a plain/constructed object body per spec §4.5's property
/// inspection rules: descriptors beat methods beat emptiness beat
/// literal-vs-constructor.
pub fn classify_object(obj: &ObjectValue, opts: &CodecOptions) -> Tag {
    if opts.preserve_property_descriptors
        && obj
            .properties
            .iter()
            .any(|p| !p.has_default_descriptor())
    {
        return Tag::ObjWithDescriptors;
    }
    if obj.properties.iter().any(|p| p.is_method()) {
        return Tag::ObjWithMethods;
    }
    if obj.properties.is_empty() {
        return Tag::ObjEmpty;
    }
    if obj.constructor_name.is_none() {
        Tag::ObjLiteral
    } else {
        Tag::ObjConstructor
    }
}

/// Top-level classifier: maps any [`Value`] to the wire tag that will
/// carry it (spec §4.5). Composite payload shapes are emitted by the
/// writer driver; this function only decides which tag applies.
pub fn classify(value: &Value, opts: &CodecOptions) -> Tag {
    match value {
        Value::Null => Tag::Null,
        Value::Undefined => Tag::Undefined,
        Value::Bool(false) => Tag::False,
        Value::Bool(true) => Tag::True,
        Value::Number(n) => classify_number(*n),
        Value::BigInt(b) => classify_bigint(b),
        Value::String(s) => classify_string(s),
        Value::Array(rc) => classify_array(&rc.borrow(), opts),
        Value::Object(rc) => classify_object(&rc.borrow(), opts),
        Value::Map(_) => Tag::Map,
        Value::Set(_) => Tag::Set,
        Value::ArrayBuffer(_) => Tag::ArrayBuffer,
        Value::SharedArrayBuffer(_) => Tag::SharedArrayBuffer,
        Value::TypedArray(ta) => typed_array_tag(ta.kind),
        Value::DataView(_) => Tag::DataView,
        Value::Date(ts) => {
            if ts.is_finite() {
                Tag::Date
            } else {
                Tag::DateInvalid
            }
        }
        Value::Regex(_) => Tag::Regex,
        Value::Error(e) => error_tag(e.kind),
        Value::Symbol(sym) => symbol_tag(sym),
        Value::Blob(_) => Tag::Blob,
        Value::File(_) => Tag::File,
        // Callables are not serialized directly; only through the
        // method-object body path (spec §4.5's "Callable" rule).
        Value::Function(_) => Tag::Undefined,
    }
}

fn typed_array_tag(kind: crate::value::TypedArrayKind) -> Tag {
    use crate::value::TypedArrayKind as K;
    match kind {
        K::U8 => Tag::TypedU8,
        K::I8 => Tag::TypedI8,
        K::U8Clamped => Tag::TypedU8Clamped,
        K::U16 => Tag::TypedU16,
        K::I16 => Tag::TypedI16,
        K::U32 => Tag::TypedU32,
        K::I32 => Tag::TypedI32,
        K::F32 => Tag::TypedF32,
        K::F64 => Tag::TypedF64,
        K::I64 => Tag::TypedI64,
        K::U64 => Tag::TypedU64,
    }
}

fn error_tag(kind: crate::value::ErrorKind) -> Tag {
    use crate::value::ErrorKind as K;
    match kind {
        K::Plain => Tag::ErrorPlain,
        K::Eval => Tag::ErrorEval,
        K::Range => Tag::ErrorRange,
        K::Reference => Tag::ErrorRef,
        K::Syntax => Tag::ErrorSyntax,
        K::Type => Tag::ErrorType,
        K::Uri => Tag::ErrorUri,
        K::Aggregate => Tag::ErrorAggregate,
        K::Custom => Tag::ErrorCustom,
    }
}

fn symbol_tag(sym: &crate::value::SymbolValue) -> Tag {
    use crate::value::SymbolValue as S;
    match sym {
        S::Global(_) => Tag::SymbolGlobal,
        S::WellKnown(_) => Tag::SymbolWellknown,
        S::NoDescription => Tag::SymbolNoDesc,
        S::Described(_) => Tag::Symbol,
    }
}

/// `true` when a property's value is directly a getter/setter-bearing
/// accessor or a callable, used by the writer to decide whether to
/// silently omit it from a plain body (mirrors the spec §4.6 rule that
/// plain-object bodies filter out callables).
pub fn is_plain_body_key(value: &PropertyValue) -> bool {
    !matches!(value, PropertyValue::Data(Value::Function(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_edge_cases() {
        assert_eq!(classify_number(f64::NAN), Tag::Nan);
        assert_eq!(classify_number(f64::INFINITY), Tag::PosInf);
        assert_eq!(classify_number(f64::NEG_INFINITY), Tag::NegInf);
        assert_eq!(classify_number(-0.0), Tag::NegZero);
        assert_eq!(classify_number(0.0), Tag::I8);
        assert_eq!(classify_number(127.0), Tag::I8);
        assert_eq!(classify_number(128.0), Tag::I16);
        assert_eq!(classify_number(40000.0), Tag::I32);
        assert_eq!(classify_number(0.5), Tag::F32);
        assert_eq!(classify_number(std::f64::consts::PI), Tag::F64);
    }

    #[test]
    fn string_thresholds() {
        assert_eq!(classify_string(""), Tag::StrEmpty);
        assert_eq!(classify_string("hi"), Tag::StrAsciiTiny);
        assert_eq!(classify_string(&"a".repeat(16)), Tag::StrAsciiShort);
        assert_eq!(classify_string(&"a".repeat(256)), Tag::StrAsciiLong);
        assert_eq!(classify_string("héllo"), Tag::StrUtf8Tiny);
    }

    #[test]
    fn array_classification() {
        let opts = CodecOptions::default();
        let empty: Vec<ArraySlot> = vec![];
        assert_eq!(classify_array(&empty, &opts), Tag::ArrEmpty);

        let sparse: Vec<ArraySlot> = vec![Some(Value::Number(1.0)), None, None, None];
        assert_eq!(classify_array(&sparse, &opts), Tag::ArrSparse);

        let dense: Vec<ArraySlot> = vec![
            Some(Value::string("a")),
            Some(Value::string("b")),
            Some(Value::string("c")),
        ];
        assert_eq!(classify_array(&dense, &opts), Tag::ArrDense);

        let packed: Vec<ArraySlot> = (1..=16).map(|i| Some(Value::Number(i as f64))).collect();
        assert_eq!(classify_array(&packed, &opts), Tag::ArrPackI8);
    }

    #[test]
    fn object_classification() {
        let opts = CodecOptions::default();
        let empty = ObjectValue::default();
        assert_eq!(classify_object(&empty, &opts), Tag::ObjEmpty);

        let literal = ObjectValue {
            constructor_name: None,
            properties: vec![crate::value::PropertyEntry::data("a", Value::Number(1.0))],
        };
        assert_eq!(classify_object(&literal, &opts), Tag::ObjLiteral);

        let constructed = ObjectValue {
            constructor_name: Some("Point".into()),
            properties: vec![crate::value::PropertyEntry::data("x", Value::Number(1.0))],
        };
        assert_eq!(classify_object(&constructed, &opts), Tag::ObjConstructor);
    }
}
