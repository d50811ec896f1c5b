//! Walks through the dynawire wire format end to end: build a value graph,
//! encode it, inspect the raw bytes, then decode it back and confirm shared
//! references survived the round trip.

use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;

use dynawire::value::{ArraySlot, Value};
use dynawire::{Codec, CodecOptions};

/// Build a sample value graph, serialize it with dynawire, and report on
/// the resulting byte layout.
#[derive(Parser, Debug)]
#[command(name = "wire-format-demo", about = "Exercise the dynawire codec on a sample value graph")]
struct Args {
    /// Number of elements in the demo's packed numeric array.
    #[arg(long, default_value_t = 16)]
    array_len: usize,

    /// Load codec options from a TOML config file instead of using defaults.
    #[arg(long)]
    config: Option<String>,

    /// Print the decoded value graph as JSON instead of the human summary.
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    // 1. Build a small graph: an object with a shared child reachable
    //    through two different properties.
    let shared_child = Value::object(vec![("label", Value::string("shared"))]);
    let root = Value::object(vec![
        ("first", shared_child.clone()),
        ("second", shared_child),
        ("counts", packed_numbers(args.array_len)),
    ]);

    // 2. Build the codec, either from a config file or the documented
    //    defaults.
    let codec = match &args.config {
        Some(path) => Codec::from_config_file(path),
        None => Codec::new(CodecOptions::default()),
    };

    // 3. Encode it.
    let bytes = codec.serialize(&root).expect("encode should succeed");
    println!("encoded {} bytes", bytes.len());
    println!("header: {:02x?}", &bytes[..5]);

    // 4. Decode it back.
    let decoded = codec.deserialize(&bytes).expect("decode should succeed");

    // 5. Confirm the two properties still alias the same object.
    let Value::Object(root_obj) = &decoded else {
        panic!("expected an object at the root");
    };
    let borrowed = root_obj.borrow();
    let (Value::Object(a), Value::Object(b)) = (
        property_value(&borrowed, "first"),
        property_value(&borrowed, "second"),
    ) else {
        panic!("expected both properties to be objects");
    };
    println!("shared reference preserved: {}", Rc::ptr_eq(&a, &b));

    if args.json {
        println!("{}", summarize_as_json(&borrowed));
    }
}

fn packed_numbers(len: usize) -> Value {
    let slots: Vec<ArraySlot> = (0..len).map(|i| Some(Value::Number(i as f64))).collect();
    Value::Array(Rc::new(RefCell::new(slots)))
}

fn property_value(obj: &dynawire::value::ObjectValue, key: &str) -> Value {
    obj.properties
        .iter()
        .find(|p| &*p.key == key)
        .and_then(|p| match &p.value {
            dynawire::value::PropertyValue::Data(v) => Some(v.clone()),
            _ => None,
        })
        .expect("property present")
}

/// A deliberately shallow JSON summary (property names only) — this demo
/// is about the wire format, not a general `Value`-to-JSON converter.
fn summarize_as_json(obj: &dynawire::value::ObjectValue) -> String {
    let keys: Vec<&str> = obj.properties.iter().map(|p| &*p.key).collect();
    serde_json::json!({ "root_keys": keys }).to_string()
}
