//! Reference-tracking subsystem (C7): identity-keyed tables deduplicating
//! repeated objects/strings/buffers and preserving cyclic structure, plus
//! the two-pass cycle pre-scan that feeds the writer driver.
//!
//! Three independent tables per spec §3.3, one instance per `serialize`/
//! `deserialize` call (spec §5: no cross-call lifetime, no re-entrancy).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::value::{buffer_identity, heap_identity, Value};

/// Encode-side mirror of the three reference tables. Assigns dense,
/// monotonically increasing ids in first-seen order; a repeat lookup
/// returns the already-assigned id without allocating a new one.
#[derive(Default)]
pub struct EncodeRefs {
    objects: HashMap<usize, u32>,
    strings: HashMap<Rc<str>, u32>,
    buffers: HashMap<usize, u32>,
}

/// Outcome of probing a table for a value that may already have an id.
pub enum Lookup {
    /// The value was already assigned `id` on a previous encounter.
    Existing(u32),
    /// The value is new; it has now been assigned `id`.
    Fresh(u32),
}

impl Lookup {
    /// The id, regardless of whether it was fresh or existing.
    pub fn id(&self) -> u32 {
        match self {
            Lookup::Existing(id) | Lookup::Fresh(id) => *id,
        }
    }

    /// `true` if this value had already been seen.
    pub fn is_existing(&self) -> bool {
        matches!(self, Lookup::Existing(_))
    }
}

impl EncodeRefs {
    /// Look up (or assign) an id for a heap value in the object/array/
    /// collection table. Returns `None` if `value` has no heap identity.
    pub fn object_lookup(&mut self, value: &Value) -> Option<Lookup> {
        let key = heap_identity(value)?;
        Some(self.object_lookup_by_key(key))
    }

    /// Look up (or assign) an id by a pre-computed identity key, without
    /// requiring ownership of a `Value`. Used by the pre-walk and by cycle
    /// realization, where the shell's id must be assigned before its
    /// contents are walked.
    pub fn object_lookup_by_key(&mut self, key: usize) -> Lookup {
        if let Some(&id) = self.objects.get(&key) {
            Lookup::Existing(id)
        } else {
            let id = self.objects.len() as u32;
            self.objects.insert(key, id);
            Lookup::Fresh(id)
        }
    }

    /// `true` if a heap value already has an assigned object-table id.
    pub fn has_object(&self, key: usize) -> bool {
        self.objects.contains_key(&key)
    }

    /// Look up (or assign) an id in the string table. Per spec §3.3, only
    /// strings longer than 3 characters participate in deduplication.
    pub fn string_lookup(&mut self, s: &Rc<str>) -> Option<Lookup> {
        if s.chars().count() <= 3 {
            return None;
        }
        if let Some(&id) = self.strings.get(s) {
            Some(Lookup::Existing(id))
        } else {
            let id = self.strings.len() as u32;
            self.strings.insert(s.clone(), id);
            Some(Lookup::Fresh(id))
        }
    }

    /// Look up (or assign) an id in the buffer table, keyed by the
    /// contiguous byte store's identity.
    pub fn buffer_lookup(&mut self, value: &Value) -> Option<Lookup> {
        let key = buffer_identity(value)?;
        if let Some(&id) = self.buffers.get(&key) {
            Some(Lookup::Existing(id))
        } else {
            let id = self.buffers.len() as u32;
            self.buffers.insert(key, id);
            Some(Lookup::Fresh(id))
        }
    }
}

/// The set of heap nodes discovered by the pre-walk to participate in at
/// least one back-edge (spec glossary: "cycle set").
#[derive(Default)]
pub struct CycleSet {
    members: HashSet<usize>,
}

impl CycleSet {
    /// `true` if `key` was discovered to be part of a cycle.
    pub fn contains(&self, key: usize) -> bool {
        self.members.contains(&key)
    }

    /// Run the depth-first pre-walk described in spec §4.6: mark every
    /// heap node re-encountered on the current path. Tolerates
    /// property-access failures by simply not recursing further on a
    /// value it cannot inspect — this codec's `Value` graph cannot fail to
    /// read a property the way a host getter can, so there is nothing to
    /// swallow here beyond bottoming out the recursion.
    pub fn compute(root: &Value) -> CycleSet {
        let mut set = CycleSet::default();
        let mut on_path: HashSet<usize> = HashSet::new();
        walk(root, &mut on_path, &mut set);
        set
    }
}

fn walk(value: &Value, on_path: &mut HashSet<usize>, cycles: &mut CycleSet) {
    let Some(key) = heap_identity(value) else {
        return;
    };
    if on_path.contains(&key) {
        cycles.members.insert(key);
        return;
    }
    on_path.insert(key);
    for child in children(value) {
        walk(&child, on_path, cycles);
    }
    on_path.remove(&key);
}

/// Enumerate the direct heap-graph children of `value`, the edges the
/// pre-walk and main walk traverse (spec §3.4). Buffers backing typed
/// arrays/data views are included since a cycle could in principle be
/// constructed through a container that itself holds a typed array that
/// aliases back to an ancestor buffer-owning object; walking them here
/// costs nothing since buffers have no children of their own.
pub fn children(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(rc) => rc.borrow().iter().flatten().cloned().collect(),
        Value::Object(rc) => rc
            .borrow()
            .properties
            .iter()
            .flat_map(|p| match &p.value {
                crate::value::PropertyValue::Data(v) => vec![v.clone()],
                crate::value::PropertyValue::Accessor { getter, setter } => {
                    getter.iter().chain(setter.iter()).cloned().collect()
                }
            })
            .collect(),
        Value::Map(rc) => rc
            .borrow()
            .iter()
            .flat_map(|(k, v)| [k.clone(), v.clone()])
            .collect(),
        Value::Set(rc) => rc.borrow().clone(),
        Value::TypedArray(ta) => vec![ta.buffer.clone()],
        Value::DataView(dv) => vec![dv.buffer.clone()],
        Value::Error(err) => err.errors.borrow().clone(),
        _ => Vec::new(),
    }
}

/// Decode-side mirror of the three reference tables: dense vectors indexed
/// by id, populated in the same first-seen order the encoder used.
#[derive(Default)]
pub struct DecodeRefs {
    objects: Vec<Value>,
    strings: Vec<Rc<str>>,
    buffers: Vec<Value>,
}

impl DecodeRefs {
    /// Reserve the next object-table slot with a placeholder shell,
    /// returning its id. Used before descending into a container's
    /// children so that nested back-references can resolve (spec §4.8
    /// step 4 / §4.9).
    pub fn push_object(&mut self, shell: Value) -> u32 {
        let id = self.objects.len() as u32;
        self.objects.push(shell);
        id
    }

    /// Fetch the object at `id`, failing if out of range.
    pub fn get_object(&self, id: u32) -> crate::error::Result<Value> {
        self.objects
            .get(id as usize)
            .cloned()
            .ok_or(crate::error::Error::InvalidReference {
                id,
                table_len: self.objects.len(),
            })
    }

    /// Number of entries currently in the object table.
    pub fn object_len(&self) -> usize {
        self.objects.len()
    }

    /// Append a string to the string table, returning its id.
    pub fn push_string(&mut self, s: Rc<str>) -> u32 {
        let id = self.strings.len() as u32;
        self.strings.push(s);
        id
    }

    /// Fetch the string at `id`, failing if out of range.
    pub fn get_string(&self, id: u32) -> crate::error::Result<Rc<str>> {
        self.strings
            .get(id as usize)
            .cloned()
            .ok_or(crate::error::Error::InvalidReference {
                id,
                table_len: self.strings.len(),
            })
    }

    /// Append a buffer value to the buffer table, returning its id.
    pub fn push_buffer(&mut self, buffer: Value) -> u32 {
        let id = self.buffers.len() as u32;
        self.buffers.push(buffer);
        id
    }

    /// Fetch the buffer at `id`, failing if out of range.
    pub fn get_buffer(&self, id: u32) -> crate::error::Result<Value> {
        self.buffers
            .get(id as usize)
            .cloned()
            .ok_or(crate::error::Error::InvalidReference {
                id,
                table_len: self.buffers.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn repeated_string_over_three_chars_dedups() {
        let mut refs = EncodeRefs::default();
        let a: Rc<str> = "hello".into();
        let b: Rc<str> = "hello".into();
        let first = refs.string_lookup(&a).unwrap();
        let second = refs.string_lookup(&b).unwrap();
        assert!(!first.is_existing());
        assert!(second.is_existing());
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn short_strings_never_dedup() {
        let mut refs = EncodeRefs::default();
        let a: Rc<str> = "abc".into();
        assert!(refs.string_lookup(&a).is_none());
    }

    #[test]
    fn cycle_set_detects_self_reference() {
        let obj = Value::object(vec![]);
        if let Value::Object(rc) = &obj {
            rc.borrow_mut()
                .properties
                .push(crate::value::PropertyEntry::data("self", obj.clone()));
        }
        let set = CycleSet::compute(&obj);
        let key = heap_identity(&obj).unwrap();
        assert!(set.contains(key));
    }

    #[test]
    fn acyclic_graph_has_empty_cycle_set() {
        let child = Value::object(vec![("x", Value::Number(1.0))]);
        let root = Value::object(vec![("child", child)]);
        let set = CycleSet::compute(&root);
        assert!(set.members.is_empty());
    }

    #[test]
    fn shared_non_cyclic_node_is_not_in_cycle_set() {
        let shared = Value::object(vec![("v", Value::Number(1.0))]);
        let root = Value::array(vec![shared.clone(), shared.clone()]);
        let set = CycleSet::compute(&root);
        assert!(set.members.is_empty());
    }
}
