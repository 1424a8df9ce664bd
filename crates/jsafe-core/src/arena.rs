//! The [`Arena`] owns every value and serialized string.
//!
//! The arena keeps the tree a strict ownership forest: each value is either a
//! root (owned by the caller) or owned by exactly one container. Attaching a
//! value moves it from the caller into a container; releasing a root tears
//! down its whole subtree; [`Arena::sweep`] releases everything at once.

use std::borrow::Cow;

use tracing::{debug, trace, warn};

use crate::alloc;
use crate::error::{Error, Expected, Result};
use crate::handle::{StringId, ValueId};
use crate::serialize::{self, PrettyOptions};
use crate::slots::Slots;
use crate::store::{ArrayStore, ObjectStore};
use crate::text::Text;
use crate::value::{Kind, Value};

/// Initial slot reservations for a new arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Value slots to reserve up front. Default is 64.
    pub value_capacity: usize,
    /// Serialized-string slots to reserve up front. Default is 8.
    pub string_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            value_capacity: 64,
            string_capacity: 8,
        }
    }
}

impl ArenaConfig {
    pub fn with_value_capacity(mut self, capacity: usize) -> Self {
        self.value_capacity = capacity;
        self
    }

    pub fn with_string_capacity(mut self, capacity: usize) -> Self {
        self.string_capacity = capacity;
        self
    }
}

/// Live allocation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub live_values: usize,
    pub live_strings: usize,
    /// Live values not owned by any container.
    pub roots: usize,
}

/// What a [`Arena::sweep`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub values: usize,
    pub strings: usize,
}

#[derive(Debug)]
struct Node {
    value: Value,
    parent: Option<ValueId>,
}

/// Owner of every value and serialized string, addressed by generational ids.
pub struct Arena {
    nodes: Slots<Node>,
    strings: Slots<Text>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::with_config(&ArenaConfig::default())
    }

    pub fn with_config(config: &ArenaConfig) -> Self {
        Self {
            nodes: Slots::with_capacity(config.value_capacity),
            strings: Slots::with_capacity(config.string_capacity),
        }
    }

    // ---- Construction ----

    fn alloc(&mut self, value: Value) -> ValueId {
        let kind = value.kind();
        let raw = alloc::ensure(self.nodes.insert(Node { value, parent: None }));
        let id = ValueId::from_parts(raw);
        trace!(?id, %kind, "allocated value");
        id
    }

    pub fn new_null(&mut self) -> ValueId {
        self.alloc(Value::Null)
    }

    pub fn new_bool(&mut self, b: bool) -> ValueId {
        self.alloc(Value::Bool(b))
    }

    pub fn new_number(&mut self, n: f64) -> ValueId {
        self.alloc(Value::Number(n))
    }

    /// Copies `bytes` into a new string value.
    pub fn new_text(&mut self, bytes: &[u8]) -> ValueId {
        let text = alloc::ensure(Text::try_new(bytes));
        self.alloc(Value::Text(text))
    }

    pub fn new_object(&mut self) -> ValueId {
        self.alloc(Value::Object(ObjectStore::default()))
    }

    pub fn new_array(&mut self) -> ValueId {
        self.alloc(Value::Array(ArrayStore::default()))
    }

    // ---- Lookup ----

    fn node(&self, id: ValueId) -> Result<&Node> {
        id.parts()
            .and_then(|raw| self.nodes.get(raw))
            .ok_or(Error::InvalidHandle)
    }

    fn node_mut(&mut self, id: ValueId) -> Result<&mut Node> {
        id.parts()
            .and_then(|raw| self.nodes.get_mut(raw))
            .ok_or(Error::InvalidHandle)
    }

    pub fn value(&self, id: ValueId) -> Result<&Value> {
        self.node(id).map(|node| &node.value)
    }

    /// Kind of a live value; `None` for absent or stale ids. Never fails.
    pub fn kind(&self, id: ValueId) -> Option<Kind> {
        self.node(id).ok().map(|node| node.value.kind())
    }

    pub fn is_valid(&self, id: ValueId) -> bool {
        self.node(id).is_ok()
    }

    /// Whether the value is owned by the caller rather than a container.
    pub fn is_root(&self, id: ValueId) -> Result<bool> {
        self.node(id).map(|node| node.parent.is_none())
    }

    pub fn parent(&self, id: ValueId) -> Result<Option<ValueId>> {
        self.node(id).map(|node| node.parent)
    }

    pub(crate) fn object(&self, id: ValueId) -> Result<&ObjectStore> {
        match self.value(id)? {
            Value::Object(obj) => Ok(obj),
            other => Err(Error::mismatch(Kind::Object, other.kind())),
        }
    }

    pub(crate) fn array(&self, id: ValueId) -> Result<&ArrayStore> {
        match self.value(id)? {
            Value::Array(arr) => Ok(arr),
            other => Err(Error::mismatch(Kind::Array, other.kind())),
        }
    }

    fn object_mut(&mut self, id: ValueId) -> Result<&mut ObjectStore> {
        match &mut self.node_mut(id)?.value {
            Value::Object(obj) => Ok(obj),
            other => Err(Error::mismatch(Kind::Object, other.kind())),
        }
    }

    fn array_mut(&mut self, id: ValueId) -> Result<&mut ArrayStore> {
        match &mut self.node_mut(id)?.value {
            Value::Array(arr) => Ok(arr),
            other => Err(Error::mismatch(Kind::Array, other.kind())),
        }
    }

    // ---- Queries ----

    /// Number of children of an object or array.
    pub fn len(&self, id: ValueId) -> Result<usize> {
        let value = self.value(id)?;
        value.child_count().ok_or(Error::TypeMismatch {
            expected: Expected::Container,
            found: value.kind(),
        })
    }

    /// Borrowed text of a string value, alive as long as the value is.
    pub fn text(&self, id: ValueId) -> Result<&Text> {
        match self.value(id)? {
            Value::Text(text) => Ok(text),
            other => Err(Error::mismatch(Kind::Text, other.kind())),
        }
    }

    pub fn number(&self, id: ValueId) -> Result<f64> {
        match self.value(id)? {
            Value::Number(n) => Ok(*n),
            other => Err(Error::mismatch(Kind::Number, other.kind())),
        }
    }

    pub fn boolean(&self, id: ValueId) -> Result<bool> {
        match self.value(id)? {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::mismatch(Kind::Bool, other.kind())),
        }
    }

    pub fn has_key(&self, object: ValueId, key: &[u8]) -> Result<bool> {
        self.object(object).map(|obj| obj.contains_key(key))
    }

    /// Borrowed child under `key`, or `None` when the key is absent.
    pub fn get(&self, object: ValueId, key: &[u8]) -> Result<Option<ValueId>> {
        self.object(object).map(|obj| obj.get(key))
    }

    /// Borrowed element at `index`, or `None` past the end.
    pub fn get_index(&self, array: ValueId, index: usize) -> Result<Option<ValueId>> {
        self.array(array).map(|arr| arr.get(index))
    }

    // ---- Mutation ----

    /// Fails unless `child` is a root that is neither `container` nor one of
    /// its ancestors.
    fn check_attachable(&self, container: ValueId, child: ValueId) -> Result<()> {
        let node = self.node(child)?;
        if node.parent.is_some() {
            return Err(Error::AlreadyOwned);
        }
        if container == child {
            return Err(Error::Cycle);
        }
        // A root without children cannot be anyone's ancestor.
        if node.value.child_count().unwrap_or(0) == 0 {
            return Ok(());
        }
        let mut cursor = self.node(container)?.parent;
        while let Some(id) = cursor {
            if id == child {
                return Err(Error::Cycle);
            }
            cursor = self.node(id)?.parent;
        }
        Ok(())
    }

    /// Appends `child` to `array`, moving it out of the caller's ownership.
    ///
    /// On error nothing changes and the caller still owns `child`.
    pub fn push(&mut self, array: ValueId, child: ValueId) -> Result<()> {
        self.array(array)?;
        self.check_attachable(array, child)?;
        alloc::ensure(self.array_mut(array)?.push(child));
        self.node_mut(child)?.parent = Some(array);
        Ok(())
    }

    /// Stores `child` under `key`, moving it out of the caller's ownership.
    ///
    /// A new key is appended. An existing key keeps its position and its
    /// previous child is released together with everything it owns. On error
    /// nothing changes and the caller still owns `child`.
    pub fn set(&mut self, object: ValueId, key: &[u8], child: ValueId) -> Result<()> {
        self.object(object)?;
        self.check_attachable(object, child)?;
        let displaced = alloc::ensure(self.object_mut(object)?.insert(key, child));
        self.node_mut(child)?.parent = Some(object);
        if let Some(old) = displaced {
            self.release(old);
        }
        Ok(())
    }

    /// Detaches the child under `key` and hands it back to the caller as a
    /// root. The remaining entries keep their order.
    pub fn take(&mut self, object: ValueId, key: &[u8]) -> Result<Option<ValueId>> {
        let removed = self.object_mut(object)?.remove(key);
        if let Some(child) = removed {
            self.node_mut(child)?.parent = None;
        }
        Ok(removed)
    }

    /// Reserves room for `additional` children. Has no observable effect
    /// other than allocation cost.
    ///
    /// The reservation is a hint: if it cannot be satisfied the container is
    /// left as it was and later appends grow it on demand.
    pub fn reserve(&mut self, container: ValueId, additional: usize) -> Result<()> {
        let reserved = match &mut self.node_mut(container)?.value {
            Value::Object(obj) => obj.reserve(additional),
            Value::Array(arr) => arr.reserve(additional),
            other => {
                return Err(Error::TypeMismatch {
                    expected: Expected::Container,
                    found: other.kind(),
                })
            }
        };
        if let Err(err) = reserved {
            warn!(?container, error = %err, "ignoring capacity hint");
        }
        Ok(())
    }

    /// Current child capacity of a container.
    pub fn capacity(&self, container: ValueId) -> Result<usize> {
        match self.value(container)? {
            Value::Object(obj) => Ok(obj.capacity()),
            Value::Array(arr) => Ok(arr.capacity()),
            other => Err(Error::TypeMismatch {
                expected: Expected::Container,
                found: other.kind(),
            }),
        }
    }

    // ---- Release ----

    /// Releases a root and its whole subtree.
    ///
    /// Children cannot be freed directly: they belong to their container,
    /// and freeing them here would leave it holding a dead id.
    pub fn free(&mut self, id: ValueId) -> Result<()> {
        if self.node(id)?.parent.is_some() {
            return Err(Error::NotRoot);
        }
        self.release(id);
        Ok(())
    }

    /// Depth-first teardown without recursion, so tree depth is unbounded.
    fn release(&mut self, id: ValueId) -> usize {
        let mut pending = vec![id];
        let mut released = 0;
        while let Some(next) = pending.pop() {
            let Some(mut node) = next.parts().and_then(|raw| self.nodes.remove(raw)) else {
                continue;
            };
            released += 1;
            match &mut node.value {
                Value::Object(obj) => pending.extend(obj.drain()),
                Value::Array(arr) => pending.extend(arr.drain()),
                _ => {}
            }
        }
        trace!(?id, released, "released subtree");
        released
    }

    /// Releases every live value and serialized string.
    ///
    /// Safe to call repeatedly. Ids issued before the sweep stay invalid
    /// afterwards.
    pub fn sweep(&mut self) -> SweepReport {
        let report = SweepReport {
            values: self.nodes.clear(),
            strings: self.strings.clear(),
        };
        debug!(values = report.values, strings = report.strings, "arena swept");
        report
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            live_values: self.nodes.live(),
            live_strings: self.strings.live(),
            roots: self
                .nodes
                .iter()
                .filter(|(_, node)| node.parent.is_none())
                .count(),
        }
    }

    // ---- Serialized strings ----

    fn store_string(&mut self, bytes: Vec<u8>) -> StringId {
        let text = alloc::ensure(Text::try_from_vec(Cow::Owned(bytes)));
        let id = StringId::from_parts(alloc::ensure(self.strings.insert(text)));
        trace!(?id, "allocated string");
        id
    }

    /// Renders `id` as compact JSON into a new caller-owned string. The
    /// string does not depend on the tree and outlives it.
    pub fn serialize(&mut self, id: ValueId) -> Result<StringId> {
        let bytes = serialize::to_vec(self, id)?;
        Ok(self.store_string(bytes))
    }

    /// Like [`Arena::serialize`], with one element per line.
    pub fn serialize_pretty(&mut self, id: ValueId, options: &PrettyOptions) -> Result<StringId> {
        let bytes = serialize::to_vec_pretty(self, id, options)?;
        Ok(self.store_string(bytes))
    }

    pub fn string(&self, id: StringId) -> Result<&Text> {
        id.parts()
            .and_then(|raw| self.strings.get(raw))
            .ok_or(Error::InvalidHandle)
    }

    /// Releases a serialized string. A second release reports `InvalidHandle`.
    pub fn free_string(&mut self, id: StringId) -> Result<()> {
        id.parts()
            .and_then(|raw| self.strings.remove(raw))
            .map(drop)
            .ok_or(Error::InvalidHandle)
    }

    // ---- Export ----

    /// Copies a tree into a `serde_json::Value`, keeping object order.
    ///
    /// Text is decoded lossily and non-finite numbers become `null`. The walk
    /// is iterative; note that serde_json drops very deep values recursively.
    pub fn to_json_value(&self, id: ValueId) -> Result<serde_json::Value> {
        let mut frames = match self.export_node(id)? {
            Export::Done(value) => return Ok(value),
            Export::Open(frame) => vec![frame],
        };
        let mut root = None;
        while let Some(mut frame) = frames.pop() {
            let next = match self.value(frame.id)? {
                Value::Array(arr) => arr.get(frame.index).map(|child| (None, child)),
                Value::Object(obj) => obj
                    .get_index(frame.index)
                    .map(|(key, child)| (Some(String::from_utf8_lossy(key).into_owned()), child)),
                _ => None,
            };
            frame.index += 1;
            match next {
                Some((key, child)) => match self.export_node(child)? {
                    Export::Done(value) => {
                        frame.attach(key, value);
                        frames.push(frame);
                    }
                    Export::Open(mut open) => {
                        open.key = key;
                        frames.push(frame);
                        frames.push(open);
                    }
                },
                None => {
                    let (key, value) = frame.finish();
                    match frames.last_mut() {
                        Some(parent) => parent.attach(key, value),
                        None => root = Some(value),
                    }
                }
            }
        }
        Ok(root.unwrap_or_default())
    }

    /// Scalars convert directly; containers open a frame to fill.
    fn export_node(&self, id: ValueId) -> Result<Export> {
        Ok(Export::Done(match self.value(id)? {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(text) => serde_json::Value::String(text.to_string_lossy().into_owned()),
            Value::Array(arr) => {
                let items = Vec::with_capacity(arr.len());
                return Ok(Export::Open(ExportFrame::new(id, Building::Array(items))));
            }
            Value::Object(obj) => {
                let map = serde_json::Map::with_capacity(obj.len());
                return Ok(Export::Open(ExportFrame::new(id, Building::Object(map))));
            }
        }))
    }
}

enum Export {
    Done(serde_json::Value),
    Open(ExportFrame),
}

enum Building {
    Array(Vec<serde_json::Value>),
    Object(serde_json::Map<String, serde_json::Value>),
}

/// A container being exported: its id, the next child to visit, and the
/// key it will be stored under in its parent.
struct ExportFrame {
    id: ValueId,
    index: usize,
    key: Option<String>,
    building: Building,
}

impl ExportFrame {
    fn new(id: ValueId, building: Building) -> Self {
        Self {
            id,
            index: 0,
            key: None,
            building,
        }
    }

    fn attach(&mut self, key: Option<String>, value: serde_json::Value) {
        match &mut self.building {
            Building::Array(items) => items.push(value),
            Building::Object(map) => {
                map.insert(key.unwrap_or_default(), value);
            }
        }
    }

    fn finish(self) -> (Option<String>, serde_json::Value) {
        let value = match self.building {
            Building::Array(items) => serde_json::Value::Array(items),
            Building::Object(map) => serde_json::Value::Object(map),
        };
        (self.key, value)
    }
}
