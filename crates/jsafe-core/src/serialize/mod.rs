//! JSON text output for arena trees.
//!
//! [`JsonEncoder`] writes compact JSON by default, or one element per line
//! when built with [`PrettyOptions`]. Objects keep insertion order.

mod escape;
mod number;

use crate::alloc;
use crate::arena::Arena;
use crate::error::Result;
use crate::handle::ValueId;
use crate::value::Value;

use number::format_number;

/// Indentation unit used per nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Tab,
    Spaces(usize),
}

/// Options for pretty output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Default is two spaces.
    pub indent: Indent,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: Indent::Spaces(2),
        }
    }
}

impl PrettyOptions {
    /// `0` selects tabs, any other value that many spaces.
    pub fn from_spaces(spaces: usize) -> Self {
        let indent = if spaces == 0 {
            Indent::Tab
        } else {
            Indent::Spaces(spaces)
        };
        Self { indent }
    }
}

/// Pending work for [`JsonEncoder`]. Trees are walked with an explicit stack,
/// so nesting depth is bounded by memory rather than the call stack.
enum Step<'a> {
    Value(ValueId),
    /// Separator, line break and optional key before a container element.
    Entry { key: Option<&'a [u8]>, first: bool },
    Close(u8),
}

pub struct JsonEncoder<'a> {
    arena: &'a Arena,
    out: Vec<u8>,
    pretty: Option<Indent>,
    depth: usize,
}

impl<'a> JsonEncoder<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            out: Vec::new(),
            pretty: None,
            depth: 0,
        }
    }

    pub fn pretty(arena: &'a Arena, options: &PrettyOptions) -> Self {
        Self {
            pretty: Some(options.indent),
            ..Self::new(arena)
        }
    }

    pub fn encode(mut self, id: ValueId) -> Result<Vec<u8>> {
        if self.pretty.is_none() {
            // One extra byte for the NUL the arena appends when storing.
            let len = encoded_len(self.arena, id)? + 1;
            self.reserve(len);
        }
        self.write_any(id)?;
        Ok(self.out)
    }

    fn write_any(&mut self, id: ValueId) -> Result<()> {
        let arena = self.arena;
        let mut steps = vec![Step::Value(id)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Value(id) => match arena.value(id)? {
                    Value::Null => self.write(b"null"),
                    Value::Bool(true) => self.write(b"true"),
                    Value::Bool(false) => self.write(b"false"),
                    Value::Number(n) => self.write(format_number(*n).as_bytes()),
                    Value::Text(text) => self.write_str(text.as_bytes()),
                    Value::Array(arr) if arr.is_empty() => self.write(b"[]"),
                    Value::Object(obj) if obj.is_empty() => self.write(b"{}"),
                    Value::Array(arr) => {
                        self.open(b'[');
                        grow(&mut steps, 2 * arr.len() + 1);
                        steps.push(Step::Close(b']'));
                        for (i, child) in arr.iter().enumerate().rev() {
                            steps.push(Step::Value(child));
                            steps.push(Step::Entry { key: None, first: i == 0 });
                        }
                    }
                    Value::Object(obj) => {
                        self.open(b'{');
                        grow(&mut steps, 2 * obj.len() + 1);
                        steps.push(Step::Close(b'}'));
                        for (i, (key, child)) in obj.iter().enumerate().rev() {
                            steps.push(Step::Value(child));
                            steps.push(Step::Entry { key: Some(key), first: i == 0 });
                        }
                    }
                },
                Step::Entry { key, first } => {
                    if !first {
                        self.write(b",");
                    }
                    self.newline();
                    if let Some(key) = key {
                        self.write_str(key);
                        self.write(b":");
                    }
                }
                Step::Close(byte) => {
                    self.depth -= 1;
                    self.newline();
                    self.write(&[byte]);
                }
            }
        }
        Ok(())
    }

    fn open(&mut self, byte: u8) {
        self.write(&[byte]);
        self.depth += 1;
    }

    fn reserve(&mut self, additional: usize) {
        alloc::ensure(alloc::reserve(&mut self.out, additional, "serialized bytes"));
    }

    fn write(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.out.extend_from_slice(bytes);
    }

    fn write_str(&mut self, bytes: &[u8]) {
        self.reserve(escape::escaped_len(bytes));
        escape::write_str(&mut self.out, bytes);
    }

    fn newline(&mut self) {
        let Some(indent) = self.pretty else {
            return;
        };
        let (fill, width) = match indent {
            Indent::Tab => (b'\t', self.depth),
            Indent::Spaces(n) => (b' ', self.depth * n),
        };
        self.reserve(width + 1);
        self.out.push(b'\n');
        self.out.resize(self.out.len() + width, fill);
    }
}

fn grow<T>(stack: &mut Vec<T>, additional: usize) {
    alloc::ensure(alloc::reserve(stack, additional, "encoder steps"));
}

/// Compact JSON for the tree rooted at `id`.
pub fn to_vec(arena: &Arena, id: ValueId) -> Result<Vec<u8>> {
    JsonEncoder::new(arena).encode(id)
}

/// Indented JSON for the tree rooted at `id`.
pub fn to_vec_pretty(arena: &Arena, id: ValueId, options: &PrettyOptions) -> Result<Vec<u8>> {
    JsonEncoder::pretty(arena, options).encode(id)
}

/// Exact length of the compact encoding of `id`.
pub fn encoded_len(arena: &Arena, id: ValueId) -> Result<usize> {
    let mut size = 0;
    let mut pending = vec![id];
    while let Some(id) = pending.pop() {
        size += match arena.value(id)? {
            Value::Null | Value::Bool(true) => 4,
            Value::Bool(false) => 5,
            Value::Number(n) => format_number(*n).len(),
            Value::Text(text) => escape::escaped_len(text.as_bytes()),
            Value::Array(arr) => {
                grow(&mut pending, arr.len());
                pending.extend(arr.iter());
                2 + arr.len().saturating_sub(1)
            }
            Value::Object(obj) => {
                grow(&mut pending, obj.len());
                let mut keys = 0;
                for (key, child) in obj.iter() {
                    keys += escape::escaped_len(key);
                    pending.push(child);
                }
                // Braces, commas between entries, one colon per entry.
                2 + obj.len().saturating_sub(1) + obj.len() + keys
            }
        };
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(arena: &mut Arena) -> ValueId {
        let obj = arena.new_object();
        let a = arena.new_number(1.0);
        arena.set(obj, b"a", a).unwrap();
        let arr = arena.new_array();
        let t = arena.new_bool(true);
        let n = arena.new_null();
        let x = arena.new_text(b"x");
        for v in [t, n, x] {
            arena.push(arr, v).unwrap();
        }
        arena.set(obj, b"b", arr).unwrap();
        let empty = arena.new_object();
        arena.set(obj, b"c", empty).unwrap();
        obj
    }

    #[test]
    fn compact_output() {
        let mut arena = Arena::new();
        let obj = sample(&mut arena);
        let out = to_vec(&arena, obj).unwrap();
        assert_eq!(out, br#"{"a":1,"b":[true,null,"x"],"c":{}}"#);
        assert_eq!(encoded_len(&arena, obj).unwrap(), out.len());
    }

    #[test]
    fn pretty_with_spaces() {
        let mut arena = Arena::new();
        let obj = sample(&mut arena);
        let out = to_vec_pretty(&arena, obj, &PrettyOptions::from_spaces(2)).unwrap();
        let expected = "{\n  \"a\":1,\n  \"b\":[\n    true,\n    null,\n    \"x\"\n  ],\n  \"c\":{}\n}";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn pretty_with_tabs() {
        let mut arena = Arena::new();
        let arr = arena.new_array();
        let inner = arena.new_array();
        let one = arena.new_number(1.0);
        arena.push(inner, one).unwrap();
        arena.push(arr, inner).unwrap();
        let out = to_vec_pretty(&arena, arr, &PrettyOptions::from_spaces(0)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\n\t[\n\t\t1\n\t]\n]");
    }

    #[test]
    fn scalars_ignore_layout() {
        let mut arena = Arena::new();
        let s = arena.new_text(b"a\"b");
        let compact = to_vec(&arena, s).unwrap();
        let pretty = to_vec_pretty(&arena, s, &PrettyOptions::default()).unwrap();
        assert_eq!(compact, pretty);
        assert_eq!(compact, br#""a\"b""#);
    }

    #[test]
    fn escaped_keys() {
        let mut arena = Arena::new();
        let obj = arena.new_object();
        let v = arena.new_bool(false);
        arena.set(obj, b"line\nbreak", v).unwrap();
        let out = to_vec(&arena, obj).unwrap();
        assert_eq!(out, br#"{"line\nbreak":false}"#);
        assert_eq!(encoded_len(&arena, obj).unwrap(), out.len());
    }

    const DEEP: usize = 100_000;

    fn nested_arrays(arena: &mut Arena, depth: usize) -> ValueId {
        let root = arena.new_array();
        let mut tip = root;
        for _ in 0..depth {
            let next = arena.new_array();
            arena.push(tip, next).unwrap();
            tip = next;
        }
        root
    }

    #[test]
    fn deep_nesting_compact() {
        let mut arena = Arena::new();
        let root = nested_arrays(&mut arena, DEEP);
        let out = to_vec(&arena, root).unwrap();
        let expected = format!("{}[]{}", "[".repeat(DEEP), "]".repeat(DEEP));
        assert_eq!(encoded_len(&arena, root).unwrap(), expected.len());
        assert!(out == expected.as_bytes());
    }

    #[test]
    fn deep_nesting_pretty() {
        let mut arena = Arena::new();
        let root = nested_arrays(&mut arena, DEEP);
        // Zero-width indent keeps the output linear in depth.
        let options = PrettyOptions {
            indent: Indent::Spaces(0),
        };
        let out = to_vec_pretty(&arena, root, &options).unwrap();
        let expected = format!("{}[]{}", "[\n".repeat(DEEP), "\n]".repeat(DEEP));
        assert!(out == expected.as_bytes());
    }

    #[test]
    fn deep_object_nesting() {
        let mut arena = Arena::new();
        let root = arena.new_object();
        let mut tip = root;
        for _ in 0..DEEP {
            let next = arena.new_object();
            arena.set(tip, b"k", next).unwrap();
            tip = next;
        }
        let out = to_vec(&arena, root).unwrap();
        let expected = format!("{}{{}}{}", "{\"k\":".repeat(DEEP), "}".repeat(DEEP));
        assert_eq!(encoded_len(&arena, root).unwrap(), expected.len());
        assert!(out == expected.as_bytes());
    }
}
