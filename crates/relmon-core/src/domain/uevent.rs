//! Parsed uevent representation
//!
//! A kernel uevent arrives as one already-delimited text buffer: the first
//! line names the device path, every following line is a `KEY=VALUE` record.
//! Parsing never fails; a malformed buffer simply produces an event with
//! nothing in it, which downstream classification discards.

use std::collections::HashMap;

/// A single parsed kernel uevent
///
/// Owns the device path and the field map for the duration of one dispatch
/// call; the raw buffer is not retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uevent {
    /// Device path from the first line of the buffer
    devpath: String,
    /// `KEY=VALUE` fields from the remaining lines; keys unique
    fields: HashMap<String, String>,
}

impl Uevent {
    /// Parses a raw notification buffer.
    ///
    /// The first line becomes the device path. Each subsequent line is split
    /// at the first `=`; lines without `=` are skipped. When the same key
    /// appears twice the first occurrence wins. Invalid UTF-8 is replaced
    /// lossily. An empty buffer yields an empty path and an empty field map.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut lines = text.lines();

        let devpath = lines.next().unwrap_or("").trim().to_string();

        let mut fields = HashMap::new();
        for line in lines {
            if let Some((key, value)) = line.split_once('=') {
                fields
                    .entry(key.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        Self { devpath, fields }
    }

    /// Returns the device path (first line of the buffer).
    pub fn devpath(&self) -> &str {
        &self.devpath
    }

    /// Returns the value of `key`, if the uevent carried it.
    ///
    /// Absence of a key is a valid state, not an error.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns true if the key is present, regardless of value.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the number of parsed fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the buffer carried neither a path nor any fields.
    pub fn is_empty(&self) -> bool {
        self.devpath.is_empty() && self.fields.is_empty()
    }
}
