//! Decoding of commit files.
//!
//! A commit file is a sequence of JSON objects, usually one per line. Writers are not strict
//! about separators, so anything between objects is skipped.

use std::io::Read;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Deserializer;

use crate::kernel::models::LogEntry;
use crate::kernel::Action;
use crate::storage::{StorageBackend, StorageError};
use crate::{DeltaResult, DeltaTableError};

/// Read the JSON object starting at the first `{` at or after `from`.
///
/// Returns the start offset of the object, the decoded value and the offset right after it.
fn next_object<T: DeserializeOwned>(
    data: &[u8],
    from: usize,
) -> Option<(usize, Result<T, serde_json::Error>, usize)> {
    let start = from + data.get(from..)?.iter().position(|b| *b == b'{')?;
    let mut stream = Deserializer::from_slice(&data[start..]).into_iter::<T>();
    let result = stream.next()?;
    let end = start + stream.byte_offset();
    Some((start, result, end))
}

/// Iterator over the JSON objects of a buffer, yielding each with its byte offset.
///
/// Iteration stops after the first object that fails to decode.
pub struct JsonObjects<'a, T> {
    data: &'a [u8],
    pos: usize,
    done: bool,
    _marker: PhantomData<T>,
}

impl<'a, T> JsonObjects<'a, T> {
    /// Scan `data` for concatenated JSON objects.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            done: false,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Iterator for JsonObjects<'_, T> {
    type Item = (usize, Result<T, serde_json::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some((start, result, end)) = next_object(self.data, self.pos) else {
            self.done = true;
            return None;
        };
        self.pos = end;
        self.done = result.is_err();
        Some((start, result))
    }
}

/// The actions of one commit file, in the order they appear.
///
/// Within one object, actions come out as `metaData`, `protocol`, `add`, `remove`, `txn`,
/// `commitInfo`. Unknown action types are skipped. A malformed object ends the iteration with
/// [`DeltaTableError::MalformedLogLine`].
pub struct CommitActions {
    path: String,
    data: Vec<u8>,
    pos: usize,
    pending: std::vec::IntoIter<Action>,
    done: bool,
}

impl CommitActions {
    /// Read the commit file at `path`. The underlying reader is released before returning.
    pub fn try_new(storage: &dyn StorageBackend, path: &str) -> DeltaResult<Self> {
        let mut reader = storage.open(path)?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|source| StorageError::from_io(path, source))?;
        Ok(Self::from_bytes(path, data))
    }

    /// Decode commit content already in memory.
    pub fn from_bytes(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
            pos: 0,
            pending: Vec::new().into_iter(),
            done: false,
        }
    }
}

impl Iterator for CommitActions {
    type Item = DeltaResult<Action>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(action) = self.pending.next() {
                return Some(Ok(action));
            }
            if self.done {
                return None;
            }
            let Some((start, result, end)) = next_object::<LogEntry>(&self.data, self.pos) else {
                self.done = true;
                return None;
            };
            self.pos = end;
            match result {
                Ok(entry) => {
                    self.pending = entry.into_actions().collect::<Vec<_>>().into_iter();
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(DeltaTableError::MalformedLogLine {
                        path: self.path.clone(),
                        offset: start,
                        source,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Add, Remove};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn actions(content: &str) -> Vec<DeltaResult<Action>> {
        CommitActions::from_bytes("00000000000000000000.json", content.as_bytes().to_vec())
            .collect()
    }

    #[test]
    fn test_newline_delimited() {
        let content = r#"{"commitInfo":{"timestamp":1587968626537,"operation":"WRITE"}}
{"protocol":{"minReaderVersion":1,"minWriterVersion":2}}
{"metaData":{"id":"22ef18ba","format":{"provider":"parquet","options":{}},"schemaString":"{\"type\":\"struct\",\"fields\":[{\"name\":\"x\",\"type\":\"integer\",\"nullable\":true,\"metadata\":{}}]}","partitionColumns":[],"configuration":{},"createdTime":1587968626000}}
{"add":{"path":"a.parquet","partitionValues":{},"size":262,"modificationTime":1587968626000,"dataChange":true}}
"#;
        let tags: Vec<_> = actions(content)
            .into_iter()
            .map(|a| a.unwrap().tag())
            .collect();
        assert_eq!(tags, vec!["commitInfo", "protocol", "metaData", "add"]);
    }

    #[test]
    fn test_stray_bytes_and_braces_in_strings() {
        let content = "garbage\r\n  {\"add\":{\"path\":\"a{b}\\n.parquet\"}} ;;; {} \n{\"remove\":{\"path\":\"c.parquet\"}}trailing";
        let parsed: Vec<_> = actions(content).into_iter().map(|a| a.unwrap()).collect();
        assert_eq!(
            parsed,
            vec![
                Action::Add(Add {
                    path: "a{b}\n.parquet".to_string(),
                    ..Default::default()
                }),
                Action::Remove(Remove {
                    path: "c.parquet".to_string(),
                    ..Default::default()
                }),
            ]
        );
    }

    #[test]
    fn test_malformed_object_stops_decoding() {
        let content = "{\"add\":{\"path\":\"a.parquet\"}}\n{\"add\":{\"path\": }}\n{\"add\":{\"path\":\"b.parquet\"}}";
        let parsed = actions(content);
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(DeltaTableError::MalformedLogLine { offset, path, .. }) => {
                assert_eq!(*offset, 29);
                assert_eq!(path, "00000000000000000000.json");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_add_missing_path_is_malformed() {
        let parsed = actions(r#"{"add":{"size":1}}"#);
        assert!(matches!(
            parsed.as_slice(),
            [Err(DeltaTableError::MalformedLogLine { offset: 0, .. })]
        ));
    }

    #[test]
    fn test_empty_file() {
        assert!(actions("").is_empty());
        assert!(actions("\n\n").is_empty());
    }

    #[test]
    fn test_json_objects() {
        let objects: Vec<_> = JsonObjects::<Value>::new(b"x{\"a\":1}  {\"b\":2}")
            .map(|(offset, value)| (offset, value.unwrap()))
            .collect();
        assert_eq!(
            objects,
            vec![
                (1, serde_json::json!({"a": 1})),
                (10, serde_json::json!({"b": 2}))
            ]
        );
    }
}
