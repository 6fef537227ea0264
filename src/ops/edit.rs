use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

/// Replacement or inserted text: either one string split after each `\n`, or explicit lines
/// spliced in as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditContent {
    Text(String),
    Lines(Vec<String>),
}

impl EditContent {
    fn into_lines(self) -> Vec<String> {
        match self {
            Self::Text(text) => split_lines(&text)
                .into_iter()
                .map(str::to_string)
                .collect(),
            Self::Lines(lines) => lines,
        }
    }
}

impl From<&str> for EditContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EditContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for EditContent {
    fn from(value: Vec<String>) -> Self {
        Self::Lines(value)
    }
}

/// One edit as received from a caller; checked by [`EditAction::from_operation`].
///
/// Line numbers are 0-based and `line_end` is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, alias = "lineStart")]
    pub line_start: Option<i64>,
    #[serde(default, alias = "lineEnd")]
    pub line_end: Option<i64>,
    #[serde(default)]
    pub content: Option<EditContent>,
}

impl EditOperation {
    pub fn replace(line_start: i64, line_end: i64, content: impl Into<EditContent>) -> Self {
        Self {
            kind: Some("replace".to_string()),
            line_start: Some(line_start),
            line_end: Some(line_end),
            content: Some(content.into()),
        }
    }

    pub fn delete(line_start: i64, line_end: i64) -> Self {
        Self {
            kind: Some("delete".to_string()),
            line_start: Some(line_start),
            line_end: Some(line_end),
            content: None,
        }
    }

    pub fn insert(line_start: i64, content: impl Into<EditContent>) -> Self {
        Self {
            kind: Some("insert".to_string()),
            line_start: Some(line_start),
            line_end: None,
            content: Some(content.into()),
        }
    }
}

/// A validated edit, with line numbers known to be in range for the file it was checked
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Replace {
        start: usize,
        end: usize,
        lines: Vec<String>,
    },
    Delete {
        start: usize,
        end: usize,
    },
    Insert {
        at: usize,
        lines: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Replace,
    Delete,
    Insert,
}

fn line_number(
    index: usize,
    field: &str,
    value: Option<i64>,
    max: usize,
) -> Result<usize> {
    let value = value.ok_or_else(|| {
        Error::InvalidOperation(format!("operation {index}: missing {field}"))
    })?;
    usize::try_from(value)
        .ok()
        .filter(|line| *line <= max)
        .ok_or_else(|| {
            Error::OutOfRange(format!(
                "operation {index}: {field} {value} is outside 0..={max}"
            ))
        })
}

impl EditAction {
    /// Check `op` (the `index`-th of its batch) against a file of `line_count` lines.
    pub fn from_operation(index: usize, op: EditOperation, line_count: usize) -> Result<Self> {
        let kind = match op.kind.as_deref() {
            Some("replace") => Kind::Replace,
            Some("delete") => Kind::Delete,
            Some("insert") => Kind::Insert,
            Some(other) => {
                return Err(Error::InvalidOperation(format!(
                    "operation {index}: unknown type {other:?}; expected replace, insert or delete"
                )));
            }
            None => {
                return Err(Error::InvalidOperation(format!(
                    "operation {index}: missing type"
                )));
            }
        };

        let start = line_number(index, "line_start", op.line_start, line_count)?;
        if kind == Kind::Insert {
            let lines = op
                .content
                .ok_or_else(|| Error::MissingContent(format!("operation {index}: insert")))?;
            return Ok(Self::Insert {
                at: start,
                lines: lines.into_lines(),
            });
        }

        let Some(last_line) = line_count.checked_sub(1) else {
            return Err(Error::OutOfRange(format!(
                "operation {index}: the file has no lines to change"
            )));
        };
        let end = line_number(index, "line_end", op.line_end, last_line)?;
        if end < start {
            return Err(Error::OutOfRange(format!(
                "operation {index}: line_end {end} is before line_start {start}"
            )));
        }

        if kind == Kind::Delete {
            return Ok(Self::Delete { start, end });
        }
        let lines = op
            .content
            .ok_or_else(|| Error::MissingContent(format!("operation {index}: replace")))?;
        Ok(Self::Replace {
            start,
            end,
            lines: lines.into_lines(),
        })
    }

    fn start(&self) -> usize {
        match self {
            Self::Replace { start, .. } | Self::Delete { start, .. } => *start,
            Self::Insert { at, .. } => *at,
        }
    }

    /// Splice into `lines`, clamping to the current length so that overlapping ranges from
    /// earlier actions cannot index out of bounds.
    fn apply(self, lines: &mut Vec<String>) {
        let len = lines.len();
        match self {
            Self::Replace { start, end, lines: new } => {
                let start = start.min(len);
                let end = end.saturating_add(1).clamp(start, len);
                lines.splice(start..end, new);
            }
            Self::Delete { start, end } => {
                let start = start.min(len);
                let end = end.saturating_add(1).clamp(start, len);
                lines.drain(start..end);
            }
            Self::Insert { at, lines: new } => {
                let at = at.min(len);
                lines.splice(at..at, new);
            }
        }
    }
}

/// Split after every `\n`, keeping terminators; empty text has no lines.
fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Apply a validated batch in descending start order; ties keep their batch order.
pub(crate) fn apply_actions(lines: &mut Vec<String>, mut actions: Vec<EditAction>) {
    actions.sort_by(|a, b| b.start().cmp(&a.start()));
    for action in actions {
        action.apply(lines);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFileRequest {
    pub path: PathBuf,
    pub operations: Vec<EditOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFileResponse {
    pub path: PathBuf,
    pub operations_applied: usize,
    pub line_count: usize,
    /// Zero when the edits left the content unchanged and nothing was written.
    pub bytes_written: u64,
}

/// Apply a batch of line edits as a unit.
///
/// Every operation is validated against the original line count before anything changes; one
/// bad operation rejects the whole batch and leaves the file untouched.
pub fn edit_file(ctx: &Context, request: EditFileRequest) -> Result<EditFileResponse> {
    tracing::debug!(
        path = %request.path.display(),
        operations = request.operations.len(),
        "edit_file"
    );
    let path = ctx.validate_path(&request.path)?;
    let content = super::io::read_text(&path, None)?;
    let mut lines: Vec<String> = split_lines(&content)
        .into_iter()
        .map(str::to_string)
        .collect();

    let operations_applied = request.operations.len();
    let actions = request
        .operations
        .into_iter()
        .enumerate()
        .map(|(index, op)| EditAction::from_operation(index, op, lines.len()))
        .collect::<Result<Vec<_>>>()?;

    apply_actions(&mut lines, actions);
    let output = lines.concat();
    let bytes_written = if output == content {
        0
    } else {
        super::io::write_bytes_atomic(&path, output.as_bytes())?;
        output.len() as u64
    };

    tracing::info!(
        path = %path.display(),
        operations = operations_applied,
        bytes_written,
        "edited file"
    );
    Ok(EditFileResponse {
        path,
        operations_applied,
        line_count: lines.len(),
        bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text).into_iter().map(str::to_string).collect()
    }

    fn validate(ops: Vec<EditOperation>, line_count: usize) -> Result<Vec<EditAction>> {
        ops.into_iter()
            .enumerate()
            .map(|(index, op)| EditAction::from_operation(index, op, line_count))
            .collect()
    }

    #[test]
    fn split_lines_keeps_terminators() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a\r\n", "b\n", "c"]);
    }

    #[test]
    fn insert_may_target_one_past_the_last_line() {
        let action = EditAction::from_operation(0, EditOperation::insert(3, "x\n"), 3)
            .expect("insert at end");
        assert_eq!(
            action,
            EditAction::Insert {
                at: 3,
                lines: vec!["x\n".to_string()]
            }
        );
        let err = EditAction::from_operation(0, EditOperation::insert(4, "x\n"), 3)
            .expect_err("past end");
        assert_eq!(err.code(), "out_of_range");
    }

    #[test]
    fn replace_and_delete_must_end_on_an_existing_line() {
        let err = EditAction::from_operation(0, EditOperation::delete(0, 3), 3)
            .expect_err("line_end == line_count");
        assert_eq!(err.code(), "out_of_range");

        let err = EditAction::from_operation(0, EditOperation::delete(0, 0), 0)
            .expect_err("empty file");
        assert_eq!(err.code(), "out_of_range");

        let err = EditAction::from_operation(0, EditOperation::delete(2, 1), 3)
            .expect_err("reversed range");
        assert_eq!(err.code(), "out_of_range");

        let err = EditAction::from_operation(0, EditOperation::delete(-1, 1), 3)
            .expect_err("negative start");
        assert_eq!(err.code(), "out_of_range");
    }

    #[test]
    fn malformed_operations_are_classified() {
        let missing_type = EditOperation {
            line_start: Some(0),
            ..EditOperation::default()
        };
        assert_eq!(
            EditAction::from_operation(0, missing_type, 2)
                .expect_err("missing type")
                .code(),
            "invalid_operation"
        );

        let unknown = EditOperation {
            kind: Some("append".to_string()),
            line_start: Some(0),
            ..EditOperation::default()
        };
        assert_eq!(
            EditAction::from_operation(0, unknown, 2)
                .expect_err("unknown type")
                .code(),
            "invalid_operation"
        );

        let no_end = EditOperation {
            kind: Some("replace".to_string()),
            line_start: Some(0),
            content: Some("x".into()),
            ..EditOperation::default()
        };
        assert_eq!(
            EditAction::from_operation(0, no_end, 2)
                .expect_err("missing line_end")
                .code(),
            "invalid_operation"
        );

        let no_content = EditOperation {
            content: None,
            ..EditOperation::replace(0, 0, "")
        };
        match EditAction::from_operation(1, no_content, 2).expect_err("missing content") {
            Error::MissingContent(msg) => assert!(msg.contains("operation 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn batch_applies_from_the_bottom_up() {
        let mut text = lines("Línea 1\nLínea 2\nLínea 3\nLínea 4\n");
        let actions = validate(
            vec![
                EditOperation::replace(0, 0, "Primera línea modificada\n"),
                EditOperation::delete(2, 2),
                EditOperation::insert(4, "Línea adicional\n"),
            ],
            text.len(),
        )
        .expect("valid batch");
        apply_actions(&mut text, actions);
        assert_eq!(
            text.concat(),
            "Primera línea modificada\nLínea 2\nLínea 4\nLínea adicional\n"
        );
    }

    #[test]
    fn ties_keep_batch_order_and_overlaps_do_not_panic() {
        let mut text = lines("a\nb\nc\n");
        let actions = validate(
            vec![
                EditOperation::insert(1, "first\n"),
                EditOperation::insert(1, "second\n"),
            ],
            text.len(),
        )
        .expect("valid batch");
        apply_actions(&mut text, actions);
        assert_eq!(text.concat(), "a\nsecond\nfirst\nb\nc\n");

        let mut text = lines("a\nb\nc\n");
        let actions = validate(
            vec![EditOperation::delete(0, 2), EditOperation::delete(1, 2)],
            text.len(),
        )
        .expect("valid batch");
        apply_actions(&mut text, actions);
        assert_eq!(text.concat(), "");
    }

    #[test]
    fn content_forms_split_differently() {
        assert!(EditContent::from("").into_lines().is_empty());
        assert_eq!(
            EditContent::from("x\ny").into_lines(),
            vec!["x\n".to_string(), "y".to_string()]
        );
        assert_eq!(
            EditContent::from(vec!["no newline".to_string()]).into_lines(),
            vec!["no newline".to_string()]
        );
    }

    #[test]
    fn operations_deserialize_from_json() {
        let ops: Vec<EditOperation> = serde_json::from_str(
            r#"[
                {"type": "replace", "line_start": 0, "line_end": 1, "content": "x\n"},
                {"type": "insert", "lineStart": 2, "content": ["a\n", "b\n"]},
                {"type": "delete", "line_start": 0, "line_end": 0}
            ]"#,
        )
        .expect("parse");
        assert_eq!(ops[0], EditOperation::replace(0, 1, "x\n"));
        assert_eq!(
            ops[1],
            EditOperation::insert(2, vec!["a\n".to_string(), "b\n".to_string()])
        );
        assert_eq!(ops[2], EditOperation::delete(0, 0));
    }
}
