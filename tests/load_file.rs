//! File loading through the buffer and edit layers.

mod common;

use common::{assert_handles_live, setup_test_logging};
use opentui_text::{EditBuffer, Error, TextBuffer};
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_file_replaces_text() {
    setup_test_logging();
    let file = temp_file("first line\n二行目 👍\n".as_bytes());

    let mut buffer = TextBuffer::from_text("old").unwrap();
    buffer.add_highlight(0, 3, 1, 1, 1).unwrap();
    buffer.load_file(file.path()).unwrap();

    assert_eq!(buffer.plain_text(), "first line\n二行目 👍\n");
    assert_eq!(buffer.line_count(), 3);
    assert_eq!(buffer.highlight_count(), 0);
    assert_handles_live(&buffer);
}

#[test]
fn test_load_file_errors_leave_buffer_intact() {
    setup_test_logging();
    let file = temp_file(&[b'o', b'k', 0xFF, 0xFE]);
    let mut buffer = TextBuffer::from_text("keep").unwrap();

    assert!(matches!(
        buffer.load_file(file.path()),
        Err(Error::InvalidEncoding(_))
    ));
    assert_eq!(buffer.plain_text(), "keep");

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    assert!(matches!(buffer.load_file(&missing), Err(Error::Io(_))));
    assert!(!buffer.try_load_file(&missing));
    assert_eq!(buffer.plain_text(), "keep");
}

#[test]
fn test_edit_buffer_load_clears_history() {
    setup_test_logging();
    let file = temp_file(b"loaded");

    let mut buf = EditBuffer::new();
    buf.insert_text("typed").unwrap();
    assert!(buf.can_undo());

    buf.load_file(file.path()).unwrap();
    assert_eq!(buf.text(), "loaded");
    assert_eq!(buf.cursor().offset, 0);
    assert!(!buf.can_undo());
    assert!(!buf.can_redo());
}
