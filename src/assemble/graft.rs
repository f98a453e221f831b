//! Container rewriting
//!
//! Replaces one part of a packed `.docx` with new bytes. Every other entry
//! is copied without recompression.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::AssembleError;

/// Copy `container`, swapping the bytes of `part` for `replacement`.
///
/// The part is added when the container does not have it.
pub(crate) fn replace_part(
    container: &[u8],
    part: &str,
    replacement: &[u8],
) -> Result<Vec<u8>, AssembleError> {
    let mut archive = ZipArchive::new(Cursor::new(container))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(container.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut replaced = false;

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == part {
            writer.start_file(part, options)?;
            writer.write_all(replacement)?;
            replaced = true;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    if !replaced {
        writer.start_file(part, options)?;
        writer.write_all(replacement)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn container(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn read(data: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        let mut text = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_replace_existing_part() {
        let original = container(&[("a.xml", "<a/>"), ("word/styles.xml", "<old/>")]);
        let rewritten = replace_part(&original, "word/styles.xml", b"<new/>").unwrap();

        assert_eq!(read(&rewritten, "word/styles.xml"), "<new/>");
        assert_eq!(read(&rewritten, "a.xml"), "<a/>");
        let archive = ZipArchive::new(Cursor::new(rewritten.as_slice())).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_missing_part_is_added() {
        let original = container(&[("a.xml", "<a/>")]);
        let rewritten = replace_part(&original, "word/styles.xml", b"<new/>").unwrap();
        assert_eq!(read(&rewritten, "word/styles.xml"), "<new/>");
    }

    #[test]
    fn test_invalid_container() {
        assert!(matches!(
            replace_part(b"not a zip", "word/styles.xml", b""),
            Err(AssembleError::Zip(_))
        ));
    }
}
