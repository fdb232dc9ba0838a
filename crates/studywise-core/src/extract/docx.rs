//! DOCX text extraction: `word/document.xml` out of the zip container,
//! then a streaming walk over the WordprocessingML runs.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;

/// Upper bound on the decompressed size of `word/document.xml`. The
/// upload limit only bounds the compressed archive.
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(format!("not a DOCX archive: {e}")))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(format!("missing word/document.xml: {e}")))?;

    let xml = read_capped(entry, MAX_DOCUMENT_XML_BYTES)?;
    text_from_document_xml(&xml)
}

/// Read at most `limit` bytes of UTF-8; anything longer is rejected
/// rather than truncated.
fn read_capped(entry: impl Read, limit: u64) -> Result<String, ExtractError> {
    let mut bytes = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| ExtractError::Docx(format!("unreadable word/document.xml: {e}")))?;
    if bytes.len() as u64 > limit {
        return Err(ExtractError::Docx(format!(
            "word/document.xml expands past {limit} bytes"
        )));
    }
    String::from_utf8(bytes)
        .map_err(|e| ExtractError::Docx(format!("word/document.xml is not UTF-8: {e}")))
}

fn text_from_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::Docx(format!("bad XML text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:r><w:t>Photosynthesis</w:t></w:r>
      <w:r><w:t xml:space="preserve"> converts light</w:t></w:r>
    </w:p>
    <w:p>
      <w:r><w:t>Term</w:t><w:tab/><w:t>Definition &amp; notes</w:t><w:br/><w:t>next line</w:t></w:r>
    </w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn runs_paragraphs_tabs_and_breaks() {
        let text = extract_text(&docx_with(DOC)).unwrap();
        assert_eq!(
            text,
            "Photosynthesis converts light\nTerm\tDefinition & notes\nnext line\n"
        );
    }

    #[test]
    fn whitespace_between_elements_is_not_text() {
        let xml = "<w:p>\n  <w:r>\n <w:t>a</w:t>\n </w:r>\n</w:p>";
        let text = text_from_document_xml(xml).unwrap();
        assert_eq!(text, "a\n");
    }

    #[test]
    fn oversized_document_xml_is_rejected() {
        // Highly compressible: a few hundred bytes zipped, 1 MiB inflated.
        let padding = " ".repeat(1024 * 1024);
        let bytes = docx_with(&format!("<w:document>{padding}</w:document>"));
        assert!(bytes.len() < 64 * 1024);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let entry = archive.by_name("word/document.xml").unwrap();
        let err = read_capped(entry, 4096).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
        assert!(err.to_string().contains("expands past 4096 bytes"));
    }

    #[test]
    fn document_xml_at_the_limit_is_read() {
        assert_eq!(read_capped(&b"<w:p/>"[..], 6).unwrap(), "<w:p/>");
        assert!(read_capped(&b"<w:p/>!"[..], 6).is_err());
    }

    #[test]
    fn not_a_zip_is_a_docx_error() {
        let err = extract_text(b"PK? nope").unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn archive_without_document_xml_is_a_docx_error() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = extract_text(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }
}
