//! Resume Normalizer — turns raw input (pasted text or an uploaded file)
//! into a canonical `ParsedResume`.
//!
//! Parsing is deterministic: byte-identical input always yields an
//! identical `ParsedResume`. Unreadable content surfaces as
//! `MatchError::ParseFailure`, which fails the owning task; input-shape
//! problems surface as `MatchError::InvalidInput` before a task exists.

use std::collections::BTreeSet;
use std::io::Read;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::matching::skills::extract_skills;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TXT: &str = "text/plain";

const ALLOWED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOCX, MIME_TXT];

/// Titles are kept in document order (most recent first by resume
/// convention), capped here after case-insensitive dedup.
const MAX_TITLES: usize = 10;

const TITLE_KEYWORDS: [&str; 14] = [
    "engineer",
    "developer",
    "programmer",
    "architect",
    "manager",
    "director",
    "analyst",
    "scientist",
    "consultant",
    "designer",
    "administrator",
    "lead",
    "intern",
    "specialist",
];

/// Canonical parsed resume. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    /// Canonical, alias-folded skill set.
    pub skills: BTreeSet<String>,
    /// Job titles, most recent first.
    pub titles: Vec<String>,
    pub full_text: String,
}

/// Raw resume input as submitted by the client: exactly one of pasted text
/// or an uploaded file with a declared MIME type.
#[derive(Debug, Clone)]
pub enum ResumeInput {
    Text(String),
    File { bytes: Bytes, mime: String },
}

impl ResumeInput {
    /// Validates input shape before any task is created.
    pub fn validate(&self, max_upload_bytes: usize) -> Result<(), MatchError> {
        match self {
            ResumeInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(MatchError::InvalidInput(
                        "resume_text cannot be empty".to_string(),
                    ));
                }
            }
            ResumeInput::File { bytes, mime } => {
                if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
                    return Err(MatchError::InvalidInput(format!(
                        "unsupported file type '{mime}' (expected PDF, DOCX or plain text)"
                    )));
                }
                if bytes.is_empty() {
                    return Err(MatchError::InvalidInput(
                        "resume_file is empty".to_string(),
                    ));
                }
                if bytes.len() > max_upload_bytes {
                    return Err(MatchError::InvalidInput(format!(
                        "resume_file exceeds the {max_upload_bytes}-byte upload limit"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parses validated input into a `ParsedResume`.
pub fn parse_resume(input: &ResumeInput) -> Result<ParsedResume, MatchError> {
    let full_text = match input {
        ResumeInput::Text(text) => text.clone(),
        ResumeInput::File { bytes, mime } => extract_file_text(bytes, mime)?,
    };

    if full_text.trim().is_empty() {
        return Err(MatchError::ParseFailure(
            "no text could be extracted from the resume".to_string(),
        ));
    }

    let skills = extract_skills(&full_text);
    let titles = extract_titles(&full_text);

    Ok(ParsedResume {
        skills,
        titles,
        full_text,
    })
}

fn extract_file_text(bytes: &Bytes, mime: &str) -> Result<String, MatchError> {
    match mime {
        MIME_PDF => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| MatchError::ParseFailure(format!("unreadable PDF: {e}"))),
        MIME_DOCX => extract_docx_text(bytes),
        MIME_TXT => String::from_utf8(bytes.to_vec())
            .map_err(|_| MatchError::ParseFailure("text file is not valid UTF-8".to_string())),
        other => Err(MatchError::InvalidInput(format!(
            "unsupported file type '{other}'"
        ))),
    }
}

/// DOCX is a zip container; the document body lives in `word/document.xml`.
fn extract_docx_text(bytes: &Bytes) -> Result<String, MatchError> {
    let cursor = std::io::Cursor::new(bytes.as_ref());
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| MatchError::ParseFailure(format!("unreadable DOCX container: {e}")))?;

    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|_| MatchError::ParseFailure("DOCX has no word/document.xml".to_string()))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| MatchError::ParseFailure(format!("unreadable DOCX body: {e}")))?;

    Ok(docx_xml_to_text(&xml))
}

/// Strips the WordprocessingML markup, keeping paragraph breaks and tabs.
fn docx_xml_to_text(xml: &str) -> String {
    let xml = xml.replace("</w:p>", "</w:p>\n").replace("<w:tab/>", "\t");

    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_tag = false;
    for c in xml.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// Scans resume lines for role-shaped headings. Document order is treated
/// as recency order, which matches how resumes are conventionally written.
fn extract_titles(text: &str) -> Vec<String> {
    let mut titles = Vec::new();
    let mut seen = BTreeSet::new();

    for line in text.lines() {
        let line = line.trim().trim_end_matches([',', '.', ':']);
        if line.is_empty() || line.len() > 80 {
            continue;
        }
        let lower = line.to_lowercase();
        if TITLE_KEYWORDS.iter().any(|kw| lower.contains(kw)) && seen.insert(lower) {
            titles.push(line.to_string());
            if titles.len() >= MAX_TITLES {
                break;
            }
        }
    }

    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = "\
Jane Doe
Senior Backend Engineer
Previously: Software Developer at Acme

Experience with Python, SQL and Docker. Shipped services on AWS.
";

    #[test]
    fn test_parse_text_extracts_skills_and_titles() {
        let input = ResumeInput::Text(SAMPLE_RESUME.to_string());
        let parsed = parse_resume(&input).unwrap();

        assert!(parsed.skills.contains("python"));
        assert!(parsed.skills.contains("sql"));
        assert!(parsed.skills.contains("docker"));
        assert_eq!(parsed.titles[0], "Senior Backend Engineer");
        assert_eq!(parsed.titles.len(), 2);
    }

    #[test]
    fn test_parse_is_deterministic_for_identical_input() {
        let input = ResumeInput::Text(SAMPLE_RESUME.to_string());
        let first = parse_resume(&input).unwrap();
        let second = parse_resume(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_text_rejected_before_task_creation() {
        let input = ResumeInput::Text("   ".to_string());
        let err = input.validate(1024).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(_)));
    }

    #[test]
    fn test_disallowed_mime_rejected() {
        let input = ResumeInput::File {
            bytes: Bytes::from_static(b"GIF89a"),
            mime: "image/gif".to_string(),
        };
        let err = input.validate(1024).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(_)));
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let input = ResumeInput::File {
            bytes: Bytes::from(vec![b'a'; 2048]),
            mime: MIME_TXT.to_string(),
        };
        let err = input.validate(1024).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_utf8_text_file_is_parse_failure() {
        let input = ResumeInput::File {
            bytes: Bytes::from_static(&[0xff, 0xfe, 0xfd]),
            mime: MIME_TXT.to_string(),
        };
        let err = parse_resume(&input).unwrap_err();
        assert!(matches!(err, MatchError::ParseFailure(_)));
    }

    #[test]
    fn test_docx_extraction_roundtrip() {
        use std::io::Write;
        use zip::write::FileOptions;

        let xml = "<?xml version=\"1.0\"?><w:document><w:body>\
            <w:p><w:r><w:t>Staff Engineer</w:t></w:r></w:p>\
            <w:p><w:r><w:t>Rust &amp; Python services</w:t></w:r></w:p>\
            </w:body></w:document>";

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("word/document.xml", FileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let input = ResumeInput::File {
            bytes: Bytes::from(buf.into_inner()),
            mime: MIME_DOCX.to_string(),
        };
        let parsed = parse_resume(&input).unwrap();

        assert!(parsed.full_text.contains("Staff Engineer"));
        assert!(parsed.full_text.contains("Rust & Python services"));
        assert!(parsed.skills.contains("rust"));
        assert_eq!(parsed.titles, vec!["Staff Engineer".to_string()]);
    }

    #[test]
    fn test_corrupt_docx_is_parse_failure() {
        let input = ResumeInput::File {
            bytes: Bytes::from_static(b"definitely not a zip"),
            mime: MIME_DOCX.to_string(),
        };
        let err = parse_resume(&input).unwrap_err();
        assert!(matches!(err, MatchError::ParseFailure(_)));
    }
}
