use std::path::Path;

use chrono::Utc;
use rand::Rng;

use crate::error::ApiError;

const NAME_TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NAME_TOKEN_LEN: usize = 6;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("请使用表单上传")]
    NotMultipart,
    #[error("Content-Type 缺少 boundary，请使用表单上传")]
    MissingBoundary,
    #[error("未找到文件")]
    FileNotFound,
    #[error("文件分段格式错误")]
    MalformedPart,
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        ApiError::soft(error.to_string())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsedUpload<'a> {
    /// Collision-resistant name the file is stored under.
    pub filename: String,
    pub original_name: String,
    pub content: &'a [u8],
}

pub fn boundary_from_content_type(content_type: &str) -> Result<&str, UploadError> {
    if !content_type
        .to_ascii_lowercase()
        .contains("multipart/form-data")
    {
        return Err(UploadError::NotMultipart);
    }

    let (_, rest) = content_type
        .split_once("boundary=")
        .ok_or(UploadError::MissingBoundary)?;
    let boundary = rest.split(';').next().unwrap_or_default().trim().trim_matches('"');

    if boundary.is_empty() {
        return Err(UploadError::MissingBoundary);
    }
    Ok(boundary)
}

pub fn parse_upload<'a>(body: &'a [u8], boundary: &str) -> Result<ParsedUpload<'a>, UploadError> {
    let delimiter = format!("--{boundary}");

    let mut saw_unterminated_file_part = false;

    for part in split_bytes(body, delimiter.as_bytes()) {
        let Some((headers, content)) = split_headers(part) else {
            saw_unterminated_file_part |= header_filename(part).is_some();
            continue;
        };
        let Some(original_name) = header_filename(headers) else {
            continue;
        };

        let content = content
            .strip_suffix(b"\r\n")
            .or_else(|| content.strip_suffix(b"\n"))
            .unwrap_or(content);

        return Ok(ParsedUpload {
            filename: generate_stored_name(&extension_of(&original_name)),
            original_name,
            content,
        });
    }

    if saw_unterminated_file_part {
        return Err(UploadError::MalformedPart);
    }
    Err(UploadError::FileNotFound)
}

/// `<unix millis>_<6 base36 chars><extension>`.
pub fn generate_stored_name(extension: &str) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..NAME_TOKEN_LEN)
        .map(|_| NAME_TOKEN_ALPHABET[rng.gen_range(0..NAME_TOKEN_ALPHABET.len())] as char)
        .collect();
    format!("{}_{token}{extension}", Utc::now().timestamp_millis())
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

// The header block ends at whichever blank line comes first.
fn split_headers(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let crlf = find(part, b"\r\n\r\n").map(|index| (index, 4));
    let lf = find(part, b"\n\n").map(|index| (index, 2));
    let (index, len) = match (crlf, lf) {
        (Some(crlf), Some(lf)) => crlf.min(lf),
        (crlf, lf) => crlf.or(lf)?,
    };
    Some((&part[..index], &part[index + len..]))
}

fn header_filename(headers: &[u8]) -> Option<String> {
    const MARKER: &[u8] = b"filename=\"";

    let start = find(headers, MARKER)? + MARKER.len();
    let len = headers[start..].iter().position(|byte| *byte == b'"')?;
    if len == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&headers[start..start + len]).into_owned())
}

fn split_bytes<'a>(haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(index) = find(rest, delimiter) {
        parts.push(&rest[..index]);
        rest = &rest[index + delimiter.len()..];
    }
    parts.push(rest);
    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
