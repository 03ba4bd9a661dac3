//! Uploaded files and the `multipart/form-data` extractor
//!
//! ```rust,ignore
//! use webassist_core::{ApiError, Form};
//!
//! async fn upload(form: Form) -> Result<String, ApiError> {
//!     let file = form
//!         .file("avatar")
//!         .ok_or_else(|| ApiError::bad_request("avatar is required"))?;
//!     let path = file.save_to("./uploads", None).await?;
//!     Ok(path.display().to_string())
//! }
//! ```

use crate::error::{ApiError, Result};
use crate::extract::FromRequest;
use crate::request::Request;
use bytes::Bytes;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct FormFile {
    name: String,
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl FormFile {
    /// Wrap an uploaded file
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Form field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name as sent by the client (unsanitized)
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content type sent with the part
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size of the file in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file has no contents
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The file contents without copying
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// The file contents as an owned byte array
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// A readable stream positioned at the start of the contents
    ///
    /// The cursor implements both `std::io::Read` and `tokio::io::AsyncRead`.
    pub fn to_stream(&self) -> Cursor<Bytes> {
        Cursor::new(self.data.clone())
    }

    /// Copy the contents into an async writer
    pub async fn copy_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.data).await?;
        writer.flush().await
    }

    /// Save the file into `dir`
    ///
    /// Uses the client file name unless `file_name` is given; either way the
    /// name is sanitized so it cannot escape `dir`.
    pub async fn save_to(&self, dir: impl AsRef<Path>, file_name: Option<&str>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload directory: {}", e)))?;

        let safe = sanitize_filename(file_name.unwrap_or(&self.file_name));
        if safe.is_empty() {
            return Err(ApiError::bad_request("Uploaded file has no usable file name"));
        }

        let path = dir.join(safe);
        tokio::fs::write(&path, &self.data)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to save file: {}", e)))?;

        tracing::debug!(path = %path.display(), size = self.data.len(), "Saved uploaded file");
        Ok(path)
    }
}

/// Strip path separators and parent references from a client file name
fn sanitize_filename(file_name: &str) -> String {
    file_name
        .replace(['/', '\\'], "_")
        .replace("..", "_")
        .trim_start_matches('.')
        .to_string()
}

/// Parsed `multipart/form-data` body
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: Vec<(String, String)>,
    files: Vec<FormFile>,
}

impl Form {
    /// First text field with the given name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All plain form fields, in order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First file with the given field name
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// All uploaded files, in order
    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    /// Take ownership of the uploaded files
    pub fn into_files(self) -> Vec<FormFile> {
        self.files
    }
}

impl FromRequest for Form {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let content_type = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::bad_request("Missing Content-Type header"))?;

        if !content_type.starts_with("multipart/form-data") {
            return Err(ApiError::bad_request(format!(
                "Expected multipart/form-data, got: {}",
                content_type
            )));
        }

        let boundary = extract_boundary(content_type)
            .ok_or_else(|| ApiError::bad_request("Missing boundary in Content-Type"))?;

        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;

        parse_multipart(&body, &boundary)
    }
}

fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn strip_line_end(body: &[u8], start: usize, mut end: usize) -> usize {
    if end >= start + 2 && &body[end - 2..end] == b"\r\n" {
        end -= 2;
    } else if end > start && body[end - 1] == b'\n' {
        end -= 1;
    }
    end
}

/// Binary-safe multipart parser
fn parse_multipart(body: &Bytes, boundary: &str) -> Result<Form> {
    let malformed = || ApiError::bad_request("Malformed multipart body");
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut form = Form::default();

    let mut pos = find(body, &delimiter, 0).ok_or_else(malformed)? + delimiter.len();
    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            break;
        }
        if rest.starts_with(b"\r\n") {
            pos += 2;
        } else if rest.starts_with(b"\n") {
            pos += 1;
        }

        let next = find(body, &delimiter, pos).ok_or_else(malformed)?;
        let end = strip_line_end(body, pos, next);
        let part = body.slice(pos..end);
        pos = next + delimiter.len();

        let (split, sep_len) = match find(&part, b"\r\n\r\n", 0) {
            Some(i) => (i, 4),
            None => match find(&part, b"\n\n", 0) {
                Some(i) => (i, 2),
                None => continue,
            },
        };

        let headers = String::from_utf8_lossy(&part[..split]);
        let data = part.slice(split + sep_len..);

        let mut name = None;
        let mut file_name = None;
        let mut content_type = None;
        for line in headers.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "content-disposition" => {
                    for param in value.split(';').map(str::trim) {
                        if let Some(v) = param.strip_prefix("name=") {
                            name = Some(v.trim_matches('"').to_string());
                        } else if let Some(v) = param.strip_prefix("filename=") {
                            file_name = Some(v.trim_matches('"').to_string());
                        }
                    }
                }
                "content-type" => content_type = Some(value.to_string()),
                _ => {}
            }
        }

        let Some(name) = name else {
            continue;
        };
        match file_name {
            Some(file_name) => form
                .files
                .push(FormFile::new(name, file_name, content_type, data)),
            None => form
                .fields
                .push((name, String::from_utf8_lossy(&data).into_owned())),
        }
    }

    Ok(form)
}
