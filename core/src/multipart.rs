//! `multipart/form-data` encoding for the bulk parameter endpoints.
//!
//! Every attachment is opened before the first byte is written. If one
//! cannot be opened the form is not encoded at all, and the handles opened
//! so far are dropped with the partially collected list.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;

/// Plain fields and file attachments for a multipart request.
///
/// Both are keyed by form name; iteration order is by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: BTreeMap<String, String>,
    files: BTreeMap<String, PathBuf>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from field values and attachment paths keyed by name.
    pub fn from_parts<F, V, A, P>(fields: F, files: A) -> Self
    where
        F: IntoIterator<Item = (String, V)>,
        V: Into<String>,
        A: IntoIterator<Item = (String, P)>,
        P: Into<PathBuf>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            files: files.into_iter().map(|(k, p)| (k, p.into())).collect(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.insert(name.into(), path.into());
        self
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn files(&self) -> &BTreeMap<String, PathBuf> {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Encode the form, reading attachments from the filesystem.
    pub fn encode(&self) -> Result<EncodedForm, ApiError> {
        self.encode_with(|path| File::open(path))
    }

    pub(crate) fn encode_with<R, O>(&self, mut open: O) -> Result<EncodedForm, ApiError>
    where
        R: Read,
        O: FnMut(&Path) -> io::Result<R>,
    {
        let mut attachments = Vec::with_capacity(self.files.len());
        for (name, path) in &self.files {
            let reader = open(path).map_err(|e| {
                ApiError::Construction(format!(
                    "failed to open attachment '{name}' at {}: {e}",
                    path.display()
                ))
            })?;
            attachments.push((name, file_name(path), reader));
        }

        let boundary = Uuid::new_v4().simple().to_string();
        let mut body = Vec::new();

        for (name, filename, mut reader) in attachments {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    escape_quotes(name),
                    escape_quotes(&filename),
                )
                .as_bytes(),
            );
            io::copy(&mut reader, &mut body).map_err(|e| {
                ApiError::Construction(format!("failed to read attachment '{name}': {e}"))
            })?;
            body.extend_from_slice(b"\r\n");
        }

        for (name, value) in &self.fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quotes(name),
                )
                .as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(EncodedForm { boundary, body })
    }
}

/// An encoded multipart body together with the boundary it was written with.
#[derive(Debug, Clone)]
pub struct EncodedForm {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl EncodedForm {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TrackedReader {
        inner: io::Cursor<Vec<u8>>,
        live: Arc<AtomicUsize>,
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn fields_and_files_share_the_declared_boundary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"logo-bytes").unwrap();

        let form = Form::new()
            .field("CLOUD.AUTHCODE", "token-1")
            .file("LOGO.FILE", file.path());
        let encoded = form.encode().unwrap();
        let body = String::from_utf8(encoded.body.clone()).unwrap();

        assert_eq!(
            encoded.content_type(),
            format!("multipart/form-data; boundary={}", encoded.boundary)
        );
        assert!(body.starts_with(&format!("--{}\r\n", encoded.boundary)));
        assert!(body.ends_with(&format!("--{}--\r\n", encoded.boundary)));
        assert!(body.contains("name=\"CLOUD.AUTHCODE\"\r\n\r\ntoken-1\r\n"));
        let expected_file = format!(
            "name=\"LOGO.FILE\"; filename=\"{}\"",
            file.path().file_name().unwrap().to_string_lossy()
        );
        assert!(body.contains(&expected_file));
        assert!(body.contains("logo-bytes"));
    }

    #[test]
    fn missing_attachment_fails_and_releases_opened_handles() {
        let live = Arc::new(AtomicUsize::new(0));
        let opened = Arc::new(AtomicUsize::new(0));
        let form = Form::new()
            .file("a", "/data/a.bin")
            .file("b", "/data/b.bin")
            .file("c", "/data/missing.bin")
            .field("x", "1");

        let err = form
            .encode_with(|path| {
                if path.ends_with("missing.bin") {
                    return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
                }
                opened.fetch_add(1, Ordering::SeqCst);
                live.fetch_add(1, Ordering::SeqCst);
                Ok(TrackedReader {
                    inner: io::Cursor::new(b"data".to_vec()),
                    live: Arc::clone(&live),
                })
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Construction);
        assert!(err.to_string().contains("missing.bin"));
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn every_handle_is_released_after_encoding() {
        let live = Arc::new(AtomicUsize::new(0));
        let form = Form::new().file("a", "a.bin").file("b", "b.bin");

        form.encode_with(|_| {
            live.fetch_add(1, Ordering::SeqCst);
            Ok(TrackedReader {
                inner: io::Cursor::new(Vec::new()),
                live: Arc::clone(&live),
            })
        })
        .unwrap();

        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let encoded = Form::new().field("we\"ird", "v").encode().unwrap();
        let body = String::from_utf8(encoded.body).unwrap();
        assert!(body.contains("name=\"we\\\"ird\""));
    }

    #[test]
    fn boundaries_differ_between_encodings() {
        let form = Form::new().field("a", "b");
        assert_ne!(
            form.encode().unwrap().boundary,
            form.encode().unwrap().boundary
        );
    }
}
