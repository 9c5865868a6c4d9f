use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{anyhow, bail, ensure, Context, Result};
use multipart::server::Multipart;
use serde::Deserialize;
use tiny_http::{Request, Response, ResponseBox};

use crate::{
    server::{
        router::Handler,
        util::{header, header_value, peer, see_other},
    },
    util::{format_data_size, sanitize_file_name},
};

/// Page with the file and text upload forms
pub const UPLOAD_PAGE: &str = include_str!("../../../assets/upload.html");

pub const FILE_FIELD: &str = "file";
pub const TEXT_FIELD: &str = "text";

pub struct UploadLanding;

impl Handler for UploadLanding {
    fn handle(&self, _request: &mut Request) -> Result<ResponseBox> {
        Ok(Response::from_data(UPLOAD_PAGE.as_bytes())
            .with_header(header("Content-Type", "text/html; charset=utf-8")?)
            .boxed())
    }
}

/// Stores the `file` field of a multipart form in the destination directory
pub struct ReceiveFile {
    destination: PathBuf,
    max_size: u64,
}

impl ReceiveFile {
    /// Creates `destination` if it doesn't exist yet
    pub fn new(destination: PathBuf, max_size: u64) -> Result<Self> {
        if destination.exists() && !destination.is_dir() {
            bail!(
                "Upload destination {} exists but is not a directory",
                destination.display()
            );
        }
        fs::create_dir_all(&destination).with_context(|| {
            format!("Failed creating upload directory {}", destination.display())
        })?;
        Ok(Self {
            destination,
            max_size,
        })
    }
}

impl Handler for ReceiveFile {
    fn handle(&self, request: &mut Request) -> Result<ResponseBox> {
        let peer = peer(request);
        let boundary = multipart_boundary(request)?;
        let body = capped_body(request, self.max_size)?;
        let mut form = Multipart::with_body(body, boundary);

        let (raw_name, payload) = read_file_field(&mut form)?;
        let base_name = sanitize_file_name(&raw_name)?;
        let destination = self.destination.join(base_name);
        log::info!(
            "Uploading ({peer}): {raw_name} -> {}",
            destination.display()
        );

        fs::write(&destination, &payload)
            .with_context(|| format!("Failed writing {}", destination.display()))?;
        log::info!(
            "File uploaded successfully: {} [{} B]",
            format_data_size(payload.len() as u64),
            payload.len()
        );
        see_other("/")
    }
}

/// Read the first `file` field completely, nothing touches the disk before this succeeds
fn read_file_field<R: Read>(form: &mut Multipart<R>) -> Result<(String, Vec<u8>)> {
    while let Some(mut field) = form.read_entry()? {
        if &*field.headers.name != FILE_FIELD {
            tracing::trace!("Skipping form field {}", field.headers.name);
            continue;
        }
        let raw_name = field
            .headers
            .filename
            .clone()
            .ok_or_else(|| anyhow!("Form field `{FILE_FIELD}` carries no file name"))?;
        let mut payload = Vec::new();
        field
            .data
            .read_to_end(&mut payload)
            .context("Failed reading uploaded file")?;
        return Ok((raw_name, payload));
    }
    bail!("Form has no `{FILE_FIELD}` field")
}

/// Logs submitted text, nothing is written to disk
pub struct ReceiveText {
    max_size: u64,
}

#[derive(Debug, Default, Deserialize)]
struct TextForm {
    #[serde(default)]
    text: String,
}

impl ReceiveText {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }
}

impl Handler for ReceiveText {
    fn handle(&self, request: &mut Request) -> Result<ResponseBox> {
        let text = if is_multipart(request) {
            let boundary = multipart_boundary(request)?;
            let body = capped_body(request, self.max_size)?;
            read_text_field(&mut Multipart::with_body(body, boundary))?
        } else {
            let mut raw = Vec::new();
            capped_body(request, self.max_size)?
                .read_to_end(&mut raw)
                .context("Failed reading form body")?;
            serde_urlencoded::from_bytes::<TextForm>(&raw)
                .context("Malformed form body")?
                .text
        };
        log::debug!("Received {} B of text from {}", text.len(), peer(request));
        println!("Received text: ```\n{text}\n```");
        see_other("/")
    }
}

fn read_text_field<R: Read>(form: &mut Multipart<R>) -> Result<String> {
    while let Some(mut field) = form.read_entry()? {
        if &*field.headers.name == TEXT_FIELD {
            let mut text = String::new();
            field
                .data
                .read_to_string(&mut text)
                .context("Failed reading text field")?;
            return Ok(text);
        }
    }
    Ok(String::new())
}

fn is_multipart(request: &Request) -> bool {
    header_value(request, "Content-Type").is_some_and(|ct| {
        ct.trim_start()
            .to_ascii_lowercase()
            .starts_with("multipart/form-data")
    })
}

/// The `boundary` parameter of a `multipart/form-data` content type
fn multipart_boundary(request: &Request) -> Result<String> {
    let content_type = header_value(request, "Content-Type")
        .ok_or_else(|| anyhow!("Upload request has no Content-Type"))?;
    parse_boundary(content_type)
}

fn parse_boundary(content_type: &str) -> Result<String> {
    let mut parts = content_type.split(';');
    let mime = parts.next().unwrap_or_default().trim();
    ensure!(
        mime.eq_ignore_ascii_case("multipart/form-data"),
        "Expected multipart/form-data, got '{mime}'"
    );
    parts
        .filter_map(|p| p.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| anyhow!("Content-Type '{content_type}' has no boundary"))
}

/// The request body, refusing to yield more than `max_size` bytes.
///
/// A declared `Content-Length` above the limit is refused before anything is read.
fn capped_body(request: &mut Request, max_size: u64) -> Result<CappedReader<&mut dyn Read>> {
    if let Some(len) = request.body_length() {
        ensure!(
            len as u64 <= max_size,
            "Request body of {} exceeds the {} limit",
            format_data_size(len as u64),
            format_data_size(max_size)
        );
    }
    Ok(CappedReader::new(request.as_reader(), max_size))
}

/// Errors instead of returning EOF once the inner reader continues past the limit
pub struct CappedReader<R> {
    inner: R,
    remaining: u64,
    limit: u64,
}

impl<R: Read> CappedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            limit,
        }
    }
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let mut extra = [0_u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Request body exceeds the {} limit",
                        format_data_size(self.limit)
                    ),
                )),
            };
        }
        let max = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
