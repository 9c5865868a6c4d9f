use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use strum_macros::Display;
use tiny_http::{Request, Response, ResponseBox};

use crate::server::{
    router::Handler,
    util::{attachment, header},
};

/// Extensions browsers render directly, everything else is offered as a download
const INLINE_EXTENSIONS: [&str; 4] = ["html", "htm", "css", "js"];

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn for_path(path: &Path) -> Self {
        let inline = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| INLINE_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(ext)));
        if inline {
            Self::Inline
        } else {
            Self::Attachment
        }
    }
}

/// Streams a single file, reopened on every request
pub struct ServeFile {
    path: PathBuf,
    content_type: String,
    disposition: Disposition,
    download_name: String,
}

impl ServeFile {
    pub fn new(path: PathBuf) -> Self {
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        let disposition = Disposition::for_path(&path);
        let download_name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();
        log::debug!("{} served as {content_type} ({disposition})", path.display());
        Self {
            path,
            content_type,
            disposition,
            download_name,
        }
    }
}

impl Handler for ServeFile {
    fn handle(&self, _request: &mut Request) -> anyhow::Result<ResponseBox> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed opening {}", self.path.display()))?;
        let mut response =
            Response::from_file(file).with_header(header("Content-Type", &self.content_type)?);
        if self.disposition == Disposition::Attachment {
            response = response.with_header(attachment(&self.download_name)?);
        }
        Ok(response.boxed())
    }
}
