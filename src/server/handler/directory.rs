use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Request, Response, ResponseBox, StatusCode};

use crate::{
    archive::{zip_directory, ArchiveBuffer},
    server::{
        router::Handler,
        util::{attachment, header},
    },
    util::format_data_size,
};

/// Serves a zip snapshot of a directory taken when the handler was built
pub struct ServeDirectory {
    archive: ArchiveBuffer,
    download_name: String,
}

impl ServeDirectory {
    pub fn new(dir: &Path) -> Result<Self> {
        let archive = zip_directory(dir)
            .with_context(|| format!("Failed archiving directory {}", dir.display()))?;
        let download_name = format!("{}.zip", base_name(dir));
        log::info!(
            "Prepared {download_name} ({})",
            format_data_size(archive.len() as u64)
        );
        Ok(Self {
            archive,
            download_name,
        })
    }
}

/// Last component of `dir`, resolving `.` and `..` through the file system when needed
fn base_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "archive".to_owned())
}

impl Handler for ServeDirectory {
    fn handle(&self, _request: &mut Request) -> anyhow::Result<ResponseBox> {
        let headers = vec![
            attachment(&self.download_name)?,
            header("Content-Type", "application/octet-stream")?,
        ];
        Ok(Response::new(
            StatusCode(200),
            headers,
            self.archive.reader(),
            Some(self.archive.len()),
            None,
        )
        .boxed())
    }
}
