//! The handlers wired up for each [`ServeTarget`] and the router builder that installs them.

use anyhow::Result;

use crate::{config::upload::UploadArgs, target::ServeTarget};

use self::{
    directory::ServeDirectory,
    file::ServeFile,
    literal::ServeString,
    upload::{ReceiveFile, ReceiveText, UploadLanding},
};
use super::router::Router;

pub mod directory;
pub mod file;
pub mod literal;
pub mod upload;

pub const UPLOAD_FILE_PATH: &str = "/upload";
pub const UPLOAD_TEXT_PATH: &str = "/upload-text";

/// Build the handlers for `target`.
///
/// Any work that has to happen before serving (archiving a directory, creating the upload
/// destination) happens here, so a failure stops startup before the socket is bound.
pub fn build_router(target: &ServeTarget, upload: &UploadArgs) -> Result<Router> {
    let router = match target {
        ServeTarget::File(path) => Router::new(ServeFile::new(path.clone())),
        ServeTarget::Directory(path) => Router::new(ServeDirectory::new(path)?),
        ServeTarget::Literal(text) => Router::new(ServeString::new(text.clone())),
        ServeTarget::UploadSink(dir) => Router::new(UploadLanding)
            .route(
                UPLOAD_FILE_PATH,
                ReceiveFile::new(dir.clone(), upload.max_size)?,
            )
            .route(UPLOAD_TEXT_PATH, ReceiveText::new(upload.max_size)),
    };
    log::debug!("Installed {target} handlers");
    Ok(router)
}
