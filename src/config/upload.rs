use super::util::*;

/// Keyword that switches the server into upload mode
pub const UPLOAD_KEYWORD: &str = "upload";
/// Largest multipart body accepted by the upload endpoints (32 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 32 << 20;

#[derive(Debug, Args, Clone)]
pub struct UploadArgs {
    /// Directory uploaded files are written to (created if absent)
    #[arg(long = "upload-dir", default_value = UPLOAD_KEYWORD)]
    pub dir: PathBuf,

    /// Maximum size of an upload request body in bytes
    #[arg(long = "max-upload-size", default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    pub max_size: u64,
}
