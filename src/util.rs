use anyhow::{bail, Result};

/// Format a value to a human readable byte magnitude description
pub fn format_data_size(size_bytes: u64) -> String {
    const KI_B_VAL: u64 = 1024;
    const KI_B_DIVIDER: f64 = 1024_f64;
    const MI_B_VAL: u64 = 1024 * KI_B_VAL;
    const MI_B_DIVIDER: f64 = MI_B_VAL as f64;
    const GI_B_VAL: u64 = 1024 * MI_B_VAL;
    const GI_B_DIVIDER: f64 = GI_B_VAL as f64;
    match size_bytes {
        0..=KI_B_VAL => {
            format!("{size_bytes} B")
        }
        1025..=MI_B_VAL => {
            let kib_bytes = size_bytes as f64 / KI_B_DIVIDER;
            format!("{kib_bytes:.2} KiB")
        }
        1048577..=GI_B_VAL => {
            let mib_bytes = size_bytes as f64 / MI_B_DIVIDER;
            format!("{mib_bytes:.2} MiB")
        }
        _ => {
            let gib_bytes = size_bytes as f64 / GI_B_DIVIDER;
            format!("{gib_bytes:.2} GiB")
        }
    }
}

/// Reduce a client supplied file name to its last path component.
///
/// Both `/` and `\` count as separators no matter the host platform, so
/// `../../etc/passwd` and `..\..\boot.ini` become `passwd` and `boot.ini`.
pub fn sanitize_file_name(raw: &str) -> Result<&str> {
    let base = raw.rsplit(&['/', '\\'][..]).next().unwrap_or_default();
    match base {
        "" | "." | ".." => bail!("'{raw}' does not contain a usable file name"),
        _ if base.contains('\0') => bail!("'{raw}' contains a NUL byte"),
        _ => Ok(base),
    }
}
