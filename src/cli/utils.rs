use camino::Utf8PathBuf;
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &str, label: &str) -> SimpleResult<()> {
    if filename.is_empty() {
        bail!("Must specify {label} file");
    }
    let path = std::path::Path::new(&filename);
    if !path.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !path.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

/// Canonicalize a path stored in string form
///
/// Assumes the path has already been checked to exist
///
pub fn canonicalize_string_path(s: &str) -> String {
    Utf8PathBuf::from(s)
        .canonicalize_utf8()
        .unwrap()
        .to_string()
}
