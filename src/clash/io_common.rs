use std::path::{Path, PathBuf};

/// The raw content of a dataset: a header and rows of textual cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Dataset {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Paths in a configuration file are relative to the directory of this file.
pub fn resolve_path(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        let full: PathBuf = root.join(p);
        full.display().to_string()
    }
}
