use std::path::Path;
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Collect the base names of all regular files under `root` with the given
/// extension, in depth-first lexical order.
///
/// Entries that cannot be visited are skipped, so a missing root yields an
/// empty list.
#[instrument(name = "Scanning for files", skip(root), fields(root = %root.display()))]
pub fn scan(root: &Path, extension: &str) -> Vec<String> {
    let suffix = format!(".{}", extension);
    let names: Vec<String> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(&suffix))
        .collect();

    debug!(count = names.len(), "Matched files");
    names
}
