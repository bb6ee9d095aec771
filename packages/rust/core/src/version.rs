//! Version labels derived from a model's directory path.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// A path segment such as `v2` or `v2.1.0`.
static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+(\.\d+)*$").expect("valid regex"));

/// Extract the version label for a model published under `rel_dir`.
///
/// Returns `" (v2.1)"` when exactly one segment looks like a version and an
/// empty string when none or several do.
pub fn version_label(rel_dir: &Path) -> String {
    let matches: Vec<String> = rel_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|s| VERSION_SEGMENT.is_match(s))
        .collect();

    match matches.as_slice() {
        [only] => format!(" ({only})"),
        _ => String::new(),
    }
}
