//! Cheap format detection for candidate input files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// File extensions the loader accepts, most specific first.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = [".docling.json", ".json"];

/// Bytes read from a plain `.json` file when sniffing its content.
const SNIFF_BYTES: u64 = 512;

const MARKERS: [&str; 3] = ["\"schema_name\"", "\"DoclingDocument\"", "\"version\""];

/// Whether `path` looks like a Docling JSON document.
///
/// `*.docling.json` files are accepted on name alone. Plain `*.json` files
/// must mention the schema markers in their first 512 bytes. Never fails: a
/// missing or unreadable file is simply not a match.
pub fn detect_format(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_ascii_lowercase(),
        None => return false,
    };

    if name.ends_with(SUPPORTED_EXTENSIONS[0]) {
        return true;
    }
    if !name.ends_with(SUPPORTED_EXTENSIONS[1]) {
        return false;
    }

    match sniff(path) {
        Ok(head) => MARKERS.iter().all(|marker| head.contains(marker)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Could not sniff file");
            false
        }
    }
}

fn sniff(path: &Path) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_BYTES as usize);
    File::open(path)?.take(SNIFF_BYTES).read_to_end(&mut head)?;
    Ok(String::from_utf8_lossy(&head).into_owned())
}
