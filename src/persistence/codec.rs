//! On-disk form of a registry snapshot.
//!
//! The serialized JSON text is obfuscated before it hits the disk: the
//! characters are reversed and the result is base64 encoded. Reading undoes
//! both steps in the opposite order. This only keeps the file from being
//! plain readable text, it is NOT encryption and gives no confidentiality.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::prelude::*;
use log::{debug, warn};

use crate::error::StoreResult;

pub fn obfuscate(text: &str) -> String {
    let reversed: String = text.chars().rev().collect();
    BASE64_STANDARD.encode(reversed.as_bytes())
}

pub fn reveal(content: &[u8]) -> StoreResult<String> {
    //! Undo [`obfuscate`]. Whitespace in the encoded content is ignored and
    //! empty content decodes to an empty text.

    let encoded: Vec<u8> = content
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();

    if encoded.is_empty() {
        return Ok(String::new());
    }

    let reversed = String::from_utf8(BASE64_STANDARD.decode(encoded)?)?;
    Ok(reversed.chars().rev().collect())
}

pub fn write_snapshot(path: &Path, text: &str) -> StoreResult<()> {
    //! Write the obfuscated `text` to `path`.
    //!
    //! The content goes to a sibling temp file which is synced and then
    //! renamed over `path`, so a failed write leaves the old snapshot intact.

    let temp_path = temp_path_for(path);

    if let Err(error) = write_synced(&temp_path, obfuscate(text).as_bytes()) {
        warn!("snapshot write to {} failed: {}", temp_path.display(), error);
        let _ = fs::remove_file(&temp_path);
        return Err(error.into());
    }

    fs::rename(&temp_path, path)?;
    debug!("snapshot written to {}", path.display());

    Ok(())
}

pub fn read_snapshot(path: &Path) -> StoreResult<Option<String>> {
    //! Read and reveal the snapshot at `path`.
    //!
    //! Returns [`None`] when there is no file yet.

    match fs::read(path) {
        Ok(content) => Ok(Some(reveal(&content)?)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}
