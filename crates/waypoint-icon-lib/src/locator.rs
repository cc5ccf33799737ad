//! Discovery of GPX files in a directory

use crate::{IconError, Result};
use std::fs::ReadDir;
use std::path::{Path, PathBuf};

const GPX_SUFFIX: &str = ".gpx";

/// List the `.gpx` files of a directory
///
/// The sequence is lazy and follows the order of the directory listing, which is
/// platform-dependent. Only the directory itself is opened here; errors reading single
/// entries are yielded as they occur.
pub fn find_gpx_files(dir: impl AsRef<Path>) -> Result<GpxFiles> {
    let dir = dir.as_ref().to_path_buf();
    let entries = std::fs::read_dir(&dir).map_err(|err| IconError::io(&dir, err))?;
    Ok(GpxFiles { dir, entries })
}

/// Iterator returned by [`find_gpx_files`]
#[derive(Debug)]
pub struct GpxFiles {
    dir: PathBuf,
    entries: ReadDir,
}

impl Iterator for GpxFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(IconError::io(&self.dir, err))),
            };

            let file_name = entry.file_name();
            if file_name.to_string_lossy().ends_with(GPX_SUFFIX) {
                return Some(Ok(self.dir.join(file_name)));
            }
        }
    }
}
