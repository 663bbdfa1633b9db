//! ZIP archive member extraction.
//!
//! The data member is copied out into a private temporary directory so the
//! caller gets an owned, seekable file that can move onto a blocking thread.
//! The directory is removed when the [`ArchiveMember`] drops, on success and
//! on every error path alike.

use std::{
  ffi::OsStr,
  fs::File,
  io::{self, BufReader},
  path::{Component, Path, PathBuf},
};

use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{Error, Result};

/// One extracted archive member, alive as long as this value.
#[derive(Debug)]
pub struct ArchiveMember {
  name: String,
  path: PathBuf,
  _dir: TempDir,
}

impl ArchiveMember {
  /// Extract the first non-directory entry of `archive` whose name ends with
  /// one of `suffixes` (ASCII case-insensitive). Entries whose names are
  /// absolute or climb out of the archive root are skipped.
  pub fn extract(archive: impl AsRef<Path>, suffixes: &[&str]) -> Result<Self> {
    let archive = archive.as_ref();
    let mut zip = ZipArchive::new(File::open(archive)?)?;

    for i in 0..zip.len() {
      let mut entry = zip.by_index(i)?;
      if entry.is_dir() || !has_suffix(entry.name(), suffixes) {
        continue;
      }

      let name = entry.name().to_owned();
      let Some(enclosed) = entry.enclosed_name() else {
        warn!(archive = %archive.display(), member = %name, "skipping unsafe member name");
        continue;
      };
      let dir = TempDir::new()?;
      let path = dir.path().join(file_name(&enclosed));
      let mut out = File::create(&path)?;
      let bytes = io::copy(&mut entry, &mut out)?;
      out.sync_all()?;
      debug!(archive = %archive.display(), member = %name, bytes, "extracted archive member");

      return Ok(Self { name, path, _dir: dir });
    }

    Err(Error::NoMatchingMember {
      archive:  archive.to_path_buf(),
      suffixes: suffixes.iter().map(|s| (*s).to_owned()).collect(),
    })
  }

  /// The member's name inside the archive.
  pub fn name(&self) -> &str { &self.name }

  /// Location of the extracted copy; valid while `self` lives.
  pub fn path(&self) -> &Path { &self.path }

  pub fn open(&self) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(&self.path)?))
  }
}

fn has_suffix(name: &str, suffixes: &[&str]) -> bool {
  let lower = name.to_ascii_lowercase();
  suffixes.iter().any(|s| lower.ends_with(&s.to_ascii_lowercase()))
}

/// Last normal component of a sanitised member path; archives nest members
/// in folders.
fn file_name(enclosed: &Path) -> &OsStr {
  match enclosed.components().next_back() {
    Some(Component::Normal(name)) => name,
    _ => OsStr::new("member"),
  }
}
