//! Share set construction and teardown
//!
//! A single directory input is served in place. Anything else (several
//! inputs, or a lone file) is aggregated into a fresh temporary directory
//! holding one symbolic link per input, named after the input's basename.
//! Originals are never copied or moved.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logger;

/// Prefix of the temporary directories created for aggregated shares
const TEMP_DIR_PREFIX: &str = "fileshare-";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("nothing to share")]
    NoInputs,
    #[error("input does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("input has no file name: {}", .0.display())]
    NoFileName(PathBuf),
    #[error("two inputs share the name '{0}'")]
    DuplicateName(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The filesystem root a server instance exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSet {
    root: PathBuf,
    is_temporary: bool,
    display_name: Option<String>,
}

impl ShareSet {
    /// Aggregate absolute `inputs` into one servable root
    pub fn build(inputs: &[PathBuf]) -> Result<Self, ShareError> {
        let (first, rest) = inputs.split_first().ok_or(ShareError::NoInputs)?;

        for input in inputs {
            if fs::symlink_metadata(input).is_err() {
                return Err(ShareError::Missing(input.clone()));
            }
        }

        if rest.is_empty() && first.is_dir() {
            return Ok(Self {
                root: first.clone(),
                is_temporary: false,
                display_name: None,
            });
        }

        let temp = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()?;
        // Cleanup is ours: teardown removes links only, never recursively
        #[allow(deprecated)]
        let root = temp.into_path();
        let share = Self {
            root,
            is_temporary: true,
            display_name: None,
        };

        if let Err(e) = share.link_inputs(inputs) {
            // Leave nothing behind for a share that never started
            if let Err(cleanup) = share.teardown() {
                logger::log_warning(&format!(
                    "Cleanup of {} failed: {cleanup}",
                    share.root.display()
                ));
            }
            return Err(e);
        }

        let display_name = if rest.is_empty() {
            first_name(first).ok()
        } else {
            None
        };
        logger::log_share_created(&share.root, inputs.len());

        Ok(Self {
            display_name,
            ..share
        })
    }

    fn link_inputs(&self, inputs: &[PathBuf]) -> Result<(), ShareError> {
        for input in inputs {
            let name = first_name(input)?;
            let link = self.root.join(&name);
            if fs::symlink_metadata(&link).is_ok() {
                return Err(ShareError::DuplicateName(name));
            }
            symlink(input, &link)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    /// Basename of the single shared file, if that is what is shared
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Remove a temporary root and the links inside it
    ///
    /// Only symbolic links are removed and they are never followed, so the
    /// linked originals stay untouched. Anything else found in the root is
    /// left alone and keeps the directory from being removed. A share that
    /// is already gone is not an error.
    pub fn teardown(&self) -> io::Result<()> {
        if !self.is_temporary {
            return Ok(());
        }

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_symlink() {
                remove_symlink(&entry.path())?;
            } else {
                logger::log_warning(&format!(
                    "Leaving unexpected entry in share root: {}",
                    entry.path().display()
                ));
            }
        }

        fs::remove_dir(&self.root)?;
        logger::log_share_removed(&self.root);
        Ok(())
    }
}

fn first_name(path: &Path) -> Result<String, ShareError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ShareError::NoFileName(path.to_path_buf()))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(unix)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    // Directory links are removed like directories on Windows
    fs::remove_file(link).or_else(|_| fs::remove_dir(link))
}
