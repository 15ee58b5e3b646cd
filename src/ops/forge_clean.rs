//! Implementation of `extforge clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::manifest::Manifest;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the build directory.
///
/// Returns the removed directory, or `None` if there was nothing to remove.
pub fn clean(manifest: &Manifest, build_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let dir = build_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.build_dir());

    if remove_dir_all_if_exists(&dir)? {
        tracing::debug!("removed {}", dir.display());
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_build_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Forge.toml");
        fs::write(&path, "[package]\nname = \"triumvirate\"\n").unwrap();
        fs::create_dir_all(tmp.path().join("build/temp/trv")).unwrap();
        let manifest = Manifest::load(&path).unwrap();

        let removed = clean(&manifest, None).unwrap();
        assert_eq!(removed, Some(tmp.path().join("build")));
        assert!(!tmp.path().join("build").exists());

        assert_eq!(clean(&manifest, None).unwrap(), None);
    }
}
