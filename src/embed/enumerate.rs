#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::embed::error::PackResult;
use crate::embed::path::{matches_mask, normalize_rel_path};

/// A file selected for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path under the base directory, `/`-separated. Stored in the table.
    pub rel: String,
    /// Where to read the payload from.
    pub path: PathBuf,
}

/// Regular files under `base_dir` whose name ends with `filemask` (`*` for
/// all), ordered by the bytes of their relative path.
///
/// The order fixes both payload layout and table layout, so an unchanged
/// directory always packs to the same bytes.
pub fn enumerate(base_dir: &Path, filemask: &str) -> PackResult<Vec<SourceFile>> {
    let mut files: Vec<SourceFile> = Vec::new();
    for ent in WalkDir::new(base_dir).follow_links(false) {
        let ent = ent?;
        if !ent.file_type().is_file() {
            continue;
        }

        let name = ent.file_name().to_string_lossy();
        if !matches_mask(&name, filemask) {
            continue;
        }

        let rel = normalize_rel_path(base_dir, ent.path())?;
        files.push(SourceFile {
            rel,
            path: ent.path().to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.rel.as_bytes().cmp(b.rel.as_bytes()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rels(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel.as_str()).collect()
    }

    #[test]
    fn walks_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/deep")).unwrap();
        fs::write(dir.path().join("z.txt"), b"z").unwrap();
        fs::write(dir.path().join("b/deep/x.mo"), b"x").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b/c.txt"), b"c").unwrap();

        let files = enumerate(dir.path(), "*").unwrap();
        assert_eq!(rels(&files), ["a.txt", "b/c.txt", "b/deep/x.mo", "z.txt"]);
        assert_eq!(files[1].path, dir.path().join("b").join("c.txt"));
    }

    #[test]
    fn mask_filters_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("de")).unwrap();
        fs::write(dir.path().join("de/app.mo"), b"1").unwrap();
        fs::write(dir.path().join("de/app.po"), b"2").unwrap();
        fs::write(dir.path().join("readme"), b"3").unwrap();

        let files = enumerate(dir.path(), ".mo").unwrap();
        assert_eq!(rels(&files), ["de/app.mo"]);
    }

    #[test]
    fn directories_are_not_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty/nested")).unwrap();
        assert!(enumerate(dir.path(), "*").unwrap().is_empty());
    }

    #[test]
    fn missing_base_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(enumerate(&dir.path().join("gone"), "*").is_err());
    }
}
