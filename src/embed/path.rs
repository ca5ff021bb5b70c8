#![forbid(unsafe_code)]

use std::path::Path;

use crate::embed::error::{PackError, PackResult};

/// Path of `file_path` under `base`, joined with `/` whatever the host separator.
pub fn normalize_rel_path(base: &Path, file_path: &Path) -> PackResult<String> {
    let rel = file_path.strip_prefix(base).map_err(|_| {
        PackError::Invalid(format!(
            "path is outside base directory: {}",
            file_path.display()
        ))
    })?;

    let mut out = String::new();
    for (i, comp) in rel.components().enumerate() {
        if i != 0 {
            out.push('/');
        }
        let part = comp.as_os_str().to_str().ok_or_else(|| {
            PackError::Invalid(format!("path is not utf8: {}", file_path.display()))
        })?;
        out.push_str(part);
    }
    out = out.replace('\\', "/");

    if out.is_empty() {
        return Err(PackError::Invalid("empty relative path".into()));
    }
    // Records are NUL-terminated on disk.
    if out.contains('\0') {
        return Err(PackError::Invalid(format!("path contains NUL: {out:?}")));
    }

    Ok(out)
}

/// Plain suffix match on the file name; `*` or an empty mask accepts everything.
pub fn matches_mask(file_name: &str, mask: &str) -> bool {
    mask.is_empty() || mask == "*" || file_name.ends_with(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn nested_paths_use_forward_slashes() {
        let base = PathBuf::from("root");
        let file = base.join("b").join("c.txt");
        assert_eq!(normalize_rel_path(&base, &file).unwrap(), "b/c.txt");
    }

    #[test]
    fn outside_base_is_rejected() {
        let err = normalize_rel_path(Path::new("root"), Path::new("other/x")).unwrap_err();
        assert!(matches!(err, PackError::Invalid(_)));
    }

    #[test]
    fn base_itself_is_rejected() {
        assert!(normalize_rel_path(Path::new("root"), Path::new("root")).is_err());
    }

    #[test]
    fn mask_is_suffix_not_glob() {
        assert!(matches_mask("strings.mo", "*"));
        assert!(matches_mask("strings.mo", ""));
        assert!(matches_mask("strings.mo", ".mo"));
        assert!(!matches_mask("strings.mo", "*.mo"));
        assert!(!matches_mask("strings.po", ".mo"));
    }
}
