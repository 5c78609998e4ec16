//! Overlay name derivation.

use std::path::Path;

/// Name of the overlay an object belongs to: the directory holding it, or
/// the file stem when the path has no directory component.
///
/// `build/src/overlays/actors/ovl_En_Test/z_en_test.o` gives `ovl_En_Test`.
#[must_use]
pub fn overlay_name_from_path(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .or_else(|| path.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_directory() {
        let path = Path::new("build/src/overlays/actors/ovl_En_Test/z_en_test.o");
        assert_eq!(overlay_name_from_path(path).as_deref(), Some("ovl_En_Test"));
    }

    #[test]
    fn test_bare_file_falls_back_to_stem() {
        assert_eq!(overlay_name_from_path(Path::new("z_en_test.o")).as_deref(), Some("z_en_test"));
    }

    #[test]
    fn test_root() {
        assert_eq!(overlay_name_from_path(Path::new("/")), None);
    }
}
