//! Media references and on-disk layout.
//!
//! The core stores image references by relative path and delegates the
//! production of derived sizes to an external thumbnailing collaborator.
//! Deletion of an entity's media tree is best-effort: a failure is logged
//! and swallowed, never blocking the entity deletion itself, so orphaned
//! files on disk are an accepted risk.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

/// Reference to one stored image and its derived sizes.
///
/// Paths are relative to the media root. Derived paths are filled in by
/// the thumbnailing collaborator and merely stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub original: String,
    pub large: Option<String>,
    pub medium: Option<String>,
    pub small: Option<String>,
}

impl ImageRef {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            large: None,
            medium: None,
            small: None,
        }
    }
}

/// Pixel dimensions of a derived image, parsed from the `"900x600"`
/// settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
}

static SIZE_SPEC_REGEX: OnceLock<Regex> = OnceLock::new();

impl SizeSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let regex = SIZE_SPEC_REGEX.get_or_init(|| Regex::new(r"^(\d+)x(\d+)$").unwrap());
        let caps = regex
            .captures(spec)
            .ok_or_else(|| Error::InvalidSizeSpec(spec.to_string()))?;
        let width = caps[1]
            .parse()
            .map_err(|_| Error::InvalidSizeSpec(spec.to_string()))?;
        let height = caps[2]
            .parse()
            .map_err(|_| Error::InvalidSizeSpec(spec.to_string()))?;
        Ok(Self { width, height })
    }
}

/// The three derived sizes configured for one image family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSet {
    pub large: SizeSpec,
    pub medium: SizeSpec,
    pub small: SizeSpec,
}

/// External image-processing collaborator.
///
/// Given an original image path and a target size, returns the path of
/// the derived image. The core never manipulates pixels.
pub trait Thumbnailer {
    fn derive(&self, original: &str, size: SizeSpec) -> Result<String>;
}

/// Fill an [`ImageRef`]'s derived paths through a thumbnailer.
pub fn derive_sizes<T: Thumbnailer>(
    thumbnailer: &T,
    image: &mut ImageRef,
    sizes: &SizeSet,
) -> Result<()> {
    image.large = Some(thumbnailer.derive(&image.original, sizes.large)?);
    image.medium = Some(thumbnailer.derive(&image.original, sizes.medium)?);
    image.small = Some(thumbnailer.derive(&image.original, sizes.small)?);
    Ok(())
}

// ==================== Media tree layout ====================

pub fn banner_media_dir(banner_id: i64) -> PathBuf {
    PathBuf::from(format!("banner/{}", banner_id))
}

pub fn category_media_dir(category_id: i64) -> PathBuf {
    PathBuf::from(format!("catalogue/{}", category_id))
}

pub fn item_media_dir(category_id: i64, item_id: i64) -> PathBuf {
    PathBuf::from(format!("catalogue/{}/item/{}", category_id, item_id))
}

pub fn item_parameter_media_dir(category_id: i64, item_id: i64, default_name: &str) -> PathBuf {
    PathBuf::from(format!(
        "catalogue/{}/item/{}/parameter/{}",
        category_id, item_id, default_name
    ))
}

pub fn gallery_media_dir(marker: &str) -> PathBuf {
    PathBuf::from(format!("gallery/{}", marker))
}

/// Remove an entity's media tree under the media root, best-effort.
///
/// Missing trees are fine; removal failures are logged and swallowed so
/// entity deletion never depends on the filesystem cooperating.
pub fn remove_media_tree(media_root: &Path, relative: &Path) {
    let path = media_root.join(relative);
    if !path.exists() {
        return;
    }
    if let Err(error) = std::fs::remove_dir_all(&path) {
        warn!(path = %path.display(), %error, "failed to remove media tree, leaving orphan");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== SizeSpec Tests ====================

    #[test]
    fn test_size_spec_parse() {
        let size = SizeSpec::parse("900x600").unwrap();
        assert_eq!(size.width, 900);
        assert_eq!(size.height, 600);
    }

    #[test]
    fn test_size_spec_rejects_garbage() {
        for bad in ["", "900", "x600", "900x", "900 x 600", "-1x5", "axb"] {
            assert!(SizeSpec::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    // ==================== Layout Tests ====================

    #[test]
    fn test_media_dirs_nest_by_entity() {
        assert_eq!(banner_media_dir(3), PathBuf::from("banner/3"));
        assert_eq!(
            item_media_dir(2, 14),
            PathBuf::from("catalogue/2/item/14")
        );
        assert_eq!(
            item_parameter_media_dir(2, 14, "color"),
            PathBuf::from("catalogue/2/item/14/parameter/color")
        );
        assert_eq!(gallery_media_dir("front"), PathBuf::from("gallery/front"));
    }

    // ==================== Removal Tests ====================

    #[test]
    fn test_remove_media_tree_deletes_existing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("banner/1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.jpg"), b"img").unwrap();

        remove_media_tree(root.path(), &banner_media_dir(1));
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_media_tree_tolerates_missing() {
        let root = tempfile::tempdir().unwrap();
        // Missing tree: nothing to do, nothing to fail.
        remove_media_tree(root.path(), &banner_media_dir(42));
    }

    // ==================== Thumbnailer Tests ====================

    struct FakeThumbnailer;

    impl Thumbnailer for FakeThumbnailer {
        fn derive(&self, original: &str, size: SizeSpec) -> Result<String> {
            Ok(format!("{}.{}x{}.jpg", original, size.width, size.height))
        }
    }

    #[test]
    fn test_derive_sizes_fills_all_three() {
        let sizes = SizeSet {
            large: SizeSpec::parse("900x600").unwrap(),
            medium: SizeSpec::parse("600x400").unwrap(),
            small: SizeSpec::parse("300x200").unwrap(),
        };
        let mut image = ImageRef::new("gallery/front/images/cover/cover.jpg");
        derive_sizes(&FakeThumbnailer, &mut image, &sizes).unwrap();
        assert_eq!(
            image.large.as_deref(),
            Some("gallery/front/images/cover/cover.jpg.900x600.jpg")
        );
        assert!(image.medium.is_some());
        assert!(image.small.is_some());
    }
}
