//! Cache key resolution for thumbnail files
//!
//! A thumbnail's on-disk name embeds both the item id and the content
//! fingerprint, so a changed item version simply produces a different file
//! name. Old versions are never invalidated in place; they linger until the
//! bulk clear at startup. Concurrent writers can never collide on a name
//! because the fingerprint is part of it.

use cloudshelf_core::{Fingerprint, RemoteItem};
use std::path::{Path, PathBuf};

/// File extension of every cache entry.
pub const THUMBNAIL_EXTENSION: &str = "thumbnail";

/// Stable cache key for one item version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbKey {
    item_id: String,
    fingerprint: Fingerprint,
}

impl ThumbKey {
    /// Resolve the cache key for an item snapshot.
    pub fn for_item(item: &RemoteItem) -> Self {
        Self {
            item_id: item.id.clone(),
            fingerprint: item.fingerprint(),
        }
    }

    /// The item id this key belongs to.
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Flat file name: `{sanitized_id}_{fingerprint}.thumbnail`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            sanitize_id(&self.item_id),
            self.fingerprint,
            THUMBNAIL_EXTENSION
        )
    }

    /// Full path of the entry inside a cache directory.
    pub fn path_in(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.file_name())
    }
}

/// Map a remote id onto a filesystem-safe token.
///
/// Remote ids are opaque strings; bytes outside `[A-Za-z0-9.-]` (including
/// `%` itself) are written as `%XX` hex escapes. The encoding is injective,
/// so distinct ids always map to distinct file names, and the output can
/// never contain a path separator or the `_` fingerprint separator.
fn sanitize_id(id: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' => out.push(byte as char),
            other => {
                let _ = write!(out, "%{other:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudshelf_core::RemoteItem;

    #[test]
    fn test_file_name_embeds_id_and_fingerprint() {
        let item = RemoteItem::leaf("abc123", "photo.jpg", 1700000000000, 4096);
        let key = ThumbKey::for_item(&item);
        assert_eq!(key.file_name(), "abc123_1700000000000-4096.thumbnail");
    }

    #[test]
    fn test_changed_version_changes_file_name() {
        let v1 = RemoteItem::leaf("f", "a.jpg", 100, 10);
        let v2 = RemoteItem::leaf("f", "a.jpg", 200, 10);
        assert_ne!(
            ThumbKey::for_item(&v1).file_name(),
            ThumbKey::for_item(&v2).file_name()
        );
    }

    #[test]
    fn test_hostile_id_is_sanitized() {
        let item = RemoteItem::leaf("../etc/passwd", "x.jpg", 1, 1);
        let key = ThumbKey::for_item(&item);
        let name = key.file_name();
        assert!(!name.contains('/'));
        assert!(name.starts_with("..%2Fetc%2Fpasswd_"));
    }

    #[test]
    fn test_distinct_ids_never_share_a_file_name() {
        // "a_b" and "a-b" differ only in a byte the sanitizer rewrites.
        let underscore = RemoteItem::leaf("a_b", "x.jpg", 1, 1);
        let hyphen = RemoteItem::leaf("a-b", "x.jpg", 1, 1);
        let escaped = ThumbKey::for_item(&underscore).file_name();
        assert_ne!(escaped, ThumbKey::for_item(&hyphen).file_name());
        assert!(escaped.starts_with("a%5Fb_"));

        // An id containing a literal escape sequence stays distinct too.
        let literal = RemoteItem::leaf("a%5Fb", "x.jpg", 1, 1);
        assert_ne!(escaped, ThumbKey::for_item(&literal).file_name());
    }

    #[test]
    fn test_path_in_is_flat() {
        let item = RemoteItem::leaf("id with spaces", "x.jpg", 1, 1);
        let key = ThumbKey::for_item(&item);
        let path = key.path_in(Path::new("/tmp/cache"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/cache")));
    }
}
