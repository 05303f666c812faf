//! Default placeholder icons
//!
//! Every slot shows a placeholder before its thumbnail arrives, and keeps
//! it when the item has no thumbnail or the fetch failed. Resolution is by
//! item kind and extension only; actual icon assets belong to the display
//! layer.

use cloudshelf_core::{ItemKind, RemoteItem};

/// Placeholder image identifier understood by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderIcon {
    /// Private folder
    Folder,

    /// Folder shared with collaborators
    SharedFolder,

    /// Raster or vector image file
    Image,

    /// Video file
    Video,

    /// Audio file
    Audio,

    /// Text or office document
    Document,

    /// Compressed archive
    Archive,

    /// Anything unrecognized, and synthetic rows
    Generic,
}

/// Resolver from item to placeholder icon.
pub trait DefaultIconResolver: Send + Sync {
    /// Icon to show for this item before or instead of a thumbnail.
    fn icon_for(&self, item: &RemoteItem) -> PlaceholderIcon;
}

/// Extension-table resolver used when the host supplies nothing fancier.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionIconResolver;

impl DefaultIconResolver for ExtensionIconResolver {
    fn icon_for(&self, item: &RemoteItem) -> PlaceholderIcon {
        match &item.kind {
            ItemKind::Container { shared: true } => PlaceholderIcon::SharedFolder,
            ItemKind::Container { shared: false } => PlaceholderIcon::Folder,
            ItemKind::SyntheticRow(_) => PlaceholderIcon::Generic,
            ItemKind::Leaf { extension } => match extension.as_deref() {
                Some("jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "heic") => {
                    PlaceholderIcon::Image
                }
                Some("mp4" | "mov" | "avi" | "mkv" | "webm") => PlaceholderIcon::Video,
                Some("mp3" | "wav" | "flac" | "ogg" | "m4a") => PlaceholderIcon::Audio,
                Some("pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "md") => {
                    PlaceholderIcon::Document
                }
                Some("zip" | "tar" | "gz" | "7z" | "rar") => PlaceholderIcon::Archive,
                _ => PlaceholderIcon::Generic,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudshelf_core::SyntheticKind;

    #[test]
    fn test_folders_split_by_shared_flag() {
        let resolver = ExtensionIconResolver;
        let private = RemoteItem::container("d", "Docs", 1, false);
        let shared = RemoteItem::container("d", "Docs", 1, true);
        assert_eq!(resolver.icon_for(&private), PlaceholderIcon::Folder);
        assert_eq!(resolver.icon_for(&shared), PlaceholderIcon::SharedFolder);
    }

    #[test]
    fn test_extensions_map_to_media_icons() {
        let resolver = ExtensionIconResolver;
        assert_eq!(
            resolver.icon_for(&RemoteItem::leaf("1", "pic.JPG", 1, 1)),
            PlaceholderIcon::Image
        );
        assert_eq!(
            resolver.icon_for(&RemoteItem::leaf("2", "song.flac", 1, 1)),
            PlaceholderIcon::Audio
        );
        assert_eq!(
            resolver.icon_for(&RemoteItem::leaf("3", "notes", 1, 1)),
            PlaceholderIcon::Generic
        );
    }

    #[test]
    fn test_synthetic_rows_are_generic() {
        let resolver = ExtensionIconResolver;
        let row = RemoteItem::synthetic(SyntheticKind::Retry);
        assert_eq!(resolver.icon_for(&row), PlaceholderIcon::Generic);
    }
}
