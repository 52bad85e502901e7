//! Extension-based file classification.
//!
//! Selections coming from a browser carry a media type; files picked up from
//! disk only carry a name. These helpers map a file name's extension to a
//! display category and to a best-effort media type.
use serde::{Deserialize, Serialize};

/// Display category of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Word,
    Text,
    Presentation,
    Spreadsheet,
    Archive,
    Image,
    Video,
    Audio,
    Other,
}

impl FileKind {
    /// Classifies `name` by its (case-insensitive) extension.
    ///
    /// ```rust
    /// use ingest::FileKind;
    ///
    /// assert_eq!(FileKind::from_name("Lecture-01.PDF"), FileKind::Pdf);
    /// assert_eq!(FileKind::from_name("README"), FileKind::Other);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("doc" | "docx") => FileKind::Word,
            Some("txt") => FileKind::Text,
            Some("ppt" | "pptx") => FileKind::Presentation,
            Some("xls" | "xlsx") => FileKind::Spreadsheet,
            Some("zip" | "rar") => FileKind::Archive,
            Some("jpg" | "jpeg" | "png" | "gif") => FileKind::Image,
            Some("mp4") => FileKind::Video,
            Some("mp3") => FileKind::Audio,
            _ => FileKind::Other,
        }
    }

    /// Lower-case label, e.g. `"spreadsheet"`.
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Word => "word",
            FileKind::Text => "text",
            FileKind::Presentation => "presentation",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Archive => "archive",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Other => "other",
        }
    }
}

/// Best-effort media type for `name`, or `""` when the extension is unknown.
///
/// ```rust
/// use ingest::media_type_for_name;
///
/// assert_eq!(media_type_for_name("essay.docx"),
///     "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
/// assert_eq!(media_type_for_name("data.bin"), "");
/// ```
pub fn media_type_for_name(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("zip") => "application/zip",
        Some("rar") => "application/vnd.rar",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        _ => "",
    }
}

fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        let cases = [
            ("notes.txt", FileKind::Text),
            ("slides.pptx", FileKind::Presentation),
            ("grades.XLS", FileKind::Spreadsheet),
            ("bundle.rar", FileKind::Archive),
            ("photo.jpeg", FileKind::Image),
            ("talk.mp4", FileKind::Video),
            ("song.mp3", FileKind::Audio),
            ("essay.doc", FileKind::Word),
            ("archive.tar.gz", FileKind::Other),
            (".gitignore", FileKind::Other),
            ("trailing.", FileKind::Other),
        ];

        for (name, expected) in cases {
            assert_eq!(FileKind::from_name(name), expected, "name = {name}");
        }
    }

    #[test]
    fn media_type_matches_kind_table() {
        assert_eq!(media_type_for_name("a.PNG"), "image/png");
        assert_eq!(media_type_for_name("a.jpg"), media_type_for_name("b.jpeg"));
        assert_eq!(media_type_for_name("no_extension"), "");
    }

    #[test]
    fn label_is_lowercase() {
        assert_eq!(FileKind::Spreadsheet.label(), "spreadsheet");
    }
}
