//! Upload acceptance policy.

use crate::attachment::naming::extension_of;
use crate::model::validation::ValidationError;

/// Upload ceiling applied when configuration does not override it.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];
const PROJECT_MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "stl", "step", "stp", "iges", "igs", "obj",
    "dxf", "dwg", "3mf", "f3d",
];
const IMAGE_CONTENT_TYPES: &[&str] = &["image/"];
const PROJECT_MEDIA_CONTENT_TYPES: &[&str] = &["image/", "model/", "application/"];

/// File received from a client, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Client-side file name; only its extension is trusted.
    pub original_name: String,
    /// Declared MIME type, when the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Size ceiling plus extension and content-type allow-lists for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    /// Prefix of generated stored names.
    pub name_prefix: &'static str,
    pub max_bytes: u64,
    /// Lowercase extensions without the dot.
    pub allowed_extensions: &'static [&'static str],
    /// Accepted MIME type prefixes, e.g. `image/`.
    pub allowed_content_types: &'static [&'static str],
}

impl AttachmentPolicy {
    /// Profile pictures: images only.
    pub fn profile_picture() -> Self {
        Self {
            name_prefix: "profile",
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: IMAGE_EXTENSIONS,
            allowed_content_types: IMAGE_CONTENT_TYPES,
        }
    }

    /// Project attachments: images plus CAD/3D model files.
    pub fn project_media() -> Self {
        Self {
            name_prefix: "project",
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: PROJECT_MEDIA_EXTENSIONS,
            allowed_content_types: PROJECT_MEDIA_CONTENT_TYPES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Accepts or rejects an upload without touching any storage.
    pub fn check(&self, file: &IncomingFile) -> Result<(), ValidationError> {
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                file_name: file.original_name.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                max_bytes: self.max_bytes,
            });
        }

        let extension_allowed = extension_of(&file.original_name)
            .is_some_and(|ext| self.allowed_extensions.contains(&ext.as_str()));
        if !extension_allowed {
            return Err(ValidationError::DisallowedExtension {
                file_name: file.original_name.clone(),
            });
        }

        if let Some(content_type) = file.content_type.as_deref() {
            let normalized = content_type.trim().to_ascii_lowercase();
            let type_allowed = normalized.is_empty()
                || self
                    .allowed_content_types
                    .iter()
                    .any(|prefix| normalized.starts_with(prefix));
            if !type_allowed {
                return Err(ValidationError::DisallowedContentType {
                    content_type: content_type.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentPolicy, IncomingFile, DEFAULT_MAX_UPLOAD_BYTES};
    use crate::model::validation::ValidationError;

    #[test]
    fn rejects_file_over_ceiling() {
        let policy = AttachmentPolicy::profile_picture();
        let file = IncomingFile::new("big.png", vec![0; 6 * 1024 * 1024]);
        assert_eq!(
            policy.check(&file),
            Err(ValidationError::FileTooLarge {
                size: 6 * 1024 * 1024,
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            })
        );
    }

    #[test]
    fn accepts_file_exactly_at_ceiling() {
        let policy = AttachmentPolicy::profile_picture().with_max_bytes(4);
        assert!(policy.check(&IncomingFile::new("a.png", vec![1; 4])).is_ok());
    }

    #[test]
    fn rejects_executable_for_images() {
        let policy = AttachmentPolicy::profile_picture();
        let file = IncomingFile::new("setup.exe", vec![1, 2, 3]);
        assert!(matches!(
            policy.check(&file),
            Err(ValidationError::DisallowedExtension { .. })
        ));
    }

    #[test]
    fn cad_files_are_project_media_only() {
        let file = IncomingFile::new("bracket.STEP", vec![1, 2, 3])
            .with_content_type("application/octet-stream");
        assert!(AttachmentPolicy::project_media().check(&file).is_ok());
        assert!(AttachmentPolicy::profile_picture().check(&file).is_err());
    }

    #[test]
    fn rejects_mismatched_content_type() {
        let file = IncomingFile::new("pic.png", vec![1]).with_content_type("text/html");
        assert!(matches!(
            AttachmentPolicy::profile_picture().check(&file),
            Err(ValidationError::DisallowedContentType { .. })
        ));
    }

    #[test]
    fn rejects_empty_upload() {
        let file = IncomingFile::new("pic.png", Vec::new());
        assert!(matches!(
            AttachmentPolicy::profile_picture().check(&file),
            Err(ValidationError::EmptyFile { .. })
        ));
    }
}
