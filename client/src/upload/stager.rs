use super::object_url::{ObjectUrl, ObjectUrlStore};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file format. Please upload JPG or PNG.")]
    InvalidFormat,
    #[error("File size exceeds the 10MB limit.")]
    FileTooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    // Exact match only: no parameters, no case folding, no `image/jpg`.
    pub fn from_declared(mime_type: &str) -> Result<Self, ValidationError> {
        match mime_type {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            _ => Err(ValidationError::InvalidFormat),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

// What a file picker or a drop hands over, before any policy is applied.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub declared_mime: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(file_name: impl Into<String>, declared_mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_mime: declared_mime.into(),
            bytes,
        }
    }

    // Reads at most one byte past the size limit, enough for `validate` to reject an
    // oversize file without loading all of it.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let mut bytes = Vec::new();
        File::open(path)?
            .take(MAX_FILE_SIZE as u64 + 1)
            .read_to_end(&mut bytes)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let declared_mime = declared_mime_for(path);
        Ok(Self::new(file_name, declared_mime, bytes))
    }
}

// Mirrors how a browser declares a picked file's type: by extension only.
pub fn declared_mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    file_name: String,
    mime: ImageMime,
    bytes: Arc<Vec<u8>>,
    preview: ObjectUrl,
    fingerprint: String,
}

impl UploadedImage {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size() as f64 / 1024.0 / 1024.0)
    }

    pub fn preview(&self) -> &ObjectUrl {
        &self.preview
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

pub fn calculate_image_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

pub fn validate(candidate: &CandidateFile) -> Result<ImageMime, ValidationError> {
    if candidate.bytes.len() > MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge);
    }
    ImageMime::from_declared(&candidate.declared_mime)
}

// Owns the single staged image. A rejected candidate never touches it.
pub struct ImageStager {
    store: ObjectUrlStore,
    staged: Option<UploadedImage>,
}

impl ImageStager {
    pub fn new(store: ObjectUrlStore) -> Self {
        Self {
            store,
            staged: None,
        }
    }

    pub fn stage(&mut self, candidate: CandidateFile) -> Result<&UploadedImage, ValidationError> {
        let mime = validate(&candidate).inspect_err(|err| {
            log::warn!("Rejected {}: {}", candidate.file_name, err);
        })?;

        self.release();

        let bytes = Arc::new(candidate.bytes);
        let preview = self.store.create(bytes.clone());
        let fingerprint = calculate_image_hash(&bytes);
        log::info!(
            "Staged {} ({}, {} bytes, sha256 {})",
            candidate.file_name,
            mime.as_str(),
            bytes.len(),
            fingerprint
        );

        Ok(&*self.staged.insert(UploadedImage {
            file_name: candidate.file_name,
            mime,
            bytes,
            preview,
            fingerprint,
        }))
    }

    pub fn staged(&self) -> Option<&UploadedImage> {
        self.staged.as_ref()
    }

    // Drops the staged image and revokes its preview.
    pub fn release(&mut self) {
        if let Some(previous) = self.staged.take() {
            previous.preview.revoke();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, len: usize) -> CandidateFile {
        CandidateFile::new(name, "image/png", vec![0u8; len])
    }

    #[test]
    fn oversize_file_is_rejected_and_staged_image_kept() {
        let mut stager = ImageStager::new(ObjectUrlStore::new());
        stager.stage(png("first.png", 16)).unwrap();

        let err = stager.stage(png("huge.png", MAX_FILE_SIZE + 1)).unwrap_err();
        assert_eq!(err, ValidationError::FileTooLarge);

        let staged = stager.staged().unwrap();
        assert_eq!(staged.file_name(), "first.png");
        assert!(staged.preview().is_live());
    }

    #[test]
    fn exactly_ten_mebibytes_is_accepted() {
        let mut stager = ImageStager::new(ObjectUrlStore::new());
        assert!(stager.stage(png("edge.png", MAX_FILE_SIZE)).is_ok());
    }

    #[test]
    fn only_exact_jpeg_and_png_types_pass() {
        for declared in ["image/gif", "image/webp", "image/jpg", "IMAGE/PNG", "image/png; q=1", ""] {
            let candidate = CandidateFile::new("x", declared, vec![1]);
            assert_eq!(validate(&candidate), Err(ValidationError::InvalidFormat), "{declared}");
        }
        assert_eq!(validate(&CandidateFile::new("x", "image/jpeg", vec![1])), Ok(ImageMime::Jpeg));
    }

    #[test]
    fn restaging_revokes_previous_preview() {
        let store = ObjectUrlStore::new();
        let mut stager = ImageStager::new(store.clone());
        let first = stager.stage(png("a.png", 4)).unwrap().preview().clone();
        let second = stager.stage(png("b.png", 4)).unwrap().preview().clone();

        assert!(!first.is_live());
        assert!(second.is_live());
        assert_eq!(stager.staged().unwrap().file_name(), "b.png");
    }

    #[test]
    fn extension_declares_mime() {
        assert_eq!(declared_mime_for(Path::new("scan.JPEG")), "image/jpeg");
        assert_eq!(declared_mime_for(Path::new("scan.png")), "image/png");
        assert_eq!(declared_mime_for(Path::new("scan.tiff")), "application/octet-stream");
    }

    #[test]
    fn oversize_path_is_read_only_past_the_limit() {
        let path = std::env::temp_dir().join(format!("oversize-{}.png", uuid::Uuid::new_v4()));
        File::create(&path).unwrap().set_len(256 * 1024 * 1024).unwrap();

        let candidate = CandidateFile::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candidate.bytes.len(), MAX_FILE_SIZE + 1);
        assert_eq!(candidate.declared_mime, "image/png");
        assert_eq!(validate(&candidate), Err(ValidationError::FileTooLarge));
    }

    #[test]
    fn small_path_is_read_whole() {
        let path = std::env::temp_dir().join(format!("small-{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let candidate = CandidateFile::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candidate.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(validate(&candidate), Ok(ImageMime::Jpeg));
    }

    #[test]
    fn size_label_uses_megabytes() {
        let mut stager = ImageStager::new(ObjectUrlStore::new());
        let staged = stager.stage(png("a.png", 1024 * 1024 + 512 * 1024)).unwrap();
        assert_eq!(staged.size_label(), "1.50 MB");
    }
}
