use std::path::{Component, Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
	#[error("failed to create image directory: {0}")]
	CreateDirectory(#[source] std::io::Error),
	#[error("failed to decode base64 image: {0}")]
	Decode(#[from] base64::DecodeError),
	#[error("failed to save image: {0}")]
	Write(#[source] std::io::Error),
	#[error("failed to rename image: {0}")]
	Rename(#[source] std::io::Error),
	#[error("failed to delete image: {0}")]
	Delete(#[source] std::io::Error),
	#[error("invalid image name: {0}")]
	InvalidName(String),
	#[error("failed to read image: {0}")]
	Read(#[source] std::io::Error),
}

/// Owns the directory user uploaded images live in.
///
/// Paths handed out by the store are relative to the working directory (for
/// the default `./Images` they look like `Images/post-title.png`) and are what
/// records persist.
#[derive(Debug, Clone)]
pub struct ImageStore {
	directory: PathBuf,
}

impl ImageStore {
	pub fn new(directory: impl AsRef<Path>) -> Self {
		Self {
			directory: directory
				.as_ref()
				.components()
				.filter(|c| !matches!(c, Component::CurDir))
				.collect(),
		}
	}

	pub fn directory(&self) -> &Path {
		&self.directory
	}

	/// Decodes `encoded` (optionally prefixed with a `data:image/...;base64,`
	/// header) and writes it as `<base_name><ext>`. Returns the stored path.
	pub async fn save(&self, encoded: &str, base_name: &str) -> Result<String, ImageError> {
		tokio::fs::create_dir_all(&self.directory)
			.await
			.map_err(ImageError::CreateDirectory)?;

		let payload = encoded.split_once(',').map_or(encoded, |(_, payload)| payload);
		let payload = payload.replace(['\r', '\n'], "");
		let bytes = STANDARD.decode(payload)?;

		let path = self.directory.join(format!("{base_name}{}", extension_for(encoded)));
		tokio::fs::write(&path, bytes).await.map_err(ImageError::Write)?;

		tracing::debug!(path = %path.display(), "saved image");

		Ok(path.to_string_lossy().into_owned())
	}

	/// Moves a stored image to `<new_base_name>`, keeping its extension.
	pub async fn rename(&self, old_path: &str, new_base_name: &str) -> Result<String, ImageError> {
		let ext = Path::new(old_path)
			.extension()
			.map(|ext| format!(".{}", ext.to_string_lossy()))
			.unwrap_or_default();

		let new_path = self.directory.join(format!("{new_base_name}{ext}"));
		tokio::fs::rename(old_path, &new_path).await.map_err(ImageError::Rename)?;

		Ok(new_path.to_string_lossy().into_owned())
	}

	pub async fn delete(&self, path: &str) -> Result<(), ImageError> {
		tokio::fs::remove_file(path).await.map_err(ImageError::Delete)?;

		tracing::debug!(path, "deleted image");

		Ok(())
	}

	/// Maps a public file name onto a path inside the managed directory.
	pub fn resolve(&self, file_name: &str) -> Result<PathBuf, ImageError> {
		let mut components = Path::new(file_name).components();
		match (components.next(), components.next()) {
			(Some(Component::Normal(name)), None) => Ok(self.directory.join(name)),
			_ => Err(ImageError::InvalidName(file_name.to_string())),
		}
	}

	pub async fn read(&self, file_name: &str) -> Result<Vec<u8>, ImageError> {
		let path = self.resolve(file_name)?;
		tokio::fs::read(path).await.map_err(ImageError::Read)
	}
}

/// Picks the extension from the mime type mentioned anywhere in the input.
fn extension_for(encoded: &str) -> &'static str {
	if encoded.contains("image/png") {
		".png"
	} else if encoded.contains("image/jpeg") {
		".jpeg"
	} else {
		".jpg"
	}
}

/// The content type `/Images` responds with for a stored file.
pub fn content_type(file_name: &str) -> &'static str {
	match Path::new(file_name).extension().and_then(|e| e.to_str()) {
		Some("png") => "image/png",
		Some("jpeg") | Some("jpg") => "image/jpeg",
		_ => "application/octet-stream",
	}
}
