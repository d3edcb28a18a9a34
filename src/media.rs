//! Local filesystem storage for uploaded files.

use std::path::{Path, PathBuf};

use serde::Serializer;
use tokio::fs;
use uuid::Uuid;

/// Public URL prefix under which stored files are served.
pub const MEDIA_URL: &str = "/media";

#[derive(Debug, Clone)]
pub struct MediaStore {
	/// Root directory for all uploads (e.g. "./media")
	root: PathBuf,
}

impl MediaStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Writes `data` below `dir` and returns the path relative to the media
	/// root, e.g. `admin_files/3f0c…-report.pdf`.
	///
	/// A random prefix keeps uploads with the same name apart.
	pub async fn save(
		&self,
		dir: &str,
		file_name: Option<&str>,
		data: &[u8],
	) -> std::io::Result<String> {
		let name = file_name.map(sanitize_file_name).unwrap_or_default();
		let name = if name.is_empty() {
			Uuid::new_v4().simple().to_string()
		} else {
			format!("{}-{name}", Uuid::new_v4().simple())
		};

		let directory = self.root.join(dir);
		fs::create_dir_all(&directory).await?;
		fs::write(directory.join(&name), data).await?;

		Ok(format!("{dir}/{name}"))
	}

	/// Deletes a stored file. A file that is already gone is not an error.
	pub async fn remove(&self, path: &str) -> std::io::Result<()> {
		match fs::remove_file(self.root.join(path)).await {
			Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(error),
			_ => Ok(()),
		}
	}
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`, so a client cannot escape the upload directory.
fn sanitize_file_name(name: &str) -> String {
	let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

	base.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
				c
			} else {
				'_'
			}
		})
		.collect::<String>()
		.trim_start_matches('.')
		.to_owned()
}

/// Serializes a stored path as the URL it is served from.
#[allow(clippy::ptr_arg)]
pub fn serialize_url<S: Serializer>(path: &String, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.collect_str(&format_args!("{MEDIA_URL}/{path}"))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_sanitize_file_name() {
		assert_eq!(sanitize_file_name("photo.png"), "photo.png");
		assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
		assert_eq!(sanitize_file_name("C:\\Users\\me\\my file.jpg"), "my_file.jpg");
		assert_eq!(sanitize_file_name(".hidden"), "hidden");
	}

	#[tokio::test]
	async fn test_save_and_remove() {
		let root = std::env::temp_dir().join(format!("reframe-media-{}", Uuid::new_v4()));
		let store = MediaStore::new(&root);

		let path = store
			.save("admin_files", Some("notes.txt"), b"hello")
			.await
			.unwrap();

		assert!(path.starts_with("admin_files/"));
		assert!(path.ends_with("-notes.txt"));
		assert_eq!(fs::read(root.join(&path)).await.unwrap(), b"hello");

		store.remove(&path).await.unwrap();
		assert!(!root.join(&path).exists());

		// removing twice is fine
		store.remove(&path).await.unwrap();

		fs::remove_dir_all(&root).await.unwrap();
	}
}
