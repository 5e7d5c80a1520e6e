//! The song catalogue: an immutable list of songs loaded once at startup.
//!
//! Out of scope per the spec (an external collaborator) in the sense that
//! nothing here ever changes a [`Song`] after load; this module only owns
//! the loading and validation of that static list.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// An immutable catalogue entry. `duration` is in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Song {
    pub id: String,
    pub title_original: String,
    pub title_translation: String,
    pub duration: u32,
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalogue JSON in `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalogue `{path}` contains no songs")]
    Empty { path: String },
    #[error("catalogue `{path}` has duplicate song id `{id}`")]
    DuplicateId { path: String, id: String },
    #[error("catalogue `{path}` has a non-positive duration for song `{id}`")]
    NonPositiveDuration { path: String, id: String },
}

/// The process-wide, read-only song catalogue. Cheap to clone (wraps an
/// `Arc` internally is unnecessary — callers hold it behind their own `Arc`).
#[derive(Debug, Clone)]
pub struct Catalogue {
    songs: Vec<Song>,
}

impl Catalogue {
    /// Loads and validates the catalogue from a JSON array on disk. Fails
    /// fast on any structural problem: an empty or malformed catalogue can
    /// never run a round, so limping along with zero songs only defers the
    /// failure to the first `start_game` call (see SPEC_FULL §9).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogueError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();

        let contents = fs::read_to_string(path_ref).map_err(|source| CatalogueError::Read {
            path: path_str.clone(),
            source,
        })?;

        let songs: Vec<Song> =
            serde_json::from_str(&contents).map_err(|source| CatalogueError::Parse {
                path: path_str.clone(),
                source,
            })?;

        if songs.is_empty() {
            return Err(CatalogueError::Empty { path: path_str });
        }

        let mut seen = std::collections::HashSet::with_capacity(songs.len());
        for song in &songs {
            if !seen.insert(song.id.as_str()) {
                return Err(CatalogueError::DuplicateId {
                    path: path_str,
                    id: song.id.clone(),
                });
            }
            if song.duration == 0 {
                return Err(CatalogueError::NonPositiveDuration {
                    path: path_str,
                    id: song.id.clone(),
                });
            }
        }

        Ok(Self { songs })
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

#[cfg(test)]
impl Catalogue {
    /// Test-only constructor bypassing file I/O and validation.
    pub fn from_songs(songs: Vec<Song>) -> Self {
        Self { songs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_catalogue() {
        let file = write_temp(
            r#"[
                {"id": "s1", "title_original": "A", "title_translation": "A-en", "duration": 180},
                {"id": "s2", "title_original": "B", "title_translation": "B-en", "duration": 200}
            ]"#,
        );
        let catalogue = Catalogue::load(file.path()).unwrap();
        assert_eq!(catalogue.len(), 2);
    }

    #[test]
    fn rejects_empty_catalogue() {
        let file = write_temp("[]");
        assert!(matches!(
            Catalogue::load(file.path()),
            Err(CatalogueError::Empty { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let file = write_temp(
            r#"[
                {"id": "dup", "title_original": "A", "title_translation": "A-en", "duration": 120},
                {"id": "dup", "title_original": "B", "title_translation": "B-en", "duration": 140}
            ]"#,
        );
        assert!(matches!(
            Catalogue::load(file.path()),
            Err(CatalogueError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        let file = write_temp(
            r#"[{"id": "s1", "title_original": "A", "title_translation": "A-en", "duration": 0}]"#,
        );
        assert!(matches!(
            Catalogue::load(file.path()),
            Err(CatalogueError::NonPositiveDuration { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            Catalogue::load("/nonexistent/path/songs.json"),
            Err(CatalogueError::Read { .. })
        ));
    }
}
