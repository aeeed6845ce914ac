use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use icu_normalizer::ComposingNormalizer;
use serde::{Serialize, de::DeserializeOwned};

use crate::store::gateway::{ProgressStore, RewardDebit, StoreError, StoredText};
use crate::store::schema::{LibraryData, ProfileData, TextId, TextRecord};

/// On-disk store: `library.json` for the text catalog, `profile.json` for
/// lifetime totals, and one plain file per text under `texts/`.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self, StoreError> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("copytype");
        Self::with_base_dir(base_dir)
    }

    #[allow(dead_code)] // Used by tests
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(base_dir.join("texts"))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn text_path(&self, id: &TextId) -> PathBuf {
        self.base_dir.join("texts").join(format!("{id}.txt"))
    }

    fn load_json<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    // Write-to-tmp then rename, so a crash mid-write leaves the old file.
    fn save_json<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// A stale schema version resets to defaults rather than failing;
    /// unparseable JSON is surfaced as corruption.
    pub fn load_library(&self) -> Result<LibraryData, StoreError> {
        let library: LibraryData = self.load_json("library.json")?;
        if library.needs_reset() {
            return Ok(LibraryData::default());
        }
        Ok(library)
    }

    fn save_library(&self, data: &LibraryData) -> Result<(), StoreError> {
        self.save_json("library.json", data)
    }

    pub fn load_profile(&self) -> Result<ProfileData, StoreError> {
        let profile: ProfileData = self.load_json("profile.json")?;
        if profile.needs_reset() {
            return Ok(ProfileData::default());
        }
        Ok(profile)
    }

    fn save_profile(&self, data: &ProfileData) -> Result<(), StoreError> {
        self.save_json("profile.json", data)
    }

    /// Import a new text. Content is normalized before it ever reaches
    /// disk, so reflow and scoring always see composed characters and LF
    /// line endings.
    pub fn add_text(&self, title: &str, content: &str) -> Result<TextRecord, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title must not be empty".into()));
        }
        let content = normalize_text(content);
        if content.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "text content must not be empty".into(),
            ));
        }

        let mut library = self.load_library()?;
        let id = unique_id(title, &library);
        self.write_text_file(&id, &content)?;

        let record = TextRecord {
            id,
            title: title.to_string(),
            added_at: Utc::now(),
            progress_index: 0,
            times_completed: 0,
            completed_at: None,
        };
        library.texts.push(record.clone());
        self.save_library(&library)?;
        Ok(record)
    }

    pub fn list_texts(&self) -> Result<Vec<TextRecord>, StoreError> {
        Ok(self.load_library()?.texts)
    }

    /// Drop a text from the catalog. The content file is removed best
    /// effort; a leftover file without a record is harmless.
    pub fn remove_text(&self, id: &TextId) -> Result<(), StoreError> {
        let mut library = self.load_library()?;
        let before = library.texts.len();
        library.texts.retain(|t| &t.id != id);
        if library.texts.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.save_library(&library)?;
        let _ = fs::remove_file(self.text_path(id));
        Ok(())
    }

    fn write_text_file(&self, id: &TextId, content: &str) -> Result<(), StoreError> {
        let path = self.text_path(id);
        let tmp_path = path.with_extension("txt.tmp");

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn update_record(
        &self,
        id: &TextId,
        apply: impl FnOnce(&mut TextRecord),
    ) -> Result<(), StoreError> {
        let mut library = self.load_library()?;
        let record = library
            .texts
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        apply(record);
        self.save_library(&library)
    }
}

impl ProgressStore for JsonStore {
    fn load_text(&self, id: &TextId) -> Result<StoredText, StoreError> {
        let library = self.load_library()?;
        let record = library
            .texts
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let content = fs::read_to_string(self.text_path(id))?;
        Ok(StoredText {
            id: record.id.clone(),
            title: record.title.clone(),
            content,
            progress_index: record.progress_index,
        })
    }

    fn save_progress(&self, id: &TextId, flat_index: usize) -> Result<(), StoreError> {
        self.update_record(id, |record| record.progress_index = flat_index)
    }

    fn record_line_completion(
        &self,
        seconds: f64,
        accuracy_percent: u8,
    ) -> Result<(), StoreError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(StoreError::InvalidInput(format!(
                "line time {seconds} is not a duration"
            )));
        }
        if accuracy_percent > 100 {
            return Err(StoreError::InvalidInput(format!(
                "accuracy {accuracy_percent} is over 100"
            )));
        }
        let mut profile = self.load_profile()?;
        profile.lines_completed += 1;
        profile.line_seconds += seconds;
        profile.accuracy_points += accuracy_percent as f64;
        self.save_profile(&profile)
    }

    fn increment_reward(&self, amount: u32) -> Result<u64, StoreError> {
        let mut profile = self.load_profile()?;
        profile.coins = profile.coins.saturating_add(amount as u64);
        self.save_profile(&profile)?;
        Ok(profile.coins)
    }

    fn decrement_reward(&self, amount: u32) -> Result<RewardDebit, StoreError> {
        let mut profile = self.load_profile()?;
        if profile.coins == 0 {
            return Ok(RewardDebit::AlreadyZero);
        }
        profile.coins = profile.coins.saturating_sub(amount as u64);
        self.save_profile(&profile)?;
        Ok(RewardDebit::Applied(profile.coins))
    }

    fn record_text_completion(&self, id: &TextId) -> Result<(), StoreError> {
        self.update_record(id, |record| {
            record.times_completed += 1;
            record.completed_at = Some(Utc::now());
        })?;
        let mut profile = self.load_profile()?;
        profile.texts_completed += 1;
        self.save_profile(&profile)
    }
}

/// NFC-compose the text, unify line endings to LF, and widen tabs to
/// single spaces so every stored character is typeable.
fn normalize_text(content: &str) -> String {
    let unified = content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', " ");
    ComposingNormalizer::new_nfc().normalize(&unified).into_owned()
}

/// Derive a filesystem-safe id from the title: lowercase ASCII
/// alphanumerics joined by single dashes.
fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if slug.len() >= 48 {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "text".to_string()
    } else {
        slug
    }
}

fn unique_id(title: &str, library: &LibraryData) -> TextId {
    let base = slugify(title);
    let taken = |candidate: &str| library.texts.iter().any(|t| t.id.as_str() == candidate);
    if !taken(&base) {
        return TextId::new(base);
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return TextId::new(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_and_load_text() {
        let (_dir, store) = temp_store();
        let record = store.add_text("My Novel", "First line\nSecond line").unwrap();
        assert_eq!(record.id.as_str(), "my-novel");
        assert_eq!(record.progress_index, 0);

        let stored = store.load_text(&record.id).unwrap();
        assert_eq!(stored.title, "My Novel");
        assert_eq!(stored.content, "First line\nSecond line");

        let texts = store.list_texts().unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].id, record.id);
    }

    #[test]
    fn test_add_text_normalizes_line_endings_and_composition() {
        let (_dir, store) = temp_store();
        // "e" followed by a combining acute accent, and CRLF endings.
        let record = store.add_text("Accents", "cafe\u{301}\r\nnext").unwrap();
        let stored = store.load_text(&record.id).unwrap();
        assert_eq!(stored.content, "café\nnext");
        assert_eq!(stored.content.chars().count(), 9);
    }

    #[test]
    fn test_add_text_widens_tabs() {
        let (_dir, store) = temp_store();
        let record = store.add_text("Tabs", "a\tb\tc").unwrap();
        let stored = store.load_text(&record.id).unwrap();
        assert_eq!(stored.content, "a b c");
    }

    #[test]
    fn test_normalize_text_composes_and_preserves() {
        // Already-composed input passes through untouched; decomposed
        // accents come back composed. Both paths must yield owned text.
        assert_eq!(normalize_text("café plain"), "café plain");
        assert_eq!(normalize_text("cafe\u{301}"), "café");
    }

    #[test]
    fn test_add_text_rejects_empty_input() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.add_text("  ", "body"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add_text("Title", "  \n "),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_titles_get_numbered_ids() {
        let (_dir, store) = temp_store();
        let a = store.add_text("Same Title", "one").unwrap();
        let b = store.add_text("Same Title", "two").unwrap();
        let c = store.add_text("Same Title", "three").unwrap();
        assert_eq!(a.id.as_str(), "same-title");
        assert_eq!(b.id.as_str(), "same-title-2");
        assert_eq!(c.id.as_str(), "same-title-3");
        assert_eq!(store.load_text(&b.id).unwrap().content, "two");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("A Tale of Two Cities!"), "a-tale-of-two-cities");
        assert_eq!(slugify("  --  "), "text");
        assert_eq!(slugify("Moby-Dick; or, The Whale"), "moby-dick-or-the-whale");
    }

    #[test]
    fn test_save_and_reload_progress() {
        let (_dir, store) = temp_store();
        let record = store.add_text("T", "some words here").unwrap();
        store.save_progress(&record.id, 7).unwrap();
        assert_eq!(store.load_text(&record.id).unwrap().progress_index, 7);

        let missing = TextId::from("nope");
        assert!(matches!(
            store.save_progress(&missing, 1),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_line_completion_accumulates_in_profile() {
        let (_dir, store) = temp_store();
        store.record_line_completion(2.5, 100).unwrap();
        store.record_line_completion(1.5, 80).unwrap();

        let profile = store.load_profile().unwrap();
        assert_eq!(profile.lines_completed, 2);
        assert!((profile.line_seconds - 4.0).abs() < f64::EPSILON);
        assert!((profile.mean_line_accuracy() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_line_completion_rejects_bad_values() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.record_line_completion(-1.0, 50),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.record_line_completion(f64::NAN, 50),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.record_line_completion(1.0, 101),
            Err(StoreError::InvalidInput(_))
        ));
        // Nothing was recorded.
        assert_eq!(store.load_profile().unwrap().lines_completed, 0);
    }

    #[test]
    fn test_reward_balance_round_trip() {
        let (_dir, store) = temp_store();
        assert_eq!(store.increment_reward(3).unwrap(), 3);
        assert_eq!(
            store.decrement_reward(1).unwrap(),
            RewardDebit::Applied(2)
        );
        assert_eq!(
            store.decrement_reward(5).unwrap(),
            RewardDebit::Applied(0)
        );
        assert_eq!(store.decrement_reward(1).unwrap(), RewardDebit::AlreadyZero);
        assert_eq!(store.load_profile().unwrap().coins, 0);
    }

    #[test]
    fn test_text_completion_marks_record_and_profile() {
        let (_dir, store) = temp_store();
        let record = store.add_text("T", "abc").unwrap();
        store.record_text_completion(&record.id).unwrap();

        let texts = store.list_texts().unwrap();
        assert_eq!(texts[0].times_completed, 1);
        assert!(texts[0].completed_at.is_some());
        assert_eq!(store.load_profile().unwrap().texts_completed, 1);
    }

    #[test]
    fn test_remove_text() {
        let (_dir, store) = temp_store();
        let record = store.add_text("Gone Soon", "abc").unwrap();
        store.remove_text(&record.id).unwrap();
        assert!(store.list_texts().unwrap().is_empty());
        assert!(matches!(
            store.load_text(&record.id),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.remove_text(&record.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_library_is_reported_not_wiped() {
        let (_dir, store) = temp_store();
        fs::write(store.file_path("library.json"), "{not json").unwrap();
        assert!(matches!(
            store.load_library(),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_stale_schema_resets_to_default() {
        let (_dir, store) = temp_store();
        let mut library = LibraryData::default();
        library.schema_version = 99;
        store.save_json("library.json", &library).unwrap();
        assert!(store.load_library().unwrap().texts.is_empty());
        assert!(!store.load_library().unwrap().needs_reset());
    }

    #[test]
    fn test_saves_leave_no_tmp_files() {
        let (dir, store) = temp_store();
        store.add_text("T", "abc").unwrap();
        store.increment_reward(1).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty(), "no residual .tmp files");
    }
}
