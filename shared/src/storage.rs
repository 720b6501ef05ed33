use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::{info, warn};

use crate::{EnrichedUser, RegionCode};

const REGION_FILE_PREFIX: &str = "region_";
// Files written by earlier collectors
const LEGACY_FILE_PREFIX: &str = "wilaya_";
const REGION_FILE_EXTENSION: &str = "json";

pub fn region_file_path(data_dir: &Path, region_code: &str) -> PathBuf {
    data_dir.join(format!(
        "{REGION_FILE_PREFIX}{region_code}.{REGION_FILE_EXTENSION}"
    ))
}

/// Writes the users of one region as a JSON array, creating parent directories.
pub fn save_users(users: &[EnrichedUser], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(users)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Data saved to {}", path.display());
    Ok(())
}

pub fn load_users(path: &Path) -> anyhow::Result<Vec<EnrichedUser>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let users = serde_json::from_str(&content)
        .with_context(|| format!("Malformed region file {}", path.display()))?;
    Ok(users)
}

fn region_code_of(path: &Path) -> Option<RegionCode> {
    if path.extension()? != REGION_FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(REGION_FILE_PREFIX)
        .or_else(|| stem.strip_prefix(LEGACY_FILE_PREFIX))
        .map(ToString::to_string)
}

/// Region files in `data_dir`, sorted by file name.
pub fn region_files(data_dir: &Path) -> anyhow::Result<Vec<(RegionCode, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(code) = region_code_of(&path) {
            files.push((code, path));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Concatenates every region file in `data_dir`. Unreadable files are skipped.
pub fn load_all_regions(data_dir: &Path) -> anyhow::Result<Vec<EnrichedUser>> {
    let mut all_users = Vec::new();
    for (code, path) in region_files(data_dir)? {
        match load_users(&path) {
            Ok(mut users) => {
                info!("Loaded {} users for region {}", users.len(), code);
                all_users.append(&mut users);
            }
            Err(e) => {
                warn!("Skipping region file: {e:#}");
            }
        }
    }
    Ok(all_users)
}

/// Number of users stored per region, `None` for files that fail to parse.
pub fn region_summary(data_dir: &Path) -> anyhow::Result<Vec<(RegionCode, Option<usize>)>> {
    Ok(region_files(data_dir)?
        .into_iter()
        .map(|(code, path)| {
            let count = load_users(&path).ok().map(|users| users.len());
            (code, count)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn user(username: &str, region: &str) -> EnrichedUser {
        EnrichedUser {
            followers: 42,
            region_code: Some(region.to_string()),
            ..EnrichedUser::new(username)
        }
    }

    #[test]
    fn save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = region_file_path(&dir.path().join("data").join("raw"), "16");
        let users = vec![user("amine", "16"), user("lina", "16")];

        save_users(&users, &path).unwrap();

        assert!(path.ends_with("region_16.json"));
        assert_eq!(load_users(&path).unwrap(), users);
    }

    #[test]
    fn load_all_concatenates_sorted_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        save_users(&[user("oran-dev", "31")], &region_file_path(dir.path(), "31")).unwrap();
        save_users(&[user("alger-dev", "16")], &region_file_path(dir.path(), "16")).unwrap();
        fs::write(region_file_path(dir.path(), "25"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.json"), "[]").unwrap();
        fs::write(dir.path().join("region_09.txt"), "[]").unwrap();

        let users = load_all_regions(dir.path()).unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();

        assert_eq!(names, vec!["alger-dev", "oran-dev"]);
    }

    #[test]
    fn legacy_region_files_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        save_users(&[user("alger-dev", "16")], &region_file_path(dir.path(), "16")).unwrap();
        fs::write(
            dir.path().join("wilaya_31.json"),
            r#"[{"username": "oran-dev", "followers": 9, "wilaya_code": "31", "wilaya_name": "Oran"}]"#,
        )
        .unwrap();

        let files: Vec<_> = region_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(code, _)| code)
            .collect();
        let users = load_all_regions(dir.path()).unwrap();

        assert_eq!(files, vec!["16", "31"]);
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].region_code(), "31");
        assert_eq!(users[1].region_name.as_deref(), Some("Oran"));
    }

    #[test]
    fn summary_counts_users_per_region() {
        let dir = tempfile::tempdir().unwrap();
        save_users(
            &[user("a", "16"), user("b", "16")],
            &region_file_path(dir.path(), "16"),
        )
        .unwrap();
        fs::write(region_file_path(dir.path(), "25"), "oops").unwrap();

        let summary = region_summary(dir.path()).unwrap();

        assert_eq!(
            summary,
            vec![("16".to_string(), Some(2)), ("25".to_string(), None)]
        );
    }

    #[test]
    fn missing_data_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_all_regions(&dir.path().join("absent")).is_err());
    }
}
