use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::error::RenameError;
use crate::name_parser::extract_episode;

#[derive(Debug, Clone)]
pub struct RenameConfig {
    pub directory: PathBuf,
    pub show_name: String,
    /// Two-digit season used in every proposed name.
    pub season: String,
    pub force_renumber: bool,
    /// Lowercase extensions without the dot.
    pub extensions: Vec<String>,
}

/// A media file found in the target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub original_name: String,
    /// Extension including the dot, case preserved (`".MKV"`).
    pub extension: String,
}

impl MediaFile {
    pub fn new(original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let extension = Path::new(&original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self {
            original_name,
            extension,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRename {
    pub original_path: PathBuf,
    pub original_name: String,
    pub new_name: String,
    pub episode: String,
}

impl FileRename {
    pub fn needs_rename(&self) -> bool {
        self.original_name != self.new_name
    }
}

/// Ordered (old name, new name) pairs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    entries: Vec<FileRename>,
}

impl RenamePlan {
    pub fn entries(&self) -> &[FileRename] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.original_name.as_str(), entry.new_name.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStatus {
    Renamed,
    /// The file already had its target name; nothing was touched.
    Unchanged,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RenameResult {
    pub file_rename: FileRename,
    pub status: RenameStatus,
    pub error_message: Option<String>,
}

impl RenameResult {
    pub fn success(&self) -> bool {
        self.status != RenameStatus::Failed
    }
}

#[derive(Debug)]
pub struct RenameEngine {
    config: RenameConfig,
}

impl RenameEngine {
    pub fn new(config: RenameConfig) -> Self {
        Self { config }
    }

    /// Lists media files in the configured directory, sorted by name.
    pub fn scan_directory(&self) -> Result<Vec<MediaFile>, RenameError> {
        scan_media_files(&self.config.directory, &self.config.extensions)
    }

    /// Builds the rename plan for `files`, which must already be sorted.
    ///
    /// With forced renumbering episodes run 01, 02, ... in file order.
    /// Otherwise the extracted episode is used and files without one are skipped.
    pub fn build_plan(&self, files: &[MediaFile]) -> RenamePlan {
        let mut entries = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            let episode = if self.config.force_renumber {
                format!("{:02}", index + 1)
            } else {
                match extract_episode(&file.original_name).episode {
                    Some(episode) => episode,
                    None => {
                        tracing::debug!(file = %file.original_name, "no episode number, skipping");
                        continue;
                    }
                }
            };

            entries.push(FileRename {
                original_path: self.config.directory.join(&file.original_name),
                original_name: file.original_name.clone(),
                new_name: self.proposed_name(&episode, &file.extension),
                episode,
            });
        }

        RenamePlan { entries }
    }

    pub fn proposed_name(&self, episode: &str, extension: &str) -> String {
        format!(
            "{} - S{}E{}{}",
            self.config.show_name, self.config.season, episode, extension
        )
    }

    pub fn rename_file(&self, file_rename: &FileRename) -> RenameResult {
        if !file_rename.needs_rename() {
            return RenameResult {
                file_rename: file_rename.clone(),
                status: RenameStatus::Unchanged,
                error_message: None,
            };
        }

        let new_path = self.config.directory.join(&file_rename.new_name);

        let outcome = if new_path.exists() {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("target already exists: {}", file_rename.new_name),
            ))
        } else {
            fs::rename(&file_rename.original_path, &new_path)
        };

        match outcome {
            Ok(()) => RenameResult {
                file_rename: file_rename.clone(),
                status: RenameStatus::Renamed,
                error_message: None,
            },
            Err(e) => {
                tracing::warn!(file = %file_rename.original_name, error = %e, "rename failed");
                RenameResult {
                    file_rename: file_rename.clone(),
                    status: RenameStatus::Failed,
                    error_message: Some(e.to_string()),
                }
            }
        }
    }

    /// Applies every rename in order. A failure never stops the batch.
    pub fn rename_files(&self, plan: &RenamePlan) -> Vec<RenameResult> {
        plan.entries()
            .iter()
            .map(|file| self.rename_file(file))
            .collect()
    }
}

/// Checks that `folder` exists and is a directory.
pub fn validate_folder(folder: &Path) -> Result<(), RenameError> {
    match fs::metadata(folder) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(RenameError::InvalidFolder {
            path: folder.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(RenameError::InvalidFolder {
            path: folder.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Whether `name` ends in one of `extensions` (lowercase, no dot), ignoring case.
pub fn has_media_extension(name: &str, extensions: &[String]) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|known| *known == ext))
}

/// Lists regular files in `folder` whose extension is one of `extensions`, sorted by name.
pub fn scan_media_files(folder: &Path, extensions: &[String]) -> Result<Vec<MediaFile>, RenameError> {
    validate_folder(folder)?;

    let mut names: Vec<String> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| has_media_extension(name, extensions))
        .collect();
    names.sort();

    tracing::debug!(folder = %folder.display(), count = names.len(), "scanned media files");

    if names.is_empty() {
        return Err(RenameError::NoFilesFound {
            path: folder.to_path_buf(),
        });
    }

    Ok(names.into_iter().map(MediaFile::new).collect())
}

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

// Helper function to sanitize filenames
pub fn sanitize_filename(filename: &str) -> String {
    UNSAFE_CHARS.replace_all(filename, "_").to_string()
}

/// Normalizes operator season input ("2", "S2", "s02") to two digits.
pub fn normalize_season(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix('S')
        .or_else(|| trimmed.strip_prefix('s'))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let num: u32 = digits.parse().ok()?;
    Some(format!("{:02}", num))
}

// Helper function to extract season number from directory name
pub fn extract_season_from_directory(dir_name: &str) -> Option<u32> {
    static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [
            r"\bs(?:eason\s*)?(\d+)\b",       // s1, season 1, s01, season 01
            r"(\d+)(?:st|nd|rd|th)\s*season", // 1st season, 2nd season
            r"\bseries\s*(\d+)",              // series 1, series 01
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    });

    let dir_lower = dir_name.to_lowercase();

    PATTERNS.iter().find_map(|re| {
        re.captures(&dir_lower)
            .and_then(|captures| captures.get(1))
            .and_then(|season| season.as_str().parse::<u32>().ok())
    })
}

// Interactive configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    directory: Option<PathBuf>,
    show_name: Option<String>,
    season: Option<String>,
    force_renumber: bool,
    extensions: Option<Vec<String>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.directory = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn show_name(mut self, show_name: &str) -> Self {
        let show_name = sanitize_filename(show_name.trim());
        if !show_name.is_empty() {
            self.show_name = Some(show_name);
        }
        self
    }

    pub fn season(mut self, season: &str) -> Self {
        self.season = normalize_season(season);
        self
    }

    pub fn force_renumber(mut self, force: bool) -> Self {
        self.force_renumber = force;
        self
    }

    pub fn extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = Some(extensions.to_vec());
        self
    }

    pub fn build(self) -> Result<RenameConfig> {
        let directory = self
            .directory
            .ok_or_else(|| anyhow::anyhow!("Directory is required"))?;

        let show_name = self
            .show_name
            .ok_or_else(|| anyhow::anyhow!("Show name is required"))?;

        let season = self
            .season
            .ok_or_else(|| anyhow::anyhow!("Season number is required"))?;

        let extensions = self.extensions.unwrap_or_else(|| {
            vec!["mkv".to_string(), "mp4".to_string(), "avi".to_string()]
        });

        Ok(RenameConfig {
            directory,
            show_name,
            season,
            force_renumber: self.force_renumber,
            extensions,
        })
    }
}
