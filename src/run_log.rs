use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::rename_engine::{RenameResult, RenameStatus};

/// Written once at the very top of a new or empty log file.
pub const BANNER: &str = r"
 +----------------------------------------------+
 |     _____       _               _            |
 |    | ____|_ __ (_)___  ___   __| | ___       |
 |    |  _| | '_ \| / __|/ _ \ / _` |/ _ \      |
 |    | |___| |_) | \__ \ (_) | (_| |  __/      |
 |    |_____| .__/|_|___/\___/ \__,_|\___|      |
 |          |_|        R E N A M E   L O G      |
 +----------------------------------------------+
";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Entries for one run, kept in memory and appended to the log file in one burst.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    divider: String,
    lines: Vec<String>,
}

impl RunLog {
    /// Starts a run section for the log at `folder/file_name`.
    pub fn start(folder: &Path, file_name: &str, divider_width: usize) -> Self {
        let divider = "─".repeat(divider_width);
        let lines = vec![
            divider.clone(),
            format!("Run at: {}", timestamp()),
            divider.clone(),
        ];
        Self {
            path: folder.join(file_name),
            divider,
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, result: &RenameResult) {
        self.lines.push(format_outcome(result, &timestamp()));
    }

    /// Appends the run to the log file, writing the banner first if the file is new or empty.
    pub fn finish(mut self, duration: Duration) -> io::Result<PathBuf> {
        self.lines.push(self.divider.clone());
        self.lines
            .push(format!("End of run (Duration: {})", format_duration(duration)));
        self.lines.push(self.divider.clone());

        {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;

            let mut text = String::new();
            if file.metadata()?.len() == 0 {
                text.push_str(BANNER);
                text.push('\n');
            }
            for line in &self.lines {
                text.push_str(line);
                text.push('\n');
            }

            file.write_all(text.as_bytes())?;
            file.flush()?;
        }

        tracing::debug!(path = %self.path.display(), lines = self.lines.len(), "run log appended");
        Ok(self.path)
    }
}

/// One log line for a rename attempt.
pub fn format_outcome(result: &RenameResult, timestamp: &str) -> String {
    let rename = &result.file_rename;
    match result.status {
        RenameStatus::Renamed => format!(
            "[{}] ✓ {} -> {}",
            timestamp, rename.original_name, rename.new_name
        ),
        RenameStatus::Unchanged => format!(
            "[{}] = {} -> {} (unchanged)",
            timestamp, rename.original_name, rename.new_name
        ),
        RenameStatus::Failed => format!(
            "[{}] ✗ Failed to rename {} -> {}: {}",
            timestamp,
            rename.original_name,
            rename.new_name,
            result.error_message.as_deref().unwrap_or("unknown error")
        ),
    }
}

pub fn format_duration(duration: Duration) -> String {
    format!("{:.2} seconds", duration.as_secs_f64())
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename_engine::FileRename;

    fn result(status: RenameStatus, error: Option<&str>) -> RenameResult {
        RenameResult {
            file_rename: FileRename {
                original_path: PathBuf::from("/media/ep1.mkv"),
                original_name: "ep1.mkv".to_string(),
                new_name: "X - S01E01.mkv".to_string(),
                episode: "01".to_string(),
            },
            status,
            error_message: error.map(str::to_string),
        }
    }

    #[test]
    fn test_format_outcome() {
        let ts = "2024-05-01 10:30";
        assert_eq!(
            format_outcome(&result(RenameStatus::Renamed, None), ts),
            "[2024-05-01 10:30] ✓ ep1.mkv -> X - S01E01.mkv"
        );
        assert_eq!(
            format_outcome(&result(RenameStatus::Failed, Some("Permission denied (os error 13)")), ts),
            "[2024-05-01 10:30] ✗ Failed to rename ep1.mkv -> X - S01E01.mkv: Permission denied (os error 13)"
        );
        assert!(format_outcome(&result(RenameStatus::Unchanged, None), ts).ends_with("(unchanged)"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.23 seconds");
    }

    #[test]
    fn test_timestamp_is_minute_precision() {
        let ts = timestamp();
        assert_eq!(ts.len(), 16);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
}
