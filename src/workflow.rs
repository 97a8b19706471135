use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::RenameError;
use crate::name_parser::{suggest_season, suggest_show_name};
use crate::prompt::Prompter;
use crate::rename_engine::{
    ConfigBuilder, RenameEngine, RenamePlan, RenameStatus, extract_season_from_directory,
    normalize_season, scan_media_files, validate_folder,
};
use crate::run_log::{RunLog, format_duration};
use crate::settings::Settings;

/// Answers supplied up front. Anything left as `None` is asked for.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub folder: Option<PathBuf>,
    pub show_name: Option<String>,
    pub season: Option<String>,
    pub force_renumber: Option<bool>,
    /// Skip the confirmation gate.
    pub assume_yes: bool,
    /// Stop after the preview.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    Scanning,
    Planning,
    Previewing,
    Confirming,
    Applying,
    Logging,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub renamed: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// `None` when the log could not be written.
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Applied(RunSummary),
    /// The operator declined at the confirmation gate.
    Cancelled,
    /// Dry run: the plan was shown and nothing was touched.
    Previewed { planned: usize },
}

/// One pass of collect, scan, plan, preview, confirm, apply and log.
///
/// The show, season and numbering prompts come after scanning so that their
/// defaults can be guessed from the files found.
pub struct Workflow<'a, R, W> {
    prompter: &'a mut Prompter<R, W>,
    settings: &'a Settings,
    options: RunOptions,
    stage: Stage,
}

impl<'a, R: BufRead, W: Write> Workflow<'a, R, W> {
    pub fn new(prompter: &'a mut Prompter<R, W>, settings: &'a Settings, options: RunOptions) -> Self {
        Self {
            prompter,
            settings,
            options,
            stage: Stage::Collecting,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "workflow stage");
        self.stage = stage;
    }

    pub fn run(&mut self) -> Result<RunOutcome, RenameError> {
        let started = Instant::now();
        self.enter(Stage::Collecting);

        let folder = match self.options.folder.clone() {
            Some(folder) => folder,
            None => self.prompter.ask_folder()?,
        };
        validate_folder(&folder)?;

        self.enter(Stage::Scanning);
        let files = scan_media_files(&folder, &self.settings.extensions)?;
        let names: Vec<String> = files.iter().map(|f| f.original_name.clone()).collect();
        writeln!(self.prompter.output(), "Found {} media file(s).", files.len())?;

        let show_name = match self.options.show_name.clone() {
            Some(name) => name,
            None => {
                let resolved = fs::canonicalize(&folder).unwrap_or_else(|_| folder.clone());
                let suggestion = suggest_show_name(&resolved, &names);
                self.prompter.ask_show_name(&suggestion)?
            }
        };

        let season = match self.options.season.as_deref() {
            Some(season) => normalize_season(season).ok_or_else(|| {
                RenameError::InvalidInput(format!("'{}' is not a season number", season))
            })?,
            None => {
                // The detected season is only a hint; the default stays the configured one.
                if let Some(detected) = self.detected_season(&folder, &names) {
                    writeln!(
                        self.prompter.output(),
                        "ℹ Detected season {} in the file or folder names.",
                        detected
                    )?;
                }
                let default_season = self.settings.default_season.clone();
                self.prompter.ask_season(&default_season)?
            }
        };

        let force_renumber = match self.options.force_renumber {
            Some(force) => force,
            None => self
                .prompter
                .ask_yes_no("🔢 Renumber episodes from 1?", false)?,
        };

        self.enter(Stage::Planning);
        let config = ConfigBuilder::new()
            .directory(&folder)
            .show_name(&show_name)
            .season(&season)
            .force_renumber(force_renumber)
            .extensions(&self.settings.extensions)
            .build()
            .map_err(|e| RenameError::InvalidInput(e.to_string()))?;
        let engine = RenameEngine::new(config);
        let plan = engine.build_plan(&files);
        if plan.is_empty() {
            return Err(RenameError::NoPlanGenerated);
        }

        self.enter(Stage::Previewing);
        self.preview(&plan, files.len())?;

        if self.options.dry_run {
            self.enter(Stage::Done);
            writeln!(self.prompter.output(), "\nDry run: no files were renamed.")?;
            return Ok(RunOutcome::Previewed {
                planned: plan.len(),
            });
        }

        self.enter(Stage::Confirming);
        let confirmed = self.options.assume_yes
            || self
                .prompter
                .ask_yes_no("\n✅ Proceed with renaming?", false)?;
        if !confirmed {
            self.enter(Stage::Done);
            writeln!(self.prompter.output(), "❌ Operation cancelled.")?;
            return Ok(RunOutcome::Cancelled);
        }

        self.enter(Stage::Applying);
        let mut log = RunLog::start(
            &folder,
            &self.settings.log_file_name,
            self.settings.divider_width,
        );
        let mut summary = RunSummary {
            renamed: 0,
            unchanged: 0,
            failed: 0,
            log_path: None,
        };

        for result in engine.rename_files(&plan) {
            let rename = &result.file_rename;
            let out = self.prompter.output();
            match result.status {
                RenameStatus::Renamed => {
                    summary.renamed += 1;
                    writeln!(out, "✓ {} -> {}", rename.original_name, rename.new_name)?;
                }
                RenameStatus::Unchanged => {
                    summary.unchanged += 1;
                    writeln!(out, "= {} (already named)", rename.original_name)?;
                }
                RenameStatus::Failed => {
                    summary.failed += 1;
                    writeln!(
                        out,
                        "✗ Failed to rename {}: {}",
                        rename.original_name,
                        result.error_message.as_deref().unwrap_or("unknown error")
                    )?;
                }
            }
            log.record(&result);
        }

        self.enter(Stage::Logging);
        let duration = started.elapsed();
        let log_target = log.path().to_path_buf();
        match log.finish(duration) {
            Ok(path) => {
                writeln!(self.prompter.output(), "\n📜 Log saved to: {}", path.display())?;
                summary.log_path = Some(path);
            }
            Err(e) => {
                tracing::warn!(path = %log_target.display(), error = %e, "could not write run log");
                writeln!(
                    self.prompter.output(),
                    "\n⚠ Could not write log {}: {}",
                    log_target.display(),
                    e
                )?;
            }
        }

        let out = self.prompter.output();
        writeln!(out, "⏱️ Run time: {}", format_duration(duration))?;
        writeln!(
            out,
            "Summary: {} renamed, {} unchanged, {} failed",
            summary.renamed, summary.unchanged, summary.failed
        )?;

        self.enter(Stage::Done);
        Ok(RunOutcome::Applied(summary))
    }

    fn detected_season(&self, folder: &Path, names: &[String]) -> Option<String> {
        suggest_season(names).or_else(|| {
            folder
                .file_name()
                .and_then(|name| extract_season_from_directory(&name.to_string_lossy()))
                .map(|num| format!("{:02}", num))
        })
    }

    fn preview(&mut self, plan: &RenamePlan, scanned: usize) -> Result<(), RenameError> {
        let out = self.prompter.output();
        writeln!(out, "\n📌 Proposed changes:")?;
        for entry in plan.entries() {
            if entry.needs_rename() {
                writeln!(out, "🔄 {} -> {}", entry.original_name, entry.new_name)?;
            } else {
                writeln!(out, "= {} (already named)", entry.original_name)?;
            }
        }

        let skipped = scanned - plan.len();
        if skipped > 0 {
            writeln!(out, "⚠ {} file(s) skipped: no episode number found.", skipped)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn folder_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), b"").unwrap();
        }
        dir
    }

    fn run(options: RunOptions, input: &str) -> (Result<RunOutcome, RenameError>, String, Stage) {
        let settings = Settings::default();
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let (result, stage) = {
            let mut workflow = Workflow::new(&mut prompter, &settings, options);
            let result = workflow.run();
            (result, workflow.stage())
        };
        let output = String::from_utf8(prompter.into_output()).unwrap();
        (result, output, stage)
    }

    #[test]
    fn test_missing_folder_is_invalid() {
        let (result, _, stage) = run(
            RunOptions {
                folder: Some(PathBuf::from("/definitely/not/here")),
                ..Default::default()
            },
            "",
        );
        assert!(matches!(result, Err(RenameError::InvalidFolder { .. })));
        assert_eq!(stage, Stage::Collecting);
    }

    #[test]
    fn test_no_files_found() {
        let dir = folder_with(&["notes.txt"]);
        let (result, _, stage) = run(
            RunOptions {
                folder: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            "",
        );
        let err = result.unwrap_err();
        assert!(matches!(err, RenameError::NoFilesFound { .. }));
        assert!(err.is_warning());
        assert_eq!(stage, Stage::Scanning);
    }

    #[test]
    fn test_no_plan_generated() {
        let dir = folder_with(&["Pilot.mkv", "Finale.mkv"]);
        let (result, _, stage) = run(
            RunOptions {
                folder: Some(dir.path().to_path_buf()),
                show_name: Some("X".into()),
                season: Some("1".into()),
                force_renumber: Some(false),
                ..Default::default()
            },
            "",
        );
        assert!(matches!(result, Err(RenameError::NoPlanGenerated)));
        assert_eq!(stage, Stage::Planning);
        assert!(dir.path().join("Pilot.mkv").exists());
    }

    #[test]
    fn test_declined_confirmation_touches_nothing() {
        let dir = folder_with(&["ep1.mkv"]);
        let input = format!("{}\nX\n1\nn\nn\n", dir.path().display());
        let (result, output, stage) = run(RunOptions::default(), &input);
        assert_eq!(result.unwrap(), RunOutcome::Cancelled);
        assert_eq!(stage, Stage::Done);
        assert!(output.contains("ep1.mkv -> X - S01E01.mkv"));
        assert!(dir.path().join("ep1.mkv").exists());
        assert!(!dir.path().join("rename-log.txt").exists());
    }

    #[test]
    fn test_dry_run_previews_only() {
        let dir = folder_with(&["a.mkv", "b.mkv"]);
        let (result, _, _) = run(
            RunOptions {
                folder: Some(dir.path().to_path_buf()),
                show_name: Some("X".into()),
                season: Some("1".into()),
                force_renumber: Some(true),
                dry_run: true,
                ..Default::default()
            },
            "",
        );
        assert_eq!(result.unwrap(), RunOutcome::Previewed { planned: 2 });
        assert!(dir.path().join("a.mkv").exists());
        assert!(!dir.path().join("rename-log.txt").exists());
    }

    #[test]
    fn test_prompts_offer_suggestions() {
        let dir = TempDir::new().unwrap();
        let show_dir = dir.path().join("Great Show");
        fs::create_dir(&show_dir).unwrap();
        fs::write(show_dir.join("Great.Show.S03E01.mkv"), b"").unwrap();

        let input = format!("{}\n\n\n\ny\n", show_dir.display());
        let (result, output, _) = run(RunOptions::default(), &input);

        assert!(output.contains("Enter show name [Great Show]"));
        assert!(output.contains("Detected season 03 in the file or folder names."));
        assert!(output.contains("Enter season number [1]"));
        match result.unwrap() {
            RunOutcome::Applied(summary) => assert_eq!(summary.renamed, 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(show_dir.join("Great Show - S01E01.mkv").exists());
    }

    #[test]
    fn test_bad_season_option() {
        let dir = folder_with(&["ep1.mkv"]);
        let (result, _, _) = run(
            RunOptions {
                folder: Some(dir.path().to_path_buf()),
                show_name: Some("X".into()),
                season: Some("first".into()),
                ..Default::default()
            },
            "",
        );
        assert!(matches!(result, Err(RenameError::InvalidInput(_))));
    }
}
