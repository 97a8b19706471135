use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Season and episode numbers guessed from a single filename.
///
/// Both values are zero-padded to at least two digits. A half episode keeps
/// its fraction (`"02.5"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeGuess {
    pub season: Option<String>,
    pub episode: Option<String>,
}

impl EpisodeGuess {
    fn episode_only(caps: &Captures, episode: usize, fraction: usize) -> Self {
        Self {
            season: None,
            episode: Some(episode_number(caps, episode, fraction)),
        }
    }
}

/// One entry of the ordered extraction table: the first pattern that matches wins.
struct EpisodePattern {
    name: &'static str,
    regex: Regex,
    /// Capture group holding the whole episode number.
    episode_group: usize,
    extract: fn(&Captures) -> EpisodeGuess,
}

// A fraction is a single digit not followed by another digit, so S01E05.1080p stays 05.
static EPISODE_PATTERNS: LazyLock<Vec<EpisodePattern>> = LazyLock::new(|| {
    vec![
        EpisodePattern {
            name: "season-episode code",
            regex: Regex::new(r"(?i)S(\d+)E(\d+)(?:\.(\d)(?:\D|$))?").unwrap(),
            episode_group: 2,
            extract: |caps| EpisodeGuess {
                season: Some(pad_two(&caps[1])),
                episode: Some(episode_number(caps, 2, 3)),
            },
        },
        EpisodePattern {
            name: "season word",
            regex: Regex::new(r"(?i)Season[\s._-]*(\d+)\D+(\d{1,3})(?:\.(\d))?(?:\D|$)").unwrap(),
            episode_group: 2,
            extract: |caps| EpisodeGuess {
                season: Some(pad_two(&caps[1])),
                episode: Some(episode_number(caps, 2, 3)),
            },
        },
        EpisodePattern {
            name: "separated number",
            regex: Regex::new(r"(?:^|[\s._-])(\d{1,3})(?:\.(\d))?(?:[\s._-]|$)").unwrap(),
            episode_group: 1,
            extract: |caps| EpisodeGuess::episode_only(caps, 1, 2),
        },
        EpisodePattern {
            name: "episode prefix",
            regex: Regex::new(r"(?i)\bE(?:p(?:isode)?)?[\s._-]*(\d{1,3})(?:\.(\d)(?:\D|$))?").unwrap(),
            episode_group: 1,
            extract: |caps| EpisodeGuess::episode_only(caps, 1, 2),
        },
        EpisodePattern {
            name: "bare number",
            regex: Regex::new(r"\b(\d{1,3})(?:\.(\d))?\b").unwrap(),
            episode_group: 1,
            extract: |caps| EpisodeGuess::episode_only(caps, 1, 2),
        },
    ]
});

fn episode_number(caps: &Captures, episode: usize, fraction: usize) -> String {
    let mut number = pad_two(&caps[episode]);
    if let Some(fraction) = caps.get(fraction) {
        number.push('.');
        number.push_str(fraction.as_str());
    }
    number
}

// True when `start` is the fraction digit of a number like `02.5`.
fn follows_decimal_point(stem: &str, start: usize) -> bool {
    matches!(stem[..start].as_bytes(), [.., digit, b'.'] if digit.is_ascii_digit())
}

static VIDEO_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mkv|mp4|avi|m4v|mov|wmv|webm)$").unwrap()
});

static BRACKET_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

static SPECIAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(SP|OVA|OAD|ONA|Special)(?:[\s._-]*(\d{1,3}))?\b").unwrap()
});

// Applied in order by `clean_filename`.
static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\(\d{4}\)",                                   // (2019)
        r"\([^)]*\)",                                   // (anything else)
        r"(?i)\bS\d+\s*E\d+(?:\.\d)?\b",                // S01E05
        r"(?i)\bSeason[\s._-]*\d+\b",                   // Season 2
        r"(?i)\bS\d{1,2}\b",                            // S02
        r"(?i)\bE(?:p(?:isode)?)?[\s._-]*\d+\b",        // E05, Ep 5, Episode 5
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turns a raw media filename into a human-readable name.
///
/// Release tags, years, parenthetical notes and season/episode codes are
/// dropped and separators collapse to single spaces. A special-episode marker
/// (`OVA 2`, `SP`, `Special 1`) survives and is re-attached at the end.
pub fn clean_filename(raw: &str) -> String {
    let mut working = VIDEO_EXTENSION.replace(raw, "").into_owned();
    // Tags go first so a group tag like [SP-Subs] is not read as a marker.
    working = BRACKET_TAGS.replace_all(&working, " ").into_owned();

    let marker = SPECIAL_MARKER.captures(&working).map(|caps| {
        let token = caps[1].to_string();
        let marker = match caps.get(2) {
            Some(number) => format!("{} {}", token, number.as_str()),
            None => token,
        };
        (caps.get(0).map(|m| m.range()).unwrap_or_default(), marker)
    });
    if let Some((range, _)) = &marker {
        working.replace_range(range.clone(), " ");
    }

    for pattern in NOISE_PATTERNS.iter() {
        working = pattern.replace_all(&working, " ").into_owned();
    }

    working = SEPARATORS.replace_all(&working, " ").into_owned();
    working = WHITESPACE.replace_all(&working, " ").into_owned();
    let mut cleaned = working
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string();

    if let Some((_, marker)) = marker {
        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(&marker);
    }

    cleaned
}

/// Guesses season and episode from a filename by trying each pattern in priority order.
pub fn extract_episode(filename: &str) -> EpisodeGuess {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    for pattern in EPISODE_PATTERNS.iter() {
        let found = pattern.regex.captures_iter(&stem).find(|caps| {
            caps.get(pattern.episode_group)
                .is_some_and(|m| !follows_decimal_point(&stem, m.start()))
        });
        if let Some(caps) = found {
            let guess = (pattern.extract)(&caps);
            tracing::trace!(filename, pattern = pattern.name, ?guess, "episode pattern matched");
            return guess;
        }
    }

    tracing::trace!(filename, "no episode pattern matched");
    EpisodeGuess::default()
}

/// First season number found across the given filenames, in order.
pub fn suggest_season(filenames: &[String]) -> Option<String> {
    filenames
        .iter()
        .find_map(|filename| extract_episode(filename).season)
}

/// Proposes a show name for the files in `folder`.
///
/// If any cleaned filename contains the cleaned folder name, the folder name
/// wins outright. Otherwise the most frequent run of words (as many words as
/// the folder name has) across all cleaned filenames is returned; on a tie the
/// first group seen wins. Falls back to the cleaned folder name.
pub fn suggest_show_name(folder: &Path, filenames: &[String]) -> String {
    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned_folder = clean_filename(&folder_name);
    let folder_key = cleaned_folder.to_lowercase();

    let cleaned_files: Vec<String> = filenames.iter().map(|f| clean_filename(f)).collect();

    if !folder_key.is_empty()
        && cleaned_files
            .iter()
            .any(|cleaned| cleaned.to_lowercase().contains(&folder_key))
    {
        return title_case(&cleaned_folder);
    }

    let window = cleaned_folder.split_whitespace().count();
    if window == 0 {
        return cleaned_folder;
    }

    let mut groups: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for cleaned in &cleaned_files {
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        for group in words.windows(window) {
            let candidate = group.join(" ");
            match positions.get(&candidate) {
                Some(&index) => groups[index].1 += 1,
                None => {
                    positions.insert(candidate.clone(), groups.len());
                    groups.push((candidate, 1));
                }
            }
        }
    }

    let mut best: Option<&(String, usize)> = None;
    for entry in &groups {
        if best.is_none_or(|current| entry.1 > current.1) {
            best = Some(entry);
        }
    }

    match best {
        Some((candidate, count)) => {
            tracing::debug!(candidate = %candidate, count, "show name from word groups");
            candidate.clone()
        }
        None => cleaned_folder,
    }
}

/// Capitalizes the first letter of each word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn pad_two(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    format!("{trimmed:0>2}")
}
