use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::rename_engine::normalize_season;

/// Line-oriented operator prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prints `question` and reads one trimmed line. Closed input is an `UnexpectedEof` error.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    pub fn ask_with_default(&mut self, question: &str, default: &str) -> io::Result<String> {
        let answer = if default.is_empty() {
            self.ask(&format!("{}: ", question))?
        } else {
            self.ask(&format!("{} [{}]: ", question, default))?
        };
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Asks until the answer starts with y or n. An empty answer takes `default`.
    pub fn ask_yes_no(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(&format!("{} ({}): ", question, hint))?.to_lowercase();
            match answer.chars().next() {
                None => return Ok(default),
                Some('y') => return Ok(true),
                Some('n') => return Ok(false),
                Some(_) => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    /// Asks for the target folder. Surrounding quotes from drag-and-drop are removed.
    pub fn ask_folder(&mut self) -> io::Result<PathBuf> {
        loop {
            let answer = self.ask("📂 Enter folder path: ")?;
            let answer = answer.trim_matches(|c: char| c == '"' || c == '\'');
            if !answer.is_empty() {
                return Ok(PathBuf::from(answer));
            }
            writeln!(self.output, "Folder path cannot be empty.")?;
        }
    }

    pub fn ask_show_name(&mut self, suggestion: &str) -> io::Result<String> {
        loop {
            let answer = self.ask_with_default("🎬 Enter show name", suggestion)?;
            if !answer.trim().is_empty() {
                return Ok(answer);
            }
            writeln!(self.output, "Show name cannot be empty.")?;
        }
    }

    /// Asks for a season number and returns it zero-padded.
    pub fn ask_season(&mut self, suggestion: &str) -> io::Result<String> {
        loop {
            let answer = self.ask_with_default("📅 Enter season number", suggestion)?;
            match normalize_season(&answer) {
                Some(season) => return Ok(season),
                None => writeln!(self.output, "'{}' is not a season number.", answer)?,
            }
        }
    }
}

/// What the operator wants after a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Waits for the operator to choose between another run and exiting.
///
/// On a terminal this reads a single key in raw mode; otherwise it reads a line.
pub fn wait_for_continue() -> io::Result<LoopControl> {
    println!("\nPress Enter to rename another folder, or q / Esc to exit.");

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return read_loop_control(&mut stdin.lock());
    }

    let _raw = RawModeGuard::enable()?;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(control) = control_for_key(key) {
                return Ok(control);
            }
        }
    }
}

pub fn control_for_key(key: KeyEvent) -> Option<LoopControl> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(LoopControl::Quit)
        }
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => Some(LoopControl::Continue),
        KeyCode::Esc | KeyCode::Char('q') => Some(LoopControl::Quit),
        _ => None,
    }
}

/// Line-based fallback for piped input. End of input means quit.
pub fn read_loop_control<R: BufRead>(input: &mut R) -> io::Result<LoopControl> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(LoopControl::Quit);
    }
    match line.trim().to_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(LoopControl::Quit),
        _ => Ok(LoopControl::Continue),
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_with_default() {
        let mut p = prompter("\nCustom\n");
        assert_eq!(p.ask_with_default("Show", "Guess").unwrap(), "Guess");
        assert_eq!(p.ask_with_default("Show", "Guess").unwrap(), "Custom");
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Show [Guess]: "));
    }

    #[test]
    fn test_ask_yes_no_reprompts() {
        let mut p = prompter("maybe\nYes\n\n");
        assert!(p.ask_yes_no("Proceed?", false).unwrap());
        assert!(!p.ask_yes_no("Proceed?", false).unwrap());
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Please answer y or n."));
    }

    #[test]
    fn test_ask_folder_strips_quotes() {
        let mut p = prompter("\n\"/media/My Show\"\n");
        assert_eq!(p.ask_folder().unwrap(), PathBuf::from("/media/My Show"));
    }

    #[test]
    fn test_ask_season_pads_and_validates() {
        let mut p = prompter("two\n3\n\n");
        assert_eq!(p.ask_season("1").unwrap(), "03");
        assert_eq!(p.ask_season("1").unwrap(), "01");
    }

    #[test]
    fn test_closed_input_is_eof() {
        let mut p = prompter("");
        let err = p.ask("Anything: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_control_for_key() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(control_for_key(key(KeyCode::Enter)), Some(LoopControl::Continue));
        assert_eq!(control_for_key(key(KeyCode::Esc)), Some(LoopControl::Quit));
        assert_eq!(control_for_key(key(KeyCode::Char('x'))), None);
        assert_eq!(
            control_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(LoopControl::Quit)
        );
    }

    #[test]
    fn test_read_loop_control() {
        assert_eq!(read_loop_control(&mut Cursor::new("\n")).unwrap(), LoopControl::Continue);
        assert_eq!(read_loop_control(&mut Cursor::new("exit\n")).unwrap(), LoopControl::Quit);
        assert_eq!(read_loop_control(&mut Cursor::new("")).unwrap(), LoopControl::Quit);
    }
}
