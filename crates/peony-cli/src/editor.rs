//! External editor round trip for the tend flow.
//!
//! The thought is written into a small template, the user's editor is run on
//! it, and the result is parsed back into content plus an optional note.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use peony_core::CoreError;
use tracing::debug;

pub const CONTENT_HEADER: &str = "--- content ---";
pub const NOTE_HEADER: &str = "--- note ---";

const PREAMBLE: &str = "// Peony tend: edit freely.\n\
// The thought goes under the content header; the note is optional.\n\
// Without a note header everything is treated as the thought.\n";

const FALLBACK_EDITORS: [&str; 3] = ["nano", "vim", "vi"];

/// GUI editors that return immediately unless told to wait.
const WAIT_EDITORS: [&str; 4] = ["code", "code-insiders", "codium", "vscodium"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edited {
    pub content: String,
    pub note: Option<String>,
}

pub fn render_template(content: &str, note: &str) -> String {
    format!("{PREAMBLE}\n\n{CONTENT_HEADER}\n{content}\n{NOTE_HEADER}\n{note}")
}

/// Parse an edited template. Lines starting with `//` are ignored.
///
/// A missing note header makes everything after the content header the
/// thought; a missing content header makes everything before the note header
/// the thought.
pub fn parse_template(text: &str) -> Result<Edited, CoreError> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect();

    let content_at = lines.iter().position(|l| *l == CONTENT_HEADER);
    let note_at = lines.iter().position(|l| *l == NOTE_HEADER);
    let none: &[&str] = &[];
    let (content, note) = match (content_at, note_at) {
        (Some(c), Some(n)) if c < n => (&lines[c + 1..n], &lines[n + 1..]),
        (Some(c), _) => (&lines[c + 1..], none),
        (None, Some(n)) => (&lines[..n], &lines[n + 1..]),
        (None, None) => (&lines[..], none),
    };

    let content = content.join("\n").trim().to_string();
    if content.is_empty() {
        return Err(CoreError::Validation {
            op: "edit",
            reason: "edited content is empty".into(),
        });
    }
    let note = note.join("\n").trim().to_string();

    Ok(Edited {
        content,
        note: (!note.is_empty()).then_some(note),
    })
}

/// Editor commands to try, most preferred first.
pub fn editor_candidates(
    configured: Option<&str>,
    visual: Option<String>,
    editor: Option<String>,
) -> Vec<String> {
    [configured.map(str::to_string), visual, editor]
        .into_iter()
        .flatten()
        .chain(FALLBACK_EDITORS.iter().map(|e| e.to_string()))
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

#[derive(Debug)]
struct EditorCommand {
    program: PathBuf,
    args: Vec<String>,
}

/// First candidate whose program is on `PATH`. Extra words become arguments.
fn resolve_editor(candidates: &[String]) -> Option<EditorCommand> {
    for candidate in candidates {
        let mut words = candidate.split_whitespace();
        let Some(bin) = words.next() else {
            continue;
        };
        let program = match which::which(bin) {
            Ok(p) => p,
            Err(e) => {
                debug!("Skipping editor '{bin}': {e}");
                continue;
            }
        };
        let mut args: Vec<String> = words.map(str::to_string).collect();
        if needs_wait(&program) && !args.iter().any(|a| a == "--wait") {
            args.push("--wait".to_string());
        }
        return Some(EditorCommand { program, args });
    }
    None
}

fn needs_wait(program: &Path) -> bool {
    program
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|name| WAIT_EDITORS.contains(&name))
}

/// Open the template in an editor and return what the user left in it.
pub fn edit(configured: Option<&str>, content: &str, note: &str) -> Result<Edited> {
    let mut file = tempfile::Builder::new()
        .prefix("peony-tend-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(render_template(content, note).as_bytes())
        .context("Failed to write template")?;
    file.as_file().sync_all()?;

    let candidates = editor_candidates(
        configured,
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
    );
    let editor = resolve_editor(&candidates).ok_or_else(|| {
        anyhow!(
            "No editor found. Set one with `peony config set-editor`, $VISUAL or $EDITOR, \
             or install nano, vim or vi."
        )
    })?;

    debug!(program = %editor.program.display(), args = ?editor.args, "launching editor");
    let status = Command::new(&editor.program)
        .args(&editor.args)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run {}", editor.program.display()))?;
    if !status.success() {
        bail!("Editor exited with {status}");
    }

    let text = std::fs::read_to_string(file.path()).context("Failed to read edited file")?;
    Ok(parse_template(&text)?)
}
