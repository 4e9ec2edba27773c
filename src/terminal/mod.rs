//! Terminal Module - Drive the scoreboard from a terminal.
//!
//! Bridges crossterm's event system with the in-memory host:
//! key presses become host events (clicks, input changes) dispatched on the
//! page, and node contents are drawn back with crossterm styling.
//!
//! # API
//!
//! - `convert_key_event` - Convert a crossterm KeyEvent to a [`Command`]
//! - `apply` - Dispatch a command as host events
//! - `render_markup` - Split rendered markup into styled segments
//! - `draw` - Queue one full frame onto any writer
//! - `run` - Raw-mode event loop (restores the terminal on exit)
//!
//! # Example
//!
//! ```ignore
//! use reactive_element::scoreboard::{page, Scoreboard, ScoreboardConfig};
//! use reactive_element::terminal::{run, KeyBindings};
//!
//! let config = ScoreboardConfig::default();
//! let doc = page(&config);
//! let board = Scoreboard::mount(&doc, &config)?;
//! run(&board, &doc, &config, &KeyBindings::default())?;
//! ```

use std::io::{self, Write, stdout};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    poll, read,
};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use tracing::debug;

use crate::host::MemoryDocument;
use crate::scoreboard::{Player, Scoreboard, ScoreboardConfig};

// =============================================================================
// COMMANDS
// =============================================================================

/// What a key press asks the scoreboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Click(Player),
    Reset,
    RaisePlayTo,
    LowerPlayTo,
    Quit,
}

/// Key assignments. Esc and Ctrl+C always quit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub player_one: char,
    pub player_two: char,
    pub reset: char,
    pub raise: char,
    pub lower: char,
    pub quit: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            player_one: '1',
            player_two: '2',
            reset: 'r',
            raise: '+',
            lower: '-',
            quit: 'q',
        }
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert a crossterm KeyEvent to a command. Only presses count.
pub fn convert_key_event(event: CrosstermKeyEvent, bindings: &KeyBindings) -> Option<Command> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    match event.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Quit)
        }
        KeyCode::Char(c) if c == bindings.player_one => Some(Command::Click(Player::One)),
        KeyCode::Char(c) if c == bindings.player_two => Some(Command::Click(Player::Two)),
        KeyCode::Char(c) if c == bindings.reset => Some(Command::Reset),
        KeyCode::Char(c) if c == bindings.raise => Some(Command::RaisePlayTo),
        KeyCode::Char(c) if c == bindings.lower => Some(Command::LowerPlayTo),
        KeyCode::Char(c) if c == bindings.quit => Some(Command::Quit),
        _ => None,
    }
}

// =============================================================================
// COMMAND DISPATCH
// =============================================================================

/// Dispatch `command` on the page the way a user would trigger it.
/// Returns false for [`Command::Quit`].
pub fn apply(
    command: Command,
    board: &Scoreboard,
    document: &MemoryDocument,
    config: &ScoreboardConfig,
) -> bool {
    debug!(?command, "terminal command");
    match command {
        Command::Click(Player::One) => {
            document.dispatch(&config.player_one, "click");
        }
        Command::Click(Player::Two) => {
            document.dispatch(&config.player_two, "click");
        }
        Command::Reset => {
            document.dispatch(&config.reset_button, "click");
        }
        Command::RaisePlayTo => change_input(board, document, config, board.play_to() + 1),
        Command::LowerPlayTo => change_input(board, document, config, board.play_to() - 1),
        Command::Quit => return false,
    }
    true
}

/// Type a new value into the play-to input and fire `change`.
fn change_input(board: &Scoreboard, document: &MemoryDocument, config: &ScoreboardConfig, value: i64) {
    board.play_to_input.node().set_value(&value.to_string());
    document.dispatch(&config.play_to_input, "change");
}

// =============================================================================
// MARKUP
// =============================================================================

/// A run of text with an optional highlight color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<Color>,
}

/// Split markup into segments. `<span class="green">` highlights its
/// contents, any other tag is dropped.
pub fn render_markup(markup: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    // One entry per open span; None for spans without a known class
    let mut colors: Vec<Option<Color>> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let (text, tag) = match rest.find('<') {
            Some(start) => match rest[start..].find('>') {
                Some(len) => {
                    let tag = &rest[start + 1..start + len];
                    let text = &rest[..start];
                    rest = &rest[start + len + 1..];
                    (text, Some(tag))
                }
                // Unterminated tag: keep it as text
                None => {
                    let text = rest;
                    rest = "";
                    (text, None)
                }
            },
            None => {
                let text = rest;
                rest = "";
                (text, None)
            }
        };

        push_text(&mut segments, text, colors.iter().rev().find_map(|c| *c));

        if let Some(tag) = tag {
            let tag = tag.trim();
            if let Some(closing) = tag.strip_prefix('/') {
                if closing.trim() == "span" {
                    colors.pop();
                }
            } else if tag == "span" || tag.starts_with("span ") {
                colors.push(tag_color(tag));
            }
        }
    }

    segments
}

fn tag_color(tag: &str) -> Option<Color> {
    if tag.contains("class=\"green\"") || tag.contains("class='green'") {
        Some(Color::Green)
    } else {
        None
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str, color: Option<Color>) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(last) if last.color == color => last.text.push_str(text),
        _ => segments.push(Segment {
            text: text.to_string(),
            color,
        }),
    }
}

// =============================================================================
// DRAWING
// =============================================================================

/// Queue a full frame: threshold, score and key help.
pub fn draw<W: Write>(
    out: &mut W,
    board: &Scoreboard,
    bindings: &KeyBindings,
) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    draw_segments(out, &render_markup(&board.play_to.node().content()))?;

    queue!(out, MoveTo(0, 2))?;
    draw_segments(out, &render_markup(&board.score.node().content()))?;

    queue!(
        out,
        MoveTo(0, 4),
        Print(format!(
            "[{}] player one  [{}] player two  [{}] reset  [{}/{}] play to  [{}] quit",
            bindings.player_one,
            bindings.player_two,
            bindings.reset,
            bindings.raise,
            bindings.lower,
            bindings.quit,
        ))
    )?;

    if board.is_game_over() {
        queue!(out, MoveTo(0, 6), Print("Game over!"))?;
    }
    out.flush()
}

fn draw_segments<W: Write>(out: &mut W, segments: &[Segment]) -> io::Result<()> {
    for segment in segments {
        match segment.color {
            Some(color) => queue!(
                out,
                SetForegroundColor(color),
                Print(&segment.text),
                ResetColor
            )?,
            None => queue!(out, Print(&segment.text))?,
        }
    }
    Ok(())
}

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Restores the terminal when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Run the scoreboard in the terminal until a quit key is pressed.
pub fn run(
    board: &Scoreboard,
    document: &MemoryDocument,
    config: &ScoreboardConfig,
    bindings: &KeyBindings,
) -> io::Result<()> {
    let _guard = RawModeGuard::enter()?;
    let mut out = stdout();

    draw(&mut out, board, bindings)?;
    loop {
        if !poll(Duration::from_millis(250))? {
            continue;
        }

        match read()? {
            CrosstermEvent::Key(key) => {
                let Some(command) = convert_key_event(key, bindings) else {
                    continue;
                };
                if !apply(command, board, document, config) {
                    break;
                }
            }
            CrosstermEvent::Resize(_, _) => {}
            _ => continue,
        }
        draw(&mut out, board, bindings)?;
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
