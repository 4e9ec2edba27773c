//! Scoreboard - A two-player scorekeeper built from plain elements.
//!
//! Six named elements, wired together only through the public element API:
//!
//! | element          | kind     | state                          |
//! |------------------|----------|--------------------------------|
//! | `player_one`     | bare     | click increments player one    |
//! | `player_two`     | bare     | click increments player two    |
//! | `play_to_input`  | bare     | `change` updates the threshold |
//! | `reset_button`   | bare     | click resets the game          |
//! | `play_to`        | stateful | `{playTo}`                     |
//! | `score`          | stateful | `{playerOne, playerTwo}`       |
//!
//! When either score reaches the threshold the player buttons lose their
//! click listeners (game over). The reset button restores the score and
//! re-attaches them. Changing the threshold resets the score but leaves the
//! player listeners as they are.
//!
//! Handlers capture element handles, so the elements keep each other alive
//! for as long as the application runs.
//!
//! # Example
//!
//! ```ignore
//! use reactive_element::scoreboard::{page, Scoreboard, ScoreboardConfig};
//!
//! let config = ScoreboardConfig::default();
//! let doc = page(&config);
//! let board = Scoreboard::mount(&doc, &config)?;
//!
//! doc.dispatch(".player-one", "click");
//! assert_eq!(doc.find(".score").unwrap().content(), "1 to 0");
//! ```

use tracing::{debug, info, warn};

use crate::element::{element, Element, ElementProps};
use crate::error::ElementError;
use crate::host::{Document, MemoryDocument, MemoryNode, Node, NodeFlags};
use crate::types::{State, Value};

/// Threshold used when none is configured.
pub const DEFAULT_PLAY_TO: i64 = 5;

const PLAY_TO_KEY: &str = "playTo";

// =============================================================================
// CONFIG
// =============================================================================

/// Threshold and node selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardConfig {
    pub play_to: i64,
    pub player_one: String,
    pub player_two: String,
    pub play_to_input: String,
    pub reset_button: String,
    pub play_to_label: String,
    pub score: String,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            play_to: DEFAULT_PLAY_TO,
            player_one: ".player-one".to_string(),
            player_two: ".player-two".to_string(),
            play_to_input: "input".to_string(),
            reset_button: ".reset".to_string(),
            play_to_label: ".play-to".to_string(),
            score: ".score".to_string(),
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// State key of this player's score.
    pub fn key(self) -> &'static str {
        match self {
            Player::One => "playerOne",
            Player::Two => "playerTwo",
        }
    }
}

// =============================================================================
// SCOREBOARD
// =============================================================================

/// The mounted application: one handle per element.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    pub player_one: Element,
    pub player_two: Element,
    pub play_to_input: Element,
    pub reset_button: Element,
    pub play_to: Element,
    pub score: Element,
}

impl Scoreboard {
    /// Bind every element, wire the handlers and start a game.
    pub fn mount(document: &dyn Document, config: &ScoreboardConfig) -> Result<Self, ElementError> {
        let player_one = element(document, config.player_one.as_str(), ElementProps::bare())?;
        let player_two = element(document, config.player_two.as_str(), ElementProps::bare())?;
        let play_to_input = element(document, config.play_to_input.as_str(), ElementProps::bare())?;
        let reset_button = element(document, config.reset_button.as_str(), ElementProps::bare())?;

        let play_to = element(
            document,
            config.play_to_label.as_str(),
            ElementProps::stateful(State::from([(PLAY_TO_KEY, config.play_to.max(1))]), |state| {
                format!("Playing to {}", state.value_of(PLAY_TO_KEY))
            }),
        )?;

        let score = {
            let play_to = play_to.clone();
            element(
                document,
                config.score.as_str(),
                ElementProps::stateful(
                    State::from([(Player::One.key(), 0), (Player::Two.key(), 0)]),
                    move |state| render_score(state, threshold(&play_to)),
                ),
            )?
        };

        let board = Self {
            player_one,
            player_two,
            play_to_input,
            reset_button,
            play_to,
            score,
        };
        board.wire();
        board.reset_game();
        Ok(board)
    }

    fn wire(&self) {
        // Game over: stop accepting clicks once a player reaches the threshold
        {
            let play_to = self.play_to.clone();
            let player_one = self.player_one.clone();
            let player_two = self.player_two.clone();
            self.score
                .subscribe([Player::One.key(), Player::Two.key()], move |scores| {
                    let limit = threshold(&play_to);
                    if scores.iter().any(|s| s.as_int().unwrap_or(0) >= limit) {
                        player_one.detach_listener("click");
                        player_two.detach_listener("click");
                        info!(play_to = limit, "Game over!");
                    }
                });
        }

        {
            let input = self.play_to_input.clone();
            let play_to = self.play_to.clone();
            let score = self.score.clone();
            self.play_to_input.attach_listener("change", move |_| {
                apply_play_to_input(&input, &play_to, &score);
            });
        }

        {
            let score = self.score.clone();
            let player_one = self.player_one.clone();
            let player_two = self.player_two.clone();
            self.reset_button.attach_listener("click", move |_| {
                reset_game(&score, &player_one, &player_two);
            });
        }
    }

    /// Add a point for `player`.
    pub fn increment_score(&self, player: Player) {
        increment_score(&self.score, player);
    }

    /// Type `play_to` into the input and apply it: values below 1 become 1,
    /// the score is reset. Player listeners are left as they are.
    pub fn change_play_to(&self, play_to: i64) {
        self.play_to_input.node().set_value(&play_to.to_string());
        apply_play_to_input(&self.play_to_input, &self.play_to, &self.score);
    }

    /// Reset the score and re-attach the player click listeners.
    pub fn reset_game(&self) {
        reset_game(&self.score, &self.player_one, &self.player_two);
    }

    /// Lowest winning score. A fractional threshold rounds up.
    pub fn play_to(&self) -> i64 {
        threshold(&self.play_to)
    }

    pub fn score_of(&self, player: Player) -> i64 {
        self.score.state().get_int(player.key()).unwrap_or(0)
    }

    /// First player at or above the threshold.
    pub fn winner(&self) -> Option<Player> {
        let limit = self.play_to();
        Player::ALL
            .into_iter()
            .find(|player| self.score_of(*player) >= limit)
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn threshold(play_to: &Element) -> i64 {
    play_to
        .state()
        .get(PLAY_TO_KEY)
        .and_then(Value::as_float)
        .map(|limit| limit.ceil() as i64)
        .unwrap_or(DEFAULT_PLAY_TO)
}

fn increment_score(score: &Element, player: Player) {
    score.mutate(|state| {
        let next = state.get_int(player.key()).unwrap_or(0).saturating_add(1);
        State::new().with(player.key(), next)
    });
}

fn reset_game(score: &Element, player_one: &Element, player_two: &Element) {
    score.reset_state();

    for (button, player) in [(player_one, Player::One), (player_two, Player::Two)] {
        let score = score.clone();
        button
            .detach_listener("click")
            .attach_listener("click", move |_| increment_score(&score, player));
    }
    debug!("game reset");
}

/// Read the input, clamp it to at least 1 (writing the clamp back), update
/// the threshold and reset the score.
///
/// Any finite number of at least 1 is kept as typed, fractions included.
fn apply_play_to_input(input: &Element, play_to: &Element, score: &Element) {
    let node = input.node();
    let requested = node
        .value()
        .and_then(|raw| Value::from(raw).as_float())
        .filter(|value| value.is_finite() && *value >= 1.0);

    let value = match requested {
        Some(value) => threshold_value(value),
        None => {
            node.set_value("1");
            Value::Int(1)
        }
    };

    play_to.mutate(move |_| State::new().with(PLAY_TO_KEY, value));
    score.reset_state();
}

/// Whole numbers are stored as integers so they render without a fraction.
fn threshold_value(value: f64) -> Value {
    if value.fract() == 0.0 && value <= i64::MAX as f64 {
        Value::Int(value as i64)
    } else {
        Value::Float(value)
    }
}

/// Score markup: `A to B`, a score at or above the threshold wrapped in a
/// green span.
pub fn render_score(state: &State, play_to: i64) -> String {
    let cell = |player: Player| {
        let value = state.value_of(player.key());
        if value.as_int().is_some_and(|n| n >= play_to) {
            format!("<span class=\"green\">{value}</span>")
        } else {
            value.to_string()
        }
    };
    format!("{} to {}", cell(Player::One), cell(Player::Two))
}

// =============================================================================
// PAGE
// =============================================================================

/// The in-memory page matching `config`: one node per selector, the input
/// seeded with the threshold.
///
/// Selectors without a tag get a default one (`div`, `input`, `button`).
/// Selectors the in-memory host cannot parse are skipped, so mounting on
/// the page reports them as binding errors.
pub fn page(config: &ScoreboardConfig) -> MemoryDocument {
    let doc = MemoryDocument::new();
    let play_to = config.play_to.max(1).to_string();

    let nodes = [
        (&config.play_to_label, "div", NodeFlags::CONTENT, ""),
        (&config.play_to_input, "input", NodeFlags::VALUE, play_to.as_str()),
        (&config.score, "div", NodeFlags::CONTENT, ""),
        (&config.player_one, "button", NodeFlags::CONTENT, "Player One"),
        (&config.player_two, "button", NodeFlags::CONTENT, "Player Two"),
        (&config.reset_button, "button", NodeFlags::CONTENT, "Reset"),
    ];

    for (selector, tag, flags, text) in nodes {
        let Some(node) = MemoryNode::from_selector(selector, tag, flags) else {
            warn!(selector = %selector, "page skips unparsable selector");
            continue;
        };
        // Only the capability the node has takes effect
        node.set_content(text);
        node.set_value(text);
        doc.append(node);
    }
    doc
}

// =============================================================================
// TESTS
// =============================================================================
