//! Game-mode input state machine.
//!
//! Every transition is a pure function of `(state, input)`: [`step`] never
//! touches the browser, so the whole practice/game input grammar is exercised
//! by native tests. [`Machine`] pairs the reducer with the digit
//! sequence and an injected key-value store and performs the single
//! persistence side effect: writing the high score when a losing guess lands.
//!
//! Timing note: a correct guess does not advance the cursor by itself. The
//! shell holds the revealed digit on screen for [`CORRECT_HOLD_MS`] and then
//! feeds [`Input::HoldElapsed`], which completes the advance. While the hold
//! is pending (`last_result == Correct`), further guesses are ignored; that is
//! the decided policy for the guess-during-delay race.

use crate::digits::DigitSequence;
use crate::store::{self, KvStore};

/// Milliseconds a correct guess stays revealed before the cursor advances.
pub const CORRECT_HOLD_MS: f64 = 200.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Free navigation over visible digits; no scoring.
    #[default]
    Practice,
    /// Digit recall; digits ahead of the cursor are masked.
    Game,
}

/// Transient cue from the most recent guess, used for a brief visual flash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LastResult {
    #[default]
    None,
    Correct,
    Wrong,
}

/// Discrete inputs the machine accepts. Anything outside this grammar never
/// reaches the reducer; anything inside it that is invalid for the current
/// state is a silent no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    EnterPractice,
    EnterGame,
    /// Practice only: move the cursor right, clamped at the last index.
    StepForward,
    /// Practice only: move the cursor left, clamped at 0.
    StepBack,
    /// Game only: judge one character against the digit under the cursor.
    Guess(char),
    /// Fired by the shell when the post-correct hold expires.
    HoldElapsed,
    /// Leave the locked state and restart the run from index 0.
    Retry,
}

/// Aggregate session state. One instance exists per page load.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub mode: Mode,
    /// Cursor into the digit sequence, always within `[0, len - 1]`.
    pub index: usize,
    /// True after a wrong guess; only `Retry` (or re-entering game mode)
    /// clears it.
    pub locked: bool,
    pub last_result: LastResult,
    /// Index temporarily shown even under game-mode masking.
    pub revealed: Option<usize>,
    /// Best index ever reached; seeded from the store, persisted on loss.
    pub high_score: usize,
}

impl GameState {
    pub fn new(high_score: usize) -> Self {
        Self {
            mode: Mode::Practice,
            index: 0,
            locked: false,
            last_result: LastResult::None,
            revealed: None,
            high_score,
        }
    }

    /// A correct guess has been judged but the cursor has not advanced yet.
    pub fn hold_pending(&self) -> bool {
        self.last_result == LastResult::Correct && !self.locked
    }
}

/// Characters the guess grammar accepts.
pub fn is_guessable(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

/// Pure reducer: map one input to the next state. Inputs that are invalid for
/// the current state return the state unchanged.
pub fn step(state: &GameState, digits: &DigitSequence, input: Input) -> GameState {
    let mut next = state.clone();
    match input {
        Input::EnterPractice => {
            // Index survives the switch so practice resumes where the strip sits.
            next.mode = Mode::Practice;
            next.locked = false;
            next.last_result = LastResult::None;
            next.revealed = None;
        }
        Input::EnterGame => {
            next.mode = Mode::Game;
            reset_run(&mut next);
        }
        Input::StepForward if state.mode == Mode::Practice => {
            next.index = (state.index + 1).min(digits.last_index());
        }
        Input::StepBack if state.mode == Mode::Practice => {
            next.index = state.index.saturating_sub(1);
        }
        Input::Guess(ch)
            if state.mode == Mode::Game
                && !state.locked
                && !state.hold_pending()
                && is_guessable(ch) =>
        {
            next.revealed = Some(state.index);
            if ch == digits.digit_at(state.index) {
                next.last_result = LastResult::Correct;
            } else {
                next.high_score = state.high_score.max(state.index);
                next.locked = true;
                next.last_result = LastResult::Wrong;
            }
        }
        Input::HoldElapsed if state.mode == Mode::Game && state.hold_pending() => {
            next.index = (state.index + 1).min(digits.last_index());
            next.last_result = LastResult::None;
            next.revealed = None;
        }
        Input::Retry if state.mode == Mode::Game && state.locked => {
            reset_run(&mut next);
        }
        _ => {} // out of grammar for the current state: no transition
    }
    next
}

fn reset_run(state: &mut GameState) {
    state.index = 0;
    state.locked = false;
    state.last_result = LastResult::None;
    state.revealed = None;
}

/// The reducer plus its collaborators: the digit sequence and the injected
/// store. The store is read once (high-score seed at construction) and written
/// only when a guess transitions the machine into the locked state.
pub struct Machine<S: KvStore> {
    digits: DigitSequence,
    store: S,
    state: GameState,
}

impl<S: KvStore> Machine<S> {
    pub fn new(digits: DigitSequence, store: S) -> Self {
        let high_score = store::load_high_score(&store);
        Self {
            digits,
            store,
            state: GameState::new(high_score),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn digits(&self) -> &DigitSequence {
        &self.digits
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn apply(&mut self, input: Input) {
        let next = step(&self.state, &self.digits, input);
        if next.locked && !self.state.locked {
            self.store
                .set(store::HIGH_SCORE_KEY, &next.high_score.to_string());
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> DigitSequence {
        DigitSequence::new("3.14")
    }

    fn game_state() -> GameState {
        let mut s = GameState::new(0);
        s.mode = Mode::Game;
        s
    }

    #[test]
    fn practice_navigation_ignored_in_game_mode() {
        let s = game_state();
        assert_eq!(step(&s, &seq(), Input::StepForward), s);
        assert_eq!(step(&s, &seq(), Input::StepBack), s);
    }

    #[test]
    fn guess_ignored_in_practice_mode() {
        let s = GameState::new(0);
        assert_eq!(step(&s, &seq(), Input::Guess('3')), s);
    }

    #[test]
    fn non_grammar_character_is_a_no_op() {
        let s = game_state();
        assert_eq!(step(&s, &seq(), Input::Guess('x')), s);
    }

    #[test]
    fn guess_during_pending_hold_is_ignored() {
        let s = game_state();
        let held = step(&s, &seq(), Input::Guess('3'));
        assert!(held.hold_pending());
        // Neither a correct nor a wrong character lands while the hold runs.
        assert_eq!(step(&held, &seq(), Input::Guess('.')), held);
        assert_eq!(step(&held, &seq(), Input::Guess('9')), held);
    }

    #[test]
    fn stray_hold_elapsed_is_a_no_op() {
        let s = game_state();
        assert_eq!(step(&s, &seq(), Input::HoldElapsed), s);
        let practice = GameState::new(0);
        assert_eq!(step(&practice, &seq(), Input::HoldElapsed), practice);
    }

    #[test]
    fn retry_requires_locked_state() {
        let mut s = game_state();
        s.index = 2;
        assert_eq!(step(&s, &seq(), Input::Retry), s);
    }

    #[test]
    fn switch_to_practice_keeps_index_and_clears_game_fields() {
        let mut s = game_state();
        s.index = 3;
        s.locked = true;
        s.last_result = LastResult::Wrong;
        s.revealed = Some(3);
        let out = step(&s, &seq(), Input::EnterPractice);
        assert_eq!(out.mode, Mode::Practice);
        assert_eq!(out.index, 3, "practice keeps the cursor position");
        assert!(!out.locked);
        assert_eq!(out.last_result, LastResult::None);
        assert_eq!(out.revealed, None);
    }

    #[test]
    fn switch_to_game_is_an_implicit_retry() {
        let mut s = GameState::new(7);
        s.index = 3;
        let out = step(&s, &seq(), Input::EnterGame);
        assert_eq!(out.mode, Mode::Game);
        assert_eq!(out.index, 0);
        assert!(!out.locked);
        assert_eq!(out.high_score, 7, "high score survives the reset");
    }
}
