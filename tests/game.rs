// Integration tests (native) for the game state machine and the store seam.
// These exercise the pure reducer and the `Machine` persistence contract
// without any browser APIs.

use pi_strip::digits::DigitSequence;
use pi_strip::game::{GameState, Input, LastResult, Machine, Mode, step};
use pi_strip::store::{HIGH_SCORE_KEY, KvStore, MemoryStore, THEME_KEY, Theme, load_high_score};

fn machine(seq: &str) -> Machine<MemoryStore> {
    Machine::new(DigitSequence::new(seq), MemoryStore::new())
}

fn machine_with_store(seq: &str, store: MemoryStore) -> Machine<MemoryStore> {
    Machine::new(DigitSequence::new(seq), store)
}

/// Correct guess followed by the hold expiring; the cursor lands one cell on.
fn guess_and_advance(m: &mut Machine<MemoryStore>, ch: char) {
    m.apply(Input::Guess(ch));
    assert_eq!(
        m.state().last_result,
        LastResult::Correct,
        "expected '{}' to be correct at index {}",
        ch,
        m.state().index
    );
    m.apply(Input::HoldElapsed);
}

#[test]
fn practice_navigation_stays_in_bounds() {
    let digits = DigitSequence::new("3.14");
    let mut state = GameState::new(0);
    for _ in 0..20 {
        state = step(&state, &digits, Input::StepForward);
        assert!(state.index <= digits.last_index());
    }
    assert_eq!(state.index, 3, "forward clamps at the last index");
    for _ in 0..20 {
        state = step(&state, &digits, Input::StepBack);
    }
    assert_eq!(state.index, 0, "backward clamps at zero");
    assert!(!state.locked);
    assert_eq!(state.high_score, 0, "navigation never touches the score");
}

#[test]
fn correct_guess_at_last_index_clamps() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    guess_and_advance(&mut m, '3');
    guess_and_advance(&mut m, '.');
    guess_and_advance(&mut m, '1');
    assert_eq!(m.state().index, 3);
    // Judging the final digit leaves the cursor where it is.
    guess_and_advance(&mut m, '4');
    assert_eq!(m.state().index, 3, "index clamps at the last position");
    assert!(!m.state().locked);
}

#[test]
fn losing_guess_locks_and_persists_high_score() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    guess_and_advance(&mut m, '3');
    guess_and_advance(&mut m, '.');
    m.apply(Input::Guess('9')); // actual digit is '1'
    let state = m.state();
    assert!(state.locked);
    assert_eq!(state.last_result, LastResult::Wrong);
    assert_eq!(state.high_score, 2);
    assert_eq!(
        state.revealed,
        Some(2),
        "the offending digit stays revealed"
    );
    assert_eq!(
        m.store().get(HIGH_SCORE_KEY).as_deref(),
        Some("2"),
        "persisted value matches in-memory value"
    );
}

#[test]
fn guesses_are_ignored_while_locked() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    m.apply(Input::Guess('9'));
    assert!(m.state().locked);
    let locked_state = m.state().clone();
    // Even the character that would have been correct changes nothing.
    m.apply(Input::Guess('3'));
    assert_eq!(*m.state(), locked_state);
}

#[test]
fn retry_reenters_active_game_at_zero() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    guess_and_advance(&mut m, '3');
    m.apply(Input::Guess('0'));
    assert!(m.state().locked);
    m.apply(Input::Retry);
    let state = m.state();
    assert_eq!(state.mode, Mode::Game);
    assert_eq!(state.index, 0);
    assert!(!state.locked);
    assert_eq!(state.last_result, LastResult::None);
    assert_eq!(state.revealed, None);
    assert_eq!(state.high_score, 1, "the score from the lost run survives");
}

#[test]
fn scenario_three_point_one_four() {
    // Sequence "3.14", start Game.Active, index 0. Guess '3' -> correct,
    // advance to 1. Guess '.' -> correct, advance to 2. Guess '9' (actual '1')
    // -> locked, high score 2. Retry -> index 0, unlocked.
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    assert_eq!(m.state().index, 0);
    guess_and_advance(&mut m, '3');
    assert_eq!(m.state().index, 1);
    guess_and_advance(&mut m, '.');
    assert_eq!(m.state().index, 2);
    m.apply(Input::Guess('9'));
    assert!(m.state().locked);
    assert_eq!(m.state().last_result, LastResult::Wrong);
    assert_eq!(m.state().high_score, 2);
    m.apply(Input::Retry);
    assert_eq!(m.state().index, 0);
    assert!(!m.state().locked);
}

#[test]
fn missing_store_entry_seeds_zero() {
    let m = machine("3.14");
    assert_eq!(m.state().high_score, 0);
}

#[test]
fn unparsable_store_entry_seeds_zero() {
    let mut store = MemoryStore::new();
    store.set(HIGH_SCORE_KEY, "not a number");
    assert_eq!(load_high_score(&store), 0);
    let m = machine_with_store("3.14", store);
    assert_eq!(m.state().high_score, 0);
}

#[test]
fn lower_run_does_not_shrink_stored_high_score() {
    let mut store = MemoryStore::new();
    store.set(HIGH_SCORE_KEY, "5");
    let mut m = machine_with_store("3.14", store);
    assert_eq!(m.state().high_score, 5);
    m.apply(Input::EnterGame);
    guess_and_advance(&mut m, '3');
    guess_and_advance(&mut m, '.');
    guess_and_advance(&mut m, '1');
    m.apply(Input::Guess('0')); // lose at index 3
    assert!(m.state().locked);
    assert_eq!(m.state().high_score, 5, "max(5, 3) leaves the best unchanged");
    assert_eq!(m.store().get(HIGH_SCORE_KEY).as_deref(), Some("5"));
}

#[test]
fn high_score_carries_across_sessions() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    guess_and_advance(&mut m, '3');
    guess_and_advance(&mut m, '.');
    m.apply(Input::Guess('7'));
    assert_eq!(m.state().high_score, 2);
    // A fresh machine over the same store seeds from the persisted value.
    let store = m.store().clone();
    let next_session = machine_with_store("3.14", store);
    assert_eq!(next_session.state().high_score, 2);
}

#[test]
fn guess_during_hold_window_is_dropped() {
    let mut m = machine("3.14");
    m.apply(Input::EnterGame);
    m.apply(Input::Guess('3'));
    assert!(m.state().hold_pending());
    let pending = m.state().clone();
    m.apply(Input::Guess('.'));
    assert_eq!(*m.state(), pending, "guesses queued inside the hold are no-ops");
    m.apply(Input::HoldElapsed);
    assert_eq!(m.state().index, 1);
    assert_eq!(m.state().last_result, LastResult::None);
    assert_eq!(m.state().revealed, None);
}

#[test]
fn memory_store_overwrites_values() {
    let mut store = MemoryStore::new();
    assert_eq!(store.get("k"), None);
    store.set("k", "1");
    store.set("k", "2");
    assert_eq!(store.get("k").as_deref(), Some("2"));
}

#[test]
fn theme_defaults_to_dark_and_round_trips() {
    assert_eq!(Theme::from_stored(None), Theme::Dark);
    assert_eq!(Theme::from_stored(Some("garbage")), Theme::Dark);
    assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
    assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
    for theme in [Theme::Dark, Theme::Light] {
        assert_eq!(Theme::from_stored(Some(theme.as_str())), theme);
        assert_eq!(theme.toggled().toggled(), theme);
    }
    let mut store = MemoryStore::new();
    store.set(THEME_KEY, Theme::Light.as_str());
    assert_eq!(Theme::load(&store), Theme::Light);
}
