//! Browser shell for the digit strip.
//!
//! Builds its own DOM (canvas strip plus `ps-*` overlay elements) and drives
//! rendering from a `requestAnimationFrame` loop. Every input path, real key
//! or button click, funnels through [`dispatch`], so the machine sees one
//! grammar. The
//! shell owns the two timing concerns the machine deliberately does not: the
//! 300 ms slide of the strip toward the cursor anchor and the 200 ms hold
//! after a correct guess (resolved here by feeding `Input::HoldElapsed`).

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{window, CanvasRenderingContext2d, Element, HtmlCanvasElement, KeyboardEvent,
    MouseEvent, Storage};

use crate::digits::DigitSequence;
use crate::game::{self, CORRECT_HOLD_MS, Input, LastResult, Machine, Mode};
use crate::store::{KvStore, THEME_KEY, Theme};

// --- Strip geometry ----------------------------------------------------------

const DIGIT_WIDTH: f64 = 24.0;
/// The cursor cell sits four cells in from the strip's left edge.
const CURSOR_ANCHOR: f64 = 4.0 * DIGIT_WIDTH;
/// Duration of the slide easing the strip toward its new offset.
const SLIDE_MS: f64 = 300.0;
const CANVAS_W: u32 = 432;
const CANVAS_H: u32 = 64;

const DIGIT_FONT: &str = "32px 'Fira Code', monospace";
/// Glyph drawn in place of digits the player has not recalled yet.
const MASK_GLYPH: &str = "\u{00b7}";

const BUTTON_STYLE: &str = "background:rgba(128,128,128,0.15); color:inherit; \
    border:1px solid rgba(128,128,128,0.4); border-radius:6px; padding:4px 12px; \
    margin:0 4px; font-family:inherit; font-size:14px; cursor:pointer;";
const KEY_STYLE: &str = "background:rgba(128,128,128,0.15); color:inherit; \
    border:1px solid rgba(128,128,128,0.4); border-radius:6px; padding:4px 0; \
    width:28px; margin:0 2px; font-family:inherit; font-size:14px; cursor:pointer;";

// --- Theme palettes ----------------------------------------------------------

struct Palette {
    page_bg: &'static str,
    strip_bg: &'static str,
    border: &'static str,
    fg: &'static str,
    dim: &'static str,
    accent: &'static str,
    correct: &'static str,
    wrong: &'static str,
    /// Translucent band marking the cursor cell.
    band: &'static str,
    /// Translucent wash over the strip while locked.
    wash: &'static str,
}

const DARK: Palette = Palette {
    page_bg: "#16161d",
    strip_bg: "#1e1e26",
    border: "#ffd166",
    fg: "#e8e8e8",
    dim: "#6a6a74",
    accent: "#ffd166",
    correct: "#7bd88f",
    wrong: "#ff6b6b",
    band: "rgba(255,209,102,0.10)",
    wash: "rgba(255,107,107,0.12)",
};

const LIGHT: Palette = Palette {
    page_bg: "#fafaf7",
    strip_bg: "#ffffff",
    border: "#b45309",
    fg: "#24242b",
    dim: "#b5b5bd",
    accent: "#b45309",
    correct: "#15803d",
    wrong: "#dc2626",
    band: "rgba(180,83,9,0.08)",
    wash: "rgba(220,38,38,0.10)",
};

fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}

// --- localStorage-backed store -----------------------------------------------

/// [`KvStore`] over `window.localStorage`. When storage is unavailable
/// (sandboxed frame, privacy mode) reads see nothing and writes are dropped,
/// which collapses to the documented defaults.
struct BrowserStore {
    storage: Option<Storage>,
}

impl BrowserStore {
    fn new() -> Self {
        let storage = window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }
}

impl KvStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage
            .as_ref()
            .and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(s) = &self.storage {
            let _ = s.set_item(key, value);
        }
    }
}

// --- Runtime state -----------------------------------------------------------

struct App {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    machine: Machine<BrowserStore>,
    theme: Theme,
    theme_store: BrowserStore,
    // Strip slide animation: pixel offset of digit 0 from the canvas left edge.
    strip_from: f64,
    strip_target: f64,
    strip_pos: f64,
    slide_start_ms: f64,
    /// performance.now() deadline of the pending post-correct hold, if any.
    hold_deadline_ms: Option<f64>,
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Strip offset that puts `index` under the cursor anchor.
fn target_for(index: usize) -> f64 {
    CURSOR_ANCHOR - index as f64 * DIGIT_WIDTH
}

// --- Entry -------------------------------------------------------------------

pub fn start_strip_app() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Create / reuse the strip canvas
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("ps-strip") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("ps-strip");
        c.set_width(CANVAS_W);
        c.set_height(CANVAS_H);
        doc.body().unwrap().append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.unwrap().dyn_into()?;
    ctx.set_font(DIGIT_FONT);
    ctx.set_text_align("center");

    let theme_store = BrowserStore::new();
    let theme = Theme::load(&theme_store);
    let machine = Machine::new(DigitSequence::pi(), BrowserStore::new());

    let now = win.performance().unwrap().now();
    let app = App {
        canvas: canvas.clone(),
        ctx,
        machine,
        theme,
        theme_store,
        strip_from: target_for(0),
        strip_target: target_for(0),
        strip_pos: target_for(0),
        slide_start_ms: now,
        hold_deadline_ms: None,
    };

    // Index / best readout (top-left)
    if doc.get_element_by_id("ps-hud").is_none() {
        let div = doc.create_element("div")?;
        div.set_id("ps-hud");
        div.set_text_content(Some(""));
        div.set_attribute("style", "position:fixed; top:10px; left:12px; font-size:14px; padding:4px 8px; background:rgba(128,128,128,0.15); border:1px solid rgba(128,128,128,0.35); border-radius:6px; z-index:30; letter-spacing:0.5px;").ok();
        doc.body().unwrap().append_child(&div)?;
    }
    // Hint line under the strip
    if doc.get_element_by_id("ps-hint").is_none() {
        let div = doc.create_element("div")?;
        div.set_id("ps-hint");
        div.set_text_content(Some(""));
        div.set_attribute("style", "position:fixed; left:50%; top:calc(40% + 52px); transform:translateX(-50%); font-size:12px; opacity:0.65; z-index:30;").ok();
        doc.body().unwrap().append_child(&div)?;
    }
    // Theme toggle (top-right); label is set by apply_theme
    if doc.get_element_by_id("ps-theme").is_none() {
        let btn = doc.create_element("button")?;
        btn.set_id("ps-theme");
        btn.set_attribute(
            "style",
            &format!("{BUTTON_STYLE} position:fixed; top:10px; right:12px; z-index:30;"),
        )
        .ok();
        attach_click(&btn, Box::new(|_: MouseEvent| toggle_theme()))?;
        doc.body().unwrap().append_child(&btn)?;
    }
    // Mode / retry controls
    if doc.get_element_by_id("ps-controls").is_none() {
        let row = doc.create_element("div")?;
        row.set_id("ps-controls");
        row.set_attribute("style", "position:fixed; left:50%; top:calc(40% + 84px); transform:translateX(-50%); z-index:30;").ok();
        for (id, label, input) in [
            ("ps-practice", "Practice", Input::EnterPractice),
            ("ps-game", "Game", Input::EnterGame),
            ("ps-retry", "Retry", Input::Retry),
        ] {
            let btn = doc.create_element("button")?;
            btn.set_id(id);
            btn.set_text_content(Some(label));
            btn.set_attribute("style", BUTTON_STYLE).ok();
            attach_click(&btn, Box::new(move |_: MouseEvent| dispatch(input)))?;
            row.append_child(&btn)?;
        }
        doc.body().unwrap().append_child(&row)?;
    }
    // On-screen keypad; clicks feed the same guess path as real keys
    if doc.get_element_by_id("ps-keypad").is_none() {
        let row = doc.create_element("div")?;
        row.set_id("ps-keypad");
        row.set_attribute("style", "position:fixed; left:50%; top:calc(40% + 126px); transform:translateX(-50%); z-index:30;").ok();
        for ch in "0123456789.".chars() {
            let btn = doc.create_element("button")?;
            btn.set_text_content(Some(&ch.to_string()));
            btn.set_attribute("style", KEY_STYLE).ok();
            attach_click(&btn, Box::new(move |_: MouseEvent| dispatch(Input::Guess(ch))))?;
            row.append_child(&btn)?;
        }
        doc.body().unwrap().append_child(&row)?;
    }

    // Keyboard listener: arrows navigate, digits guess, Enter retries
    {
        let closure = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
            let key = evt.key();
            if key == "ArrowRight" {
                dispatch(Input::StepForward);
            } else if key == "ArrowLeft" {
                dispatch(Input::StepBack);
            } else if key == "Enter" {
                dispatch(Input::Retry);
            } else if key.len() == 1 {
                let c = key.chars().next().unwrap();
                if game::is_guessable(c) {
                    dispatch(Input::Guess(c));
                }
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    apply_theme(&app);
    APP.with(|cell| cell.replace(Some(app)));
    start_frame_loop();
    Ok(())
}

fn attach_click(el: &Element, handler: Box<dyn FnMut(MouseEvent)>) -> Result<(), JsValue> {
    let closure = Closure::wrap(handler);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Input dispatch ----------------------------------------------------------

/// Single funnel for all inputs, keyboard or button. Applies the reducer,
/// arms/disarms the post-correct hold deadline, and retargets the slide.
fn dispatch(input: Input) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            let now = now_ms();
            let was_pending = app.machine.state().hold_pending();
            app.machine.apply(input);
            let pending = app.machine.state().hold_pending();
            if pending && !was_pending {
                app.hold_deadline_ms = Some(now + CORRECT_HOLD_MS);
            } else if !pending {
                app.hold_deadline_ms = None;
            }
            sync_strip(app, now);
        }
    });
}

fn toggle_theme() {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            app.theme = app.theme.toggled();
            app.theme_store.set(THEME_KEY, app.theme.as_str());
            apply_theme(app);
        }
    });
}

/// Begin a new slide whenever the cursor's resting offset changed.
fn sync_strip(app: &mut App, now: f64) {
    let target = target_for(app.machine.state().index);
    if (target - app.strip_target).abs() > f64::EPSILON {
        app.strip_from = app.strip_pos;
        app.strip_target = target;
        app.slide_start_ms = now;
    }
}

fn apply_theme(app: &App) {
    let p = palette(app.theme);
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(body) = doc.body() {
            body.set_attribute(
                "style",
                &format!(
                    "margin:0; min-height:100vh; background:{}; color:{}; font-family:'Fira Code', monospace;",
                    p.page_bg, p.fg
                ),
            )
            .ok();
        }
        if let Some(el) = doc.get_element_by_id("ps-theme") {
            el.set_text_content(Some(match app.theme {
                Theme::Dark => "\u{1f319} dark",
                Theme::Light => "\u{2600} light",
            }));
        }
    }
    app.canvas
        .set_attribute(
            "style",
            &format!(
                "position:fixed; left:50%; top:40%; transform:translate(-50%,-50%); border:1px dashed {}; border-radius:10px; background:{}; z-index:20;",
                p.border, p.strip_bg
            ),
        )
        .ok();
}

// --- Frame loop --------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        APP.with(|cell| {
            if let Some(app) = cell.borrow_mut().as_mut() {
                tick(app, ts);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn tick(app: &mut App, now: f64) {
    // Resolve the post-correct hold once its deadline passes.
    if let Some(deadline) = app.hold_deadline_ms {
        if now >= deadline {
            app.hold_deadline_ms = None;
            app.machine.apply(Input::HoldElapsed);
            sync_strip(app, now);
        }
    }

    // Ease the strip toward its target (quadratic ease-out).
    let t = ((now - app.slide_start_ms) / SLIDE_MS).clamp(0.0, 1.0);
    let ease = 1.0 - (1.0 - t).powi(2);
    app.strip_pos = app.strip_from + (app.strip_target - app.strip_from) * ease;

    render(app);
    update_overlays(app);
}

// --- Rendering ---------------------------------------------------------------

fn render(app: &App) {
    let p = palette(app.theme);
    let state = app.machine.state();
    let digits = app.machine.digits();
    let ctx = &app.ctx;
    let w = app.canvas.width() as f64;
    let h = app.canvas.height() as f64;

    ctx.set_fill_style_str(p.strip_bg);
    ctx.fill_rect(0.0, 0.0, w, h);

    // Band marking the cursor cell; the strip slides underneath it.
    ctx.set_fill_style_str(p.band);
    ctx.fill_rect(CURSOR_ANCHOR, 0.0, DIGIT_WIDTH, h);

    // Only the cells intersecting the viewport get drawn.
    let first = (((-DIGIT_WIDTH - app.strip_pos) / DIGIT_WIDTH).ceil()).max(0.0) as usize;
    let last = ((((w - app.strip_pos) / DIGIT_WIDTH).floor()).max(0.0) as usize)
        .min(digits.last_index());

    let mut buf = [0u8; 4];
    for i in first..=last {
        let x = app.strip_pos + i as f64 * DIGIT_WIDTH + DIGIT_WIDTH / 2.0;
        let masked = state.mode == Mode::Game
            && (i > state.index || (i == state.index && state.revealed != Some(i)));
        let glyph: &str = if masked {
            MASK_GLYPH
        } else {
            digits.digit_at(i).encode_utf8(&mut buf)
        };
        let color = if i == state.index {
            match state.last_result {
                LastResult::Correct => p.correct,
                LastResult::Wrong => p.wrong,
                LastResult::None => p.accent,
            }
        } else {
            p.dim
        };
        ctx.set_fill_style_str(color);
        ctx.fill_text(glyph, x, h / 2.0 + 11.0).ok();
    }

    // Locked: translucent tint over the strip; the digit that ended the run
    // stays readable underneath.
    if state.locked {
        ctx.set_fill_style_str(p.wash);
        ctx.fill_rect(0.0, 0.0, w, h);
    }
}

fn update_overlays(app: &App) {
    let state = app.machine.state();
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id("ps-hud") {
            let mode_label = match state.mode {
                Mode::Practice => "practice",
                Mode::Game => "game",
            };
            el.set_text_content(Some(&format!(
                "{} | index {} | best {}",
                mode_label, state.index, state.high_score
            )));
        }
        if let Some(el) = doc.get_element_by_id("ps-hint") {
            let hint = match (state.mode, state.locked) {
                (Mode::Practice, _) => "use the left/right arrow keys to scroll",
                (Mode::Game, false) => "type the next digit from memory (0-9 or .)",
                (Mode::Game, true) => "wrong digit: press Enter or Retry to start over",
            };
            el.set_text_content(Some(hint));
        }
    }
}
