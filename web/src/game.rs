use std::cell::RefCell;
use std::rc::Rc;

use egdle_core::{
    CellColor, Game, GameConfig, GameKind, GameView, Millis, Outcome, Session, SettingKey, SettingValue,
};
use gloo::timers::callback::Interval;
use serde_json::json;
use wasm_bindgen::prelude::*;

use crate::storage::LocalStorageBackend;
use crate::utils::{now_millis, today};

/// How often due timers are fired, in milliseconds.
const PUMP_INTERVAL: u32 = 50;

type SharedSession = Rc<RefCell<Session<LocalStorageBackend>>>;

fn state_json(game: &Game, now: Millis) -> serde_json::Result<String> {
    serde_json::to_string(&GameView::new(game, now))
}

fn outcome_name(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::NoChange => "noChange",
        Outcome::Changed => "changed",
        Outcome::Won => "won",
        Outcome::Lost => "lost",
    }
}

/// One mini-game as the page sees it.
///
/// The refresh callback gets the serialized state as its only argument and
/// must not call back into the game while it runs.
#[wasm_bindgen]
pub struct EgdleGame {
    session: SharedSession,
    _pump: Interval,
}

#[wasm_bindgen]
impl EgdleGame {
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, on_refresh: Option<js_sys::Function>) -> Result<EgdleGame, JsError> {
        let kind: GameKind = kind.parse()?;
        let config = GameConfig::daily(kind, today(), crate::game_seed());
        let mut session = Session::open(config, LocalStorageBackend::new(), now_millis())?;

        if let Some(callback) = on_refresh {
            session.set_refresh_hook(move |game| {
                let state = match state_json(game, now_millis()) {
                    Ok(state) => state,
                    Err(err) => {
                        log::error!("Could not serialize state: {}", err);
                        return;
                    }
                };
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&state)) {
                    log::error!("Refresh callback failed: {:?}", err);
                }
            });
        }

        let session = Rc::new(RefCell::new(session));
        let pumped = Rc::clone(&session);
        let pump = Interval::new(PUMP_INTERVAL, move || {
            if let Ok(mut session) = pumped.try_borrow_mut() {
                session.advance(now_millis());
            }
        });

        log::info!("{} opened", kind);
        Ok(Self {
            session,
            _pump: pump,
        })
    }

    pub fn click(&self, index: usize) -> Result<String, JsError> {
        self.with_session(|session| {
            let outcome = session.click(index, now_millis())?;
            Ok(outcome_name(outcome).to_owned())
        })
    }

    pub fn start(&self) -> Result<String, JsError> {
        self.with_session(|session| {
            let outcome = session.start_new_run(now_millis())?;
            Ok(outcome_name(outcome).to_owned())
        })
    }

    #[wasm_bindgen(js_name = selectColor)]
    pub fn select_color(&self, color: &str) -> Result<String, JsError> {
        let color: CellColor = color.parse()?;
        self.with_session(|session| {
            let outcome = session.select_color(color, now_millis())?;
            Ok(outcome_name(outcome).to_owned())
        })
    }

    /// `value` is the JSON of the new setting value.
    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&self, key: &str, value: &str) -> Result<String, JsError> {
        let key: SettingKey = key
            .parse()
            .map_err(|()| JsError::new(&format!("Unknown setting {:?}", key)))?;
        let value: SettingValue = serde_json::from_str(value)?;
        self.with_session(|session| {
            let outcome = session.set_option(key, value, now_millis())?;
            Ok(outcome_name(outcome).to_owned())
        })
    }

    pub fn state(&self) -> Result<String, JsError> {
        self.with_session(|session| Ok(state_json(session.game(), now_millis())?))
    }

    #[wasm_bindgen(js_name = shareText)]
    pub fn share_text(&self, url: &str) -> Result<String, JsError> {
        self.with_session(|session| Ok(session.share_text(url)))
    }

    #[wasm_bindgen(js_name = takeAdvice)]
    pub fn take_advice(&self) -> Result<Option<String>, JsError> {
        self.with_session(|session| Ok(session.take_advice()))
    }

    #[wasm_bindgen(js_name = toggleDarkMode)]
    pub fn toggle_dark_mode(&self, state: Option<bool>) -> Result<bool, JsError> {
        self.with_session(|session| Ok(session.toggle_dark_mode(state)))
    }

    /// App settings and today's solved games as JSON.
    pub fn profile(&self) -> Result<String, JsError> {
        self.with_session(|session| {
            let profile = session.profile();
            let value = json!({
                "settings": &profile.settings,
                "firstVisit": profile.is_first_visit(),
                "solvedToday": &profile.tracker.done,
            });
            Ok(value.to_string())
        })
    }

    pub fn close(&self) -> Result<(), JsError> {
        self.with_session(|session| {
            session.close(now_millis());
            Ok(())
        })
    }
}

impl EgdleGame {
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut Session<LocalStorageBackend>) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| JsError::new("Game is busy"))?;
        f(&mut session)
    }
}

impl Drop for EgdleGame {
    fn drop(&mut self) {
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.close(now_millis());
        }
    }
}
