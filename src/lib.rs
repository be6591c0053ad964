pub mod game;
#[cfg(target_arch = "wasm32")]
pub mod storage;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    to_live_card, validate_cards, ActivateSkillAction, ActiveSkill, AttackEffect, AttackOutcome,
    BattleConfig, BattleEvent, BattleLogEntry, BattleOutcome, BattlePhase, BattleResolution,
    BattleRng, BattleState, CardDefinition, CardId, CombatTimingPolicy, DeathEffect, Deck,
    DeckError, DeckRepository, DefenseEffect, Element, InMemoryDeckRepository, LiveCard, LogAction,
    Monster, OpponentState, PlayCardAction, RuleEngine, RuleError, ScriptedRng, SeededRng,
    StaminaRegenPolicy, StorageError,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: BattleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_config(config_json: Option<String>) -> Result<BattleConfig, JsValue> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error),
        None => Ok(BattleConfig::default()),
    }
}

/// 前端持有的战斗句柄。
#[wasm_bindgen]
pub struct BattleEngine {
    engine: RuleEngine<SeededRng>,
    state: Option<BattleState>,
}

impl BattleEngine {
    fn execute<F>(&mut self, action: F) -> Result<String, JsValue>
    where
        F: FnOnce(&mut RuleEngine<SeededRng>, &mut BattleState) -> Result<Vec<BattleEvent>, RuleError>,
    {
        let Self { engine, state } = self;
        let state = state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("no battle in progress"))?;
        let events = action(engine, state).map_err(to_js_error)?;
        make_resolution_json(BattleResolution::new(state.clone(), events))
    }
}

#[wasm_bindgen]
impl BattleEngine {
    /// `seed` 为空时使用系统熵源。
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: Option<u32>) -> Result<BattleEngine, JsValue> {
        let config = parse_config(config_json)?;
        let rng = seed
            .map(|seed| SeededRng::from_seed_u64(u64::from(seed)))
            .unwrap_or_else(SeededRng::from_entropy);
        let engine = RuleEngine::new(config, rng).map_err(to_js_error)?;
        Ok(BattleEngine {
            engine,
            state: None,
        })
    }

    pub fn start_battle_json(&mut self, deck_json: &str, monster_json: &str) -> Result<String, JsValue> {
        let deck: Vec<CardDefinition> = serde_json::from_str(deck_json).map_err(serde_to_js_error)?;
        let monster: Monster = serde_json::from_str(monster_json).map_err(serde_to_js_error)?;
        let (state, events) = self
            .engine
            .start_battle(&deck, monster)
            .map_err(to_js_error)?;
        let resolution = BattleResolution::new(state.clone(), events);
        self.state = Some(state);
        make_resolution_json(resolution)
    }

    pub fn play_card(&mut self, hand_index: usize, slot: usize) -> Result<String, JsValue> {
        self.execute(|engine, state| engine.play_card(state, PlayCardAction { hand_index, slot }))
    }

    pub fn activate_skill(&mut self, slot: usize) -> Result<String, JsValue> {
        self.execute(|engine, state| engine.activate_skill(state, ActivateSkillAction { slot }))
    }

    pub fn end_turn(&mut self) -> Result<String, JsValue> {
        self.execute(|engine, state| engine.end_turn(state))
    }

    /// 同步结算回合，`delay_ms` 毫秒后再交给前端，用于播放动画。
    pub fn end_turn_paced(&mut self, delay_ms: u32) -> Promise {
        let resolution = self.end_turn();
        future_to_promise(async move {
            let json = resolution?;
            if delay_ms > 0 {
                TimeoutFuture::new(delay_ms).await;
            }
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.engine.config()).map_err(serde_to_js_error)
    }

    /// 离开战斗时丢弃当前状态。
    pub fn abandon(&mut self) {
        self.state = None;
    }
}

#[wasm_bindgen(js_name = "defaultConfig")]
pub fn default_config(mode: Option<String>) -> Result<JsValue, JsValue> {
    let config = match mode.as_deref() {
        Some("quick") => BattleConfig::quick_battle(),
        _ => BattleConfig::boss_map(),
    };
    to_value(&config).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "staminaGain")]
pub fn stamina_gain(round: u32, config_json: Option<String>) -> Result<u32, JsValue> {
    Ok(parse_config(config_json)?.stamina_gain(round))
}

#[wasm_bindgen(js_name = "toLiveCard")]
pub fn to_live_card_js(card: JsValue) -> Result<JsValue, JsValue> {
    let card: CardDefinition = from_value(card).map_err(JsValue::from)?;
    to_value(&to_live_card(&card)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateDeck")]
pub fn validate_deck(cards: JsValue, config_json: Option<String>) -> Result<(), JsValue> {
    let cards: Vec<CardDefinition> = from_value(cards).map_err(JsValue::from)?;
    let config = parse_config(config_json)?;
    validate_cards(&cards, &config).map_err(|error| to_js_error(RuleError::InvalidDeck { error }))
}

#[cfg(target_arch = "wasm32")]
fn local_decks() -> Result<storage::LocalStorageDeckRepository, JsValue> {
    storage::LocalStorageDeckRepository::from_window().map_err(serde_to_js_error)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = "loadSavedDeck")]
pub fn load_saved_deck() -> Result<JsValue, JsValue> {
    let deck = local_decks()?.load_saved_deck().map_err(serde_to_js_error)?;
    match deck {
        Some(deck) => to_value(&deck.cards).map_err(JsValue::from),
        None => Ok(JsValue::NULL),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = "saveDeck")]
pub fn save_deck(cards: JsValue) -> Result<(), JsValue> {
    let cards: Vec<CardDefinition> = from_value(cards).map_err(JsValue::from)?;
    local_decks()?
        .save_deck(&Deck::new(cards))
        .map_err(serde_to_js_error)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = "clearDeck")]
pub fn clear_deck() -> Result<(), JsValue> {
    local_decks()?.clear_deck().map_err(serde_to_js_error)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
