//! 战斗核心逻辑（状态机、特效结算、卡组校验等）。

pub mod card;
pub mod config;
pub mod deck;
pub mod effects;
pub mod rng;
pub mod rules;
pub mod state;

pub use card::{
    to_live_card,
    ActiveSkill,
    AttackEffect,
    CardDefect,
    CardDefinition,
    CardId,
    DeathEffect,
    DefenseEffect,
    Element,
    LiveCard,
    Monster,
    MonsterId,
    OpponentState,
};
pub use config::{stamina_gain, BattleConfig, CombatTimingPolicy, StaminaRegenPolicy};
pub use deck::{
    validate_cards,
    Deck,
    DeckError,
    DeckRepository,
    InMemoryDeckRepository,
    StorageError,
    SAVED_DECK_KEY,
};
pub use effects::{resolve_attack_effect, resolve_death_effect, resolve_defense_effect, AttackOutcome};
pub use rng::{BattleRng, ScriptedRng, SeededRng};
pub use rules::{ActivateSkillAction, BattleResolution, PlayCardAction, RuleEngine, RuleError};
pub use state::{
    BattleEvent,
    BattleLogEntry,
    BattleOutcome,
    BattlePhase,
    BattleState,
    IntegrityError,
    LogAction,
};
