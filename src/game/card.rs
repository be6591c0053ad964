use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 卡牌标识（链上读取的 token id）。
pub type CardId = u32;
/// 怪物 / Boss 标识。
pub type MonsterId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Element {
    Fire,
    Water,
    Wood,
    Earth,
    Metal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AttackEffect {
    #[default]
    None,
    Lifesteal,
    CriticalStrike,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeathEffect {
    #[default]
    None,
    Explode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DefenseEffect {
    #[default]
    None,
    Thorns,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ActiveSkill {
    #[default]
    None,
    Sacrifice,
}

/// 卡牌定义违反的约束。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum CardDefect {
    #[error("health must be positive")]
    ZeroHealth,
    #[error("maxPerSession must be at least 1")]
    ZeroCopies,
    #[error("at least one elemental class is required")]
    NoClasses,
}

/// 外部提供的不可变卡牌数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub attack: u32,
    pub health: u32,
    #[serde(default = "default_max_per_session")]
    pub max_per_session: u32,
    pub classes: Vec<Element>,
    #[serde(default)]
    pub stamina_cost: u32,
    #[serde(default)]
    pub on_attack_effect: AttackEffect,
    #[serde(default)]
    pub on_dead_effect: DeathEffect,
    #[serde(default)]
    pub on_defense_effect: DefenseEffect,
    #[serde(default)]
    pub active_skill: ActiveSkill,
    #[serde(default)]
    pub image: String,
}

fn default_max_per_session() -> u32 {
    1
}

impl CardDefinition {
    pub fn new(id: CardId, name: impl Into<String>, attack: u32, health: u32, stamina_cost: u32) -> Self {
        Self {
            id,
            name: name.into(),
            attack,
            health,
            max_per_session: 1,
            classes: vec![Element::Fire],
            stamina_cost,
            on_attack_effect: AttackEffect::None,
            on_dead_effect: DeathEffect::None,
            on_defense_effect: DefenseEffect::None,
            active_skill: ActiveSkill::None,
            image: String::new(),
        }
    }

    pub fn with_classes(mut self, classes: Vec<Element>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_max_per_session(mut self, copies: u32) -> Self {
        self.max_per_session = copies;
        self
    }

    pub fn with_attack_effect(mut self, effect: AttackEffect) -> Self {
        self.on_attack_effect = effect;
        self
    }

    pub fn with_death_effect(mut self, effect: DeathEffect) -> Self {
        self.on_dead_effect = effect;
        self
    }

    pub fn with_defense_effect(mut self, effect: DefenseEffect) -> Self {
        self.on_defense_effect = effect;
        self
    }

    pub fn with_active_skill(mut self, skill: ActiveSkill) -> Self {
        self.active_skill = skill;
        self
    }

    pub fn validate(&self) -> Result<(), CardDefect> {
        if self.health == 0 {
            return Err(CardDefect::ZeroHealth);
        }
        if self.max_per_session == 0 {
            return Err(CardDefect::ZeroCopies);
        }
        if self.classes.is_empty() {
            return Err(CardDefect::NoClasses);
        }
        Ok(())
    }
}

/// 战斗中的卡牌实例。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveCard {
    #[serde(flatten)]
    pub definition: CardDefinition,
    pub current_health: u32,
}

impl LiveCard {
    pub fn id(&self) -> CardId {
        self.definition.id
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// 扣除生命值。仅当本次伤害使卡牌从存活变为死亡时返回 `true`。
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive();
        self.current_health = self.current_health.saturating_sub(amount);
        was_alive && !self.is_alive()
    }
}

pub fn to_live_card(definition: &CardDefinition) -> LiveCard {
    LiveCard {
        definition: definition.clone(),
        current_health: definition.health,
    }
}

/// 怪物或 Boss 的静态数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: MonsterId,
    pub name: String,
    pub max_health: u32,
    pub attack: u32,
    #[serde(default)]
    pub classes: Vec<Element>,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Monster {
    pub fn new(id: MonsterId, name: impl Into<String>, max_health: u32, attack: u32) -> Self {
        Self {
            id,
            name: name.into(),
            max_health,
            attack,
            classes: Vec::new(),
            image: String::new(),
            description: None,
        }
    }

    pub fn boss(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_boss(&self) -> bool {
        self.description.is_some()
    }
}

/// 战斗中对手的可变状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpponentState {
    pub monster: Monster,
    pub health: u32,
    pub attack: u32,
}

impl OpponentState {
    pub fn new(monster: Monster) -> Self {
        Self {
            health: monster.max_health,
            attack: monster.attack,
            monster,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// 返回实际扣除的生命值。
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.health);
        self.health -= dealt;
        dealt
    }

    /// 返回实际恢复的生命值。
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.monster.max_health.saturating_sub(self.health));
        self.health += healed;
        healed
    }
}
