use serde::{Deserialize, Serialize};

/// 卡牌出场后何时结算攻击。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CombatTimingPolicy {
    /// 快速对战：出牌即攻击。
    Immediate,
    /// 地图 Boss 战：回合结束时场上卡牌依次攻击。
    Deferred,
}

/// 回合结束时体力的恢复方式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StaminaRegenPolicy {
    /// 体力直接设为本回合的增长值。
    Set,
    /// 本回合的增长值叠加到当前体力上。
    Accumulate,
}

/// 战斗引擎使用的全部数值参数。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BattleConfig {
    pub timing: CombatTimingPolicy,
    pub stamina_regen: StaminaRegenPolicy,
    pub starting_health: u32,
    pub max_health: u32,
    pub starting_stamina: u32,
    pub max_stamina: u32,
    pub initial_hand_size: usize,
    pub deck_size_limit: usize,
    pub field_slots: usize,
    pub stamina_base: u32,
    pub stamina_scaling: f64,
    pub crit_chance: f64,
    pub crit_multiplier: u32,
    pub lifesteal_fraction: f64,
    pub thorns_damage: u32,
    pub explode_damage: u32,
    pub opponent_crit_chance: f64,
    pub opponent_crit_multiplier: f64,
    pub opponent_lifesteal_chance: f64,
    pub opponent_lifesteal_fraction: f64,
}

impl BattleConfig {
    pub fn boss_map() -> Self {
        Self {
            timing: CombatTimingPolicy::Deferred,
            stamina_regen: StaminaRegenPolicy::Set,
            starting_health: 40,
            max_health: 40,
            starting_stamina: 1,
            max_stamina: 10,
            initial_hand_size: 4,
            deck_size_limit: 13,
            field_slots: 10,
            stamina_base: 1,
            stamina_scaling: 0.5,
            crit_chance: 0.30,
            crit_multiplier: 2,
            lifesteal_fraction: 0.50,
            thorns_damage: 2,
            explode_damage: 3,
            opponent_crit_chance: 0.20,
            opponent_crit_multiplier: 1.5,
            opponent_lifesteal_chance: 0.30,
            opponent_lifesteal_fraction: 0.30,
        }
    }

    pub fn quick_battle() -> Self {
        Self {
            timing: CombatTimingPolicy::Immediate,
            stamina_regen: StaminaRegenPolicy::Accumulate,
            field_slots: 5,
            ..Self::boss_map()
        }
    }

    pub fn with_timing(mut self, timing: CombatTimingPolicy) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_stamina_regen(mut self, policy: StaminaRegenPolicy) -> Self {
        self.stamina_regen = policy;
        self
    }

    pub fn stamina_gain(&self, round: u32) -> u32 {
        stamina_gain(round, self.stamina_base, self.stamina_scaling)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.field_slots == 0 {
            return Err("fieldSlots must be at least 1".into());
        }
        if self.initial_hand_size == 0 {
            return Err("initialHandSize must be at least 1".into());
        }
        if self.deck_size_limit == 0 {
            return Err("deckSizeLimit must be at least 1".into());
        }
        if self.max_health == 0 || self.starting_health > self.max_health {
            return Err("startingHealth must be within 1..=maxHealth".into());
        }
        if self.starting_stamina > self.max_stamina {
            return Err("startingStamina exceeds maxStamina".into());
        }
        if self.stamina_scaling.is_nan() || self.stamina_scaling < 0.0 {
            return Err("staminaScaling must be non-negative".into());
        }
        let probabilities = [
            ("critChance", self.crit_chance),
            ("lifestealFraction", self.lifesteal_fraction),
            ("opponentCritChance", self.opponent_crit_chance),
            ("opponentLifestealChance", self.opponent_lifesteal_chance),
            ("opponentLifestealFraction", self.opponent_lifesteal_fraction),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if self.opponent_crit_multiplier.is_nan() || self.opponent_crit_multiplier < 1.0 {
            return Err("opponentCritMultiplier must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::boss_map()
    }
}

/// 第 `round` 回合开始时获得的体力：`floor(base + (round - 1) * scaling)`，最小为 0。
pub fn stamina_gain(round: u32, base: u32, scaling: f64) -> u32 {
    let gain = f64::from(base) + (f64::from(round) - 1.0) * scaling;
    gain.floor().max(0.0) as u32
}
