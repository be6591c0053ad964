use serde::{Deserialize, Serialize};

use super::{
    card::{AttackEffect, DeathEffect, DefenseEffect, LiveCard},
    config::BattleConfig,
    rng::BattleRng,
};

/// 一次攻击经过攻击特效修正后的结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttackOutcome {
    pub final_damage: u32,
    pub heal: u32,
    pub critical: bool,
}

impl AttackOutcome {
    fn plain(damage: u32) -> Self {
        Self {
            final_damage: damage,
            heal: 0,
            critical: false,
        }
    }
}

/// 结算攻击特效。只有暴击会消耗一次随机判定。
pub fn resolve_attack_effect<R: BattleRng>(
    card: &LiveCard,
    base_damage: u32,
    config: &BattleConfig,
    rng: &mut R,
) -> AttackOutcome {
    match card.definition.on_attack_effect {
        AttackEffect::None => AttackOutcome::plain(base_damage),
        AttackEffect::CriticalStrike => {
            if rng.chance(config.crit_chance) {
                AttackOutcome {
                    final_damage: base_damage.saturating_mul(config.crit_multiplier),
                    heal: 0,
                    critical: true,
                }
            } else {
                AttackOutcome::plain(base_damage)
            }
        }
        AttackEffect::Lifesteal => AttackOutcome {
            final_damage: base_damage,
            heal: scale_floor(base_damage, config.lifesteal_fraction),
            critical: false,
        },
    }
}

/// 被攻击卡牌反弹给攻击者的伤害；空槽位不会触发。
pub fn resolve_defense_effect(card: Option<&LiveCard>, config: &BattleConfig) -> u32 {
    match card.map(|card| card.definition.on_defense_effect) {
        Some(DefenseEffect::Thorns) => config.thorns_damage,
        _ => 0,
    }
}

/// 卡牌死亡时对对手造成的伤害。调用方需保证每个实例只结算一次。
pub fn resolve_death_effect(card: &LiveCard, config: &BattleConfig) -> u32 {
    match card.definition.on_dead_effect {
        DeathEffect::Explode => config.explode_damage,
        DeathEffect::None => 0,
    }
}

pub(crate) fn scale_floor(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor).floor().max(0.0) as u32
}
