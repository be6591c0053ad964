use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    card::{ActiveSkill, CardDefinition, Monster},
    config::{BattleConfig, CombatTimingPolicy, StaminaRegenPolicy},
    deck::{validate_cards, DeckError},
    effects::{resolve_attack_effect, resolve_death_effect, resolve_defense_effect, scale_floor},
    rng::{BattleRng, SeededRng},
    state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, IntegrityError, LogAction},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardAction {
    pub hand_index: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivateSkillAction {
    pub slot: usize,
}

/// 被拒绝的玩家操作。所有错误都可恢复，且不会修改战斗状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Error)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuleError {
    #[error("the battle is already over")]
    BattleFinished,
    #[error("action requires {expected:?} but the battle is in {actual:?}")]
    InvalidPhase {
        expected: BattlePhase,
        actual: BattlePhase,
    },
    #[error("no card at hand index {hand_index}")]
    CardNotFound { hand_index: usize },
    #[error("field slot {slot} is occupied or does not exist")]
    InvalidSlot { slot: usize },
    #[error("not enough stamina: card costs {required}, {available} available")]
    InsufficientStamina { required: u32, available: u32 },
    #[error("slot {slot} holds no card with an active skill")]
    NoActiveSkill { slot: usize },
    #[error("invalid deck: {error}")]
    InvalidDeck { error: DeckError },
    #[error("invalid battle config: {reason}")]
    InvalidConfig { reason: String },
    #[error("battle state is inconsistent: {error}")]
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleResolution {
    pub state: BattleState,
    pub events: Vec<BattleEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BattleOutcome>,
}

impl BattleResolution {
    pub fn new(state: BattleState, events: Vec<BattleEvent>) -> Self {
        let outcome = state.outcome();
        Self {
            state,
            events,
            outcome,
        }
    }
}

/// 回合制战斗状态机。
///
/// 所有结算都在一次调用内同步完成，随机性全部来自注入的 `rng`。
pub struct RuleEngine<R: BattleRng = SeededRng> {
    config: BattleConfig,
    rng: R,
}

impl<R: BattleRng> RuleEngine<R> {
    pub fn new(config: BattleConfig, rng: R) -> Result<Self, RuleError> {
        config
            .validate()
            .map_err(|reason| RuleError::InvalidConfig { reason })?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    fn ensure_active(state: &BattleState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::BattleFinished);
        }
        Ok(())
    }

    fn ensure_player_turn(state: &BattleState) -> Result<(), RuleError> {
        if state.phase != BattlePhase::PlayerTurn {
            return Err(RuleError::InvalidPhase {
                expected: BattlePhase::PlayerTurn,
                actual: state.phase,
            });
        }
        Ok(())
    }

    fn ensure_integrity(&self, state: &BattleState) -> Result<(), RuleError> {
        state
            .integrity_check(&self.config)
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn ensure_can_act(&self, state: &BattleState) -> Result<(), RuleError> {
        Self::ensure_active(state)?;
        self.ensure_integrity(state)?;
        Self::ensure_player_turn(state)
    }

    pub fn start_battle(
        &mut self,
        deck: &[CardDefinition],
        monster: Monster,
    ) -> Result<(BattleState, Vec<BattleEvent>), RuleError> {
        validate_cards(deck, &self.config).map_err(|error| {
            debug!("rejected deck: {error}");
            RuleError::InvalidDeck { error }
        })?;

        let mut shuffled = deck.to_vec();
        self.rng.shuffle(&mut shuffled);

        let state = BattleState::new(&shuffled, monster, &self.config);
        info!(
            "battle started against {} ({} hp), hand {} / deck {}",
            state.opponent.monster.name,
            state.opponent.health,
            state.hand.len(),
            state.deck.len()
        );

        let events = vec![
            BattleEvent::BattleStarted {
                hand_size: state.hand.len(),
                deck_size: state.deck.len(),
            },
            BattleEvent::PhaseChanged {
                phase: BattlePhase::PlayerTurn,
            },
        ];
        Ok((state, events))
    }

    pub fn play_card(
        &mut self,
        state: &mut BattleState,
        action: PlayCardAction,
    ) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_can_act(state)?;

        let cost = state
            .hand
            .get(action.hand_index)
            .map(|card| card.definition.stamina_cost)
            .ok_or(RuleError::CardNotFound {
                hand_index: action.hand_index,
            })?;
        if !state.is_slot_free(action.slot) {
            return Err(RuleError::InvalidSlot { slot: action.slot });
        }
        if cost > state.player_stamina {
            debug!(
                "card at hand index {} costs {cost}, only {} stamina left",
                action.hand_index, state.player_stamina
            );
            return Err(RuleError::InsufficientStamina {
                required: cost,
                available: state.player_stamina,
            });
        }

        let card = state.hand.remove(action.hand_index);
        let card_id = card.id();
        state.player_stamina -= cost;
        state.field[action.slot] = Some(card);

        let mut events = vec![BattleEvent::CardPlayed {
            card_id,
            slot: action.slot,
            stamina_spent: cost,
        }];

        if self.config.timing == CombatTimingPolicy::Immediate {
            self.strike(state, action.slot, &mut events);
            if !self.check_victory(state, &mut events) {
                self.counter_attack(state, action.slot, &mut events);
            }
        }

        Ok(events)
    }

    /// 主动技能。目前只有献祭：卡牌离场，玩家恢复其剩余生命，并触发死亡特效。
    pub fn activate_skill(
        &mut self,
        state: &mut BattleState,
        action: ActivateSkillAction,
    ) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_can_act(state)?;

        if action.slot >= state.field.len() {
            return Err(RuleError::InvalidSlot { slot: action.slot });
        }
        let skill = state
            .slot(action.slot)
            .map(|card| card.definition.active_skill)
            .unwrap_or_default();
        if skill != ActiveSkill::Sacrifice {
            return Err(RuleError::NoActiveSkill { slot: action.slot });
        }

        let mut events = Vec::new();
        let Some(card) = state.field[action.slot].take() else {
            return Err(RuleError::NoActiveSkill { slot: action.slot });
        };
        let card_id = card.id();
        events.push(BattleEvent::SkillActivated {
            card_id,
            slot: action.slot,
            skill,
        });

        let healed = state.heal_player(card.current_health);
        if healed > 0 {
            events.push(BattleEvent::PlayerHealed { amount: healed });
        }
        events.push(BattleEvent::CardDestroyed {
            card_id,
            slot: action.slot,
        });
        let blast = resolve_death_effect(&card, &self.config);
        if blast > 0 {
            state.opponent.take_damage(blast);
            events.push(BattleEvent::CardExploded {
                card_id,
                damage: blast,
            });
        }
        self.check_victory(state, &mut events);

        Ok(events)
    }

    pub fn end_turn(&mut self, state: &mut BattleState) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_can_act(state)?;

        let mut events = Vec::new();

        if self.config.timing == CombatTimingPolicy::Deferred {
            events.push(state.enter_phase(BattlePhase::Battle));
            for slot in state.occupied_slots() {
                self.strike(state, slot, &mut events);
                if self.check_victory(state, &mut events) {
                    return Ok(events);
                }
            }
        }

        events.push(state.enter_phase(BattlePhase::MonsterTurn));
        self.monster_turn(state, &mut events);
        if state.is_finished() {
            return Ok(events);
        }

        events.push(state.enter_phase(BattlePhase::RoundEnd));
        self.round_end(state, &mut events);

        events.push(state.enter_phase(BattlePhase::PlayerTurn));
        Ok(events)
    }

    fn strike(&mut self, state: &mut BattleState, slot: usize, events: &mut Vec<BattleEvent>) {
        let Some(card) = state.slot(slot) else {
            return;
        };
        let card_id = card.id();
        let outcome = resolve_attack_effect(card, card.definition.attack, &self.config, &mut self.rng);

        let dealt = state.opponent.take_damage(outcome.final_damage);
        events.push(BattleEvent::CardStruck {
            card_id,
            slot,
            damage: outcome.final_damage,
            critical: outcome.critical,
        });

        let healed = state.heal_player(outcome.heal);
        if healed > 0 {
            events.push(BattleEvent::PlayerHealed { amount: healed });
        }

        let remaining = state.opponent.health;
        state.record(LogAction::PlayCard, Some(card_id), dealt, remaining);
    }

    /// 快速对战中，怪物以基础攻击力立即反击刚出场的卡牌，随后结算荆棘与死亡特效。
    fn counter_attack(&mut self, state: &mut BattleState, slot: usize, events: &mut Vec<BattleEvent>) {
        let damage = state.opponent.attack;
        debug!("{} counters slot {slot} for {damage}", state.opponent.monster.name);
        self.monster_hits_card(state, slot, damage, false, events);
        self.check_victory(state, events);
    }

    fn monster_turn(&mut self, state: &mut BattleState, events: &mut Vec<BattleEvent>) {
        let occupied = state.occupied_slots();
        let target = if occupied.is_empty() {
            None
        } else {
            Some(occupied[self.rng.gen_index(occupied.len())])
        };

        let base = state.opponent.attack;
        let critical = self.rng.chance(self.config.opponent_crit_chance);
        let damage = if critical {
            scale_floor(base, self.config.opponent_crit_multiplier)
        } else {
            base
        };

        let dealt = match target {
            Some(slot) => self.monster_hits_card(state, slot, damage, critical, events),
            None => {
                debug!("field is empty, {} attacks the player directly", state.opponent.monster.name);
                let dealt = state.damage_player(damage);
                events.push(BattleEvent::MonsterAttacked {
                    slot: None,
                    card_id: None,
                    damage,
                    critical,
                });
                let remaining = state.player_health;
                state.record(LogAction::MonsterAttack, None, dealt, remaining);
                dealt
            }
        };

        if self.check_victory(state, events) || self.check_defeat(state, events) {
            return;
        }

        if self.rng.chance(self.config.opponent_lifesteal_chance) {
            let healed = state
                .opponent
                .heal(scale_floor(dealt, self.config.opponent_lifesteal_fraction));
            if healed > 0 {
                events.push(BattleEvent::MonsterHealed { amount: healed });
            }
        }
    }

    /// 返回实际从目标卡牌扣除的生命值。
    fn monster_hits_card(
        &mut self,
        state: &mut BattleState,
        slot: usize,
        damage: u32,
        critical: bool,
        events: &mut Vec<BattleEvent>,
    ) -> u32 {
        let Some(card) = state.field.get_mut(slot).and_then(Option::as_mut) else {
            return 0;
        };
        let card_id = card.id();
        let before = card.current_health;
        let died = card.take_damage(damage);
        let remaining = card.current_health;
        let dealt = before - remaining;

        events.push(BattleEvent::MonsterAttacked {
            slot: Some(slot),
            card_id: Some(card_id),
            damage,
            critical,
        });
        state.record(LogAction::MonsterAttack, Some(card_id), dealt, remaining);

        // 荆棘在主伤害结算之后反弹
        let reflected = resolve_defense_effect(state.slot(slot), &self.config);
        if reflected > 0 {
            state.opponent.take_damage(reflected);
            events.push(BattleEvent::ThornsReflected {
                card_id,
                amount: reflected,
            });
        }

        if died {
            if let Some(dead) = state.field[slot].take() {
                debug!("card {card_id} destroyed in slot {slot}");
                events.push(BattleEvent::CardDestroyed { card_id, slot });
                let blast = resolve_death_effect(&dead, &self.config);
                if blast > 0 {
                    state.opponent.take_damage(blast);
                    events.push(BattleEvent::CardExploded {
                        card_id,
                        damage: blast,
                    });
                }
            }
        }

        dealt
    }

    fn round_end(&mut self, state: &mut BattleState, events: &mut Vec<BattleEvent>) {
        state.round += 1;
        let gain = self.config.stamina_gain(state.round);
        let stamina = match self.config.stamina_regen {
            StaminaRegenPolicy::Set => gain,
            StaminaRegenPolicy::Accumulate => state.player_stamina.saturating_add(gain),
        };
        state.player_stamina = stamina.min(state.max_stamina);
        events.push(BattleEvent::RoundStarted {
            round: state.round,
            stamina: state.player_stamina,
        });

        let draw = state.draw_card();
        if draw == BattleEvent::DeckEmpty {
            debug!("deck is empty, no card drawn in round {}", state.round);
        }
        events.push(draw);
    }

    fn check_victory(&self, state: &mut BattleState, events: &mut Vec<BattleEvent>) -> bool {
        if !state.opponent.is_defeated() {
            return false;
        }
        info!(
            "{} defeated in round {}",
            state.opponent.monster.name, state.round
        );
        events.push(state.enter_phase(BattlePhase::Victory));
        events.push(BattleEvent::BattleWon);
        true
    }

    fn check_defeat(&self, state: &mut BattleState, events: &mut Vec<BattleEvent>) -> bool {
        if state.player_health > 0 {
            return false;
        }
        info!(
            "player defeated by {} in round {}",
            state.opponent.monster.name, state.round
        );
        events.push(state.enter_phase(BattlePhase::Defeat));
        events.push(BattleEvent::BattleLost);
        true
    }
}
