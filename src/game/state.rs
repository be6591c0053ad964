use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    card::{to_live_card, ActiveSkill, CardDefinition, CardId, LiveCard, Monster, OpponentState},
    config::BattleConfig,
};

/// 战斗阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BattlePhase {
    #[default]
    PlayerTurn,
    Battle,
    MonsterTurn,
    RoundEnd,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    PlayCard,
    MonsterAttack,
}

/// 战斗记录中的一条。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BattleLogEntry {
    pub turn: u32,
    pub action: LogAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    pub damage: u32,
    pub target_health: u32,
}

/// 每次操作产生的事件流，供前端播放动画和提示。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BattleEvent {
    BattleStarted {
        hand_size: usize,
        deck_size: usize,
    },
    PhaseChanged {
        phase: BattlePhase,
    },
    CardDrawn {
        card_id: CardId,
    },
    DeckEmpty,
    CardPlayed {
        card_id: CardId,
        slot: usize,
        stamina_spent: u32,
    },
    CardStruck {
        card_id: CardId,
        slot: usize,
        damage: u32,
        critical: bool,
    },
    PlayerHealed {
        amount: u32,
    },
    MonsterAttacked {
        #[serde(skip_serializing_if = "Option::is_none")]
        slot: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        card_id: Option<CardId>,
        damage: u32,
        critical: bool,
    },
    ThornsReflected {
        card_id: CardId,
        amount: u32,
    },
    CardDestroyed {
        card_id: CardId,
        slot: usize,
    },
    CardExploded {
        card_id: CardId,
        damage: u32,
    },
    MonsterHealed {
        amount: u32,
    },
    SkillActivated {
        card_id: CardId,
        slot: usize,
        skill: ActiveSkill,
    },
    RoundStarted {
        round: u32,
        stamina: u32,
    },
    BattleWon,
    BattleLost,
}

/// 状态自检发现的不一致。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IntegrityError {
    #[error("player health {value} outside 0..={max}")]
    HealthOutOfRange { value: u32, max: u32 },
    #[error("player stamina {value} outside 0..={max}")]
    StaminaOutOfRange { value: u32, max: u32 },
    #[error("opponent health {value} outside 0..={max}")]
    OpponentHealthOutOfRange { value: u32, max: u32 },
    #[error("card {card_id} health {value} outside 0..={max}")]
    CardHealthOutOfRange { card_id: CardId, value: u32, max: u32 },
    #[error("field has {actual} slots, expected {expected}")]
    FieldSizeMismatch { expected: usize, actual: usize },
    #[error("dead card {card_id} still occupies slot {slot}")]
    DeadCardOnField { card_id: CardId, slot: usize },
}

/// 一场战斗的完整状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    pub player_health: u32,
    pub max_health: u32,
    pub player_stamina: u32,
    pub max_stamina: u32,
    pub round: u32,
    pub phase: BattlePhase,
    #[serde(default)]
    pub hand: Vec<LiveCard>,
    #[serde(default)]
    pub deck: VecDeque<LiveCard>,
    pub field: Vec<Option<LiveCard>>,
    pub opponent: OpponentState,
    #[serde(default)]
    pub history: Vec<BattleLogEntry>,
}

impl BattleState {
    /// `deck` 须已洗好，前 `initial_hand_size` 张进入手牌。
    pub fn new(deck: &[CardDefinition], monster: Monster, config: &BattleConfig) -> Self {
        let split = config.initial_hand_size.min(deck.len());
        let (hand, rest) = deck.split_at(split);
        Self {
            player_health: config.starting_health,
            max_health: config.max_health,
            player_stamina: config.starting_stamina,
            max_stamina: config.max_stamina,
            round: 1,
            phase: BattlePhase::PlayerTurn,
            hand: hand.iter().map(to_live_card).collect(),
            deck: rest.iter().map(to_live_card).collect(),
            field: vec![None; config.field_slots],
            opponent: OpponentState::new(monster),
            history: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Victory | BattlePhase::Defeat)
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Victory => Some(BattleOutcome::Victory),
            BattlePhase::Defeat => Some(BattleOutcome::Defeat),
            _ => None,
        }
    }

    pub fn slot(&self, slot: usize) -> Option<&LiveCard> {
        self.field.get(slot).and_then(Option::as_ref)
    }

    pub fn is_slot_free(&self, slot: usize) -> bool {
        matches!(self.field.get(slot), Some(None))
    }

    pub fn occupied_slots(&self) -> Vec<usize> {
        self.field
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| index))
            .collect()
    }

    pub fn damage_player(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.player_health);
        self.player_health -= dealt;
        dealt
    }

    pub fn heal_player(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_health.saturating_sub(self.player_health));
        self.player_health += healed;
        healed
    }

    pub fn record(&mut self, action: LogAction, card_id: Option<CardId>, damage: u32, target_health: u32) {
        self.history.push(BattleLogEntry {
            turn: self.round,
            action,
            card_id,
            damage,
            target_health,
        });
    }

    /// 从牌库顶部抽一张牌；牌库为空时只返回提示事件。
    pub fn draw_card(&mut self) -> BattleEvent {
        match self.deck.pop_front() {
            Some(card) => {
                let card_id = card.id();
                self.hand.push(card);
                BattleEvent::CardDrawn { card_id }
            }
            None => BattleEvent::DeckEmpty,
        }
    }

    pub fn enter_phase(&mut self, phase: BattlePhase) -> BattleEvent {
        self.phase = phase;
        BattleEvent::PhaseChanged { phase }
    }

    pub fn integrity_check(&self, config: &BattleConfig) -> Result<(), IntegrityError> {
        if self.player_health > self.max_health {
            return Err(IntegrityError::HealthOutOfRange {
                value: self.player_health,
                max: self.max_health,
            });
        }
        if self.player_stamina > self.max_stamina {
            return Err(IntegrityError::StaminaOutOfRange {
                value: self.player_stamina,
                max: self.max_stamina,
            });
        }
        if self.opponent.health > self.opponent.monster.max_health {
            return Err(IntegrityError::OpponentHealthOutOfRange {
                value: self.opponent.health,
                max: self.opponent.monster.max_health,
            });
        }
        if self.field.len() != config.field_slots {
            return Err(IntegrityError::FieldSizeMismatch {
                expected: config.field_slots,
                actual: self.field.len(),
            });
        }
        for (slot, card) in self.field.iter().enumerate() {
            if let Some(card) = card {
                if !card.is_alive() {
                    return Err(IntegrityError::DeadCardOnField {
                        card_id: card.id(),
                        slot,
                    });
                }
            }
        }
        for card in self
            .hand
            .iter()
            .chain(self.deck.iter())
            .chain(self.field.iter().flatten())
        {
            if card.current_health > card.definition.health {
                return Err(IntegrityError::CardHealthOutOfRange {
                    card_id: card.id(),
                    value: card.current_health,
                    max: card.definition.health,
                });
            }
        }
        Ok(())
    }
}
