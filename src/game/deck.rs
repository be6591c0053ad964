use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    card::{CardDefect, CardDefinition, CardId},
    config::BattleConfig,
};

/// 本地保存卡组使用的固定键。
pub const SAVED_DECK_KEY: &str = "tcg-battle.saved-deck";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DeckError {
    #[error("deck is empty")]
    Empty,
    #[error("deck holds {count} cards, limit is {limit}")]
    TooManyCards { count: usize, limit: usize },
    #[error("card {card_id} appears {count} times, limit is {limit}")]
    TooManyCopies { card_id: CardId, count: u32, limit: u32 },
    #[error("card {card_id} is invalid: {defect}")]
    InvalidCard { card_id: CardId, defect: CardDefect },
}

/// 玩家选定的出战卡组。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub cards: Vec<CardDefinition>,
}

impl Deck {
    pub fn new(cards: Vec<CardDefinition>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn validate(&self, config: &BattleConfig) -> Result<(), DeckError> {
        validate_cards(&self.cards, config)
    }
}

pub fn validate_cards(cards: &[CardDefinition], config: &BattleConfig) -> Result<(), DeckError> {
    if cards.is_empty() {
        return Err(DeckError::Empty);
    }
    if cards.len() > config.deck_size_limit {
        return Err(DeckError::TooManyCards {
            count: cards.len(),
            limit: config.deck_size_limit,
        });
    }

    let mut copies: HashMap<CardId, u32> = HashMap::new();
    for card in cards {
        card.validate().map_err(|defect| DeckError::InvalidCard {
            card_id: card.id,
            defect,
        })?;
        let count = copies.entry(card.id).or_insert(0);
        *count += 1;
        if *count > card.max_per_session {
            return Err(DeckError::TooManyCopies {
                card_id: card.id,
                count: *count,
                limit: card.max_per_session,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("saved deck could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("deck storage is unavailable")]
    Unavailable,
    #[error("deck storage failed: {0}")]
    Backend(String),
}

/// 已保存卡组的读写接口，由战斗引擎的调用方注入。
pub trait DeckRepository {
    fn load_saved_deck(&self) -> Result<Option<Deck>, StorageError>;
    fn save_deck(&mut self, deck: &Deck) -> Result<(), StorageError>;
    fn clear_deck(&mut self) -> Result<(), StorageError>;
}

/// 以 JSON 文本保存在内存中的实现，用于原生环境和测试。
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeckRepository {
    entries: HashMap<String, String>,
}

impl InMemoryDeckRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeckRepository for InMemoryDeckRepository {
    fn load_saved_deck(&self) -> Result<Option<Deck>, StorageError> {
        self.entries
            .get(SAVED_DECK_KEY)
            .map(|json| serde_json::from_str(json))
            .transpose()
            .map_err(StorageError::from)
    }

    fn save_deck(&mut self, deck: &Deck) -> Result<(), StorageError> {
        let json = serde_json::to_string(deck)?;
        self.entries.insert(SAVED_DECK_KEY.to_string(), json);
        Ok(())
    }

    fn clear_deck(&mut self) -> Result<(), StorageError> {
        self.entries.remove(SAVED_DECK_KEY);
        Ok(())
    }
}
