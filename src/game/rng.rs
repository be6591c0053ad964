use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// 战斗结算使用的随机源。
pub trait BattleRng {
    /// [0, 1) 之间的均匀随机数。
    fn next_f64(&mut self) -> f64;

    /// [0, len) 之间的随机下标，`len == 0` 时返回 0。
    fn gen_index(&mut self, len: usize) -> usize;

    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Fisher-Yates 洗牌。
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_index(i + 1);
            items.swap(i, j);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeededRng {
    inner: SmallRng,
}

impl SeededRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: SmallRng::from_entropy(),
        }
    }
}

impl BattleRng for SeededRng {
    fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    fn gen_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.inner.gen_range(0..len)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

/// 按预设顺序返回结果的随机源，供测试复现特定结算。
///
/// 队列耗尽后 `next_f64` 返回 `0.999`（任何概率判定都不触发），
/// `gen_index` 返回 0，洗牌保持原顺序。
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    rolls: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = f64>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }

    pub fn push_roll(&mut self, roll: f64) {
        self.rolls.push_back(roll);
    }

    pub fn push_index(&mut self, index: usize) {
        self.indices.push_back(index);
    }
}

impl BattleRng for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.999)
    }

    fn gen_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.indices.pop_front().unwrap_or(0) % len
    }

    fn shuffle<T>(&mut self, _items: &mut [T]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut a = SeededRng::from_seed_u64(12345);
        let mut b = SeededRng::from_seed_u64(12345);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
            assert_eq!(a.gen_index(17), b.gen_index(17));
        }
    }

    #[test]
    fn rolls_stay_in_unit_interval() {
        let mut rng = SeededRng::from_seed_u64(7);
        for _ in 0..1000 {
            let roll = rng.next_f64();
            assert!((0.0..1.0).contains(&roll));
            assert!(rng.gen_index(5) < 5);
        }
        assert_eq!(rng.gen_index(0), 0);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SeededRng::from_seed_u64(42);
        let mut items: Vec<u32> = (0..13).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..13).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_shuffle_matches_rand_slice_shuffle() {
        let mut rng = SeededRng::from_seed_u64(42);
        let mut items: Vec<u32> = (0..13).collect();
        rng.shuffle(&mut items);

        let mut inner = SmallRng::seed_from_u64(42);
        let mut expected: Vec<u32> = (0..13).collect();
        expected.as_mut_slice().shuffle(&mut inner);
        assert_eq!(items, expected);
    }

    #[test]
    fn scripted_rng_replays_then_defaults() {
        let mut rng = ScriptedRng::new().with_rolls([0.1]).with_indices([3, 9]);
        assert!(rng.chance(0.3));
        assert!(!rng.chance(0.3));
        assert_eq!(rng.gen_index(5), 3);
        assert_eq!(rng.gen_index(5), 4);
        assert_eq!(rng.gen_index(5), 0);

        let mut items = [1, 2, 3];
        rng.shuffle(&mut items);
        assert_eq!(items, [1, 2, 3]);
    }
}
