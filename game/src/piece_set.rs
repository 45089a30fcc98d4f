use serde::{Deserialize, Serialize};

use crate::error::PlacementError;
use crate::shapes::Shape;

pub const PIECE_SET_LEN: usize = 3;

/// The pieces currently offered. Placing a piece empties its slot; slots are
/// refilled only all together, once every slot is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSet {
    slots: [Option<Shape>; PIECE_SET_LEN],
}

impl PieceSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: [Shape; PIECE_SET_LEN]) -> Self {
        Self {
            slots: shapes.map(Some),
        }
    }

    pub fn from_slots(slots: [Option<Shape>; PIECE_SET_LEN]) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Option<Shape>; PIECE_SET_LEN] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Result<Shape, PlacementError> {
        match self.slots.get(slot) {
            None => Err(PlacementError::SlotOutOfRange(slot)),
            Some(None) => Err(PlacementError::EmptySlot(slot)),
            Some(Some(shape)) => Ok(*shape),
        }
    }

    pub(crate) fn take(&mut self, slot: usize) -> Result<Shape, PlacementError> {
        let shape = self.get(slot)?;
        self.slots[slot] = None;
        Ok(shape)
    }

    pub fn remaining(&self) -> impl Iterator<Item = Shape> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining().count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Seeded weighted shape draws. Deterministic per seed so recorded games
/// replay identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealer {
    rng: Rng,
    pool: Vec<Shape>,
}

impl Dealer {
    pub fn new(seed: u64) -> Self {
        Self::with_pool(seed, Shape::all())
    }

    pub fn with_pool(seed: u64, pool: Vec<Shape>) -> Self {
        let pool = if pool.is_empty() {
            vec![Shape::Single]
        } else {
            pool
        };
        Self {
            rng: Rng::new(seed),
            pool,
        }
    }

    pub fn pool(&self) -> &[Shape] {
        &self.pool
    }

    pub fn draw(&mut self) -> Shape {
        let total_weight = self
            .pool
            .iter()
            .map(|shape| shape.default_weight())
            .sum::<u32>()
            .max(1);
        let mut pick = self.rng.next_u32() % total_weight;
        for &shape in &self.pool {
            let w = shape.default_weight();
            if pick < w {
                return shape;
            }
            pick -= w;
        }
        Shape::Single
    }

    pub fn deal(&mut self) -> PieceSet {
        PieceSet::from_shapes([self.draw(), self.draw(), self.draw()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn take_empties_only_that_slot() {
        let mut set = PieceSet::from_shapes([Shape::Single, Shape::I3H, Shape::Z]);
        assert_eq!(set.take(1), Ok(Shape::I3H));
        assert_eq!(set.slots(), &[Some(Shape::Single), None, Some(Shape::Z)]);
        assert_eq!(set.take(1), Err(PlacementError::EmptySlot(1)));
        assert_eq!(set.get(3), Err(PlacementError::SlotOutOfRange(3)));
        assert_eq!(set.remaining().collect::<Vec<_>>(), vec![Shape::Single, Shape::Z]);
        assert!(!set.is_exhausted());

        set.take(0).unwrap();
        set.take(2).unwrap();
        assert!(set.is_exhausted());
        assert_eq!(set.remaining_count(), 0);
    }

    #[test]
    fn same_seed_deals_same_sets() {
        let mut a = Dealer::new(42);
        let mut b = Dealer::new(42);
        for _ in 0..20 {
            assert_eq!(a.deal(), b.deal());
        }
    }

    #[test]
    fn weighted_pool_draws_from_every_shape() {
        let mut dealer = Dealer::new(7);
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            seen.insert(dealer.draw());
        }
        assert_eq!(seen.len(), Shape::ALL.len());
    }

    #[test]
    fn restricted_pool_only_yields_its_shapes() {
        let mut dealer = Dealer::with_pool(3, vec![Shape::Square3]);
        assert!((0..50).all(|_| dealer.draw() == Shape::Square3));

        let mut fallback = Dealer::with_pool(3, Vec::new());
        assert_eq!(fallback.pool(), &[Shape::Single]);
        assert_eq!(fallback.draw(), Shape::Single);
    }
}
