//! Goods categories and the category masks used throughout the engine.
//!
//! A **category** is one independently routed kind of cargo (passengers,
//! mail, or one of many freight types); connectivity, capacity, and
//! overcrowding are all tracked per category. Categories roll up into three
//! **cargo classes** — the super-categories a halt accepts or refuses as a
//! whole.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::MAX_GOODS_CATEGORIES;

/// Index of a goods category in the [`GoodsCatalog`].
pub type CatgIndex = u8;

// =============================================================================
// Cargo classes
// =============================================================================

/// The three cargo super-categories. Halts accept or refuse whole classes;
/// routing itself is always per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum CargoClass {
    Passengers,
    Mail,
    Freight,
}

impl CargoClass {
    pub fn mask(self) -> ClassMask {
        ClassMask(1 << self as u8)
    }
}

/// Bitmask over [`CargoClass`] values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode, Hash,
)]
pub struct ClassMask(pub u8);

impl ClassMask {
    pub const ALL: ClassMask = ClassMask(0b111);

    pub fn accepts(self, class: CargoClass) -> bool {
        self.0 & class.mask().0 != 0
    }

    pub fn with(self, class: CargoClass) -> Self {
        ClassMask(self.0 | class.mask().0)
    }
}

// =============================================================================
// Category masks
// =============================================================================

/// Fixed-size bitmask with one bit per goods category (256 bits). Used for
/// per-halt overcrowding flags, per-service category enablement, and the
/// debouncer's dirty bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct CategoryMask([u64; 4]);

impl CategoryMask {
    pub const EMPTY: CategoryMask = CategoryMask([0; 4]);

    pub fn single(catg: CatgIndex) -> Self {
        let mut mask = Self::EMPTY;
        mask.set(catg);
        mask
    }

    /// Mask with every category below `count` set.
    pub fn all_below(count: usize) -> Self {
        debug_assert!(count <= MAX_GOODS_CATEGORIES);
        let mut mask = Self::EMPTY;
        for catg in 0..count {
            mask.set(catg as CatgIndex);
        }
        mask
    }

    pub fn set(&mut self, catg: CatgIndex) {
        self.0[catg as usize / 64] |= 1 << (catg as usize % 64);
    }

    pub fn clear(&mut self, catg: CatgIndex) {
        self.0[catg as usize / 64] &= !(1 << (catg as usize % 64));
    }

    pub fn get(&self, catg: CatgIndex) -> bool {
        self.0[catg as usize / 64] & (1 << (catg as usize % 64)) != 0
    }

    pub fn union(&mut self, other: &CategoryMask) {
        for (word, other_word) in self.0.iter_mut().zip(other.0.iter()) {
            *word |= other_word;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }

    /// Iterate set category indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CatgIndex> + '_ {
        self.0.iter().enumerate().flat_map(|(word_idx, word)| {
            (0..64usize)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (word_idx * 64 + bit) as CatgIndex)
        })
    }
}

// =============================================================================
// Goods catalog
// =============================================================================

/// One registered goods category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct GoodsKind {
    pub name: String,
    pub class: CargoClass,
}

/// Ordered registry of goods categories for the running world. The position
/// in `kinds` is the category index used everywhere else; entries are never
/// removed or reordered once added (category indices must stay stable for
/// the lifetime of the session).
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct GoodsCatalog {
    kinds: Vec<GoodsKind>,
}

impl Default for GoodsCatalog {
    /// Every world carries passengers and mail; freight kinds are added by
    /// the loaded goods set.
    fn default() -> Self {
        Self {
            kinds: vec![
                GoodsKind {
                    name: "passengers".into(),
                    class: CargoClass::Passengers,
                },
                GoodsKind {
                    name: "mail".into(),
                    class: CargoClass::Mail,
                },
            ],
        }
    }
}

impl GoodsCatalog {
    pub const PASSENGERS: CatgIndex = 0;
    pub const MAIL: CatgIndex = 1;

    /// Register a new category. Returns its index.
    ///
    /// Panics when the catalog is full; the 256-category ceiling is a data
    /// contract, not a recoverable condition.
    pub fn add_kind(&mut self, name: impl Into<String>, class: CargoClass) -> CatgIndex {
        assert!(
            self.kinds.len() < MAX_GOODS_CATEGORIES,
            "goods catalog full ({MAX_GOODS_CATEGORIES} categories)"
        );
        self.kinds.push(GoodsKind {
            name: name.into(),
            class,
        });
        (self.kinds.len() - 1) as CatgIndex
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn class_of(&self, catg: CatgIndex) -> CargoClass {
        self.kinds[catg as usize].class
    }

    pub fn name_of(&self, catg: CatgIndex) -> &str {
        &self.kinds[catg as usize].name
    }

    /// Per-category cargo classes in index order, used when freezing a
    /// network snapshot.
    pub fn classes(&self) -> Vec<CargoClass> {
        self.kinds.iter().map(|kind| kind.class).collect()
    }
}
