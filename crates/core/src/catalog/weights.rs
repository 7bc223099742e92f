//! Weighted choice tables and inclusive integer ranges shared by catalog entries.

use crate::error::CatalogError;
use crate::rng::GenRng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightTable<T> {
    entries: Vec<(T, u32)>,
    total: u64,
}

impl<T> Default for WeightTable<T> {
    fn default() -> Self {
        Self { entries: Vec::new(), total: 0 }
    }
}

impl<T> WeightTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero weights are dropped so they can never be sampled.
    pub fn push(&mut self, value: T, weight: u32) {
        if weight == 0 {
            return;
        }
        self.total += u64::from(weight);
        self.entries.push((value, weight));
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.entries.iter().map(|(value, weight)| (value, *weight))
    }

    pub fn sample(&self, rng: &mut GenRng) -> Option<&T> {
        if self.total == 0 {
            return None;
        }
        let mut roll = rng.range_usize(0, (self.total - 1) as usize) as u64;
        for (value, weight) in &self.entries {
            let weight = u64::from(*weight);
            if roll < weight {
                return Some(value);
            }
            roll -= weight;
        }
        None
    }

    pub(crate) fn require_non_empty(self, context: &str) -> Result<Self, CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::EmptyWeights { context: context.to_string() });
        }
        Ok(self)
    }
}

impl<T> FromIterator<(T, u32)> for WeightTable<T> {
    fn from_iter<I: IntoIterator<Item = (T, u32)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (value, weight) in iter {
            table.push(value, weight);
        }
        table
    }
}

/// Inclusive `[min, max]` range, written as a two-element array in catalog files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample(self, rng: &mut GenRng) -> u32 {
        rng.range_usize(self.min as usize, self.max as usize) as u32
    }

    pub(crate) fn validated(raw: [u32; 2], context: &str) -> Result<Self, CatalogError> {
        let [min, max] = raw;
        if min > max {
            return Err(CatalogError::InvalidRange { context: context.to_string(), min, max });
        }
        Ok(Self { min, max })
    }
}

pub(crate) fn validated_probability(value: f64, context: &str) -> Result<f64, CatalogError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CatalogError::InvalidProbability { context: context.to_string(), value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weight_entries_are_never_sampled() {
        let table: WeightTable<&str> = [("never", 0), ("always", 5)].into_iter().collect();
        let mut rng = GenRng::from_seed(1);
        for _ in 0..200 {
            assert_eq!(table.sample(&mut rng), Some(&"always"));
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_table_samples_nothing() {
        let table: WeightTable<u32> = WeightTable::new();
        let mut rng = GenRng::from_seed(1);
        assert!(table.sample(&mut rng).is_none());
        assert!(table.require_non_empty("doors").is_err());
    }

    #[test]
    fn heavier_entries_win_more_often() {
        let table: WeightTable<u8> = [(0, 1), (1, 9)].into_iter().collect();
        let mut rng = GenRng::from_seed(42);
        let heavy = (0..2_000).filter(|_| table.sample(&mut rng) == Some(&1)).count();
        assert!(heavy > 1_600, "expected ~90% heavy picks, got {heavy}");
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(IntRange::validated([5, 2], "terrain.width").is_err());
        assert_eq!(IntRange::validated([2, 5], "terrain.width").ok(), Some(IntRange::new(2, 5)));
    }
}
