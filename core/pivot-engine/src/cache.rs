//! FILENAME: core/pivot-engine/src/cache.rs
//! Axis Cache - value interning for one cross-tab axis.
//!
//! Each distinct display value is stored once and referenced by a ValueId
//! in first-seen order. Once grouping is done, `sorted_indices` turns the
//! ValueIds into the positional indices of the sorted header list.

use rustc_hash::FxHashMap;

/// A reference to an interned value within an axis cache.
pub type ValueId = u32;

#[derive(Debug, Clone, Default)]
pub struct AxisCache {
    /// Map from display value to its unique ID.
    value_to_id: FxHashMap<String, ValueId>,

    /// Unique values indexed by ValueId.
    id_to_value: Vec<String>,
}

impl AxisCache {
    pub fn new() -> Self {
        AxisCache::default()
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: String) -> ValueId {
        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    pub fn get_value(&self, id: ValueId) -> Option<&str> {
        self.id_to_value.get(id as usize).map(String::as_str)
    }

    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Sorts the interned values by their string form and returns, for each
    /// ValueId, its position in that order, plus the sorted values.
    pub fn sorted_indices(&self) -> (Vec<usize>, Vec<&str>) {
        let mut order: Vec<ValueId> = (0..self.id_to_value.len() as ValueId).collect();
        order.sort_by(|&a, &b| self.id_to_value[a as usize].cmp(&self.id_to_value[b as usize]));

        let mut index_of = vec![0usize; order.len()];
        let mut sorted = Vec::with_capacity(order.len());
        for (position, &id) in order.iter().enumerate() {
            index_of[id as usize] = position;
            sorted.push(self.id_to_value[id as usize].as_str());
        }
        (index_of, sorted)
    }
}
