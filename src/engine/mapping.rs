use std::collections::HashSet;

use crate::core::domain::VariableClass;
use crate::core::error::RunError;
use crate::engine::VariableView;

/// Storage slot for one flat evaluation-vector position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingEntry {
    pub class: VariableClass,
    /// Index within that class's storage array.
    pub position: usize,
}

/// Ordered table from flat evaluation-vector index to engine storage slot.
///
/// Built at most once per run; the entry at flat index `i` says where
/// variable `i` lives inside the engine's per-class arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMapping {
    entries: Vec<MappingEntry>,
}

impl VariableMapping {
    /// Builds from an explicit ordered slot list supplied at
    /// configuration time. Two flat indices may not share a slot.
    pub fn from_entries(entries: Vec<MappingEntry>) -> Result<Self, RunError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(*entry) {
                return Err(RunError::Configuration(format!(
                    "variable order lists {:?} position {} twice",
                    entry.class, entry.position
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Builds from per-class label sets, the compatibility path.
    ///
    /// Each label has the form `x<index>` where the suffix is the
    /// destination flat index. The destinations must cover 0..N exactly:
    /// an out-of-range, duplicate or unparsable destination is a fatal
    /// configuration error.
    pub fn from_labels(vars: &VariableView<'_>) -> Result<Self, RunError> {
        let total = vars.continuous_labels.len()
            + vars.discrete_int_labels.len()
            + vars.discrete_real_labels.len();
        let mut slots: Vec<Option<MappingEntry>> = vec![None; total];

        let classes = [
            (VariableClass::Continuous, vars.continuous_labels),
            (VariableClass::DiscreteInteger, vars.discrete_int_labels),
            (VariableClass::DiscreteReal, vars.discrete_real_labels),
        ];

        for (class, labels) in classes {
            for (position, label) in labels.iter().enumerate() {
                let index = parse_destination(label)?;
                if index >= total {
                    return Err(RunError::Configuration(format!(
                        "variable label `{}` points at index {} but only {} variables exist",
                        label, index, total
                    )));
                }
                if slots[index].is_some() {
                    return Err(RunError::Configuration(format!(
                        "variable label `{}` claims destination index {} twice",
                        label, index
                    )));
                }
                slots[index] = Some(MappingEntry { class, position });
            }
        }

        // Every flat index must come from exactly one label.
        let mut entries = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(entry) => entries.push(entry),
                None => {
                    return Err(RunError::Configuration(format!(
                        "no variable label maps destination index {}",
                        index
                    )))
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, flat_index: usize) -> Option<MappingEntry> {
        self.entries.get(flat_index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = MappingEntry> + '_ {
        self.entries.iter().copied()
    }
}

/// Parses the `x<index>` naming convention into a destination index.
fn parse_destination(label: &str) -> Result<usize, RunError> {
    label
        .strip_prefix('x')
        .and_then(|suffix| suffix.parse::<usize>().ok())
        .ok_or_else(|| {
            RunError::Configuration(format!(
                "variable label `{}` does not encode a destination index",
                label
            ))
        })
}
