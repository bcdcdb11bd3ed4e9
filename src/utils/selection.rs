// src/utils/selection.rs: available/selected sample bookkeeping

use std::collections::{BTreeMap, BTreeSet};
use log::debug;

use crate::config::defs::PipelineError;
use crate::utils::sample::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Available,
    Selected,
}

/// Splits the samples of one directory scan into `available` and `selected`.
///
/// Every sample sits on exactly one side. Both sides stay sorted by name
/// after every move.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    universe: BTreeMap<String, Sample>,
    available: Vec<String>,
    selected: Vec<String>,
}

impl SelectionSet {
    /// Starts with every sample available. Later duplicates of a name are dropped.
    pub fn new(samples: Vec<Sample>) -> Self {
        let mut universe = BTreeMap::new();
        for sample in samples {
            universe.entry(sample.name().to_string()).or_insert(sample);
        }
        let available = universe.keys().cloned().collect();
        SelectionSet {
            universe,
            available,
            selected: Vec::new(),
        }
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn get(&self, name: &str) -> Option<&Sample> {
        self.universe.get(name)
    }

    pub fn len(&self) -> usize {
        self.universe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    pub fn move_to_selected<'a, I>(&mut self, ids: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.move_ids(ids, Side::Available)
    }

    pub fn move_to_available<'a, I>(&mut self, ids: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.move_ids(ids, Side::Selected)
    }

    /// Moves every sample in the universe to the selected side.
    pub fn select_all(&mut self) {
        self.selected = self.universe.keys().cloned().collect();
        self.available.clear();
    }

    /// Selected samples in name order, the order of the input manifest.
    pub fn snapshot_selected_ordered(&self) -> Vec<&Sample> {
        self.selected.iter().filter_map(|name| self.universe.get(name)).collect()
    }

    fn move_ids<'a, I>(&mut self, ids: I, from: Side) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: BTreeSet<&str> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(());
        }

        let (source, target) = match from {
            Side::Available => (&mut self.available, &mut self.selected),
            Side::Selected => (&mut self.selected, &mut self.available),
        };

        // Check every id before touching either side.
        if let Some(stray) = ids.iter().find(|id| !source.iter().any(|s| s.as_str() == **id)) {
            return Err(PipelineError::InvariantViolation(format!(
                "'{}' is not on the {} side",
                stray,
                if from == Side::Available { "available" } else { "selected" }
            )));
        }

        source.retain(|s| !ids.contains(s.as_str()));
        target.extend(ids.iter().map(|id| id.to_string()));
        source.sort();
        target.sort();
        debug!("Moved {} samples; {} available, {} selected", ids.len(), self.available.len(), self.selected.len());
        Ok(())
    }
}
