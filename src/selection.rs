//! Habitat/species selection state
//!
//! One machine per dashboard session:
//!
//! ```text
//! NoHabitat -> HabitatSelected -> SpeciesSelected -> Loaded
//! ```
//!
//! Dropdown changes only move the pending choice. The map subset changes
//! only on an explicit `load`, and a repeated load of the same pair hands
//! back the cached rows without touching the table.

use crate::data::{GeoRecord, GeoTable};
use std::sync::Arc;
use thiserror::Error;

pub const SELECT_HABITAT_HINT: &str = "Please select a habitat to begin.";
pub const SELECT_SPECIES_HINT: &str = "Please select a species.";
pub const NO_SPECIES_WARNING: &str = "No species found for the selected habitat and name.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please select both habitat and species before loading.")]
    MissingSelection,

    #[error("Species '{species}' is not recorded in habitat '{habitat}'")]
    UnknownSpecies { habitat: String, species: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    NoHabitat,
    HabitatSelected { habitat: String },
    SpeciesSelected { habitat: String, species: String },
    Loaded { habitat: String, species: String },
}

/// Rows of the last successful load, with the pair that produced them
#[derive(Debug, Clone)]
pub struct LoadedSubset {
    pub habitat: String,
    pub species: String,
    pub rows: Arc<Vec<GeoRecord>>,
}

impl LoadedSubset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of a successful `load`
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub rows: Arc<Vec<GeoRecord>>,
    /// False when the cached subset was reused
    pub recomputed: bool,
}

impl LoadOutcome {
    /// Warning to show for a valid pair with no rows
    pub fn warning(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(NO_SPECIES_WARNING)
    }
}

#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: SelectionState,
    habitat: Option<String>,
    species: Option<String>,
    species_options: Vec<String>,
    loaded: Option<LoadedSubset>,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn habitat(&self) -> Option<&str> {
        self.habitat.as_deref()
    }

    pub fn species(&self) -> Option<&str> {
        self.species.as_deref()
    }

    /// Species dropdown options for the current habitat
    pub fn species_options(&self) -> &[String] {
        &self.species_options
    }

    pub fn loaded(&self) -> Option<&LoadedSubset> {
        self.loaded.as_ref()
    }

    /// Sidebar hint for an incomplete choice
    pub fn hint(&self) -> Option<&'static str> {
        match (&self.habitat, &self.species) {
            (None, _) => Some(SELECT_HABITAT_HINT),
            (Some(_), None) => Some(SELECT_SPECIES_HINT),
            _ => None,
        }
    }

    /// Pick a habitat; an empty value clears the choice.
    ///
    /// Any pending species is cleared and the options recomputed. A loaded
    /// subset stays displayed.
    pub fn select_habitat(&mut self, habitat: &str, geo: &GeoTable) -> &[String] {
        let habitat = habitat.trim();
        self.species = None;

        if habitat.is_empty() {
            self.habitat = None;
            self.species_options.clear();
        } else {
            self.habitat = Some(habitat.to_string());
            self.species_options = geo.species_for_habitat(habitat);
        }

        self.sync_state();
        &self.species_options
    }

    /// Pick a species from the current options; an empty value clears it.
    pub fn select_species(&mut self, species: &str) -> Result<(), SelectionError> {
        let species = species.trim();
        let Some(habitat) = self.habitat.clone() else {
            return Err(SelectionError::MissingSelection);
        };

        if species.is_empty() {
            self.species = None;
        } else if self.species_options.iter().any(|s| s == species) {
            self.species = Some(species.to_string());
        } else {
            return Err(SelectionError::UnknownSpecies {
                habitat,
                species: species.to_string(),
            });
        }

        self.sync_state();
        Ok(())
    }

    /// Load the rows for the chosen pair.
    ///
    /// # Errors
    /// `MissingSelection` when habitat or species is unset; the cached
    /// subset is cleared in that case.
    pub fn load(&mut self, geo: &GeoTable) -> Result<LoadOutcome, SelectionError> {
        let (Some(habitat), Some(species)) = (self.habitat.clone(), self.species.clone()) else {
            self.loaded = None;
            self.sync_state();
            return Err(SelectionError::MissingSelection);
        };

        if let Some(cached) = &self.loaded {
            if cached.habitat == habitat && cached.species == species {
                tracing::debug!("Reusing loaded subset for ({}, {})", habitat, species);
                let rows = cached.rows.clone();
                self.sync_state();
                return Ok(LoadOutcome {
                    rows,
                    recomputed: false,
                });
            }
        }

        let rows = Arc::new(geo.matching(&habitat, &species));
        tracing::debug!("Loaded {} range rows for ({}, {})", rows.len(), habitat, species);

        self.loaded = Some(LoadedSubset {
            habitat,
            species,
            rows: rows.clone(),
        });
        self.sync_state();

        Ok(LoadOutcome {
            rows,
            recomputed: true,
        })
    }

    fn sync_state(&mut self) {
        let pending = (self.habitat.clone(), self.species.clone());
        self.state = match (&self.loaded, pending) {
            (Some(loaded), (Some(habitat), Some(species)))
                if loaded.habitat == habitat && loaded.species == species =>
            {
                SelectionState::Loaded { habitat, species }
            }
            (_, (Some(habitat), Some(species))) => SelectionState::SpeciesSelected { habitat, species },
            (_, (Some(habitat), None)) => SelectionState::HabitatSelected { habitat },
            (_, (None, _)) => SelectionState::NoHabitat,
        };
    }
}
