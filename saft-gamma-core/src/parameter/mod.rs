//! Bead and cross interaction parameter tables of group contribution equations of state.
use ndarray::Array2;
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod bead;
pub use bead::{bead_library_from_json, BeadLibrary, BeadRecord, CrossLibrary};

/// Error type for incomplete parameter information and IO problems.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("The following bead(s) were not found: {0}")]
    ComponentsNotFound(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),
    #[error("Parameter `{parameter}` is missing for bead `{bead}`.")]
    MissingParameter { bead: String, parameter: String },
    #[error("Parameter `{0}` is not supported by this equation of state.")]
    UnknownParameter(String),
}

/// A parameter name split into its base name and association site names,
/// e.g. `epsilonHB-H-e1` or `Nk-H`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterName {
    pub base: String,
    pub sites: Vec<String>,
}

impl ParameterName {
    pub fn parse(name: &str) -> Self {
        let mut parts = name.split('-');
        let base = parts.next().unwrap_or_default().to_string();
        Self {
            base,
            sites: parts.map(String::from).collect(),
        }
    }

    /// Full name of a site pair parameter.
    pub fn site_pair(base: &str, site1: &str, site2: &str) -> String {
        format!("{base}-{site1}-{site2}")
    }

    /// The same parameter with the order of the sites reversed.
    pub fn reversed(mut self) -> Self {
        self.sites.reverse();
        self
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for site in &self.sites {
            write!(f, "-{site}")?;
        }
        Ok(())
    }
}

/// Bead and cross parameter tables together with the molecular composition.
///
/// The tables are the only mutable state of an equation of state. Every
/// mutation increments the generation counter, so that consumers can detect
/// derived quantities that were computed from an outdated state.
#[derive(Debug, Clone)]
pub struct ParameterTables {
    beads: Vec<String>,
    molecular_composition: Array2<f64>,
    bead_library: BeadLibrary,
    cross_library: CrossLibrary,
    generation: u64,
}

impl ParameterTables {
    /// Creates parameter tables for the `beads` used in the components.
    ///
    /// `molecular_composition` has one row per component and one column per
    /// bead and contains the number of each bead type in each component.
    pub fn new(
        beads: Vec<String>,
        molecular_composition: Array2<f64>,
        bead_library: BeadLibrary,
        cross_library: CrossLibrary,
    ) -> Result<Self, ParameterError> {
        if molecular_composition.ncols() != beads.len() {
            return Err(ParameterError::IncompatibleParameters(format!(
                "the molecular composition has {} bead columns, but {} beads were given",
                molecular_composition.ncols(),
                beads.len()
            )));
        }
        if molecular_composition.nrows() == 0 {
            return Err(ParameterError::IncompatibleParameters(
                "the molecular composition contains no components".into(),
            ));
        }
        if molecular_composition
            .iter()
            .any(|&n| n < 0.0 || !n.is_finite())
        {
            return Err(ParameterError::IncompatibleParameters(
                "bead counts in the molecular composition have to be non-negative".into(),
            ));
        }
        if let Some(i) = molecular_composition
            .rows()
            .into_iter()
            .position(|row| row.sum() == 0.0)
        {
            return Err(ParameterError::IncompatibleParameters(format!(
                "component {i} does not contain any beads"
            )));
        }
        for (k, bead) in beads.iter().enumerate() {
            if beads[..k].contains(bead) {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "bead `{bead}` was defined more than once"
                )));
            }
        }
        let missing: Vec<_> = beads
            .iter()
            .filter(|b| !bead_library.contains_key(b.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ParameterError::ComponentsNotFound(missing.join(", ")));
        }

        Ok(Self {
            beads,
            molecular_composition,
            bead_library,
            cross_library,
            generation: 0,
        })
    }

    /// Creates parameter tables from bead and cross libraries stored in JSON files.
    pub fn from_json<P: AsRef<Path>>(
        beads: &[&str],
        molecular_composition: Array2<f64>,
        file_beads: P,
        file_cross: Option<P>,
    ) -> Result<Self, ParameterError> {
        let bead_library = bead_library_from_json(file_beads)?;
        let cross_library = match file_cross {
            Some(file) => CrossLibrary::from_json(file)?,
            None => CrossLibrary::default(),
        };
        Self::new(
            beads.iter().map(|b| b.to_string()).collect(),
            molecular_composition,
            bead_library,
            cross_library,
        )
    }

    pub fn beads(&self) -> &[String] {
        &self.beads
    }

    pub fn components(&self) -> usize {
        self.molecular_composition.nrows()
    }

    pub fn molecular_composition(&self) -> &Array2<f64> {
        &self.molecular_composition
    }

    pub fn bead_library(&self) -> &BeadLibrary {
        &self.bead_library
    }

    pub fn cross_library(&self) -> &CrossLibrary {
        &self.cross_library
    }

    /// The number of mutations applied since construction.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Self interaction record of the `k`-th bead.
    pub fn bead_record(&self, k: usize) -> &BeadRecord {
        // presence of every bead is checked on construction
        &self.bead_library[self.beads[k].as_str()]
    }

    /// Required self interaction parameter of the `k`-th bead.
    pub fn bead_parameter(&self, k: usize, parameter: &str) -> Result<f64, ParameterError> {
        self.bead_record(k)
            .get(parameter)
            .ok_or_else(|| ParameterError::MissingParameter {
                bead: self.beads[k].clone(),
                parameter: parameter.to_string(),
            })
    }

    /// Molar masses of the components in kg/mol.
    pub fn component_masses(&self) -> Result<ndarray::Array1<f64>, ParameterError> {
        let masses = (0..self.beads.len())
            .map(|k| self.bead_parameter(k, "mass"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.molecular_composition.dot(&ndarray::Array1::from(masses)))
    }

    /// Current value of a self (one bead name) or cross (two bead names) parameter.
    pub fn parameter(&self, name: &str, bead_names: &[&str]) -> Option<f64> {
        match bead_names {
            [bead] => self.bead_library.get(*bead).and_then(|r| r.get(name)),
            [bead1, bead2] => self.cross_library.parameter(bead1, bead2, name),
            _ => None,
        }
    }

    /// Set a self (one bead name) or cross (two bead names) parameter.
    ///
    /// Derived quantities of an equation of state are not updated; they have
    /// to be refreshed before the next evaluation.
    pub fn update_parameter(
        &mut self,
        name: &str,
        bead_names: &[&str],
        value: f64,
    ) -> Result<(), ParameterError> {
        for bead in bead_names {
            if !self.beads.iter().any(|b| b == bead) {
                return Err(ParameterError::ComponentsNotFound(bead.to_string()));
            }
        }
        match bead_names {
            [bead] => {
                if let Some(record) = self.bead_library.get_mut(*bead) {
                    record.set(name, value);
                }
            }
            [bead1, bead2] => self.cross_library.set(bead1, bead2, name, value),
            _ => {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "parameter `{name}` has to be given for one or two beads, got {}",
                    bead_names.len()
                )))
            }
        }
        self.generation += 1;
        debug!(name, ?bead_names, value, generation = self.generation, "updated parameter");
        Ok(())
    }
}
