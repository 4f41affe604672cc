use super::{ParameterError, ParameterName};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parameters of a single bead type or of a pair of bead types.
///
/// Any parameter that is absent is treated as zero (inactive) by consumers.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct BeadRecord {
    parameters: IndexMap<String, f64>,
}

impl BeadRecord {
    /// Creates a new `BeadRecord` from `(name, value)` pairs.
    pub fn new<S: Into<String>>(parameters: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Value of the parameter `name`, if set.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// Set the parameter `name` to `value`.
    pub fn set(&mut self, name: &str, value: f64) {
        self.parameters.insert(name.to_string(), value);
    }

    /// Molar mass of the bead in kg/mol.
    pub fn mass(&self) -> Option<f64> {
        self.get("mass")
    }

    /// Value of a site pair parameter (e.g. `epsilonHB-H-e1`) for a bead interacting with itself.
    ///
    /// The site order is irrelevant for self interactions, so `epsilonHB-e1-H` is accepted as well.
    pub fn site_pair(&self, parameter: &str, site1: &str, site2: &str) -> Option<f64> {
        self.get(&ParameterName::site_pair(parameter, site1, site2))
            .or_else(|| self.get(&ParameterName::site_pair(parameter, site2, site1)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.parameters.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.parameters.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl fmt::Display for BeadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeadRecord(")?;
        for (k, (name, value)) in self.parameters.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

/// Self interaction parameters of every bead type.
pub type BeadLibrary = IndexMap<String, BeadRecord>;

/// Read a bead library from a JSON file.
pub fn bead_library_from_json<P: AsRef<Path>>(file: P) -> Result<BeadLibrary, ParameterError> {
    from_json(file)
}

fn from_json<T: DeserializeOwned, P: AsRef<Path>>(file: P) -> Result<T, ParameterError> {
    Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
}

/// Sparse cross interaction parameters between pairs of bead types.
///
/// Entries are stored as `bead1 -> bead2 -> record`. Lookups are independent of
/// the order of the bead names. Site pair parameters are named with respect to
/// the stored order: `epsilonHB-H-e1` in the record of `(A, B)` describes site
/// `H` on `A` interacting with site `e1` on `B`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct CrossLibrary {
    records: IndexMap<String, IndexMap<String, BeadRecord>>,
}

impl CrossLibrary {
    /// Read a cross library from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Self, ParameterError> {
        from_json(file)
    }

    /// The record of the pair together with a flag that is `true` if it is
    /// stored in the order `(bead2, bead1)`.
    pub fn get(&self, bead1: &str, bead2: &str) -> Option<(&BeadRecord, bool)> {
        self.records
            .get(bead1)
            .and_then(|r| r.get(bead2))
            .map(|r| (r, false))
            .or_else(|| {
                self.records
                    .get(bead2)
                    .and_then(|r| r.get(bead1))
                    .map(|r| (r, true))
            })
    }

    /// Value of `parameter` for the pair, irrespective of the stored order.
    pub fn parameter(&self, bead1: &str, bead2: &str, parameter: &str) -> Option<f64> {
        let (record, swapped) = self.get(bead1, bead2)?;
        let name = if swapped {
            ParameterName::parse(parameter).reversed().to_string()
        } else {
            parameter.to_string()
        };
        record.get(&name)
    }

    /// Value of a site pair parameter for `site1` on `bead1` and `site2` on `bead2`.
    pub fn site_pair(
        &self,
        bead1: &str,
        bead2: &str,
        parameter: &str,
        site1: &str,
        site2: &str,
    ) -> Option<f64> {
        self.parameter(bead1, bead2, &ParameterName::site_pair(parameter, site1, site2))
    }

    /// Set `parameter` of the pair. An existing record stored in reverse order is updated in place.
    pub fn set(&mut self, bead1: &str, bead2: &str, parameter: &str, value: f64) {
        let reversed = !self
            .records
            .get(bead1)
            .is_some_and(|r| r.contains_key(bead2))
            && self
                .records
                .get(bead2)
                .is_some_and(|r| r.contains_key(bead1));
        if reversed {
            let name = ParameterName::parse(parameter).reversed().to_string();
            if let Some(record) = self.records.get_mut(bead2).and_then(|r| r.get_mut(bead1)) {
                record.set(&name, value);
            }
        } else {
            self.records
                .entry(bead1.to_string())
                .or_default()
                .entry(bead2.to_string())
                .or_default()
                .set(parameter, value);
        }
    }

    /// Iterate over all stored `(bead1, bead2, record)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &BeadRecord)> {
        self.records.iter().flat_map(|(b1, r)| {
            r.iter()
                .map(move |(b2, record)| (b1.as_str(), b2.as_str(), record))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.records.values().all(|r| r.is_empty())
    }
}
