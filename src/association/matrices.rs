use indexmap::IndexSet;
use itertools::iproduct;
use ndarray::{Array2, Array4};
use saft_gamma_core::parameter::{BeadLibrary, CrossLibrary, ParameterError, ParameterName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base name of the site multiplicities, e.g. `Nk-H`.
pub const SITE_MULTIPLICITY: &str = "Nk";
/// Base name of the association energies in K, e.g. `epsilonHB-H-e1`.
pub const EPSILON_HB: &str = "epsilonHB";
/// Base name of the bonding volumes in m³/mol, e.g. `K-H-e1`.
pub const BONDING_VOLUME: &str = "K";
/// Base name of the bonding radii in Å, e.g. `rc-H-e1`.
pub const BONDING_RADIUS: &str = "rc";
/// Base name of the site positions in Å, e.g. `rd-H-e1`.
pub const SITE_POSITION: &str = "rd";

const SITE_PAIR_PARAMETERS: [&str; 4] = [EPSILON_HB, BONDING_VOLUME, BONDING_RADIUS, SITE_POSITION];

/// Rule to estimate a missing cross interaction from the two self interactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombiningRule {
    /// $\sqrt{p_kp_l}$
    Geometric,
    /// $\frac{p_k+p_l}{2}$
    Arithmetic,
    /// $\left(\frac{p_k^{1/3}+p_l^{1/3}}{2}\right)^3$
    CubeRootArithmetic,
    /// Cross interactions are inactive unless given explicitly.
    Zero,
}

impl CombiningRule {
    pub fn combine(&self, p_k: f64, p_l: f64) -> f64 {
        match self {
            Self::Geometric => (p_k * p_l).sqrt(),
            Self::Arithmetic => 0.5 * (p_k + p_l),
            Self::CubeRootArithmetic => (0.5 * (p_k.cbrt() + p_l.cbrt())).powi(3),
            Self::Zero => 0.0,
        }
    }
}

impl fmt::Display for CombiningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometric => write!(f, "geometric"),
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::CubeRootArithmetic => write!(f, "cube root arithmetic"),
            Self::Zero => write!(f, "zero"),
        }
    }
}

/// Combining rules for the association parameters of unlike bead pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationMixingRules {
    pub epsilon_hb: CombiningRule,
    pub bonding_volume: CombiningRule,
    pub bonding_radius: CombiningRule,
}

impl Default for AssociationMixingRules {
    fn default() -> Self {
        Self {
            epsilon_hb: CombiningRule::Geometric,
            bonding_volume: CombiningRule::CubeRootArithmetic,
            bonding_radius: CombiningRule::Arithmetic,
        }
    }
}

/// Registry of the association sites of all beads.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationSites {
    /// Distinct site names in order of appearance.
    pub sitenames: Vec<String>,
    /// Number of sites `nk[bead, site]`.
    pub nk: Array2<f64>,
    /// `true` if any bead carries association sites. Only provisional: the
    /// association contribution is active only if an association energy is
    /// nonzero as well.
    pub flag_assoc: bool,
}

impl AssociationSites {
    pub fn site_index(&self, site: &str) -> Option<usize> {
        self.sitenames.iter().position(|s| s == site)
    }
}

/// Bonding volumes, either tabulated or from the geometry of the sites.
#[derive(Clone, Debug, PartialEq)]
pub enum BondingModel {
    /// `Kklab[bead_k, bead_l, site_a, site_b]` in m³/mol.
    Volume(Array4<f64>),
    /// Bonding radii `rc_klab` and optional site positions `rd_klab` in Å.
    /// The variant calculates the bonding volumes from the temperature
    /// dependent segment diameters.
    Radius {
        rc_klab: Array4<f64>,
        rd_klab: Option<Array4<f64>>,
    },
}

/// Association energies and bonding parameters of every pair of (bead, site).
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationMatrices {
    /// `epsilonHB[bead_k, bead_l, site_a, site_b]` in K.
    pub epsilon_hb: Array4<f64>,
    pub bonding: BondingModel,
}

impl AssociationMatrices {
    /// `true` if any pair of sites has a nonzero association energy.
    pub fn is_active(&self) -> bool {
        self.epsilon_hb.iter().any(|&e| e != 0.0)
    }
}

/// Collect the association sites of all beads and count them.
///
/// Site names are taken from the multiplicity keys (`Nk-<site>`) of the bead
/// library. Every site pair parameter has to refer to sites that have a
/// multiplicity on some bead.
pub fn initiate_assoc_matrices(
    beads: &[String],
    bead_library: &BeadLibrary,
    molecular_composition: &Array2<f64>,
) -> Result<AssociationSites, ParameterError> {
    if molecular_composition.ncols() != beads.len() {
        return Err(ParameterError::IncompatibleParameters(format!(
            "the molecular composition has {} bead columns, but {} beads were given",
            molecular_composition.ncols(),
            beads.len()
        )));
    }

    let mut sitenames = IndexSet::new();
    let mut multiplicities = Vec::with_capacity(beads.len());
    for bead in beads {
        let record = bead_library
            .get(bead)
            .ok_or_else(|| ParameterError::ComponentsNotFound(bead.clone()))?;
        let mut counts = Vec::new();
        for (key, &value) in record.iter() {
            let name = ParameterName::parse(key);
            if name.base != SITE_MULTIPLICITY {
                continue;
            }
            let [site] = name.sites.as_slice() else {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "association site multiplicities have to name exactly one site (e.g. `Nk-H`), got `{key}` for bead `{bead}`"
                )));
            };
            if value < 0.0 {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "`{key}` of bead `{bead}` is negative"
                )));
            }
            let (a, _) = sitenames.insert_full(site.clone());
            counts.push((a, value));
        }
        multiplicities.push(counts);
    }

    let mut nk = Array2::zeros((beads.len(), sitenames.len()));
    for (k, counts) in multiplicities.into_iter().enumerate() {
        for (a, n) in counts {
            nk[[k, a]] = n;
        }
    }

    let sites = AssociationSites {
        flag_assoc: nk.iter().any(|&n| n > 0.0),
        sitenames: sitenames.into_iter().collect(),
        nk,
    };

    for bead in beads {
        for key in bead_library[bead.as_str()].keys() {
            check_site_pair_key(key, bead, &sites)?;
        }
    }
    Ok(sites)
}

fn check_site_pair_key(key: &str, owner: &str, sites: &AssociationSites) -> Result<(), ParameterError> {
    let name = ParameterName::parse(key);
    if !SITE_PAIR_PARAMETERS.contains(&name.base.as_str()) {
        return Ok(());
    }
    if name.sites.len() != 2 {
        return Err(ParameterError::IncompatibleParameters(format!(
            "`{key}` of `{owner}` has to name two association sites (e.g. `{}-H-e1`)",
            name.base
        )));
    }
    if let Some(site) = name.sites.iter().find(|s| sites.site_index(s).is_none()) {
        return Err(ParameterError::IncompatibleParameters(format!(
            "`{key}` of `{owner}` refers to site `{site}` which has no multiplicity (`{SITE_MULTIPLICITY}-{site}`)"
        )));
    }
    Ok(())
}

/// Build the association energy and bonding tensors of all (bead, site) pairs.
///
/// Self interactions are taken from `bead_library`, cross interactions from
/// `cross_library`. Missing cross interactions are estimated from the two
/// self interactions of the same site pair with the `mixing_rules`, if both
/// are nonzero. Parameters that are not set are zero. The result depends only
/// on the arguments, so repeated calls with the same tables are identical.
pub fn calc_assoc_matrices(
    beads: &[String],
    bead_library: &BeadLibrary,
    molecular_composition: &Array2<f64>,
    sites: &AssociationSites,
    cross_library: &CrossLibrary,
    mixing_rules: &AssociationMixingRules,
) -> Result<AssociationMatrices, ParameterError> {
    let nbeads = beads.len();
    if molecular_composition.ncols() != nbeads {
        return Err(ParameterError::IncompatibleParameters(format!(
            "the molecular composition has {} bead columns, but {} beads were given",
            molecular_composition.ncols(),
            nbeads
        )));
    }
    if sites.nk.dim() != (nbeads, sites.sitenames.len()) {
        return Err(ParameterError::IncompatibleParameters(format!(
            "site multiplicities have shape {:?}, expected {:?}",
            sites.nk.dim(),
            (nbeads, sites.sitenames.len())
        )));
    }
    for bead in beads {
        if !bead_library.contains_key(bead.as_str()) {
            return Err(ParameterError::ComponentsNotFound(bead.clone()));
        }
    }
    // cross records between pairs of the selected beads
    let cross_records: Vec<_> = cross_library
        .iter()
        .filter(|(bead1, bead2, _)| {
            beads.iter().any(|b| b == bead1) && beads.iter().any(|b| b == bead2)
        })
        .collect();
    for (bead1, bead2, record) in &cross_records {
        let owner = format!("{bead1}/{bead2}");
        for key in record.keys() {
            check_site_pair_key(key, &owner, sites)?;
        }
    }

    let has_key = |base: &str| {
        let in_beads = beads.iter().any(|b| {
            bead_library[b.as_str()]
                .keys()
                .any(|k| ParameterName::parse(k).base == base)
        });
        let in_cross = cross_records
            .iter()
            .any(|(_, _, r)| r.keys().any(|k| ParameterName::parse(k).base == base));
        in_beads || in_cross
    };

    let builder = TensorBuilder {
        beads,
        bead_library,
        cross_library,
        sites,
    };
    let epsilon_hb = builder.build(EPSILON_HB, mixing_rules.epsilon_hb);
    let bonding = if has_key(BONDING_RADIUS) {
        if has_key(BONDING_VOLUME) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "bonding volumes (`{BONDING_VOLUME}`) and bonding radii (`{BONDING_RADIUS}`) cannot be combined"
            )));
        }
        BondingModel::Radius {
            rc_klab: builder.build(BONDING_RADIUS, mixing_rules.bonding_radius),
            rd_klab: has_key(SITE_POSITION)
                .then(|| builder.build(SITE_POSITION, mixing_rules.bonding_radius)),
        }
    } else {
        BondingModel::Volume(builder.build(BONDING_VOLUME, mixing_rules.bonding_volume))
    };

    Ok(AssociationMatrices {
        epsilon_hb,
        bonding,
    })
}

struct TensorBuilder<'a> {
    beads: &'a [String],
    bead_library: &'a BeadLibrary,
    cross_library: &'a CrossLibrary,
    sites: &'a AssociationSites,
}

impl TensorBuilder<'_> {
    fn build(&self, parameter: &str, rule: CombiningRule) -> Array4<f64> {
        let nbeads = self.beads.len();
        let nsites = self.sites.sitenames.len();
        let nk = &self.sites.nk;
        let names = &self.sites.sitenames;
        let mut tensor = Array4::zeros((nbeads, nbeads, nsites, nsites));

        for (k, a, b) in iproduct!(0..nbeads, 0..nsites, 0..nsites) {
            if nk[[k, a]] == 0.0 || nk[[k, b]] == 0.0 {
                continue;
            }
            let record = &self.bead_library[self.beads[k].as_str()];
            if let Some(value) = record.site_pair(parameter, &names[a], &names[b]) {
                tensor[[k, k, a, b]] = value;
                tensor[[k, k, b, a]] = value;
            }
        }

        for (k, l, a, b) in iproduct!(0..nbeads, 0..nbeads, 0..nsites, 0..nsites) {
            if k == l || nk[[k, a]] == 0.0 || nk[[l, b]] == 0.0 {
                continue;
            }
            let value = self
                .cross_library
                .site_pair(&self.beads[k], &self.beads[l], parameter, &names[a], &names[b])
                .unwrap_or_else(|| {
                    let (p_k, p_l) = (tensor[[k, k, a, b]], tensor[[l, l, a, b]]);
                    if p_k != 0.0 && p_l != 0.0 {
                        rule.combine(p_k, p_l)
                    } else {
                        0.0
                    }
                });
            tensor[[k, l, a, b]] = value;
            tensor[[l, k, b, a]] = value;
        }
        tensor
    }
}
