//! Generic implementation of the SAFT association contribution for
//! group contribution equations of state.
//!
//! The contribution is assembled in three steps. [initiate_assoc_matrices]
//! collects the association sites of every bead, [calc_assoc_matrices] builds
//! the association energies and bonding volumes of all pairs of sites and
//! [calc_xika] solves for the fraction of non-bonded sites at given state
//! points. The first two steps only depend on the parameter tables and are
//! repeated whenever a parameter changes.
use ndarray::{Array2, Array4, Array6};
use saft_gamma_core::constants::{ANGSTROM3, NAV};
use std::f64::consts::PI;

mod matrices;
mod solver;
pub use matrices::{
    calc_assoc_matrices, initiate_assoc_matrices, AssociationMatrices, AssociationMixingRules,
    AssociationSites, BondingModel, CombiningRule, BONDING_RADIUS, BONDING_VOLUME, EPSILON_HB,
    SITE_MULTIPLICITY, SITE_POSITION,
};
pub use solver::{
    assoc_site_indices, association_energy, calc_xika, AssociationSolverOptions, SiteBonding,
    SiteFractions, SiteIndex,
};

/// Molar bonding volume in m³/mol of two sites at distance `rd` from the
/// centers of two spheres with diameter `d`, that bond if they are closer
/// than `rc`. All lengths in Å.
///
/// Sites that cannot reach each other (`rc + 2 rd <= d`) do not bond.
pub fn bonding_volume_from_radius(rc: f64, rd: f64, d: f64) -> f64 {
    if rc <= 0.0 || rd <= 0.0 || d <= 0.0 || rc + 2.0 * rd <= d {
        return 0.0;
    }
    let k = 4.0 * PI * d * d / (72.0 * rd * rd)
        * (((rc + 2.0 * rd) / d).ln()
            * (6.0 * rc.powi(3) + 18.0 * rc * rc * rd - 24.0 * rd.powi(3))
            + (rc + 2.0 * rd - d)
                * (22.0 * rd * rd - 5.0 * rc * rd - 7.0 * rd * d - 8.0 * rc * rc
                    + rc * d
                    + d * d));
    k * ANGSTROM3 * NAV
}

/// Site positions used with bonding radii.
#[derive(Clone, Copy, Debug)]
pub enum RadiusReduction<'a> {
    /// Explicit positions `rd_klab` in Å.
    Explicit(&'a Array4<f64>),
    /// Positions as a fraction of the segment size `sigma_kl`.
    Ratio(f64),
}

/// Bonding volumes `Kijklab` from bonding radii.
///
/// `diameter[[i, j]]` are the hard-sphere diameters of the component pairs and
/// `sigma_kl` the segment sizes of the bead pairs, both in Å.
pub fn calc_kijklab_from_radius(
    diameter: &Array2<f64>,
    sigma_kl: &Array2<f64>,
    rc_klab: &Array4<f64>,
    reduction: RadiusReduction,
) -> Array6<f64> {
    let (nbeads, _, nsites, _) = rc_klab.dim();
    let ncomp = diameter.nrows();
    Array6::from_shape_fn(
        (ncomp, ncomp, nbeads, nbeads, nsites, nsites),
        |(i, j, k, l, a, b)| {
            let rc = rc_klab[[k, l, a, b]];
            let rd = match reduction {
                RadiusReduction::Explicit(rd) => rd[[k, l, a, b]],
                RadiusReduction::Ratio(ratio) => ratio * sigma_kl[[k, l]],
            };
            bonding_volume_from_radius(rc, rd, diameter[[i, j]])
        },
    )
}
