use super::{water, WATER_CO2};
use approx::assert_relative_eq;
use ndarray::*;
use saft_gamma::association::{AssociationSolverOptions, BondingModel};
use saft_gamma::{EosConfig, EosError, SaftEos, SaftEosOptions};
use saft_gamma_core::parameter::BeadRecord;
use std::error::Error;

#[test]
fn test_site_fractions_water() -> Result<(), Box<dyn Error>> {
    let eos = water()?;
    let rho = arr1(&[10.0, 1000.0, 50000.0]);
    let fractions = eos.site_fractions(&rho, 300.0, &arr1(&[1.0]))?;
    assert_eq!(fractions.xika.dim(), (3, 2));
    for row in fractions.xika.rows() {
        assert!(row.iter().all(|&x| x > 0.0 && x <= 1.0));
        // equal number of donor and acceptor sites
        assert_relative_eq!(row[0], row[1], max_relative = 1e-10);
    }
    assert!(fractions.xika[[0, 0]] > fractions.xika[[1, 0]]);
    assert!(fractions.xika[[1, 0]] > fractions.xika[[2, 0]]);

    let a = eos.association_helmholtz_energy(&rho, 300.0, &arr1(&[1.0]))?;
    let x = fractions.xika.column(0);
    let expected = x.mapv(|x| 4.0 * (x.ln() - 0.5 * x + 0.5));
    assert_relative_eq!(a, expected, max_relative = 1e-9);
    Ok(())
}

#[test]
fn test_absent_component() -> Result<(), Box<dyn Error>> {
    let eos = super::water_co2()?;
    let rho = arr1(&[100.0, 1000.0]);
    let fractions = eos.site_fractions(&rho, 300.0, &arr1(&[0.0, 1.0]))?;
    assert_eq!(fractions.xika.dim(), (2, 0));
    let a = eos.association_helmholtz_energy(&rho, 300.0, &arr1(&[0.0, 1.0]))?;
    assert_eq!(a, arr1(&[0.0, 0.0]));
    Ok(())
}

#[test]
fn test_not_converged() -> Result<(), Box<dyn Error>> {
    let mut config = EosConfig::from_json(WATER_CO2)?;
    config.options.association = AssociationSolverOptions {
        max_iter: 3,
        ..Default::default()
    };
    let eos = SaftEos::from_config(config)?;
    let err = eos
        .residual_helmholtz_energy(&[30000.0][..], 300.0, &arr1(&[1.0, 0.0]))
        .unwrap_err();
    assert!(matches!(err, EosError::NotConverged { iterations: 3, .. }));
    assert!(!err.is_validation());
    Ok(())
}

#[test]
fn test_damping() -> Result<(), Box<dyn Error>> {
    let tables = EosConfig::from_json(WATER_CO2)?.parameter_tables()?;
    let rho = arr1(&[100.0]);
    let x = arr1(&[1.0, 0.0]);
    let mut options = SaftEosOptions::default();
    let damped = SaftEos::with_options("gamma_mie", tables.clone(), options)?
        .site_fractions(&rho, 300.0, &x)?;
    options.association.damping = 1.0;
    let plain = SaftEos::with_options("gamma_mie", tables.clone(), options)?
        .site_fractions(&rho, 300.0, &x)?;
    assert_relative_eq!(damped.xika, plain.xika, max_relative = 1e-10);

    options.association.damping = 1.5;
    let eos = SaftEos::with_options("gamma_mie", tables, options)?;
    assert!(matches!(
        eos.site_fractions(&rho, 300.0, &x),
        Err(EosError::Configuration(_))
    ));
    Ok(())
}

/// Pure water with a bonding radius `rc` and optionally a site position `rd`
/// instead of a bonding volume.
fn water_radius(keep_volume: bool, rd: Option<f64>) -> Result<SaftEos, Box<dyn Error>> {
    let mut config = EosConfig::from_json(WATER_CO2)?;
    config.beads.truncate(1);
    config.molecular_composition = vec![vec![1.0]];
    let water = &config.bead_library["H2O"];
    let mut record = BeadRecord::new(
        water
            .iter()
            .filter(|(key, _)| keep_volume || !key.starts_with("K-"))
            .map(|(key, &value)| (key.clone(), value)),
    );
    record.set("rc-H-e1", 2.1);
    if let Some(rd) = rd {
        record.set("rd-H-e1", rd);
    }
    config.bead_library.insert("H2O".into(), record);
    Ok(SaftEos::from_config(config)?)
}

#[test]
fn test_bonding_radius() -> Result<(), Box<dyn Error>> {
    assert!(water_radius(true, None).is_err());

    let ratio = water_radius(false, None)?;
    assert!(matches!(
        ratio.association_matrices().bonding,
        BondingModel::Radius { rd_klab: None, .. }
    ));
    let explicit = water_radius(false, Some(0.6))?;
    assert!(matches!(
        explicit.association_matrices().bonding,
        BondingModel::Radius {
            rd_klab: Some(_),
            ..
        }
    ));

    let rho = arr1(&[1000.0, 30000.0]);
    let x = arr1(&[1.0]);
    for eos in [&ratio, &explicit] {
        let a = eos.association_helmholtz_energy(&rho, 300.0, &x)?;
        assert!(a.iter().all(|&a| a.is_finite() && a < 0.0));
        let xika = eos.site_fractions(&rho, 300.0, &x)?.xika;
        assert!(xika.iter().all(|&x| x > 0.0 && x < 1.0));
    }
    let a_ratio = ratio.association_helmholtz_energy(&rho, 300.0, &x)?;
    let a_explicit = explicit.association_helmholtz_energy(&rho, 300.0, &x)?;
    assert!((a_ratio - a_explicit).iter().all(|da| da.abs() > 1e-8));
    Ok(())
}
