use super::{water, water_co2, WATER_CO2};
use approx::assert_relative_eq;
use ndarray::*;
use saft_gamma::association::BondingModel;
use saft_gamma::{EosConfig, EosError, SaftEos};
use saft_gamma_core::constants::{ANGSTROM3, NAV};
use saft_gamma_core::parameter::ParameterError;
use std::error::Error;

#[test]
fn test_from_json() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    assert_eq!(eos.components(), 2);
    assert_eq!(eos.beads(), &["H2O", "CO2"]);
    assert_eq!(eos.sitenames(), &["H", "e1"]);
    assert!(eos.flag_assoc());
    assert_eq!(eos.options().association.max_iter, 1000);
    assert_eq!(eos.options().association.damping, 0.5);
    assert_relative_eq!(
        eos.masses().clone(),
        arr1(&[0.018015, 0.04401]),
        max_relative = 1e-14
    );
    assert!(eos.to_string().starts_with("SaftEos(SAFT-γ Mie"));
    assert!(EosConfig::from_json("tests/gamma_mie/missing.json").is_err());
    Ok(())
}

#[test]
fn test_other_variant() -> Result<(), Box<dyn Error>> {
    let tables = EosConfig::from_json(WATER_CO2)?.parameter_tables()?;
    let eos = SaftEos::new("gamma_sw", tables.clone())?;
    assert_eq!(eos.variant().name(), "gamma_sw");
    let a = eos.residual_helmholtz_energy(&[100.0, 1000.0][..], 300.0, &arr1(&[0.5, 0.5]))?;
    assert!(a.iter().all(|a| a.is_finite()));
    assert!(matches!(
        SaftEos::new("pc_saft", tables),
        Err(EosError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_stale_parameters() -> Result<(), Box<dyn Error>> {
    let mut eos = water()?;
    let x = arr1(&[1.0]);
    let rho = arr1(&[1000.0, 20000.0]);
    let a = eos.residual_helmholtz_energy(&rho, 300.0, &x)?;

    eos.update_parameter("sigma", &["H2O"], 3.1)?;
    assert!(matches!(
        eos.residual_helmholtz_energy(&rho, 300.0, &x),
        Err(EosError::StaleParameters {
            current: 1,
            refreshed: 0
        })
    ));
    assert!(matches!(
        eos.density_max(&x, 300.0, 0.5),
        Err(EosError::StaleParameters { .. })
    ));

    eos.parameter_refresh()?;
    let a_new = eos.residual_helmholtz_energy(&rho, 300.0, &x)?;
    assert!((&a_new - &a).iter().all(|da| da.abs() > 1e-8));
    Ok(())
}

#[test]
fn test_association_refresh() -> Result<(), Box<dyn Error>> {
    let mut eos = water()?;
    let x = arr1(&[1.0]);
    let rho = arr1(&[1000.0]);
    let a_assoc = eos.association_helmholtz_energy(&rho, 300.0, &x)?;
    assert!(a_assoc[0] < 0.0);

    eos.update_parameter("epsilonHB-H-e1", &["H2O"], 0.0)?;
    eos.parameter_refresh()?;
    assert!(!eos.flag_assoc());
    assert_eq!(eos.association_helmholtz_energy(&rho, 300.0, &x)?[0], 0.0);

    eos.update_parameter("epsilonHB-H-e1", &["H2O"], 1800.0)?;
    eos.parameter_refresh()?;
    assert!(eos.flag_assoc());
    let a_weaker = eos.association_helmholtz_energy(&rho, 300.0, &x)?;
    assert!(a_weaker[0] < 0.0 && a_weaker[0] > a_assoc[0]);
    Ok(())
}

#[test]
fn test_invalid_updates() -> Result<(), Box<dyn Error>> {
    let mut eos = water_co2()?;
    assert!(matches!(
        eos.update_parameter("lambda", &["H2O"], 1.5),
        Err(EosError::ParameterError(ParameterError::UnknownParameter(_)))
    ));
    assert!(matches!(
        eos.update_parameter("Nk-H", &["H2O"], 1.0),
        Err(EosError::ParameterError(ParameterError::UnknownParameter(_)))
    ));
    assert!(matches!(
        eos.update_parameter("epsilonHB-H", &["H2O"], 1500.0),
        Err(EosError::ParameterError(ParameterError::IncompatibleParameters(_)))
    ));
    assert!(matches!(
        eos.update_parameter("epsilonHB-H-e2", &["H2O"], 1500.0),
        Err(EosError::ParameterError(ParameterError::IncompatibleParameters(_)))
    ));
    assert!(matches!(
        eos.update_parameter("sigma", &["CH3"], 3.0),
        Err(EosError::ParameterError(ParameterError::ComponentsNotFound(_)))
    ));
    // nothing was changed
    assert_eq!(eos.parameter_tables().generation(), 0);
    Ok(())
}

#[test]
fn test_update_parameters() -> Result<(), Box<dyn Error>> {
    let mut eos = water_co2()?;
    eos.update_parameters("H2O", &["sigma", "epsilon_CO2"], &[3.01, 250.0])?;
    let tables = eos.parameter_tables();
    assert_eq!(tables.parameter("sigma", &["H2O"]), Some(3.01));
    assert_eq!(tables.parameter("epsilon", &["CO2", "H2O"]), Some(250.0));
    assert_eq!(tables.generation(), 2);
    // refreshed
    eos.residual_helmholtz_energy(&[100.0][..], 300.0, &arr1(&[0.5, 0.5]))?;

    assert!(eos
        .update_parameters("H2O", &["epsilon_CO2_H2O"], &[250.0])
        .is_err());
    assert!(matches!(
        eos.update_parameters("H2O", &["sigma"], &[3.0, 3.1]),
        Err(EosError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn test_update_parameters_is_atomic() -> Result<(), Box<dyn Error>> {
    let mut eos = water_co2()?;
    let x = arr1(&[0.5, 0.5]);
    let a = eos.residual_helmholtz_energy(&[100.0][..], 300.0, &x)?;
    for (names, error) in [
        (["sigma", "lambda"], "unknown"),
        (["sigma", "epsilon_CH3"], "bead"),
        (["sigma", "epsilonHB-H-e2"], "site"),
    ] {
        let res = eos.update_parameters("H2O", &names, &[3.01, 1.0]);
        assert!(res.is_err(), "{error}");
        assert_eq!(eos.parameter_tables().generation(), 0);
        assert_eq!(eos.parameter_tables().parameter("sigma", &["H2O"]), Some(3.0063));
    }
    assert!(matches!(
        eos.update_parameters("H2O", &["sigma", "lambda"], &[3.01, 1.0]),
        Err(EosError::ParameterError(ParameterError::UnknownParameter(_)))
    ));
    assert!(matches!(
        eos.update_parameters("H2O", &["sigma", "epsilon_CH3"], &[3.01, 1.0]),
        Err(EosError::ParameterError(ParameterError::ComponentsNotFound(_)))
    ));
    // still fresh
    assert_eq!(eos.residual_helmholtz_energy(&[100.0][..], 300.0, &x)?, a);
    Ok(())
}

#[test]
fn test_unrelated_cross_interactions() -> Result<(), Box<dyn Error>> {
    let mut config = EosConfig::from_json(WATER_CO2)?;
    config.cross_library.set("CH3OH", "NH3", "rc-H-e1", 2.0);
    config.cross_library.set("NH3", "H2O", "epsilonHB-H-e3", 900.0);
    let eos = SaftEos::from_config(config)?;
    assert!(matches!(
        eos.association_matrices().bonding,
        BondingModel::Volume(_)
    ));
    let x = arr1(&[0.3, 0.7]);
    let rho = arr1(&[1000.0]);
    assert_eq!(
        eos.association_helmholtz_energy(&rho, 300.0, &x)?,
        water_co2()?.association_helmholtz_energy(&rho, 300.0, &x)?
    );
    Ok(())
}

#[test]
fn test_guess_and_bounds() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    assert_eq!(eos.guess_parameters("sigma", &["H2O"])?, 3.0063);
    assert_eq!(eos.guess_parameters("epsilon", &["CO2", "H2O"])?, 226.38);
    assert_eq!(eos.guess_parameters("epsilonHB-H-e1", &["CO2"])?, 2550.0);
    assert!(eos.guess_parameters("lambda", &["CO2"]).is_err());

    assert_eq!(eos.check_bounds("sigma", None)?, [2.0, 9.0]);
    assert_eq!(eos.check_bounds("sigma", Some([1.0, 5.0]))?, [2.0, 5.0]);
    assert_eq!(eos.check_bounds("lambdar", Some([10.0, 20.0]))?, [10.0, 20.0]);
    let [lo, hi] = eos.check_bounds("K-H-e1", None)?;
    assert_relative_eq!(lo, 0.1 * ANGSTROM3 * NAV, max_relative = 1e-14);
    assert_relative_eq!(hi, 1e4 * ANGSTROM3 * NAV, max_relative = 1e-14);
    assert!(matches!(
        eos.check_bounds("sigma", Some([5.0, 3.0])),
        Err(EosError::InvalidInput(_))
    ));
    assert!(eos.check_bounds("mass", None).is_err());
    Ok(())
}
