use super::{water, water_co2};
use approx::assert_relative_eq;
use ndarray::*;
use saft_gamma::{EosError, SaftEos};
use saft_gamma_core::constants::RGAS;
use std::error::Error;

#[test]
fn test_invalid_input() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.5, 0.5]);
    for rho in [vec![f64::NAN], vec![], vec![100.0, -1.0], vec![f64::INFINITY]] {
        let err = eos
            .residual_helmholtz_energy(&rho[..], 300.0, &x)
            .unwrap_err();
        assert!(err.is_validation(), "{err}");
    }
    for x in [arr1(&[1.0]), arr1(&[1.2, -0.2]), arr1(&[f64::NAN, 1.0])] {
        let err = eos.helmholtz_energy(&[100.0][..], 300.0, &x).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }
    for t in [0.0, -300.0, f64::NAN] {
        let err = eos.helmholtz_energy(&[100.0][..], t, &x).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }
    Ok(())
}

#[test]
fn test_batch_length() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let rho = arr1(&[1.0, 10.0, 100.0, 1000.0, 10000.0]);
    let x = arr1(&[0.4, 0.6]);
    let t = 350.0;
    assert_eq!(eos.residual_helmholtz_energy(&rho, t, &x)?.len(), rho.len());
    assert_eq!(eos.ideal_helmholtz_energy(&rho, t, &x)?.len(), rho.len());
    assert_eq!(eos.association_helmholtz_energy(&rho, t, &x)?.len(), rho.len());
    assert_eq!(eos.pressure(&rho, t, &x, 1e-3)?.len(), rho.len());
    assert_eq!(eos.site_fractions(&rho, t, &x)?.xika.nrows(), rho.len());

    let a = eos.helmholtz_energy(&rho, t, &x)?;
    let a_ideal = eos.ideal_helmholtz_energy(&rho, t, &x)?;
    let a_res = eos.residual_helmholtz_energy(&rho, t, &x)?;
    assert_relative_eq!(a, a_ideal + a_res, max_relative = 1e-14);
    Ok(())
}

#[test]
fn test_vanishing_density() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.5, 0.5]);
    let a_res = eos.residual_helmholtz_energy(&[0.0, 100.0][..], 300.0, &x)?;
    assert_eq!(a_res[0], 0.0);
    assert!(a_res[1] != 0.0);
    Ok(())
}

#[test]
fn test_pressure_ideal_gas_limit() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.0, 1.0]);
    let t = 300.0;
    let rho = arr1(&[1.0, 10.0, 1000.0]);
    let p = eos.pressure(&rho, t, &x, 1e-4)?;
    let z = &p / (&rho * RGAS * t);
    assert_relative_eq!(z[0], 1.0, max_relative = 1e-3);
    // only repulsive contributions
    assert!(z[0] > 1.0);
    assert!(z[1] > z[0]);
    assert!(z[2] > z[1]);
    Ok(())
}

#[test]
fn test_pressure_step_size() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.5, 0.5]);
    let err = eos.pressure(&[100.0][..], 300.0, &x, 0.0).unwrap_err();
    assert!(err.is_validation());
    let err = eos.pressure(&[1e-4, 100.0][..], 300.0, &x, 1e-3).unwrap_err();
    assert!(matches!(err, EosError::InvalidInput(_)));
    Ok(())
}

/// $\sum_i x_i\ln\varphi_i=a^\mathrm{res}+Z-1-\ln Z$
fn check_fugacity(
    eos: &SaftEos,
    density: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
    tol: f64,
) -> Result<(), Box<dyn Error>> {
    let rho = arr1(&[density]);
    let p = eos.pressure(&rho, temperature, molefracs, 1e-3)?[0];
    assert!(p > 0.0, "p={p}");
    let z = p / (density * RGAS * temperature);
    let a_res = eos.residual_helmholtz_energy(&rho, temperature, molefracs)?[0];
    let ln_phi = eos
        .fugacity_coefficient(p, density, molefracs, temperature, 1e-5, true)?
        .mapv(f64::ln);
    assert_relative_eq!(
        (&ln_phi * molefracs).sum(),
        a_res + z - 1.0 - z.ln(),
        epsilon = tol
    );
    Ok(())
}

#[test]
fn test_fugacity_non_associating() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.0, 1.0]);
    check_fugacity(&eos, 5000.0, 300.0, &x, 1e-7)?;
    check_fugacity(&eos, 15000.0, 300.0, &x, 1e-7)
}

#[test]
fn test_fugacity_associating() -> Result<(), Box<dyn Error>> {
    for density in [10.0, 100.0] {
        check_fugacity(&water()?, density, 600.0, &arr1(&[1.0]), 1e-4)?;
        check_fugacity(&water_co2()?, density, 600.0, &arr1(&[0.3, 0.7]), 1e-4)?;
    }
    Ok(())
}

#[test]
fn test_fugacity_negative_pressure() -> Result<(), Box<dyn Error>> {
    let eos = water()?;
    let x = arr1(&[1.0]);
    let (rho, t) = (2000.0, 350.0);
    let p = eos.pressure(&[rho][..], t, &x, 1e-3)?[0];
    assert!(p < 0.0, "p={p}");
    let phi = eos.fugacity_coefficient(p, rho, &x, t, 1e-5, true)?;
    assert_eq!(phi.len(), 1);
    assert!(phi.iter().all(|phi| phi.is_nan()));
    assert!(matches!(
        eos.fugacity_coefficient(0.0, rho, &x, t, 1e-5, true),
        Ok(phi) if phi[0].is_nan()
    ));
    assert!(matches!(
        eos.fugacity_coefficient(f64::NAN, rho, &x, t, 1e-5, true),
        Err(EosError::InvalidInput(_))
    ));
    assert!(eos.fugacity_coefficient(1e5, 0.0, &x, t, 1e-5, true).is_err());
    Ok(())
}

#[test]
fn test_fugacity_log_method() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.3, 0.7]);
    let (rho, t) = (2000.0, 350.0);
    let p = eos.pressure(&[rho][..], t, &x, 1e-3)?[0];
    let phi_log = eos.fugacity_coefficient(p, rho, &x, t, 1e-5, true)?;
    let phi_lin = eos.fugacity_coefficient(p, rho, &x, t, 1e-2, false)?;
    assert_relative_eq!(phi_log, phi_lin, max_relative = 1e-4);
    let phi_negative = eos.fugacity_coefficient(-p, rho, &x, t, 1e-5, true)?;
    assert!(phi_negative.iter().all(|phi| phi.is_nan()));
    Ok(())
}

#[test]
fn test_density_max() -> Result<(), Box<dyn Error>> {
    let eos = water_co2()?;
    let x = arr1(&[0.5, 0.5]);
    let rho_max = eos.density_max(&x, 300.0, 0.5)?;
    assert!(rho_max.is_finite() && rho_max > 0.0);
    assert_relative_eq!(
        eos.density_max(&x, 300.0, 0.25)?,
        0.5 * rho_max,
        max_relative = 1e-12
    );
    assert!(eos.density_max(&arr1(&[1.0]), 300.0, 0.5).is_err());
    Ok(())
}
