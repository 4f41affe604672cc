use saft_gamma::{EosConfig, SaftEos};
use std::error::Error;

mod association;
mod parameters;
mod properties;

const WATER_CO2: &str = "tests/gamma_mie/water_co2.json";

fn water_co2() -> Result<SaftEos, Box<dyn Error>> {
    Ok(SaftEos::from_config(EosConfig::from_json(WATER_CO2)?)?)
}

/// Pure water, the first component of the binary mixture.
fn water() -> Result<SaftEos, Box<dyn Error>> {
    let mut config = EosConfig::from_json(WATER_CO2)?;
    config.beads.truncate(1);
    config.molecular_composition = vec![vec![1.0]];
    Ok(SaftEos::from_config(config)?)
}
