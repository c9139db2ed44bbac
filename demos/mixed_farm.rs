use windfarm_core::layout::*;
use windfarm_core::simulation::*;
use windfarm_core::site::*;
use windfarm_core::turbine::*;
use windfarm_core::types::*;

const CATALOG_JSON: &str = r#"[
    {
        "name": "GEN-8.0-167",
        "diameter": { "value": 167.0, "unit": "m" },
        "hub_height": { "value": 116.0, "unit": "m" },
        "power_unit": "kW",
        "wind_speeds": [3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 25.0],
        "power": [0.0, 212.0, 542.0, 1021.0, 1672.0, 2550.0, 3674.0, 5042.0, 6525.0, 7580.0, 8000.0, 8000.0, 8000.0],
        "thrust_coefficients": [0.0, 0.82, 0.8, 0.79, 0.79, 0.78, 0.76, 0.73, 0.65, 0.52, 0.41, 0.31, 0.05],
        "interpolation": "pchip"
    },
    {
        "name": "GEN-3.6-120",
        "diameter": { "value": 120.0, "unit": "m" },
        "hub_height": { "value": 90.0, "unit": "m" },
        "power_unit": "MW",
        "wind_speeds": [3.5, 6.0, 9.0, 12.5, 25.0],
        "power": [0.0, 0.6, 2.0, 3.6, 3.6],
        "thrust_coefficients": [0.85, 0.8, 0.72, 0.4, 0.06]
    }
]"#;

const OPTIONS_TOML: &str = r#"
[directions]
kind = "uniform"
count = 180
"#;

fn main() {
    let s = "-".repeat(50);

    let catalog = match TurbineCatalog::from_json_str(CATALOG_JSON) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Catalog error: {e}");
            return;
        }
    };
    let options = match SimulationOptions::from_toml_str(OPTIONS_TOML) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Options error: {e}");
            return;
        }
    };

    println!("=== Mixed Farm AEP ===\n");
    println!("Turbine models");
    println!("{}", s);
    for model in catalog.models() {
        let (cut_in, cut_out) = model.curve.speed_range();
        println!(
            "{:<14} D = {}, hub = {}, rated {}, {:.1}-{:.1} m/s",
            model.name,
            DisplayLength(model.rotor_diameter),
            DisplayLength(model.hub_height),
            DisplayPower(model.rated_power()),
            cut_in,
            cut_out
        );
    }

    // Two blocks: a 4x3 block of the large machine and a row of five small ones to the north
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in 0..3 {
        for col in 0..4 {
            xs.push(col as f64 * 7.0 * 167.0);
            ys.push(row as f64 * 5.0 * 167.0);
        }
    }
    let mut layout = match FarmLayout::from_coordinates(&xs, &ys, 0) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Layout error: {e}");
            return;
        }
    };
    let small_xs: Vec<f64> = (0..5).map(|i| i as f64 * 6.0 * 120.0).collect();
    if let Err(e) = layout.extend_with(&small_xs, &[4000.0; 5], 1) {
        eprintln!("Layout error: {e}");
        return;
    }

    let resource = WindResourceModel::new(
        &[0.057, 0.043, 0.048, 0.058, 0.058, 0.068, 0.093, 0.124, 0.137, 0.121, 0.098, 0.095],
        &[9.5, 9.2, 9.4, 9.8, 9.9, 10.4, 11.0, 11.6, 11.9, 11.5, 10.8, 10.1],
        &[2.1, 2.0, 2.1, 2.2, 2.3, 2.3, 2.3, 2.4, 2.5, 2.4, 2.3, 2.2],
    )
    .and_then(|r| r.with_shear(Shear::new(Length::new::<meter>(100.0), 0.12)));
    let resource = match resource {
        Ok(resource) => resource,
        Err(e) => {
            eprintln!("Resource error: {e}");
            return;
        }
    };

    println!("\nWind rose");
    println!("{}", s);
    for sector in resource.sector_distribution() {
        println!(
            "{:>5.0} deg  {:>5.1}%  A = {:.2} m/s  k = {:.2}",
            sector.center,
            100.0 * sector.frequency,
            sector.scale,
            sector.shape
        );
    }

    let engine = match FarmSimulationEngine::new(catalog, options) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Engine error: {e}");
            return;
        }
    };
    let result = match engine.simulate(&layout, &resource) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Simulation error: {e}");
            return;
        }
    };

    println!("\nResults");
    println!("{}", s);
    println!("{}", result.summary());

    println!("\nPer turbine");
    println!("{}", s);
    for (id, aep) in result.turbine_ids().iter().zip(result.aep_per_turbine()) {
        println!("WT{:02}  {}", id, DisplayEnergy(aep));
    }
}
