//! Basic usage example for the anova library.
//!
//! This example runs a two-factor mixed-model ANOVA, a set of planned
//! contrasts and Levene's test on the same data.

use anova::{difference_contrasts, levene, AnovaBuilder, FactorType, Observations};
use ndarray::{Array, IxDyn};

fn main() {
    println!("ANOVA Library - Basic Usage Example\n");

    // 3 replicates × 3 doses × 4 sites
    let mut values = Vec::new();
    for rep in 0..3 {
        for dose in 0..3 {
            for site in 0..4 {
                let noise = f64::from((rep * 7 + dose * 3 + site * 5) % 6) * 0.4;
                values.push(10.0 + f64::from(dose) * 2.5 + f64::from(site) * 0.8 + noise);
            }
        }
    }
    let data = Array::from_shape_vec(IxDyn(&[3, 3, 4]), values).expect("shape matches values");

    // Dose is manipulated, sites are a random sample
    println!("Dose (fixed) × Site (random):");
    let result = AnovaBuilder::new()
        .factor_types(vec![FactorType::Fixed, FactorType::Random])
        .factor_names(vec!["Dose".into(), "Site".into()])
        .analyze(data.clone())
        .expect("Failed to run ANOVA");
    println!("{result}");

    for effect in result.results() {
        println!(
            "  {} tested against {} (df {:.1})",
            effect.name,
            effect.denominator.name(),
            effect.denominator.df
        );
    }
    println!();

    // Helmert contrasts on dose
    println!("Helmert contrasts on Dose:");
    let contrasts = difference_contrasts(&result, 0, false).expect("Failed to compute contrasts");
    for c in &contrasts {
        println!(
            "  {:<16} ψ = {:>7.3}  F = {:>8.3}  p = {:.4}  r = {:.3}",
            c.name, c.contrast, c.f, c.p, c.r
        );
    }
    println!();

    // Homogeneity of variance
    println!("Levene's test:");
    let observations = Observations::from_array(data, true).expect("valid observations");
    let homogeneity = levene(&observations).expect("Failed to run Levene's test");
    println!("{homogeneity}");
}
