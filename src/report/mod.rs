//! Reporting utilities: elasticity rankings and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Product;
use crate::models::TrainedModels;

/// Own-price elasticity of one product, from the full model and from the
/// univariate fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Elasticity {
    pub product: Product,
    /// Coefficient on the product's own log price in the multivariate model.
    pub own_price: f64,
    pub univariate: Option<f64>,
}

/// Own-price elasticities, most elastic (most negative) first.
pub fn rank_elasticities(trained: &TrainedModels) -> Vec<Elasticity> {
    let mut rows: Vec<Elasticity> = trained
        .fits
        .iter()
        .filter_map(|fit| {
            let coefficients = trained.registry.get(fit.product)?;
            let own_price = *coefficients.slopes().get(fit.product.index())?;
            Some(Elasticity {
                product: fit.product,
                own_price,
                univariate: fit.own_price_slope,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.own_price.total_cmp(&b.own_price));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample};
    use crate::domain::ModelConfig;
    use crate::models::train_demand_models;

    #[test]
    fn elasticities_sorted_most_elastic_first() {
        let config = SampleConfig {
            rows: 40,
            noise: 0.0,
            ..SampleConfig::default()
        };
        let table = generate_sample(&config).unwrap();
        let trained = train_demand_models(&table, &ModelConfig::default()).unwrap();

        let ranked = rank_elasticities(&trained);
        let order: Vec<Product> = ranked.iter().map(|e| e.product).collect();
        // Default own elasticities: Milk -1.2, Chocolate -1.8, Soup -0.9, Ramen -1.4.
        assert_eq!(order, vec![Product::Chocolate, Product::Ramen, Product::Milk, Product::Soup]);
        assert!((ranked[0].own_price + 1.8).abs() < 1e-6);
        assert!(ranked.iter().all(|e| e.univariate.is_some()));
    }
}
