//! Product grouping heuristics feeding the grid-per-group hybrid branch.

use crate::config::EngineConfig;
use crate::strategy::ProductSummary;
use serde::{Deserialize, Serialize};

const CONSOLIDATION_WEIGHT: f64 = 0.6;
const BALANCE_WEIGHT: f64 = 0.4;

/// Quantity tiers relative to the mean requested quantity.
const HIGH_QUANTITY_FACTOR: f64 = 1.5;
const LOW_QUANTITY_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMethod {
    Dimension,
    AspectRatio,
    Quantity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductGroup {
    pub label: String,
    pub members: Vec<ProductSummary>,
}

impl ProductGroup {
    fn new(label: impl Into<String>, first: ProductSummary) -> Self {
        Self {
            label: label.into(),
            members: vec![first],
        }
    }

    pub fn total_quantity(&self) -> u32 {
        self.members.iter().map(|m| m.quantity).sum()
    }

    /// The group as one pseudo-product with the largest member extents.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            product_id: self.label.clone(),
            width: self.members.iter().map(|m| m.width).fold(0.0, f64::max),
            depth: self.members.iter().map(|m| m.depth).fold(0.0, f64::max),
            height: self.members.iter().map(|m| m.height).fold(0.0, f64::max),
            quantity: self.total_quantity(),
        }
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.members.iter().any(|m| m.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub method: GroupingMethod,
    pub groups: Vec<ProductGroup>,
    pub score: f64,
}

/// Clusters products by dimensions, aspect ratio or quantity.
#[derive(Debug, Clone, Copy)]
pub struct ProductGrouper {
    dimension_tolerance: f64,
    aspect_ratio_tolerance: f64,
}

impl Default for ProductGrouper {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ProductGrouper {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            dimension_tolerance: config.dimension_tolerance,
            aspect_ratio_tolerance: config.aspect_ratio_tolerance,
        }
    }

    /// Products whose extents all lie within the tolerance of a group's first member.
    pub fn by_dimension(&self, products: &[ProductSummary]) -> Vec<ProductGroup> {
        let tolerance = self.dimension_tolerance;
        let mut groups: Vec<ProductGroup> = Vec::new();

        for product in products {
            let existing = groups.iter_mut().find(|g| {
                let rep = &g.members[0];
                (rep.width - product.width).abs() <= tolerance
                    && (rep.depth - product.depth).abs() <= tolerance
                    && (rep.height - product.height).abs() <= tolerance
            });
            match existing {
                Some(group) => group.members.push(product.clone()),
                None => {
                    let label = format!("dim-{}", groups.len() + 1);
                    groups.push(ProductGroup::new(label, product.clone()));
                }
            }
        }
        groups
    }

    /// Products whose footprint aspect ratio is within a relative tolerance.
    pub fn by_aspect_ratio(&self, products: &[ProductSummary]) -> Vec<ProductGroup> {
        let tolerance = self.aspect_ratio_tolerance;
        let mut groups: Vec<ProductGroup> = Vec::new();

        for product in products {
            let ratio = product.aspect_ratio();
            let existing = groups.iter_mut().find(|g| {
                let rep = g.members[0].aspect_ratio();
                (ratio - rep).abs() / rep <= tolerance
            });
            match existing {
                Some(group) => group.members.push(product.clone()),
                None => {
                    let label = format!("aspect-{}", groups.len() + 1);
                    groups.push(ProductGroup::new(label, product.clone()));
                }
            }
        }
        groups
    }

    /// High, medium and low quantity tiers. Empty tiers are dropped.
    pub fn by_quantity(&self, products: &[ProductSummary]) -> Vec<ProductGroup> {
        if products.is_empty() {
            return Vec::new();
        }
        let mean =
            products.iter().map(|p| p.quantity as f64).sum::<f64>() / products.len() as f64;

        let mut tiers: [Vec<ProductSummary>; 3] = Default::default();
        for product in products {
            let q = product.quantity as f64;
            let tier = if q > mean * HIGH_QUANTITY_FACTOR {
                0
            } else if q < mean * LOW_QUANTITY_FACTOR {
                2
            } else {
                1
            };
            tiers[tier].push(product.clone());
        }

        ["qty-high", "qty-medium", "qty-low"]
            .into_iter()
            .zip(tiers)
            .filter(|(_, members)| !members.is_empty())
            .map(|(label, members)| ProductGroup {
                label: label.to_string(),
                members,
            })
            .collect()
    }

    /// Favors few groups of even size.
    pub fn score(&self, groups: &[ProductGroup], product_count: usize) -> f64 {
        if groups.is_empty() || product_count == 0 {
            return 0.0;
        }

        let consolidation = if product_count > 1 {
            1.0 - (groups.len() - 1) as f64 / (product_count - 1) as f64
        } else {
            1.0
        };

        let sizes: Vec<f64> = groups.iter().map(|g| g.members.len() as f64).collect();
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        let variance = sizes.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / sizes.len() as f64;
        let balance = (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0);

        CONSOLIDATION_WEIGHT * consolidation + BALANCE_WEIGHT * balance
    }

    /// Runs every grouper and keeps the best scoring result.
    pub fn group_for_optimal_fit(&self, products: &[ProductSummary]) -> Grouping {
        let candidates = [
            (GroupingMethod::Dimension, self.by_dimension(products)),
            (GroupingMethod::AspectRatio, self.by_aspect_ratio(products)),
            (GroupingMethod::Quantity, self.by_quantity(products)),
        ];

        let mut best: Option<Grouping> = None;
        for (method, groups) in candidates {
            let score = self.score(&groups, products.len());
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Grouping {
                    method,
                    groups,
                    score,
                });
            }
        }

        best.unwrap_or(Grouping {
            method: GroupingMethod::Dimension,
            groups: Vec::new(),
            score: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn product(id: &str, w: f64, d: f64, h: f64, qty: u32) -> ProductSummary {
        ProductSummary {
            product_id: id.to_string(),
            width: w,
            depth: d,
            height: h,
            quantity: qty,
        }
    }

    #[test]
    fn test_dimension_grouping_uses_tolerance() {
        let products = vec![
            product("a", 50.0, 40.0, 30.0, 1),
            product("b", 53.0, 44.0, 26.0, 1),
            product("c", 60.0, 40.0, 30.0, 1),
        ];
        let groups = ProductGrouper::default().by_dimension(&products);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].contains("a") && groups[0].contains("b"));
        assert!(groups[1].contains("c"));
    }

    #[test]
    fn test_aspect_grouping_is_relative() {
        let products = vec![
            product("square", 10.0, 10.0, 5.0, 1),
            product("big-square", 100.0, 110.0, 5.0, 1),
            product("plank", 100.0, 20.0, 5.0, 1),
        ];
        let groups = ProductGrouper::default().by_aspect_ratio(&products);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn test_quantity_tiers() {
        let products = vec![
            product("bulk", 10.0, 10.0, 10.0, 100),
            product("mid1", 10.0, 10.0, 10.0, 40),
            product("mid2", 10.0, 10.0, 10.0, 35),
            product("rare", 10.0, 10.0, 10.0, 1),
        ];
        // mean = 44
        let groups = ProductGrouper::default().by_quantity(&products);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["qty-high", "qty-medium", "qty-low"]);
        assert!(groups[0].contains("bulk"));
        assert!(groups[2].contains("rare"));
    }

    #[test]
    fn test_score_prefers_consolidated_balanced_groups() {
        let grouper = ProductGrouper::default();
        let products: Vec<ProductSummary> = (0..4)
            .map(|i| product(&format!("p{}", i), 10.0, 10.0, 10.0, 1))
            .collect();

        let one_group = vec![ProductGroup {
            label: "all".into(),
            members: products.clone(),
        }];
        let singletons: Vec<ProductGroup> = products
            .iter()
            .map(|p| ProductGroup::new(p.product_id.clone(), p.clone()))
            .collect();

        assert_relative_eq!(grouper.score(&one_group, 4), 1.0);
        assert!(grouper.score(&singletons, 4) < grouper.score(&one_group, 4));
    }

    #[test]
    fn test_optimal_fit_picks_best_method() {
        let products = vec![
            product("a", 50.0, 50.0, 30.0, 10),
            product("b", 200.0, 50.0, 30.0, 10),
            product("c", 51.0, 49.0, 30.0, 10),
            product("d", 120.0, 30.0, 30.0, 10),
        ];
        let grouping = ProductGrouper::default().group_for_optimal_fit(&products);

        // Equal quantities collapse into a single tier.
        assert_eq!(grouping.method, GroupingMethod::Quantity);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].total_quantity(), 40);
    }

    #[test]
    fn test_group_summary_takes_largest_extents() {
        let group = ProductGroup {
            label: "g".into(),
            members: vec![
                product("a", 50.0, 20.0, 30.0, 2),
                product("b", 40.0, 45.0, 10.0, 3),
            ],
        };
        let summary = group.summary();
        assert_eq!(summary.product_id, "g");
        assert_relative_eq!(summary.width, 50.0);
        assert_relative_eq!(summary.depth, 45.0);
        assert_relative_eq!(summary.height, 30.0);
        assert_eq!(summary.quantity, 5);
    }
}
