//! Read-only food catalog shipped with the app.

use serde::Deserialize;
use tracing::debug;

use crate::filters::CategoryFilters;
use crate::matching::contains_term;
use crate::{CatProfile, FoodProduct, KittyError, Result};

/// Products above this fat percentage are excluded for cats on a diet.
pub const WEIGHT_LOSS_MAX_FAT: f64 = 15.0;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Deserialize)]
struct CatalogFile {
    products: Vec<FoodProduct>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<FoodProduct>,
}

impl Catalog {
    pub fn new(products: Vec<FoodProduct>) -> Self {
        Self { products }
    }

    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).map_err(KittyError::Catalog)?;
        Ok(Self::new(file.products))
    }

    pub fn products(&self) -> &[FoodProduct] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&FoodProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Case-insensitive substring search over brand and formula, in catalog
    /// order. An empty query matches everything; callers reject it first.
    pub fn search(&self, query: &str) -> Vec<&FoodProduct> {
        let query = query.trim().to_lowercase();
        let results: Vec<&FoodProduct> = self
            .products
            .iter()
            .filter(|p| {
                p.brand.to_lowercase().contains(&query) || p.formula.to_lowercase().contains(&query)
            })
            .collect();
        debug!(query = %query, hits = results.len(), "catalog search");
        results
    }

    /// Related products of `id`. IDs that no longer resolve are skipped, and an
    /// unknown `id` has no related products.
    pub fn similar_products(&self, id: &str) -> Vec<&FoodProduct> {
        let Some(product) = self.get(id) else {
            return vec![];
        };
        product
            .similar_products
            .iter()
            .filter_map(|related| self.get(related))
            .collect()
    }

    pub fn similar_products_filtered(
        &self,
        id: &str,
        filters: &CategoryFilters,
    ) -> Vec<&FoodProduct> {
        filters.apply(self.similar_products(id))
    }

    /// Catalog-wide recommendation for one cat. Unlike search results, anything
    /// containing one of the cat's allergens is dropped outright.
    pub fn recommend_for_cat(&self, cat: &CatProfile, filters: &CategoryFilters) -> Vec<&FoodProduct> {
        let allergens = cat.allergen_terms();
        let results: Vec<&FoodProduct> = self
            .products
            .iter()
            .filter(|p| !allergens.iter().any(|term| contains_term(p, term)))
            .filter(|p| filters.matches(p))
            .filter(|p| !cat.wants_weight_loss || p.nutrition.fat <= WEIGHT_LOSS_MAX_FAT)
            .collect();
        debug!(cat = %cat.id, hits = results.len(), "recommendation");
        results
    }
}
