use serde::{Deserialize, Serialize};

use crate::FoodProduct;

/// Grain-free / holistic / medical toggles. Set flags are AND-combined; with
/// nothing set every product passes.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilters {
    #[serde(default)]
    pub grain_free: bool,
    #[serde(default)]
    pub holistic: bool,
    #[serde(default)]
    pub medical: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    GrainFree,
    Holistic,
    Medical,
}

impl CategoryFilters {
    pub fn is_empty(&self) -> bool {
        !self.grain_free && !self.holistic && !self.medical
    }

    pub fn matches(&self, product: &FoodProduct) -> bool {
        (!self.grain_free || product.is_grain_free)
            && (!self.holistic || product.is_holistic)
            && (!self.medical || product.is_medical)
    }

    pub fn apply<'a, I>(&self, products: I) -> Vec<&'a FoodProduct>
    where
        I: IntoIterator<Item = &'a FoodProduct>,
    {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }

    pub fn toggle(&mut self, key: FilterKey) {
        let flag = match key {
            FilterKey::GrainFree => &mut self.grain_free,
            FilterKey::Holistic => &mut self.holistic,
            FilterKey::Medical => &mut self.medical,
        };
        *flag = !*flag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn ids(products: &[&FoodProduct]) -> Vec<String> {
        products.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_no_flags_keeps_everything() {
        let catalog = Catalog::builtin().unwrap();
        let filters = CategoryFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(catalog.products()).len(), catalog.products().len());
    }

    #[test]
    fn test_combined_flags_intersect() {
        let catalog = Catalog::builtin().unwrap();
        let grain_free = CategoryFilters { grain_free: true, ..Default::default() };
        let holistic = CategoryFilters { holistic: true, ..Default::default() };
        let both = CategoryFilters { grain_free: true, holistic: true, medical: false };

        let left = ids(&grain_free.apply(catalog.products()));
        let right = ids(&holistic.apply(catalog.products()));
        let intersection: Vec<String> = left.into_iter().filter(|id| right.contains(id)).collect();

        assert_eq!(ids(&both.apply(catalog.products())), intersection);
        assert_eq!(ids(&both.apply(catalog.products())), vec!["2", "4", "6"]);
        // order of application does not matter
        assert_eq!(
            ids(&holistic.apply(grain_free.apply(catalog.products()))),
            ids(&grain_free.apply(holistic.apply(catalog.products())))
        );
    }

    #[test]
    fn test_medical_only() {
        let catalog = Catalog::builtin().unwrap();
        let filters = CategoryFilters { medical: true, ..Default::default() };
        assert_eq!(ids(&filters.apply(catalog.products())), vec!["3", "5"]);
    }

    #[test]
    fn test_toggle_flips_one_flag() {
        let mut filters = CategoryFilters::default();
        filters.toggle(FilterKey::Holistic);
        assert_eq!(filters, CategoryFilters { holistic: true, ..Default::default() });
        filters.toggle(FilterKey::Holistic);
        assert!(filters.is_empty());
    }
}
