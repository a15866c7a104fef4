//! Allergen and dislike matching between cat profiles and food products.
//!
//! A term conflicts with a product when any of its ingredient strings contains
//! the term as a case-insensitive substring, so "beef" matches "beef broth".
//! Empty allergen or dislike lists never conflict.

use serde::Serialize;

use crate::{AllergyOption, CatProfile, FoodProduct};

impl CatProfile {
    /// Normalized allergen terms: picked options first, then the free-text list.
    pub fn allergen_terms(&self) -> Vec<String> {
        merge_terms(&self.allergies, &self.allergies_other)
    }

    /// Normalized dislike terms: picked options first, then the free-text list.
    pub fn dislike_terms(&self) -> Vec<String> {
        merge_terms(&self.dislikes, &self.dislikes_other)
    }
}

fn merge_terms(options: &[AllergyOption], other: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for option in options {
        push_term(&mut terms, option.as_str());
    }
    for raw in other.split(',') {
        push_term(&mut terms, raw);
    }
    terms
}

fn push_term(terms: &mut Vec<String>, raw: &str) {
    let term = raw.trim().to_lowercase();
    if !term.is_empty() && !terms.contains(&term) {
        terms.push(term);
    }
}

/// Whether any ingredient of `product` contains `term`. `term` must already be
/// lower-cased and trimmed.
pub fn contains_term(product: &FoodProduct, term: &str) -> bool {
    product
        .ingredients
        .iter()
        .any(|ingredient| ingredient.to_lowercase().contains(term))
}

fn matched_terms<'a, I>(terms: Vec<String>, products: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FoodProduct>,
    I::IntoIter: Clone,
{
    let products = products.into_iter();
    terms
        .into_iter()
        .filter(|term| products.clone().any(|p| contains_term(p, term)))
        .collect()
}

/// Allergen terms of `cat` found in any of `products`, in the cat's term order.
pub fn find_allergen_conflicts<'a, I>(cat: &CatProfile, products: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FoodProduct>,
    I::IntoIter: Clone,
{
    matched_terms(cat.allergen_terms(), products)
}

/// Dislike terms of `cat` found in any of `products`, in the cat's term order.
pub fn find_dislike_conflicts<'a, I>(cat: &CatProfile, products: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FoodProduct>,
    I::IntoIter: Clone,
{
    matched_terms(cat.dislike_terms(), products)
}

pub fn is_suitable(cat: &CatProfile, product: &FoodProduct) -> bool {
    find_allergen_conflicts(cat, [product]).is_empty()
        && find_dislike_conflicts(cat, [product]).is_empty()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatRef {
    pub id: String,
    pub name: String,
}

impl From<&CatProfile> for CatRef {
    fn from(cat: &CatProfile) -> Self {
        Self {
            id: cat.id.clone(),
            name: cat.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatConflict {
    pub cat_id: String,
    pub cat_name: String,
    pub allergens: Vec<String>,
    pub dislikes: Vec<String>,
}

/// Per-cat outcome for one product. Cats are partitioned, never aggregated,
/// since two cats can disagree about the same product.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suitability {
    pub product_id: String,
    pub suitable_for: Vec<CatRef>,
    pub conflicts: Vec<CatConflict>,
}

impl Suitability {
    pub fn suitable_for_all(&self) -> bool {
        self.conflicts.is_empty()
    }
}

pub fn suitability(cats: &[CatProfile], product: &FoodProduct) -> Suitability {
    let mut suitable_for = Vec::new();
    let mut conflicts = Vec::new();

    for cat in cats {
        let allergens = find_allergen_conflicts(cat, [product]);
        let dislikes = find_dislike_conflicts(cat, [product]);
        if allergens.is_empty() && dislikes.is_empty() {
            suitable_for.push(CatRef::from(cat));
        } else {
            conflicts.push(CatConflict {
                cat_id: cat.id.clone(),
                cat_name: cat.name.clone(),
                allergens,
                dislikes,
            });
        }
    }

    Suitability {
        product_id: product.id.clone(),
        suitable_for,
        conflicts,
    }
}

/// A cat whose allergens show up somewhere in a list of products.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllergyWarning {
    pub cat_id: String,
    pub cat_name: String,
    pub allergens: Vec<String>,
    pub message: String,
}

impl AllergyWarning {
    fn new(cat: &CatProfile, allergens: Vec<String>) -> Self {
        let message = format!("⚠️ {} is allergic to: {}", cat.name, allergens.join(", "));
        Self {
            cat_id: cat.id.clone(),
            cat_name: cat.name.clone(),
            allergens,
            message,
        }
    }

    /// Stable key for de-duplicating repeated warnings: cat id plus sorted terms.
    pub fn dedup_key(&self) -> String {
        let mut terms = self.allergens.clone();
        terms.sort();
        format!("{}|{}", self.cat_id, terms.join("|"))
    }
}

pub fn allergy_warnings<'a, I>(cats: &[CatProfile], products: I) -> Vec<AllergyWarning>
where
    I: IntoIterator<Item = &'a FoodProduct>,
    I::IntoIter: Clone,
{
    let products = products.into_iter();
    cats.iter()
        .filter_map(|cat| {
            let matched = find_allergen_conflicts(cat, products.clone());
            (!matched.is_empty()).then(|| AllergyWarning::new(cat, matched))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn cat(name: &str) -> CatProfile {
        CatProfile {
            id: name.to_lowercase(),
            name: name.to_string(),
            breed: String::new(),
            gender: Default::default(),
            birth_date: String::new(),
            is_neutered: false,
            allergies: vec![],
            allergies_other: String::new(),
            dislikes: vec![],
            dislikes_other: String::new(),
            fur_length: Default::default(),
            diseases: String::new(),
            wants_weight_loss: false,
        }
    }

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_tom_is_allergic_to_orijen() {
        let catalog = catalog();
        let orijen = catalog.get("2").unwrap();
        let mut tom = cat("Tom");
        tom.allergies = vec![AllergyOption::Fish];

        assert_eq!(find_allergen_conflicts(&tom, [orijen]), vec!["fish"]);
        assert!(!is_suitable(&tom, orijen));
    }

    #[test]
    fn test_empty_profile_suits_everything() {
        let catalog = catalog();
        let felix = cat("Felix");
        for product in catalog.products() {
            assert!(is_suitable(&felix, product), "{}", product.id);
        }
    }

    #[test]
    fn test_free_text_is_normalized() {
        let catalog = catalog();
        let mut loose = cat("Loose");
        loose.allergies_other = "Fish, DAIRY ".to_string();
        let mut tight = cat("Tight");
        tight.allergies_other = "fish,dairy".to_string();

        assert_eq!(loose.allergen_terms(), vec!["fish", "dairy"]);
        for product in catalog.products() {
            assert_eq!(
                find_allergen_conflicts(&loose, [product]),
                find_allergen_conflicts(&tight, [product])
            );
        }
    }

    #[test]
    fn test_terms_merge_options_then_free_text() {
        let mut mimi = cat("Mimi");
        mimi.allergies = vec![AllergyOption::Chicken, AllergyOption::Corn];
        mimi.allergies_other = " corn , , Salmon".to_string();

        assert_eq!(mimi.allergen_terms(), vec!["chicken", "corn", "salmon"]);
    }

    #[test]
    fn test_substring_matches_compound_ingredient() {
        let mut product = catalog().get("1").unwrap().clone();
        product.ingredients = vec!["Beef Broth".to_string()];
        let mut bo = cat("Bo");
        bo.allergies_other = "beef".to_string();

        assert_eq!(find_allergen_conflicts(&bo, [&product]), vec!["beef"]);
    }

    #[test]
    fn test_dislike_is_independent_of_allergy() {
        let catalog = catalog();
        let royal = catalog.get("1").unwrap();
        let mut picky = cat("Picky");
        picky.dislikes = vec![AllergyOption::Corn];

        assert!(find_allergen_conflicts(&picky, [royal]).is_empty());
        assert_eq!(find_dislike_conflicts(&picky, [royal]), vec!["corn"]);
        assert!(!is_suitable(&picky, royal));
    }

    #[test]
    fn test_suitability_partitions_cats() {
        let catalog = catalog();
        let wellness = catalog.get("4").unwrap();
        let mut tom = cat("Tom");
        tom.allergies = vec![AllergyOption::Chicken];
        let luna = cat("Luna");

        let result = suitability(&[tom, luna], wellness);
        assert_eq!(result.suitable_for, vec![CatRef { id: "luna".into(), name: "Luna".into() }]);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].cat_name, "Tom");
        assert_eq!(result.conflicts[0].allergens, vec!["chicken"]);
        assert!(!result.suitable_for_all());
    }

    #[test]
    fn test_warnings_cover_whole_result_list() {
        let catalog = catalog();
        let mut tom = cat("Tom");
        tom.allergies = vec![AllergyOption::Wheat, AllergyOption::Fish];
        let luna = cat("Luna");

        let warnings = allergy_warnings(&[tom, luna], catalog.products());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].allergens, vec!["wheat", "fish"]);
        assert_eq!(warnings[0].dedup_key(), "tom|fish|wheat");
    }
}
