use serde::Serialize;

use crate::catalog::Catalog;
use crate::{FoodProduct, FoodType, KittyError, Result};

pub const COMPARE_MIN: usize = 2;
pub const COMPARE_MAX: usize = 3;

/// Products picked for side-by-side comparison, in pick order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareList {
    ids: Vec<String>,
}

impl CompareList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpick `id` if picked, otherwise pick it. Returns whether it is picked
    /// afterwards. Picking past the limit fails and leaves the list unchanged.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
            return Ok(false);
        }
        if self.ids.len() >= COMPARE_MAX {
            return Err(KittyError::CompareLimit);
        }
        self.ids.push(id.to_string());
        Ok(true)
    }

    /// The picked ids, once enough are picked to compare.
    pub fn ready(&self) -> Result<&[String]> {
        if self.ids.len() < COMPARE_MIN {
            return Err(KittyError::CompareTooFew);
        }
        Ok(&self.ids)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ComparisonValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonRow {
    pub label: &'static str,
    /// One value per compared product, in column order.
    pub values: Vec<ComparisonValue>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparedProduct {
    pub id: String,
    pub brand: String,
    pub formula: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Comparison {
    pub products: Vec<ComparedProduct>,
    pub rows: Vec<ComparisonRow>,
}

fn food_type_label(food_type: FoodType) -> &'static str {
    match food_type {
        FoodType::Dry => "dry",
        FoodType::Wet => "wet",
        FoodType::Treat => "treat",
    }
}

type RowFn = fn(&FoodProduct) -> ComparisonValue;

const ROWS: &[(&str, RowFn)] = &[
    ("Type", |p: &FoodProduct| ComparisonValue::Text(food_type_label(p.food_type).to_string())),
    ("Protein (%)", |p: &FoodProduct| ComparisonValue::Number(p.nutrition.protein)),
    ("Fat (%)", |p: &FoodProduct| ComparisonValue::Number(p.nutrition.fat)),
    ("Fiber (%)", |p: &FoodProduct| ComparisonValue::Number(p.nutrition.fiber)),
    ("Calories (kcal/100g)", |p: &FoodProduct| ComparisonValue::Number(p.nutrition.calories)),
    ("Trust Score", |p: &FoodProduct| ComparisonValue::Number(p.trust_score.into())),
    ("Positive reviews (%)", |p: &FoodProduct| ComparisonValue::Number(p.positive_percent.into())),
    ("Negative reviews (%)", |p: &FoodProduct| ComparisonValue::Number(p.negative_percent.into())),
    ("Grain-Free", |p: &FoodProduct| ComparisonValue::Flag(p.is_grain_free)),
    ("Holistic", |p: &FoodProduct| ComparisonValue::Flag(p.is_holistic)),
    ("Medical", |p: &FoodProduct| ComparisonValue::Flag(p.is_medical)),
    ("Taurine", |p: &FoodProduct| ComparisonValue::Flag(p.has_supplements.taurine)),
    ("Omega-3", |p: &FoodProduct| ComparisonValue::Flag(p.has_supplements.omega3)),
    ("Probiotics", |p: &FoodProduct| ComparisonValue::Flag(p.has_supplements.probiotics)),
];

/// Build the comparison table for `ids`. Unknown and repeated ids are skipped;
/// if nothing resolves there is nothing to show.
pub fn compare_products(catalog: &Catalog, ids: &[String]) -> Result<Comparison> {
    let mut products: Vec<&FoodProduct> = Vec::new();
    for id in ids {
        if let Some(product) = catalog.get(id) {
            if !products.iter().any(|p| p.id == product.id) {
                products.push(product);
            }
        }
    }
    if products.is_empty() {
        return Err(KittyError::NothingToCompare);
    }

    let rows = ROWS
        .iter()
        .map(|&(label, value)| ComparisonRow {
            label,
            values: products.iter().map(|p| value(*p)).collect(),
        })
        .collect();

    Ok(Comparison {
        products: products
            .iter()
            .map(|p| ComparedProduct {
                id: p.id.clone(),
                brand: p.brand.clone(),
                formula: p.formula.clone(),
            })
            .collect(),
        rows,
    })
}
