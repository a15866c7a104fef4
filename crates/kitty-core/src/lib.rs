pub mod accounts;
pub mod app;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod filters;
pub mod history;
pub mod matching;
pub mod profiles;
pub mod routes;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{KittyError, Result};

// --- Types (same JSON layout the web client keeps in localStorage) ---

/// Allergens and dislikes a cat profile can pick from a fixed list.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AllergyOption {
    Chicken,
    Fish,
    Beef,
    Pork,
    Dairy,
    Eggs,
    Wheat,
    Corn,
    Soy,
}

impl AllergyOption {
    pub const ALL: [AllergyOption; 9] = [
        AllergyOption::Chicken,
        AllergyOption::Fish,
        AllergyOption::Beef,
        AllergyOption::Pork,
        AllergyOption::Dairy,
        AllergyOption::Eggs,
        AllergyOption::Wheat,
        AllergyOption::Corn,
        AllergyOption::Soy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllergyOption::Chicken => "chicken",
            AllergyOption::Fish => "fish",
            AllergyOption::Beef => "beef",
            AllergyOption::Pork => "pork",
            AllergyOption::Dairy => "dairy",
            AllergyOption::Eggs => "eggs",
            AllergyOption::Wheat => "wheat",
            AllergyOption::Corn => "corn",
            AllergyOption::Soy => "soy",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FurLength {
    #[default]
    Short,
    Long,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub gender: Gender,
    /// Free-form date string as entered, may be empty
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub is_neutered: bool,
    #[serde(default)]
    pub allergies: Vec<AllergyOption>,
    /// Extra allergens as comma-separated free text
    #[serde(default)]
    pub allergies_other: String,
    #[serde(default)]
    pub dislikes: Vec<AllergyOption>,
    /// Extra dislikes as comma-separated free text
    #[serde(default)]
    pub dislikes_other: String,
    #[serde(default)]
    pub fur_length: FurLength,
    #[serde(default)]
    pub diseases: String,
    #[serde(default)]
    pub wants_weight_loss: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Dry,
    Wet,
    Treat,
}

/// Guaranteed analysis. Protein, fat and fiber are percentages, calories are kcal/100g.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Nutrition {
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub calories: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SupplementFlags {
    pub taurine: bool,
    pub omega3: bool,
    pub probiotics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub text: String,
    pub is_positive: bool,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodProduct {
    pub id: String,
    pub brand: String,
    pub formula: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub target_group: String,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub supplements: Vec<String>,
    #[serde(default)]
    pub has_supplements: SupplementFlags,
    pub trust_score: u8,
    pub positive_percent: u8,
    pub negative_percent: u8,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub is_grain_free: bool,
    #[serde(default)]
    pub is_holistic: bool,
    #[serde(default)]
    pub is_medical: bool,
    /// Related product IDs. Not guaranteed to be reciprocal or to resolve.
    #[serde(default)]
    pub similar_products: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl FoodProduct {
    /// "formula - brand", the label used in history and comparison headers.
    pub fn label(&self) -> String {
        format!("{} - {}", self.formula, self.brand)
    }
}

/// A logged-in user as seen by the session. `id` is the username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub cats: Vec<CatProfile>,
}

impl User {
    pub fn cat(&self, cat_id: &str) -> Option<&CatProfile> {
        self.cats.iter().find(|c| c.id == cat_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Search,
    View,
    Compare,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub cat_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Generate a fresh opaque identifier for cats and history entries.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
