//! Cat profile forms: drafts in, validated profiles out.
//!
//! Every operation returns the user's complete new cat list; nothing is
//! applied when validation fails.

use serde::{Deserialize, Serialize};

use crate::{generate_id, AllergyOption, CatProfile, FurLength, Gender, KittyError, Result};

pub const MAX_CATS: usize = 8;
pub const DEFAULT_BREED: &str = "Not specified";

/// A cat profile as filled in on the form. Anything left out takes its default
/// when the draft is turned into a profile, or keeps its current value when the
/// draft edits an existing cat.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatDraft {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    /// Free-form date string, e.g. "2021-04-01"
    pub birth_date: Option<String>,
    pub is_neutered: Option<bool>,
    pub allergies: Option<Vec<AllergyOption>>,
    /// Extra allergens, comma-separated
    pub allergies_other: Option<String>,
    pub dislikes: Option<Vec<AllergyOption>>,
    /// Extra dislikes, comma-separated
    pub dislikes_other: Option<String>,
    pub fur_length: Option<FurLength>,
    pub diseases: Option<String>,
    pub wants_weight_loss: Option<bool>,
}

impl CatDraft {
    /// Build a new profile with a fresh id. `index` is the 1-based position of
    /// the draft on the form, used in the missing-name message.
    pub fn into_profile(self, index: usize) -> Result<CatProfile> {
        let name = required_name(self.name.as_deref(), index)?;
        Ok(CatProfile {
            id: generate_id(),
            name,
            breed: self
                .breed
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BREED.to_string()),
            gender: self.gender.unwrap_or_default(),
            birth_date: self.birth_date.unwrap_or_default(),
            is_neutered: self.is_neutered.unwrap_or(false),
            allergies: self.allergies.unwrap_or_default(),
            allergies_other: self.allergies_other.unwrap_or_default(),
            dislikes: self.dislikes.unwrap_or_default(),
            dislikes_other: self.dislikes_other.unwrap_or_default(),
            fur_length: self.fur_length.unwrap_or_default(),
            diseases: self.diseases.unwrap_or_default(),
            wants_weight_loss: self.wants_weight_loss.unwrap_or(false),
        })
    }

    /// Apply the fields present in the draft on top of `base`, keeping its id.
    pub fn apply_to(self, base: &CatProfile) -> Result<CatProfile> {
        let name = match self.name.as_deref() {
            Some(name) => required_name(Some(name), 1)?,
            None => base.name.clone(),
        };
        let base = base.clone();
        Ok(CatProfile {
            id: base.id,
            name,
            breed: self.breed.unwrap_or(base.breed),
            gender: self.gender.unwrap_or(base.gender),
            birth_date: self.birth_date.unwrap_or(base.birth_date),
            is_neutered: self.is_neutered.unwrap_or(base.is_neutered),
            allergies: self.allergies.unwrap_or(base.allergies),
            allergies_other: self.allergies_other.unwrap_or(base.allergies_other),
            dislikes: self.dislikes.unwrap_or(base.dislikes),
            dislikes_other: self.dislikes_other.unwrap_or(base.dislikes_other),
            fur_length: self.fur_length.unwrap_or(base.fur_length),
            diseases: self.diseases.unwrap_or(base.diseases),
            wants_weight_loss: self.wants_weight_loss.unwrap_or(base.wants_weight_loss),
        })
    }

    pub fn toggle_allergy(&mut self, option: AllergyOption) {
        toggle_option(self.allergies.get_or_insert_with(Vec::new), option);
    }

    pub fn toggle_dislike(&mut self, option: AllergyOption) {
        toggle_option(self.dislikes.get_or_insert_with(Vec::new), option);
    }
}

impl From<CatProfile> for CatDraft {
    fn from(cat: CatProfile) -> Self {
        Self {
            name: Some(cat.name),
            breed: Some(cat.breed),
            gender: Some(cat.gender),
            birth_date: Some(cat.birth_date),
            is_neutered: Some(cat.is_neutered),
            allergies: Some(cat.allergies),
            allergies_other: Some(cat.allergies_other),
            dislikes: Some(cat.dislikes),
            dislikes_other: Some(cat.dislikes_other),
            fur_length: Some(cat.fur_length),
            diseases: Some(cat.diseases),
            wants_weight_loss: Some(cat.wants_weight_loss),
        }
    }
}

fn required_name(name: Option<&str>, index: usize) -> Result<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(KittyError::MissingCatName { index }),
    }
}

fn toggle_option(options: &mut Vec<AllergyOption>, option: AllergyOption) {
    if let Some(pos) = options.iter().position(|o| *o == option) {
        options.remove(pos);
    } else {
        options.push(option);
    }
}

/// Validate every draft, then append the new profiles to `existing`.
pub fn add_cats(existing: &[CatProfile], drafts: Vec<CatDraft>) -> Result<Vec<CatProfile>> {
    if drafts.len() > MAX_CATS || existing.len() + drafts.len() > MAX_CATS {
        return Err(KittyError::TooManyCats);
    }
    let added = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| draft.into_profile(i + 1))
        .collect::<Result<Vec<_>>>()?;

    let mut cats = existing.to_vec();
    cats.extend(added);
    Ok(cats)
}

pub fn update_cat(existing: &[CatProfile], cat_id: &str, draft: CatDraft) -> Result<Vec<CatProfile>> {
    let pos = existing
        .iter()
        .position(|c| c.id == cat_id)
        .ok_or_else(|| KittyError::CatNotFound(cat_id.to_string()))?;
    let updated = draft.apply_to(&existing[pos])?;

    let mut cats = existing.to_vec();
    cats[pos] = updated;
    Ok(cats)
}

pub fn remove_cat(existing: &[CatProfile], cat_id: &str) -> Result<Vec<CatProfile>> {
    if !existing.iter().any(|c| c.id == cat_id) {
        return Err(KittyError::CatNotFound(cat_id.to_string()));
    }
    if existing.len() == 1 {
        return Err(KittyError::LastCat);
    }
    Ok(existing.iter().filter(|c| c.id != cat_id).cloned().collect())
}
