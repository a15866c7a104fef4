//! One user's session with the finder: who is logged in, which cats are
//! selected, active filters, the compare list, and the action history.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::accounts::{
    FileSessionStore, FileUserRepository, MemorySessionStore, MemoryUserRepository, Registration,
    SessionStore, UserDirectory, UserRepository,
};
use crate::catalog::Catalog;
use crate::compare::{compare_products, CompareList, Comparison};
use crate::config::Config;
use crate::filters::{CategoryFilters, FilterKey};
use crate::history::{describe, HistoryEntryView, HistoryLog, NewHistoryEntry};
use crate::matching::{allergy_warnings, suitability, AllergyWarning, CatRef, Suitability};
use crate::profiles::{self, CatDraft};
use crate::routes::Route;
use crate::{CatProfile, FoodProduct, FoodType, KittyError, Result, Review, User};

/// Positive and negative reviews shown on a product page.
const HIGHLIGHT_POSITIVE: usize = 2;
const HIGHLIGHT_NEGATIVE: usize = 1;

#[derive(Debug, Clone, PartialEq)]
enum View {
    Search,
    Results(Vec<String>),
    Detail(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub brand: String,
    pub formula: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub target_group: String,
    pub trust_score: u8,
    pub positive_percent: u8,
    pub negative_percent: u8,
    pub is_grain_free: bool,
    pub is_holistic: bool,
    pub is_medical: bool,
    pub in_compare: bool,
    /// Against the currently selected cats
    pub suitability: Suitability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<ProductSummary>,
    /// Only warnings not already shown for this query
    pub warnings: Vec<AllergyWarning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: FoodProduct,
    pub in_compare: bool,
    pub suitability: Suitability,
    pub warnings: Vec<AllergyWarning>,
    pub similar: Vec<ProductSummary>,
    pub highlighted_reviews: Vec<Review>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatSelection {
    pub selected_cat_ids: Vec<String>,
    /// Allergens of a newly selected cat found in what is on screen
    pub warnings: Vec<AllergyWarning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub cat: CatRef,
    pub filters: CategoryFilters,
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareState {
    pub product_id: String,
    pub selected: bool,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user: Option<User>,
    pub selected_cat_ids: Vec<String>,
    pub filters: CategoryFilters,
    pub compare_ids: Vec<String>,
    pub history_len: usize,
}

/// What a navigation target opens onto.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum Screen {
    Login,
    Register,
    AddCats,
    /// The edit form, prefilled from the cat's current profile
    EditCat {
        #[serde(rename = "catId")]
        cat_id: String,
        form: CatDraft,
    },
    Finder,
    Results(SearchOutcome),
    Detail(ProductDetail),
    History { entries: Vec<HistoryEntryView> },
    Compare(Comparison),
    NotFound { path: String },
}

pub struct KittyApp<R, S> {
    catalog: Catalog,
    directory: UserDirectory<R>,
    sessions: S,
    user: Option<User>,
    history: HistoryLog,
    selected_cat_ids: Vec<String>,
    filters: CategoryFilters,
    compare: CompareList,
    /// Warning keys already issued for `last_query`
    warned: HashSet<String>,
    last_query: Option<String>,
    view: View,
}

impl KittyApp<FileUserRepository, FileSessionStore> {
    /// App backed by the files in the configured data directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = config.load_catalog()?;
        let store = config.store();
        Ok(Self::new(
            catalog,
            FileUserRepository::new(store.clone()),
            FileSessionStore::new(store),
        ))
    }
}

impl KittyApp<MemoryUserRepository, MemorySessionStore> {
    pub fn in_memory(catalog: Catalog) -> Self {
        Self::new(catalog, MemoryUserRepository::new(), MemorySessionStore::new())
    }
}

impl<R: UserRepository, S: SessionStore> KittyApp<R, S> {
    /// Build the app and restore a saved session. A session whose user is no
    /// longer in the directory is dropped.
    pub fn new(catalog: Catalog, repo: R, mut sessions: S) -> Self {
        let directory = UserDirectory::new(repo);
        let user = match sessions.load() {
            Some(saved) => match directory.find(&saved.username) {
                Some(record) => {
                    info!(username = %saved.username, "restored session");
                    Some(record.to_user())
                }
                None => {
                    warn!(username = %saved.username, "discarding session for unknown user");
                    sessions.save(None);
                    None
                }
            },
            None => None,
        };

        Self {
            catalog,
            directory,
            sessions,
            user,
            history: HistoryLog::new(),
            selected_cat_ids: vec![],
            filters: CategoryFilters::default(),
            compare: CompareList::new(),
            warned: HashSet::new(),
            last_query: None,
            view: View::Search,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn filters(&self) -> CategoryFilters {
        self.filters
    }

    pub fn selected_cat_ids(&self) -> &[String] {
        &self.selected_cat_ids
    }

    pub fn compare_ids(&self) -> &[String] {
        self.compare.ids()
    }

    pub fn session(&self) -> SessionInfo {
        SessionInfo {
            user: self.user.clone(),
            selected_cat_ids: self.selected_cat_ids.clone(),
            filters: self.filters,
            compare_ids: self.compare.ids().to_vec(),
            history_len: self.history.len(),
        }
    }

    // --- Account ---

    pub fn login(&mut self, username: &str, password: &str) -> Result<&User> {
        let user = self.directory.login(username, password)?;
        info!(username = %user.username, "logged in");
        Ok(self.start_session(user))
    }

    pub fn register(&mut self, registration: &Registration) -> Result<&User> {
        let user = self.directory.register(registration)?;
        Ok(self.start_session(user))
    }

    /// End the session. History, cat selection and the compare list go with it.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(username = %user.username, "logged out");
        }
        self.sessions.save(None);
        self.reset_session_state();
    }

    fn start_session(&mut self, user: User) -> &User {
        let switching = self.user.as_ref().is_some_and(|u| u.username != user.username);
        if switching {
            self.reset_session_state();
        }
        self.sessions.save(Some(&user));
        self.prune_selection(&user.cats);
        self.user.insert(user)
    }

    fn reset_session_state(&mut self) {
        self.history.clear();
        self.selected_cat_ids.clear();
        self.compare.clear();
        self.warned.clear();
        self.last_query = None;
        self.view = View::Search;
    }

    fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(KittyError::NotLoggedIn)
    }

    // --- Cat profiles ---

    pub fn add_cats(&mut self, drafts: Vec<CatDraft>) -> Result<&[CatProfile]> {
        let cats = profiles::add_cats(&self.require_user()?.cats, drafts)?;
        self.commit_cats(cats)
    }

    pub fn update_cat(&mut self, cat_id: &str, draft: CatDraft) -> Result<&[CatProfile]> {
        let cats = profiles::update_cat(&self.require_user()?.cats, cat_id, draft)?;
        self.commit_cats(cats)
    }

    pub fn remove_cat(&mut self, cat_id: &str) -> Result<&[CatProfile]> {
        let cats = profiles::remove_cat(&self.require_user()?.cats, cat_id)?;
        self.commit_cats(cats)
    }

    fn commit_cats(&mut self, cats: Vec<CatProfile>) -> Result<&[CatProfile]> {
        let username = self.require_user()?.username.clone();
        self.directory.set_cats(&username, cats.clone())?;
        self.prune_selection(&cats);

        let user = self.user.as_mut().ok_or(KittyError::NotLoggedIn)?;
        user.cats = cats;
        self.sessions.save(Some(&*user));
        info!(username = %username, cats = user.cats.len(), "updated cat profiles");
        Ok(&user.cats)
    }

    fn prune_selection(&mut self, cats: &[CatProfile]) {
        self.selected_cat_ids.retain(|id| cats.iter().any(|c| &c.id == id));
    }

    fn selected_cats(&self) -> Vec<CatProfile> {
        match &self.user {
            Some(user) => user
                .cats
                .iter()
                .filter(|c| self.selected_cat_ids.contains(&c.id))
                .cloned()
                .collect(),
            None => vec![],
        }
    }

    /// Select or deselect one of the user's cats. Selecting a cat reports its
    /// allergens found in the results or product currently on screen.
    pub fn toggle_cat(&mut self, cat_id: &str) -> Result<CatSelection> {
        let cat = self
            .require_user()?
            .cat(cat_id)
            .cloned()
            .ok_or_else(|| KittyError::CatNotFound(cat_id.to_string()))?;

        let warnings = if let Some(pos) = self.selected_cat_ids.iter().position(|id| id == cat_id) {
            self.selected_cat_ids.remove(pos);
            vec![]
        } else {
            self.selected_cat_ids.push(cat.id.clone());
            let on_screen: Vec<&FoodProduct> = match &self.view {
                View::Search => vec![],
                View::Results(ids) => ids.iter().filter_map(|id| self.catalog.get(id)).collect(),
                View::Detail(id) => self.catalog.get(id).into_iter().collect(),
            };
            let found = allergy_warnings(std::slice::from_ref(&cat), on_screen);
            // Warnings raised over results count against the current query.
            if matches!(self.view, View::Results(_)) {
                found
                    .into_iter()
                    .filter(|w| self.warned.insert(w.dedup_key()))
                    .collect()
            } else {
                found
            }
        };

        Ok(CatSelection {
            selected_cat_ids: self.selected_cat_ids.clone(),
            warnings,
        })
    }

    // --- Filters ---

    pub fn set_filters(&mut self, filters: CategoryFilters) -> CategoryFilters {
        self.filters = filters;
        self.filters
    }

    pub fn toggle_filter(&mut self, key: FilterKey) -> CategoryFilters {
        self.filters.toggle(key);
        self.filters
    }

    // --- Search and products ---

    /// Search brand and formula, narrowed by the category filters. Allergens of
    /// the selected cats are flagged, never filtered out.
    pub fn search(&mut self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KittyError::EmptyQuery);
        }
        let outcome = self.run_search(query);
        if self.user.is_some() {
            self.history
                .append(NewHistoryEntry::search(query, self.selected_cat_ids.clone()));
        }
        Ok(outcome)
    }

    fn run_search(&mut self, query: &str) -> SearchOutcome {
        if self.last_query.as_deref() != Some(query) {
            self.warned.clear();
            self.last_query = Some(query.to_string());
        }

        let cats = self.selected_cats();
        let results = self.filters.apply(self.catalog.search(query));
        let warnings = allergy_warnings(&cats, results.iter().copied())
            .into_iter()
            .filter(|w| self.warned.insert(w.dedup_key()))
            .collect();
        let summaries = results
            .iter()
            .map(|p| summarize(p, &cats, &self.compare))
            .collect();

        self.view = View::Results(results.iter().map(|p| p.id.clone()).collect());
        SearchOutcome {
            query: query.to_string(),
            results: summaries,
            warnings,
        }
    }

    /// Open a product page and record the visit.
    pub fn view_product(&mut self, product_id: &str) -> Result<ProductDetail> {
        let detail = self.product_detail(product_id)?;
        self.view = View::Detail(product_id.to_string());
        if self.user.is_some() {
            self.history
                .append(NewHistoryEntry::view(product_id, self.selected_cat_ids.clone()));
        }
        Ok(detail)
    }

    fn product_detail(&self, product_id: &str) -> Result<ProductDetail> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| KittyError::ProductNotFound(product_id.to_string()))?;
        let cats = self.selected_cats();

        let positive = product.reviews.iter().filter(|r| r.is_positive).take(HIGHLIGHT_POSITIVE);
        let negative = product.reviews.iter().filter(|r| !r.is_positive).take(HIGHLIGHT_NEGATIVE);

        Ok(ProductDetail {
            product: product.clone(),
            in_compare: self.compare.contains(&product.id),
            suitability: suitability(&cats, product),
            warnings: allergy_warnings(&cats, [product]),
            similar: self
                .catalog
                .similar_products_filtered(product_id, &self.filters)
                .into_iter()
                .map(|p| summarize(p, &cats, &self.compare))
                .collect(),
            highlighted_reviews: positive.chain(negative).cloned().collect(),
        })
    }

    /// Similar products of `product_id`, narrowed by the active filters.
    pub fn similar_products(&self, product_id: &str) -> Result<Vec<ProductSummary>> {
        if self.catalog.get(product_id).is_none() {
            return Err(KittyError::ProductNotFound(product_id.to_string()));
        }
        let cats = self.selected_cats();
        Ok(self
            .catalog
            .similar_products_filtered(product_id, &self.filters)
            .into_iter()
            .map(|p| summarize(p, &cats, &self.compare))
            .collect())
    }

    /// Catalog-wide picks for one of the user's cats. Unlike search, products
    /// with the cat's allergens are left out entirely.
    pub fn recommend(&self, cat_id: &str) -> Result<Recommendation> {
        let cat = self
            .require_user()?
            .cat(cat_id)
            .ok_or_else(|| KittyError::CatNotFound(cat_id.to_string()))?;
        let cats = std::slice::from_ref(cat);
        let products = self
            .catalog
            .recommend_for_cat(cat, &self.filters)
            .into_iter()
            .map(|p| summarize(p, cats, &self.compare))
            .collect();

        Ok(Recommendation {
            cat: CatRef::from(cat),
            filters: self.filters,
            products,
        })
    }

    // --- Compare ---

    pub fn toggle_compare(&mut self, product_id: &str) -> Result<CompareState> {
        if self.catalog.get(product_id).is_none() {
            return Err(KittyError::ProductNotFound(product_id.to_string()));
        }
        let selected = self.compare.toggle(product_id)?;
        Ok(CompareState {
            product_id: product_id.to_string(),
            selected,
            ids: self.compare.ids().to_vec(),
        })
    }

    /// Compare the picked products and record it.
    pub fn compare(&mut self) -> Result<Comparison> {
        let ids = self.compare.ready()?.to_vec();
        let comparison = compare_products(&self.catalog, &ids)?;
        if self.user.is_some() {
            self.history
                .append(NewHistoryEntry::compare(ids, self.selected_cat_ids.clone()));
        }
        Ok(comparison)
    }

    // --- History ---

    pub fn history(&self) -> Result<Vec<HistoryEntryView>> {
        let user = self.require_user()?;
        Ok(self
            .history
            .entries()
            .iter()
            .map(|item| describe(item, &self.catalog, &user.cats))
            .collect())
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.require_user()?;
        self.history.clear();
        Ok(())
    }

    // --- Navigation ---

    /// Open a navigation target. Seeded searches and product links do not add
    /// history entries.
    pub fn open(&mut self, route: &Route) -> Result<Screen> {
        match route {
            Route::Login => Ok(Screen::Login),
            Route::Register => Ok(Screen::Register),
            Route::AddCats => {
                self.require_user()?;
                Ok(Screen::AddCats)
            }
            Route::EditCat { cat_id } => {
                let cat = self
                    .require_user()?
                    .cat(cat_id)
                    .cloned()
                    .ok_or_else(|| KittyError::CatNotFound(cat_id.clone()))?;
                Ok(Screen::EditCat {
                    cat_id: cat.id.clone(),
                    form: CatDraft::from(cat),
                })
            }
            Route::App { search: Some(query), .. } if !query.trim().is_empty() => {
                Ok(Screen::Results(self.run_search(query.trim())))
            }
            Route::App { product: Some(id), .. } if self.catalog.get(id).is_some() => {
                let detail = self.product_detail(id)?;
                self.view = View::Detail(id.clone());
                Ok(Screen::Detail(detail))
            }
            Route::App { .. } => {
                self.view = View::Search;
                Ok(Screen::Finder)
            }
            Route::History => Ok(Screen::History {
                entries: self.history()?,
            }),
            Route::Compare { ids } => Ok(Screen::Compare(compare_products(&self.catalog, ids)?)),
            Route::NotFound { path } => Ok(Screen::NotFound { path: path.clone() }),
        }
    }
}

fn summarize(product: &FoodProduct, cats: &[CatProfile], compare: &CompareList) -> ProductSummary {
    ProductSummary {
        id: product.id.clone(),
        brand: product.brand.clone(),
        formula: product.formula.clone(),
        food_type: product.food_type,
        target_group: product.target_group.clone(),
        trust_score: product.trust_score,
        positive_percent: product.positive_percent,
        negative_percent: product.negative_percent,
        is_grain_free: product.is_grain_free,
        is_holistic: product.is_holistic,
        is_medical: product.is_medical,
        in_compare: compare.contains(&product.id),
        suitability: suitability(cats, product),
    }
}
