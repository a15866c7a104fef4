use std::sync::{Arc, Mutex, MutexGuard};

use kitty_core::accounts::{FileSessionStore, FileUserRepository, Registration};
use kitty_core::app::KittyApp;
use kitty_core::config::Config;
use kitty_core::filters::{CategoryFilters, FilterKey};
use kitty_core::profiles::CatDraft;
use kitty_core::routes::Route;
use kitty_core::{FoodProduct, FoodType, KittyError};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

type App = KittyApp<FileUserRepository, FileSessionStore>;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RegisterRequest {
    /// Email address, must not be blank
    email: String,
    /// At least 3 characters
    username: String,
    /// At least 6 characters
    password: String,
    /// Must repeat `password` exactly
    confirm_password: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddCatsRequest {
    /// One entry per cat (1-8). Only `name` is required; omitted fields take defaults (breed "Not specified", male, short fur, not neutered, no diet).
    cats: Vec<CatDraft>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateCatRequest {
    /// ID of the cat to edit
    cat_id: String,
    /// Fields to change. Omitted fields keep their current value.
    changes: CatDraft,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CatIdRequest {
    /// ID of one of the logged-in user's cats
    cat_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ProductIdRequest {
    /// Catalog product ID (see list_foods)
    product_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetFiltersRequest {
    #[serde(default)]
    grain_free: bool,
    #[serde(default)]
    holistic: bool,
    #[serde(default)]
    medical: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ToggleFilterRequest {
    /// One of: grainFree, holistic, medical
    filter: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchRequest {
    /// Brand or formula text, e.g. "Royal Canin" or "indoor"
    query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct OpenRouteRequest {
    /// App path with optional query, e.g. "/app?search=Orijen", "/compare?ids=1,2", "/cats/edit/<catId>", "/history"
    path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FoodListing<'a> {
    id: &'a str,
    brand: &'a str,
    formula: &'a str,
    #[serde(rename = "type")]
    food_type: FoodType,
    target_group: &'a str,
    trust_score: u8,
    is_grain_free: bool,
    is_holistic: bool,
    is_medical: bool,
}

impl<'a> From<&'a FoodProduct> for FoodListing<'a> {
    fn from(p: &'a FoodProduct) -> Self {
        Self {
            id: &p.id,
            brand: &p.brand,
            formula: &p.formula,
            food_type: p.food_type,
            target_group: &p.target_group,
            trust_score: p.trust_score,
            is_grain_free: p.is_grain_free,
            is_holistic: p.is_holistic,
            is_medical: p.is_medical,
        }
    }
}

// --- Server ---

#[derive(Clone)]
pub struct KittyServer {
    app: Arc<Mutex<App>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KittyServer {
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
            tool_router: Self::tool_router(),
        }
    }

    fn app(&self) -> Result<MutexGuard<'_, App>, McpError> {
        self.app
            .lock()
            .map_err(|_| McpError::internal_error("app state is poisoned", None))
    }

    #[tool(description = "Create an account and log in. Returns the new user {id, email, username, cats: []}.")]
    fn register(&self, Parameters(req): Parameters<RegisterRequest>) -> Result<CallToolResult, McpError> {
        let registration = Registration {
            email: req.email,
            username: req.username,
            password: req.password,
            confirm_password: req.confirm_password,
        };
        let mut app = self.app()?;
        respond(app.register(&registration))
    }

    #[tool(description = "Log in with username and password. Returns the user with their cat profiles.")]
    fn login(&self, Parameters(req): Parameters<LoginRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.login(&req.username, &req.password))
    }

    #[tool(description = "Log out. Clears the action history, cat selection and compare list.")]
    fn logout(&self) -> Result<CallToolResult, McpError> {
        self.app()?.logout();
        Ok(CallToolResult::success(vec![Content::text("Logged out")]))
    }

    #[tool(description = "Current session: {user?, selectedCatIds, filters, compareIds, historyLen}.")]
    fn get_session(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.app()?.session())
    }

    #[tool(description = "Add cat profiles to the logged-in user (at most 8 cats in total). All cats are validated before any is added. Returns the full cat list.")]
    fn add_cats(&self, Parameters(req): Parameters<AddCatsRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.add_cats(req.cats))
    }

    #[tool(description = "Edit one cat profile. Returns the full cat list.")]
    fn update_cat(&self, Parameters(req): Parameters<UpdateCatRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.update_cat(&req.cat_id, req.changes))
    }

    #[tool(description = "Delete a cat profile. The last remaining cat cannot be removed. Returns the full cat list.")]
    fn remove_cat(&self, Parameters(req): Parameters<CatIdRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.remove_cat(&req.cat_id))
    }

    #[tool(description = "Select or deselect a cat for suitability checks. Selecting a cat returns allergy warnings for the results or product currently shown.")]
    fn toggle_cat(&self, Parameters(req): Parameters<CatIdRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.toggle_cat(&req.cat_id))
    }

    #[tool(description = "Replace the category filters. Set flags are combined with AND; none set means no filtering.")]
    fn set_filters(&self, Parameters(req): Parameters<SetFiltersRequest>) -> Result<CallToolResult, McpError> {
        let filters = CategoryFilters {
            grain_free: req.grain_free,
            holistic: req.holistic,
            medical: req.medical,
        };
        json_result(&self.app()?.set_filters(filters))
    }

    #[tool(description = "Flip one category filter (grainFree, holistic or medical). Returns the active filters.")]
    fn toggle_filter(&self, Parameters(req): Parameters<ToggleFilterRequest>) -> Result<CallToolResult, McpError> {
        let key = parse_filter(&req.filter)?;
        json_result(&self.app()?.toggle_filter(key))
    }

    #[tool(description = "Search foods by brand or formula (case-insensitive substring), narrowed by the category filters. Products with allergens of the selected cats are kept but flagged: each result carries suitability {suitableFor, conflicts}, and `warnings` lists cats allergic to something in the results.")]
    fn search_foods(&self, Parameters(req): Parameters<SearchRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.search(&req.query))
    }

    #[tool(description = "Open a product page: full product, suitability for the selected cats, allergy warnings, similar products (filtered) and highlighted reviews.")]
    fn get_product(&self, Parameters(req): Parameters<ProductIdRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.view_product(&req.product_id))
    }

    #[tool(description = "Products related to a product, narrowed by the category filters.")]
    fn similar_products(&self, Parameters(req): Parameters<ProductIdRequest>) -> Result<CallToolResult, McpError> {
        respond(self.app()?.similar_products(&req.product_id))
    }

    #[tool(description = "Recommend foods for one cat: products containing any of its allergens are excluded, category filters apply, and cats on a diet only get foods with at most 15% fat.")]
    fn recommend_for_cat(&self, Parameters(req): Parameters<CatIdRequest>) -> Result<CallToolResult, McpError> {
        respond(self.app()?.recommend(&req.cat_id))
    }

    #[tool(description = "Add or remove a product from the compare list (max 3).")]
    fn toggle_compare(&self, Parameters(req): Parameters<ProductIdRequest>) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.toggle_compare(&req.product_id))
    }

    #[tool(description = "Compare the products in the compare list (2-3 needed). Returns {products, rows: [{label, values}]} with one value per product.")]
    fn compare_products(&self) -> Result<CallToolResult, McpError> {
        let mut app = self.app()?;
        respond(app.compare())
    }

    #[tool(description = "Action history of this session, newest first (max 50). Product and cat IDs are resolved to labels.")]
    fn get_history(&self) -> Result<CallToolResult, McpError> {
        respond(self.app()?.history())
    }

    #[tool(description = "Clear the action history.")]
    fn clear_history(&self) -> Result<CallToolResult, McpError> {
        match self.app()?.clear_history() {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text("History cleared")])),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(description = "Navigate to an app path and return the screen it opens (tagged by `view`). Search and product links do not add history entries.")]
    fn open_route(&self, Parameters(req): Parameters<OpenRouteRequest>) -> Result<CallToolResult, McpError> {
        let route = Route::parse(&req.path);
        let mut app = self.app()?;
        respond(app.open(&route))
    }

    #[tool(description = "List the whole food catalog (id, brand, formula, type, trust score, category flags).")]
    fn list_foods(&self) -> Result<CallToolResult, McpError> {
        let app = self.app()?;
        let listing: Vec<FoodListing> = app.catalog().products().iter().map(FoodListing::from).collect();
        json_result(&listing)
    }
}

#[tool_handler]
impl ServerHandler for KittyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn error_result(err: KittyError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}

/// Refused actions are tool errors carrying the user-facing message.
fn respond<T: Serialize>(result: kitty_core::Result<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => json_result(&value),
        Err(e) => {
            debug!(error = %e, "action refused");
            Ok(error_result(e))
        }
    }
}

fn parse_filter(s: &str) -> Result<FilterKey, McpError> {
    match s {
        "grainFree" | "grain_free" | "grain-free" => Ok(FilterKey::GrainFree),
        "holistic" => Ok(FilterKey::Holistic),
        "medical" => Ok(FilterKey::Medical),
        _ => Err(McpError::invalid_params(
            format!("Invalid filter '{}'. Must be: grainFree, holistic, medical", s),
            None,
        )),
    }
}

const INSTRUCTIONS: &str = r#"kitty is a cat-food finder. Users keep profiles for up to 8 cats (allergies, dislikes, weight-loss diet) and look for food that suits them.

## Workflow
1. `register` or `login`. Most actions need a logged-in user.
2. `add_cats` to create profiles, then `toggle_cat` to select the cats to check food against.
3. `search_foods` by brand or formula, `get_product` for details, `recommend_for_cat` for a per-cat shortlist.
4. `toggle_compare` 2-3 products, then `compare_products`.
5. `get_history` lists searches, product views and comparisons of this session.

## Allergies
An allergen matches when it appears as a case-insensitive substring of any ingredient ("beef" matches "beef broth"). Search results keep matching products and flag them; recommendations drop them. Dislikes are only reported, never filtered.

## Filters
`set_filters` / `toggle_filter` narrow search, similar products and recommendations to grain-free, holistic and/or medical food."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load();
    let app = KittyApp::from_config(&config)?;
    info!(
        data_dir = %config.data_dir.display(),
        products = app.catalog().products().len(),
        "starting kitty-mcp"
    );

    let service = KittyServer::new(app)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| error!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}
