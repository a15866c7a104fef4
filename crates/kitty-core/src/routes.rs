//! Navigation targets (`/app?search=...`, `/compare?ids=1,2`) and what they point at.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "camelCase")]
pub enum Route {
    Login,
    Register,
    AddCats,
    EditCat {
        #[serde(rename = "catId")]
        cat_id: String,
    },
    /// The finder. `search` wins when both seeds are given.
    App {
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        product: Option<String>,
    },
    History,
    Compare {
        ids: Vec<String>,
    },
    NotFound {
        path: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RouteQuery {
    search: Option<String>,
    product: Option<String>,
    ids: Option<String>,
}

#[derive(Serialize)]
struct AppQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a str>,
}

impl Route {
    /// Parse `path?query`. Unknown paths become `NotFound`, never an error.
    pub fn parse(target: &str) -> Route {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query: RouteQuery = serde_urlencoded::from_str(query).unwrap_or_else(|e| {
            debug!(query, error = %e, "ignoring unparseable route query");
            RouteQuery::default()
        });

        if !path.is_empty() && !path.starts_with('/') {
            return Route::NotFound {
                path: path.to_string(),
            };
        }
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();
        match segments.as_slice() {
            [] => Route::Login,
            ["register"] => Route::Register,
            ["cats", "add"] => Route::AddCats,
            ["cats", "edit", cat_id] if !cat_id.is_empty() => Route::EditCat {
                cat_id: cat_id.to_string(),
            },
            ["app"] => {
                let search = non_blank(query.search);
                let product = if search.is_some() { None } else { non_blank(query.product) };
                Route::App { search, product }
            }
            ["history"] => Route::History,
            ["compare"] => Route::Compare {
                ids: query
                    .ids
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            _ => Route::NotFound {
                path: path.to_string(),
            },
        }
    }

    /// The navigation target for this route; `Route::parse` reads it back.
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::Register => "/register".to_string(),
            Route::AddCats => "/cats/add".to_string(),
            Route::EditCat { cat_id } => format!("/cats/edit/{}", cat_id),
            Route::App { search, product } => {
                let query = AppQuery {
                    search: search.as_deref(),
                    product: product.as_deref(),
                };
                match serde_urlencoded::to_string(&query) {
                    Ok(q) if !q.is_empty() => format!("/app?{}", q),
                    _ => "/app".to_string(),
                }
            }
            Route::History => "/history".to_string(),
            Route::Compare { ids } => format!("/compare?ids={}", ids.join(",")),
            Route::NotFound { path } => path.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", Route::Login)]
    #[case("", Route::Login)]
    #[case("/register", Route::Register)]
    #[case("/cats/add", Route::AddCats)]
    #[case("/cats/edit/abc123", Route::EditCat { cat_id: "abc123".into() })]
    #[case("/history/", Route::History)]
    #[case("/app", Route::App { search: None, product: None })]
    #[case("/app?search=Royal+Canin", Route::App { search: Some("Royal Canin".into()), product: None })]
    #[case("/app?product=3", Route::App { search: None, product: Some("3".into()) })]
    #[case("/app?search=orijen&product=3", Route::App { search: Some("orijen".into()), product: None })]
    #[case("/app?search=", Route::App { search: None, product: None })]
    #[case("/compare?ids=1,2,,3", Route::Compare { ids: vec!["1".into(), "2".into(), "3".into()] })]
    #[case("/compare", Route::Compare { ids: vec![] })]
    #[case("/cats/edit/", Route::NotFound { path: "/cats/edit/".into() })]
    #[case("/nope", Route::NotFound { path: "/nope".into() })]
    #[case("history", Route::NotFound { path: "history".into() })]
    #[case("app?search=x", Route::NotFound { path: "app".into() })]
    #[case("?search=x", Route::Login)]
    fn test_parse(#[case] target: &str, #[case] expected: Route) {
        assert_eq!(Route::parse(target), expected);
    }

    #[test]
    fn test_path_reads_back() {
        for route in [
            Route::App { search: Some("Hill's Science".into()), product: None },
            Route::Compare { ids: vec!["1".into(), "5".into()] },
            Route::EditCat { cat_id: "c1".into() },
            Route::Login,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_serializes_with_route_tag() {
        let json = serde_json::to_value(Route::EditCat { cat_id: "c1".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"route": "editCat", "catId": "c1"}));
    }
}
