use kitty_core::accounts::{FileSessionStore, FileUserRepository, Registration, SESSION_KEY, USERS_KEY};
use kitty_core::app::{KittyApp, Screen};
use kitty_core::catalog::Catalog;
use kitty_core::config::Config;
use kitty_core::history::HISTORY_LIMIT;
use kitty_core::matching::{find_allergen_conflicts, is_suitable};
use kitty_core::profiles::CatDraft;
use kitty_core::routes::Route;
use kitty_core::storage::JsonStore;
use kitty_core::{AllergyOption, CatProfile, KittyError};
use rstest::{fixture, rstest};
use tempfile::TempDir;

type FileApp = KittyApp<FileUserRepository, FileSessionStore>;

#[fixture]
fn data_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn open(dir: &TempDir) -> FileApp {
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        catalog_path: None,
    };
    KittyApp::from_config(&config).unwrap()
}

fn alice() -> Registration {
    Registration {
        email: "alice@x.com".into(),
        username: "alice".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    }
}

fn tom() -> CatDraft {
    CatDraft {
        name: Some("Tom".into()),
        allergies: Some(vec![AllergyOption::Fish]),
        ..Default::default()
    }
}

#[rstest]
fn registering_alice_twice(data_dir: TempDir) {
    let mut app = open(&data_dir);
    let user = app.register(&alice()).unwrap().clone();
    assert!(user.cats.is_empty());

    app.logout();
    let err = app.register(&alice()).unwrap_err();
    assert!(matches!(err, KittyError::DuplicateAccount));
    assert_eq!(err.to_string(), "This username or email is already registered");
}

#[rstest]
fn session_and_cats_survive_restart(data_dir: TempDir) {
    {
        let mut app = open(&data_dir);
        app.register(&alice()).unwrap();
        app.add_cats(vec![tom()]).unwrap();
    }
    let store = JsonStore::new(data_dir.path());
    assert!(store.path(USERS_KEY).exists());
    assert!(store.path(SESSION_KEY).exists());

    let mut app = open(&data_dir);
    let user = app.user().expect("session restored");
    assert_eq!(user.username, "alice");
    assert_eq!(user.cats.len(), 1);
    assert_eq!(user.cats[0].allergies, vec![AllergyOption::Fish]);

    app.logout();
    assert!(!store.path(SESSION_KEY).exists());
    assert!(open(&data_dir).user().is_none());
}

#[rstest]
fn session_for_deleted_user_is_dropped(data_dir: TempDir) {
    {
        let mut app = open(&data_dir);
        app.register(&alice()).unwrap();
    }
    std::fs::remove_file(JsonStore::new(data_dir.path()).path(USERS_KEY)).unwrap();

    let app = open(&data_dir);
    assert!(app.user().is_none());
}

#[rstest]
fn tom_and_orijen() {
    let catalog = Catalog::builtin().unwrap();
    let orijen = catalog.get("2").unwrap();
    let tom: CatProfile = serde_json::from_value(serde_json::json!({
        "id": "tom",
        "name": "Tom",
        "allergies": ["fish"],
    }))
    .unwrap();

    assert_eq!(find_allergen_conflicts(&tom, [orijen]), vec!["fish"]);
    assert!(!is_suitable(&tom, orijen));
}

#[rstest]
#[case("Royal Canin", &["Kitten", "Urinary Care"])]
#[case("royal canin", &["Kitten", "Urinary Care"])]
#[case("Grain-Free", &["Grain-Free Indoor"])]
#[case("purina", &[])]
fn searching_the_catalog(data_dir: TempDir, #[case] query: &str, #[case] formulas: &[&str]) {
    let mut app = open(&data_dir);
    let outcome = app.search(query).unwrap();
    let found: Vec<&str> = outcome.results.iter().map(|p| p.formula.as_str()).collect();
    assert_eq!(found, formulas);
}

#[rstest]
fn history_is_capped_and_newest_first(data_dir: TempDir) {
    let mut app = open(&data_dir);
    app.register(&alice()).unwrap();
    for i in 0..(HISTORY_LIMIT + 5) {
        app.search(&format!("query {i}")).unwrap();
    }
    let history = app.history().unwrap();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0].item.query.as_deref(), Some("query 54"));

    app.clear_history().unwrap();
    assert!(app.history().unwrap().is_empty());
}

#[rstest]
fn compare_from_route_and_from_picks(data_dir: TempDir) {
    let mut app = open(&data_dir);
    app.register(&alice()).unwrap();

    for id in ["2", "4", "6"] {
        assert!(app.toggle_compare(id).unwrap().selected);
    }
    let before = app.compare_ids().to_vec();
    assert!(matches!(app.toggle_compare("1"), Err(KittyError::CompareLimit)));
    assert_eq!(app.compare_ids(), before.as_slice());

    let table = app.compare().unwrap();
    let route = Route::Compare { ids: before.clone() };
    let Screen::Compare(reopened) = app.open(&Route::parse(&route.path())).unwrap() else {
        panic!("expected compare screen");
    };
    assert_eq!(reopened, table);
}

#[rstest]
fn weight_loss_cat_gets_lean_food(data_dir: TempDir) {
    let mut app = open(&data_dir);
    app.register(&alice()).unwrap();
    let draft = CatDraft {
        name: Some("Chonk".into()),
        wants_weight_loss: Some(true),
        allergies_other: Some("Corn, wheat".into()),
        ..Default::default()
    };
    let cat_id = app.add_cats(vec![draft]).unwrap()[0].id.clone();

    let rec = app.recommend(&cat_id).unwrap();
    let ids: Vec<&str> = rec.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "5"]);
    for id in ids {
        let product = app.catalog().get(id).unwrap();
        assert!(product.nutrition.fat <= 15.0);
        assert!(!product.ingredients.iter().any(|i| i == "corn" || i == "wheat"));
    }
}
