use std::{fmt, net::SocketAddr, sync::Arc};

use anyhow::Context;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use travelviz::{
    auth::{self, AuthenticatedUser},
    badges,
    config::AppConfig,
    error::AppError,
    insights,
    models::trip::{Expense, ExpenseCategory, Trip},
    services::media::MediaService,
    state::AppState,
    store::{FileBackend, JsonStore},
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    registered_user: Option<AuthenticatedUser>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn username(&self) -> &str {
        &self
            .registered_user
            .as_ref()
            .expect("user must be registered first")
            .username
    }

    async fn user_trips(&self) -> Vec<Trip> {
        let all = self
            .app_state()
            .store
            .load_trips()
            .await
            .expect("load trips");
        all.get(self.username()).cloned().unwrap_or_default()
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let data_root = root.path().join("data");
        let media_root = root.path().join("profile_pics");

        let config = AppConfig {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_root: data_root.clone(),
            media_root: media_root.clone(),
            cookie_secret: "bdd-cookie-secret".into(),
        };

        let backend = FileBackend::new(data_root);
        backend.ensure_structure().await?;
        let store = JsonStore::new(Arc::new(backend));

        let media = MediaService::new(media_root);
        media.ensure_structure().await?;

        let app = AppState::new(config, store, media);
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.registered_user = None;
}

#[given(regex = r#"^a registered user "([^"]+)" with password "([^"]+)"$"#)]
async fn given_registered_user(world: &mut AppWorld, username: String, password: String) {
    register_user(world, username, password).await;
}

#[when(regex = r#"^I register a user "([^"]+)" with password "([^"]+)"$"#)]
async fn when_register_user(world: &mut AppWorld, username: String, password: String) {
    register_user(world, username, password).await;
}

#[then(regex = r#"^I can authenticate as "([^"]+)" using password "([^"]+)"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, username: String, password: String) {
    let authed = auth::authenticate_user(world.app_state(), &username, &password)
        .await
        .expect("authentication");
    assert_eq!(authed.username, username);
}

#[then(regex = r#"^authenticating as "([^"]+)" with password "([^"]+)" fails$"#)]
async fn then_authentication_fails(world: &mut AppWorld, username: String, password: String) {
    let err = auth::authenticate_user(world.app_state(), &username, &password)
        .await
        .expect_err("authentication should fail");
    assert!(matches!(err, AppError::Unauthorized));
}

#[then(regex = r#"^registering another user named "([^"]+)" fails with a duplicate warning$"#)]
async fn then_duplicate_rejected(world: &mut AppWorld, username: String) {
    let err = auth::register_user(world.app_state(), &username, "whatever")
        .await
        .expect_err("duplicate signup should fail");
    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("exists"), "unexpected message: {msg}"),
        other => panic!("expected a validation warning, got {other:?}"),
    }
}

#[when(regex = r#"^I plan a trip to "([^"]+)" starting on "([^"]+)"$"#)]
async fn when_plan_trip(world: &mut AppWorld, destination: String, start_date: String) {
    let username = world.username().to_string();
    let state = world.app_state();
    let mut all = state.store.load_trips().await.expect("load trips");
    all.entry(username).or_default().push(Trip {
        destination,
        start_date,
        ..Trip::default()
    });
    state.store.save_trips(&all).await.expect("save trips");
}

#[when(
    regex = r#"^I add a "([^"]+)" expense of ([0-9.]+) described "([^"]+)" to the latest trip$"#
)]
async fn when_add_expense(
    world: &mut AppWorld,
    category: String,
    amount: f64,
    description: String,
) {
    let username = world.username().to_string();
    let state = world.app_state();
    let mut all = state.store.load_trips().await.expect("load trips");
    let trips = all.entry(username).or_default();
    let trip = trips.last_mut().expect("at least one trip expected");
    trip.expenses.push(Expense {
        category: ExpenseCategory::from_name(&category),
        description,
        amount,
    });
    state.store.save_trips(&all).await.expect("save trips");
}

#[then(regex = r"^the user has (\d+) stored trips$")]
async fn then_user_has_trips(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.user_trips().await.len(), expected);
}

#[then(regex = r#"^the user's badge is "([^"]+)"$"#)]
async fn then_user_badge_is(world: &mut AppWorld, expected: String) {
    let count = world.user_trips().await.len() as u32;
    assert_eq!(badges::badge_for(count).name, expected);
}

#[then(regex = r"^the user's total expenses are ([0-9.]+)$")]
async fn then_total_expenses(world: &mut AppWorld, expected: f64) {
    let trips = world.user_trips().await;
    let total = insights::total_expenses(&trips);
    assert!(
        (total - expected).abs() < 1e-9,
        "expected {expected}, got {total}"
    );
}

#[then(regex = r#"^the most visited destination is "([^"]+)"$"#)]
async fn then_most_visited(world: &mut AppWorld, expected: String) {
    let trips = world.user_trips().await;
    assert_eq!(insights::most_visited_destination(&trips), expected);
}

async fn register_user(world: &mut AppWorld, username: String, password: String) {
    let created = auth::register_user(world.app_state(), &username, &password)
        .await
        .expect("register user");
    world.registered_user = Some(created);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
