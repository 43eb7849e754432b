//! Service-level tests against in-memory port implementations.

mod common;

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing_test::traced_test;

use nutrition::contract::model::{DailyEntry, FoodItem, Goals, NewEntry, User};
use nutrition::domain::clock::FixedClock;
use nutrition::domain::error::DomainError;
use nutrition::domain::repo::{
    FoodCatalogRepository, GoalRepository, IntakeRepository, PersistenceError, StoredUser,
    UserDirectoryRepository,
};
use nutrition::domain::service::{Repositories, Service, ServiceConfig};

/// One fake backing every port.
#[derive(Default)]
struct MockStore {
    /// Id reported by `find_id_by_username`; lets a test re-point a session.
    directory_id: AtomicI64,
    goals: Mutex<Option<(i64, Goals)>>,
    entries: Mutex<Vec<(i64, i64, NaiveDate, f64)>>,
    catalog_queries: AtomicUsize,
    fail_reads: Mutex<Option<PersistenceError>>,
    fail_writes: Mutex<Option<PersistenceError>>,
}

impl MockStore {
    fn new() -> Arc<Self> {
        let store = Self::default();
        store.directory_id.store(1, Ordering::SeqCst);
        Arc::new(store)
    }

    fn read_failure(&self) -> Result<(), PersistenceError> {
        match self.fail_reads.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_failure(&self) -> Result<(), PersistenceError> {
        match self.fail_writes.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl UserDirectoryRepository for MockStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredUser>, PersistenceError> {
        self.read_failure()?;
        Ok((username == "alice").then(|| StoredUser {
            user: User {
                id: 1,
                username: "alice".into(),
            },
            password_hash: common::PW1_HASH.clone(),
        }))
    }

    async fn find_id_by_username(&self, username: &str) -> Result<Option<i64>, PersistenceError> {
        self.read_failure()?;
        let id = self.directory_id.load(Ordering::SeqCst);
        Ok((username == "alice" && id > 0).then_some(id))
    }
}

#[async_trait::async_trait]
impl GoalRepository for MockStore {
    async fn upsert(&self, user_id: i64, goals: &Goals) -> Result<(), PersistenceError> {
        self.write_failure()?;
        *self.goals.lock().unwrap() = Some((user_id, goals.clone()));
        Ok(())
    }

    async fn find(&self, user_id: i64) -> Result<Option<Goals>, PersistenceError> {
        self.read_failure()?;
        Ok(self
            .goals
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, g)| g.clone()))
    }
}

#[async_trait::async_trait]
impl FoodCatalogRepository for MockStore {
    async fn list_by_category(&self, category: &str) -> Result<Vec<FoodItem>, PersistenceError> {
        self.catalog_queries.fetch_add(1, Ordering::SeqCst);
        self.read_failure()?;
        Ok(if category == "glucide" {
            vec![FoodItem {
                id: 7,
                name: "Riz".into(),
                category: "glucide".into(),
            }]
        } else {
            Vec::new()
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FoodItem>, PersistenceError> {
        self.read_failure()?;
        Ok((id == 7).then(|| FoodItem {
            id: 7,
            name: "Riz".into(),
            category: "glucide".into(),
        }))
    }
}

#[async_trait::async_trait]
impl IntakeRepository for MockStore {
    async fn append(
        &self,
        user_id: i64,
        food_item_id: i64,
        entry_date: NaiveDate,
        quantity_grams: f64,
    ) -> Result<(), PersistenceError> {
        self.write_failure()?;
        self.entries
            .lock()
            .unwrap()
            .push((user_id, food_item_id, entry_date, quantity_grams));
        Ok(())
    }

    async fn for_day(
        &self,
        user_id: i64,
        entry_date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, PersistenceError> {
        self.read_failure()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.0 == user_id && e.2 == entry_date)
            .map(|(i, e)| DailyEntry {
                id: i as i64 + 1,
                food_item_id: e.1,
                food_name: "Riz".into(),
                entry_date: e.2,
                quantity_grams: e.3,
            })
            .collect())
    }
}

fn service_over(store: &Arc<MockStore>) -> Service {
    let repos = Repositories {
        users: store.clone(),
        goals: store.clone(),
        foods: store.clone(),
        intake: store.clone(),
    };
    Service::new(
        repos,
        Arc::new(FixedClock(common::today())),
        ServiceConfig::default(),
    )
}

#[traced_test]
#[tokio::test]
async fn authenticate_emits_spans() {
    let store = MockStore::new();
    let service = service_over(&store);

    let session = service.authenticate("alice", "pw1").await.unwrap();
    assert_eq!(session.user_id(), 1);

    assert_eq!(
        service.authenticate("alice", "nope").await.unwrap_err(),
        DomainError::InvalidCredentials
    );
    assert_eq!(
        service.authenticate("mallory", "pw1").await.unwrap_err(),
        DomainError::InvalidCredentials
    );
}

#[traced_test]
#[tokio::test]
async fn save_goals_emits_spans() {
    let store = MockStore::new();
    let service = service_over(&store);
    let session = service.authenticate("alice", "pw1").await.unwrap();

    let goals = Goals {
        calories: Some(2000.0),
        ..Default::default()
    };
    service.save_goals(&session, goals.clone()).await.unwrap();

    assert_eq!(store.goals.lock().unwrap().clone(), Some((1, goals.clone())));
    assert_eq!(service.load_goals(&session).await.unwrap(), Some(goals));
}

#[traced_test]
#[tokio::test]
async fn write_failure_is_reported_not_swallowed() {
    let store = MockStore::new();
    let service = service_over(&store);
    let session = service.authenticate("alice", "pw1").await.unwrap();

    *store.fail_writes.lock().unwrap() = Some(PersistenceError::query("constraint violated"));
    let err = service
        .save_goals(&session, Goals::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::WriteFailed { .. }), "{err:?}");

    *store.fail_writes.lock().unwrap() = Some(PersistenceError::connection("refused"));
    let err = service
        .log_entry(
            &session,
            NewEntry {
                food_item_id: Some(7),
                quantity_grams: Some(100.0),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ConnectionUnavailable { .. }), "{err:?}");
}

#[traced_test]
#[tokio::test]
async fn read_failures_are_not_empty_results() {
    let store = MockStore::new();
    let service = service_over(&store);

    *store.fail_reads.lock().unwrap() = Some(PersistenceError::connection("timed out"));
    let err = service.list_by_category(Some("glucide")).await.unwrap_err();
    assert!(matches!(err, DomainError::ConnectionUnavailable { .. }));

    *store.fail_reads.lock().unwrap() = Some(PersistenceError::query("no such table"));
    let err = service.list_by_category(Some("glucide")).await.unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }));
}

#[traced_test]
#[tokio::test]
async fn missing_category_skips_the_catalog() {
    let store = MockStore::new();
    let service = service_over(&store);

    assert!(service.list_by_category(None).await.unwrap().is_empty());
    assert!(service.list_by_category(Some("")).await.unwrap().is_empty());
    assert_eq!(store.catalog_queries.load(Ordering::SeqCst), 0);

    let items = service.list_by_category(Some("glucide")).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(store.catalog_queries.load(Ordering::SeqCst), 1);
}

#[traced_test]
#[tokio::test]
async fn log_entry_is_dated_by_the_clock() {
    let store = MockStore::new();
    let service = service_over(&store);
    let session = service.authenticate("alice", "pw1").await.unwrap();

    let logged = service
        .log_entry(
            &session,
            NewEntry {
                food_item_id: Some(7),
                quantity_grams: Some(120.0),
            },
        )
        .await
        .unwrap();
    assert_eq!(logged.entry_date, common::today());
    assert_eq!(
        store.entries.lock().unwrap().as_slice(),
        &[(1, 7, common::today(), 120.0)]
    );

    let today = service
        .entries_for_day(&session, common::today())
        .await
        .unwrap();
    assert_eq!(today.len(), 1);
}

#[traced_test]
#[tokio::test]
async fn validation_runs_before_any_query() {
    let store = MockStore::new();
    let service = service_over(&store);
    let session = service.authenticate("alice", "pw1").await.unwrap();

    // Reads would fail, so reaching the store would change the error kind.
    *store.fail_reads.lock().unwrap() = Some(PersistenceError::connection("down"));
    let err = service
        .log_entry(
            &session,
            NewEntry {
                food_item_id: Some(7),
                quantity_grams: Some(0.0),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::validation("quantity", "must be a positive number of grams")
    );

    let err = service
        .save_goals(
            &session,
            Goals {
                sodium: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "sodium"));
}

#[traced_test]
#[tokio::test]
async fn session_pointing_at_another_id_is_invalid() {
    let store = MockStore::new();
    let service = service_over(&store);
    let session = service.authenticate("alice", "pw1").await.unwrap();

    store.directory_id.store(2, Ordering::SeqCst);
    assert_eq!(
        service.load_goals(&session).await.unwrap_err(),
        DomainError::session_invalid("alice")
    );

    store.directory_id.store(0, Ordering::SeqCst);
    assert_eq!(
        service.entries_for_day(&session, common::today()).await.unwrap_err(),
        DomainError::session_invalid("alice")
    );
}
