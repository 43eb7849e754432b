#![cfg(feature = "integration")]
//! MySQL/MariaDB dialect check: migrations, goal upsert and intake log.

mod common;

use std::sync::Arc;

use anyhow::Result;
use dbkit::{build_db_handle, DbConnConfig, Param};

use nutrition::contract::model::{Goals, NewEntry};

#[tokio::test]
async fn mysql_end_to_end() -> Result<()> {
    let dut = common::bring_up_mysql().await?;
    let db = Arc::new(
        build_db_handle(DbConnConfig {
            dsn: Some(dut.url.clone()),
            ..Default::default()
        })
        .await?,
    );
    let module = common::module_on(db.clone()).await?;
    // Migrations are idempotent.
    module.migrate().await?;

    let alice = common::seed_alice_and_catalog(&db).await?;
    let api = module.client();
    let session = api.authenticate("alice", "pw1").await?;
    assert_eq!(session.user_id(), alice);

    for calories in [2000.0, 1800.0] {
        let goals = Goals {
            calories: Some(calories),
            ..Default::default()
        };
        api.save_goals(&session, goals).await?;
    }
    let n = common::count(
        &db,
        "SELECT COUNT(*) AS n FROM goal WHERE user_id = ?",
        &[Param::from(alice)],
    )
    .await?;
    assert_eq!(n, 1);
    assert_eq!(
        api.load_goals(&session).await?.and_then(|g| g.calories),
        Some(1800.0)
    );

    let proteins = api.list_food_options(Some("protéine")).await?;
    assert_eq!(proteins.len(), 2);
    api.log_food(
        &session,
        NewEntry {
            food_item_id: Some(proteins[0].id),
            quantity_grams: Some(120.0),
        },
    )
    .await?;
    let entries = api.entries_for_day(&session, common::today()).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].quantity_grams, 120.0);
    Ok(())
}
