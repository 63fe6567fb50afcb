use std::future::Future;

use chainrelay::PostgresRepo;

use crate::db;

/// Runs `test_fn` against a migrated Postgres store.
/// Skipped when `TEST_DATABASE_URL` is not set.
pub async fn run_test<TestFn, Fut>(test_fn: TestFn)
where
    TestFn: FnOnce(PostgresRepo) -> Fut,
    Fut: Future<Output = ()>,
{
    let Some(database_url) = db::database_url() else {
        eprintln!("TEST_DATABASE_URL is not set, skipping Postgres test");
        return;
    };

    db::setup(&database_url).await;
    // Concurrent tests race to create the tables, the loser retries against existing ones
    let repo = match PostgresRepo::new(&database_url).await {
        Ok(repo) => repo,
        Err(_) => PostgresRepo::new(&database_url).await.unwrap(),
    };

    test_fn(repo).await;
}
