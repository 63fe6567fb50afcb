use chainrelay::PostgresRepo;
use chainrelay_tests::db;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match db::database_url() {
        Some(database_url) => {
            db::setup(&database_url).await;
            PostgresRepo::new(&database_url).await.unwrap();

            println!("Test database is ready");
        }
        None => println!("TEST_DATABASE_URL is not set, Postgres tests will be skipped"),
    }
}
