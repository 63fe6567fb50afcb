use dotenvy::dotenv;
use std::env;
use tokio_postgres::NoTls;

pub fn database_url() -> Option<String> {
    dotenv().ok();

    env::var("TEST_DATABASE_URL").ok()
}

/// Creates the test database when it does not exist yet
pub async fn setup(database_url: &str) {
    if tokio_postgres::connect(database_url, NoTls).await.is_ok() {
        return;
    }

    let (db_name, db_raw_url) = get_db_name_and_raw_url(database_url);
    let (client, conn) = tokio_postgres::connect(&db_raw_url, NoTls)
        .await
        .unwrap_or_else(|_| panic!("Error connecting to {db_raw_url}"));
    tokio::spawn(conn);

    // Concurrent tests race to create it
    let _ = client.batch_execute(&format!(r#"CREATE DATABASE "{db_name}""#)).await;
}

fn get_db_name_and_raw_url(url: &str) -> (String, String) {
    let mut url_split = url.split('/').collect::<Vec<&str>>();

    let db_name = url_split
        .pop()
        .expect("DATABASE NAME needs to be specified. See: sample.env");
    let db_raw_url = url_split.join("/");

    (db_name.to_string(), db_raw_url)
}
