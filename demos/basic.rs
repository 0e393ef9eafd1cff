use std::sync::Arc;

use dashboard_http::{ApiClient, FileStorage, SessionStore};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("DASHBOARD_API_URL")?;
    let username = std::env::var("DASHBOARD_USERNAME")?;
    let password = std::env::var("DASHBOARD_PASSWORD")?;

    let session = Arc::new(SessionStore::restore(FileStorage::new(".dashboard-session.json"))?);
    let api = ApiClient::new(url, session)
        .with_login_redirect(|path: &str| eprintln!("session expired, sign in again at {path}"));

    if !api.session().is_authenticated() {
        let login: LoginResponse = api
            .post("/auth/login", &json!({ "username": username, "password": password }))
            .await?;
        api.login(login.token)?;
    }

    let questions: serde_json::Value = api
        .get_with_query("/questions", &json!({ "page": 1, "size": 20 }))
        .await?;
    println!("{questions:#}");

    Ok(())
}
