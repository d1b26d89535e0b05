mod common;

use anyhow::Result;
use reqwest::{header, redirect, StatusCode};

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let health = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    let body = health.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["status"], "ok");

    let root = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(root.status(), StatusCode::OK);
    assert_eq!(root.json::<serde_json::Value>().await?["success"], true);

    Ok(())
}

#[tokio::test]
async fn signup_then_browse_with_cookie() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::builder().redirect(redirect::Policy::none()).build()?;

    let res = client
        .post(format!("{}/signup", server.base_url))
        .form(&[
            ("name", "Spawned Tech"),
            ("email", "spawned-tech@example.org"),
            ("password", common::PASSWORD),
            ("password_confirm", common::PASSWORD),
            ("role", "Technician"),
        ])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/devices"));

    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("session cookie");

    let devices = client
        .get(format!("{}/devices?limit=5", server.base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(devices.status(), StatusCode::OK);

    let doctors = client
        .get(format!("{}/doctors", server.base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(doctors.status(), StatusCode::FORBIDDEN);

    let anonymous = client.get(format!("{}/home", server.base_url)).send().await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
