mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use common::{incoming, outgoing, TestApp};

#[tokio::test]
async fn create_derives_net_income() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Marshall Epie").await?;

    let res = app
        .post(
            "/api/finance/mutate",
            json!({"sessionToken": token, "action": "create", "type": "incoming", "data": incoming(json!(100), "GoFundMe")}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["id"], res.body["record"]["id"]);
    assert_eq!(res.body["record"]["net_income"], "96.69");
    assert_eq!(res.body["record"]["created_by"], "Marshall Epie");

    let record = app.create(&token, "incoming", incoming(json!("100.00"), "Stripe")).await?;
    assert_eq!(record["net_income"], "100.00");
    Ok(())
}

#[tokio::test]
async fn missing_session_is_rejected_before_storage() -> Result<()> {
    let app = TestApp::new();
    let body = json!({"action": "create", "type": "outgoing", "data": outgoing(json!(5))});

    let res = app.post("/api/finance/mutate", body.clone()).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Session token is required");

    let mut with_bad_token = body;
    with_bad_token["sessionToken"] = json!("f".repeat(64));
    let res = app.post("/api/finance/mutate", with_bad_token).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.record_count(mepie_finance_api::types::FundKind::Outgoing).await, 0);
    Ok(())
}

#[tokio::test]
async fn expired_session_cannot_mutate() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Fitz Shrowder").await?;
    app.clock.advance(Duration::hours(8));

    let res = app
        .post(
            "/api/finance/mutate",
            json!({"sessionToken": token, "type": "outgoing", "data": outgoing(json!(5))}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid or expired session");
    Ok(())
}

#[tokio::test]
async fn bearer_header_carries_the_session() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Aruna Ramineni").await?;
    let auth = format!("Bearer {}", token);

    let res = app
        .request(
            Method::POST,
            "/api/finance/mutate",
            &[("authorization", auth.as_str())],
            Some(Body::from(json!({"type": "outgoing", "data": outgoing(json!(12.5))}).to_string())),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["record"]["amount"], "12.50");
    Ok(())
}

#[tokio::test]
async fn validation_failure_lists_every_problem() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Marshall Epie").await?;

    let res = app
        .post(
            "/api/finance/mutate",
            json!({
                "sessionToken": token,
                "action": "create",
                "type": "outgoing",
                "data": {"amount": -1, "category": "Snacks", "approved_by": "Marshall Epie"}
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["success"], false);

    let errors: Vec<&str> = res.body["errors"].as_array().unwrap().iter().filter_map(|e| e.as_str()).collect();
    assert_eq!(errors.len(), 5);
    assert!(errors.contains(&"date is required"));
    assert!(errors.contains(&"amount must be a non-negative number"));
    assert!(errors.contains(&"recipient is required"));
    assert!(errors.contains(&"purpose is required"));
    assert!(errors.iter().any(|e| e.starts_with("category must be one of")));
    Ok(())
}

#[tokio::test]
async fn stale_update_conflicts_then_fresh_update_lands() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Marshall Epie").await?;
    let record = app.create(&token, "outgoing", outgoing(json!(40))).await?;
    let t1 = record["updated_at"].as_str().unwrap().to_string();

    app.clock.advance(Duration::minutes(3));
    let res = app
        .send(
            Method::PUT,
            "/api/finance/mutate",
            json!({
                "sessionToken": token,
                "type": "outgoing",
                "id": record["id"],
                "data": outgoing(json!(45)),
                "expectedUpdatedAt": "2024-01-01T00:00:00Z"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["error"], "CONFLICT");
    assert_eq!(res.body["currentData"], record);

    let res = app
        .send(
            Method::PUT,
            "/api/finance/mutate",
            json!({
                "sessionToken": token,
                "type": "outgoing",
                "id": record["id"],
                "data": outgoing(json!(45)),
                "expectedUpdatedAt": t1
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["record"]["amount"], "45.00");
    assert_ne!(res.body["record"]["updated_at"], json!(t1));
    Ok(())
}

#[tokio::test]
async fn second_editor_with_same_version_conflicts_without_clock_moving() -> Result<()> {
    let app = TestApp::new();
    let marshall = app.login("Marshall Epie").await?;
    let aruna = app.login("Aruna Ramineni").await?;
    let record = app.create(&marshall, "outgoing", outgoing(json!(40))).await?;
    let t1 = record["updated_at"].clone();

    let edit = |token: &str, amount: i64| {
        json!({
            "sessionToken": token,
            "type": "outgoing",
            "id": record["id"],
            "data": outgoing(json!(amount)),
            "expectedUpdatedAt": t1
        })
    };

    let res = app.send(Method::PUT, "/api/finance/mutate", edit(marshall.as_str(), 41)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_ne!(res.body["record"]["updated_at"], t1);

    let res = app.send(Method::PUT, "/api/finance/mutate", edit(aruna.as_str(), 42)).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["currentData"]["amount"], "41.00");
    assert_eq!(res.body["currentData"]["updated_by"], "Marshall Epie");
    Ok(())
}

#[tokio::test]
async fn oversized_amount_is_a_validation_error_and_reads_still_work() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Marshall Epie").await?;

    for _ in 0..2 {
        let res = app
            .post(
                "/api/finance/mutate",
                json!({
                    "sessionToken": token,
                    "type": "incoming",
                    "data": incoming(json!("50000000000000000000000000000"), "Cash")
                }),
            )
            .await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["errors"], json!(["amount must not exceed 999999999999.99"]));
    }

    let res = app.get("/api/finance/data?type=summary").await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn delete_is_soft_and_blocks_further_edits() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Marshall Epie").await?;
    let record = app.create(&token, "incoming", incoming(json!(10), "Cash")).await?;

    let res = app
        .send(
            Method::DELETE,
            "/api/finance/mutate",
            json!({"sessionToken": token, "type": "incoming", "id": record["id"]}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["record"]["is_deleted"], true);
    assert_eq!(res.body["record"]["deleted_by"], "Marshall Epie");

    let res = app.get("/api/finance/data?type=incoming").await?;
    assert_eq!(res.body["summary"]["count"], 0);

    let res = app
        .send(
            Method::PUT,
            "/api/finance/mutate",
            json!({"sessionToken": token, "type": "incoming", "id": record["id"], "data": incoming(json!(11), "Cash")}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(
            Method::DELETE,
            "/api/finance/mutate",
            json!({"sessionToken": token, "type": "incoming", "id": Uuid::new_v4()}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn batch_reports_partial_success() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Aruna Ramineni").await?;

    let operations = json!([
        outgoing(json!(1)),
        outgoing(json!(2)),
        {"amount": 3, "approved_by": "Aruna Ramineni"},
        outgoing(json!(4)),
        outgoing(json!(5))
    ]);
    let res = app
        .post(
            "/api/finance/mutate",
            json!({"sessionToken": token, "action": "batch", "type": "outgoing", "operations": operations}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["processed"], 4);
    assert_eq!(res.body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["errors"][0]["index"], 2);

    let res = app.get("/api/finance/data?type=outgoing").await?;
    assert_eq!(res.body["summary"]["count"], 4);
    assert_eq!(res.body["summary"]["total"], "12.00");
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() -> Result<()> {
    let app = TestApp::new();
    let token = app.login("Fitz Shrowder").await?;

    let res = app
        .post("/api/finance/mutate", json!({"sessionToken": token, "action": "create", "type": "incoming"}))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "type and data are required");

    let res = app
        .post("/api/finance/mutate", json!({"sessionToken": token, "action": "upsert"}))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.request(Method::PATCH, "/api/finance/mutate", &[], None).await?;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
