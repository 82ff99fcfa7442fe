#[cfg(test)]
mod integration_tests {
    use crate::handlers::devices::CreateDeviceRequest;
    use crate::handlers::monthly_budgets::{
        CreateMonthlyBudgetRequest, UpdateMonthlyBudgetRequest,
    };
    use crate::handlers::settings::SettingRequest;
    use crate::handlers::transactions::{CreateTransactionRequest, UpdateTransactionRequest};
    use crate::test_utils::test_utils::{setup_test_app, TEST_DEVICE_ID};
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::{TestRequest, TestServer};
    use chrono::{DateTime, TimeZone, Utc};
    use model::entities::transaction::TransactionKind;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn authed(request: TestRequest) -> TestRequest {
        request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer test-api-key"),
        )
    }

    fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    /// Parse a JSON field that carries a decimal rendered as a string.
    fn dec_field(value: &serde_json::Value, field: &str) -> Decimal {
        dec(value[field].as_str().unwrap_or_else(|| {
            panic!("field '{}' missing or not a string in {}", field, value)
        }))
    }

    async fn post_transaction(
        server: &TestServer,
        name: &str,
        amount: &str,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> serde_json::Value {
        let request = CreateTransactionRequest {
            device_id: TEST_DEVICE_ID.to_string(),
            name: name.to_string(),
            amount: dec(amount),
            kind,
            timestamp,
        };
        let response = authed(server.post("/transactions")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn post_budget(server: &TestServer, month_year: &str, amount: &str) -> serde_json::Value {
        let request = CreateMonthlyBudgetRequest {
            month_year: month_year.to_string(),
            budget_amount: dec(amount),
            rollover_enabled: None,
        };
        let response = authed(server.post("/monthly-budgets")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_app_info_is_public() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Budget Tracker API");
        assert!(body["version"].as_str().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_protected_routes_require_api_key() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // No header
        let response = server.get("/transactions").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Wrong token
        let response = server
            .get("/transactions")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer wrong-key"),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Correct token
        let response = authed(server.get("/transactions")).await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_transaction() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let body =
            post_transaction(&server, "Groceries", "400", TransactionKind::Withdraw, ts(2024, 6, 10, 12))
                .await;

        assert_eq!(body["name"], "Groceries");
        assert_eq!(body["device_id"], TEST_DEVICE_ID);
        assert_eq!(body["kind"], "withdraw");
        assert_eq!(dec_field(&body, "amount"), dec("400"));
        // The seeded device's username is denormalized onto the response
        assert_eq!(body["username"], "tester");
        assert!(body["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = CreateTransactionRequest {
            device_id: TEST_DEVICE_ID.to_string(),
            name: "Bogus".to_string(),
            amount: dec("-5"),
            kind: TransactionKind::Withdraw,
            timestamp: ts(2024, 6, 10, 12),
        };
        let response = authed(server.post("/transactions")).json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "NEGATIVE_AMOUNT");
    }

    #[tokio::test]
    async fn test_month_filter_and_ordering() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_transaction(&server, "May", "10", TransactionKind::Withdraw, ts(2024, 5, 20, 12)).await;
        post_transaction(&server, "June early", "20", TransactionKind::Withdraw, ts(2024, 6, 1, 8)).await;
        post_transaction(&server, "June late", "30", TransactionKind::Withdraw, ts(2024, 6, 28, 8)).await;
        post_transaction(&server, "July", "40", TransactionKind::Withdraw, ts(2024, 7, 2, 12)).await;

        let response = authed(server.get("/transactions?month_year=2024-06")).await;
        response.assert_status(StatusCode::OK);
        let body: Vec<serde_json::Value> = response.json();

        // Only June, newest first
        let names: Vec<&str> = body.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["June late", "June early"]);
    }

    #[tokio::test]
    async fn test_month_filter_respects_timezone() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // 23:00 UTC on June 30 is already July 1st in Prague (UTC+2 in summer)
        post_transaction(
            &server,
            "Midnight snack",
            "12",
            TransactionKind::Withdraw,
            ts(2024, 6, 30, 23),
        )
        .await;

        let response =
            authed(server.get("/transactions?month_year=2024-07&timezone=Europe/Prague")).await;
        response.assert_status(StatusCode::OK);
        let body: Vec<serde_json::Value> = response.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["name"], "Midnight snack");
        // Rendered in the requested timezone
        assert!(body[0]["timestamp"].as_str().unwrap().starts_with("2024-07-01T01:00:00"));

        let response =
            authed(server.get("/transactions?month_year=2024-06&timezone=Europe/Prague")).await;
        response.assert_status(StatusCode::OK);
        let body: Vec<serde_json::Value> = response.json();
        assert!(body.is_empty());

        // In plain UTC the transaction still belongs to June
        let response = authed(server.get("/transactions?month_year=2024-06")).await;
        let body: Vec<serde_json::Value> = response.json();
        assert_eq!(body.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_timezone_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response =
            authed(server.get("/transactions?month_year=2024-06&timezone=Mars/Olympus")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "UNKNOWN_TIMEZONE");
    }

    #[tokio::test]
    async fn test_oldest_next_previous_navigation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let first =
            post_transaction(&server, "first", "1", TransactionKind::Withdraw, ts(2024, 6, 1, 9)).await;
        post_transaction(&server, "second", "2", TransactionKind::Withdraw, ts(2024, 6, 5, 9)).await;
        let third =
            post_transaction(&server, "third", "3", TransactionKind::Withdraw, ts(2024, 6, 9, 9)).await;

        let response = authed(server.get("/transactions/oldest")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "first");

        let response =
            authed(server.get(&format!("/transactions/next/{}", first["id"]))).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "second");

        let response =
            authed(server.get(&format!("/transactions/previous/{}", third["id"]))).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "second");

        // Stepping off either end is a 404
        let response =
            authed(server.get(&format!("/transactions/next/{}", third["id"]))).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let response =
            authed(server.get(&format!("/transactions/previous/{}", first["id"]))).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_transaction_merges_fields() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created =
            post_transaction(&server, "Lunch", "15", TransactionKind::Withdraw, ts(2024, 6, 3, 12))
                .await;
        let id = created["id"].as_i64().unwrap();

        let update = UpdateTransactionRequest {
            name: None,
            amount: Some(dec("18.50")),
            kind: None,
            timestamp: None,
        };
        let response = authed(server.put(&format!("/transactions/{}", id)))
            .json(&update)
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();

        // Only the amount changed
        assert_eq!(body["name"], "Lunch");
        assert_eq!(body["kind"], "withdraw");
        assert_eq!(dec_field(&body, "amount"), dec("18.50"));
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created =
            post_transaction(&server, "Oops", "5", TransactionKind::Withdraw, ts(2024, 6, 3, 12))
                .await;
        let id = created["id"].as_i64().unwrap();

        let response = authed(server.delete(&format!("/transactions/{}", id))).await;
        response.assert_status(StatusCode::OK);

        let response = authed(server.get(&format!("/transactions/{}", id))).await;
        response.assert_status(StatusCode::NOT_FOUND);

        // Deleting again also reports not found
        let response = authed(server.delete(&format!("/transactions/{}", id))).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_device_registration_is_an_upsert() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = CreateDeviceRequest {
            device_id: "tablet-1".to_string(),
            username: "alex".to_string(),
            device_name: "Kitchen Tablet".to_string(),
        };
        let response = authed(server.post("/devices")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        let first: serde_json::Value = response.json();

        // Same device id again updates in place
        let request = CreateDeviceRequest {
            device_id: "tablet-1".to_string(),
            username: "alex".to_string(),
            device_name: "Living Room Tablet".to_string(),
        };
        let response = authed(server.post("/devices")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        let second: serde_json::Value = response.json();

        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["device_name"], "Living Room Tablet");

        let response = authed(server.get("/devices/tablet-1")).await;
        response.assert_status(StatusCode::OK);

        // An unknown device reports the shared error body shape
        let response = authed(server.get("/devices/no-such-device")).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "DEVICE_NOT_FOUND");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_device_username_update_conflicts() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = CreateDeviceRequest {
            device_id: "tablet-2".to_string(),
            username: "sam".to_string(),
            device_name: "Spare Tablet".to_string(),
        };
        authed(server.post("/devices"))
            .json(&request)
            .await
            .assert_status(StatusCode::CREATED);

        // "tester" belongs to the seeded test device
        let response = authed(server.put("/devices/tablet-2?username=tester")).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "USERNAME_ALREADY_EXISTS");

        let response = authed(server.put("/devices/tablet-2?username=sammy")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "sammy");

        let response = authed(server.put("/devices/no-such-device?username=ghost")).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_monthly_budget_rejects_duplicates() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let body = post_budget(&server, "2024-06", "1200").await;
        assert_eq!(body["month_year"], "2024-06");
        assert_eq!(body["rollover_enabled"], true);
        assert_eq!(dec_field(&body, "budget_amount"), dec("1200"));

        let request = CreateMonthlyBudgetRequest {
            month_year: "2024-06".to_string(),
            budget_amount: dec("900"),
            rollover_enabled: None,
        };
        let response = authed(server.post("/monthly-budgets")).json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "BUDGET_EXISTS");
    }

    #[tokio::test]
    async fn test_get_monthly_budget_creates_a_default() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = authed(server.get("/monthly-budgets/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let first: serde_json::Value = response.json();
        assert_eq!(first["month_year"], "2024-06");
        assert_eq!(dec_field(&first, "budget_amount"), dec("1000"));
        assert_eq!(first["rollover_enabled"], true);

        // A second read returns the same row, not a new one
        let response = authed(server.get("/monthly-budgets/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let second: serde_json::Value = response.json();
        assert_eq!(first["id"], second["id"]);
    }

    #[tokio::test]
    async fn test_auto_created_budget_includes_previous_surplus() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_budget(&server, "2024-05", "1000").await;
        post_transaction(&server, "May spend", "700", TransactionKind::Withdraw, ts(2024, 5, 10, 12))
            .await;

        // June does not exist yet; reading it creates default + May surplus
        let response = authed(server.get("/monthly-budgets/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(dec_field(&body, "budget_amount"), dec("1300"));

        // The summary then applies rollover on top of the stored amount
        let response = authed(server.get("/budget-summary/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(dec_field(&body, "budget_amount"), dec("1300"));
    }

    #[tokio::test]
    async fn test_update_monthly_budget() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_budget(&server, "2024-06", "1000").await;

        let update = UpdateMonthlyBudgetRequest {
            budget_amount: Some(dec("850")),
            rollover_enabled: Some(false),
        };
        let response = authed(server.put("/monthly-budgets/2024-06")).json(&update).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(dec_field(&body, "budget_amount"), dec("850"));
        assert_eq!(body["rollover_enabled"], false);

        let response = authed(server.put("/monthly-budgets/2030-01")).json(&update).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_monthly_budget_refused_while_month_has_transactions() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_budget(&server, "2024-06", "1000").await;
        post_transaction(&server, "June spend", "50", TransactionKind::Withdraw, ts(2024, 6, 10, 12))
            .await;

        let response = authed(server.delete("/monthly-budgets/2024-06")).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "BUDGET_IN_USE");

        // An empty month deletes cleanly
        post_budget(&server, "2024-07", "1000").await;
        let response = authed(server.delete("/monthly-budgets/2024-07")).await;
        response.assert_status(StatusCode::OK);
        let response = authed(server.delete("/monthly-budgets/2024-07")).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_month_keys_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        for key in ["2024-13", "2024-00", "24-06", "2024/06", "junk"] {
            let response = authed(server.get(&format!("/monthly-budgets/{}", key))).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: serde_json::Value = response.json();
            assert_eq!(body["code"], "INVALID_MONTH_KEY", "key: {}", key);

            let response = authed(server.get(&format!("/budget-summary/{}", key))).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: serde_json::Value = response.json();
            assert_eq!(body["code"], "INVALID_MONTH_KEY", "key: {}", key);
        }
    }

    #[tokio::test]
    async fn test_budget_summary_requires_a_stored_budget() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = authed(server.get("/budget-summary/2024-06")).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "BUDGET_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_budget_summary_totals() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_budget(&server, "2024-06", "1000").await;
        post_transaction(&server, "Rent share", "600", TransactionKind::Withdraw, ts(2024, 6, 1, 12))
            .await;
        post_transaction(&server, "Refund", "100", TransactionKind::Deposit, ts(2024, 6, 15, 12))
            .await;

        let response = authed(server.get("/budget-summary/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["month_year"], "2024-06");
        assert_eq!(dec_field(&body, "total_transactions"), dec("500"));
        assert_eq!(dec_field(&body, "remaining_budget"), dec("500"));
        assert_eq!(body["is_over_budget"], false);
    }

    #[tokio::test]
    async fn test_budget_summary_over_budget() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        post_budget(&server, "2024-06", "500").await;
        post_transaction(&server, "Car repair", "700", TransactionKind::Withdraw, ts(2024, 6, 20, 12))
            .await;

        let response = authed(server.get("/budget-summary/2024-06")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(dec_field(&body, "remaining_budget"), dec("-200"));
        assert_eq!(body["is_over_budget"], true);
    }

    #[tokio::test]
    async fn test_settings_create_is_an_upsert() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = SettingRequest {
            key: "theme".to_string(),
            value: "dark".to_string(),
        };
        let response = authed(server.post("/settings")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        let first: serde_json::Value = response.json();

        let request = SettingRequest {
            key: "theme".to_string(),
            value: "light".to_string(),
        };
        let response = authed(server.post("/settings")).json(&request).await;
        response.assert_status(StatusCode::CREATED);
        let second: serde_json::Value = response.json();

        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["value"], "light");

        // The list contains the seeded api_key plus ours
        let response = authed(server.get("/settings")).await;
        response.assert_status(StatusCode::OK);
        let body: Vec<serde_json::Value> = response.json();
        assert!(body.iter().any(|s| s["key"] == "theme" && s["value"] == "light"));
    }

    #[tokio::test]
    async fn test_update_setting_requires_existing_key() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = SettingRequest {
            key: "no-such-key".to_string(),
            value: "anything".to_string(),
        };
        let response = authed(server.put("/settings")).json(&request).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_default_budget_setting_must_look_like_a_price() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        for bad_value in ["abc", "12.345", "-5", ""] {
            let request = SettingRequest {
                key: "default_budget_amount".to_string(),
                value: bad_value.to_string(),
            };
            let response = authed(server.post("/settings")).json(&request).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: serde_json::Value = response.json();
            assert_eq!(body["code"], "INVALID_PRICE", "value: {:?}", bad_value);
        }

        let request = SettingRequest {
            key: "default_budget_amount".to_string(),
            value: "1500.50".to_string(),
        };
        let response = authed(server.post("/settings")).json(&request).await;
        response.assert_status(StatusCode::CREATED);

        // The auto-created budget now uses the new default
        let response = authed(server.get("/monthly-budgets/2024-09")).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(dec_field(&body, "budget_amount"), dec("1500.50"));
    }
}
