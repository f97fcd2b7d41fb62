mod common;

use common::{harness, param, request, Harness};
use interface_engine::model::{InterfaceStatus, ParamType, TypedValue};
use interface_engine::service::ParamViolation;
use interface_engine::AppError;
use serde_json::{json, Map, Value};

/// Published interface over `t_orders` filtering on a required business date and an optional region.
async fn orders(h: &Harness) -> String {
    let mut data_time = param("dataTime", ParamType::Date, true);
    data_time.validation_rule = Some("date:max:yesterday".into());
    let req = request(
        "orders",
        "t_orders",
        vec![data_time, param("region", ParamType::String, false)],
    );
    let id = h.engine.generate(&req, "tester").await.unwrap();
    h.engine.publish(&id, "tester").await.unwrap();
    id
}

fn values(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("expected an object"),
    }
}

#[tokio::test]
async fn generated_template_filters_on_declared_parameters() {
    let h = harness();
    let id = orders(&h).await;
    let detail = h.engine.get_interface(&id).await.unwrap();
    assert_eq!(
        detail.interface.sql_template,
        "SELECT * FROM t_orders WHERE dataTime = {dataTime} AND region = {region}"
    );
    assert_eq!(detail.parameters.len(), 2);
    assert_eq!(detail.interface.version, "1.0");
}

#[tokio::test]
async fn empty_table_returns_success_with_no_rows() {
    let h = harness();
    let id = orders(&h).await;
    let result = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01", "region": "north" })))
        .await
        .unwrap();
    assert!(result.success);
    assert!(result.data.is_empty());
    assert_eq!(result.total_count, 0);
    assert_eq!(
        result.execute_sql,
        "SELECT * FROM t_orders WHERE dataTime = '2024-06-01' AND region = 'north'"
    );
}

#[tokio::test]
async fn absent_optional_value_renders_null() {
    let h = harness();
    let id = orders(&h).await;
    let result = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01", "region": "" })))
        .await
        .unwrap();
    assert_eq!(
        result.execute_sql,
        "SELECT * FROM t_orders WHERE dataTime = '2024-06-01' AND region = NULL"
    );

    let sent = h.backend.last_query().unwrap();
    assert_eq!(sent.bound_sql, "SELECT * FROM t_orders WHERE dataTime = $1 AND region = NULL");
    assert_eq!(sent.binds.len(), 1);
    assert!(matches!(sent.binds[0], TypedValue::Date(_)));
}

#[tokio::test]
async fn embedded_quotes_are_doubled_in_reported_sql() {
    let h = harness();
    let id = orders(&h).await;
    let result = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01", "region": "O'Brien" })))
        .await
        .unwrap();
    assert!(result.execute_sql.ends_with("region = 'O''Brien'"));
    let sent = h.backend.last_query().unwrap();
    assert_eq!(
        sent.bound_sql,
        "SELECT * FROM t_orders WHERE dataTime = $1 AND region = $v$O'Brien$v$"
    );
    assert_eq!(sent.binds.len(), 1);
}

#[tokio::test]
async fn missing_required_parameter_is_named() {
    let h = harness();
    let id = orders(&h).await;
    let err = h.engine.execute(&id, &values(json!({ "region": "north" }))).await.unwrap_err();
    match &err {
        AppError::Parameter(v @ ParamViolation::Missing { .. }) => assert_eq!(v.parameter(), "dataTime"),
        other => panic!("expected a missing parameter, got {:?}", other),
    }
    assert!(err.to_string().contains("dataTime"));
    assert_eq!(h.backend.query_count(), 0);
}

#[tokio::test]
async fn date_rule_rejects_today() {
    let h = harness();
    let id = orders(&h).await;
    let err = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-15" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parameter(ParamViolation::DateTooLate { .. })), "{:?}", err);

    let ok = h.engine.execute(&id, &values(json!({ "dataTime": "2024-06-14" }))).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn wrong_type_is_a_parameter_error() {
    let h = harness();
    let id = orders(&h).await;
    let err = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "yesterday" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parameter(ParamViolation::TypeMismatch { .. })));
}

#[tokio::test]
async fn backend_failure_carries_rendered_sql() {
    let h = harness();
    let id = orders(&h).await;
    h.backend.fail_with("relation \"t_orders\" does not exist");
    let err = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01" })))
        .await
        .unwrap_err();
    match err {
        AppError::Execution { message, sql } => {
            assert!(message.contains("does not exist"));
            assert_eq!(sql, "SELECT * FROM t_orders WHERE dataTime = '2024-06-01' AND region = NULL");
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn unpublished_interface_is_not_executable() {
    let h = harness();
    let id = orders(&h).await;
    h.engine.offline(&id, "tester", "maintenance").await.unwrap();
    let err = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01" })))
        .await
        .unwrap_err();
    match err {
        AppError::StateConflict(message) => assert_eq!(message, "interface not published"),
        other => panic!("expected a state conflict, got {:?}", other),
    }
    assert_eq!(h.backend.query_count(), 0);
}

#[tokio::test]
async fn unknown_interface_is_not_found() {
    let h = harness();
    let err = h.engine.execute("missing", &Map::new()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn injected_parameters_are_validated_but_not_filtered() {
    let h = harness();
    let mut req = request("with_app", "t_orders", h.engine.standard_parameters());
    req.parameters.push(param("region", ParamType::String, false));
    let id = h.engine.generate(&req, "tester").await.unwrap();
    h.engine.publish(&id, "tester").await.unwrap();

    let err = h
        .engine
        .execute(&id, &values(json!({ "dataTime": "2024-06-01", "appId": "short" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parameter(ParamViolation::Length { .. })), "{:?}", err);

    let result = h
        .engine
        .execute(
            &id,
            &values(json!({ "dataTime": "2024-06-01", "appId": "KzoHypQZH4-F6qM63L" })),
        )
        .await
        .unwrap();
    assert_eq!(
        result.execute_sql,
        "SELECT * FROM t_orders WHERE dataTime = '2024-06-01' AND region = NULL"
    );

    // dataTime is declared as a string; it must reach the server untyped so a DATE column still compares.
    let sent = h.backend.last_query().unwrap();
    assert_eq!(
        sent.bound_sql,
        "SELECT * FROM t_orders WHERE dataTime = $v$2024-06-01$v$ AND region = NULL"
    );
    assert!(sent.binds.is_empty());
}

#[tokio::test]
async fn preview_reports_path_and_sample_values() {
    let h = harness();
    let mut req = request("daily orders", "ods.t_order_items", vec![param("region", ParamType::String, false)]);
    req.config.category_id = Some("BUSINESS_DATA".into());
    let preview = h.engine.preview(&req).unwrap();
    assert_eq!(preview.path, "/api/data/v1/business/order-items/daily-orders");
    assert_eq!(preview.sql_template, "SELECT * FROM ods.t_order_items WHERE region = {region}");
    assert!(preview.sample_params.contains_key("region"));
    assert_eq!(h.engine.list_interfaces(None).await.unwrap().len(), 0);
}

#[tokio::test]
async fn replaced_parameters_drive_execution_after_republish() {
    let h = harness();
    let id = orders(&h).await;
    h.engine.offline(&id, "tester", "reshape filters").await.unwrap();

    let detail = h
        .engine
        .update_parameters(
            &id,
            &[param("city", ParamType::String, true), param("qty", ParamType::Integer, false)],
            "tester",
        )
        .await
        .unwrap();
    assert_eq!(detail.interface.sql_template, "SELECT * FROM t_orders WHERE city = {city} AND qty = {qty}");

    let stored = h.engine.get_interface(&id).await.unwrap();
    let names: Vec<&str> = stored.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["city", "qty"]);
    assert_eq!(stored.interface.sql_template, detail.interface.sql_template);
    assert_eq!(stored.interface.status, InterfaceStatus::Offline);

    h.engine.republish(&id, "tester").await.unwrap();
    let result = h
        .engine
        .execute(&id, &values(json!({ "city": "Oslo", "qty": 3 })))
        .await
        .unwrap();
    assert_eq!(result.execute_sql, "SELECT * FROM t_orders WHERE city = 'Oslo' AND qty = 3");
    let sent = h.backend.last_query().unwrap();
    assert_eq!(sent.bound_sql, "SELECT * FROM t_orders WHERE city = $v$Oslo$v$ AND qty = $1");
    assert_eq!(sent.binds, vec![TypedValue::Integer(3)]);

    let err = h.engine.execute(&id, &values(json!({ "dataTime": "2024-06-01" }))).await.unwrap_err();
    match &err {
        AppError::Parameter(v @ ParamViolation::Missing { .. }) => assert_eq!(v.parameter(), "city"),
        other => panic!("expected a missing parameter, got {:?}", other),
    }
}

#[tokio::test]
async fn copy_creates_unpublished_duplicate() {
    let h = harness();
    let id = orders(&h).await;
    let copy = h.engine.copy_interface(&id, "orders_copy", "tester").await.unwrap();
    let detail = h.engine.get_interface(&copy).await.unwrap();
    assert_eq!(detail.interface.status.to_string(), "UNPUBLISHED");
    assert_eq!(detail.interface.path, "/api/data/v1/general/orders/orders_copy");
    assert_eq!(detail.parameters.len(), 2);
    assert!(detail.parameters.iter().all(|p| p.interface_id == copy));

    let err = h.engine.copy_interface(&id, "orders", "tester").await.unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
}
