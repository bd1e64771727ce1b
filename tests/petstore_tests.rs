#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::test_server::{build_service, test_config};
use common::tracing_util::TestTracing;
use http::Method;
use petstore_openapi::dispatcher::{HandlerResponse, ResponseBody};
use petstore_openapi::petstore::{self, EXPIRES_AFTER_HEADER, RATE_LIMIT_HEADER};
use petstore_openapi::server::{AppService, ParsedRequest};
use serde_json::Value;

fn call(service: &AppService, method: Method, target: &str) -> HandlerResponse {
    service.handle(ParsedRequest::new(method, target))
}

fn json_body(resp: &HandlerResponse) -> &Value {
    match &resp.body {
        ResponseBody::Json(v) => v,
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

/// One request per registered operation
fn every_operation() -> [(Method, &'static str); 18] {
    [
        (Method::PUT, "/api/pet"),
        (Method::POST, "/api/pet"),
        (Method::GET, "/api/pet/findByStatus?status=available"),
        (Method::GET, "/api/pet/findByTags?tags=a"),
        (Method::GET, "/api/pet/1"),
        (Method::POST, "/api/pet/1"),
        (Method::DELETE, "/api/pet/1"),
        (Method::POST, "/api/pet/1/uploadImage"),
        (Method::GET, "/api/store/inventory"),
        (Method::POST, "/api/store/order"),
        (Method::GET, "/api/store/order/1"),
        (Method::DELETE, "/api/store/order/1"),
        (Method::POST, "/api/user"),
        (Method::POST, "/api/user/createWithArray"),
        (Method::POST, "/api/user/createWithList"),
        (Method::GET, "/api/user/login?username=a&password=b"),
        (Method::GET, "/api/user/logout"),
        (Method::GET, "/api/user/jane"),
    ]
}

#[test]
fn test_every_operation_answers() {
    let service = build_service(&test_config());
    for (method, target) in every_operation() {
        let resp = call(&service, method.clone(), target);
        assert_eq!(resp.status, 200, "{method} {target}");
        assert!(resp.get_header("x-request-id").is_some());
    }
}

#[test]
fn test_every_handler_logs_document_title() {
    let service = build_service(&test_config());
    let tracing = TestTracing::init();
    for (method, target) in every_operation() {
        tracing.clear();
        let resp = call(&service, method.clone(), target);
        let request_id = resp.get_header("x-request-id").unwrap();

        let events = tracing.events();
        let title = events
            .iter()
            .find(|e| e.message == "document title: Swagger Petstore")
            .unwrap_or_else(|| panic!("no title line for {method} {target}: {events:?}"));
        assert_eq!(title.level, tracing::Level::INFO);
        assert_eq!(title.field("request_id"), Some(request_id));
        assert!(title.field("operation_id").is_some_and(|id| !id.is_empty()));
    }
}

#[test]
fn test_find_by_status_filters() {
    let service = build_service(&test_config());
    for target in [
        "/api/pet/findByStatus?status=sold",
        "/api/pet/findByStatus?status=SOLD,pending",
        "/api/pet/findByStatus?status=sold&status=2",
    ] {
        let resp = call(&service, Method::GET, target);
        let pets = json_body(&resp).as_array().unwrap();
        for pet in pets {
            let status = pet["status"].as_str().unwrap();
            assert!(status == "sold" || status == "pending", "{target}: {status}");
        }
    }

    // unknown values count as available
    let resp = call(&service, Method::GET, "/api/pet/findByStatus?status=lost");
    for pet in json_body(&resp).as_array().unwrap() {
        assert_eq!(pet["status"], "available");
    }
}

#[test]
fn test_find_by_tags_sets_tags_on_every_pet() {
    let service = build_service(&test_config());
    let resp = call(&service, Method::GET, "/api/pet/findByTags?tags=friendly&tags=small");
    let pets = json_body(&resp).as_array().unwrap();
    assert!(!pets.is_empty());
    for pet in pets {
        let names: Vec<&str> = pet["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["friendly", "small"]);
    }
}

#[test]
fn test_ids_are_echoed() {
    let service = build_service(&test_config());
    let pet = call(&service, Method::GET, "/api/pet/42");
    assert_eq!(json_body(&pet)["id"], 42);

    let form = call(&service, Method::POST, "/api/pet/7");
    assert_eq!(json_body(&form)["id"], 7);

    let order = call(&service, Method::GET, "/api/store/order/9");
    assert_eq!(json_body(&order)["id"], 9);

    let user = call(&service, Method::GET, "/api/user/jane%20doe");
    assert_eq!(json_body(&user)["username"], "jane doe");
}

#[test]
fn test_bad_ids_are_400() {
    let service = build_service(&test_config());
    for (method, target) in [
        (Method::GET, "/api/pet/abc"),
        (Method::POST, "/api/pet/abc"),
        (Method::DELETE, "/api/pet/abc"),
        (Method::GET, "/api/store/order/x1"),
        (Method::DELETE, "/api/store/order/x1"),
    ] {
        let resp = call(&service, method, target);
        assert_eq!(resp.status, 400, "{target}");
        assert_eq!(json_body(&resp)["error"], "Invalid ID supplied");
    }
}

#[test]
fn test_login_route_wins_over_username() {
    let service = build_service(&test_config());
    let resp = call(&service, Method::GET, "/api/user/login?username=a&password=b");
    assert_eq!(resp.get_header("content-type"), Some("text/plain; charset=utf-8"));
    assert!(resp.get_header(RATE_LIMIT_HEADER).unwrap().parse::<i32>().is_ok());
    assert!(resp.get_header(EXPIRES_AFTER_HEADER).is_some());
    assert!(matches!(&resp.body, ResponseBody::Text(t) if !t.is_empty()));
}

#[test]
fn test_empty_bodies() {
    let service = build_service(&test_config());
    for (method, target) in [
        (Method::DELETE, "/api/pet/3"),
        (Method::DELETE, "/api/store/order/3"),
        (Method::GET, "/api/user/logout"),
    ] {
        let resp = call(&service, method, target);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, ResponseBody::Empty);
    }
}

#[test]
fn test_inventory_is_map_of_ints() {
    let service = build_service(&test_config());
    let resp = call(&service, Method::GET, "/api/store/inventory");
    let map = json_body(&resp).as_object().unwrap();
    assert_eq!(map.len(), 3);
    assert!(map.values().all(Value::is_i64));
}

#[test]
fn test_user_lists() {
    let service = build_service(&test_config());
    let resp = call(&service, Method::POST, "/api/user/createWithList");
    let users = json_body(&resp).as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u["username"].is_string()));
}

#[test]
fn test_routing_errors() {
    let service = build_service(&test_config());
    let resp = call(&service, Method::GET, "/api/unknown");
    assert_eq!(resp.status, 404);

    let resp = call(&service, Method::GET, "/pet/1");
    assert_eq!(resp.status, 404, "routes live under the prefix");

    let resp = call(&service, Method::PATCH, "/api/pet/1");
    assert_eq!(resp.status, 405);
    assert_eq!(resp.get_header("allow"), Some("GET, POST, DELETE"));
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let first = build_service(&test_config());
    let second = build_service(&test_config());
    let a = call(&first, Method::GET, "/api/pet/1");
    let b = call(&second, Method::GET, "/api/pet/1");
    assert_eq!(json_body(&a), json_body(&b));

    // consecutive requests draw different fixtures
    let c = call(&first, Method::GET, "/api/pet/1");
    assert_ne!(json_body(&a), json_body(&c));
}

#[test]
fn test_empty_prefix_mounts_at_root() {
    let mut config = test_config();
    config.route_prefix = String::new();
    let service = build_service(&config);
    assert_eq!(call(&service, Method::GET, "/pet/5").status, 200);
    assert_eq!(call(&service, Method::GET, "/openapi/v3.json").status, 200);
}

#[test]
fn test_document_endpoints_match_compiled_document() {
    let config = test_config();
    let service = build_service(&config);
    let resp = call(&service, Method::GET, "/api/swagger.json");
    let ResponseBody::Text(text) = &resp.body else {
        panic!("document is served as text");
    };
    let served: Value = serde_json::from_str(text).unwrap();
    let registry = petstore::sealed_registry(&config).unwrap();
    assert_eq!(&served, registry.document.as_value());
}

#[test]
fn test_discovery_paths_ignore_case() {
    let service = build_service(&test_config());
    for target in [
        "/API/openapi/v3.json",
        "/api/Swagger.JSON",
        "/Api/OpenAPI/v3.yaml",
        "/api/swagger/UI",
        "/Health",
    ] {
        assert_eq!(call(&service, Method::GET, target).status, 200, "{target}");
    }
}
