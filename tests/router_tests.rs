#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use petstore_openapi::config::AppConfig;
use petstore_openapi::openapi::SealedRegistry;
use petstore_openapi::petstore;
use petstore_openapi::router::RouteMatch;
use petstore_openapi::{RouteOutcome, Router};

fn sealed() -> SealedRegistry {
    petstore::sealed_registry(&AppConfig::default()).unwrap()
}

fn router(prefix: &str) -> Router {
    Router::new(&sealed().routes, prefix)
}

fn matched(router: &Router, method: Method, path: &str) -> RouteMatch {
    match router.route(&method, path) {
        RouteOutcome::Matched(m) => m,
        other => panic!("{method} {path}: expected a match, got {other:?}"),
    }
}

#[test]
fn test_every_route_is_reachable() {
    let r = router("api");
    assert_eq!(r.len(), 18);
    let cases = [
        (Method::PUT, "/api/pet", "updatePet"),
        (Method::POST, "/api/pet", "addPet"),
        (Method::GET, "/api/pet/findByStatus", "findPetsByStatus"),
        (Method::GET, "/api/pet/findByTags", "findPetsByTags"),
        (Method::GET, "/api/pet/10", "getPetById"),
        (Method::POST, "/api/pet/10", "updatePetWithForm"),
        (Method::DELETE, "/api/pet/10", "deletePet"),
        (Method::POST, "/api/pet/10/uploadImage", "uploadFile"),
        (Method::GET, "/api/store/inventory", "getInventory"),
        (Method::POST, "/api/store/order", "placeOrder"),
        (Method::GET, "/api/store/order/3", "getOrderById"),
        (Method::DELETE, "/api/store/order/3", "deleteOrder"),
        (Method::POST, "/api/user", "createUser"),
        (Method::POST, "/api/user/createWithArray", "createUsersWithArrayInput"),
        (Method::POST, "/api/user/createWithList", "createUsersWithListInput"),
        (Method::GET, "/api/user/login", "loginUser"),
        (Method::GET, "/api/user/logout", "logoutUser"),
        (Method::GET, "/api/user/jane", "getUserByName"),
    ];
    for (method, path, op) in cases {
        assert_eq!(matched(&r, method, path).operation_id(), op, "{path}");
    }
}

#[test]
fn test_literals_win_over_parameters() {
    let r = router("api");
    let m = matched(&r, Method::GET, "/api/user/login");
    assert_eq!(m.operation_id(), "loginUser");
    assert!(m.path_params.is_empty());

    let m = matched(&r, Method::GET, "/api/pet/findByStatus");
    assert_eq!(m.operation_id(), "findPetsByStatus");

    // only GET /pet/{petId} exists at that depth for GET
    let m = matched(&r, Method::GET, "/api/pet/findByColour");
    assert_eq!(m.operation_id(), "getPetById");
    assert_eq!(m.get_path_param("petId"), Some("findByColour"));
}

#[test]
fn test_literals_ignore_case() {
    let r = router("api");
    assert_eq!(
        matched(&r, Method::GET, "/API/User/Login").operation_id(),
        "loginUser"
    );
    assert_eq!(
        matched(&r, Method::GET, "/api/pet/FINDBYSTATUS").operation_id(),
        "findPetsByStatus"
    );
}

#[test]
fn test_path_params_are_decoded() {
    let r = router("api");
    let m = matched(&r, Method::GET, "/api/user/jane%20doe");
    assert_eq!(m.get_path_param("username"), Some("jane doe"));
    let m = matched(&r, Method::POST, "/api/pet/77/uploadImage");
    assert_eq!(m.get_path_param("petId"), Some("77"));
}

#[test]
fn test_method_not_allowed() {
    let r = router("api");
    match r.route(&Method::PATCH, "/api/pet") {
        RouteOutcome::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::PUT, Method::POST]);
        }
        other => panic!("unexpected {other:?}"),
    }
    match r.route(&Method::PUT, "/api/store/order/1") {
        RouteOutcome::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_not_found() {
    let r = router("api");
    for path in ["/api", "/api/", "/api/store", "/api/pet/1/2/3", "/pet/1", "/v1/pet/1"] {
        assert!(
            matches!(r.route(&Method::GET, path), RouteOutcome::NotFound),
            "{path}"
        );
    }
}

#[test]
fn test_trailing_and_repeated_slashes() {
    let r = router("/api/");
    assert_eq!(
        matched(&r, Method::GET, "/api/store/inventory/").operation_id(),
        "getInventory"
    );
    assert_eq!(
        matched(&r, Method::GET, "//api//store/inventory").operation_id(),
        "getInventory"
    );
}

#[test]
fn test_custom_and_empty_prefix() {
    let r = router("v1/petstore");
    assert_eq!(
        matched(&r, Method::GET, "/v1/petstore/store/inventory").operation_id(),
        "getInventory"
    );
    assert!(matches!(
        r.route(&Method::GET, "/api/store/inventory"),
        RouteOutcome::NotFound
    ));

    let r = router("");
    assert_eq!(
        matched(&r, Method::GET, "/user/logout").operation_id(),
        "logoutUser"
    );
}
