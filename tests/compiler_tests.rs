#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use petstore_openapi::config::AppConfig;
use petstore_openapi::openapi::{
    compile_document, ApiRegistry, DocumentInfo, OpenApiVersion, ParameterDescriptor,
    RouteDescriptor, SchemaShape,
};
use petstore_openapi::petstore;
use serde_json::{json, Value};

fn compiled(config: &AppConfig) -> Value {
    let mut reg = petstore::build_registry().unwrap();
    let doc = reg.compile(&petstore::document_info(config)).unwrap();
    doc.as_value().clone()
}

#[test]
fn test_enum_renders_wire_strings() {
    let doc = compiled(&AppConfig::default());
    assert_eq!(
        doc["components"]["schemas"]["PetStatus"],
        json!({ "type": "string", "enum": ["available", "pending", "sold"] })
    );
    assert_eq!(
        doc["components"]["schemas"]["Pet"]["properties"]["status"],
        json!({ "$ref": "#/components/schemas/PetStatus" })
    );
    assert_eq!(
        doc["components"]["schemas"]["Pet"]["required"],
        json!(["name", "photoUrls"])
    );
}

#[test]
fn test_output_is_deterministic() {
    let config = AppConfig::default();
    let a = petstore::build_registry()
        .unwrap()
        .compile(&petstore::document_info(&config))
        .unwrap();
    let b = petstore::build_registry()
        .unwrap()
        .compile(&petstore::document_info(&config))
        .unwrap();
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    assert_eq!(a.to_yaml().unwrap(), b.to_yaml().unwrap());
}

#[test]
fn test_paths_follow_registration_and_components_sort() {
    let registry = petstore::build_registry().unwrap();
    let mut expected: Vec<&str> = Vec::new();
    for entry in registry.routes().iter() {
        if !expected.contains(&entry.template.normalized()) {
            expected.push(entry.template.normalized());
        }
    }
    let doc = compiled(&AppConfig::default());
    let paths: Vec<&str> = doc["paths"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(paths, expected);

    let names: Vec<&String> = doc["components"]["schemas"].as_object().unwrap().keys().collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let schemes: Vec<&String> = doc["components"]["securitySchemes"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(schemes, vec!["api_key", "petstore_auth"]);
}

#[test]
fn test_document_holds_exactly_the_registered_items() {
    let registry = petstore::build_registry().unwrap();
    let doc = compiled(&AppConfig::default());

    let mut operation_ids: Vec<&str> = doc["paths"]
        .as_object()
        .unwrap()
        .values()
        .flat_map(|item| item.as_object().unwrap().values())
        .map(|op| op["operationId"].as_str().unwrap())
        .collect();
    let mut registered: Vec<&str> = registry.routes().iter().map(|r| r.operation_id()).collect();
    operation_ids.sort_unstable();
    registered.sort_unstable();
    assert_eq!(operation_ids, registered);

    let mut schemas: Vec<&str> = doc["components"]["schemas"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    let mut registered: Vec<&str> = registry.schemas().iter().map(|e| e.name.as_str()).collect();
    schemas.sort_unstable();
    registered.sort_unstable();
    assert_eq!(schemas, registered);

    let mut schemes: Vec<&str> = doc["components"]["securitySchemes"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    let mut registered: Vec<&str> = registry.schemes().iter().map(|(n, _)| n.as_str()).collect();
    schemes.sort_unstable();
    registered.sort_unstable();
    assert_eq!(schemes, registered);
}

#[test]
fn test_parameter_extensions_are_ordered() {
    let doc = compiled(&AppConfig::default());
    let status = doc["paths"]["/pet/findByStatus"]["get"]["parameters"][0]
        .as_object()
        .unwrap();
    let keys: Vec<&String> = status.keys().collect();
    let tail: Vec<&str> = keys[keys.len() - 2..].iter().map(|k| k.as_str()).collect();
    assert_eq!(tail, vec!["x-ms-summary", "x-ms-visibility"]);
    assert_eq!(status["x-ms-summary"], "Pet status value");
}

#[test]
fn test_paths_group_methods_under_normalized_template() {
    let doc = compiled(&AppConfig::default());
    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 14);

    let user = &paths["/user/{username}"];
    assert_eq!(user["get"]["operationId"], "getUserByName");
    assert!(!paths.keys().any(|p| p.contains("regex")));

    let pet = paths["/pet/{petId}"].as_object().unwrap();
    let methods: Vec<&String> = pet.keys().collect();
    assert_eq!(methods, vec!["get", "post", "delete"]);

    let tags: Vec<&str> = doc["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["pet", "store", "user"]);
}

#[test]
fn test_operation_details() {
    let doc = compiled(&AppConfig::default());
    let by_tags = &doc["paths"]["/pet/findByTags"]["get"];
    assert_eq!(by_tags["deprecated"], true);
    assert!(doc["paths"]["/pet/findByStatus"]["get"].get("deprecated").is_none());

    let by_status = &doc["paths"]["/pet/findByStatus"]["get"];
    assert_eq!(
        by_status["security"],
        json!([{ "petstore_auth": ["write:pets", "read:pets"] }])
    );
    let status = &by_status["parameters"][0];
    assert_eq!(status["name"], "status");
    assert_eq!(status["in"], "query");
    assert_eq!(status["required"], true);
    assert_eq!(status["explode"], true);
    assert_eq!(
        status["schema"]["items"],
        json!({ "$ref": "#/components/schemas/PetStatus" })
    );

    assert_eq!(
        doc["paths"]["/pet/{petId}"]["get"]["security"],
        json!([{ "api_key": [] }])
    );
}

#[test]
fn test_login_response_headers() {
    let doc = compiled(&AppConfig::default());
    let ok = &doc["paths"]["/user/login"]["get"]["responses"]["200"];
    assert_eq!(ok["content"]["text/plain"]["schema"], json!({ "type": "string" }));
    assert_eq!(
        ok["headers"]["X-Rate-Limit"]["schema"],
        json!({ "type": "integer", "format": "int32" })
    );
    assert_eq!(
        ok["headers"]["X-Expires-After"]["schema"],
        json!({ "type": "string", "format": "date-time" })
    );
}

#[test]
fn test_security_scheme_rendering() {
    let doc = compiled(&AppConfig::default());
    let schemes = &doc["components"]["securitySchemes"];
    assert_eq!(schemes["api_key"]["type"], "apiKey");
    assert_eq!(schemes["api_key"]["in"], "header");
    let implicit = &schemes["petstore_auth"]["flows"]["implicit"];
    assert_eq!(
        implicit["authorizationUrl"],
        "http://petstore.swagger.io/oauth/dialog"
    );
    assert!(implicit["scopes"]["write:pets"].is_string());
    assert!(implicit["scopes"]["read:pets"].is_string());
}

#[test]
fn test_info_and_version() {
    let mut config = AppConfig::default();
    config.openapi_version = OpenApiVersion::V3_1;
    config.doc_title = "Pets Inc".to_string();
    let doc = compiled(&config);
    assert_eq!(doc["openapi"], "3.1.0");
    assert_eq!(compiled(&AppConfig::default())["openapi"], "3.0.1");
    assert_eq!(doc["info"]["title"], "Pets Inc");
    assert_eq!(doc["info"]["license"]["name"], "MIT");
    assert_eq!(doc["servers"][0]["url"], config.server_url());
}

#[test]
fn test_compile_without_routes() {
    let reg = ApiRegistry::new();
    let doc = compile_document(
        &DocumentInfo::new("Empty", "0.1.0"),
        reg.schemas(),
        reg.schemes(),
        reg.routes(),
    )
    .unwrap();
    assert_eq!(doc.path_count(), 0);
    assert_eq!(doc.as_value()["paths"], json!({}));
    assert!(doc.as_value().get("tags").is_none());
}

#[test]
fn test_visibility_extension_defaults() {
    let mut reg = ApiRegistry::new();
    reg.add_route(
        RouteDescriptor::new(Method::GET, "/user/{username}", "getUserByName")
            .parameter(ParameterDescriptor::path("username", SchemaShape::string())),
    )
    .unwrap();
    let doc = reg.compile(&DocumentInfo::new("Users", "1.0.0")).unwrap();
    let op = &doc.as_value()["paths"]["/user/{username}"]["get"];
    assert_eq!(op["x-ms-visibility"], "important");
    assert_eq!(op["parameters"][0]["x-ms-visibility"], "important");
    assert_eq!(op["responses"], json!({}));
}
