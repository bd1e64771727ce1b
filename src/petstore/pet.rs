use super::{api_key, log_title, no_body, ok_json, path_id, pet_status, petstore_auth};
use crate::dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse, HandlerResult};
use crate::mock::COLLECTION_SIZE;
use crate::openapi::{
    BodyDescriptor, EnumShape, ParameterDescriptor, ResponseDescriptor, RouteDescriptor,
    SchemaShape,
};
use http::Method;
use serde_json::{json, Value};

const TAG: &str = "pet";

pub(super) fn routes() -> Vec<RouteDescriptor> {
    let pet = || SchemaShape::reference("Pet");
    let pets = || SchemaShape::array_of(SchemaShape::reference("Pet"));
    let pet_id = |text: &str| ParameterDescriptor::path("petId", SchemaShape::int64()).described(text);

    let mut status = ParameterDescriptor::query(
        "status",
        SchemaShape::array_of(SchemaShape::reference("PetStatus")),
    )
    .required(true)
    .explode(true)
    .described("Status values that need to be considered for filter");
    status.summary = Some("Pet status value".to_string());

    vec![
        RouteDescriptor::new(Method::PUT, "/pet", "updatePet")
            .tag(TAG)
            .summary("Update an existing pet")
            .description("This updates an existing pet.")
            .security(petstore_auth())
            .request_body(
                BodyDescriptor::json(pet())
                    .required(true)
                    .description("Pet object that needs to be updated to the store"),
            )
            .response(200, ResponseDescriptor::json(pet(), "Pet details updated"))
            .response(400, no_body("Invalid ID supplied"))
            .response(404, no_body("Pet not found"))
            .response(405, no_body("Validation exception")),
        RouteDescriptor::new(Method::POST, "/pet", "addPet")
            .tag(TAG)
            .summary("Add a new pet to the store")
            .description("This add a new pet to the store.")
            .security(petstore_auth())
            .request_body(
                BodyDescriptor::json(pet())
                    .required(true)
                    .description("Pet object that needs to be added to the store"),
            )
            .response(200, ResponseDescriptor::json(pet(), "New pet details added"))
            .response(405, no_body("Invalid input")),
        RouteDescriptor::new(Method::GET, "/pet/findByStatus", "findPetsByStatus")
            .tag(TAG)
            .summary("Finds Pets by status")
            .description("Multiple status values can be provided with comma separated strings.")
            .security(petstore_auth())
            .parameter(status)
            .response(200, ok_json(pets()))
            .response(400, no_body("Invalid status value")),
        RouteDescriptor::new(Method::GET, "/pet/findByTags", "findPetsByTags")
            .tag(TAG)
            .summary("Finds Pets by tags")
            .description("Muliple tags can be provided with comma separated strings.")
            .deprecated(true)
            .security(petstore_auth())
            .parameter(
                ParameterDescriptor::query("tags", SchemaShape::array_of(SchemaShape::string()))
                    .required(true)
                    .explode(true)
                    .described("Tags to filter by"),
            )
            .response(200, ok_json(pets()))
            .response(400, no_body("Invalid tag value")),
        RouteDescriptor::new(Method::GET, "/pet/{petId}", "getPetById")
            .tag(TAG)
            .summary("Find pet by ID")
            .description("Returns a single pet.")
            .security(api_key())
            .parameter(pet_id("ID of pet to return"))
            .response(200, ok_json(pet()))
            .response(400, no_body("Invalid ID supplied"))
            .response(404, no_body("Pet not found")),
        RouteDescriptor::new(Method::POST, "/pet/{petId}", "updatePetWithForm")
            .tag(TAG)
            .summary("Updates a pet in the store with form data")
            .description("This updates a pet in the store with form data.")
            .security(petstore_auth())
            .parameter(pet_id("ID of pet that needs to be updated"))
            .request_body(
                BodyDescriptor::new(
                    "application/x-www-form-urlencoded",
                    SchemaShape::reference("PetUrlForm"),
                )
                .required(true)
                .description("Pet object that needs to be added to the store"),
            )
            .response(200, ok_json(pet()))
            .response(405, no_body("Invalid input")),
        RouteDescriptor::new(Method::DELETE, "/pet/{petId}", "deletePet")
            .tag(TAG)
            .summary("Deletes a pet")
            .description("This deletes a pet.")
            .security(petstore_auth())
            .parameter(ParameterDescriptor::header("api_key", SchemaShape::string()))
            .parameter(pet_id("Pet id to delete"))
            .response(200, no_body("successful operation"))
            .response(400, no_body("Invalid ID supplied"))
            .response(404, no_body("Pet not found")),
        RouteDescriptor::new(Method::POST, "/pet/{petId}/uploadImage", "uploadFile")
            .tag(TAG)
            .summary("Uploads an image")
            .description("This uploads an image.")
            .security(petstore_auth())
            .parameter(pet_id("ID of pet to update"))
            .request_body(BodyDescriptor::new(
                "multipart/form-data",
                SchemaShape::reference("PetFormData"),
            ))
            .response(200, ok_json(SchemaShape::reference("ApiResponse"))),
    ]
}

pub(super) fn register(dispatcher: &mut Dispatcher) {
    dispatcher.register("updatePet", update_pet);
    dispatcher.register("addPet", add_pet);
    dispatcher.register("findPetsByStatus", find_by_status);
    dispatcher.register("findPetsByTags", find_by_tags);
    dispatcher.register("getPetById", get_pet_by_id);
    dispatcher.register("updatePetWithForm", update_pet_with_form);
    dispatcher.register("deletePet", delete_pet);
    dispatcher.register("uploadFile", upload_file);
}

fn update_pet(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate_named("Pet")?))
}

fn add_pet(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate_named("Pet")?))
}

/// Resolve a status filter value to its wire string
///
/// Matches the wire string, the member identifier or the numeric value,
/// ignoring case. Anything else counts as `available`.
pub(crate) fn parse_status(shape: &EnumShape, raw: &str) -> String {
    let raw = raw.trim();
    let number = raw.parse::<i64>().ok();
    shape
        .members()
        .iter()
        .find(|m| {
            m.wire.eq_ignore_ascii_case(raw)
                || m.ident.eq_ignore_ascii_case(raw)
                || number == Some(m.value)
        })
        .map_or_else(|| "available".to_string(), |m| m.wire.clone())
}

fn find_by_status(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let shape = pet_status();
    let wanted: Vec<String> = req
        .query_values("status")
        .into_iter()
        .map(|raw| parse_status(&shape, raw))
        .collect();
    let pets: Vec<Value> = ctx
        .mock
        .generate_many("Pet", COLLECTION_SIZE)?
        .into_iter()
        .filter(|pet| {
            pet.get("status")
                .and_then(Value::as_str)
                .is_some_and(|status| wanted.iter().any(|w| w == status))
        })
        .collect();
    Ok(HandlerResponse::json(200, Value::Array(pets)))
}

fn find_by_tags(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let mut tags = Vec::new();
    for name in req.query_values("tags") {
        tags.push(ctx.mock.build("Tag").with_override("name", json!(name)).create()?);
    }
    let mut pets = ctx.mock.generate_many("Pet", COLLECTION_SIZE)?;
    for pet in &mut pets {
        if let Some(obj) = pet.as_object_mut() {
            obj.insert("tags".to_string(), Value::Array(tags.clone()));
        }
    }
    Ok(HandlerResponse::json(200, Value::Array(pets)))
}

fn get_pet_by_id(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let id = match path_id(req, "petId") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let pet = ctx.mock.build("Pet").with_override("id", json!(id)).create()?;
    Ok(HandlerResponse::json(200, pet))
}

fn update_pet_with_form(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let id = match path_id(req, "petId") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let pet = ctx.mock.build("Pet").with_override("id", json!(id)).create()?;
    Ok(HandlerResponse::json(200, pet))
}

fn delete_pet(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    if let Err(resp) = path_id(req, "petId") {
        return Ok(resp);
    }
    Ok(HandlerResponse::empty(200))
}

fn upload_file(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate_named("ApiResponse")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_forms() {
        let shape = pet_status();
        assert_eq!(parse_status(&shape, "sold"), "sold");
        assert_eq!(parse_status(&shape, "PENDING"), "pending");
        assert_eq!(parse_status(&shape, "Sold"), "sold");
        assert_eq!(parse_status(&shape, "2"), "pending");
        assert_eq!(parse_status(&shape, "lost"), "available");
    }

    #[test]
    fn test_routes_are_pet_tagged() {
        let routes = routes();
        assert_eq!(routes.len(), 8);
        assert!(routes.iter().all(|r| r.tags.contains(TAG)));
        let by_tags = routes
            .iter()
            .find(|r| r.operation_id == "findPetsByTags")
            .unwrap();
        assert!(by_tags.deprecated);
    }
}
