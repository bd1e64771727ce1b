use super::{api_key, log_title, no_body, ok_json, path_id};
use crate::dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse, HandlerResult};
use crate::openapi::{BodyDescriptor, ParameterDescriptor, ResponseDescriptor, RouteDescriptor, SchemaShape};
use http::Method;
use serde_json::json;

const TAG: &str = "store";

/// `200` response documented with a description only
fn described_only(schema: SchemaShape, text: &str) -> ResponseDescriptor {
    let mut response = ResponseDescriptor::json(schema, text);
    response.summary = None;
    response
}

fn inventory_shape() -> SchemaShape {
    SchemaShape::map_of(SchemaShape::int32())
}

pub(super) fn routes() -> Vec<RouteDescriptor> {
    let order = || SchemaShape::reference("Order");
    let order_id =
        |text: &str| ParameterDescriptor::path("orderId", SchemaShape::int64()).described(text);

    vec![
        RouteDescriptor::new(Method::GET, "/store/inventory", "getInventory")
            .tag(TAG)
            .summary("Returns pet inventories by status")
            .description("This returns a map of status codes to quantities.")
            .security(api_key())
            .response(200, described_only(inventory_shape(), "Successful operation")),
        RouteDescriptor::new(Method::POST, "/store/order", "placeOrder")
            .tag(TAG)
            .summary("Places an order for a pet")
            .description("This places an order for a pet.")
            .request_body(
                BodyDescriptor::json(order())
                    .required(true)
                    .description("Order placed for purchasing the pet"),
            )
            .response(200, ok_json(order()))
            .response(400, no_body("Invalid input")),
        RouteDescriptor::new(Method::GET, "/store/order/{orderId}", "getOrderById")
            .tag(TAG)
            .summary("Finds purchase order by ID")
            .description("This finds purchase order by ID.")
            .parameter(order_id("ID of order that needs to be fetched"))
            .response(200, described_only(order(), "Successful operation"))
            .response(400, no_body("Invalid ID supplied"))
            .response(404, no_body("Order not found")),
        RouteDescriptor::new(Method::DELETE, "/store/order/{orderId}", "deleteOrder")
            .tag(TAG)
            .summary("Deletes purchase order by ID")
            .description(
                "For valid response try integer IDs with positive integer value. \
                 Negative or non - integer values will generate API errors.",
            )
            .parameter(order_id("ID of order that needs to be deleted"))
            .response(400, no_body("Invalid ID supplied"))
            .response(404, no_body("Order not found")),
    ]
}

pub(super) fn register(dispatcher: &mut Dispatcher) {
    dispatcher.register("getInventory", get_inventory);
    dispatcher.register("placeOrder", place_order);
    dispatcher.register("getOrderById", get_order_by_id);
    dispatcher.register("deleteOrder", delete_order);
}

fn get_inventory(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate(&inventory_shape())?))
}

fn place_order(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate_named("Order")?))
}

fn get_order_by_id(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let id = match path_id(req, "orderId") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let order = ctx.mock.build("Order").with_override("id", json!(id)).create()?;
    Ok(HandlerResponse::json(200, order))
}

fn delete_order(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    if let Err(resp) = path_id(req, "orderId") {
        return Ok(resp);
    }
    Ok(HandlerResponse::empty(200))
}
