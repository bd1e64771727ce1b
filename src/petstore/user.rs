use super::{log_title, no_body, ok_json};
use crate::dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse, HandlerResult};
use crate::mock::COLLECTION_SIZE;
use crate::openapi::{BodyDescriptor, ParameterDescriptor, ResponseDescriptor, RouteDescriptor, SchemaShape};
use http::Method;
use serde_json::{json, Value};

const TAG: &str = "user";

pub const RATE_LIMIT_HEADER: &str = "X-Rate-Limit";
pub const EXPIRES_AFTER_HEADER: &str = "X-Expires-After";

pub(super) fn routes() -> Vec<RouteDescriptor> {
    let user = || SchemaShape::reference("User");
    let users = || SchemaShape::array_of(SchemaShape::reference("User"));
    let with_list = |path: &str, operation_id: &str| {
        RouteDescriptor::new(Method::POST, path, operation_id)
            .tag(TAG)
            .summary("Creates list of users with given input array")
            .description("This Creates list of users with given input array.")
            .request_body(
                BodyDescriptor::json(users())
                    .required(true)
                    .description("List of user object"),
            )
            .response(200, ok_json(users()))
    };

    vec![
        RouteDescriptor::new(Method::POST, "/user", "createUser")
            .tag(TAG)
            .summary("Creates user")
            .description("This can only be done by the logged in user.")
            .request_body(
                BodyDescriptor::json(user())
                    .required(true)
                    .description("Created user object"),
            )
            .response(200, ok_json(user())),
        with_list("/user/createWithArray", "createUsersWithArrayInput"),
        with_list("/user/createWithList", "createUsersWithListInput"),
        RouteDescriptor::new(Method::GET, "/user/login", "loginUser")
            .tag(TAG)
            .summary("Logs user into the system")
            .description("This logs user into the system.")
            .parameter(
                ParameterDescriptor::query("username", SchemaShape::string())
                    .required(true)
                    .described("The user name for login"),
            )
            .parameter(
                ParameterDescriptor::query("password", SchemaShape::string())
                    .required(true)
                    .described("The password for login in clear text"),
            )
            .response(
                200,
                ResponseDescriptor::with_body(
                    "text/plain",
                    SchemaShape::string(),
                    "successful operation",
                )
                .header(
                    RATE_LIMIT_HEADER,
                    SchemaShape::int32(),
                    "calls per hour allowed by the user",
                )
                .header(
                    EXPIRES_AFTER_HEADER,
                    SchemaShape::date_time(),
                    "date in UTC when token expires",
                ),
            ),
        RouteDescriptor::new(Method::GET, "/user/logout", "logoutUser")
            .tag(TAG)
            .summary("Logs out current logged in user session")
            .description("This logs out current logged in user session.")
            .response(200, no_body("successful operation")),
        RouteDescriptor::new(
            Method::GET,
            "/user/{username:regex((?!^login$)(^.+$))}",
            "getUserByName",
        )
        .tag(TAG)
        .summary("Gets user by user name")
        .description("This gets user by user name.")
        .parameter(
            ParameterDescriptor::path("username", SchemaShape::string())
                .described("The user name for login"),
        )
        .response(200, ok_json(user()))
        .response(400, no_body("Invalid username supplied"))
        .response(404, no_body("User not found")),
    ]
}

pub(super) fn register(dispatcher: &mut Dispatcher) {
    dispatcher.register("createUser", create_user);
    dispatcher.register("createUsersWithArrayInput", create_users);
    dispatcher.register("createUsersWithListInput", create_users);
    dispatcher.register("loginUser", login_user);
    dispatcher.register("logoutUser", logout_user);
    dispatcher.register("getUserByName", get_user_by_name);
}

fn create_user(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::json(200, ctx.mock.generate_named("User")?))
}

fn create_users(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let users = ctx.mock.generate_many("User", COLLECTION_SIZE)?;
    Ok(HandlerResponse::json(200, Value::Array(users)))
}

fn login_user(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let rate_limit = ctx.mock.int32();
    let expires_after = ctx.mock.date_time();
    let token = ctx.mock.string("");
    Ok(
        HandlerResponse::text(200, "text/plain; charset=utf-8", token)
            .with_header(RATE_LIMIT_HEADER, rate_limit.to_string())
            .with_header(EXPIRES_AFTER_HEADER, expires_after),
    )
}

fn logout_user(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    Ok(HandlerResponse::empty(200))
}

fn get_user_by_name(req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    log_title(req, ctx);
    let username = req.get_path_param("username").unwrap_or_default();
    let user = ctx
        .mock
        .build("User")
        .with_override("username", json!(username))
        .create()?;
    Ok(HandlerResponse::json(200, user))
}
