use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorDetail, HttpValidationError, LocItem, ValidationIssue};
use crate::handlers::{ask_handler, auth_handler, database_handler, model_handler};
use crate::models::{
    AskQueryRequest, AskQueryResponse, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, TokenResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ask Gateway API",
        version = "0.1.0",
        description = "Natural-language questions over registered databases"
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::reset_password,
        database_handler::create_database,
        database_handler::list_databases,
        database_handler::delete_database,
        model_handler::list_models,
        ask_handler::ask_question,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        ResetPasswordRequest,
        TokenResponse,
        MessageResponse,
        AskQueryRequest,
        AskQueryResponse,
        HttpValidationError,
        ValidationIssue,
        LocItem,
        ErrorDetail,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "注册、登录与重置密码"),
        (name = "databases", description = "数据库登记"),
        (name = "models", description = "可用模型"),
        (name = "query", description = "自然语言查询")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
