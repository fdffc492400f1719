use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Form, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shelf_authz::{AuthProvider, AuthSession};
use shelf_http::error::AppError;
use shelf_kernel::{InitCtx, Module};

/// Login, logout and the current credential's capabilities.
pub struct AuthModule {
    provider: Arc<AuthProvider>,
}

impl AuthModule {
    pub fn new(provider: Arc<AuthProvider>) -> Self {
        Self { provider }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_endpoint = %ctx.settings.api.token_url(),
            admin_role = %ctx.settings.auth.admin_role,
            logged_in = self.provider.is_logged_in(),
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/session", get(session))
            .with_state(self.provider.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/login": {
                    "post": {
                        "summary": "Exchange credentials for a bearer token",
                        "tags": ["Auth"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "username": { "type": "string" },
                                            "password": { "type": "string" }
                                        },
                                        "required": ["username", "password"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Logged in",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthSession" } } }
                            },
                            "401": { "description": "Login failed" }
                        }
                    }
                },
                "/logout": {
                    "post": {
                        "summary": "Drop the stored credential",
                        "tags": ["Auth"],
                        "responses": {
                            "200": {
                                "description": "Logged out",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthSession" } } }
                            }
                        }
                    }
                },
                "/session": {
                    "get": {
                        "summary": "Current login state and write capability",
                        "tags": ["Auth"],
                        "responses": {
                            "200": {
                                "description": "Session",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthSession" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "AuthSession": {
                        "type": "object",
                        "properties": {
                            "logged_in": { "type": "boolean" },
                            "write_access": { "type": "boolean" },
                            "username": { "type": "string", "nullable": true }
                        },
                        "required": ["logged_in", "write_access"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

async fn login(
    State(provider): State<Arc<AuthProvider>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<AuthSession>, AppError> {
    if provider.login(&form.username, &form.password).await {
        Ok(Json(provider.session()))
    } else {
        Err(AppError::unauthorized("login failed"))
    }
}

async fn logout(State(provider): State<Arc<AuthProvider>>) -> Json<AuthSession> {
    provider.logout();
    Json(provider.session())
}

async fn session(State(provider): State<Arc<AuthProvider>>) -> Json<AuthSession> {
    Json(provider.session())
}
