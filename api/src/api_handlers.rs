use std::sync::Arc;

use poem::{
    handler,
    http::StatusCode,
    web::{Data, Json},
    IntoResponse, Request, Response,
};
use serde::Serialize;

use crate::collection::MemoryCollection;
use crate::filter_stage::{FilterRejection, FilterStage};

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
}

pub struct AppState {
    pub offerings: MemoryCollection,
    pub stage: FilterStage,
}

#[handler]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "filter API is running".to_string(),
    })
}

#[handler]
pub async fn list_offerings(state: Data<&Arc<AppState>>, req: &Request) -> Response {
    match state.stage.apply(req, state.offerings.clone()) {
        Ok(collection) => {
            Json(ApiResponse::success(collection.into_records())).into_response()
        }
        Err(rejection) => rejection_response(rejection),
    }
}

fn rejection_response(rejection: FilterRejection) -> Response {
    match rejection {
        FilterRejection::Invalid {
            stage,
            position,
            message,
        } => {
            let body = serde_json::json!({
                "success": false,
                "error": {
                    "stage": stage,
                    "position": position,
                    "message": message,
                },
            });
            Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header(poem::http::header::CONTENT_TYPE, "application/json")
                .body(body.to_string())
        }
        FilterRejection::Internal => {
            let body = ApiResponse::<()>::error(rejection.to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
