//! services/api/src/web/payments.rs
//!
//! Relays a payment-intent request to the payment processor.

use axum::{extract::State, Extension, Json};
use educonnect_core::domain::{price_to_minor_units, PaymentIntentRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::AppJson;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentBody {
    /// Amount in major units, as a number or a decimal string.
    #[schema(value_type = f64)]
    pub price: Value,
    /// When present, retries for the same session and payer reuse one intent.
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

fn price_text(price: &Value) -> ApiResult<String> {
    match price {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(ApiError::BadRequest("price must be a number".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = PaymentIntentBody,
    responses(
        (status = 200, body = PaymentIntentResponse),
        (status = 400, description = "Missing or non-positive price", body = ErrorBody),
        (status = 502, description = "Rejected by the payment processor", body = ErrorBody),
        (status = 503, description = "Payment processor unreachable", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_payment_intent_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(body): AppJson<PaymentIntentBody>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let amount_minor = price_to_minor_units(&price_text(&body.price)?)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let request = PaymentIntentRequest {
        amount_minor,
        currency: state.config.payment_currency.clone(),
        idempotency_key: body
            .session_id
            .map(|id| PaymentIntentRequest::idempotency_key_for(id, &claims.email, amount_minor)),
    };
    let intent = state.payments.create_payment_intent(request).await?;

    info!(intent_id = %intent.id, amount_minor, "Payment intent created");
    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
