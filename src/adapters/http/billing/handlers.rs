//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command handlers.
//! Authentication is expected to happen in front of this service.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::{
    CancelSubscriptionCommand, CreateCheckoutLinkCommand, CreatePortalLinkCommand,
    SetSubscriptionSeatsCommand,
};

use super::super::{ApiError, AppState};
use super::dto::{
    CheckoutLinkRequestDto, LinkResponse, PortalLinkRequestDto, PortalLinkResponse,
    SetSeatsRequestDto,
};

/// POST /billing/checkout-link
pub async fn create_checkout_link(
    State(state): State<AppState>,
    Json(body): Json<CheckoutLinkRequestDto>,
) -> Result<impl IntoResponse, ApiError> {
    let (provider, request) = body.into_request()?;

    let url = state
        .checkout_link_handler()
        .handle(CreateCheckoutLinkCommand { provider, request })
        .await?;

    Ok(Json(LinkResponse { url }))
}

/// POST /billing/portal-link
pub async fn create_portal_link(
    State(state): State<AppState>,
    Json(body): Json<PortalLinkRequestDto>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreatePortalLinkCommand {
        owner: body.owner.into_owner()?,
        provider: body.provider,
        customer_id: body.customer_id,
        redirect_url: body.redirect_url,
    };

    let result = state.portal_link_handler().handle(cmd).await?;

    Ok(Json(PortalLinkResponse {
        url: result.url,
        provider: result.provider,
        customer_id: result.customer_id,
    }))
}

/// PUT /billing/subscriptions/:id/seats
pub async fn set_subscription_seats(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Json(body): Json<SetSeatsRequestDto>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .seats_handler()
        .handle(SetSubscriptionSeatsCommand {
            subscription_id,
            seats: body.seats,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /billing/subscriptions/:id
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .cancel_handler()
        .handle(CancelSubscriptionCommand { subscription_id })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
