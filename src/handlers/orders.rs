use crate::AppState;
use crate::error::ExchangeError;
use crate::exchange::{Exchange, OrderRequest};
use crate::handlers::Owner;
use crate::order_book::OrderId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::{info, warn};

pub async fn place_order_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
    Owner(owner): Owner,
    Json(request): Json<OrderRequest>,
) -> Result<impl IntoResponse, ExchangeError> {
    let placed = exchange.place_order(owner, request).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

pub async fn cancel_order_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
    Owner(owner): Owner,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ExchangeError> {
    match exchange.cancel_order(owner, order_id).await {
        Ok(order) => Ok((StatusCode::OK, Json(order))),
        Err(err) => {
            if err.is_conflict() {
                info!("Cancel of order {order_id} by {owner} rejected: {err}");
            } else {
                warn!("Cancel of order {order_id} by {owner} failed: {err}");
            }
            Err(err)
        }
    }
}

pub async fn user_orders_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
    Owner(owner): Owner,
) -> Result<impl IntoResponse, ExchangeError> {
    let orders = exchange.user_orders(owner).await?;
    Ok((StatusCode::OK, Json(orders)))
}

pub async fn user_trades_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
    Owner(owner): Owner,
) -> Result<impl IntoResponse, ExchangeError> {
    let trades = exchange.user_trades(owner).await?;
    Ok((StatusCode::OK, Json(trades)))
}

pub async fn all_trades_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
) -> Result<impl IntoResponse, ExchangeError> {
    let trades = exchange.all_trades().await?;
    Ok((StatusCode::OK, Json(trades)))
}
