use crate::AppState;
use crate::error::ExchangeError;
use crate::exchange::Exchange;
use axum::Json;
use crate::order_book::OrderSide;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Book derived from the store; use when correctness matters more than latency.
pub async fn order_book_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
) -> Result<impl IntoResponse, ExchangeError> {
    let book = exchange.order_book().await?;
    Ok((StatusCode::OK, Json(book)))
}

pub async fn live_book_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
) -> impl IntoResponse {
    let book = exchange.live_book().await;
    (StatusCode::OK, Json(book))
}

pub async fn levels_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
) -> impl IntoResponse {
    let levels = exchange.live_levels().await;
    (StatusCode::OK, Json(levels))
}

/// Best price on one side with the quantity resting there, `null` when empty.
pub async fn best_order_handler<E: Exchange>(
    State(AppState { exchange }): State<AppState<E>>,
    Path(side): Path<String>,
) -> Result<impl IntoResponse, ExchangeError> {
    let side: OrderSide = side.parse().map_err(ExchangeError::Validation)?;
    let best_order = exchange.best_order(side).await;
    Ok((StatusCode::OK, Json(best_order)))
}
