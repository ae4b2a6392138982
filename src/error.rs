use crate::order_book::{OrderId, OrderStatus};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("invalid order: {0}")]
    Validation(String),

    #[error("order {order_id} not found")]
    NotFound { order_id: OrderId },

    #[error("order {order_id} belongs to another owner")]
    NotOwner { order_id: OrderId },

    #[error("order {order_id} is already {status}")]
    AlreadyTerminal {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("missing or invalid owner id")]
    Unauthorized,

    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl ExchangeError {
    /// True for the errors a cancel sees when it loses a race or targets someone
    /// else's order, as opposed to bad input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ExchangeError::NotOwner { .. } | ExchangeError::AlreadyTerminal { .. }
        )
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ExchangeError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ExchangeError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ExchangeError::NotOwner { .. } => (StatusCode::FORBIDDEN, "NOT_OWNER"),
            ExchangeError::AlreadyTerminal { .. } => (StatusCode::CONFLICT, "ALREADY_TERMINAL"),
            ExchangeError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ExchangeError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        }
    }
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            // storage details stay in the logs
            ExchangeError::Persistence(_) => "storage failure, please resubmit".to_string(),
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ExchangeError;
    use crate::order_book::OrderStatus;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn conflicts_are_distinguishable_from_input_errors() {
        let not_owner = ExchangeError::NotOwner { order_id: 1 };
        let terminal = ExchangeError::AlreadyTerminal {
            order_id: 1,
            status: OrderStatus::Filled,
        };
        let missing = ExchangeError::NotFound { order_id: 1 };

        assert!(not_owner.is_conflict());
        assert!(terminal.is_conflict());
        assert!(!missing.is_conflict());
        assert!(!ExchangeError::Validation("bad".into()).is_conflict());
        assert_eq!(terminal.to_string(), "order 1 is already filled");
    }

    #[test]
    fn errors_map_to_http_statuses() {
        let cases = vec![
            (ExchangeError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ExchangeError::NotFound { order_id: 7 }, StatusCode::NOT_FOUND),
            (ExchangeError::NotOwner { order_id: 7 }, StatusCode::FORBIDDEN),
            (
                ExchangeError::AlreadyTerminal {
                    order_id: 7,
                    status: OrderStatus::Canceled,
                },
                StatusCode::CONFLICT,
            ),
            (ExchangeError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ExchangeError::Persistence(anyhow::anyhow!("disk gone")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
