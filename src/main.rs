use crate::config::Config;
use crate::exchange::{Exchange, MatchingExchange};
use crate::persistence::InMemoryStore;
use axum::Router;
use axum::routing::{delete, get, post};
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;
use std::sync::Arc;

mod config;
mod error;
mod exchange;
mod handlers;
mod order_book;
mod persistence;

pub struct AppState<E: Exchange> {
    pub exchange: Arc<E>,
}

impl<E: Exchange> Clone for AppState<E> {
    fn clone(&self) -> Self {
        AppState {
            exchange: self.exchange.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new().env().init()?;
    let config = Config::parse();

    // the book is a cache of the store's open orders, rebuild it before serving
    let store = Arc::new(InMemoryStore::new());
    let exchange = MatchingExchange::restore(store).await?;
    let app_state = AppState {
        exchange: Arc::new(exchange),
    };

    // HTTP server to expose exchange functionality
    let router = Router::new()
        .route(
            "/orders",
            post(handlers::orders::place_order_handler).get(handlers::orders::user_orders_handler),
        )
        .route(
            "/orders/{id}",
            delete(handlers::orders::cancel_order_handler),
        )
        .route("/orderbook", get(handlers::order_book::order_book_handler))
        .route("/orderbook/live", get(handlers::order_book::live_book_handler))
        .route("/orderbook/levels", get(handlers::order_book::levels_handler))
        .route("/best/{side}", get(handlers::order_book::best_order_handler))
        .route("/trades", get(handlers::orders::user_trades_handler))
        .route("/trades/all", get(handlers::orders::all_trades_handler))
        .with_state(app_state);

    info!("Starting HTTP server at {}...", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
