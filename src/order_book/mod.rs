pub mod limit_order_book;
pub mod matching;
mod models;

pub use limit_order_book::LimitOrderBook;
pub use matching::MatchOutcome;
pub use models::*;
