use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod player;
pub mod question;
pub mod session;

/// Compose all route trees and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(player::router())
        .merge(question::router())
        .merge(session::router())
        .merge(docs::router())
        .with_state(state)
}
