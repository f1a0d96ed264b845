use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;

/// Compose all route trees and wire in the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router().merge(docs::router()).with_state(state)
}
