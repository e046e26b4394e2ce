//! Transaction notification feed

use axum::{extract::State, Json};

use crate::dto::NotificationsResponse;
use crate::AppState;

/// GET /notifications - Recent transaction notifications, oldest first
pub async fn recent(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.session().recent_notifications(),
    })
}
