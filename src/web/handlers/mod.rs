use axum::Router;
use std::sync::Arc;

use crate::AppContext;

pub mod convert;
pub mod jobs;
pub mod podcast;
pub mod speak;

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .nest("/api", convert::convert_router(ctx.clone()))
        .nest("/api", jobs::jobs_router(ctx.clone()))
        .nest("/api", podcast::podcast_router(ctx.clone()))
        .nest("/api", speak::speak_router(ctx))
}
