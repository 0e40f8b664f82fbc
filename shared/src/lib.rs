// ============================================================================
// NoteHub Core
// ============================================================================
//
// Shared business logic for every NoteHub binary:
// - auth: JWT issuing and verification (HS256, access + refresh pairs)
// - db: sqlx data access for users, notes and folders
// - context: per-process dependency container
// - rate_limit: fixed-window in-memory limiter with a background sweeper
// - routes: Axum routers for the monolith and both services
// - gateway: request forwarding, static discovery, upstream health
// - utils: client IP extraction, validators, security headers
//
// ============================================================================

pub mod auth;
pub mod context;
pub mod db;
pub mod gateway;
pub mod rate_limit;
pub mod routes;
pub mod utils;
