pub mod auth;
pub mod capability;
pub mod jwt;
pub mod middleware;
