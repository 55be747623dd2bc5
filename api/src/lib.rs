//! HTTP surface of the LoanDesk session-continuity service.

pub mod app;
pub mod config;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
