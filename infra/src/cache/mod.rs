//! Cache module for Redis-backed refresh token storage
//!
//! Provides the Redis client with connection retry logic and the
//! document-per-hash token repository built on it.

pub mod redis_client;
pub mod redis_token_repository;


pub use redis_client::RedisClient;
pub use redis_token_repository::RedisTokenRepository;

// Re-export commonly used types
pub use ld_shared::config::CacheConfig;
