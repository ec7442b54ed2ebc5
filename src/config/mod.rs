//! Configuration module

mod site;

pub use site::BlogConfig;
pub use site::CacheConfig;
pub use site::{ADMIN_TOKEN_ENV, SHARED_CACHE_URL_ENV};
