//! Business logic services for the application layer.

pub mod link_redirects_service;

pub use link_redirects_service::{
    BYPASS_QUERY_PARAM, DEFAULT_REDIRECT_URL_PREFIX, LinkRedirectsConfig, LinkRedirectsService,
    RedirectOutcome, RequestTimings,
};
