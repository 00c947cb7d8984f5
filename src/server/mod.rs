//! HTTP surface of the extension
//!
//! Translates the authorization and webhook endpoints into calls on the core
//! modules. Status codes and body shapes live here; protocol logic does not.

mod http;

pub use http::{
    create_router, create_router_with_config, run_http_server, Countersign, RouterConfig,
};
