//! dodo-server: GraphQL resolvers, HTTP router and the async store handle.

pub mod graphql;
pub mod http;
pub mod store;

pub use graphql::{Actor, DodoSchema, build_schema, schema_sdl};
pub use http::{AppState, router};
pub use store::Store;
