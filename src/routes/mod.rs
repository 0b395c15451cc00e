/// Router Module Index
///
/// Splits the HTTP surface by how a request is authenticated. Which role may call
/// an endpoint is decided inside each handler by the route guard, so every
/// endpoint answers to the same access table as the client route it serves.

/// Routes open to anonymous visitors: registration, share-link forms and the
/// route-guard probe.
pub mod public;

/// Routes behind the `AuthUser` middleware.
pub mod authenticated;

/// Company Owner routes, nested under `/owner` and also behind the `AuthUser` middleware.
pub mod owner;
