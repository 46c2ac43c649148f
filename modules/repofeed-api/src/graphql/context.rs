use async_graphql::Context;

use repofeed_common::Identity;

/// Optional caller identity attached to the GraphQL context on each request.
/// None if no valid JWT bearer token or cookie was present.
pub struct AuthContext(pub Option<Identity>);

/// The authenticated caller, if any. Requests executed without an
/// `AuthContext` (schema tests, introspection) are anonymous.
pub fn caller<'a>(ctx: &'a Context<'_>) -> Option<&'a Identity> {
    ctx.data_opt::<AuthContext>().and_then(|auth| auth.0.as_ref())
}
