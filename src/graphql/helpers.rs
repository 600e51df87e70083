use async_graphql::{Context, ErrorExtensions};

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, Claims},
    errors::AppResult,
};

/// Maps a service error to a GraphQL error carrying its `code` extension.
pub fn gql<T>(result: AppResult<T>) -> async_graphql::Result<T> {
    result.map_err(|e| e.extend())
}

/// Application state plus the authenticated caller.
pub fn state_and_caller<'a>(ctx: &Context<'a>) -> async_graphql::Result<(&'a AppState, Claims)> {
    let state = ctx.data::<AppState>()?;
    let claims = gql(extract_claims_from_context(ctx))?;
    Ok((state, claims))
}
