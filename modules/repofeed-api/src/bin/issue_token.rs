//! Issue a JWT for a GitHub login, for local development against the API.
//!
//! Usage: `issue-token <login>` with `JWT_SECRET` set in the environment or `.env`.

use anyhow::{bail, Context, Result};

use repofeed_api::jwt::{JwtService, ISSUER};
use repofeed_common::AppConfig;

fn main() -> Result<()> {
    let login = std::env::args()
        .nth(1)
        .context("usage: issue-token <github-login>")?;
    let config = AppConfig::from_env()?;
    let Some(secret) = config.jwt_secret else {
        bail!("JWT_SECRET must be set to issue tokens");
    };

    let token = JwtService::new(&secret, ISSUER.to_string()).create_token(&login)?;
    println!("{token}");
    Ok(())
}
