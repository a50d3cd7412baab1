//! Terminal front-end for GiziCare: each subcommand is one screen of the
//! web client, driven through [`gizicare_client::GiziCareClient`].

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod render;

use crate::cli::Cli;
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::render::Format;

/// Run one parsed invocation and return what should be printed.
///
/// A rejected token signs the user out locally so the next command asks
/// for a fresh login.
pub async fn run(cli: Cli, ctx: &mut Context) -> CliResult<String> {
    let fmt = Format::from_flag(cli.json);
    let result = commands::dispatch(cli.command, ctx, fmt).await;
    if let Err(e) = &result {
        if e.requires_sign_in() && !matches!(e, CliError::SignInRequired) {
            tracing::info!("token rejected; clearing local session");
            ctx.sign_out().await?;
        }
    }
    result
}
