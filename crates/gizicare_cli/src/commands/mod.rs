//! One module per screen. Every handler validates its input first, then
//! fetches or submits through the client, then renders the result.

mod account;
mod dashboard;
mod diary;
mod food;
mod notifications;
mod profiles;
mod schema;

use crate::cli::Command;
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::render::Format;
use chrono::{Local, NaiveDate};
use gizicare_client::Upload;
use std::path::Path;

pub async fn dispatch(command: Command, ctx: &mut Context, fmt: Format) -> CliResult<String> {
    match command {
        Command::Login {
            email,
            password,
            remember,
        } => account::login(ctx, fmt, email, password, remember).await,
        Command::Logout => account::logout(ctx).await,
        Command::Register {
            name,
            email,
            password,
            password_confirmation,
            role,
            image,
        } => {
            let form = account::RegisterForm {
                name,
                email,
                password,
                password_confirmation,
                role,
                image,
            };
            account::register(ctx, form).await
        }
        Command::Me => account::me(ctx, fmt).await,
        Command::Profiles { action } => profiles::run(ctx, fmt, action).await,
        Command::Exercises => diary::exercises(ctx, fmt).await,
        Command::Diary { action } => diary::run(ctx, fmt, action).await,
        Command::Food { action } => food::run(ctx, fmt, action).await,
        Command::Detect {
            images,
            accept,
            servings,
            dry_run,
        } => {
            let opts = food::DetectOptions {
                accept,
                servings,
                dry_run,
            };
            food::detect(ctx, fmt, &images, opts).await
        }
        Command::Dashboard {
            kind,
            filter,
            profile,
        } => dashboard::run(ctx, fmt, kind, filter, profile).await,
        Command::Notifications { action } => notifications::run(ctx, fmt, action).await,
        Command::Schema { payload } => schema::run(payload),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Read a file into an upload part named after the file.
async fn read_upload(path: &Path) -> CliResult<Upload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidArgument(format!("not a file: {}", path.display())))?;
    Ok(Upload { file_name, bytes })
}
