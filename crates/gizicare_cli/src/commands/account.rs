use super::read_upload;
use crate::context::Context;
use crate::error::CliResult;
use crate::render::{Format, Table};
use gizicare_client::validation::{check_credentials, check_password_confirmation, parse_role};
use gizicare_client::{Credentials, Registration, User, UserRole};
use secrecy::SecretString;
use serde::Serialize;
use std::path::PathBuf;

pub(super) async fn login(
    ctx: &mut Context,
    fmt: Format,
    email: String,
    password: String,
    remember: bool,
) -> CliResult<String> {
    let password = SecretString::from(password);
    check_credentials(&email, &password)?;

    let token = {
        let _ticket = ctx.begin_submit()?;
        let credentials = Credentials {
            email: email.trim().to_string(),
            password,
            remember,
        };
        ctx.client().login(&credentials).await?
    };
    ctx.sign_in(token, remember).await?;
    tracing::info!("signed in as {}", email.trim());

    let user = ctx.authed()?.current_user().await?;
    fmt.emit(&user, |u| format!("Login berhasil. Selamat datang, {}!", u.name))
}

pub(super) async fn logout(ctx: &mut Context) -> CliResult<String> {
    if ctx.session.is_signed_in() {
        if let Err(e) = ctx.authed()?.logout().await {
            tracing::warn!("server logout failed: {}", e);
        }
    }
    ctx.sign_out().await?;
    Ok("Logout berhasil.".to_string())
}

pub(super) struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: String,
    pub image: Option<PathBuf>,
}

pub(super) async fn register(ctx: &mut Context, form: RegisterForm) -> CliResult<String> {
    let password = SecretString::from(form.password);
    let confirmation = SecretString::from(form.password_confirmation);
    check_credentials(&form.email, &password)?;
    check_password_confirmation(&password, &confirmation)?;
    let role = parse_role(&form.role)?;
    let image = match form.image {
        Some(path) => Some(read_upload(&path).await?),
        None => None,
    };

    let _ticket = ctx.begin_submit()?;
    ctx.client()
        .register(Registration {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password,
            password_confirmation: confirmation,
            role,
            image,
        })
        .await?;
    Ok("Registrasi berhasil. Silakan login.".to_string())
}

#[derive(Serialize)]
struct Account {
    #[serde(flatten)]
    user: User,
    role: UserRole,
}

pub(super) async fn me(ctx: &Context, fmt: Format) -> CliResult<String> {
    let client = ctx.authed()?;
    let user = client.current_user().await?;
    let role = client.user_role().await?;
    fmt.emit(&Account { user, role }, |a| {
        let role = match a.role {
            UserRole::Caregiver => "caregiver",
            UserRole::Personal => "personal",
        };
        let mut t = Table::new(["Nama", "Email", "Role"]);
        t.row([a.user.name.as_str(), a.user.email.as_str(), role]);
        t.render()
    })
}
