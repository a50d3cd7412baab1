use crate::cli::NotificationsCommand;
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::render::{Format, Table};
use chrono::{Local, Timelike, Utc};
use gizicare_client::NotificationList;
use gizicare_client::notifications::{meal_reminder, notification_age};

pub(super) async fn run(ctx: &Context, fmt: Format, action: NotificationsCommand) -> CliResult<String> {
    match action {
        NotificationsCommand::List { limit, unread } => list(ctx, fmt, limit, unread).await,
        NotificationsCommand::Read { id } => read(ctx, &id).await,
        NotificationsCommand::ReadAll => read_all(ctx).await,
    }
}

async fn list(ctx: &Context, fmt: Format, limit: u32, unread_only: bool) -> CliResult<String> {
    let list = ctx.authed()?.notifications(limit, !unread_only).await?;
    fmt.emit(&list, render_list)
}

fn render_list(list: &NotificationList) -> String {
    let now = Utc::now();
    let mut out = format!("{} belum dibaca\n", list.unread_count);
    if let Some(meal) = meal_reminder(Local::now().hour()) {
        out.push_str(&format!("Waktunya {meal}! Jangan lupa catat makananmu.\n"));
    }
    if list.notifications.is_empty() {
        out.push_str("Tidak ada notifikasi.\n");
        return out;
    }
    let mut t = Table::new(["", "ID", "Judul", "Pesan", "Waktu"]);
    for n in &list.notifications {
        t.row([
            if n.is_read { "" } else { "*" }.to_string(),
            n.id.clone(),
            n.title.clone(),
            n.message.clone(),
            notification_age(n, now),
        ]);
    }
    out.push_str(&t.render());
    out
}

async fn read(ctx: &Context, id: &str) -> CliResult<String> {
    let client = ctx.authed()?;
    let mut list = client
        .notifications(gizicare_client::notifications::DEFAULT_LIMIT, true)
        .await?;
    if !list.notifications.iter().any(|n| n.id == id) {
        return Err(CliError::NotFound(format!("notification {id}")));
    }
    let _ticket = ctx.begin_submit()?;
    client.mark_notification_read(id).await?;
    list.mark_read(id);
    Ok(format!("Notifikasi ditandai dibaca. {} belum dibaca.", list.unread_count))
}

async fn read_all(ctx: &Context) -> CliResult<String> {
    let client = ctx.authed()?;
    let mut list = client
        .notifications(gizicare_client::notifications::DEFAULT_LIMIT, false)
        .await?;
    let ids = list.unread_ids();
    if ids.is_empty() {
        return Ok("Semua notifikasi sudah dibaca.".to_string());
    }
    let _ticket = ctx.begin_submit()?;
    for id in &ids {
        client.mark_notification_read(id).await?;
        list.mark_read(id);
    }
    Ok(format!(
        "{} notifikasi ditandai dibaca. {} belum dibaca.",
        ids.len(),
        list.unread_count
    ))
}
