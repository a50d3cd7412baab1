use super::read_upload;
use crate::cli::{ProfileChanges, ProfileFields, ProfilesCommand};
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::render::{self, Format, Table};
use gizicare_client::Profile;
use gizicare_client::nutrition::{BmiCategory, bmi, tee};
use gizicare_client::validation::{
    ProfileForm, check_can_create_profile, check_can_delete_profile, require_csv,
};
use std::path::Path;

pub(super) async fn run(ctx: &mut Context, fmt: Format, action: ProfilesCommand) -> CliResult<String> {
    match action {
        ProfilesCommand::List => list(ctx, fmt).await,
        ProfilesCommand::Create(fields) => create(ctx, fields).await,
        ProfilesCommand::Update { id, fields } => update(ctx, id, fields).await,
        ProfilesCommand::Delete { id } => delete(ctx, id).await,
        ProfilesCommand::Select { id } => select(ctx, id).await,
        ProfilesCommand::UploadCsv { path } => upload_csv(ctx, fmt, path.as_deref()).await,
    }
}

fn form(fields: ProfileFields) -> ProfileForm {
    ProfileForm {
        name: fields.name,
        weight: fields.weight,
        height: fields.height,
        age: fields.age,
        gender: fields.gender,
        activity_level: fields.activity_level,
    }
}

async fn list(ctx: &Context, fmt: Format) -> CliResult<String> {
    let profiles = ctx.authed()?.list_profiles().await?;
    let selected = ctx.session.selected_profile_id;
    fmt.emit(&profiles, |profiles| {
        if profiles.is_empty() {
            return "Belum ada profil.".to_string();
        }
        let mut t = Table::new([
            "", "ID", "Nama", "Berat", "Tinggi", "Umur", "Gender", "Aktivitas", "BMI", "TEE",
        ]);
        for p in profiles {
            t.row(profile_row(p, selected == Some(p.id)));
        }
        t.render()
    })
}

fn profile_row(p: &Profile, selected: bool) -> Vec<String> {
    let bmi = bmi(p.weight, p.height);
    let tee = match (p.tdee, p.bmr) {
        (Some(tdee), _) => render::int(tdee),
        (None, Some(bmr)) => render::int(tee(bmr, p.activity_level)),
        (None, None) => "-".to_string(),
    };
    vec![
        if selected { "*" } else { "" }.to_string(),
        p.id.to_string(),
        p.name.clone(),
        format!("{} kg", render::dec(p.weight)),
        format!("{} cm", render::dec(p.height)),
        p.age.to_string(),
        p.gender.clone(),
        p.activity_level.to_string(),
        format!("{} ({})", render::dec(bmi), BmiCategory::from_bmi(bmi).label()),
        tee,
    ]
}

async fn create(ctx: &Context, fields: ProfileFields) -> CliResult<String> {
    let input = form(fields).validate()?;
    let client = ctx.authed()?;
    let role = client.user_role().await?;
    let existing = client.list_profiles().await?.len();
    check_can_create_profile(role, existing)?;

    let _ticket = ctx.begin_submit()?;
    client.create_profile(&input).await?;
    Ok(format!("Profil {} berhasil dibuat.", input.name))
}

/// Current values with the given changes applied, as raw form text.
fn merged_form(current: &Profile, changes: ProfileChanges) -> ProfileForm {
    let base = current.input();
    ProfileForm {
        name: changes.name.unwrap_or(base.name),
        weight: changes.weight.unwrap_or_else(|| base.weight.to_string()),
        height: changes.height.unwrap_or_else(|| base.height.to_string()),
        age: changes.age.unwrap_or_else(|| base.age.to_string()),
        gender: changes.gender.unwrap_or(base.gender),
        activity_level: changes
            .activity_level
            .unwrap_or_else(|| base.activity_level.as_str().to_string()),
    }
}

async fn update(ctx: &Context, id: u64, changes: ProfileChanges) -> CliResult<String> {
    let current = ctx.profile(Some(id)).await?;
    let input = merged_form(&current, changes).validate()?;
    let client = ctx.authed()?;
    let _ticket = ctx.begin_submit()?;
    client.update_profile(id, &input).await?;
    Ok(format!("Profil {} berhasil diperbarui.", input.name))
}

async fn delete(ctx: &mut Context, id: u64) -> CliResult<String> {
    {
        let client = ctx.authed()?;
        check_can_delete_profile(client.user_role().await?)?;
        let _ticket = ctx.begin_submit()?;
        client.delete_profile(id).await?;
    }
    if ctx.session.selected_profile_id == Some(id) {
        ctx.session.selected_profile_id = None;
        ctx.tokens.save(&ctx.session).await?;
    }
    Ok(format!("Profil {id} berhasil dihapus."))
}

async fn select(ctx: &mut Context, id: u64) -> CliResult<String> {
    let profile = ctx.profile(Some(id)).await?;
    ctx.select_profile(profile.id).await?;
    Ok(format!("Profil aktif: {} ({})", profile.name, profile.id))
}

async fn upload_csv(ctx: &Context, fmt: Format, path: Option<&Path>) -> CliResult<String> {
    let upload = match path {
        Some(path) if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) => {
            Some(read_upload(path).await?)
        }
        Some(path) => {
            return Err(CliError::InvalidArgument(format!(
                "{} is not a .csv file",
                path.display()
            )));
        }
        None => None,
    };
    let upload = require_csv(upload)?;
    let client = ctx.authed()?;
    let _ticket = ctx.begin_submit()?;
    let response = client.upload_profiles_csv(upload).await?;
    fmt.emit(&response, |r| {
        r.get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("File CSV berhasil diunggah.")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gizicare_client::{ActivityLevel, ProfileInput};

    fn current() -> Profile {
        Profile {
            id: 4,
            name: "Sari".into(),
            weight: 55.5,
            height: 160.0,
            age: 30,
            gender: "female".into(),
            activity_level: ActivityLevel::VeryActive,
            bmr: Some(1300.0),
            tdee: None,
        }
    }

    #[test]
    fn update_keeps_unchanged_fields() {
        let changes = ProfileChanges {
            weight: Some("57".into()),
            ..Default::default()
        };
        let input = merged_form(&current(), changes).validate().unwrap();
        assert_eq!(
            input,
            ProfileInput {
                name: "Sari".into(),
                weight: 57.0,
                height: 160.0,
                age: 30,
                gender: "female".into(),
                activity_level: ActivityLevel::VeryActive,
            }
        );
    }

    #[test]
    fn update_still_validates_changes() {
        let changes = ProfileChanges {
            age: Some("-3".into()),
            ..Default::default()
        };
        assert!(merged_form(&current(), changes).validate().is_err());
    }

    #[test]
    fn selected_profile_is_starred() {
        let row = profile_row(&current(), true);
        assert_eq!(row[0], "*");
        assert_eq!(row[2], "Sari");
        assert_eq!(row[8], "21.7 (Normal)");
    }
}
