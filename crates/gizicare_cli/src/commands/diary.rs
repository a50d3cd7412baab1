use super::today;
use crate::cli::DiaryCommand;
use crate::context::Context;
use crate::error::CliResult;
use crate::render::{self, Format, Table};
use chrono::NaiveDate;
use gizicare_client::bucket::{ChartSeries, Granularity, calorie_series};
use gizicare_client::nutrition::{DailySummary, daily_summary, tee};
use gizicare_client::pagination::{
    DEFAULT_MAX_BUTTONS, PageButton, page_slice, pagination_display, total_pages,
};
use gizicare_client::utils::format_date;
use gizicare_client::validation::{ExerciseForm, StepsSleepForm, ValidationError};
use gizicare_client::{ActivityLevel, ActivityPayload, ActivityRecord, Exercise, Profile};
use serde::Serialize;

pub(super) async fn run(ctx: &mut Context, fmt: Format, action: DiaryCommand) -> CliResult<String> {
    match action {
        DiaryCommand::Summary {
            date,
            profile,
            activity_level,
        } => summary(ctx, fmt, date.unwrap_or_else(today), profile, activity_level).await,
        DiaryCommand::AddExercise {
            title,
            details,
            exercise_id,
            duration,
            date,
            profile,
        } => {
            let form = ExerciseForm {
                title,
                details,
                exercise_id,
                duration,
            };
            add_exercise(ctx, form, date.unwrap_or_else(today), profile).await
        }
        DiaryCommand::AddSteps {
            steps,
            sleep,
            date,
            profile,
        } => {
            let form = StepsSleepForm {
                steps,
                sleep_hours: sleep,
            };
            add_steps(ctx, form, date.unwrap_or_else(today), profile).await
        }
        DiaryCommand::History {
            page,
            per_page,
            profile,
        } => history(ctx, fmt, page, per_page, profile).await,
        DiaryCommand::DeleteDay { date, profile } => delete_day(ctx, date, profile).await,
        DiaryCommand::Chart {
            granularity,
            profile,
        } => chart(ctx, fmt, granularity, profile).await,
    }
}

pub(super) async fn exercises(ctx: &Context, fmt: Format) -> CliResult<String> {
    let exercises = ctx.authed()?.list_exercises().await?;
    fmt.emit(&exercises, |list| {
        let mut t = Table::new(["ID", "Olahraga", "MET"]);
        for e in list {
            t.row([e.id.to_string(), e.name.clone(), render::dec(e.met_value)]);
        }
        t.render()
    })
}

/// MET of the day's latest exercise: the value on the record, else the
/// catalogue entry it points at.
fn latest_met(day: Option<&ActivityRecord>, catalogue: &[Exercise]) -> Option<f64> {
    let day = day?;
    day.latest_exercise_met.or_else(|| {
        let id = day.latest_exercise_id?;
        catalogue.iter().find(|e| e.id == id).map(|e| e.met_value)
    })
}

fn parse_level(raw: Option<String>) -> Result<Option<ActivityLevel>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(raw) => match ActivityLevel::parse(&raw) {
            ActivityLevel::Unknown => Err(ValidationError::UnknownActivityLevel(raw)),
            level => Ok(Some(level)),
        },
    }
}

#[derive(Serialize)]
struct SummaryOutput {
    profile_id: u64,
    profile: String,
    date: String,
    #[serde(flatten)]
    summary: DailySummary,
    latest_exercise: Option<String>,
}

async fn summary(
    ctx: &Context,
    fmt: Format,
    date: NaiveDate,
    profile: Option<u64>,
    activity_level: Option<String>,
) -> CliResult<String> {
    let level = parse_level(activity_level)?;
    let profile = ctx.profile(profile).await?;
    let client = ctx.authed()?;
    let records = client.list_activities(profile.id, Some(date)).await?;
    let day = records.iter().find(|r| r.date == date);

    let needs_catalogue = day.is_some_and(|d| d.latest_exercise_met.is_none() && d.latest_exercise_id.is_some());
    let catalogue = if needs_catalogue {
        client.list_exercises().await?
    } else {
        Vec::new()
    };
    let summary = daily_summary(&profile, day, latest_met(day, &catalogue), level);
    let output = SummaryOutput {
        profile_id: profile.id,
        profile: profile.name.clone(),
        date: format_date(date),
        summary,
        latest_exercise: day.and_then(|d| d.latest_exercise_name.clone()),
    };
    fmt.emit(&output, render_summary)
}

fn render_summary(o: &SummaryOutput) -> String {
    let s = &o.summary;
    let mut t = Table::new(["", ""]);
    t.row(["BMI".to_string(), format!("{} ({})", render::dec(s.bmi), s.bmi_category.label())])
        .row(["BMR".to_string(), render::kcal(s.bmr)])
        .row(["Kebutuhan energi (TEE)".to_string(), render::kcal(s.tee)])
        .row(["Asupan".to_string(), render::kcal(s.intake)])
        .row(["Progres asupan".to_string(), render::bar(s.intake_progress, 20)])
        .row(["Sisa kalori".to_string(), render::kcal(s.remaining)])
        .row(["Status".to_string(), s.status.label().to_string()])
        .row(["Terbakar (olahraga)".to_string(), render::kcal(s.burned_exercise)])
        .row(["Terbakar (langkah)".to_string(), render::kcal(s.burned_steps)])
        .row(["Total terbakar".to_string(), render::kcal(s.burned_total)])
        .row(["Langkah".to_string(), render::int(s.steps as f64)])
        .row(["Tidur".to_string(), format!("{} jam", render::dec(s.sleep_hours))])
        .row([
            "Air".to_string(),
            format!("{} / {} ml", render::int(s.water_ml), render::int(s.water_target_ml)),
        ]);
    if let Some(name) = &o.latest_exercise {
        t.row(["Olahraga terakhir".to_string(), name.clone()]);
    }
    format!("{} - {}\n{}", o.profile, o.date, t.render())
}

async fn add_exercise(
    ctx: &Context,
    form: ExerciseForm,
    date: NaiveDate,
    profile: Option<u64>,
) -> CliResult<String> {
    form.check()?;
    let profile = ctx.profile(profile).await?;
    let log = form.validate(profile.id, date)?;
    let client = ctx.authed()?;
    let _ticket = ctx.begin_submit()?;
    client.log_activity(&ActivityPayload::Exercise(log.clone())).await?;
    Ok(format!(
        "Aktivitas {} ({} menit) dicatat untuk {} pada {}.",
        log.activity, log.duration, profile.name, log.date
    ))
}

async fn add_steps(
    ctx: &Context,
    form: StepsSleepForm,
    date: NaiveDate,
    profile: Option<u64>,
) -> CliResult<String> {
    form.check()?;
    let profile = ctx.profile(profile).await?;
    let log = form.validate(profile.id, date)?;
    let client = ctx.authed()?;
    let _ticket = ctx.begin_submit()?;
    client.log_activity(&ActivityPayload::StepsSleep(log.clone())).await?;
    Ok(format!(
        "{} langkah dan {} jam tidur dicatat untuk {} pada {}.",
        render::int(log.steps as f64),
        log.sleep,
        profile.name,
        log.date
    ))
}

#[derive(Serialize)]
struct HistoryPage<'a> {
    page: u32,
    total_pages: u32,
    buttons: Vec<PageButton>,
    records: &'a [ActivityRecord],
}

async fn history(
    ctx: &Context,
    fmt: Format,
    page: u32,
    per_page: usize,
    profile: Option<u64>,
) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let mut records = ctx.authed()?.list_activities(profile.id, None).await?;
    records.sort_by(|a, b| b.date.cmp(&a.date));

    let total = total_pages(records.len(), per_page);
    let page = page.clamp(1, total.max(1));
    let view = HistoryPage {
        page,
        total_pages: total,
        buttons: pagination_display(page, total, DEFAULT_MAX_BUTTONS),
        records: page_slice(&records, page, per_page),
    };
    fmt.emit(&view, |v| {
        if v.records.is_empty() {
            return "Belum ada data aktivitas.".to_string();
        }
        let mut t = Table::new(["Tanggal", "Asupan", "Durasi", "Langkah", "Tidur", "Air"]);
        for r in v.records {
            t.row([
                format_date(r.date),
                render::kcal(r.total_calories),
                format!("{} menit", render::int(r.total_duration)),
                render::int(r.total_steps as f64),
                format!("{} jam", render::dec(r.total_sleep)),
                format!("{} ml", render::int(r.total_water)),
            ]);
        }
        let buttons: Vec<String> = v
            .buttons
            .iter()
            .map(|b| match b {
                PageButton::Page(n) if *n == v.page => format!("[{n}]"),
                other => other.to_string(),
            })
            .collect();
        format!("{}\nHalaman: {}", t.render(), buttons.join(" "))
    })
}

async fn delete_day(ctx: &Context, date: NaiveDate, profile: Option<u64>) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let client = ctx.authed()?;
    let _ticket = ctx.begin_submit()?;
    client.delete_activities_on(profile.id, date).await?;
    Ok(format!(
        "Semua aktivitas {} pada {} dihapus.",
        profile.name,
        format_date(date)
    ))
}

#[derive(Serialize)]
struct ChartOutput {
    granularity: Granularity,
    #[serde(flatten)]
    series: ChartSeries,
    target: Vec<f64>,
}

/// Energy target for the chart's reference line.
fn energy_target(profile: &Profile) -> f64 {
    profile
        .tdee
        .unwrap_or_else(|| tee(profile.bmr.unwrap_or(0.0), profile.activity_level))
}

async fn chart(
    ctx: &Context,
    fmt: Format,
    granularity: Granularity,
    profile: Option<u64>,
) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let records = ctx.authed()?.list_activities(profile.id, None).await?;
    let series = calorie_series(&records, granularity);
    let target = series.baseline(energy_target(&profile));
    let output = ChartOutput {
        granularity,
        series,
        target,
    };
    fmt.emit(&output, |o| {
        if o.series.is_empty() {
            return "Belum ada data kalori.".to_string();
        }
        let mut t = Table::new(["Periode", "Asupan", "TEE"]);
        for ((label, value), target) in o.series.labels.iter().zip(&o.series.values).zip(&o.target) {
            t.row([label.clone(), render::kcal(*value), render::kcal(*target)]);
        }
        t.render()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(met: Option<f64>, exercise_id: Option<u64>) -> ActivityRecord {
        ActivityRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            total_sleep: 7.0,
            total_steps: 4000,
            total_duration: 30.0,
            total_calories: 1500.0,
            total_water: 1200.0,
            latest_exercise_id: exercise_id,
            latest_exercise_name: None,
            latest_exercise_met: met,
        }
    }

    #[test]
    fn latest_met_prefers_record_then_catalogue() {
        let catalogue = vec![Exercise {
            id: 3,
            name: "Lari".into(),
            met_value: 9.8,
        }];
        assert_eq!(latest_met(Some(&record(Some(4.0), Some(3))), &catalogue), Some(4.0));
        assert_eq!(latest_met(Some(&record(None, Some(3))), &catalogue), Some(9.8));
        assert_eq!(latest_met(Some(&record(None, Some(99))), &catalogue), None);
        assert_eq!(latest_met(None, &catalogue), None);
    }

    #[test]
    fn level_override_rejects_unknown() {
        assert_eq!(parse_level(None), Ok(None));
        assert_eq!(parse_level(Some("active".into())), Ok(Some(ActivityLevel::Active)));
        assert!(parse_level(Some("couch".into())).is_err());
    }
}
