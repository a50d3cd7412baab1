use crate::cli::DashboardKind;
use crate::context::Context;
use crate::error::CliResult;
use crate::render::{self, Format, Table};
use gizicare_client::dashboard::{DashboardData, DashboardFilter, DashboardView};
use serde::Serialize;

#[derive(Serialize)]
struct Output<'a> {
    profile_id: u64,
    filter: DashboardFilter,
    #[serde(flatten)]
    view: &'a DashboardView,
}

pub(super) async fn run(
    ctx: &Context,
    fmt: Format,
    kind: DashboardKind,
    filter: DashboardFilter,
    profile: Option<u64>,
) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let client = ctx.authed()?;
    let view = match kind {
        DashboardKind::Calories => client.calories_dashboard(profile.id).await?.view(filter),
        DashboardKind::Activity => client.activity_dashboard(profile.id).await?.view(filter),
        DashboardKind::Nutrition => client.nutrition_dashboard(profile.id).await?.view(filter),
    };
    let output = Output {
        profile_id: profile.id,
        filter,
        view: &view,
    };
    fmt.emit(&output, |o| {
        format!(
            "{} - {} ({})\n{}",
            title(kind),
            profile.name,
            filter.as_str(),
            render_view(o.view)
        )
    })
}

fn title(kind: DashboardKind) -> &'static str {
    match kind {
        DashboardKind::Calories => "Kalori",
        DashboardKind::Activity => "Langkah",
        DashboardKind::Nutrition => "Nutrisi",
    }
}

fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();
    if view.rows.is_empty() {
        out.push_str("Belum ada data.\n");
    } else {
        let mut t = Table::new(std::iter::once("").chain(view.columns.iter().copied()));
        for row in &view.rows {
            t.row(std::iter::once(row.label.clone()).chain(row.values.iter().map(|v| render::int(*v))));
        }
        out.push_str(&t.render());
    }

    out.push('\n');
    let mut summary = Table::new(["Ringkasan", "Nilai", "Perubahan"]);
    for item in &view.summary {
        summary.row([item.name.to_string(), render::int(item.value), render::change(item.change)]);
    }
    out.push_str(&summary.render());

    if !view.pie.is_empty() {
        let total: f64 = view.pie.iter().map(|s| s.value).sum();
        out.push('\n');
        let mut pie = Table::new(["Makro", "Gram", "Porsi"]);
        for slice in &view.pie {
            let share = if total > 0.0 { slice.value / total * 100.0 } else { 0.0 };
            pie.row([slice.name.to_string(), render::dec(slice.value), format!("{share:.0}%")]);
        }
        out.push_str(&pie.render());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gizicare_client::dashboard::{ChartRow, PieSlice, SummaryItem};

    #[test]
    fn renders_rows_summary_and_pie() {
        let view = DashboardView {
            columns: &["calories", "protein"],
            rows: vec![ChartRow {
                label: "Hari ini".into(),
                date: Some("2025-06-10".into()),
                values: vec![1850.0, 60.0],
            }],
            summary: vec![SummaryItem {
                name: "total_calories",
                value: 1850.0,
                change: Some(12.5),
            }],
            pie: vec![
                PieSlice {
                    name: "Protein",
                    value: 60.0,
                },
                PieSlice {
                    name: "Lemak",
                    value: 20.0,
                },
            ],
        };
        let text = render_view(&view);
        assert!(text.contains("Hari ini  1.850     60"));
        assert!(text.contains("total_calories  1.850  +12.5%"));
        assert!(text.contains("Protein  60.0  75%"));
    }

    #[test]
    fn empty_view_says_so() {
        let view = DashboardView {
            columns: &["steps"],
            rows: vec![],
            summary: vec![],
            pie: vec![],
        };
        assert!(render_view(&view).starts_with("Belum ada data."));
    }
}
