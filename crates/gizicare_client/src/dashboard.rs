//! Dashboard aggregates and their chart/summary views.
//!
//! The three `/dashboard/*-data` endpoints return one section per period
//! filter. Sections are decoded independently: a malformed or missing
//! section becomes `None` and renders as an empty chart with a zeroed
//! summary, leaving the other filters usable.

use crate::utils::{de_lenient_f64, parse_date};
use chrono::{Datelike, Weekday};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DashboardFilter {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "last30Days")]
    Last30Days,
}

impl DashboardFilter {
    pub const ALL: [DashboardFilter; 4] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Last30Days,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "daily" | "day" => Some(Self::Daily),
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            "last30days" | "30days" | "30d" => Some(Self::Last30Days),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Last30Days => "last30Days",
        }
    }
}

fn de_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(section) => Ok(Some(section)),
        Err(e) => {
            tracing::warn!("ignoring malformed dashboard section: {}", e);
            Ok(None)
        }
    }
}

/// A number that decodes from anything; non-numeric input becomes 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de_lenient_f64(deserializer).map(Amount)
    }
}

// === Calories ===

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Energy {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub intake: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub burned: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub net: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaloriesDaily {
    pub today: Energy,
    pub yesterday: Energy,
    pub date: Option<String>,
    pub percentage_changes: Energy,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaloriesWeekly {
    pub current_week: Energy,
    /// Keyed by ISO date.
    pub daily_breakdown: BTreeMap<String, Energy>,
    pub percentage_changes: Energy,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnergyWeek {
    pub week: Amount,
    pub week_start: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub intake: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub burned: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub net: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaloriesMonthly {
    pub current_month: Energy,
    pub weekly_breakdown: Vec<EnergyWeek>,
    pub percentage_changes: Energy,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnergyDay {
    pub date: String,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub intake: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub burned: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub net: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnergyAverages {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_intake: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_burned: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_net: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaloriesLast30 {
    pub daily_data: Vec<EnergyDay>,
    pub totals: Energy,
    pub averages: EnergyAverages,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CaloriesPeriods {
    #[serde(default, deserialize_with = "de_section")]
    pub daily: Option<CaloriesDaily>,
    #[serde(default, deserialize_with = "de_section")]
    pub weekly: Option<CaloriesWeekly>,
    #[serde(default, deserialize_with = "de_section")]
    pub monthly: Option<CaloriesMonthly>,
    #[serde(default, rename = "last30Days", deserialize_with = "de_section")]
    pub last_30_days: Option<CaloriesLast30>,
}

/// `GET /dashboard/calories-data`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CaloriesDashboard {
    #[serde(default)]
    pub calories: CaloriesPeriods,
}

// === Steps ===

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsDaily {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub today: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub yesterday: f64,
    pub date: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub percentage_change: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsWeekly {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub current_week: f64,
    pub daily_breakdown: BTreeMap<String, Amount>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub percentage_change: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsWeek {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub total_steps: f64,
    pub week_start: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsMonthly {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub current_month: f64,
    pub weekly_breakdown: Vec<StepsWeek>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub percentage_change: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsDay {
    pub date: String,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub steps: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepsLast30 {
    pub daily_data: Vec<StepsDay>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub total_steps: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub average_daily: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct StepsPeriods {
    #[serde(default, deserialize_with = "de_section")]
    pub daily: Option<StepsDaily>,
    #[serde(default, deserialize_with = "de_section")]
    pub weekly: Option<StepsWeekly>,
    #[serde(default, deserialize_with = "de_section")]
    pub monthly: Option<StepsMonthly>,
    #[serde(default, rename = "last30Days", deserialize_with = "de_section")]
    pub last_30_days: Option<StepsLast30>,
}

/// `GET /dashboard/activity-data`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ActivityDashboard {
    #[serde(default)]
    pub steps: StepsPeriods,
}

// === Nutrition ===

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Macros {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub fat: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionDay {
    pub date: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub fat: f64,
    pub meal_breakdown: Option<serde_json::Value>,
}

impl NutritionDay {
    pub fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionDaily {
    pub today: NutritionDay,
    pub yesterday: NutritionDay,
    pub percentage_changes: Macros,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionWeekly {
    pub current_week: Macros,
    pub daily_breakdown: BTreeMap<String, Macros>,
    pub percentage_changes: Macros,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionWeek {
    pub week: Amount,
    pub week_start: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub fat: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionMonthly {
    pub current_month: Macros,
    pub weekly_breakdown: Vec<NutritionWeek>,
    pub percentage_changes: Macros,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionDayRow {
    pub date: String,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub fat: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MacroAverages {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_calories: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_protein: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_carbs: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub daily_fat: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NutritionLast30 {
    pub daily_data: Vec<NutritionDayRow>,
    pub totals: Macros,
    pub averages: MacroAverages,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NutritionPeriods {
    #[serde(default, deserialize_with = "de_section")]
    pub daily: Option<NutritionDaily>,
    #[serde(default, deserialize_with = "de_section")]
    pub weekly: Option<NutritionWeekly>,
    #[serde(default, deserialize_with = "de_section")]
    pub monthly: Option<NutritionMonthly>,
    #[serde(default, rename = "last30Days", deserialize_with = "de_section")]
    pub last_30_days: Option<NutritionLast30>,
}

/// `GET /dashboard/nutrition-data`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NutritionDashboard {
    #[serde(default)]
    pub nutrition: NutritionPeriods,
}

// === Views ===

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub date: Option<String>,
    /// One value per entry of `DashboardView::columns`.
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryItem {
    pub name: &'static str,
    pub value: f64,
    /// Percentage change against the previous period, when reported.
    pub change: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: &'static str,
    pub value: f64,
}

/// Chart rows plus summary cards for one dashboard and filter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub columns: &'static [&'static str],
    pub rows: Vec<ChartRow>,
    pub summary: Vec<SummaryItem>,
    pub pie: Vec<PieSlice>,
}

impl DashboardView {
    fn empty(columns: &'static [&'static str], summary: &[&'static str]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            summary: summary
                .iter()
                .map(|&name| SummaryItem {
                    name,
                    value: 0.0,
                    change: None,
                })
                .collect(),
            pie: Vec::new(),
        }
    }
}

/// Produces the view shown for a period filter.
pub trait DashboardData {
    fn view(&self, filter: DashboardFilter) -> DashboardView;
}

const TODAY: &str = "Hari ini";
const YESTERDAY: &str = "Kemarin";

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Sen",
        Weekday::Tue => "Sel",
        Weekday::Wed => "Rab",
        Weekday::Thu => "Kam",
        Weekday::Fri => "Jum",
        Weekday::Sat => "Sab",
        Weekday::Sun => "Min",
    }
}

/// Short Indonesian weekday of an ISO date, or the raw text.
pub fn weekday_label(date: &str) -> String {
    parse_date(date)
        .map(|d| weekday_short(d.weekday()).to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Day of month of an ISO date, or the raw text.
pub fn day_of_month_label(date: &str) -> String {
    parse_date(date)
        .map(|d| d.day().to_string())
        .unwrap_or_else(|| date.to_string())
}

pub fn week_label(n: impl std::fmt::Display) -> String {
    format!("Minggu {n}")
}

fn item(name: &'static str, value: f64, change: Option<f64>) -> SummaryItem {
    SummaryItem {
        name,
        value,
        change,
    }
}

fn row(label: impl Into<String>, date: Option<String>, values: Vec<f64>) -> ChartRow {
    ChartRow {
        label: label.into(),
        date,
        values,
    }
}

const ENERGY_COLUMNS: &[&str] = &["intake", "burned", "net"];
const ENERGY_SUMMARY: &[&str] = &["total_intake", "total_burned", "net_calories"];

fn energy_summary(totals: &Energy, changes: &Energy) -> Vec<SummaryItem> {
    vec![
        item("total_intake", totals.intake, Some(changes.intake)),
        item("total_burned", totals.burned, Some(changes.burned)),
        item("net_calories", totals.net, Some(changes.net)),
    ]
}

fn energy_values(e: &Energy) -> Vec<f64> {
    vec![e.intake, e.burned, e.net]
}

impl DashboardData for CaloriesDashboard {
    fn view(&self, filter: DashboardFilter) -> DashboardView {
        let periods = &self.calories;
        let empty = || DashboardView::empty(ENERGY_COLUMNS, ENERGY_SUMMARY);
        let (rows, summary) = match filter {
            DashboardFilter::Daily => {
                let Some(d) = &periods.daily else {
                    return empty();
                };
                (
                    vec![
                        row(YESTERDAY, d.date.clone(), energy_values(&d.yesterday)),
                        row(TODAY, d.date.clone(), energy_values(&d.today)),
                    ],
                    energy_summary(&d.today, &d.percentage_changes),
                )
            }
            DashboardFilter::Weekly => {
                let Some(w) = &periods.weekly else {
                    return empty();
                };
                (
                    w.daily_breakdown
                        .iter()
                        .map(|(date, e)| row(weekday_label(date), Some(date.clone()), energy_values(e)))
                        .collect(),
                    energy_summary(&w.current_week, &w.percentage_changes),
                )
            }
            DashboardFilter::Monthly => {
                let Some(m) = &periods.monthly else {
                    return empty();
                };
                (
                    m.weekly_breakdown
                        .iter()
                        .map(|w| {
                            row(
                                week_label(w.week.0),
                                w.week_start.clone(),
                                vec![w.intake, w.burned, w.net],
                            )
                        })
                        .collect(),
                    energy_summary(&m.current_month, &m.percentage_changes),
                )
            }
            DashboardFilter::Last30Days => {
                let Some(l) = &periods.last_30_days else {
                    return empty();
                };
                (
                    l.daily_data
                        .iter()
                        .map(|d| {
                            row(
                                day_of_month_label(&d.date),
                                Some(d.date.clone()),
                                vec![d.intake, d.burned, d.net],
                            )
                        })
                        .collect(),
                    vec![
                        item("total_intake", l.totals.intake, None),
                        item("total_burned", l.totals.burned, None),
                        item("net_calories", l.totals.net, None),
                        item("avg_intake", l.averages.daily_intake, None),
                        item("avg_burned", l.averages.daily_burned, None),
                        item("avg_net", l.averages.daily_net, None),
                    ],
                )
            }
        };
        DashboardView {
            columns: ENERGY_COLUMNS,
            rows,
            summary,
            pie: Vec::new(),
        }
    }
}

const STEPS_COLUMNS: &[&str] = &["steps"];
const STEPS_SUMMARY: &[&str] = &["total", "average"];

fn steps_summary(total: f64, average: f64, change: f64) -> Vec<SummaryItem> {
    vec![
        item("total", total, Some(change)),
        item("average", average, None),
    ]
}

impl DashboardData for ActivityDashboard {
    fn view(&self, filter: DashboardFilter) -> DashboardView {
        let periods = &self.steps;
        let empty = || DashboardView::empty(STEPS_COLUMNS, STEPS_SUMMARY);
        let (rows, summary) = match filter {
            DashboardFilter::Daily => {
                let Some(d) = &periods.daily else {
                    return empty();
                };
                (
                    vec![
                        row(YESTERDAY, d.date.clone(), vec![d.yesterday]),
                        row(TODAY, d.date.clone(), vec![d.today]),
                    ],
                    steps_summary(d.today, d.today, d.percentage_change),
                )
            }
            DashboardFilter::Weekly => {
                let Some(w) = &periods.weekly else {
                    return empty();
                };
                (
                    w.daily_breakdown
                        .iter()
                        .map(|(date, steps)| {
                            row(weekday_label(date), Some(date.clone()), vec![steps.0])
                        })
                        .collect(),
                    steps_summary(
                        w.current_week,
                        (w.current_week / 7.0).round(),
                        w.percentage_change,
                    ),
                )
            }
            DashboardFilter::Monthly => {
                let Some(m) = &periods.monthly else {
                    return empty();
                };
                (
                    m.weekly_breakdown
                        .iter()
                        .enumerate()
                        .map(|(i, w)| row(week_label(i + 1), w.week_start.clone(), vec![w.total_steps]))
                        .collect(),
                    steps_summary(
                        m.current_month,
                        (m.current_month / 30.0).round(),
                        m.percentage_change,
                    ),
                )
            }
            DashboardFilter::Last30Days => {
                let Some(l) = &periods.last_30_days else {
                    return empty();
                };
                (
                    l.daily_data
                        .iter()
                        .map(|d| row(day_of_month_label(&d.date), Some(d.date.clone()), vec![d.steps]))
                        .collect(),
                    steps_summary(l.total_steps, l.average_daily, 0.0),
                )
            }
        };
        DashboardView {
            columns: STEPS_COLUMNS,
            rows,
            summary,
            pie: Vec::new(),
        }
    }
}

const MACRO_COLUMNS: &[&str] = &["calories", "protein", "carbs", "fat"];
const MACRO_SUMMARY: &[&str] = &["total_calories", "total_protein", "total_carbs", "total_fat"];

fn macro_values(m: &Macros) -> Vec<f64> {
    vec![m.calories, m.protein, m.carbs, m.fat]
}

fn macro_summary(totals: &Macros, changes: Option<&Macros>) -> Vec<SummaryItem> {
    vec![
        item("total_calories", totals.calories, changes.map(|c| c.calories)),
        item("total_protein", totals.protein, changes.map(|c| c.protein)),
        item("total_carbs", totals.carbs, changes.map(|c| c.carbs)),
        item("total_fat", totals.fat, changes.map(|c| c.fat)),
    ]
}

/// Protein/carbs/fat slices, omitting empty ones.
pub fn macro_pie(m: &Macros) -> Vec<PieSlice> {
    [
        ("Protein", m.protein),
        ("Karbohidrat", m.carbs),
        ("Lemak", m.fat),
    ]
    .into_iter()
    .filter(|(_, v)| v.is_finite() && *v > 0.0)
    .map(|(name, value)| PieSlice { name, value })
    .collect()
}

impl DashboardData for NutritionDashboard {
    fn view(&self, filter: DashboardFilter) -> DashboardView {
        let periods = &self.nutrition;
        let empty = || DashboardView::empty(MACRO_COLUMNS, MACRO_SUMMARY);
        let (rows, summary, pie) = match filter {
            DashboardFilter::Daily => {
                let Some(d) = &periods.daily else {
                    return empty();
                };
                let today = d.today.macros();
                (
                    vec![
                        row(YESTERDAY, d.yesterday.date.clone(), macro_values(&d.yesterday.macros())),
                        row(TODAY, d.today.date.clone(), macro_values(&today)),
                    ],
                    macro_summary(&today, Some(&d.percentage_changes)),
                    macro_pie(&today),
                )
            }
            DashboardFilter::Weekly => {
                let Some(w) = &periods.weekly else {
                    return empty();
                };
                (
                    w.daily_breakdown
                        .iter()
                        .map(|(date, m)| row(weekday_label(date), Some(date.clone()), macro_values(m)))
                        .collect(),
                    macro_summary(&w.current_week, Some(&w.percentage_changes)),
                    macro_pie(&w.current_week),
                )
            }
            DashboardFilter::Monthly => {
                let Some(m) = &periods.monthly else {
                    return empty();
                };
                (
                    m.weekly_breakdown
                        .iter()
                        .map(|w| {
                            row(
                                week_label(w.week.0),
                                w.week_start.clone(),
                                vec![w.calories, w.protein, w.carbs, w.fat],
                            )
                        })
                        .collect(),
                    macro_summary(&m.current_month, Some(&m.percentage_changes)),
                    macro_pie(&m.current_month),
                )
            }
            DashboardFilter::Last30Days => {
                let Some(l) = &periods.last_30_days else {
                    return empty();
                };
                let mut summary = macro_summary(&l.totals, None);
                summary.extend([
                    item("avg_calories", l.averages.daily_calories, None),
                    item("avg_protein", l.averages.daily_protein, None),
                    item("avg_carbs", l.averages.daily_carbs, None),
                    item("avg_fat", l.averages.daily_fat, None),
                ]);
                (
                    l.daily_data
                        .iter()
                        .map(|d| {
                            row(
                                day_of_month_label(&d.date),
                                Some(d.date.clone()),
                                vec![d.calories, d.protein, d.carbs, d.fat],
                            )
                        })
                        .collect(),
                    summary,
                    macro_pie(&l.totals),
                )
            }
        };
        DashboardView {
            columns: MACRO_COLUMNS,
            rows,
            summary,
            pie,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn calories() -> CaloriesDashboard {
        serde_json::from_value(json!({
            "calories": {
                "daily": {
                    "today": {"intake": 1800, "burned": "400", "net": 1400},
                    "yesterday": {"intake": 2000, "burned": 300, "net": 1700},
                    "date": "2025-06-10",
                    "percentage_changes": {"intake": -10, "burned": 33.3, "net": -17.6}
                },
                "weekly": {
                    "current_week": {"intake": 12000, "burned": 2000, "net": 10000},
                    "daily_breakdown": {
                        "2025-06-10": {"intake": 1800, "burned": 400, "net": 1400},
                        "2025-06-09": {"intake": 2000, "burned": 300, "net": 1700}
                    },
                    "percentage_changes": {"intake": 1, "burned": 2, "net": 3}
                },
                "monthly": {
                    "current_month": {"intake": 50000, "burned": 9000, "net": 41000},
                    "weekly_breakdown": [
                        {"week": 1, "week_start": "2025-06-02", "intake": 14000, "burned": 2000, "net": 12000}
                    ],
                    "percentage_changes": {"intake": 0, "burned": 0, "net": 0}
                },
                "last30Days": "broken"
            }
        }))
        .expect("calories payload")
    }

    #[test]
    fn filter_names_match_api_keys() {
        assert_eq!(DashboardFilter::parse("last-30-days"), Some(DashboardFilter::Last30Days));
        assert_eq!(DashboardFilter::Last30Days.as_str(), "last30Days");
        assert_eq!(
            serde_json::to_value(DashboardFilter::Last30Days).unwrap(),
            json!("last30Days")
        );
    }

    #[test]
    fn calories_daily_rows_are_yesterday_then_today() {
        let v = calories().view(DashboardFilter::Daily);
        assert_eq!(v.rows.len(), 2);
        assert_eq!(v.rows[0].label, "Kemarin");
        assert_eq!(v.rows[1].label, "Hari ini");
        assert_eq!(v.rows[1].values, vec![1800.0, 400.0, 1400.0]);
        assert_eq!(v.summary[1].change, Some(33.3));
    }

    #[test]
    fn calories_weekly_rows_sorted_by_date_with_weekday_labels() {
        let v = calories().view(DashboardFilter::Weekly);
        let labels: Vec<_> = v.rows.iter().map(|r| r.label.as_str()).collect();
        // 2025-06-09 is a Monday
        assert_eq!(labels, ["Sen", "Sel"]);
        assert_eq!(v.summary[0].value, 12000.0);
    }

    #[test]
    fn calories_monthly_uses_week_numbers() {
        let v = calories().view(DashboardFilter::Monthly);
        assert_eq!(v.rows[0].label, "Minggu 1");
        assert_eq!(v.rows[0].date.as_deref(), Some("2025-06-02"));
    }

    #[test]
    fn malformed_section_renders_empty() {
        let v = calories().view(DashboardFilter::Last30Days);
        assert!(v.rows.is_empty());
        assert_eq!(v.summary.len(), 3);
        assert!(v.summary.iter().all(|s| s.value == 0.0));
    }

    #[test]
    fn steps_averages() {
        let d: ActivityDashboard = serde_json::from_value(json!({
            "steps": {
                "weekly": {"current_week": 70000, "daily_breakdown": {"2025-06-09": "9000"}, "percentage_change": 5},
                "monthly": {"current_month": 240000, "weekly_breakdown": [
                    {"total_steps": 60000, "week_start": "2025-06-02"},
                    {"total_steps": 50000, "week_start": "2025-06-09"}
                ], "percentage_change": -2},
                "last30Days": {"daily_data": [{"date": "2025-06-01", "steps": 8000}], "total_steps": 8000, "average_daily": 267}
            }
        }))
        .unwrap();
        let w = d.view(DashboardFilter::Weekly);
        assert_eq!(w.summary[1].value, 10000.0);
        assert_eq!(w.rows[0].values, vec![9000.0]);

        let m = d.view(DashboardFilter::Monthly);
        assert_eq!(m.summary[1].value, 8000.0);
        assert_eq!(m.rows[1].label, "Minggu 2");

        let l = d.view(DashboardFilter::Last30Days);
        assert_eq!(l.rows[0].label, "1");
        assert_eq!(l.summary[0].change, Some(0.0));

        assert!(d.view(DashboardFilter::Daily).rows.is_empty());
    }

    #[test]
    fn nutrition_pie_skips_zero_slices() {
        let d: NutritionDashboard = serde_json::from_value(json!({
            "nutrition": {
                "daily": {
                    "today": {"date": "2025-06-10", "calories": 1500, "protein": 60, "carbs": 0, "fat": "40"},
                    "yesterday": {"date": "2025-06-09", "calories": 1700, "protein": 70, "carbs": 200, "fat": 50},
                    "percentage_changes": {"calories": -11.8, "protein": -14.3, "carbs": -100, "fat": -20}
                }
            }
        }))
        .unwrap();
        let v = d.view(DashboardFilter::Daily);
        let names: Vec<_> = v.pie.iter().map(|s| s.name).collect();
        assert_eq!(names, ["Protein", "Lemak"]);
        assert_eq!(v.rows[0].date.as_deref(), Some("2025-06-09"));
        assert_eq!(v.summary[0].change, Some(-11.8));
        assert!(d.view(DashboardFilter::Weekly).pie.is_empty());
    }

    #[test]
    fn labels_fall_back_to_raw_text() {
        assert_eq!(weekday_label("soon"), "soon");
        assert_eq!(day_of_month_label("2025-06-07"), "7");
    }
}
