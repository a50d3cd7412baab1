//! Derived metrics shown on the activity diary.
//!
//! Every function here is total and side-effect free. Canonical BMR/TDEE
//! values come from the server; these are display estimates.

use crate::{ActivityLevel, ActivityRecord, Profile};
use serde::Serialize;
use std::fmt;

/// Body weight assumed when a profile has none.
pub const DEFAULT_WEIGHT_KG: f64 = 60.0;
/// kcal per step per kg.
pub const STEP_KCAL_PER_KG: f64 = 0.0005;
/// Recommended daily water intake per kg of body weight.
pub const WATER_ML_PER_KG: f64 = 50.0;

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
    Unknown,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if !bmi.is_finite() || bmi <= 0.0 {
            Self::Unknown
        } else if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Kurus",
            Self::Normal => "Normal",
            Self::Overweight => "Gemuk",
            Self::Obese => "Obesitas",
            Self::Unknown => "-",
        }
    }
}

/// Activity multiplier for a free-form level name; unknown levels use 1.2.
pub fn activity_factor(level: &str) -> f64 {
    ActivityLevel::parse(level).factor()
}

pub fn tee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * level.factor()
}

/// Intake compared against the energy target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NutritionStatus {
    Deficit,
    Balanced,
    Surplus,
}

impl NutritionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Deficit => "Kekurangan kalori",
            Self::Balanced => "Kalori terpenuhi",
            Self::Surplus => "Kelebihan kalori",
        }
    }
}

impl fmt::Display for NutritionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn nutrition_status(intake: f64, tee: f64) -> NutritionStatus {
    if intake < tee {
        NutritionStatus::Deficit
    } else if intake == tee {
        NutritionStatus::Balanced
    } else {
        NutritionStatus::Surplus
    }
}

pub fn calories_from_steps(steps: u64, weight_kg: Option<f64>) -> f64 {
    steps as f64 * weight_kg.unwrap_or(DEFAULT_WEIGHT_KG) * STEP_KCAL_PER_KG
}

/// MET × kg × hours.
pub fn calories_from_exercise(met: f64, weight_kg: f64, minutes: f64) -> f64 {
    met * weight_kg * (minutes / 60.0)
}

/// What is left of the target after intake, exercise not credited back.
pub fn remaining_calories(tee: f64, intake: f64) -> f64 {
    (tee - intake).round()
}

pub fn recommended_water_ml(weight_kg: f64) -> f64 {
    weight_kg * WATER_ML_PER_KG
}

/// Intake as a percentage of the target. A zero target is treated as 1.
pub fn intake_percentage(intake: f64, tee: f64) -> f64 {
    let target = if tee == 0.0 { 1.0 } else { tee };
    intake / target * 100.0
}

/// Everything the diary summary cards show for one profile and day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailySummary {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub bmr: f64,
    pub tee: f64,
    pub intake: f64,
    pub status: NutritionStatus,
    pub burned_exercise: f64,
    pub burned_steps: f64,
    pub burned_total: f64,
    pub remaining: f64,
    /// Clamped to 100 for the progress bar.
    pub intake_progress: f64,
    pub water_ml: f64,
    pub water_target_ml: f64,
    pub sleep_hours: f64,
    pub steps: u64,
}

/// Combine a profile with the day's aggregate.
///
/// `level_override` replaces the profile's activity level for the TEE
/// estimate. `met` is the MET value of the latest exercise, if any.
pub fn daily_summary(
    profile: &Profile,
    day: Option<&ActivityRecord>,
    met: Option<f64>,
    level_override: Option<ActivityLevel>,
) -> DailySummary {
    let level = level_override.unwrap_or(profile.activity_level);
    let bmr = profile.bmr.unwrap_or(0.0);
    let tee = tee(bmr, level);
    let intake = day.map(|d| d.total_calories).unwrap_or(0.0);
    let minutes = day.map(|d| d.total_duration).unwrap_or(0.0);
    let steps = day.map(|d| d.total_steps).unwrap_or(0);
    let met = if day.and_then(|d| d.latest_exercise_id).is_some() {
        met.unwrap_or(1.0)
    } else {
        0.0
    };
    let burned_exercise = calories_from_exercise(met, profile.weight, minutes);
    let burned_steps = calories_from_steps(steps, Some(profile.weight));
    let bmi = bmi(profile.weight, profile.height);

    DailySummary {
        bmi,
        bmi_category: BmiCategory::from_bmi(bmi),
        bmr,
        tee,
        intake,
        status: nutrition_status(intake, tee),
        burned_exercise,
        burned_steps,
        burned_total: burned_exercise + burned_steps,
        remaining: remaining_calories(tee, intake),
        intake_progress: intake_percentage(intake, tee).min(100.0),
        water_ml: day.map(|d| d.total_water).unwrap_or(0.0),
        water_target_ml: recommended_water_ml(profile.weight),
        sleep_hours: day.map(|d| d.total_sleep).unwrap_or(0.0),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn profile() -> Profile {
        Profile {
            id: 1,
            name: "Budi".into(),
            weight: 70.0,
            height: 175.0,
            age: 30,
            gender: "male".into(),
            activity_level: ActivityLevel::Moderate,
            bmr: Some(1500.0),
            tdee: None,
        }
    }

    #[test]
    fn bmi_of_reference_adult() {
        let v = bmi(70.0, 175.0);
        assert!((v - 22.86).abs() < 0.01);
        assert_eq!(BmiCategory::from_bmi(v), BmiCategory::Normal);
    }

    #[test]
    fn tee_uses_activity_factor() {
        assert!(close(tee(1500.0, ActivityLevel::Moderate), 2325.0));
        assert!(close(activity_factor("very active"), 1.9));
        assert!(close(activity_factor("marathoner"), 1.2));
        assert!(close(tee(1000.0, ActivityLevel::Unknown), 1200.0));
    }

    #[test]
    fn status_compares_intake_with_target() {
        assert_eq!(nutrition_status(2000.0, 2325.0), NutritionStatus::Deficit);
        assert_eq!(
            nutrition_status(2000.0, 2325.0).label(),
            "Kekurangan kalori"
        );
        assert_eq!(nutrition_status(2325.0, 2325.0), NutritionStatus::Balanced);
        assert_eq!(nutrition_status(2400.0, 2325.0), NutritionStatus::Surplus);
    }

    #[test]
    fn step_calories() {
        assert!(close(calories_from_steps(10_000, Some(70.0)), 350.0));
        assert!(close(calories_from_steps(10_000, None), 300.0));
        assert!(close(calories_from_steps(0, Some(70.0)), 0.0));
    }

    #[test]
    fn intake_percentage_guards_zero_target() {
        assert!(close(intake_percentage(500.0, 0.0), 50_000.0));
        assert!(close(intake_percentage(1000.0, 2000.0), 50.0));
    }

    #[test]
    fn daily_summary_combines_sources() {
        let day = ActivityRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            total_sleep: 7.0,
            total_steps: 10_000,
            total_duration: 30.0,
            total_calories: 2000.0,
            total_water: 1500.0,
            latest_exercise_id: Some(3),
            latest_exercise_name: Some("Jogging".into()),
            latest_exercise_met: Some(7.0),
        };
        let s = daily_summary(&profile(), Some(&day), Some(7.0), None);
        assert!(close(s.tee, 2325.0));
        assert_eq!(s.status, NutritionStatus::Deficit);
        assert!(close(s.burned_exercise, 245.0));
        assert!(close(s.burned_steps, 350.0));
        assert!(close(s.burned_total, 595.0));
        assert!(close(s.remaining, 325.0));
        assert!(close(s.water_target_ml, 3500.0));
    }

    #[test]
    fn daily_summary_without_day_is_zeroed() {
        let s = daily_summary(&profile(), None, None, Some(ActivityLevel::Sedentary));
        assert!(close(s.tee, 1800.0));
        assert!(close(s.intake, 0.0));
        assert!(close(s.burned_total, 0.0));
        assert_eq!(s.steps, 0);
    }
}
