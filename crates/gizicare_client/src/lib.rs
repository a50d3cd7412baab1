//! `GiziCareClient` trait, API models and the presentation helpers used by
//! the GiziCare screens.

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bucket;
pub mod config;
pub mod dashboard;
pub mod detection;
pub mod food;
pub mod http_client;
pub mod notifications;
pub mod nutrition;
pub mod observability;
pub mod pagination;
pub mod session;
pub mod utils;
pub mod validation;

use crate::dashboard::{ActivityDashboard, CaloriesDashboard, NutritionDashboard};
use crate::utils::{
    de_date, de_f64, de_id, de_lenient_f64, de_lenient_u64, de_opt_f64, de_opt_id, de_string_id,
    de_u32,
};

#[derive(Debug, Error)]
pub enum GiziCareError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("decoding {what}: {message}")]
    Decode { what: String, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("storage error: {0}")]
    Storage(String),
}

impl GiziCareError {
    pub fn from_status(status: u16, body: String) -> Self {
        Self::Api { status, body }
    }

    /// Whether the caller should drop its token and go back to sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unauthenticated)
    }
}

/// Account role as reported by `/user/role`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UserRole {
    /// May manage several profiles.
    Caregiver,
    /// Owns exactly one profile.
    Personal,
}

impl UserRole {
    pub fn code(self) -> u8 {
        match self {
            Self::Caregiver => 1,
            Self::Personal => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Caregiver),
            2 => Some(Self::Personal),
            _ => None,
        }
    }
}

impl TryFrom<u8> for UserRole {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown role {code}"))
    }
}

impl From<UserRole> for u8 {
    fn from(role: UserRole) -> Self {
        role.code()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    #[serde(rename = "very active")]
    VeryActive,
    #[serde(other)]
    Unknown,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        Self::Sedentary,
        Self::Light,
        Self::Moderate,
        Self::Active,
        Self::VeryActive,
    ];

    /// Case-insensitive parse; unrecognised levels map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        let lowered = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == lowered)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::VeryActive => "very active",
            Self::Unknown => "unknown",
        }
    }

    /// Multiplier applied to BMR to obtain TEE.
    pub fn factor(self) -> f64 {
        match self {
            Self::Sedentary | Self::Unknown => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Profile {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub name: String,
    /// Kilograms.
    #[serde(deserialize_with = "de_f64")]
    pub weight: f64,
    /// Centimetres.
    #[serde(deserialize_with = "de_f64")]
    pub height: f64,
    #[serde(deserialize_with = "de_u32")]
    pub age: u32,
    pub gender: String,
    pub activity_level: ActivityLevel,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub bmr: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub tdee: Option<f64>,
}

impl Profile {
    pub fn input(&self) -> ProfileInput {
        ProfileInput {
            name: self.name.clone(),
            weight: self.weight,
            height: self.height,
            age: self.age,
            gender: self.gender.clone(),
            activity_level: self.activity_level,
        }
    }
}

/// Body of profile create/update requests.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ProfileInput {
    pub name: String,
    pub weight: f64,
    pub height: f64,
    pub age: u32,
    pub gender: String,
    pub activity_level: ActivityLevel,
}

/// Decode a `/profiles` payload, dropping rows that do not carry usable
/// biometric fields.
pub fn decode_profiles(value: serde_json::Value) -> Result<Vec<Profile>, GiziCareError> {
    utils::decode_rows(value, "profile")
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Per-day aggregate of everything logged for one profile.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ActivityRecord {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    /// Hours.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub total_sleep: f64,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub total_steps: u64,
    /// Minutes of exercise.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub total_duration: f64,
    /// Calorie intake for the day.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub total_calories: f64,
    /// Millilitres.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub total_water: f64,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub latest_exercise_id: Option<u64>,
    #[serde(default)]
    pub latest_exercise_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub latest_exercise_met: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Exercise {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub met_value: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct ExerciseLog {
    pub user_profiles_id: u64,
    pub date: String,
    pub activity: String,
    pub detail: String,
    pub exercise_id: Option<u64>,
    /// Minutes.
    pub duration: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct StepsSleepLog {
    pub user_profiles_id: u64,
    pub date: String,
    pub steps: u64,
    /// Hours.
    pub sleep: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct IntakeLog {
    pub user_profiles_id: u64,
    pub date: String,
    /// Always `"makan"`.
    pub activity: String,
    pub calorie_intake: f64,
}

impl IntakeLog {
    pub fn new(profile_id: u64, date: NaiveDate, calorie_intake: f64) -> Self {
        Self {
            user_profiles_id: profile_id,
            date: utils::format_date(date),
            activity: "makan".into(),
            calorie_intake,
        }
    }
}

/// Everything `POST /activities` accepts.
#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum ActivityPayload {
    Exercise(ExerciseLog),
    StepsSleep(StepsSleepLog),
    Intake(IntakeLog),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FoodCategory {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FoodItem {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Per 100 g portion.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub category_id: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub gram_per_serving: Option<f64>,
}

impl FoodItem {
    pub fn grams_per_serving(&self) -> f64 {
        self.gram_per_serving.filter(|g| *g > 0.0).unwrap_or(100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Sarapan",
            Self::Lunch => "Makan Siang",
            Self::Dinner => "Makan Malam",
            Self::Snack => "Camilan",
        }
    }
}

impl TryFrom<String> for MealType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown meal type {s}"))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FoodItemRef {
    pub name: String,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub calories: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FoodInput {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<u64>,
    pub food_item: FoodItemRef,
    /// In 100 g portions.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub portion_size: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FoodDiaryEntry {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub food_inputs: Vec<FoodInput>,
}

impl FoodDiaryEntry {
    pub fn calories(&self) -> f64 {
        self.food_inputs
            .iter()
            .map(|f| f.food_item.calories * f.portion_size)
            .sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FoodInputPayload {
    pub food_item_id: u64,
    pub portion_size: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NewFoodDiaryEntry {
    pub user_profiles_id: u64,
    pub date: String,
    pub meal_type: MealType,
    pub food_inputs: Vec<FoodInputPayload>,
    pub notes: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Notification {
    #[serde(deserialize_with = "de_string_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u32,
}

/// One object found by the detection service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Detection {
    #[serde(default)]
    pub class_id: Option<i64>,
    pub label: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    /// Keep the session for seven days instead of until logout.
    pub remember: bool,
}

/// An in-memory file for multipart uploads.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub role: UserRole,
    pub image: Option<Upload>,
}

#[async_trait]
pub trait GiziCareClient: Send + Sync + 'static {
    // === Auth ===

    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<SecretString, GiziCareError>;
    async fn register(&self, registration: Registration) -> Result<(), GiziCareError>;
    async fn logout(&self) -> Result<(), GiziCareError>;
    async fn current_user(&self) -> Result<User, GiziCareError>;
    async fn user_role(&self) -> Result<UserRole, GiziCareError>;

    // === Profiles ===

    async fn list_profiles(&self) -> Result<Vec<Profile>, GiziCareError>;
    async fn create_profile(&self, profile: &ProfileInput) -> Result<(), GiziCareError>;
    async fn update_profile(&self, id: u64, profile: &ProfileInput) -> Result<(), GiziCareError>;
    async fn delete_profile(&self, id: u64) -> Result<(), GiziCareError>;
    /// Bulk update profiles from a CSV file.
    async fn upload_profiles_csv(&self, csv: Upload) -> Result<serde_json::Value, GiziCareError>;

    // === Activities ===

    async fn list_exercises(&self) -> Result<Vec<Exercise>, GiziCareError>;
    /// Daily aggregates for a profile, optionally restricted to one date.
    async fn list_activities(
        &self,
        profile_id: u64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ActivityRecord>, GiziCareError>;
    async fn log_activity(&self, payload: &ActivityPayload) -> Result<(), GiziCareError>;
    /// Delete every activity entry of a profile on one date.
    async fn delete_activities_on(
        &self,
        profile_id: u64,
        date: NaiveDate,
    ) -> Result<(), GiziCareError>;

    // === Food diary ===

    async fn food_categories(&self) -> Result<Vec<FoodCategory>, GiziCareError>;
    async fn all_food_items(&self) -> Result<Vec<FoodItem>, GiziCareError>;
    async fn food_items_in_category(&self, category_id: u64)
    -> Result<Vec<FoodItem>, GiziCareError>;
    async fn create_food_entry(&self, entry: &NewFoodDiaryEntry) -> Result<(), GiziCareError>;
    async fn food_entries_on(
        &self,
        profile_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<FoodDiaryEntry>, GiziCareError>;
    async fn delete_food_entry(&self, entry_id: u64) -> Result<(), GiziCareError>;

    // === Dashboard ===

    async fn calories_dashboard(&self, profile_id: u64) -> Result<CaloriesDashboard, GiziCareError>;
    async fn activity_dashboard(&self, profile_id: u64) -> Result<ActivityDashboard, GiziCareError>;
    async fn nutrition_dashboard(
        &self,
        profile_id: u64,
    ) -> Result<NutritionDashboard, GiziCareError>;

    // === Notifications ===

    async fn notifications(
        &self,
        limit: u32,
        include_read: bool,
    ) -> Result<NotificationList, GiziCareError>;
    async fn mark_notification_read(&self, id: &str) -> Result<(), GiziCareError>;

    // === Detection service ===

    /// Run object detection on one image.
    async fn detect_image(&self, image: Upload) -> Result<Vec<Detection>, GiziCareError>;
}
