//! Pre-submit form checks. A failing check blocks the request and carries
//! the message shown to the user.

use crate::food::SelectedFood;
use crate::{
    ActivityLevel, ExerciseLog, FoodInputPayload, MealType, NewFoodDiaryEntry, ProfileInput,
    StepsSleepLog, Upload, UserRole,
};
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Durasi olahraga harus lebih dari 0 menit.")]
    NonPositiveDuration,
    #[error("Nama aktivitas wajib diisi.")]
    MissingActivityTitle,
    #[error("Nama aktivitas tidak boleh hanya berupa angka.")]
    NumericActivityTitle,
    #[error("Durasi tidur tidak boleh negatif.")]
    InvalidSleep,
    #[error("Jumlah langkah tidak boleh negatif.")]
    InvalidSteps,
    #[error("Semua field wajib diisi.")]
    MissingProfileField,
    #[error("{0} harus berupa angka positif.")]
    InvalidNumber(&'static str),
    #[error("Tingkat aktivitas tidak dikenal: {0}")]
    UnknownActivityLevel(String),
    #[error("Silakan lengkapi semua field yang diperlukan")]
    IncompleteFoodEntry,
    #[error("Pengguna dengan role personal hanya dapat membuat satu profil.")]
    PersonalProfileLimit,
    #[error("Profil pengguna personal tidak dapat dihapus.")]
    PersonalProfileDelete,
    #[error("Konfirmasi kata sandi tidak cocok.")]
    PasswordMismatch,
    #[error("Email dan kata sandi wajib diisi.")]
    MissingCredentials,
    #[error("Silakan pilih file CSV terlebih dahulu.")]
    MissingCsv,
    #[error("Role tidak valid: {0}")]
    InvalidRole(String),
}

impl From<ValidationError> for crate::GiziCareError {
    fn from(err: ValidationError) -> Self {
        crate::GiziCareError::Validation(err.to_string())
    }
}

/// Raw text of the exercise form.
#[derive(Clone, Debug, Default)]
pub struct ExerciseForm {
    pub title: String,
    pub details: String,
    pub exercise_id: Option<u64>,
    pub duration: String,
}

impl ExerciseForm {
    /// Field checks that need no profile, so they can run before any request.
    pub fn check(&self) -> Result<(), ValidationError> {
        self.minutes().map(|_| ())
    }

    pub fn validate(&self, profile_id: u64, date: NaiveDate) -> Result<ExerciseLog, ValidationError> {
        let duration = self.minutes()?;
        Ok(ExerciseLog {
            user_profiles_id: profile_id,
            date: crate::utils::format_date(date),
            activity: self.title.clone(),
            detail: self.details.clone(),
            exercise_id: self.exercise_id,
            duration,
        })
    }

    fn minutes(&self) -> Result<u32, ValidationError> {
        let duration = parse_int(&self.duration)
            .filter(|d| *d > 0)
            .ok_or(ValidationError::NonPositiveDuration)?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingActivityTitle);
        }
        if title.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NumericActivityTitle);
        }
        u32::try_from(duration).map_err(|_| ValidationError::NonPositiveDuration)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StepsSleepForm {
    pub steps: String,
    pub sleep_hours: String,
}

impl StepsSleepForm {
    pub fn check(&self) -> Result<(), ValidationError> {
        self.counts().map(|_| ())
    }

    pub fn validate(
        &self,
        profile_id: u64,
        date: NaiveDate,
    ) -> Result<StepsSleepLog, ValidationError> {
        let (steps, sleep) = self.counts()?;
        Ok(StepsSleepLog {
            user_profiles_id: profile_id,
            date: crate::utils::format_date(date),
            steps,
            sleep,
        })
    }

    fn counts(&self) -> Result<(u64, u32), ValidationError> {
        let sleep = parse_int(&self.sleep_hours)
            .filter(|v| *v >= 0)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(ValidationError::InvalidSleep)?;
        let steps = parse_int(&self.steps)
            .filter(|v| *v >= 0)
            .ok_or(ValidationError::InvalidSteps)?;
        Ok((steps as u64, sleep))
    }
}

/// Raw text of the profile form.
#[derive(Clone, Debug, Default)]
pub struct ProfileForm {
    pub name: String,
    pub weight: String,
    pub height: String,
    pub age: String,
    pub gender: String,
    pub activity_level: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileInput, ValidationError> {
        let fields = [
            &self.name,
            &self.weight,
            &self.height,
            &self.age,
            &self.gender,
            &self.activity_level,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::MissingProfileField);
        }
        let weight = parse_positive(&self.weight).ok_or(ValidationError::InvalidNumber("Berat"))?;
        let height = parse_positive(&self.height).ok_or(ValidationError::InvalidNumber("Tinggi"))?;
        let age = parse_int(&self.age)
            .filter(|a| *a > 0)
            .and_then(|a| u32::try_from(a).ok())
            .ok_or(ValidationError::InvalidNumber("Umur"))?;
        let activity_level = match ActivityLevel::parse(&self.activity_level) {
            ActivityLevel::Unknown => {
                return Err(ValidationError::UnknownActivityLevel(
                    self.activity_level.trim().to_string(),
                ));
            }
            level => level,
        };
        Ok(ProfileInput {
            name: self.name.trim().to_string(),
            weight,
            height,
            age,
            gender: self.gender.trim().to_string(),
            activity_level,
        })
    }
}

/// Whether `role` may add another profile given how many it already has.
pub fn check_can_create_profile(role: UserRole, existing: usize) -> Result<(), ValidationError> {
    if role == UserRole::Personal && existing > 0 {
        return Err(ValidationError::PersonalProfileLimit);
    }
    Ok(())
}

pub fn check_can_delete_profile(role: UserRole) -> Result<(), ValidationError> {
    if role == UserRole::Personal {
        return Err(ValidationError::PersonalProfileDelete);
    }
    Ok(())
}

/// A meal needs a type and at least one food.
pub fn check_food_entry(
    meal_type: Option<MealType>,
    selection: &[SelectedFood],
) -> Result<MealType, ValidationError> {
    let meal_type = meal_type.ok_or(ValidationError::IncompleteFoodEntry)?;
    if selection.is_empty() {
        return Err(ValidationError::IncompleteFoodEntry);
    }
    Ok(meal_type)
}

pub fn food_entry(
    profile_id: u64,
    date: NaiveDate,
    meal_type: Option<MealType>,
    selection: &[SelectedFood],
    notes: &str,
) -> Result<NewFoodDiaryEntry, ValidationError> {
    let meal_type = check_food_entry(meal_type, selection)?;
    Ok(NewFoodDiaryEntry {
        user_profiles_id: profile_id,
        date: crate::utils::format_date(date),
        meal_type,
        food_inputs: selection
            .iter()
            .map(|f| FoodInputPayload {
                food_item_id: f.food_item_id,
                portion_size: f.portion_size,
            })
            .collect(),
        notes: notes.to_string(),
    })
}

pub fn check_credentials(email: &str, password: &SecretString) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

pub fn check_password_confirmation(
    password: &SecretString,
    confirmation: &SecretString,
) -> Result<(), ValidationError> {
    if password.expose_secret() != confirmation.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Role picker value from the register form: `1` or `2`.
pub fn parse_role(raw: &str) -> Result<UserRole, ValidationError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(UserRole::from_code)
        .ok_or_else(|| ValidationError::InvalidRole(raw.trim().to_string()))
}

pub fn require_csv(upload: Option<Upload>) -> Result<Upload, ValidationError> {
    upload
        .filter(|u| !u.bytes.is_empty())
        .ok_or(ValidationError::MissingCsv)
}

/// Integer prefix of `s`, mirroring what a browser number field yields:
/// `"30 menit"` parses as 30, `"abc"` does not parse.
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

fn parse_positive(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn exercise_requires_positive_duration() {
        let form = ExerciseForm {
            title: "Lari pagi".into(),
            duration: "0".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate(1, day()),
            Err(ValidationError::NonPositiveDuration)
        );
        let form = ExerciseForm {
            duration: "-5".into(),
            ..form
        };
        assert_eq!(
            form.validate(1, day()),
            Err(ValidationError::NonPositiveDuration)
        );
    }

    #[test]
    fn exercise_title_rules() {
        let mut form = ExerciseForm {
            title: "   ".into(),
            duration: "30".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate(1, day()),
            Err(ValidationError::MissingActivityTitle)
        );
        form.title = "12345".into();
        assert_eq!(
            form.validate(1, day()),
            Err(ValidationError::NumericActivityTitle)
        );
        form.title = "Renang".into();
        form.exercise_id = Some(4);
        let log = form.validate(9, day()).expect("valid");
        assert_eq!(log.duration, 30);
        assert_eq!(log.date, "2025-06-01");
        assert_eq!(log.exercise_id, Some(4));
        assert_eq!(log.user_profiles_id, 9);
    }

    #[test]
    fn checks_agree_with_validate_without_a_profile() {
        let form = ExerciseForm {
            title: "Lari".into(),
            duration: "abc".into(),
            ..Default::default()
        };
        assert_eq!(form.check(), Err(ValidationError::NonPositiveDuration));
        let form = ExerciseForm {
            duration: "45".into(),
            ..form
        };
        assert_eq!(form.check(), Ok(()));

        let steps = StepsSleepForm {
            steps: "8000".into(),
            sleep_hours: "x".into(),
        };
        assert_eq!(steps.check(), Err(ValidationError::InvalidSleep));

        assert_eq!(
            check_food_entry(None, &[]),
            Err(ValidationError::IncompleteFoodEntry)
        );
    }

    #[test]
    fn steps_and_sleep_must_be_non_negative_integers() {
        let form = StepsSleepForm {
            steps: "abc".into(),
            sleep_hours: "7".into(),
        };
        assert_eq!(form.validate(1, day()), Err(ValidationError::InvalidSteps));
        let form = StepsSleepForm {
            steps: "8000".into(),
            sleep_hours: "-1".into(),
        };
        assert_eq!(form.validate(1, day()), Err(ValidationError::InvalidSleep));
        let form = StepsSleepForm {
            steps: "8000".into(),
            sleep_hours: "7.5".into(),
        };
        let log = form.validate(1, day()).expect("valid");
        assert_eq!(log.steps, 8000);
        assert_eq!(log.sleep, 7);
    }

    #[test]
    fn profile_form_requires_every_field() {
        let form = ProfileForm {
            name: "Sari".into(),
            weight: "55".into(),
            height: "160".into(),
            age: "".into(),
            gender: "female".into(),
            activity_level: "light".into(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingProfileField));
        assert_eq!(
            ValidationError::MissingProfileField.to_string(),
            "Semua field wajib diisi."
        );
    }

    #[test]
    fn profile_form_parses_values() {
        let form = ProfileForm {
            name: " Sari ".into(),
            weight: "55.5".into(),
            height: "160".into(),
            age: "29".into(),
            gender: "female".into(),
            activity_level: "Very Active".into(),
        };
        let input = form.validate().expect("valid");
        assert_eq!(input.name, "Sari");
        assert_eq!(input.weight, 55.5);
        assert_eq!(input.activity_level, ActivityLevel::VeryActive);

        let bad = ProfileForm {
            activity_level: "athlete".into(),
            ..form
        };
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::UnknownActivityLevel(_))
        ));
    }

    #[test]
    fn personal_role_limits() {
        assert!(check_can_create_profile(UserRole::Personal, 0).is_ok());
        assert_eq!(
            check_can_create_profile(UserRole::Personal, 1),
            Err(ValidationError::PersonalProfileLimit)
        );
        assert!(check_can_create_profile(UserRole::Caregiver, 3).is_ok());
        assert!(check_can_delete_profile(UserRole::Personal).is_err());
    }

    #[test]
    fn food_entry_needs_meal_and_foods() {
        let foods = vec![SelectedFood {
            food_item_id: 3,
            portion_size: 1.5,
        }];
        assert_eq!(
            food_entry(1, day(), None, &foods, ""),
            Err(ValidationError::IncompleteFoodEntry)
        );
        assert_eq!(
            food_entry(1, day(), Some(MealType::Lunch), &[], ""),
            Err(ValidationError::IncompleteFoodEntry)
        );
        let entry = food_entry(1, day(), Some(MealType::Lunch), &foods, "enak").unwrap();
        assert_eq!(entry.food_inputs[0].food_item_id, 3);
        assert_eq!(entry.date, "2025-06-01");
    }

    #[test]
    fn password_confirmation_must_match() {
        let a = SecretString::new("rahasia1".into());
        let b = SecretString::new("rahasia2".into());
        assert_eq!(
            check_password_confirmation(&a, &b),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(check_password_confirmation(&a, &a.clone()).is_ok());
    }

    #[test]
    fn role_and_csv_checks() {
        assert_eq!(parse_role(" 1 "), Ok(UserRole::Caregiver));
        assert_eq!(parse_role("2"), Ok(UserRole::Personal));
        assert!(matches!(parse_role("3"), Err(ValidationError::InvalidRole(_))));
        assert_eq!(require_csv(None).unwrap_err(), ValidationError::MissingCsv);
        let empty = Upload {
            file_name: "p.csv".into(),
            bytes: Vec::new(),
        };
        assert!(require_csv(Some(empty)).is_err());
    }

    #[test]
    fn parse_int_takes_numeric_prefix() {
        assert_eq!(parse_int("30 menit"), Some(30));
        assert_eq!(parse_int("-4"), Some(-4));
        assert_eq!(parse_int("x1"), None);
        assert_eq!(parse_int(""), None);
    }
}
