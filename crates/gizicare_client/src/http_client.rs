//! reqwest implementation of [`GiziCareClient`](crate::GiziCareClient).

use crate::config::Config;
use crate::dashboard::{ActivityDashboard, CaloriesDashboard, NutritionDashboard};
use crate::observability::{Outcome, record_request};
use crate::utils::{decode_rows, format_date, number_from_value, unwrap_data};
use crate::{
    ActivityPayload, ActivityRecord, Credentials, Detection, Exercise, FoodCategory,
    FoodDiaryEntry, FoodItem, GiziCareClient, GiziCareError, NewFoodDiaryEntry, NotificationList,
    Profile, ProfileInput, Registration, Upload, User, UserRole,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Instant;

const BODY_SNIPPET_CHARS: usize = 256;

#[derive(Clone, Debug)]
pub struct ReqwestGiziCareClient {
    api_url: String,
    detector_url: String,
    token: Option<SecretString>,
    client: reqwest::Client,
}

impl ReqwestGiziCareClient {
    /// `api_url` is the REST base (e.g. `http://localhost:8000/api`),
    /// `detector_url` the detection service root.
    pub fn new(
        api_url: &str,
        detector_url: &str,
        token: Option<SecretString>,
    ) -> Result<Self, GiziCareError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gizicare/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            detector_url: detector_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn from_config(config: &Config, token: Option<SecretString>) -> Result<Self, GiziCareError> {
        Self::new(&config.api_url, &config.detector_url, token)
    }

    /// Same endpoints, different bearer token.
    pub fn with_token(&self, token: Option<SecretString>) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Request to the REST API without credentials.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.api(path))
            .header("Accept", "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
    }

    /// Request carrying the bearer token; fails before sending when signed out.
    fn authed(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, GiziCareError> {
        let token = self.token.as_ref().ok_or(GiziCareError::Unauthenticated)?;
        Ok(self
            .request(method, path)
            .bearer_auth(token.expose_secret()))
    }

    /// Send, record metrics and turn error statuses into errors.
    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GiziCareError> {
        let started = Instant::now();
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                record_request(endpoint, Outcome::Transport, started.elapsed());
                tracing::warn!("{} request failed: {}", endpoint, e);
                return Err(e.into());
            }
        };
        let status = resp.status().as_u16();
        record_request(endpoint, Outcome::from_status(status), started.elapsed());
        tracing::debug!("{} -> {}", endpoint, status);
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        Ok(resp)
    }

    async fn execute_value(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, GiziCareError> {
        self.execute_json(endpoint, request).await
    }

    /// Decode the body as `T`, keeping a snippet of the body on failure.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GiziCareError> {
        let resp = self.send(endpoint, request).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| GiziCareError::Decode {
            what: endpoint.to_string(),
            message: format!("{e}; body: {}", snippet(&body)),
        })
    }

    /// Decode a payload that may or may not sit inside `{"data": ...}`.
    async fn execute_data<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GiziCareError> {
        let value = unwrap_data(self.execute_value(endpoint, request).await?);
        serde_json::from_value(value).map_err(|e| GiziCareError::Decode {
            what: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn execute_rows<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, GiziCareError> {
        let value = self.execute_value(endpoint, request).await?;
        decode_rows(value, endpoint)
    }

    async fn execute_empty(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<(), GiziCareError> {
        self.send(endpoint, request).await.map(|_| ())
    }

    /// Map a failed response to an error. A JSON `message` field is
    /// preferred over the raw body.
    async fn error_from_response(resp: reqwest::Response) -> GiziCareError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| snippet(&body));

        match status {
            404 => GiziCareError::NotFound(detail),
            401 | 403 => GiziCareError::Auth(detail),
            422 => GiziCareError::InvalidInput(detail),
            _ => GiziCareError::from_status(status, detail),
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

fn file_part(upload: Upload) -> Part {
    Part::bytes(upload.bytes).file_name(upload.file_name)
}

#[async_trait]
impl GiziCareClient for ReqwestGiziCareClient {
    async fn login(&self, credentials: &Credentials) -> Result<SecretString, GiziCareError> {
        #[derive(serde::Deserialize)]
        struct LoginPayload {
            access_token: Option<String>,
        }

        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
            "remember": credentials.remember,
        });
        let payload: LoginPayload = self
            .execute_json("login", self.request(Method::POST, "/login").json(&body))
            .await?;
        payload
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| GiziCareError::Auth("Token tidak ditemukan".into()))
    }

    async fn register(&self, registration: Registration) -> Result<(), GiziCareError> {
        let mut form = Form::new()
            .text("name", registration.name)
            .text("email", registration.email)
            .text("password", registration.password.expose_secret().to_string())
            .text(
                "password_confirmation",
                registration.password_confirmation.expose_secret().to_string(),
            )
            .text("role", registration.role.code().to_string());
        if let Some(image) = registration.image {
            form = form.part("image", file_part(image));
        }
        self.execute_empty(
            "register",
            self.request(Method::POST, "/register").multipart(form),
        )
        .await
    }

    async fn logout(&self) -> Result<(), GiziCareError> {
        self.execute_empty("logout", self.authed(Method::POST, "/logout")?)
            .await
    }

    async fn current_user(&self) -> Result<User, GiziCareError> {
        self.execute_data("me", self.authed(Method::GET, "/me")?)
            .await
    }

    async fn user_role(&self) -> Result<UserRole, GiziCareError> {
        let value = self
            .execute_value("user.role", self.authed(Method::GET, "/user/role")?)
            .await?;
        let raw = unwrap_data(value);
        let code = raw
            .get("role")
            .and_then(number_from_value)
            .filter(|c| *c >= 0.0 && *c <= f64::from(u8::MAX))
            .and_then(|c| UserRole::from_code(c as u8));
        code.ok_or_else(|| GiziCareError::Decode {
            what: "user.role".into(),
            message: format!("unknown role payload: {}", snippet(&raw.to_string())),
        })
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, GiziCareError> {
        self.execute_rows("profiles.list", self.authed(Method::GET, "/profiles")?)
            .await
    }

    async fn create_profile(&self, profile: &ProfileInput) -> Result<(), GiziCareError> {
        let resp = self
            .send(
                "profiles.create",
                self.authed(Method::POST, "/profiles")?.json(profile),
            )
            .await?;
        let status = resp.status().as_u16();
        if status != 201 {
            let body = resp.text().await.unwrap_or_default();
            return Err(GiziCareError::from_status(status, snippet(&body)));
        }
        Ok(())
    }

    async fn update_profile(&self, id: u64, profile: &ProfileInput) -> Result<(), GiziCareError> {
        self.execute_empty(
            "profiles.update",
            self.authed(Method::PUT, &format!("/profiles/{id}"))?
                .json(profile),
        )
        .await
    }

    async fn delete_profile(&self, id: u64) -> Result<(), GiziCareError> {
        self.execute_empty(
            "profiles.delete",
            self.authed(Method::DELETE, &format!("/profiles/{id}"))?,
        )
        .await
    }

    async fn upload_profiles_csv(&self, csv: Upload) -> Result<serde_json::Value, GiziCareError> {
        let form = Form::new().part("csv", file_part(csv));
        self.execute_value(
            "profiles.upload_csv",
            self.authed(Method::POST, "/profiles/upload-csv")?
                .multipart(form),
        )
        .await
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, GiziCareError> {
        self.execute_rows("exercises", self.authed(Method::GET, "/exercises")?)
            .await
    }

    async fn list_activities(
        &self,
        profile_id: u64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ActivityRecord>, GiziCareError> {
        let mut query = vec![("user_profiles_id", profile_id.to_string())];
        if let Some(date) = date {
            query.push(("date", format_date(date)));
        }
        self.execute_rows(
            "activities.list",
            self.authed(Method::GET, "/activities")?.query(&query),
        )
        .await
    }

    async fn log_activity(&self, payload: &ActivityPayload) -> Result<(), GiziCareError> {
        self.execute_empty(
            "activities.create",
            self.authed(Method::POST, "/activities")?.json(payload),
        )
        .await
    }

    async fn delete_activities_on(
        &self,
        profile_id: u64,
        date: NaiveDate,
    ) -> Result<(), GiziCareError> {
        let path = format!("/activities/date/{}", format_date(date));
        self.execute_empty(
            "activities.delete_date",
            self.authed(Method::DELETE, &path)?
                .query(&[("user_profiles_id", profile_id.to_string())]),
        )
        .await
    }

    async fn food_categories(&self) -> Result<Vec<FoodCategory>, GiziCareError> {
        self.execute_rows(
            "food.categories",
            self.authed(Method::GET, "/food-diary/categories")?,
        )
        .await
    }

    async fn all_food_items(&self) -> Result<Vec<FoodItem>, GiziCareError> {
        self.execute_rows(
            "food.items_all",
            self.authed(Method::GET, "/food-diary/food-items/all")?,
        )
        .await
    }

    async fn food_items_in_category(
        &self,
        category_id: u64,
    ) -> Result<Vec<FoodItem>, GiziCareError> {
        self.execute_rows(
            "food.items_category",
            self.authed(Method::GET, &format!("/food-diary/food-items/{category_id}"))?,
        )
        .await
    }

    async fn create_food_entry(&self, entry: &NewFoodDiaryEntry) -> Result<(), GiziCareError> {
        self.execute_empty(
            "food.entries_create",
            self.authed(Method::POST, "/food-diary/entries")?.json(entry),
        )
        .await
    }

    async fn food_entries_on(
        &self,
        profile_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<FoodDiaryEntry>, GiziCareError> {
        let query = [
            ("date", format_date(date)),
            ("user_profiles_id", profile_id.to_string()),
        ];
        self.execute_rows(
            "food.entries_date",
            self.authed(Method::GET, "/food-diary/entries/date")?
                .query(&query),
        )
        .await
    }

    async fn delete_food_entry(&self, entry_id: u64) -> Result<(), GiziCareError> {
        self.execute_empty(
            "food.entries_delete",
            self.authed(Method::DELETE, &format!("/food-diary/entries/{entry_id}"))?,
        )
        .await
    }

    async fn calories_dashboard(&self, profile_id: u64) -> Result<CaloriesDashboard, GiziCareError> {
        self.execute_json(
            "dashboard.calories",
            self.authed(Method::GET, "/dashboard/calories-data")?
                .query(&[("user_profiles_id", profile_id.to_string())]),
        )
        .await
    }

    async fn activity_dashboard(&self, profile_id: u64) -> Result<ActivityDashboard, GiziCareError> {
        self.execute_json(
            "dashboard.activity",
            self.authed(Method::GET, "/dashboard/activity-data")?
                .query(&[("user_profiles_id", profile_id.to_string())]),
        )
        .await
    }

    async fn nutrition_dashboard(
        &self,
        profile_id: u64,
    ) -> Result<NutritionDashboard, GiziCareError> {
        self.execute_json(
            "dashboard.nutrition",
            self.authed(Method::GET, "/dashboard/nutrition-data")?
                .query(&[("user_profiles_id", profile_id.to_string())]),
        )
        .await
    }

    async fn notifications(
        &self,
        limit: u32,
        include_read: bool,
    ) -> Result<NotificationList, GiziCareError> {
        let query = [
            ("limit", limit.to_string()),
            ("include_read", include_read.to_string()),
        ];
        self.execute_json(
            "notifications.list",
            self.authed(Method::GET, "/notifications")?.query(&query),
        )
        .await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), GiziCareError> {
        self.execute_empty(
            "notifications.read",
            self.authed(Method::PATCH, &format!("/notifications/{id}/read"))?
                .json(&serde_json::json!({})),
        )
        .await
    }

    async fn detect_image(&self, image: Upload) -> Result<Vec<Detection>, GiziCareError> {
        #[derive(serde::Deserialize)]
        struct DetectPayload {
            #[serde(default)]
            detections: Vec<Detection>,
        }

        let form = Form::new().part("file", file_part(image));
        let request = self
            .client
            .post(format!("{}/detect/image", self.detector_url))
            .multipart(form);
        let payload: DetectPayload = self.execute_json("detect.image", request).await?;
        Ok(payload.detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slashes() {
        let c = ReqwestGiziCareClient::new("http://api.test/api/", "http://det.test/", None).unwrap();
        assert_eq!(c.api("/me"), "http://api.test/api/me");
        assert_eq!(c.detector_url, "http://det.test");
    }

    #[test]
    fn signed_out_client_refuses_authed_requests() {
        let c = ReqwestGiziCareClient::new("http://api.test", "http://det.test", None).unwrap();
        assert!(matches!(
            c.authed(Method::GET, "/me"),
            Err(GiziCareError::Unauthenticated)
        ));
        let c = c.with_token(Some(SecretString::from("tok")));
        assert!(c.authed(Method::GET, "/me").is_ok());
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(1000);
        assert_eq!(snippet(&long).len(), BODY_SNIPPET_CHARS);
    }
}
