use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gizicare",
    version,
    about = "GiziCare nutrition and activity tracker",
    long_about = "Terminal client for the GiziCare API: profiles, activity diary, food diary, \
                  food detection, dashboards and notifications."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GIZICARE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep the session for seven days
        #[arg(long)]
        remember: bool,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirmation: String,
        /// 1 = caregiver (many profiles), 2 = personal (one profile)
        #[arg(long)]
        role: String,
        /// Optional avatar image
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show the signed-in account
    Me,

    /// Manage tracked profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesCommand,
    },

    /// List exercises with their MET values
    Exercises,

    /// Daily activity diary
    Diary {
        #[command(subcommand)]
        action: DiaryCommand,
    },

    /// Food diary
    Food {
        #[command(subcommand)]
        action: FoodCommand,
    },

    /// Detect foods in images and stage them for the food diary
    Detect {
        /// Image files to analyse
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Only stage these row numbers (1-based); default stages every match
        #[arg(long, value_delimiter = ',')]
        accept: Vec<usize>,
        /// Servings per row as ROW=SERVINGS, e.g. 1=2
        #[arg(long, value_parser = parse_servings)]
        servings: Vec<(usize, f64)>,
        /// Show matches without staging them
        #[arg(long)]
        dry_run: bool,
    },

    /// Dashboard charts and summaries
    Dashboard {
        #[arg(value_enum)]
        kind: DashboardKind,
        #[arg(long, default_value = "daily", value_parser = parse_filter)]
        filter: gizicare_client::dashboard::DashboardFilter,
        #[arg(long)]
        profile: Option<u64>,
    },

    /// Notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsCommand,
    },

    /// Print the JSON schema of a request payload
    Schema {
        #[arg(value_enum)]
        payload: SchemaPayload,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileFields {
    #[arg(long)]
    pub name: String,
    /// Kilograms
    #[arg(long)]
    pub weight: String,
    /// Centimetres
    #[arg(long)]
    pub height: String,
    #[arg(long)]
    pub age: String,
    #[arg(long)]
    pub gender: String,
    /// sedentary, light, moderate, active or "very active"
    #[arg(long)]
    pub activity_level: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub weight: Option<String>,
    #[arg(long)]
    pub height: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub activity_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommand {
    List,
    Create(ProfileFields),
    /// Change some fields of a profile; the rest keep their current values
    Update {
        id: u64,
        #[command(flatten)]
        fields: ProfileChanges,
    },
    Delete {
        id: u64,
    },
    /// Make a profile the default for other commands
    Select {
        id: u64,
    },
    /// Bulk update profiles from a CSV file
    UploadCsv {
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DiaryCommand {
    /// Summary cards for one day
    Summary {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
        /// Override the profile's activity level for the energy target
        #[arg(long)]
        activity_level: Option<String>,
    },
    AddExercise {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long)]
        exercise_id: Option<u64>,
        /// Minutes
        #[arg(long)]
        duration: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
    },
    AddSteps {
        #[arg(long)]
        steps: String,
        /// Hours
        #[arg(long)]
        sleep: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Paged list of daily records
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = gizicare_client::pagination::DEFAULT_PER_PAGE)]
        per_page: usize,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Delete every entry of one day
    DeleteDay {
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Calorie intake over time against the energy target
    Chart {
        #[arg(long, default_value = "daily", value_parser = parse_granularity)]
        granularity: gizicare_client::bucket::Granularity,
        #[arg(long)]
        profile: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FoodCommand {
    Categories,
    Items {
        #[arg(long)]
        category: Option<u64>,
    },
    /// Entries of one day grouped by meal
    Diary {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Save a meal and log its calorie intake
    Add {
        /// breakfast, lunch, dinner or snack
        #[arg(long)]
        meal: Option<String>,
        /// FOOD_ID:GRAMS, repeatable
        #[arg(long = "item", value_parser = parse_item)]
        items: Vec<(u64, f64)>,
        /// Include foods staged by `gizicare detect`
        #[arg(long)]
        with_detected: bool,
        /// Leave this food out of the meal, repeatable
        #[arg(long = "without", value_name = "FOOD_ID")]
        without: Vec<u64>,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Delete every entry of one meal on a day
    DeleteMeal {
        #[arg(long)]
        meal: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        profile: Option<u64>,
    },
    /// Show foods staged by detection
    Staged,
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommand {
    List {
        #[arg(long, default_value_t = gizicare_client::notifications::DEFAULT_LIMIT)]
        limit: u32,
        /// Hide notifications already read
        #[arg(long)]
        unread: bool,
    },
    Read {
        id: String,
    },
    ReadAll,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardKind {
    Calories,
    Activity,
    Nutrition,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaPayload {
    Profile,
    Exercise,
    StepsSleep,
    Intake,
    FoodEntry,
}

pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    gizicare_client::utils::parse_date(s).ok_or_else(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))
}

fn parse_filter(s: &str) -> Result<gizicare_client::dashboard::DashboardFilter, String> {
    gizicare_client::dashboard::DashboardFilter::parse(s)
        .ok_or_else(|| format!("unknown filter {s:?} (daily, weekly, monthly, last30Days)"))
}

fn parse_granularity(s: &str) -> Result<gizicare_client::bucket::Granularity, String> {
    gizicare_client::bucket::Granularity::parse(s)
        .ok_or_else(|| format!("unknown granularity {s:?} (daily, monthly, quarterly, annually)"))
}

fn parse_item(s: &str) -> Result<(u64, f64), String> {
    let (id, grams) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FOOD_ID:GRAMS, got {s:?}"))?;
    let id = id.trim().parse::<u64>().map_err(|e| format!("food id: {e}"))?;
    let grams = grams.trim().parse::<f64>().map_err(|e| format!("grams: {e}"))?;
    if !grams.is_finite() || grams <= 0.0 {
        return Err(format!("grams must be positive, got {grams}"));
    }
    Ok((id, grams))
}

fn parse_servings(s: &str) -> Result<(usize, f64), String> {
    let (row, servings) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROW=SERVINGS, got {s:?}"))?;
    let row = row.trim().parse::<usize>().map_err(|e| format!("row: {e}"))?;
    let servings = servings
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("servings: {e}"))?;
    if row == 0 || !servings.is_finite() || servings <= 0.0 {
        return Err(format!("invalid servings {s:?}"));
    }
    Ok((row, servings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_food_add() {
        let cli = Cli::try_parse_from([
            "gizicare", "food", "add", "--meal", "lunch", "--item", "10:150", "--item", "3:50",
            "--date", "2025-06-10",
        ])
        .unwrap();
        match cli.command {
            Command::Food {
                action: FoodCommand::Add { items, meal, date, .. },
            } => {
                assert_eq!(items, vec![(10, 150.0), (3, 50.0)]);
                assert_eq!(meal.as_deref(), Some("lunch"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_items_and_dates() {
        assert!(parse_item("10").is_err());
        assert!(parse_item("10:-5").is_err());
        assert!(parse_date_arg("10/06/2025").is_err());
        assert_eq!(parse_servings("2=1.5"), Ok((2, 1.5)));
        assert!(parse_servings("0=1").is_err());
    }

    #[test]
    fn dashboard_filter_accepts_api_spelling() {
        let cli = Cli::try_parse_from(["gizicare", "dashboard", "nutrition", "--filter", "last30Days"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Dashboard {
                kind: DashboardKind::Nutrition,
                filter: gizicare_client::dashboard::DashboardFilter::Last30Days,
                ..
            }
        ));
    }
}
