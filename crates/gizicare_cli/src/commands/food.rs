use super::{read_upload, today};
use crate::cli::FoodCommand;
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::render::{self, Format, Table};
use chrono::NaiveDate;
use gizicare_client::detection::{DetectedRow, match_detections, merge_rows, to_handoff};
use gizicare_client::food::{
    SelectedFood, add_food, day_calories, entry_ids_for_meal, group_by_meal, merge_handoff,
    remove_food, selection_calories,
};
use gizicare_client::utils::format_date;
use gizicare_client::validation::{check_food_entry, food_entry};
use gizicare_client::{ActivityPayload, FoodItem, IntakeLog, MealType};
use serde::Serialize;
use std::path::PathBuf;

pub(super) async fn run(ctx: &mut Context, fmt: Format, action: FoodCommand) -> CliResult<String> {
    match action {
        FoodCommand::Categories => categories(ctx, fmt).await,
        FoodCommand::Items { category } => items(ctx, fmt, category).await,
        FoodCommand::Diary { date, profile } => {
            diary(ctx, fmt, date.unwrap_or_else(today), profile).await
        }
        FoodCommand::Add {
            meal,
            items,
            with_detected,
            without,
            notes,
            date,
            profile,
        } => {
            let meal = meal.as_deref().map(parse_meal).transpose()?;
            let order = NewMeal {
                meal,
                items,
                with_detected,
                without,
                notes,
                date: date.unwrap_or_else(today),
            };
            add(ctx, order, profile).await
        }
        FoodCommand::DeleteMeal {
            meal,
            date,
            profile,
        } => delete_meal(ctx, parse_meal(&meal)?, date.unwrap_or_else(today), profile).await,
        FoodCommand::Staged => staged(ctx, fmt).await,
    }
}

fn parse_meal(raw: &str) -> CliResult<MealType> {
    MealType::parse(raw).ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "unknown meal {raw:?} (breakfast, lunch, dinner, snack)"
        ))
    })
}

fn food_name(catalog: &[FoodItem], id: u64) -> String {
    catalog
        .iter()
        .find(|f| f.id == id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

async fn categories(ctx: &Context, fmt: Format) -> CliResult<String> {
    let categories = ctx.authed()?.food_categories().await?;
    fmt.emit(&categories, |list| {
        let mut t = Table::new(["ID", "Kategori"]);
        for c in list {
            t.row([c.id.to_string(), c.name.clone()]);
        }
        t.render()
    })
}

async fn items(ctx: &Context, fmt: Format, category: Option<u64>) -> CliResult<String> {
    let client = ctx.authed()?;
    let items = match category {
        Some(id) => client.food_items_in_category(id).await?,
        None => client.all_food_items().await?,
    };
    fmt.emit(&items, |list| {
        let mut t = Table::new(["ID", "Makanan", "Kalori/100 g", "Gram/porsi"]);
        for f in list {
            t.row([
                f.id.to_string(),
                f.name.clone(),
                render::int(f.calories),
                render::int(f.grams_per_serving()),
            ]);
        }
        t.render()
    })
}

async fn diary(ctx: &Context, fmt: Format, date: NaiveDate, profile: Option<u64>) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let entries = ctx.authed()?.food_entries_on(profile.id, date).await?;
    let groups = group_by_meal(&entries);
    if fmt == Format::Json {
        return fmt.emit(&groups, |_| String::new());
    }
    if groups.is_empty() {
        return Ok(format!("Belum ada catatan makanan pada {}.", format_date(date)));
    }

    let mut out = format!("{} - {}\n", profile.name, format_date(date));
    for group in &groups {
        out.push_str(&format!("\n{} ({})\n", group.label, render::kcal(group.calories)));
        let mut t = Table::new(["Makanan", "Porsi", "Kalori"]);
        for entry in &group.entries {
            for input in &entry.food_inputs {
                t.row([
                    input.food_item.name.clone(),
                    format!("{} g", render::int(input.portion_size * 100.0)),
                    render::kcal(input.food_item.calories * input.portion_size),
                ]);
            }
        }
        out.push_str(&t.render());
        for note in group.entries.iter().filter_map(|e| e.notes.as_deref()) {
            if !note.trim().is_empty() {
                out.push_str(&format!("Catatan: {note}\n"));
            }
        }
    }
    out.push_str(&format!("\nTotal: {}\n", render::kcal(day_calories(&entries))));
    Ok(out)
}

struct NewMeal {
    meal: Option<MealType>,
    items: Vec<(u64, f64)>,
    with_detected: bool,
    without: Vec<u64>,
    notes: String,
    date: NaiveDate,
}

/// Build the selection from explicit items plus, optionally, staged
/// detections that are not already listed, minus any excluded food.
fn compose(items: &[(u64, f64)], staged: &[SelectedFood], without: &[u64]) -> Vec<SelectedFood> {
    let mut selection = Vec::with_capacity(items.len() + staged.len());
    for &(id, grams) in items {
        add_food(&mut selection, id, grams);
    }
    let added = merge_handoff(&mut selection, staged);
    if added > 0 {
        tracing::debug!("added {} staged foods", added);
    }
    for &id in without {
        remove_food(&mut selection, id);
    }
    selection
}

async fn add(ctx: &Context, order: NewMeal, profile: Option<u64>) -> CliResult<String> {
    let staged = if order.with_detected {
        ctx.handoff.peek().await?
    } else {
        Vec::new()
    };
    let selection = compose(&order.items, &staged, &order.without);
    check_food_entry(order.meal, &selection)?;
    let profile = ctx.profile(profile).await?;
    let entry = food_entry(profile.id, order.date, order.meal, &selection, &order.notes)?;

    let client = ctx.authed()?;
    let catalog = client.all_food_items().await?;
    if let Some(missing) = selection
        .iter()
        .find(|f| !catalog.iter().any(|item| item.id == f.food_item_id))
    {
        return Err(CliError::NotFound(format!("food item {}", missing.food_item_id)));
    }
    let calories = selection_calories(&selection, &catalog);

    let _ticket = ctx.begin_submit()?;
    client.create_food_entry(&entry).await?;
    client
        .log_activity(&ActivityPayload::Intake(IntakeLog::new(
            profile.id, order.date, calories,
        )))
        .await?;
    if order.with_detected {
        ctx.handoff.take().await?;
    }
    tracing::info!(
        "saved {} with {} foods for profile {}",
        entry.meal_type.as_str(),
        selection.len(),
        profile.id
    );
    Ok(format!(
        "{} disimpan untuk {} pada {} ({}).",
        entry.meal_type.label(),
        profile.name,
        entry.date,
        render::kcal(calories)
    ))
}

async fn delete_meal(
    ctx: &Context,
    meal: MealType,
    date: NaiveDate,
    profile: Option<u64>,
) -> CliResult<String> {
    let profile = ctx.profile(profile).await?;
    let client = ctx.authed()?;
    let entries = client.food_entries_on(profile.id, date).await?;
    let ids = entry_ids_for_meal(&entries, meal);
    if ids.is_empty() {
        return Err(CliError::NotFound(format!(
            "{} pada {}",
            meal.label(),
            format_date(date)
        )));
    }
    let _ticket = ctx.begin_submit()?;
    for id in &ids {
        client.delete_food_entry(*id).await?;
    }
    Ok(format!(
        "{} pada {} dihapus ({} catatan).",
        meal.label(),
        format_date(date),
        ids.len()
    ))
}

#[derive(Serialize)]
struct StagedRow {
    #[serde(flatten)]
    item: SelectedFood,
    name: String,
}

async fn staged(ctx: &Context, fmt: Format) -> CliResult<String> {
    let staged = ctx.handoff.peek().await?;
    if staged.is_empty() {
        return fmt.emit(&staged, |_| "Tidak ada makanan hasil deteksi.".to_string());
    }
    let catalog = ctx.authed()?.all_food_items().await?;
    let rows: Vec<StagedRow> = staged
        .into_iter()
        .map(|item| StagedRow {
            name: food_name(&catalog, item.food_item_id),
            item,
        })
        .collect();
    fmt.emit(&rows, |rows| {
        let mut t = Table::new(["ID", "Makanan", "Porsi"]);
        for r in rows {
            t.row([
                r.item.food_item_id.to_string(),
                r.name.clone(),
                format!("{} g", render::int(r.item.portion_size * 100.0)),
            ]);
        }
        t.render()
    })
}

pub(super) struct DetectOptions {
    pub accept: Vec<usize>,
    pub servings: Vec<(usize, f64)>,
    pub dry_run: bool,
}

/// Apply the reviewer's choices. Rows are numbered from 1.
fn review(rows: &mut [DetectedRow], opts: &DetectOptions) -> CliResult<()> {
    let len = rows.len();
    let check = |n: usize| {
        if n == 0 || n > len {
            Err(CliError::InvalidArgument(format!(
                "row {n} out of range (1..={len})"
            )))
        } else {
            Ok(())
        }
    };
    for &n in &opts.accept {
        check(n)?;
    }
    for &(n, _) in &opts.servings {
        check(n)?;
    }
    if !opts.accept.is_empty() {
        for (i, row) in rows.iter_mut().enumerate() {
            row.accepted = opts.accept.contains(&(i + 1));
        }
    }
    for &(n, servings) in &opts.servings {
        rows[n - 1].servings = servings;
    }
    Ok(())
}

#[derive(Serialize)]
struct DetectOutput {
    rows: Vec<DetectedRow>,
    staged: usize,
}

pub(super) async fn detect(
    ctx: &Context,
    fmt: Format,
    images: &[PathBuf],
    opts: DetectOptions,
) -> CliResult<String> {
    let client = ctx.authed()?;
    let catalog = client.all_food_items().await?;

    let mut rows = Vec::new();
    for path in images {
        let upload = read_upload(path).await?;
        let detections = client.detect_image(upload).await?;
        tracing::debug!("{} detections in {}", detections.len(), path.display());
        merge_rows(&mut rows, match_detections(&detections, &catalog));
    }
    review(&mut rows, &opts)?;

    let staged = if opts.dry_run {
        0
    } else {
        let mut slot = ctx.handoff.peek().await?;
        let added = merge_handoff(&mut slot, &to_handoff(&rows));
        ctx.handoff.put(&slot).await?;
        added
    };

    let output = DetectOutput { rows, staged };
    fmt.emit(&output, |o| {
        if o.rows.is_empty() {
            return "Tidak ada makanan terdeteksi.".to_string();
        }
        let mut t = Table::new(["#", "Makanan", "Keyakinan", "Porsi", "Kalori", "Dipilih"]);
        for (i, r) in o.rows.iter().enumerate() {
            t.row([
                (i + 1).to_string(),
                r.name.clone(),
                format!("{:.0}%", r.confidence * 100.0),
                format!("{} g", render::int(r.total_grams())),
                render::kcal(r.calories * r.portion_size()),
                if r.accepted && r.is_matched() { "ya" } else { "tidak" }.to_string(),
            ]);
        }
        format!(
            "{}{} makanan disiapkan untuk diary. Simpan dengan `gizicare food add --with-detected`.",
            t.render(),
            o.staged
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Option<u64>) -> DetectedRow {
        DetectedRow {
            food_item_id: id,
            name: "Nasi".into(),
            calories: 130.0,
            grams_per_serving: 150.0,
            confidence: 0.9,
            accepted: true,
            servings: 1.0,
        }
    }

    #[test]
    fn compose_merges_staged_without_duplicates() {
        let staged = [
            SelectedFood {
                food_item_id: 1,
                portion_size: 2.0,
            },
            SelectedFood {
                food_item_id: 5,
                portion_size: 1.5,
            },
        ];
        let selection = compose(&[(1, 150.0)], &staged, &[]);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[0].portion_size, 1.5);
        assert_eq!(selection[1].food_item_id, 5);
    }

    #[test]
    fn compose_drops_excluded_foods() {
        let staged = [SelectedFood {
            food_item_id: 5,
            portion_size: 1.5,
        }];
        let selection = compose(&[(1, 100.0), (2, 50.0)], &staged, &[5, 2]);
        assert_eq!(
            selection,
            vec![SelectedFood {
                food_item_id: 1,
                portion_size: 1.0,
            }]
        );
        assert!(compose(&[], &staged, &[5]).is_empty());
    }

    #[test]
    fn review_applies_accept_and_servings() {
        let mut rows = vec![row(Some(1)), row(Some(2)), row(None)];
        let opts = DetectOptions {
            accept: vec![2],
            servings: vec![(2, 2.0)],
            dry_run: false,
        };
        review(&mut rows, &opts).unwrap();
        assert!(!rows[0].accepted);
        assert!(rows[1].accepted);
        assert_eq!(rows[1].servings, 2.0);
        assert_eq!(to_handoff(&rows)[0].portion_size, 3.0);
    }

    #[test]
    fn review_rejects_out_of_range_rows() {
        let mut rows = vec![row(Some(1))];
        let opts = DetectOptions {
            accept: vec![],
            servings: vec![(4, 1.0)],
            dry_run: true,
        };
        assert!(matches!(review(&mut rows, &opts), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn meal_names_parse() {
        assert_eq!(parse_meal("Dinner").unwrap(), MealType::Dinner);
        assert!(parse_meal("brunch").is_err());
    }
}
