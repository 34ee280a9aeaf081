use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
}

/// A unit of measure. The unspecified unit has an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// One ingredient line of a recipe, with names resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityLine {
    pub id: i64,
    pub amount: i64,
    pub measure: String,
    pub ingredient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub meals: Vec<Meal>,
    pub ingredients: Vec<QuantityLine>,
}

/// Row of the quantity ⋈ ingredient ⋈ recipe join read by the finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientRow {
    pub recipe_id: i64,
    pub recipe_name: String,
    pub ingredient_name: String,
}

/// Snapshot of the whole catalog, written by the export command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogExport {
    pub version: u32,
    pub meals: Vec<Meal>,
    pub ingredients: Vec<Ingredient>,
    pub measures: Vec<Measure>,
    pub recipes: Vec<RecipeDetail>,
}

pub const EXPORT_VERSION: u32 = 1;

// Seed data. Ids are fixed and 1-based so serve/quantity rows written by
// older files keep pointing at the same names.

pub const MEALS: &[(i64, &str)] = &[(1, "breakfast"), (2, "brunch"), (3, "lunch"), (4, "supper")];

pub const INGREDIENTS: &[(i64, &str)] = &[
    (1, "milk"),
    (2, "cacao"),
    (3, "strawberry"),
    (4, "blueberry"),
    (5, "blackberry"),
    (6, "sugar"),
];

pub const MEASURES: &[(i64, &str)] = &[
    (1, "ml"),
    (2, "g"),
    (3, "l"),
    (4, "cup"),
    (5, "tbsp"),
    (6, "tsp"),
    (7, "dsp"),
    (8, ""),
];

// --- User token matching ---

/// Returns the single item satisfying `pred`, or `None` when zero or
/// several items match.
fn unique_match<T>(items: &[T], mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
    let mut found = None;
    for item in items {
        if pred(item) {
            if found.is_some() {
                return None;
            }
            found = Some(item);
        }
    }
    found
}

/// Measure whose name starts with `token`, if exactly one does.
pub fn resolve_measure<'a>(measures: &'a [Measure], token: &str) -> Option<&'a Measure> {
    unique_match(measures, |m| m.name.starts_with(token))
}

/// The measure with an empty name, used when a line omits the unit.
pub fn unspecified_measure(measures: &[Measure]) -> Option<&Measure> {
    unique_match(measures, |m| m.name.is_empty())
}

/// Ingredient whose name contains `token`, if exactly one does.
pub fn resolve_ingredient<'a>(ingredients: &'a [Ingredient], token: &str) -> Option<&'a Ingredient> {
    unique_match(ingredients, |i| i.name.contains(token))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Wrong input")]
    WrongInput,
    #[error("The measure is not conclusive!")]
    MeasureNotConclusive,
    #[error("The ingredient is not conclusive!")]
    IngredientNotConclusive,
}

/// A parsed ingredient line, ready for `add_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityInput {
    pub amount: i64,
    pub measure_id: i64,
    pub ingredient_id: i64,
}

/// Parse `"<amount> <measure> <ingredient>"` or `"<amount> <ingredient>"`.
///
/// The amount is only checked to be an integer here; positivity is
/// enforced by the repository.
pub fn parse_quantity_input(
    line: &str,
    measures: &[Measure],
    ingredients: &[Ingredient],
) -> Result<QuantityInput, InputError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (amount, measure, ingredient) = match tokens.as_slice() {
        [amount, measure, ingredient] => (
            *amount,
            resolve_measure(measures, measure).ok_or(InputError::MeasureNotConclusive)?,
            *ingredient,
        ),
        [amount, ingredient] => (
            *amount,
            unspecified_measure(measures).ok_or(InputError::MeasureNotConclusive)?,
            *ingredient,
        ),
        _ => return Err(InputError::WrongInput),
    };
    let amount: i64 = amount.parse().map_err(|_| InputError::WrongInput)?;
    let ingredient =
        resolve_ingredient(ingredients, ingredient).ok_or(InputError::IngredientNotConclusive)?;
    Ok(QuantityInput {
        amount,
        measure_id: measure.id,
        ingredient_id: ingredient.id,
    })
}

/// Parse whitespace-separated meal ids such as `"1 3"`.
pub fn parse_meal_ids(line: &str) -> Result<Vec<i64>, InputError> {
    let ids = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<i64>, _>>()
        .map_err(|_| InputError::WrongInput)?;
    if ids.is_empty() {
        return Err(InputError::WrongInput);
    }
    Ok(ids)
}

/// Split a comma-separated list of names, trimming blanks.
pub fn parse_name_list(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
