use anyhow::Result;

use foodblog_core::FoodBlog;
use foodblog_core::models::parse_name_list;

/// Line printed for a direct query.
pub(crate) fn format_matches(found: &[String]) -> String {
    if found.is_empty() {
        "There are no such recipes in the database.".to_string()
    } else {
        format!("Recipes selected for you: {}", found.join(", "))
    }
}

/// Resolve the `--ingredients`/`--meals` flags to matching recipe names.
///
/// Blank entries are dropped, so `--ingredients ""` is the empty set and
/// matches every recipe that has at least one ingredient.
pub(crate) fn find_matches(
    blog: &FoodBlog,
    ingredients: Option<&str>,
    meals: Option<&str>,
) -> Result<Vec<String>> {
    let required = ingredients.map(parse_name_list).unwrap_or_default();
    let meals = meals.map(parse_name_list).unwrap_or_default();
    Ok(blog.find_recipes_for_meals(&required, &meals)?)
}

pub(crate) fn cmd_find(
    blog: &FoodBlog,
    ingredients: Option<&str>,
    meals: Option<&str>,
    json: bool,
) -> Result<()> {
    let found = find_matches(blog, ingredients, meals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        println!("{}", format_matches(&found));
    }
    Ok(())
}
