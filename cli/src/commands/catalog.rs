use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use foodblog_core::FoodBlog;

use super::helpers::{print_named_table, truncate};

pub(crate) fn cmd_meals(blog: &FoodBlog, json: bool) -> Result<()> {
    let meals = blog.list_meals()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
    } else {
        print_named_table(meals.into_iter().map(|m| (m.id, m.name)));
    }
    Ok(())
}

pub(crate) fn cmd_measures(blog: &FoodBlog, json: bool) -> Result<()> {
    let measures = blog.list_measures()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&measures)?);
    } else {
        print_named_table(measures.into_iter().map(|m| {
            let name = if m.name.is_empty() {
                "(unspecified)".to_string()
            } else {
                m.name
            };
            (m.id, name)
        }));
    }
    Ok(())
}

pub(crate) fn cmd_ingredients(blog: &FoodBlog, json: bool) -> Result<()> {
    let ingredients = blog.list_ingredients()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
    } else {
        print_named_table(ingredients.into_iter().map(|i| (i.id, i.name)));
    }
    Ok(())
}

pub(crate) fn cmd_recipes(blog: &FoodBlog, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let recipes = blog.list_recipes()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }
    if recipes.is_empty() {
        eprintln!("No recipes yet. Run without a command to add one.");
        return Ok(());
    }

    let rows: Vec<RecipeRow> = recipes
        .into_iter()
        .map(|r| RecipeRow {
            id: r.id,
            name: truncate(&r.name, 35),
            description: r
                .description
                .as_deref()
                .map(|d| truncate(d, 50))
                .unwrap_or_default(),
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(0..1)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_show(blog: &FoodBlog, recipe_id: i64, json: bool) -> Result<()> {
    let Some(detail) = blog.recipe_detail(recipe_id)? else {
        bail!("Recipe {recipe_id} not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let name = &detail.recipe.name;
    println!("=== {name} ===");
    if let Some(description) = detail.recipe.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {description}");
    }

    let meals: Vec<&str> = detail.meals.iter().map(|m| m.name.as_str()).collect();
    if meals.is_empty() {
        println!("\n  SERVED AT: -");
    } else {
        println!("\n  SERVED AT: {}", meals.join(", "));
    }

    println!("\n  INGREDIENTS:");
    if detail.ingredients.is_empty() {
        println!("    (none)");
    }
    for line in &detail.ingredients {
        let amount = line.amount;
        let ingredient = &line.ingredient;
        if line.measure.is_empty() {
            println!("    {amount} {ingredient}");
        } else {
            let measure = &line.measure;
            println!("    {amount} {measure} {ingredient}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_export(blog: &FoodBlog) -> Result<()> {
    let export = blog.export_all()?;
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}
