use anyhow::Result;
use std::io::{BufRead, Write};

use foodblog_core::FoodBlog;
use foodblog_core::models::{Ingredient, Measure, parse_meal_ids, parse_quantity_input};

use super::helpers::prompt;

/// Interactive add-recipe loop. An empty recipe name (or end of input) ends
/// the session.
pub(crate) fn cmd_interactive<R: BufRead, W: Write>(
    blog: &FoodBlog,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let meals = blog.list_meals()?;
    let measures = blog.list_measures()?;
    let ingredients = blog.list_ingredients()?;

    writeln!(output, "Pass the empty recipe to exit.")?;
    loop {
        let Some(name) = prompt(input, output, "Recipe name: ")? else {
            break;
        };
        if name.is_empty() {
            break;
        }
        let description = prompt(input, output, "Recipe description: ")?.unwrap_or_default();
        let recipe_id = blog.add_recipe(&name, &description)?;

        for meal in &meals {
            writeln!(output, "{}) {}", meal.id, meal.name)?;
        }
        read_serve(blog, recipe_id, input, output)?;
        read_quantities(blog, recipe_id, &measures, &ingredients, input, output)?;
    }
    Ok(())
}

fn read_serve<R: BufRead, W: Write>(
    blog: &FoodBlog,
    recipe_id: i64,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    loop {
        let Some(line) = prompt(input, output, "When the dish can be served: ")? else {
            return Ok(());
        };
        if line.is_empty() {
            return Ok(());
        }
        let meal_ids = match parse_meal_ids(&line) {
            Ok(ids) => ids,
            Err(e) => {
                writeln!(output, "{e}")?;
                continue;
            }
        };
        match blog.add_serve(recipe_id, &meal_ids) {
            Ok(_) => return Ok(()),
            Err(e) if e.is_constraint() => writeln!(output, "{e}")?,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_quantities<R: BufRead, W: Write>(
    blog: &FoodBlog,
    recipe_id: i64,
    measures: &[Measure],
    ingredients: &[Ingredient],
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    loop {
        let Some(line) = prompt(
            input,
            output,
            "Input quantity of ingredient <press enter to stop>: ",
        )?
        else {
            return Ok(());
        };
        if line.is_empty() {
            return Ok(());
        }
        let quantity = match parse_quantity_input(&line, measures, ingredients) {
            Ok(q) => q,
            Err(e) => {
                writeln!(output, "{e}")?;
                continue;
            }
        };
        match blog.add_quantity_input(recipe_id, quantity) {
            Ok(_) => {}
            Err(e) if e.is_constraint() => writeln!(output, "{e}")?,
            Err(e) => return Err(e.into()),
        }
    }
}
