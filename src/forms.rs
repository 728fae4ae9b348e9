// Copyright 2023 Remi Bernotavicius

//! Submitted payloads and their validation. Everything past this module works with the
//! `Valid*` types and never re-checks field constraints.

use crate::database::models::{IngredientId, Privacy, Recipe, RecipeIngredientId};
use crate::error::{FieldErrors, Result};
use serde::{Deserialize, Serialize};

const REQUIRED: &str = "This field is required.";

pub const TITLE_MAX_LENGTH: usize = 128;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 30;
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Preparation and cooking times are picked from this list, in hours.
pub const TIME_CHOICES: [(f32, &str); 16] = [
    (0.25, "15 minutes"),
    (0.5, "30 minutes"),
    (0.75, "45 minutes"),
    (1.0, "1 hour"),
    (1.25, "1 hour 15 minutes"),
    (1.5, "1 hour 30 minutes"),
    (1.75, "1 hour 45 minutes"),
    (2.0, "2 hours"),
    (2.25, "2 hours 15 minutes"),
    (2.5, "2 hours 30 minutes"),
    (2.75, "2 hours 45 minutes"),
    (3.0, "3 hours"),
    (3.25, "3 hours 15 minutes"),
    (3.5, "3 hours 30 minutes"),
    (3.75, "3 hours 45 minutes"),
    (4.0, "4+ hours"),
];

pub fn time_label(hours: f32) -> Option<&'static str> {
    TIME_CHOICES
        .iter()
        .find(|(h, _)| *h == hours)
        .map(|(_, label)| *label)
}

fn check_max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

fn check_required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    }
}

fn check_time_choice(errors: &mut FieldErrors, field: &str, value: Option<f32>) {
    if let Some(hours) = value {
        if time_label(hours).is_none() {
            errors.add(
                field,
                format!("Select a valid choice. {hours} is not one of the available choices."),
            );
        }
    }
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    check_max_length(errors, field, value, EMAIL_MAX_LENGTH);
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add(field, "Enter a valid email address.");
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// One row of the ingredient formset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientLineForm {
    #[serde(default)]
    pub id: Option<RecipeIngredientId>,
    #[serde(default)]
    pub ingredient: Option<IngredientId>,
    #[serde(default)]
    pub quantity: String,
}

impl IngredientLineForm {
    fn is_blank(&self) -> bool {
        self.ingredient.is_none() && self.quantity.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prep_time: Option<f32>,
    #[serde(default)]
    pub cook_time: Option<f32>,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub directions: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientLineForm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub title: String,
    pub description: Option<String>,
    pub prep_time: Option<f32>,
    pub cook_time: Option<f32>,
    pub privacy: Privacy,
    pub directions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub id: Option<RecipeIngredientId>,
    pub ingredient_id: IngredientId,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe {
    pub fields: RecipeFields,
    pub lines: Vec<IngredientLine>,
}

impl RecipeForm {
    /// Pre-fills a form from an existing recipe and its ingredient rows.
    pub fn from_recipe(recipe: &Recipe, ingredients: Vec<IngredientLineForm>) -> Self {
        Self {
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            privacy: recipe.privacy,
            directions: recipe.directions.clone(),
            ingredients,
        }
    }

    pub fn validate(self) -> Result<ValidRecipe> {
        let mut errors = FieldErrors::new();

        check_required(&mut errors, "title", &self.title);
        check_max_length(&mut errors, "title", self.title.trim(), TITLE_MAX_LENGTH);
        check_required(&mut errors, "directions", &self.directions);
        check_time_choice(&mut errors, "prep_time", self.prep_time);
        check_time_choice(&mut errors, "cook_time", self.cook_time);

        let mut lines = vec![];
        for (i, line) in self.ingredients.into_iter().enumerate() {
            if line.is_blank() {
                continue;
            }
            let quantity = line.quantity.trim();
            if quantity.is_empty() {
                errors.add(format!("ingredient_form-{i}-quantity"), REQUIRED);
            }
            match line.ingredient {
                Some(ingredient_id) => lines.push(IngredientLine {
                    id: line.id,
                    ingredient_id,
                    quantity: quantity.to_owned(),
                }),
                None => errors.add(format!("ingredient_form-{i}-ingredient"), REQUIRED),
            }
        }

        errors.into_result(ValidRecipe {
            fields: RecipeFields {
                title: self.title.trim().to_owned(),
                description: blank_to_none(self.description),
                prep_time: self.prep_time,
                cook_time: self.cook_time,
                privacy: self.privacy,
                directions: self.directions.trim().to_owned(),
            },
            lines,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<Self> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim().to_owned();

        check_required(&mut errors, "username", &username);
        check_max_length(&mut errors, "username", &username, USERNAME_MAX_LENGTH);
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and \
                 @/./+/-/_ characters.",
            );
        }
        check_max_length(&mut errors, "first_name", &self.first_name, NAME_MAX_LENGTH);
        check_max_length(&mut errors, "last_name", &self.last_name, NAME_MAX_LENGTH);
        check_email(&mut errors, "email", self.email.trim());

        errors.into_result(Self {
            username,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
        })
    }
}

/// The user and profile fields a chef may edit about themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub about_me: Option<String>,
}

impl ProfileForm {
    pub fn validate(self) -> Result<Self> {
        let mut errors = FieldErrors::new();
        check_max_length(&mut errors, "first_name", &self.first_name, NAME_MAX_LENGTH);
        check_max_length(&mut errors, "last_name", &self.last_name, NAME_MAX_LENGTH);
        check_email(&mut errors, "email", self.email.trim());

        errors.into_result(Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            about_me: blank_to_none(self.about_me),
        })
    }
}
