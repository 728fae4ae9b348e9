// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Privacy, Recipe, UserId};
use crate::error::{Error, Result};

/// Public recipes are visible to everyone, private ones only to their author.
pub fn can_view(requester: Option<UserId>, recipe: &Recipe) -> bool {
    recipe.privacy == Privacy::Public || requester == Some(recipe.author_id)
}

/// Hidden recipes are reported exactly like missing ones, so their existence doesn't leak.
pub fn require_visible(requester: Option<UserId>, recipe: Recipe) -> Result<Recipe> {
    if can_view(requester, &recipe) {
        Ok(recipe)
    } else {
        log::debug!(
            "recipe {} is private, hiding it from {:?}",
            recipe.id,
            requester
        );
        Err(not_found(recipe.id))
    }
}

pub(crate) fn not_found(recipe: impl std::fmt::Display) -> Error {
    Error::NotFound(format!("recipe {recipe}"))
}
