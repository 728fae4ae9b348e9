// Copyright 2023 Remi Bernotavicius

//! Local identity records. Authentication happens upstream; this module owns the account
//! lifecycle and the permission codenames attached to it.

use crate::database::{
    self,
    models::{NewUser, User, UserId},
};
use crate::error::{Error, FieldErrors, Result};
use crate::forms::RegistrationForm;
use crate::profile;
use diesel::prelude::{Connection as _, OptionalExtension as _};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator as _};

#[derive(Debug, Hash, Copy, Clone, PartialEq, Eq, EnumIter, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    AddRecipe,
    ChangeRecipe,
    AddIngredient,
}

pub fn find(conn: &mut database::Connection, user_id: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
}

pub fn find_by_username(conn: &mut database::Connection, name: &str) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .filter(username.eq(name))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("user {name:?}")))
}

/// The identity behind a request, if it exists and is active.
pub fn find_active(conn: &mut database::Connection, user_id: UserId) -> Result<Option<User>> {
    use database::schema::users::dsl::*;

    Ok(users
        .find(user_id)
        .filter(is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

/// Creates an inactive account together with its empty profile.
pub fn register(conn: &mut database::Connection, form: RegistrationForm) -> Result<User> {
    use database::schema::users::dsl::*;

    let form = form.validate()?;
    conn.transaction(|conn| {
        let taken: bool = diesel::select(diesel::dsl::exists(
            users.filter(username.eq(&form.username)),
        ))
        .get_result(conn)?;
        if taken {
            let mut errors = FieldErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Err(Error::Validation(errors));
        }

        let user = diesel::insert_into(users)
            .values(NewUser {
                username: &form.username,
                first_name: &form.first_name,
                last_name: &form.last_name,
                email: &form.email,
                is_active: false,
                date_joined: chrono::Utc::now().naive_utc(),
            })
            .returning(User::as_returning())
            .get_result(conn)?;
        profile::create_for(conn, user.id)?;

        log::info!("registered user {} ({})", user.username, user.id);
        Ok(user)
    })
}

/// Marks the account active and hands out the permissions every chef starts with.
pub fn activate(conn: &mut database::Connection, user_id: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    conn.transaction(|conn| {
        let user = diesel::update(users.find(user_id))
            .set(is_active.eq(true))
            .returning(User::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;
        grant_default_permissions(conn, user.id)?;

        log::info!("activated user {} ({})", user.username, user.id);
        Ok(user)
    })
}

pub fn grant_default_permissions(conn: &mut database::Connection, user: UserId) -> Result<()> {
    use database::schema::user_permissions::dsl::*;

    for permission in Permission::iter() {
        diesel::insert_or_ignore_into(user_permissions)
            .values((user_id.eq(user), codename.eq(permission.as_ref())))
            .execute(conn)?;
    }
    Ok(())
}

pub fn permissions(conn: &mut database::Connection, user: UserId) -> Result<Vec<Permission>> {
    use database::schema::user_permissions::dsl::*;

    let names: Vec<String> = user_permissions
        .filter(user_id.eq(user))
        .select(codename)
        .load(conn)?;
    Ok(names
        .iter()
        .filter_map(|name| match name.parse::<Permission>() {
            Ok(permission) => Some(permission),
            Err(_) => {
                log::warn!("ignoring unknown permission {name:?} for user {user}");
                None
            }
        })
        .collect())
}

pub fn has_permission(
    conn: &mut database::Connection,
    user: UserId,
    permission: Permission,
) -> Result<bool> {
    use database::schema::user_permissions::dsl::*;

    Ok(diesel::select(diesel::dsl::exists(
        user_permissions
            .filter(user_id.eq(user))
            .filter(codename.eq(permission.as_ref())),
    ))
    .get_result(conn)?)
}

pub fn require_permission(
    conn: &mut database::Connection,
    user: &User,
    permission: Permission,
) -> Result<()> {
    if has_permission(conn, user.id, permission)? {
        Ok(())
    } else {
        Err(Error::PermissionDenied(permission))
    }
}

/// Deleting an identity is a soft delete: the account is deactivated, which also takes its
/// profile out of the active set, and its permissions are revoked. Authored recipes stay.
pub fn delete(conn: &mut database::Connection, user: UserId) -> Result<()> {
    use database::schema::{user_permissions, users};

    conn.transaction(|conn| {
        let updated = diesel::update(users::table.find(user))
            .set(users::is_active.eq(false))
            .execute(conn)?;
        if updated == 0 {
            return Err(Error::NotFound(format!("user {user}")));
        }
        diesel::delete(user_permissions::table.filter(user_permissions::user_id.eq(user)))
            .execute(conn)?;

        log::info!("deactivated user {user}");
        Ok(())
    })
}
