//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "gender")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
    #[sea_orm(string_value = "other")]
    Other,
    #[sea_orm(string_value = "unspecified")]
    Unspecified,
}

impl From<pennywise_shared::auth::Role> for UserRole {
    fn from(role: pennywise_shared::auth::Role) -> Self {
        match role {
            pennywise_shared::auth::Role::User => Self::User,
            pennywise_shared::auth::Role::Admin => Self::Admin,
        }
    }
}

impl From<UserRole> for pennywise_shared::auth::Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::User => Self::User,
            UserRole::Admin => Self::Admin,
        }
    }
}

impl From<pennywise_core::user::Gender> for Gender {
    fn from(gender: pennywise_core::user::Gender) -> Self {
        match gender {
            pennywise_core::user::Gender::Male => Self::Male,
            pennywise_core::user::Gender::Female => Self::Female,
            pennywise_core::user::Gender::Other => Self::Other,
            pennywise_core::user::Gender::Unspecified => Self::Unspecified,
        }
    }
}

impl From<Gender> for pennywise_core::user::Gender {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self::Male,
            Gender::Female => Self::Female,
            Gender::Other => Self::Other,
            Gender::Unspecified => Self::Unspecified,
        }
    }
}
