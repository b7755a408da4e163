use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub email: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Argon2id password hash, absent until a password is issued
    pub password_hash: Option<String>,

    /// Activation token, cleared once consumed
    #[sea_orm(unique)]
    pub hash_key: Option<String>,

    pub active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
