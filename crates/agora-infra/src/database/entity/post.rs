//! Post entity for SeaORM.
//!
//! Likes and comments live inside the post row as JSONB documents, so a post
//! is read and written as one unit.

use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use agora_core::domain::{Comment, Like};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LikeList(pub Vec<Like>);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CommentList(pub Vec<Comment>);

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub name: String,
    pub avatar: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: LikeList,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: CommentList,
    pub date: DateTimeWithTimeZone,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for agora_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            text: model.text,
            name: model.name,
            avatar: model.avatar,
            likes: model.likes.0,
            comments: model.comments.0,
            date: model.date.into(),
            version: model.version,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<agora_core::domain::Post> for ActiveModel {
    fn from(post: agora_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            user_id: Set(post.user_id),
            text: Set(post.text),
            name: Set(post.name),
            avatar: Set(post.avatar),
            likes: Set(LikeList(post.likes)),
            comments: Set(CommentList(post.comments)),
            date: Set(post.date.into()),
            version: Set(post.version),
        }
    }
}
