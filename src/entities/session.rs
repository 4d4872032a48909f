use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub host_id: Uuid,
    pub host_name: String,
    pub host_icon: Option<String>,
    pub guest_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_icon: Option<String>,
    pub game_type: String,
    pub game_icon: Option<String>,
    pub status: String,
    pub current_turn: Option<Uuid>,
    pub board: Json,
    pub winner: Option<Uuid>,
    pub draw: bool,
}

impl Model {
    /// Whether the given user is the host or the joined guest.
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.host_id == user_id || self.guest_id == Some(user_id)
    }

    /// The roster member opposite to `user_id`, when both seats are filled.
    pub fn opponent_of(&self, user_id: Uuid) -> Option<Uuid> {
        let guest_id = self.guest_id?;
        if user_id == self.host_id {
            Some(guest_id)
        } else if user_id == guest_id {
            Some(self.host_id)
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::HostId",
        to = "super::user::Column::Id"
    )]
    Host,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::GuestId",
        to = "super::user::Column::Id"
    )]
    Guest,
    #[sea_orm(has_many = "super::game_move::Entity")]
    Moves,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl Related<super::game_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
