use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role tag on the unified user entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Client,
    Lawyer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Lawyer => "Lawyer",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Client" => Some(Role::Client),
            "Lawyer" => Some(Role::Lawyer),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The acting user as reported by the identity collaborator.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Unified user record. Lawyer profile fields stay `None` for clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub balance: Decimal,
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub zoom_link: Option<String>,
    pub office_address: Option<String>,
    pub is_on_main: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub role: String,
    pub balance: Decimal,
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub zoom_link: Option<String>,
    pub office_address: Option<String>,
    pub is_on_main: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            role: Role::parse(&row.role).unwrap_or(Role::Client),
            balance: row.balance,
            experience: row.experience,
            specialization: row.specialization,
            price: row.price,
            description: row.description,
            photo_url: row.photo_url,
            zoom_link: row.zoom_link,
            office_address: row.office_address,
            is_on_main: row.is_on_main,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

impl User {
    pub fn is_bookable_lawyer(&self) -> bool {
        self.role == Role::Lawyer && self.is_active
    }
}
