//! Domain layer - core business logic and entities

pub mod notification;
pub mod price;
