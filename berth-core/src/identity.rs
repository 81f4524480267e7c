use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// An authenticated caller, as vouched for by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self { user_id, role: Role::User }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Capability checks consulted by the booking orchestrator.
pub trait AccessPolicy: Send + Sync {
    fn can_book(&self, actor: &Actor) -> bool;

    fn can_view(&self, actor: &Actor, booking: &Booking) -> bool;

    fn can_cancel(&self, actor: &Actor, booking: &Booking) -> bool;
}

/// Owners manage their own bookings; admins may read any booking but cannot cancel it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy;

impl AccessPolicy for OwnershipPolicy {
    fn can_book(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_view(&self, actor: &Actor, booking: &Booking) -> bool {
        booking.is_owned_by(actor.user_id) || actor.is_admin()
    }

    fn can_cancel(&self, actor: &Actor, booking: &Booking) -> bool {
        booking.is_owned_by(actor.user_id)
    }
}
