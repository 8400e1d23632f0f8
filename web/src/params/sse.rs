use serde::Deserialize;
use sse::connection::ConnectionId;
use sse::message::{Room, Rooms};
use utoipa::IntoParams;

pub(crate) const ADMIN_ROLE: &str = "admin";
pub(crate) const PUBLIC_ROLE: &str = "public";

/// Query of `GET /api/realtime/sse`.
///
/// `role` is taken at face value: whoever may reach this endpoint with
/// `role=admin` joins the `admins` room. Gating that is left to whatever sits
/// in front of the server.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ConnectParams {
    pub(crate) email: Option<String>,
    pub(crate) role: Option<String>,
}

impl ConnectParams {
    /// The id and rooms of the connection to open, or `None` when the request
    /// carries neither an email nor a role this endpoint accepts.
    pub(crate) fn admit(&self) -> Option<(ConnectionId, Rooms)> {
        let email = self.email.as_deref().filter(|e| !e.is_empty());
        let role = self.role.as_deref();
        if email.is_none() && role != Some(ADMIN_ROLE) && role != Some(PUBLIC_ROLE) {
            return None;
        }

        let mut rooms = Rooms::new();
        if role == Some(ADMIN_ROLE) {
            rooms.insert(Room::admins());
        }
        if let Some(email) = email {
            rooms.insert(Room::user(email));
        }

        let id = match email {
            Some(email) => ConnectionId::new(email),
            None => ConnectionId::generated(ADMIN_ROLE),
        };
        Some((id, rooms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(email: Option<&str>, role: Option<&str>) -> ConnectParams {
        ConnectParams {
            email: email.map(str::to_string),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn requires_email_or_known_role() {
        assert!(params(None, None).admit().is_none());
        assert!(params(Some(""), Some("guest")).admit().is_none());
        assert!(params(None, Some("public")).admit().is_some());
    }

    #[test]
    fn admin_with_email_joins_both_rooms() {
        let (id, rooms) = params(Some("ana@example.com"), Some("admin"))
            .admit()
            .unwrap();
        assert_eq!(id.as_str(), "ana@example.com");
        assert!(rooms.contains(&Room::admins()));
        assert!(rooms.contains(&Room::user("ana@example.com")));
    }

    #[test]
    fn anonymous_connections_get_generated_ids() {
        let (id, rooms) = params(None, Some("admin")).admit().unwrap();
        assert!(id.as_str().starts_with("admin_"));
        assert_eq!(rooms, Rooms::from(Room::admins()));

        let (id, rooms) = params(None, Some("public")).admit().unwrap();
        assert!(id.as_str().starts_with("admin_"));
        assert!(rooms.is_empty());
    }
}
