//! Paths on the backend, relative to the API root.
//!
//! Every resource path ends with `/`, matching the backend router.

use std::fmt::Display;

pub const TOKEN: &str = "token/";
pub const REGISTER: &str = "register/";
pub const EVENTS: &str = "events/";
pub const ATTENDEES: &str = "attendees/";
pub const TASKS: &str = "tasks/";

/// `{collection}{id}/`
pub fn item(collection: &str, id: impl Display) -> String {
    format!("{}{}/", collection, id)
}

/// `{collection}{id}/{action}/` for the extra viewset actions
pub fn action(collection: &str, id: impl Display, action: &str) -> String {
    format!("{}{}/{}/", collection, id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_keep_trailing_slash() {
        assert_eq!(item(EVENTS, 7), "events/7/");
        assert_eq!(item(TASKS, "abc"), "tasks/abc/");
        assert_eq!(action(EVENTS, 3, "add_attendee"), "events/3/add_attendee/");
        assert_eq!(action(ATTENDEES, 5, "events"), "attendees/5/events/");
    }
}
