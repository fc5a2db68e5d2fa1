pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";
pub const META: &str = "meta";
