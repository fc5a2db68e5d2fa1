/// Usernames are unique regardless of case.
pub fn user_key(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_is_normalized() {
        assert_eq!(user_key(" Ana "), "ana");
        assert_eq!(user_key("ANA"), user_key("ana"));
    }
}
