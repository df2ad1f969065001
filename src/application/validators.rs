use validator::ValidateEmail;

/// Shortest password accepted at activation.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Counts characters, not bytes.
pub fn is_acceptable_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Provider checkout session ids look like `cs_test_a1B2c3`.
pub fn is_valid_checkout_session_id(session_id: &str) -> bool {
    session_id.len() <= 255
        && session_id
            .strip_prefix("cs_")
            .is_some_and(|rest| {
                !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            })
}
