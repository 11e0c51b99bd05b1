// handlers/protected/mod.rs - Endpoints behind the JWT middleware
//
// Every handler acts as the user named by the token (`AuthUser`). Tenant and
// admin checks happen in the services, not here.

pub mod company;
pub mod courses;
pub mod lessons;
pub mod positions;
pub mod users;

/// PATCH bodies treat an empty string like an absent field.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::non_empty;

    #[test]
    fn empty_strings_are_absent() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("x".into())).as_deref(), Some("x"));
    }
}
