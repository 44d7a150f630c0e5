/// The slice of the user record this service reads: identity and the
/// stored IANA timezone, if any. Account management lives elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub timezone: Option<String>,
}
