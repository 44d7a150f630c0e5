//! User timezone resolution.
//!
//! "What day is it" depends on the user, not the server host. The resolver
//! centralizes that lookup: the stored IANA zone when one exists and
//! parses, the configured default otherwise. Resolution never fails.

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::storage::UserRepository;

/// Resolves and stores per-user timezones
#[derive(Clone)]
pub struct TimezoneService {
    users: UserRepository,
    default_tz: Tz,
}

impl TimezoneService {
    pub fn new(users: UserRepository, default_tz: Tz) -> Self {
        Self { users, default_tz }
    }

    /// The timezone to use for this user's day boundaries. Missing user
    /// records, absent timezones, unparseable names and lookup errors all
    /// fall back to the default.
    pub async fn resolve(&self, user_id: &str) -> Tz {
        match self.users.get_user(user_id).await {
            Ok(Some(user)) => match user.timezone.as_deref() {
                Some(name) if !name.is_empty() => name.parse::<Tz>().unwrap_or_else(|_| {
                    warn!(user_id, timezone = name, "stored timezone does not parse, using default");
                    self.default_tz
                }),
                _ => self.default_tz,
            },
            Ok(None) => self.default_tz,
            Err(e) => {
                warn!(user_id, error = %e, "timezone lookup failed, using default");
                self.default_tz
            }
        }
    }

    /// Validate and store the caller's timezone
    pub async fn set_timezone(&self, user_id: &str, timezone: &str) -> AppResult<Tz> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| AppError::validation(format!("'{}' is not an IANA timezone", timezone)))?;

        self.users.upsert_timezone(user_id, timezone).await?;
        info!(user_id, timezone, "timezone updated");

        Ok(tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use chrono_tz::Europe::Istanbul;

    async fn setup() -> TimezoneService {
        let db = DbConnection::init_test().await.expect("init test db");
        TimezoneService::new(UserRepository::new(db), Istanbul)
    }

    #[tokio::test]
    async fn test_unknown_user_gets_default() {
        let service = setup().await;

        assert_eq!(service.resolve("nobody").await, Istanbul);
    }

    #[tokio::test]
    async fn test_stored_timezone_wins() {
        let service = setup().await;

        service
            .set_timezone("user-1", "America/New_York")
            .await
            .expect("set timezone");

        assert_eq!(
            service.resolve("user-1").await,
            chrono_tz::America::New_York
        );
    }

    #[tokio::test]
    async fn test_invalid_timezone_rejected() {
        let service = setup().await;

        let result = service.set_timezone("user-1", "Mars/Olympus_Mons").await;
        assert!(result.is_err());

        // Nothing was stored, so resolution still falls back
        assert_eq!(service.resolve("user-1").await, Istanbul);
    }
}
