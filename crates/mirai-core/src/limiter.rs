//! Outbound request rate limiting.

use std::fmt;
use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// What to do with a request when no token is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPolicy {
    /// Wait until a token frees up.
    #[default]
    Wait,
    /// Fail immediately with [`ApiError::RateLimited`].
    Drop,
}

/// Token bucket gate in front of [`Session::call`](crate::Session::call).
pub struct RateLimiter {
    limiter: DefaultDirectRateLimiter,
    policy: LimitPolicy,
    per_second: NonZeroU32,
    burst: NonZeroU32,
}

impl RateLimiter {
    /// Allows `per_second` requests per second with bursts of up to `burst`.
    pub fn per_second(per_second: NonZeroU32, burst: NonZeroU32, policy: LimitPolicy) -> Self {
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            limiter: DefaultDirectRateLimiter::direct(quota),
            policy,
            per_second,
            burst,
        }
    }

    /// The configured policy.
    pub fn policy(&self) -> LimitPolicy {
        self.policy
    }

    /// Admits one request according to the policy.
    pub async fn admit(&self) -> ApiResult<()> {
        match self.policy {
            LimitPolicy::Wait => {
                self.limiter.until_ready().await;
                Ok(())
            }
            LimitPolicy::Drop => self.limiter.check().map_err(|_| ApiError::RateLimited),
        }
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_second", &self.per_second)
            .field("burst", &self.burst)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_drop_policy_rejects_when_exhausted() {
        let limiter = RateLimiter::per_second(nz(1), nz(2), LimitPolicy::Drop);

        assert!(limiter.admit().await.is_ok());
        assert!(limiter.admit().await.is_ok());
        assert!(matches!(limiter.admit().await, Err(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_wait_policy_eventually_admits() {
        let limiter = RateLimiter::per_second(nz(100), nz(1), LimitPolicy::Wait);

        limiter.admit().await.unwrap();
        // Bucket is empty; the next admission waits roughly 10ms.
        limiter.admit().await.unwrap();
        assert_eq!(limiter.policy(), LimitPolicy::Wait);
    }
}
