//! Flow query request

use std::fmt;
use std::sync::Arc;

use crate::domain::{FilterFunc, Timestamp};

/// Parameters of a `GetFlows` query
///
/// `number` is taken literally: a caller that means "no limit" passes
/// `u64::MAX` (or the ring capacity). Both time bounds are exclusive.
pub struct GetFlowsRequest<T> {
    /// Maximum number of historical flows
    pub number: u64,
    /// Only flows strictly after this time
    pub since: Option<Timestamp>,
    /// Only flows strictly before this time
    pub until: Option<Timestamp>,
    /// Keep streaming new flows after the historical batch
    pub follow: bool,
    pub allow: Vec<FilterFunc<T>>,
    pub deny: Vec<FilterFunc<T>>,
}

impl<T> GetFlowsRequest<T> {
    /// Request for the last `number` flows
    #[must_use]
    pub fn last(number: u64) -> Self {
        Self {
            number,
            since: None,
            until: None,
            follow: false,
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }

    /// Request for every flow the ring still holds
    #[must_use]
    pub fn all() -> Self {
        Self::last(u64::MAX)
    }

    #[must_use]
    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub fn until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    #[must_use]
    pub fn allow(mut self, filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.allow.push(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn deny(mut self, filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.deny.push(Arc::new(filter));
        self
    }
}

impl<T> Clone for GetFlowsRequest<T> {
    fn clone(&self) -> Self {
        Self {
            number: self.number,
            since: self.since,
            until: self.until,
            follow: self.follow,
            allow: self.allow.clone(),
            deny: self.deny.clone(),
        }
    }
}

impl<T> fmt::Debug for GetFlowsRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetFlowsRequest")
            .field("number", &self.number)
            .field("since", &self.since)
            .field("until", &self.until)
            .field("follow", &self.follow)
            .field("allow", &self.allow.len())
            .field("deny", &self.deny.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let req = GetFlowsRequest::<Timestamp>::last(10)
            .since(Timestamp::from_secs(2))
            .until(Timestamp::from_secs(7))
            .follow(true)
            .allow(|ts| ts.seconds > 0)
            .deny(|ts| ts.seconds == 5);

        assert_eq!(req.number, 10);
        assert_eq!(req.since, Some(Timestamp::from_secs(2)));
        assert_eq!(req.until, Some(Timestamp::from_secs(7)));
        assert!(req.follow);
        assert_eq!(req.allow.len(), 1);
        assert_eq!(req.deny.len(), 1);

        let debug = format!("{:?}", req.clone());
        assert!(debug.contains("number: 10"));
        assert!(debug.contains("allow: 1"));
    }
}
