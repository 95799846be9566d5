//! Chained mocks
//!
//! When a stubbed call's return kind is mockable, the registration step
//! creates a secondary mock standing in for the return value, so fluent
//! call chains can be stubbed. One chained mock exists per
//! (proxy, method) pair and is cached: restubbing the same fluent path
//! composes on the same chained mock instead of replacing it.
//!
//! Chaining is a convenience, not a guarantee. If the chain target cannot
//! be created (its type is unknown, or chaining is disabled) the failure is
//! swallowed and the registration proceeds unchained.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use understudy_core::{MethodSig, ReturnKind};

use crate::invocation::ProxyId;
use crate::proxy::MockProxy;

/// Cache of chained mocks, keyed by (outer proxy, method name)
#[derive(Default)]
pub struct ChainedMocks {
    cache: Mutex<HashMap<(ProxyId, String), Arc<MockProxy>>>,
}

impl ChainedMocks {
    /// Create an empty cache
    pub fn new() -> Self {
        ChainedMocks::default()
    }

    /// Get or create the chained mock for a stubbed call on `method`
    ///
    /// `create` receives the chain target's type name and returns `None`
    /// when the target cannot be mocked; that failure is swallowed here and
    /// surfaces only as a debug event. Non-mockable return kinds never
    /// chain.
    pub fn get_or_create(
        &self,
        outer: &Arc<MockProxy>,
        method: &MethodSig,
        create: impl FnOnce(&str) -> Option<Arc<MockProxy>>,
    ) -> Option<Arc<MockProxy>> {
        let type_name = match &method.return_kind {
            ReturnKind::Mockable { type_name } => type_name.clone(),
            _ => return None,
        };
        let key = (outer.id(), method.name.clone());

        let mut cache = self.cache.lock();
        if let Some(chained) = cache.get(&key) {
            return Some(chained.clone());
        }
        match create(&type_name) {
            Some(chained) => {
                cache.insert(key, chained.clone());
                Some(chained)
            }
            None => {
                debug!(
                    mock = %outer.name(),
                    method = %method.name,
                    chain_type = %type_name,
                    "chained mock could not be created, continuing unchained"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use understudy_core::MockedType;

    fn outer() -> Arc<MockProxy> {
        let mocked_type = MockedType::new("UserService")
            .method("session", 0, ReturnKind::mockable("Session"))
            .method("count", 0, ReturnKind::Int);
        MockProxy::new(
            "user_service",
            mocked_type,
            Arc::new(Mutex::new(Scenario::new(50))),
        )
    }

    fn chained_proxy(name: &str) -> Arc<MockProxy> {
        MockProxy::new(
            name,
            MockedType::new("Session"),
            Arc::new(Mutex::new(Scenario::new(50))),
        )
    }

    #[test]
    fn test_chained_mock_cached_per_proxy_and_method() {
        let chained_mocks = ChainedMocks::new();
        let outer = outer();
        let method = outer.find_method("session").unwrap().clone();

        let first = chained_mocks
            .get_or_create(&outer, &method, |type_name| {
                assert_eq!(type_name, "Session");
                Some(chained_proxy("user_service.session"))
            })
            .unwrap();
        // Second stubbing of the same path reuses the cached mock
        let second = chained_mocks
            .get_or_create(&outer, &method, |_| panic!("must reuse cache"))
            .unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_non_mockable_return_kind_never_chains() {
        let chained_mocks = ChainedMocks::new();
        let outer = outer();
        let method = outer.find_method("count").unwrap().clone();

        let chained = chained_mocks.get_or_create(&outer, &method, |_| {
            panic!("create must not be called for non-mockable returns")
        });
        assert!(chained.is_none());
    }

    #[test]
    fn test_creation_failure_is_swallowed() {
        let chained_mocks = ChainedMocks::new();
        let outer = outer();
        let method = outer.find_method("session").unwrap().clone();

        assert!(chained_mocks
            .get_or_create(&outer, &method, |_| None)
            .is_none());
        // A later attempt may still succeed
        assert!(chained_mocks
            .get_or_create(&outer, &method, |_| Some(chained_proxy("s")))
            .is_some());
    }
}
