// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use client_pool::{
	auth::{AuthMode, AuthRequest, UserAssertion},
	config::PoolConfig,
	facade::{
		AssertionResolver, DelegatedOrApplication, Extraction, RequestExtractor, RequestFacade,
	},
	pool::ClientPool,
	testutil::{
		CountingClientFactory, StaticApplicationStrategy, StaticDelegatedStrategy, StubOptions,
		assertion,
	},
};

/// Transport-shaped request carrying pre-verified auth material.
#[derive(Clone, Debug, Default)]
struct GatewayRequest {
	bearer: Option<UserAssertion>,
	region: Option<String>,
}

struct GatewayExtractor;
impl RequestExtractor<GatewayRequest, StubOptions> for GatewayExtractor {
	fn extract(&self, request: &GatewayRequest) -> Extraction<StubOptions> {
		Extraction {
			assertion: request.bearer.clone(),
			options: request.region.clone().map(StubOptions::new),
		}
	}
}

struct AlwaysComposite;
impl AssertionResolver for AlwaysComposite {
	fn resolve(&self, assertion: Option<UserAssertion>) -> AuthRequest {
		match assertion {
			Some(assertion) => AuthRequest::Composite(assertion),
			None => AuthRequest::Application,
		}
	}
}

fn facade_with(
	resolver: Arc<dyn AssertionResolver>,
) -> RequestFacade<CountingClientFactory, GatewayRequest> {
	let pool = ClientPool::new(
		CountingClientFactory::default(),
		Arc::new(StaticApplicationStrategy::default()),
		Arc::new(StaticDelegatedStrategy::default()),
		PoolConfig::default(),
	)
	.expect("Pool construction for the facade should succeed.");

	RequestFacade::new(Arc::new(pool), Arc::new(GatewayExtractor), resolver)
}

#[tokio::test]
async fn requests_without_assertions_resolve_to_application_clients() {
	let facade = facade_with(Arc::new(DelegatedOrApplication));
	let client = facade
		.get_client(&GatewayRequest::default())
		.await
		.expect("Assertion-free request should yield an application client.");

	assert_eq!(client.mode, AuthMode::Application);
}

#[tokio::test]
async fn requests_with_assertions_resolve_to_delegated_clients() {
	let facade = facade_with(Arc::new(DelegatedOrApplication));
	let request = GatewayRequest {
		bearer: Some(assertion("tenant-a", "user-alice", Duration::hours(1))),
		region: Some("eastus".into()),
	};
	let client = facade
		.get_client(&request)
		.await
		.expect("Asserted request should yield a delegated client.");

	assert_eq!(client.mode, AuthMode::Delegated);
	assert_eq!(client.credential.subject.as_deref(), Some("user-alice"));
	assert_eq!(client.endpoint.as_deref(), Some("eastus"));
}

#[tokio::test]
async fn equal_requests_share_one_cached_client() {
	let facade = facade_with(Arc::new(DelegatedOrApplication));
	let request = GatewayRequest {
		bearer: Some(assertion("tenant-a", "user-alice", Duration::hours(1))),
		region: Some("eastus".into()),
	};
	let first = facade.get_client(&request).await.expect("First facade call should succeed.");
	let second = facade.get_client(&request).await.expect("Second facade call should succeed.");

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(facade.pool().factory().built(), 1);
}

#[tokio::test]
async fn custom_resolvers_choose_the_auth_mode() {
	let facade = facade_with(Arc::new(AlwaysComposite));
	let request = GatewayRequest {
		bearer: Some(assertion("tenant-a", "user-alice", Duration::hours(1))),
		region: None,
	};
	let client = facade
		.get_client(&request)
		.await
		.expect("Composite-resolved request should yield a client.");

	assert_eq!(client.mode, AuthMode::Composite);
	assert!(client.application_credential.is_some());
}

#[tokio::test]
async fn invalidation_through_the_facade_hits_the_same_key() {
	let facade = facade_with(Arc::new(DelegatedOrApplication));
	let request = GatewayRequest {
		bearer: Some(assertion("tenant-a", "user-alice", Duration::hours(1))),
		region: Some("eastus".into()),
	};

	facade.get_client(&request).await.expect("Seeding through the facade should succeed.");

	assert!(facade
		.invalidate_client(&request)
		.await
		.expect("Invalidation of a present entry should succeed."));
	assert!(!facade
		.invalidate_client(&request)
		.await
		.expect("Second invalidation should report an absent entry."));
	assert_eq!(facade.pool().factory().disposed(), 1);
}
