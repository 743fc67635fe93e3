//! Request-aware facade extracting auth material from transport request objects.

// self
use crate::{
	_prelude::*,
	auth::{AuthRequest, UserAssertion},
	pool::{ClientFactory, ClientPool},
};

/// Auth material and options pulled out of one transport request.
#[derive(Clone, Debug, Default)]
pub struct Extraction<O> {
	/// Verified assertion found on the request, if any.
	///
	/// Extractors must yield an assertion-shaped value or nothing; raw bearer strings
	/// belong in an [`AssertionValidator`](crate::auth::AssertionValidator) first.
	pub assertion: Option<UserAssertion>,
	/// Client options found on the request, if any.
	pub options: Option<O>,
}

/// Pulls auth material and options out of a caller request type.
///
/// Implementations must be pure with respect to the request value.
pub trait RequestExtractor<R, O>
where
	Self: Send + Sync,
{
	/// Extracts the assertion and options carried by the request.
	fn extract(&self, request: &R) -> Extraction<O>;
}

/// Maps an optional assertion onto an [`AuthRequest`] variant.
pub trait AssertionResolver
where
	Self: Send + Sync,
{
	/// Chooses the auth mode for the extracted assertion.
	fn resolve(&self, assertion: Option<UserAssertion>) -> AuthRequest;
}

/// Resolver choosing [`AuthRequest::Delegated`] when an assertion is present and
/// [`AuthRequest::Application`] otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelegatedOrApplication;
impl AssertionResolver for DelegatedOrApplication {
	fn resolve(&self, assertion: Option<UserAssertion>) -> AuthRequest {
		match assertion {
			Some(assertion) => AuthRequest::Delegated(assertion),
			None => AuthRequest::Application,
		}
	}
}

/// Convenience wrapper composing extract, resolve, and the pool.
pub struct RequestFacade<F, R>
where
	F: ClientFactory,
{
	pool: Arc<ClientPool<F>>,
	extractor: Arc<dyn RequestExtractor<R, F::Options>>,
	resolver: Arc<dyn AssertionResolver>,
}
impl<F, R> RequestFacade<F, R>
where
	F: ClientFactory,
{
	/// Wraps a shared pool with the provided extractor and resolver.
	pub fn new(
		pool: Arc<ClientPool<F>>,
		extractor: Arc<dyn RequestExtractor<R, F::Options>>,
		resolver: Arc<dyn AssertionResolver>,
	) -> Self {
		Self { pool, extractor, resolver }
	}

	/// Returns a client for the transport request.
	pub async fn get_client(&self, request: &R) -> Result<Arc<F::Client>> {
		let Extraction { assertion, options } = self.extractor.extract(request);
		let auth = self.resolver.resolve(assertion);

		self.pool.get_client(&auth, options.as_ref()).await
	}

	/// Evicts the cached client for the transport request.
	pub async fn invalidate_client(&self, request: &R) -> Result<bool> {
		let Extraction { assertion, options } = self.extractor.extract(request);
		let auth = self.resolver.resolve(assertion);

		self.pool.invalidate_client(&auth, options.as_ref()).await
	}

	/// Borrows the wrapped pool.
	pub fn pool(&self) -> &Arc<ClientPool<F>> {
		&self.pool
	}
}
impl<F, R> Debug for RequestFacade<F, R>
where
	F: ClientFactory,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestFacade").field("pool", &self.pool).finish()
	}
}
