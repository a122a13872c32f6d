//! Transport seam between the session layer and the backend.
//!
//! [`Transport`] is the crate's only dependency on an HTTP stack. The
//! bare-versus-authenticated split is structural, not URL-based: a
//! [`crate::session::SessionManager`] holds a transport directly (never
//! intercepted, so refresh and logout cannot recurse into themselves), while
//! [`crate::client::ApiClient`] wraps one with the interception pipeline.

// self
use crate::{_prelude::*, error::TransportError};

/// Path prefix shared by every backend endpoint.
pub const BASE_PATH: &str = "/api/v1";

/// HTTP methods used by the backend contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the method's wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Image part of a multipart medication upload.
#[derive(Clone)]
pub struct ImagePart {
	/// File name reported to the backend.
	pub file_name: String,
	/// MIME type of the image bytes.
	pub mime: String,
	/// Raw image bytes.
	pub bytes: Vec<u8>,
}
impl Debug for ImagePart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImagePart")
			.field("file_name", &self.file_name)
			.field("mime", &self.mime)
			.field("bytes", &self.bytes.len())
			.finish()
	}
}

/// Request body variants the backend accepts.
#[derive(Clone, Debug)]
pub enum ApiBody {
	/// No body.
	Empty,
	/// JSON body.
	Json(serde_json::Value),
	/// Multipart upload: a `request` JSON part plus an `image` file part.
	Multipart {
		/// JSON part named `request`.
		request: serde_json::Value,
		/// File part named `image`.
		image: ImagePart,
	},
}

/// Outbound request description, transport-agnostic.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Endpoint path below [`BASE_PATH`], starting with `/`.
	pub path: String,
	/// Bearer token attached as the Authorization header, when present.
	pub bearer: Option<String>,
	/// Request body.
	pub body: ApiBody,
}
impl ApiRequest {
	/// Builds a bodyless request.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), bearer: None, body: ApiBody::Empty }
	}

	/// Builds a JSON request.
	pub fn json(method: Method, path: impl Into<String>, body: serde_json::Value) -> Self {
		Self { method, path: path.into(), bearer: None, body: ApiBody::Json(body) }
	}

	/// Attaches a bearer token.
	pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
		self.bearer = Some(token.into());

		self
	}
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes (envelope JSON on every backend endpoint).
	pub bytes: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Capability to execute one backend request.
///
/// A transport resolves only network-level outcomes; HTTP error statuses are
/// returned as ordinary [`ApiResponse`] values for the caller to classify.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Executes the request and collects the response body.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Reqwest-backed [`Transport`] bound to one backend base URL.
///
/// The base URL is injected at construction (the client app bakes it in at
/// build time); [`BASE_PATH`] is appended to every request path.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Creates a transport with a default reqwest client.
	pub fn new(base_url: Url) -> Self {
		Self::with_client(ReqwestClient::default(), base_url)
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, base_url }
	}

	fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
		let joined =
			format!("{}{BASE_PATH}{path}", self.base_url.as_str().trim_end_matches('/'));

		Ok(Url::parse(&joined)?)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.client.clone();
		let endpoint = self.endpoint(&request.path);

		Box::pin(async move {
			let url = endpoint?;
			let mut builder = match request.method {
				Method::Get => client.get(url),
				Method::Post => client.post(url),
				Method::Put => client.put(url),
				Method::Delete => client.delete(url),
			};

			if let Some(bearer) = &request.bearer {
				builder = builder.bearer_auth(bearer);
			}

			builder = match request.body {
				ApiBody::Empty => builder,
				ApiBody::Json(value) => builder.json(&value),
				ApiBody::Multipart { request: json_part, image } => {
					let form = reqwest::multipart::Form::new()
						.part(
							"request",
							reqwest::multipart::Part::text(json_part.to_string())
								.mime_str("application/json")
								.map_err(TransportError::from)?,
						)
						.part(
							"image",
							reqwest::multipart::Part::bytes(image.bytes)
								.file_name(image.file_name)
								.mime_str(&image.mime)
								.map_err(TransportError::from)?,
						);

					builder.multipart(form)
				},
			};

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let bytes = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ApiResponse { status, bytes })
		})
	}
}
