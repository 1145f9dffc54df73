use serde::Deserialize;
use std::fmt::Debug;
use url::Url;

/// A single API call that can be built into an HTTP request and sent.
///
/// If the request succeeds, the call will resolve to a `Response`.
pub trait Endpoint {
    type Response: for<'a> Deserialize<'a> + Debug;

    /// The HTTP Method used for this endpoint (e.g. GET, PATCH, DELETE)
    fn method(&self) -> reqwest::Method;

    /// The URL path for this endpoint, relative to the client base url
    fn path(&self) -> String;

    /// The raw query string. It is set as is, so the endpoint is responsible
    /// for any escaping. Defaults to `None`.
    #[inline]
    fn query(&self) -> Option<String> {
        None
    }

    /// Builds and returns a formatted full URL, including query, for the endpoint.
    ///
    /// Implementors should generally not override this.
    fn url(&self, base_url: &Url) -> Result<Url, url::ParseError> {
        let mut url = base_url.join(&self.path())?;
        url.set_query(self.query().filter(|query| !query.is_empty()).as_deref());
        Ok(url)
    }
}
