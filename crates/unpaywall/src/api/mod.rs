use log::trace;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{Error, ErrorKind};

/// The transport used to send GET requests to the API.
///
/// Implemented for [`reqwest::blocking::Client`] so that the default [`crate::Unpaywall`] talks to
/// the network, while tests can swap in a client that never leaves the process.
pub trait Client {
    /// Sends a GET request to `url` and decodes the response body as JSON.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::Request`] is returned when the request cannot be sent or the
    /// body cannot be read, [`ErrorKind::Status`] when the response status is not a success and
    /// [`ErrorKind::Decode`] when the body cannot be decoded into `T`.
    fn get_json<T>(&self, url: &Url) -> Result<T, Error>
    where
        T: DeserializeOwned;
}

impl Client for reqwest::blocking::Client {
    fn get_json<T>(&self, url: &Url) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .get(url.clone())
            .send()
            .map_err(|e| Error::wrap(ErrorKind::Request, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| Error::wrap(ErrorKind::Request, e))?;
        trace!(
            "GET {} returned {status} with {} bytes",
            url.path(),
            body.len()
        );

        if status.is_success() {
            decode(&body)
        } else {
            Err(Error::new(
                ErrorKind::Status,
                format!("{status} from {}: {}", url.path(), body.trim()),
            ))
        }
    }
}

/// Decodes a full response body, any failure is a [`ErrorKind::Decode`] error.
pub(crate) fn decode<T>(body: &str) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| Error::wrap(ErrorKind::Decode, e))
}

#[cfg(test)]
pub(crate) use test::{
    assert_url, call_count, impl_text_producer, MockClient, NetworkErrorProducer, Producer,
    ServerErrorProducer, URL_SINK,
};
