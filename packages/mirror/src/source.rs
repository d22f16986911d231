//! Source probing.
//!
//! Issues one `GET` with `Accept-Encoding: gzip` and keeps the response
//! open: the headers drive the freshness check, and the body is streamed
//! to the destination only if a transfer is needed. Bodies are passed
//! through as received (no transparent decompression), so the stored bytes
//! always agree with the stored `Content-Encoding`.

use futures::TryStreamExt as _;
use reqwest::header::{
    ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, ETAG, HeaderName, LAST_MODIFIED,
};
use url_mirror_models::SourceHeaders;

use crate::{BodyStream, MirrorError};

/// An open source response: its cache-relevant headers plus the unread
/// body.
///
/// Dropping the descriptor closes the connection.
#[derive(Debug)]
pub struct SourceDescriptor {
    /// Headers consulted by the freshness check.
    pub headers: SourceHeaders,
    response: reqwest::Response,
}

impl SourceDescriptor {
    /// Consumes the descriptor, yielding the body as a byte stream.
    #[must_use]
    pub fn into_body(self) -> BodyStream {
        Box::pin(self.response.bytes_stream().map_err(std::io::Error::other))
    }
}

/// Requests `url` and returns its headers with the body left unread.
///
/// # Errors
///
/// Returns [`MirrorError::Source`] on connection failures or a non-2xx
/// status.
pub async fn probe(client: &reqwest::Client, url: &str) -> Result<SourceDescriptor, MirrorError> {
    let response = client
        .get(url)
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| MirrorError::Source {
            url: url.to_string(),
            source: e,
        })?;

    let headers = SourceHeaders {
        content_encoding: header_value(&response, &CONTENT_ENCODING),
        content_type: header_value(&response, &CONTENT_TYPE),
        etag: header_value(&response, &ETAG),
        last_modified: header_value(&response, &LAST_MODIFIED),
    };

    Ok(SourceDescriptor { headers, response })
}

fn header_value(response: &reqwest::Response, name: &HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn captures_headers_and_requests_gzip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auctions.json"))
            .and(header("accept-encoding", "gzip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"abc\"")
                    .insert_header("Last-Modified", "Tue, 09 Oct 2018 12:34:56 GMT")
                    .set_body_raw("{\"auctions\":[]}", "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let source = probe(&client, &format!("{}/auctions.json", server.uri()))
            .await
            .unwrap();

        assert_eq!(source.headers.etag.as_deref(), Some("\"abc\""));
        assert_eq!(
            source.headers.last_modified.as_deref(),
            Some("Tue, 09 Oct 2018 12:34:56 GMT")
        );
        assert_eq!(
            source.headers.content_type.as_deref(),
            Some("application/json")
        );
        assert_eq!(source.headers.content_encoding, None);

        let chunks: Vec<bytes::Bytes> = source.into_body().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"{\"auctions\":[]}");
    }

    #[tokio::test]
    async fn error_status_is_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/missing", server.uri());
        let err = probe(&client, &url).await.unwrap_err();

        match err {
            MirrorError::Source { url: failed, source } => {
                assert_eq!(failed, url);
                assert_eq!(source.status(), Some(reqwest::StatusCode::NOT_FOUND));
            }
            other => panic!("expected Source error, got {other:?}"),
        }
    }
}
