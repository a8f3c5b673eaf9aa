//! HTTP transport producing deferred documents.

use tokio::runtime::Handle;
use tracing::debug;

use crate::deferred::Deferred;
use crate::scheduler::Scheduler;
use crate::xml::Document;

use super::error::TransportError;
use super::query::with_params;

/// Issues GET requests and delivers parsed XML documents.
///
/// Each request runs as a task on the ambient tokio runtime; its completion
/// settles the returned [`Deferred`] exactly once.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    scheduler: Scheduler,
}

impl Transport {
    pub fn new(http: reqwest::Client, scheduler: Scheduler) -> Self {
        Self { http, scheduler }
    }

    /// Request `url` with `params` appended as a query string.
    ///
    /// Resolves with the parsed response body on HTTP 200. Rejects with a
    /// [`TransportError`]: `Status` for any other status, `Network` when
    /// the request itself fails, `Xml` for an unparsable body, and
    /// `NoRuntime` when called outside a tokio runtime.
    pub fn get(&self, url: &str, params: &[(&str, &str)]) -> Deferred<Document> {
        let url = with_params(url, params);
        let http = self.http.clone();

        Deferred::new(&self.scheduler, move |resolver| {
            let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

            debug!(%url, "requesting document");
            runtime.spawn(async move {
                match fetch(&http, &url).await {
                    Ok(document) => {
                        debug!(%url, root = %document.root().name, "document received");
                        resolver.fulfill(document);
                    }
                    Err(error) => {
                        debug!(%url, %error, "request failed");
                        resolver.reject(error);
                    }
                }
            });

            Ok(())
        })
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<Document, TransportError> {
    let response = http.get(url).send().await?;
    let status = response.status();

    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;

    Ok(Document::parse(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::DeferredState;

    #[test]
    fn get_outside_runtime_rejects() {
        let (scheduler, _queue) = Scheduler::channel();
        let transport = Transport::new(reqwest::Client::new(), scheduler);

        let document = transport.get("http://127.0.0.1:1/xml-stations.aspx", &[]);

        assert_eq!(document.state(), DeferredState::Rejected);
    }

    #[tokio::test]
    async fn get_reports_no_runtime_reason() {
        let scheduler = Scheduler::spawn_on(&Handle::current());
        let transport = Transport::new(reqwest::Client::new(), scheduler);

        let result = std::thread::spawn(move || {
            transport.get("http://127.0.0.1:1/xml-stations.aspx", &[])
        })
        .join()
        .unwrap()
        .await;

        let reason = result.unwrap_err();
        assert!(matches!(
            reason.downcast_ref::<TransportError>(),
            Some(TransportError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn get_unparsable_url_is_a_network_error() {
        let scheduler = Scheduler::spawn_on(&Handle::current());
        let transport = Transport::new(reqwest::Client::new(), scheduler);

        let reason = transport.get("not a url", &[]).await.unwrap_err();

        assert!(matches!(
            reason.downcast_ref::<TransportError>(),
            Some(TransportError::Network(_))
        ));
    }
}
