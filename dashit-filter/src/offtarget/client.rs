use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::OfftargetConfig;
use crate::errors::{OfftargetError, OfftargetResult};
use crate::offtarget::{MatchRecord, OfftargetMatcher, parse_match_records};
use crate::radius::Radius;

/// The query the server must answer before it is considered ready.
pub const PROBE_GUIDE: &str = "ACGTACGTACGTACGTACGT";

///
/// Blocking HTTP client for the off-target server's `/search` endpoint.
///
/// Connection failures are retried up to `max_attempts` times, waiting
/// `2^(failure + backoff_offset)` seconds before each retry. HTTP errors are
/// not retried.
///
pub struct OfftargetClient {
    config: OfftargetConfig,
    agent: ureq::Agent,
}

impl OfftargetClient {
    pub fn new(config: OfftargetConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        OfftargetClient { config, agent }
    }

    pub fn config(&self) -> &OfftargetConfig {
        &self.config
    }

    pub fn search_url(&self, guides: &[&str], radius: Radius) -> String {
        let limits: Vec<String> = radius.limits().iter().map(|l| l.to_string()).collect();
        format!(
            "{}/search?targets={}&limits={}",
            self.config.base_url(),
            guides.join(","),
            limits.join(",")
        )
    }

    fn fetch_with_retries(&self, url: &str) -> OfftargetResult<String> {
        self.fetch_checked(url, || Ok(()))
    }

    /// Like `fetch_with_retries`, but `before_retry` can abort the wait.
    fn fetch_checked<F>(&self, url: &str, mut before_retry: F) -> OfftargetResult<String>
    where
        F: FnMut() -> OfftargetResult<()>,
    {
        let mut failures = 0;
        loop {
            match self.agent.get(url).call() {
                Ok(response) => return Ok(response.into_string()?),
                Err(ureq::Error::Status(status, response)) => {
                    return Err(OfftargetError::Status {
                        status,
                        message: response.into_string().unwrap_or_default(),
                    });
                }
                Err(ureq::Error::Transport(transport)) => {
                    failures += 1;
                    if failures > self.config.max_attempts {
                        return Err(OfftargetError::Unreachable {
                            url: self.config.base_url(),
                            attempts: failures,
                            message: transport.to_string(),
                        });
                    }
                    before_retry()?;
                    let wait = self.config.backoff_secs(failures);
                    warn!(
                        "off-target server not reachable ({}), retry {}/{} in {}s",
                        transport, failures, self.config.max_attempts, wait
                    );
                    thread::sleep(Duration::from_secs(wait));
                }
            }
        }
    }

    ///
    /// Send a trivial query, succeeding once the server answers it.
    ///
    pub fn probe(&self) -> OfftargetResult<()> {
        self.probe_while(|| Ok(()))
    }

    ///
    /// [OfftargetClient::probe], giving up as soon as `alive` fails between
    /// retries.
    ///
    pub fn probe_while<F>(&self, alive: F) -> OfftargetResult<()>
    where
        F: FnMut() -> OfftargetResult<()>,
    {
        let url = self.search_url(&[PROBE_GUIDE], Radius::FAR);
        self.fetch_checked(&url, alive).map(|_| ())
    }
}

impl OfftargetMatcher for OfftargetClient {
    fn query(&self, guides: &[&str], radius: Radius) -> OfftargetResult<Vec<MatchRecord>> {
        let batch_size = match self.config.batch_size {
            0 => guides.len().max(1),
            n => n,
        };

        let mut records = Vec::with_capacity(guides.len());
        for (i, batch) in guides.chunks(batch_size).enumerate() {
            debug!("radius {}: batch {} with {} guides", radius, i + 1, batch.len());
            let body = self.fetch_with_retries(&self.search_url(batch, radius))?;
            records.extend(parse_match_records(&body));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    ///
    /// Serve `responses` one per connection on a free local port and report
    /// every request line back through the channel.
    ///
    fn serve(responses: Vec<(u16, String)>) -> (u16, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                tx.send(request_line.trim_end().to_string()).unwrap();
                write!(
                    stream,
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                )
                .unwrap();
            }
        });

        (port, rx)
    }

    fn config(port: u16) -> OfftargetConfig {
        OfftargetConfig {
            host: "127.0.0.1".to_string(),
            port,
            max_attempts: 0,
            timeout_secs: 5,
            ..OfftargetConfig::default()
        }
    }

    const G1: &str = "GACTTCGAATGGCATCCTGA";
    const G2: &str = "GTCCAGTTACAGGTCAAGTA";
    const G3: &str = "AAAAAGCCAGTCAGTCCGAT";

    #[rstest]
    fn test_search_url() {
        let client = OfftargetClient::new(OfftargetConfig::default());
        assert_eq!(
            client.search_url(&[G1, G2], Radius::NEAR),
            format!(
                "http://localhost:8080/search?targets={},{}&limits=5,9,19",
                G1, G2
            )
        );
    }

    #[rstest]
    fn test_query_batches_and_parses() {
        let (port, requests) = serve(vec![
            (200, format!("{} true\n{} false\n", G1, G2)),
            (200, format!("{} false\n", G3)),
        ]);
        let client = OfftargetClient::new(OfftargetConfig {
            batch_size: 2,
            ..config(port)
        });

        let records = client.query(&[G1, G2, G3], Radius::FAR).unwrap();
        let hits: Vec<&str> = records
            .iter()
            .filter(|r| r.hit)
            .map(|r| r.guide.as_str())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(hits, vec![G1]);

        let first = requests.recv().unwrap();
        let second = requests.recv().unwrap();
        assert_eq!(
            first,
            format!("GET /search?targets={},{}&limits=5,9,18 HTTP/1.1", G1, G2)
        );
        assert_eq!(
            second,
            format!("GET /search?targets={}&limits=5,9,18 HTTP/1.1", G3)
        );
    }

    #[rstest]
    fn test_http_errors_are_not_retried() {
        let (port, _requests) = serve(vec![(500, "boom".to_string())]);
        let client = OfftargetClient::new(config(port));
        let result = client.query(&[G1], Radius::FAR);
        assert!(matches!(
            result,
            Err(OfftargetError::Status { status: 500, .. })
        ));
    }

    #[rstest]
    fn test_unreachable_server_fails_after_attempts() {
        // bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = OfftargetClient::new(config(port));
        match client.probe() {
            Err(OfftargetError::Unreachable { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected Unreachable, got {:?}", other.err()),
        }
    }

    #[rstest]
    fn test_probe_stops_when_server_dies() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = OfftargetClient::new(OfftargetConfig {
            max_attempts: 20,
            ..config(port)
        });

        let mut checks = 0;
        let result = client.probe_while(|| {
            checks += 1;
            Err(OfftargetError::ServerExited(Some(3)))
        });
        assert!(matches!(result, Err(OfftargetError::ServerExited(Some(3)))));
        assert_eq!(checks, 1);
    }
}
