// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! Random buffer sources
//!
//! Both sources produce a full `RandomBuffer` or an error; a partially filled buffer
//! is never returned.

use crate::{
    buffer::RandomBuffer,
    fetcher::RandomOrgClient,
    protocol::{ChunkPlan, IntegerRequest},
    Error, Result, NUM_RAND_INTS,
};
use rand::{distributions::OpenClosed01, rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Something that can fill a (128, 128, 3) buffer with random bytes
pub trait RandomBufferSource {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Produce a complete buffer
    fn produce(&self) -> impl Future<Output = Result<RandomBuffer>> + Send;
}

/// "True" random bytes from random.org
///
/// Consumes quota: every integer costs 8 bits.
#[derive(Clone)]
pub struct RemoteSource {
    client: RandomOrgClient,
}

impl RemoteSource {
    pub fn new(client: RandomOrgClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RandomOrgClient {
        &self.client
    }
}

impl RandomBufferSource for RemoteSource {
    fn name(&self) -> &'static str {
        "random.org"
    }

    /// Requests are issued one at a time; each response is appended before the next
    /// request goes out.
    #[instrument(skip(self), fields(total = NUM_RAND_INTS))]
    async fn produce(&self) -> Result<RandomBuffer> {
        let started = Instant::now();
        let plan = ChunkPlan::new(NUM_RAND_INTS);
        let chunks = plan.len();
        let mut values = Vec::with_capacity(NUM_RAND_INTS);
        let mut remaining = NUM_RAND_INTS;

        for (i, num) in plan.enumerate() {
            let batch = self.client.fetch_integers(&IntegerRequest::bytes(num)).await?;
            values.extend_from_slice(&batch);
            remaining -= num;

            debug!(
                "Chunk {}/{}: {} integers, {} remaining",
                i + 1,
                chunks,
                num,
                remaining
            );
        }

        let buffer = RandomBuffer::from_flat(&values)?;
        info!(
            "Filled buffer with {} integers in {} requests ({} ms)",
            values.len(),
            chunks,
            started.elapsed().as_millis()
        );
        Ok(buffer)
    }
}

/// Pseudo-random bytes from a local generator
#[derive(Debug, Clone, Default)]
pub struct LocalSource {
    seed: Option<u64>,
}

impl LocalSource {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Deterministic generator for reproducible images
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Draw one flat sequence of mapped samples
    fn sample_flat(&self) -> Vec<i32> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Samples lie in (0, 1], so the mapping never yields -1.
        (0..NUM_RAND_INTS)
            .map(|_| map_sample(rng.sample::<f64, _>(OpenClosed01)))
            .collect()
    }
}

impl RandomBufferSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self), fields(seeded = self.seed.is_some()))]
    async fn produce(&self) -> Result<RandomBuffer> {
        let values = self.sample_flat();
        let buffer = RandomBuffer::from_flat(&values)?;
        info!("Filled buffer with {} local samples", values.len());
        Ok(buffer)
    }
}

/// Which source fills the buffer
///
/// Remote unless the caller asks for the local generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceKind {
    /// True random bytes from random.org (uses quota)
    #[default]
    Remote,
    /// Pseudo-random bytes from a local generator
    Local,
}

impl SourceKind {
    /// Map the single "use the local generator" flag onto a source
    pub fn from_local_flag(local: bool) -> Self {
        if local {
            Self::Local
        } else {
            Self::Remote
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(Error::Config(format!(
                "unknown source '{}', expected 'remote' or 'local'",
                other
            ))),
        }
    }
}

/// The selected source, dispatched by variant
#[derive(Clone)]
pub enum BufferSource {
    Remote(RemoteSource),
    Local(LocalSource),
}

impl BufferSource {
    /// Build the source for `kind`
    ///
    /// `client` is only called when the remote source is selected. A seed only
    /// applies to the local generator.
    pub fn select<F>(kind: SourceKind, seed: Option<u64>, client: F) -> Result<Self>
    where
        F: FnOnce() -> Result<RandomOrgClient>,
    {
        match kind {
            SourceKind::Remote => {
                if let Some(seed) = seed {
                    warn!("Ignoring seed {}: random.org output cannot be seeded", seed);
                }
                Ok(Self::Remote(RemoteSource::new(client()?)))
            }
            SourceKind::Local => Ok(Self::Local(match seed {
                Some(seed) => LocalSource::with_seed(seed),
                None => LocalSource::new(),
            })),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Remote(_) => SourceKind::Remote,
            Self::Local(_) => SourceKind::Local,
        }
    }
}

impl RandomBufferSource for BufferSource {
    fn name(&self) -> &'static str {
        match self {
            Self::Remote(source) => source.name(),
            Self::Local(source) => source.name(),
        }
    }

    async fn produce(&self) -> Result<RandomBuffer> {
        match self {
            Self::Remote(source) => source.produce().await,
            Self::Local(source) => source.produce().await,
        }
    }
}

/// Map a unit-interval sample onto a byte value: `ceil(f * 256) - 1`
///
/// Samples in (0, 1] land in 0..=255. `f == 0.0` maps to -1.
pub fn map_sample(f: f64) -> i32 {
    (f * 256.0).ceil() as i32 - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fetcher::FetcherConfig, CHANNELS, IMG_DIM, MAX_INTEGERS_PER_REQUEST};
    use mockito::{Matcher, Mock, ServerGuard};
    use std::io::Write;
    use std::time::Duration;
    use url::Url;

    fn remote_for(server: &ServerGuard) -> RemoteSource {
        let base = Url::parse(&format!("{}/", server.url())).unwrap();
        RemoteSource::new(RandomOrgClient::new(FetcherConfig::new(base)).unwrap())
    }

    /// Body for a chunk whose values continue a global counter starting at `offset`
    fn chunk_body(offset: usize, num: usize) -> String {
        (offset..offset + num)
            .map(|i| format!("{}\n", i % 256))
            .collect()
    }

    async fn mock_chunk(server: &mut ServerGuard, offset: usize, num: usize) -> Mock {
        server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded("num".into(), num.to_string()))
            .with_body(chunk_body(offset, num))
            .expect(1)
            .create_async()
            .await
    }

    #[test]
    fn test_map_sample() {
        assert_eq!(map_sample(1.0), 255);
        assert_eq!(map_sample(0.5), 127);
        assert_eq!(map_sample(f64::MIN_POSITIVE), 0);
        assert_eq!(map_sample(1.0 / 256.0), 0);
        assert_eq!(map_sample(1.0 / 256.0 + 1e-9), 1);
        // the literal formula is kept: zero falls just below the byte range
        assert_eq!(map_sample(0.0), -1);
    }

    #[tokio::test]
    async fn test_local_source_shape_and_range() {
        let source = LocalSource::new();
        let buffer = source.produce().await.unwrap();

        assert_eq!(buffer.shape(), (IMG_DIM, IMG_DIM, CHANNELS));
        assert_eq!(buffer.as_flat().len(), NUM_RAND_INTS);
        assert!(source.sample_flat().iter().all(|v| (0..=255).contains(v)));
    }

    #[tokio::test]
    async fn test_local_source_seeded() {
        let a = LocalSource::with_seed(42).produce().await.unwrap();
        let b = LocalSource::with_seed(42).produce().await.unwrap();
        let c = LocalSource::with_seed(43).produce().await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_remote_source_assembles_five_chunks() {
        let mut server = mockito::Server::new_async().await;

        // four full chunks share a query, so one mock answers all of them
        let full = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded(
                "num".into(),
                MAX_INTEGERS_PER_REQUEST.to_string(),
            ))
            .with_body(chunk_body(0, MAX_INTEGERS_PER_REQUEST))
            .expect(4)
            .create_async()
            .await;
        let last = mock_chunk(&mut server, 0, 9_152).await;

        let source = remote_for(&server);
        let buffer = source.produce().await.unwrap();

        full.assert_async().await;
        last.assert_async().await;
        assert_eq!(buffer.shape(), (128, 128, 3));

        let metrics = source.client().metrics();
        assert_eq!(metrics.requests_total(), 5);
        assert_eq!(metrics.integers_fetched(), NUM_RAND_INTS as u64);

        // chunk k starts with 0 again, so position k * 10000 holds 0
        let flat = buffer.as_flat();
        for k in 0..5 {
            assert_eq!(flat[k * MAX_INTEGERS_PER_REQUEST], 0);
        }
        assert_eq!(flat[NUM_RAND_INTS - 1], (9_151 % 256) as u8);
    }

    #[tokio::test]
    async fn test_remote_source_preserves_arrival_order() {
        let mut server = mockito::Server::new_async().await;

        // full-size mocks are consumed in creation order
        let mut mocks = Vec::new();
        let mut offset = 0;
        for num in ChunkPlan::new(NUM_RAND_INTS) {
            let mock = server
                .mock("GET", "/integers/")
                .match_query(Matcher::UrlEncoded("num".into(), num.to_string()))
                .with_body(chunk_body(offset, num))
                .expect(1)
                .create_async()
                .await;
            mocks.push(mock);
            offset += num;
        }

        let buffer = remote_for(&server).produce().await.unwrap();
        for mock in &mocks {
            mock.assert_async().await;
        }

        let expected: Vec<u8> = (0..NUM_RAND_INTS).map(|i| (i % 256) as u8).collect();
        assert_eq!(buffer.as_flat(), expected.as_slice());
    }

    #[tokio::test]
    async fn test_remote_source_stops_on_failed_chunk() {
        let mut server = mockito::Server::new_async().await;
        let full = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded(
                "num".into(),
                MAX_INTEGERS_PER_REQUEST.to_string(),
            ))
            .with_status(503)
            .with_body("Error: too busy")
            .expect(1)
            .create_async()
            .await;
        let last = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded("num".into(), "9152".into()))
            .expect(0)
            .create_async()
            .await;

        let source = remote_for(&server);
        let err = source.produce().await.unwrap_err();

        assert!(matches!(err, Error::Service { status: 503, .. }));
        full.assert_async().await;
        last.assert_async().await;
        assert_eq!(source.client().metrics().requests_failed(), 1);
    }

    #[tokio::test]
    async fn test_remote_source_rejects_out_of_range_values() {
        let mut server = mockito::Server::new_async().await;
        let body: String = (0..MAX_INTEGERS_PER_REQUEST).map(|_| "300\n").collect();
        let _full = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded(
                "num".into(),
                MAX_INTEGERS_PER_REQUEST.to_string(),
            ))
            .with_body(body)
            .create_async()
            .await;
        let _last = mock_chunk(&mut server, 0, 9_152).await;

        let err = remote_for(&server).produce().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_source_kind_defaults_to_remote() {
        assert_eq!(SourceKind::default(), SourceKind::Remote);
        assert_eq!(SourceKind::from_local_flag(false), SourceKind::Remote);
        assert_eq!(SourceKind::from_local_flag(true), SourceKind::Local);

        assert_eq!("local".parse::<SourceKind>().unwrap(), SourceKind::Local);
        assert_eq!(" Remote ".parse::<SourceKind>().unwrap(), SourceKind::Remote);
        assert!(matches!("cloud".parse::<SourceKind>(), Err(Error::Config(_))));
        assert_eq!(SourceKind::Local.to_string(), "local");
    }

    #[test]
    fn test_select_builds_client_only_for_remote() {
        let local = BufferSource::select(SourceKind::Local, Some(3), || {
            panic!("local source must not build a client")
        })
        .unwrap();
        assert_eq!(local.kind(), SourceKind::Local);
        assert_eq!(local.name(), "local");

        let remote = BufferSource::select(SourceKind::default(), Some(3), || {
            RandomOrgClient::new(FetcherConfig::new(
                Url::parse("https://www.random.org/").unwrap(),
            ))
        })
        .unwrap();
        assert_eq!(remote.kind(), SourceKind::Remote);
        assert_eq!(remote.name(), "random.org");
    }

    #[test]
    fn test_select_propagates_client_error() {
        let result = BufferSource::select(SourceKind::Remote, None, || {
            Err(Error::Config("no client".to_string()))
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_selected_local_source_is_seeded() {
        let source = BufferSource::select(SourceKind::Local, Some(42), || {
            Err(Error::Config("unused".to_string()))
        })
        .unwrap();

        let expected = LocalSource::with_seed(42).produce().await.unwrap();
        assert_eq!(source.produce().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_remote_source_connection_refused() {
        // nothing listens on the discard port
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let source = RemoteSource::new(RandomOrgClient::new(FetcherConfig::new(base)).unwrap());

        let err = source.produce().await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_service_error());
        assert_eq!(source.client().metrics().requests_total(), 1);
        assert_eq!(source.client().metrics().requests_failed(), 1);
    }

    #[tokio::test]
    async fn test_remote_source_network_failure_on_last_chunk() {
        let mut server = mockito::Server::new_async().await;
        let full = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded(
                "num".into(),
                MAX_INTEGERS_PER_REQUEST.to_string(),
            ))
            .with_body(chunk_body(0, MAX_INTEGERS_PER_REQUEST))
            .expect(4)
            .create_async()
            .await;
        // the body stalls past the client timeout
        let stalled = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded("num".into(), "9152".into()))
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(b"1\n")
            })
            .create_async()
            .await;

        let base = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = FetcherConfig {
            base_url: base,
            timeout: Some(Duration::from_millis(250)),
        };
        let source = RemoteSource::new(RandomOrgClient::new(config).unwrap());

        let err = source.produce().await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        full.assert_async().await;
        stalled.assert_async().await;
        let metrics = source.client().metrics();
        assert_eq!(metrics.requests_total(), 5);
        assert_eq!(metrics.requests_failed(), 1);
    }

    #[tokio::test]
    async fn test_remote_source_parse_failure_on_middle_chunk() {
        let mut server = mockito::Server::new_async().await;
        let query = || {
            Matcher::UrlEncoded("num".into(), MAX_INTEGERS_PER_REQUEST.to_string())
        };

        // full-size mocks are consumed in creation order
        let first = server
            .mock("GET", "/integers/")
            .match_query(query())
            .with_body(chunk_body(0, MAX_INTEGERS_PER_REQUEST))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/integers/")
            .match_query(query())
            .with_body(chunk_body(0, MAX_INTEGERS_PER_REQUEST))
            .expect(1)
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/integers/")
            .match_query(query())
            .with_body("12\nError: quota exceeded\n")
            .expect(1)
            .create_async()
            .await;
        let fourth = server
            .mock("GET", "/integers/")
            .match_query(query())
            .with_body(chunk_body(0, MAX_INTEGERS_PER_REQUEST))
            .expect(0)
            .create_async()
            .await;
        let last = server
            .mock("GET", "/integers/")
            .match_query(Matcher::UrlEncoded("num".into(), "9152".into()))
            .expect(0)
            .create_async()
            .await;

        let source = remote_for(&server);
        let err = source.produce().await.unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        first.assert_async().await;
        second.assert_async().await;
        broken.assert_async().await;
        fourth.assert_async().await;
        last.assert_async().await;
        assert_eq!(source.client().metrics().requests_total(), 3);
    }
}
