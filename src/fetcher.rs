use tracing::error;

/// How long a fetched page stays in the cache, in seconds. The backing
/// store owns the expiry, we only pass this along on every write.
pub const PAGE_TTL_SECS: u64 = 10;

/// An async trait that define the behavior of a cache for fetched pages.
///
/// Atomicity of [`PageCache::hit`] is delegated to the backing store, so
/// concurrent callers never lose an increment.
#[async_trait::async_trait]
pub trait PageCache: Send {
    /// Bump the access counter for the given url and return the new count.
    async fn hit(&mut self, url: &str) -> anyhow::Result<u64>;

    /// Return the cached body for the given url, or `None` when nothing is
    /// stored or the entry already expired.
    async fn lookup(&mut self, url: &str) -> anyhow::Result<Option<String>>;

    /// Store the body under the given url for [`PAGE_TTL_SECS`] seconds.
    async fn store(&mut self, url: &str, body: &str) -> anyhow::Result<()>;
}

/// Anything that can turn a URL into page content. Implementor must report
/// bad HTTP status as an error, not only transport level failure.
#[async_trait::async_trait]
pub trait PageProvider: Send + Sync {
    async fn fetch_page(&self, url: &str) -> anyhow::Result<String>;
}

/// Cache-aside wrapper around a [`PageProvider`]. Every fetch counts the
/// access, serves from the cache when a fresh copy exists, and falls back
/// to the provider otherwise.
#[derive(Clone)]
pub struct CachingFetcher<C, P> {
    cache: C,
    provider: P,
}

impl<C, P> CachingFetcher<C, P>
where
    C: PageCache,
    P: PageProvider,
{
    pub fn new(cache: C, provider: P) -> Self {
        Self { cache, provider }
    }

    /// Return the content of the given url, counting the access.
    ///
    /// The counter is bumped first, no matter how the rest of the call
    /// turns out. A provider failure is logged and degrades to an empty
    /// string, so the caller always gets a body back. Cache errors have no
    /// fallback and are returned as-is.
    pub async fn fetch(&mut self, url: &str) -> anyhow::Result<String> {
        self.cache.hit(url).await?;

        if let Some(page) = self.cache.lookup(url).await? {
            return Ok(page);
        }

        match self.provider.fetch_page(url).await {
            Ok(page) => {
                self.cache.store(url, &page).await?;
                Ok(page)
            }
            Err(err) => {
                error!("fail to fetch page from `{url}`: {err:#}");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
struct MemCache {
    inner: std::sync::Arc<std::sync::Mutex<MemCacheInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MemCacheInner {
    now: u64,
    counts: std::collections::HashMap<String, u64>,
    pages: std::collections::HashMap<String, (String, u64)>,
}

#[cfg(test)]
impl MemCache {
    fn advance(&self, secs: u64) {
        self.inner.lock().unwrap().now += secs;
    }

    fn count(&self, url: &str) -> u64 {
        *self.inner.lock().unwrap().counts.get(url).unwrap_or(&0)
    }

    fn has_page(&self, url: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .pages
            .get(url)
            .is_some_and(|(_, expire_at)| inner.now < *expire_at)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl PageCache for MemCache {
    async fn hit(&mut self, url: &str) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let count = inner.counts.entry(url.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn lookup(&mut self, url: &str) -> anyhow::Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pages
            .get(url)
            .filter(|(_, expire_at)| inner.now < *expire_at)
            .map(|(body, _)| body.clone()))
    }

    async fn store(&mut self, url: &str, body: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let expire_at = inner.now + PAGE_TTL_SECS;
        inner
            .pages
            .insert(url.to_string(), (body.to_string(), expire_at));
        Ok(())
    }
}

#[cfg(test)]
#[derive(Clone)]
struct StubProvider {
    body: Option<&'static str>,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl StubProvider {
    fn ok(body: &'static str) -> Self {
        Self {
            body: Some(body),
            calls: Default::default(),
        }
    }

    fn broken() -> Self {
        Self {
            body: None,
            calls: Default::default(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl PageProvider for StubProvider {
    async fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.body {
            Some(body) => Ok(body.to_string()),
            None => anyhow::bail!("connection refused: `{url}`"),
        }
    }
}

#[tokio::test]
async fn test_fetch_round_trip() {
    let cache = MemCache::default();
    let provider = StubProvider::ok("hello");
    let mut fetcher = CachingFetcher::new(cache.clone(), provider.clone());

    let page = fetcher.fetch("http://x").await.unwrap();
    assert_eq!(page, "hello");
    assert_eq!(cache.count("http://x"), 1);
    assert_eq!(provider.calls(), 1);

    // second call inside the TTL is served from cache
    let page = fetcher.fetch("http://x").await.unwrap();
    assert_eq!(page, "hello");
    assert_eq!(cache.count("http://x"), 2);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_expired_page_is_fetched_again() {
    let cache = MemCache::default();
    let provider = StubProvider::ok("hello");
    let mut fetcher = CachingFetcher::new(cache.clone(), provider.clone());

    fetcher.fetch("http://x").await.unwrap();
    cache.advance(PAGE_TTL_SECS);

    let page = fetcher.fetch("http://x").await.unwrap();
    assert_eq!(page, "hello");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_failed_fetch_yields_empty_string() {
    let cache = MemCache::default();
    let provider = StubProvider::broken();
    let mut fetcher = CachingFetcher::new(cache.clone(), provider.clone());

    let page = fetcher.fetch("http://y").await.unwrap();
    assert_eq!(page, "");
    assert_eq!(cache.count("http://y"), 1);
    assert!(!cache.has_page("http://y"));
}

#[tokio::test]
async fn test_counter_counts_every_outcome() {
    let cache = MemCache::default();
    let provider = StubProvider::ok("hello");
    let mut fetcher = CachingFetcher::new(cache.clone(), provider.clone());

    // miss, hit, then another miss after the entry expired
    fetcher.fetch("http://x").await.unwrap();
    fetcher.fetch("http://x").await.unwrap();
    cache.advance(PAGE_TTL_SECS);
    fetcher.fetch("http://x").await.unwrap();
    assert_eq!(cache.count("http://x"), 3);

    // a failing provider still counts the access
    cache.advance(PAGE_TTL_SECS);
    let mut broken = CachingFetcher::new(cache.clone(), StubProvider::broken());
    broken.fetch("http://x").await.unwrap();
    assert_eq!(cache.count("http://x"), 4);
}

#[tokio::test]
async fn test_counters_are_tracked_per_url() {
    let cache = MemCache::default();
    let provider = StubProvider::ok("hello");
    let mut fetcher = CachingFetcher::new(cache.clone(), provider.clone());

    fetcher.fetch("http://x").await.unwrap();
    fetcher.fetch("http://x").await.unwrap();
    fetcher.fetch("http://z").await.unwrap();

    assert_eq!(cache.count("http://x"), 2);
    assert_eq!(cache.count("http://z"), 1);
    assert_eq!(cache.count("http://never-seen"), 0);
}
