use redis::{aio::ConnectionManager, AsyncCommands};

use crate::fetcher::{PageCache, PAGE_TTL_SECS};

// Key layout shared with the other consumers of the store, do not change.
const COUNT_KEY_PREFIX: &str = "count";
const RESULT_KEY_PREFIX: &str = "result";

fn count_key(url: &str) -> String {
    format!("{COUNT_KEY_PREFIX}:{url}")
}

fn result_key(url: &str) -> String {
    format!("{RESULT_KEY_PREFIX}:{url}")
}

#[async_trait::async_trait]
impl PageCache for ConnectionManager {
    async fn hit(&mut self, url: &str) -> anyhow::Result<u64> {
        Ok(self.incr(count_key(url), 1).await?)
    }

    async fn lookup(&mut self, url: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(result_key(url)).await?)
    }

    async fn store(&mut self, url: &str, body: &str) -> anyhow::Result<()> {
        let _: () = self.set_ex(result_key(url), body, PAGE_TTL_SECS).await?;
        Ok(())
    }
}

#[test]
fn test_key_naming() {
    assert_eq!(count_key("http://x"), "count:http://x");
    assert_eq!(result_key("http://x"), "result:http://x");
}
