//! 带显式 TTL 的小型缓存。
//!
//! 用于在一次进程生命周期内记住短期查询结果（如探测到的视频基址模板），
//! 以可注入的服务形式存在，避免全局可变状态。

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let (deadline, value) = self.entries.get(key)?;
        if Instant::now() < *deadline {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now() + self.ttl, value));
    }

    /// 取缓存值，未命中或过期时调用 `fill` 并写回。
    pub fn get_or_try_insert<E>(
        &mut self,
        key: K,
        fill: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E>
    where
        K: Clone,
    {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        let v = fill()?;
        self.insert(key, v.clone());
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_miss_after() {
        let mut cache = TtlCache::new(Duration::from_millis(30));
        cache.insert("k", 1u32);
        assert_eq!(cache.get(&"k"), Some(1));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn fill_runs_once_while_fresh() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let mut fills = 0;
        for _ in 0..3 {
            let v: Result<u32, ()> = cache.get_or_try_insert("k", || {
                fills += 1;
                Ok(7)
            });
            assert_eq!(v, Ok(7));
        }
        assert_eq!(fills, 1);
    }

    #[test]
    fn fill_error_is_not_cached() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let err: Result<u32, &str> = cache.get_or_try_insert("k", || Err("boom"));
        assert_eq!(err, Err("boom"));
        let ok: Result<u32, &str> = cache.get_or_try_insert("k", || Ok(9));
        assert_eq!(ok, Ok(9));
    }
}
