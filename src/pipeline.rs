use crate::cache::{CacheEntry, CacheStats, ImageCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::raster::rasterize;
use crate::resolve::{resolve, RawRequest};
use crate::svg::render_svg;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A finished response: artifact bytes, content type, and whether it was
/// served from the cache.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: Bytes,
    pub content_type: &'static str,
    pub cache_hit: bool,
}

/// Gauge over the raster encode step: current and high-water in-flight
/// counts. Lets tests and the health endpoint observe that the permit
/// pool actually serializes encodes.
#[derive(Debug, Default)]
pub struct RasterGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl RasterGauge {
    fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct GaugeGuard {
    gauge: Arc<RasterGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sequences one request through cache, resolver, vector renderer and
/// raster stage. Constructed once at process start and shared by
/// reference; the cache and the permit pool are its only shared mutable
/// state.
pub struct Pipeline {
    config: Config,
    cache: ImageCache,
    /// Fixed-size permit pool bounding simultaneous raster encodes.
    /// Acquisition has no timeout: a request waits indefinitely for a
    /// free permit. Vector and cache-hit requests never touch it.
    permits: Semaphore,
    gauge: Arc<RasterGauge>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let cache = ImageCache::new(
            config.cache_max_items,
            config.cache_max_bytes,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let permits = Semaphore::new(config.concurrency.max(1));
        Self {
            config,
            cache,
            permits,
            gauge: Arc::new(RasterGauge::default()),
        }
    }

    /// Handle one request. `signature` is the canonical cache key: the
    /// normalized request URL exactly as received, byte-for-byte.
    pub async fn handle(&self, signature: &str, raw: RawRequest) -> Result<Rendered> {
        if let Some(entry) = self.cache.get(signature) {
            return Ok(Rendered {
                body: entry.body.clone(),
                content_type: entry.content_type,
                cache_hit: true,
            });
        }

        let spec = resolve(&raw, &self.config);
        let markup = render_svg(&spec);
        let format = spec.format;

        // Vector fast path: no permit needed.
        if !format.is_raster() {
            let body = Bytes::from(markup.clone());
            self.cache
                .put(signature.to_string(), CacheEntry::text(markup, format.content_type()));
            return Ok(Rendered {
                body,
                content_type: format.content_type(),
                cache_hit: false,
            });
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::PermitPoolClosed)?;

        let gauge = Arc::clone(&self.gauge);
        let bytes = tokio::task::spawn_blocking(move || {
            let _in_flight = gauge.enter();
            rasterize(&markup, format, &spec)
        })
        .await??;

        self.cache.put(
            signature.to_string(),
            CacheEntry::binary(bytes.clone(), format.content_type()),
        );
        Ok(Rendered {
            body: Bytes::from(bytes),
            content_type: format.content_type(),
            cache_hit: false,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn raster_in_flight(&self) -> usize {
        self.gauge.current()
    }

    pub fn raster_peak(&self) -> usize {
        self.gauge.peak()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
