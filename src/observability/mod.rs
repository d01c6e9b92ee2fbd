pub mod error_tracking;

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct AppMetrics {
    request_count: AtomicU64,
    error_count: AtomicU64,
    timeout_count: AtomicU64,
    auth_failure_count: AtomicU64,
    ws_connections: AtomicU64,
    latency_total_ms: AtomicU64,
    latency_count: AtomicU64,
    messages_appended: AtomicU64,
    realtime_deliveries: AtomicU64,
    relay_lagged_events: AtomicU64,
}

impl AppMetrics {
    pub fn record_request(&self, status: u16, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if status == 504 {
            self.timeout_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_total_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ws_connected(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ws_disconnected(&self) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
    }

    /// One appended message and the number of sockets it reached.
    pub fn record_relayed_message(&self, deliveries: usize) {
        self.messages_appended.fetch_add(1, Ordering::Relaxed);
        self.realtime_deliveries
            .fetch_add(deliveries as u64, Ordering::Relaxed);
    }

    pub fn record_relay_lag(&self, skipped: u64) {
        self.relay_lagged_events
            .fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self, db_size: u32, db_idle: usize) -> String {
        let count = self.latency_count.load(Ordering::Relaxed).max(1);
        let avg_latency = self.latency_total_ms.load(Ordering::Relaxed) as f64 / count as f64;

        format!(
            concat!(
                "# TYPE http_requests_total counter\n",
                "http_requests_total {}\n",
                "# TYPE http_error_total counter\n",
                "http_error_total {}\n",
                "# TYPE http_timeout_total counter\n",
                "http_timeout_total {}\n",
                "# TYPE auth_failures_total counter\n",
                "auth_failures_total {}\n",
                "# TYPE ws_connections gauge\n",
                "ws_connections {}\n",
                "# TYPE http_latency_avg_ms gauge\n",
                "http_latency_avg_ms {:.2}\n",
                "# TYPE chat_messages_appended_total counter\n",
                "chat_messages_appended_total {}\n",
                "# TYPE chat_realtime_deliveries_total counter\n",
                "chat_realtime_deliveries_total {}\n",
                "# TYPE chat_relay_lagged_events_total counter\n",
                "chat_relay_lagged_events_total {}\n",
                "# TYPE db_pool_size gauge\n",
                "db_pool_size {}\n",
                "# TYPE db_pool_idle gauge\n",
                "db_pool_idle {}\n",
            ),
            self.request_count.load(Ordering::Relaxed),
            self.error_count.load(Ordering::Relaxed),
            self.timeout_count.load(Ordering::Relaxed),
            self.auth_failure_count.load(Ordering::Relaxed),
            self.ws_connections.load(Ordering::Relaxed),
            avg_latency,
            self.messages_appended.load(Ordering::Relaxed),
            self.realtime_deliveries.load(Ordering::Relaxed),
            self.relay_lagged_events.load(Ordering::Relaxed),
            db_size,
            db_idle,
        )
    }
}
