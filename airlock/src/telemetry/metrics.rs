use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub locked: UpDownCounter<i64>,
    pub status_led: UpDownCounter<i64>,

    pub bytes_forwarded_total: Counter<u64>,
    pub frames_total: Counter<u64>,
    pub frames_dropped_total: Counter<u64>,
    pub violations_total: Counter<u64>,

    pub volume_count: UpDownCounter<i64>,
    pub arp_bucket_level: UpDownCounter<i64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            locked: meter
                .i64_up_down_counter("airlock_locked")
                .with_description("1 if the airlock is currently locked shut, 0 otherwise")
                .build(),
            status_led: meter
                .i64_up_down_counter("airlock_status_led")
                .with_description("Mirrors the core's status_led output (1 = clear, 0 = locked)")
                .build(),

            bytes_forwarded_total: meter
                .u64_counter("airlock_bytes_forwarded_total")
                .with_description("Total bytes forwarded from ingress to egress")
                .build(),
            frames_total: meter
                .u64_counter("airlock_frames_total")
                .with_description("Total frames observed on ingress")
                .build(),
            frames_dropped_total: meter
                .u64_counter("airlock_frames_dropped_total")
                .with_description("Total frames swallowed by a lock or drop decision")
                .build(),
            violations_total: meter
                .u64_counter("airlock_violations_total")
                .with_description("Total policy violations observed, labeled by kind")
                .build(),

            volume_count: meter
                .i64_up_down_counter("airlock_volume_count")
                .with_description("Current byte count tracked by the volume rate limiter")
                .build(),
            arp_bucket_level: meter
                .i64_up_down_counter("airlock_arp_bucket_level")
                .with_description("Current fill level of the ARP leaky bucket")
                .build(),
        }
    }

    pub fn record_violation(&self, kind: &str) {
        self.violations_total.add(1, &[KeyValue::new("kind", kind.to_string())]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("airlock");
    let metrics = Arc::new(Metrics::new(meter));

    Ok((metrics, registry))
}
