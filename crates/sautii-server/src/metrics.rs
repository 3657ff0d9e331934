use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Histogram,
    HistogramVec,
};

pub static SEARCH_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("search_requests_total", "Search requests by endpoint", &["endpoint"])
        .unwrap()
});

pub static SEARCH_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "search_failures_total",
        "Searches that failed in the store",
        &["endpoint"]
    )
    .unwrap()
});

pub static SEARCH_DURATION_SEC: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "search_duration_seconds",
        "End-to-end search latency",
        &["endpoint"],
        vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap()
});

pub static SEARCH_MATCHED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "search_results_total",
        "Matched issues per search before pagination",
        vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});
