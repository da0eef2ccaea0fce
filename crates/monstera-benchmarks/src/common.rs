//! Common utilities for benchmarks

use criterion::Criterion;
use serde_json::{json, Value};

/// Criterion settings shared by every bench
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(100)
}

/// A snake_case payload shaped like a page of timesheet records
pub fn snake_payload(records: usize) -> Value {
    let items: Vec<Value> = (0..records)
        .map(|i| {
            json!({
                "record_id": i,
                "employee_name": format!("employee-{}", i),
                "work_date": "2024-04-01",
                "daily_hours": { "regular_hours": 8, "overtime_hours": 1 },
                "approval_status": null,
                "project_codes": ["alpha_team", "beta_team"],
            })
        })
        .collect();

    json!({ "total_count": records, "page_size": records, "items": items })
}
