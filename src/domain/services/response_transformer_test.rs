// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::measurement::Strategy;
use crate::domain::models::result_row::RESULT_COLUMNS;
use serde_json::{json, Number};

fn full_payload() -> Value {
    json!({
        "loadingExperience": {
            "metrics": {
                "CUMULATIVE_LAYOUT_SHIFT_SCORE": {"percentile": 5},
                "EXPERIMENTAL_TIME_TO_FIRST_BYTE": {"percentile": 800},
                "FIRST_CONTENTFUL_PAINT_MS": {"percentile": 1500},
                "FIRST_INPUT_DELAY_MS": {"percentile": 20},
                "INTERACTION_TO_NEXT_PAINT": {"percentile": 200},
                "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": 2400}
            }
        },
        "originLoadingExperience": {
            "metrics": {
                "CUMULATIVE_LAYOUT_SHIFT_SCORE": {"percentile": 8},
                "EXPERIMENTAL_TIME_TO_FIRST_BYTE": {"percentile": 900},
                "FIRST_CONTENTFUL_PAINT_MS": {"percentile": 1700},
                "FIRST_INPUT_DELAY_MS": {"percentile": 25},
                "INTERACTION_TO_NEXT_PAINT": {"percentile": 250},
                "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": 2600}
            }
        },
        "lighthouseResult": {
            "categories": {
                "performance": {"score": 0.87},
                "accessibility": {"score": 0.95},
                "best-practices": {"score": 1},
                "seo": {"score": 0.29}
            }
        }
    })
}

fn request() -> MeasurementRequest {
    MeasurementRequest::new("https://example.com", Strategy::Mobile, "ja")
}

fn transformer() -> ResponseTransformer {
    ResponseTransformer::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

#[test]
fn test_performance_score_is_scaled_to_percentage() {
    let (this_url, origin) = transformer().transform(&full_payload(), &request());

    assert_eq!(this_url.scores.performance, Some(87));
    assert_eq!(this_url.scores.accessibility, Some(95));
    assert_eq!(this_url.scores.best_practices, Some(100));
    assert_eq!(this_url.scores.seo, Some(29));
    assert_eq!(origin.scores, this_url.scores);

    let record = this_url.to_record();
    assert_eq!(record[5], "87");
}

#[test]
fn test_full_payload_rows_differ_only_in_scope_and_metrics() {
    let (this_url, origin) = transformer().transform(&full_payload(), &request());

    assert_eq!(this_url.scope, Scope::ThisUrl);
    assert_eq!(origin.scope, Scope::Origin);
    assert_ne!(this_url.metrics, origin.metrics);

    let a = this_url.to_record();
    let b = origin.to_record();
    assert_eq!(a.len(), RESULT_COLUMNS.len());
    for (i, (left, right)) in a.iter().zip(b.iter()).enumerate() {
        // column 4 is the scope, 9..15 are the field metrics
        if i == 4 || (9..15).contains(&i) {
            continue;
        }
        assert_eq!(left, right, "column {} should be shared", RESULT_COLUMNS[i]);
    }
    assert_eq!(a[9..15], ["5", "800", "1500", "20", "200", "2400"]);
    assert_eq!(b[9..15], ["8", "900", "1700", "25", "250", "2600"]);
}

#[test]
fn test_missing_fid_only_blanks_fid() {
    let mut payload = full_payload();
    payload["loadingExperience"]["metrics"]
        .as_object_mut()
        .unwrap()
        .remove("FIRST_INPUT_DELAY_MS");

    let (this_url, origin) = transformer().transform(&payload, &request());
    let record = this_url.to_record();

    assert_eq!(record[12], "");
    assert_eq!(record[9..12], ["5", "800", "1500"]);
    assert_eq!(record[13..15], ["200", "2400"]);
    assert_eq!(record[5], "87");
    assert_eq!(origin.metrics.fid, Some(Number::from(25)));
}

#[test]
fn test_missing_metrics_blank_exactly_their_positions() {
    let mut payload = full_payload();
    let metrics = payload["originLoadingExperience"]["metrics"]
        .as_object_mut()
        .unwrap();
    metrics.remove("CUMULATIVE_LAYOUT_SHIFT_SCORE");
    metrics.remove("INTERACTION_TO_NEXT_PAINT");
    // present metric without a percentile
    metrics.insert("LARGEST_CONTENTFUL_PAINT_MS".to_string(), json!({"category": "FAST"}));

    let (_, origin) = transformer().transform(&payload, &request());
    let record = origin.to_record();

    assert_eq!(record[9..15], ["", "900", "1700", "25", "", ""]);
}

#[test]
fn test_missing_sections_produce_blank_rows() {
    let payload = json!({"id": "https://example.com/"});

    let (this_url, origin) = transformer().transform(&payload, &request());

    assert_eq!(this_url.metrics, FieldMetrics::default());
    assert_eq!(origin.metrics, FieldMetrics::default());
    assert_eq!(this_url.scores, CategoryScores::default());
    let record = origin.to_record();
    assert_eq!(record[0], "2024-06-01");
    assert_eq!(record[3], "https://example.com");
    assert!(record[5..].iter().all(|v| v.is_empty()));
}

#[test]
fn test_wrong_types_do_not_panic() {
    let payload = json!({
        "loadingExperience": "unavailable",
        "originLoadingExperience": {"metrics": []},
        "lighthouseResult": {"categories": {"performance": {"score": null}, "seo": "n/a"}}
    });

    let (this_url, origin) = transformer().transform(&payload, &request());

    assert_eq!(this_url.metrics, FieldMetrics::default());
    assert_eq!(origin.metrics, FieldMetrics::default());
    assert_eq!(this_url.scores.performance, None);
    assert_eq!(this_url.scores.seo, None);
}

#[test]
fn test_scale_score_bounds() {
    assert_eq!(scale_score(0.0), 0);
    assert_eq!(scale_score(0.29), 29);
    assert_eq!(scale_score(0.999), 99);
    assert_eq!(scale_score(1.0), 100);
    assert_eq!(scale_score(1.5), 100);
}
