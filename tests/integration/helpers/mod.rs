// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PSI_PATH: &str = "/pagespeedonline/v5/runPagespeed";

/// 一份包含全部字段的 PageSpeed Insights 响应
pub fn psi_payload(url: &str, performance: f64) -> Value {
    let metrics = |lcp: i64| {
        json!({
            "CUMULATIVE_LAYOUT_SHIFT_SCORE": {"percentile": 5},
            "EXPERIMENTAL_TIME_TO_FIRST_BYTE": {"percentile": 800},
            "FIRST_CONTENTFUL_PAINT_MS": {"percentile": 1500},
            "FIRST_INPUT_DELAY_MS": {"percentile": 20},
            "INTERACTION_TO_NEXT_PAINT": {"percentile": 180},
            "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": lcp}
        })
    };
    json!({
        "id": url,
        "loadingExperience": {"metrics": metrics(2100)},
        "originLoadingExperience": {"metrics": metrics(2600)},
        "lighthouseResult": {
            "categories": {
                "performance": {"score": performance},
                "accessibility": {"score": 0.91},
                "best-practices": {"score": 1.0},
                "seo": {"score": 0.85}
            }
        }
    })
}

/// 为指定URL挂载一个成功响应（对所有策略生效）
pub async fn mount_success(server: &MockServer, url: &str, performance: f64) {
    Mock::given(method("GET"))
        .and(path(PSI_PATH))
        .and(query_param("url", url))
        .respond_with(ResponseTemplate::new(200).set_body_json(psi_payload(url, performance)))
        .mount(server)
        .await;
}

/// 为指定URL挂载一个延迟响应，用来触发读取超时
pub async fn mount_slow(server: &MockServer, url: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(PSI_PATH))
        .and(query_param("url", url))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(psi_payload(url, 0.5))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// 模拟服务的 API 地址
pub fn endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), PSI_PATH)
}
