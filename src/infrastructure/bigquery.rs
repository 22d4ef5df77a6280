// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::BigQuerySettings;
use crate::domain::models::result_row::{FieldMetric, ResultTable};
use crate::domain::repositories::result_sink::{ResultSink, SinkError};

const METADATA_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_PROJECT_PATH: &str = "/computeMetadata/v1/project/project-id";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// BigQuery 表结构
///
/// `date` 为必填 DATE，四个字符串列，四个分类得分和六项指标为 INT64。
pub fn table_schema() -> Value {
    let mut fields = vec![
        json!({"name": "date", "type": "DATE", "mode": "REQUIRED"}),
        json!({"name": "locale", "type": "STRING", "mode": "NULLABLE"}),
        json!({"name": "strategy", "type": "STRING", "mode": "NULLABLE"}),
        json!({"name": "url", "type": "STRING", "mode": "NULLABLE"}),
        json!({"name": "thisurl_origin", "type": "STRING", "mode": "NULLABLE"}),
    ];
    let int_columns = ["performance", "accessibility", "best_practices", "seo"]
        .into_iter()
        .chain(FieldMetric::ALL.iter().map(|m| m.column()));
    fields.extend(int_columns.map(|name| json!({"name": name, "type": "INT64", "mode": "NULLABLE"})));
    json!({ "fields": fields })
}

/// 访问令牌来源
#[derive(Debug, Clone)]
enum TokenSource {
    /// 配置中直接给出的令牌
    Static(String),
    /// GCE / Cloud Functions 的元数据服务器
    Metadata,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResource {
    job_reference: JobReference,
    #[serde(default)]
    status: Option<JobStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl std::fmt::Display for ErrorProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.reason.as_deref().unwrap_or("unknown"),
            self.message.as_deref().unwrap_or("no message")
        )
    }
}

/// BigQuery 输出
///
/// 每次运行提交一个追加模式（`WRITE_APPEND`）的加载作业，数据以 NDJSON 通过
/// multipart 上传，然后轮询作业直到完成。失败不重试，也不会影响之前写入的数据。
pub struct BigQuerySink {
    client: reqwest::Client,
    settings: BigQuerySettings,
    dataset_id: String,
    table_id: String,
    token_source: TokenSource,
}

impl BigQuerySink {
    pub fn from_settings(settings: &BigQuerySettings) -> Result<Self, SinkError> {
        let dataset_id = settings
            .dataset_id
            .clone()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SinkError::Other("bigquery.dataset_id is not set".to_string()))?;
        let table_id = settings
            .table_id
            .clone()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SinkError::Other("bigquery.table_id is not set".to_string()))?;

        let token_source = match settings.access_token.clone().filter(|t| !t.is_empty()) {
            Some(token) => TokenSource::Static(token),
            None => TokenSource::Metadata,
        };

        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
            dataset_id,
            table_id,
            token_source,
        })
    }

    fn destination(&self, project_id: &str) -> String {
        format!("{}.{}.{}", project_id, self.dataset_id, self.table_id)
    }

    async fn access_token(&self) -> Result<String, SinkError> {
        match &self.token_source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata => {
                let url = format!("{}{}", self.settings.metadata_base, METADATA_TOKEN_PATH);
                let response = self
                    .client
                    .get(&url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| SinkError::Auth(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(SinkError::Auth(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }
                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| SinkError::Auth(e.to_string()))?;
                Ok(token.access_token)
            }
        }
    }

    async fn project_id(&self) -> Result<String, SinkError> {
        if let Some(project) = self.settings.project_id.as_ref().filter(|p| !p.is_empty()) {
            return Ok(project.clone());
        }
        let url = format!("{}{}", self.settings.metadata_base, METADATA_PROJECT_PATH);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?;
        let project = response.text().await?.trim().to_string();
        if project.is_empty() {
            return Err(SinkError::Other("metadata server returned an empty project id".to_string()));
        }
        Ok(project)
    }

    /// 加载作业配置
    fn job_configuration(&self, project_id: &str, job_id: &str) -> Value {
        let mut job_reference = json!({ "projectId": project_id, "jobId": job_id });
        if let Some(location) = &self.settings.location {
            job_reference["location"] = json!(location);
        }
        json!({
            "jobReference": job_reference,
            "configuration": {
                "load": {
                    "destinationTable": {
                        "projectId": project_id,
                        "datasetId": self.dataset_id,
                        "tableId": self.table_id,
                    },
                    "schema": table_schema(),
                    "sourceFormat": "NEWLINE_DELIMITED_JSON",
                    "writeDisposition": "WRITE_APPEND",
                    "createDisposition": "CREATE_IF_NEEDED",
                }
            }
        })
    }

    async fn submit_job(
        &self,
        token: &str,
        project_id: &str,
        table: &ResultTable,
    ) -> Result<JobResource, SinkError> {
        let job_id = format!("psirs_{}", Uuid::new_v4().simple());
        let metadata = self.job_configuration(project_id, &job_id);
        let boundary = format!("psirs-{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, &encode_ndjson(table)?);

        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs?uploadType=multipart",
            self.settings.api_base, project_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SinkError::LoadJob(format!("job insert returned {}: {}", status, text)));
        }
        Ok(response.json().await?)
    }

    async fn wait_for_job(
        &self,
        token: &str,
        project_id: &str,
        mut job: JobResource,
    ) -> Result<(), SinkError> {
        for attempt in 0..=self.settings.max_polls {
            if let Some(status) = &job.status {
                if let Some(error) = &status.error_result {
                    return Err(SinkError::LoadJob(error.to_string()));
                }
                if status.state.as_deref() == Some("DONE") {
                    return Ok(());
                }
            }
            if attempt == self.settings.max_polls {
                break;
            }

            tokio::time::sleep(Duration::from_millis(self.settings.poll_interval_ms)).await;

            let mut request = self
                .client
                .get(format!(
                    "{}/bigquery/v2/projects/{}/jobs/{}",
                    self.settings.api_base, project_id, job.job_reference.job_id
                ))
                .bearer_auth(token);
            if let Some(location) = &job.job_reference.location {
                request = request.query(&[("location", location)]);
            }
            job = request.send().await?.error_for_status()?.json().await?;
            debug!(
                job_id = %job.job_reference.job_id,
                state = ?job.status.as_ref().and_then(|s| s.state.as_deref()),
                "Polled load job"
            );
        }

        Err(SinkError::LoadJob(format!(
            "job {} did not finish after {} polls",
            job.job_reference.job_id, self.settings.max_polls
        )))
    }
}

#[async_trait]
impl ResultSink for BigQuerySink {
    async fn write_rows(&self, table: &ResultTable) -> Result<String, SinkError> {
        if table.is_empty() {
            let destination = match self.settings.project_id.as_deref().filter(|p| !p.is_empty()) {
                Some(project_id) => self.destination(project_id),
                None => format!("{}.{}", self.dataset_id, self.table_id),
            };
            warn!(table = %destination, "No rows to load, skipping load job");
            return Ok(destination);
        }

        let project_id = self.project_id().await?;
        let destination = self.destination(&project_id);

        let token = self.access_token().await?;
        let job = self.submit_job(&token, &project_id, table).await?;
        info!(job_id = %job.job_reference.job_id, table = %destination, rows = table.len(), "Load job submitted");

        self.wait_for_job(&token, &project_id, job).await?;
        info!(table = %destination, rows = table.len(), "Load job finished");
        Ok(destination)
    }

    fn name(&self) -> &'static str {
        "bigquery"
    }
}

/// 结果表编码为 NDJSON，每行一个 JSON 对象
pub fn encode_ndjson(table: &ResultTable) -> Result<Vec<u8>, SinkError> {
    let mut out = Vec::new();
    for row in table.rows() {
        serde_json::to_writer(&mut out, &row.to_warehouse_json())
            .map_err(|e| SinkError::Other(e.to_string()))?;
        out.push(b'\n');
    }
    Ok(out)
}

/// 构建 `multipart/related` 请求体：第一部分是作业配置，第二部分是数据
fn multipart_related_body(boundary: &str, metadata: &Value, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 1024);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
#[path = "bigquery_test.rs"]
mod tests;
