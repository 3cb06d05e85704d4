//! JSON and form bodies exchanged with task clients.

use serde::{Deserialize, Serialize};
use tokenrelay_flow::{Credentials, LoginRequest, ProxyDescriptor, SecondaryAuth};
use tokenrelay_registry::{TaskRecord, TaskStatus};

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskRequest {
    pub access_key: String,
    pub mail: String,
    pub pass: String,
    pub url: String,
    pub cookies: Option<Vec<String>>,
    pub proxy: Option<ProxyBody>,
    pub recovery: Option<String>,
    pub secret: Option<String>,
    pub mobile: Option<bool>,
    pub apple_data: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ProxyBody {
    pub data: String,
    pub protocol: String,
}

impl CreateTaskRequest {
    pub fn into_login_request(self) -> LoginRequest {
        let mut request = LoginRequest::new(Credentials::new(self.mail, self.pass), self.url);
        request.proxy = self
            .proxy
            .and_then(|proxy| ProxyDescriptor::new(proxy.protocol, proxy.data));
        request.cookies = self.cookies.unwrap_or_default();
        request.mobile = self.mobile.unwrap_or(false);
        request.secondary = SecondaryAuth {
            recovery: non_blank(self.recovery),
            totp_secret: non_blank(self.secret),
            apple_data: non_blank(self.apple_data),
        };
        request
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStatusRequest {
    pub access_key: String,
    pub id: String,
}

/// Legacy synchronous endpoint form.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct TokenForm {
    pub url: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResponse {
    pub fn accepted(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub status_code: u8,
    pub status: TaskStatus,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    /// An unknown id reads as `processing`: clients keep polling ids that were
    /// evicted or never submitted exactly as they poll a running task.
    pub fn from_record(id: String, record: Option<TaskRecord>) -> Self {
        match record {
            Some(record) => Self {
                status_code: record.status.code(),
                status: record.status,
                id,
                token: record.token,
                error: record.error,
            },
            None => Self {
                status_code: TaskStatus::Processing.code(),
                status: TaskStatus::Processing,
                id,
                token: None,
                error: None,
            },
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status_code: TaskStatus::Failed.code(),
            status: TaskStatus::Failed,
            id: String::new(),
            token: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_accepts_minimal_and_null_fields() {
        let body = json!({
            "accessKey": "K",
            "mail": "a@x.com",
            "pass": "p",
            "url": "https://example/login",
            "cookies": null,
            "proxy": {"data": "", "protocol": "socks5"},
            "recovery": "",
            "secret": "JBSWY3DP",
        });
        let request: CreateTaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.access_key, "K");

        let login = request.into_login_request();
        assert_eq!(login.account(), "a@x.com");
        assert!(login.proxy.is_none());
        assert!(login.cookies.is_empty());
        assert!(login.secondary.recovery.is_none());
        assert_eq!(login.secondary.totp_secret.as_deref(), Some("JBSWY3DP"));
    }

    #[test]
    fn status_response_omits_empty_fields() {
        let rendered =
            serde_json::to_value(TaskStatusResponse::from_record("a@x.com".into(), None)).unwrap();
        assert_eq!(
            rendered,
            json!({"statusCode": 1, "status": "processing", "id": "a@x.com"})
        );
    }
}
