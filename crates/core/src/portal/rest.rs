//! REST portal backend talking to the depository web back end.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{PortalConfig, UserConfig};

use super::{ApplyReport, OpenIssue, PortalDriver, PortalError, PortalSession, APPLY_ACTION, ASBA_PATH};

/// Message returned by the portal when an application is accepted.
pub const APPLIED_MESSAGE: &str = "Share has been applied successfully.";

/// Width portal usernames are zero-padded to.
const USERNAME_WIDTH: usize = 8;

/// Session factory for the REST back end.
pub struct RestPortal {
    config: PortalConfig,
}

impl RestPortal {
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }
}

impl PortalDriver for RestPortal {
    fn name(&self) -> &str {
        "rest"
    }

    fn new_session(&self) -> Box<dyn PortalSession> {
        Box::new(RestSession::new(self.config.clone()))
    }
}

/// Logged-in account details used to fill application forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnDetail {
    demat: String,
    boid: String,
    #[serde(default)]
    name: Option<String>,
}

/// One REST session: a private HTTP client plus the bearer token.
pub struct RestSession {
    config: PortalConfig,
    client: Option<Client>,
    token: Option<String>,
    detail: Option<OwnDetail>,
    issues: Vec<OpenIssue>,
    share_ids: Vec<i64>,
}

impl RestSession {
    fn new(config: PortalConfig) -> Self {
        Self {
            config,
            client: None,
            token: None,
            detail: None,
            issues: Vec::new(),
            share_ids: Vec::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn client(&self) -> Result<&Client, PortalError> {
        self.client.as_ref().ok_or(PortalError::NotStarted)
    }

    fn token(&self) -> Result<&str, PortalError> {
        self.token.as_deref().ok_or(PortalError::NotAuthenticated)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        let response = self
            .client()?
            .get(self.url(path))
            .header(AUTHORIZATION, self.token()?)
            .send()
            .await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, PortalError> {
        let response = self
            .client()?
            .post(self.url(path))
            .header(AUTHORIZATION, self.token()?)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Resolve the portal's client id for a DP code.
    async fn client_id_for(&self, dp_id: &str) -> Result<i64, PortalError> {
        let response = self
            .client()?
            .get(self.url("meroShare/capital/"))
            .send()
            .await?;
        let participants: Vec<Participant> = read_json(response).await?;
        participants
            .into_iter()
            .find(|p| p.code == dp_id.trim())
            .map(|p| p.id)
            .ok_or_else(|| PortalError::LoginRejected(format!("unknown DP code {}", dp_id)))
    }

    async fn apply_one(
        &self,
        user: &UserConfig,
        detail: &OwnDetail,
        share_id: i64,
    ) -> Result<(), PortalError> {
        let banks: Vec<Bank> = self.get_json("meroShare/bank/").await?;
        let bank = banks
            .first()
            .ok_or_else(|| PortalError::ApiError("no bank linked to account".to_string()))?;
        let accounts: Vec<BankAccount> =
            self.get_json(&format!("meroShare/bank/{}", bank.id)).await?;
        let account = accounts
            .first()
            .ok_or_else(|| PortalError::ApiError(format!("no account at bank {}", bank.name)))?;

        let form = ApplyForm {
            demat: &detail.demat,
            boid: &detail.boid,
            account_number: &account.account_number,
            customer_id: account.id,
            account_branch_id: account.account_branch_id,
            account_type_id: account.account_type_id,
            applied_kitta: user.apply_units.to_string(),
            crn_number: &user.crn,
            transaction_pin: &user.txn_pin,
            company_share_id: share_id.to_string(),
            bank_id: bank.id.to_string(),
        };
        let body = serde_json::to_value(&form)
            .map_err(|e| PortalError::Internal(format!("Failed to encode form: {}", e)))?;
        let reply: PortalMessage = self
            .post_json("meroShare/applicantForm/share/apply", &body)
            .await?;

        if reply.message.trim() == APPLIED_MESSAGE {
            Ok(())
        } else {
            Err(PortalError::ApiError(reply.message))
        }
    }
}

#[async_trait]
impl PortalSession for RestSession {
    async fn start(&mut self) -> Result<(), PortalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs as u64))
            .build()
            .map_err(|e| PortalError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        self.client = Some(client);
        Ok(())
    }

    async fn authenticate(&mut self, user: &UserConfig) -> Result<(), PortalError> {
        let client_id = self.client_id_for(&user.dp_id).await?;
        let response = self
            .client()?
            .post(self.url("meroShare/auth/"))
            .json(&json!({
                "clientId": client_id,
                "username": normalize_username(&user.username),
                "password": user.password,
            }))
            .send()
            .await?;

        let status = response.status();
        let token = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match token {
            Some(token) if status.is_success() => {
                self.token = Some(token);
                Ok(())
            }
            _ => {
                let reply: PortalMessage = response.json().await.unwrap_or_default();
                Err(PortalError::LoginRejected(format!(
                    "HTTP {}: {}",
                    status, reply.message
                )))
            }
        }
    }

    async fn navigate(&mut self, path: &str) -> Result<(), PortalError> {
        if path != ASBA_PATH {
            return Err(PortalError::NavigationFailed(format!("unknown path {}", path)));
        }
        let detail: OwnDetail = self.get_json("meroShare/ownDetail/").await?;
        debug!(name = ?detail.name, "Loaded account details");
        self.detail = Some(detail);
        Ok(())
    }

    async fn enumerate_open_offerings(&mut self) -> Result<(), PortalError> {
        if self.detail.is_none() {
            return Err(PortalError::NavigationFailed(
                "issue list requested before navigation".to_string(),
            ));
        }
        let page: IssuePage = self
            .post_json("meroShare/companyShare/applicableIssue/", &applicable_issue_query())
            .await?;

        let (issues, share_ids): (Vec<OpenIssue>, Vec<i64>) = page
            .object
            .into_iter()
            .enumerate()
            .map(|(i, row)| (row.to_open_issue(i + 1), row.company_share_id))
            .unzip();
        self.issues = issues;
        self.share_ids = share_ids;
        info!(count = self.issues.len(), "Loaded applicable issues");
        Ok(())
    }

    fn open_offerings(&self) -> &[OpenIssue] {
        &self.issues
    }

    async fn apply(
        &mut self,
        user: &UserConfig,
        indices: &[usize],
        label: &str,
    ) -> Result<ApplyReport, PortalError> {
        let detail = self.detail.clone().ok_or(PortalError::NotAuthenticated)?;
        let mut report = ApplyReport::default();

        for &index in indices {
            let position = index.checked_sub(1).ok_or(PortalError::InvalidIndex(index))?;
            let (Some(issue), Some(&share_id)) =
                (self.issues.get(position), self.share_ids.get(position))
            else {
                return Err(PortalError::InvalidIndex(index));
            };

            if !issue.can_apply() {
                warn!(alias = %user.alias, ticker = %issue.ticker, "Issue no longer offers {}", APPLY_ACTION);
                report.failed.push(format!("{}: already applied", issue.ticker));
                continue;
            }

            match self.apply_one(user, &detail, share_id).await {
                Ok(()) => {
                    info!(alias = %user.alias, ticker = %issue.ticker, offering = label, "Application accepted");
                    report.succeeded.push(issue.ticker.clone());
                }
                Err(e) => {
                    warn!(alias = %user.alias, ticker = %issue.ticker, offering = label, "Application rejected: {}", e);
                    report.failed.push(format!("{}: {}", issue.ticker, e));
                }
            }
        }

        Ok(report)
    }

    async fn close(&mut self) {
        self.token = None;
        self.detail = None;
        self.client = None;
        self.issues.clear();
        self.share_ids.clear();
    }
}

/// Zero-pad numeric usernames to the portal's fixed width.
pub fn normalize_username(username: &str) -> String {
    let trimmed = username.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", trimmed, width = USERNAME_WIDTH)
    } else {
        trimmed.to_string()
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PortalError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PortalError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )));
    }
    response
        .json()
        .await
        .map_err(|e| PortalError::ApiError(format!("Invalid response: {}", e)))
}

fn applicable_issue_query() -> serde_json::Value {
    json!({
        "filterFieldParams": [
            {"key": "companyIssue.companyISIN.script", "alias": "Scrip"},
            {"key": "companyIssue.companyISIN.company.name", "alias": "Company Name"},
            {"key": "companyIssue.assignedToClient.name", "value": "", "alias": "Issue Manager"}
        ],
        "page": 1,
        "size": 10,
        "searchRoleViewConstants": "VIEW_APPLICABLE_SHARE",
        "filterDateParams": [
            {"key": "minIssueOpenDate", "condition": "", "alias": "", "value": ""},
            {"key": "maxIssueCloseDate", "condition": "", "alias": "", "value": ""}
        ]
    })
}

#[derive(Debug, Deserialize)]
struct Participant {
    id: i64,
    code: String,
}

#[derive(Debug, Default, Deserialize)]
struct PortalMessage {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct IssuePage {
    #[serde(default)]
    object: Vec<IssueRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueRow {
    company_share_id: i64,
    company_name: String,
    scrip: String,
    #[serde(default)]
    sub_group: String,
    #[serde(default)]
    share_type_name: String,
    #[serde(default)]
    share_group_name: String,
    #[serde(default)]
    action: Option<String>,
}

impl IssueRow {
    fn to_open_issue(&self, index: usize) -> OpenIssue {
        // Rows without an action have not been applied to yet.
        let action = match self.action.as_deref().map(str::trim) {
            None | Some("") => APPLY_ACTION.to_string(),
            Some(other) => capitalize(other),
        };
        OpenIssue {
            index,
            name: self.company_name.trim().to_string(),
            issued_for: self.sub_group.trim().to_string(),
            ticker: self.scrip.trim().to_string(),
            issue_type: self.share_type_name.trim().to_string(),
            share_type: self.share_group_name.trim().to_string(),
            action,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct Bank {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankAccount {
    id: i64,
    account_number: String,
    account_branch_id: i64,
    #[serde(default)]
    account_type_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyForm<'a> {
    demat: &'a str,
    boid: &'a str,
    account_number: &'a str,
    customer_id: i64,
    account_branch_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_type_id: Option<i64>,
    applied_kitta: String,
    crn_number: &'a str,
    #[serde(rename = "transactionPIN")]
    transaction_pin: &'a str,
    company_share_id: String,
    bank_id: String,
}
