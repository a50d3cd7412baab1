//! Per-invocation state: configuration, session and the API client.

use crate::error::{CliError, CliResult};
use chrono::Utc;
use gizicare_client::config::Config;
use gizicare_client::http_client::ReqwestGiziCareClient;
use gizicare_client::session::{HandoffStore, Session, SubmitGuard, SubmitTicket, TokenStore};
use gizicare_client::{GiziCareClient, Profile};
use secrecy::SecretString;

pub struct Context {
    pub config: Config,
    pub session: Session,
    pub tokens: TokenStore,
    pub handoff: HandoffStore,
    client: ReqwestGiziCareClient,
    submit: SubmitGuard,
}

impl Context {
    pub async fn load(config: Config) -> CliResult<Self> {
        let tokens = TokenStore::new(config.session_path());
        let handoff = HandoffStore::new(config.handoff_path());
        let session = tokens.load().await?;
        let client = ReqwestGiziCareClient::from_config(&config, session.token().cloned())?;
        Ok(Self {
            config,
            session,
            tokens,
            handoff,
            client,
            submit: SubmitGuard::new(),
        })
    }

    pub fn client(&self) -> &dyn GiziCareClient {
        &self.client
    }

    /// The client, or `SignInRequired` when there is no usable token.
    pub fn authed(&self) -> CliResult<&dyn GiziCareClient> {
        if !self.session.is_signed_in() {
            return Err(CliError::SignInRequired);
        }
        Ok(&self.client)
    }

    pub async fn sign_in(&mut self, token: SecretString, remember: bool) -> CliResult<()> {
        self.session = Session::signed_in(token, remember, Utc::now());
        self.client = self.client.with_token(self.session.token().cloned());
        self.tokens.save(&self.session).await?;
        Ok(())
    }

    /// Drop the local token regardless of what the server said.
    pub async fn sign_out(&mut self) -> CliResult<()> {
        self.session.clear();
        self.client = self.client.with_token(None);
        self.tokens.clear().await?;
        tracing::debug!("removed {}", self.tokens.path().display());
        Ok(())
    }

    pub async fn select_profile(&mut self, id: u64) -> CliResult<()> {
        self.session.selected_profile_id = Some(id);
        self.tokens.save(&self.session).await?;
        Ok(())
    }

    /// Resolve the profile a command works on: the explicit id, else the
    /// selected one, else the first profile of the account.
    pub async fn profile(&self, explicit: Option<u64>) -> CliResult<Profile> {
        let profiles = self.authed()?.list_profiles().await?;
        let wanted = explicit.or(self.session.selected_profile_id);
        match wanted {
            Some(id) => profiles
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| CliError::NotFound(format!("profile {id}"))),
            None => profiles.into_iter().next().ok_or(CliError::NoProfile),
        }
    }

    pub fn begin_submit(&self) -> CliResult<SubmitTicket<'_>> {
        self.submit.begin().ok_or(CliError::Busy)
    }
}
