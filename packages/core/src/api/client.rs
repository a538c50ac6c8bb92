use crate::api::ChatApi;
use crate::config::Config;
use crate::protocol::messages::{NewMessageBody, RawChat, RawMessage};
use crate::utils::error::{ChatError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

/// REST клиент на reqwest
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base: Url,
}

impl HttpChatApi {
    pub fn new(api_base: &str, client: Client) -> Result<Self> {
        let base = Url::parse(api_base)
            .map_err(|e| ChatError::InvalidInput(format!("Invalid API base {}: {}", api_base, e)))?;

        if base.cannot_be_a_base() {
            return Err(ChatError::InvalidInput(format!(
                "API base cannot carry a path: {}",
                api_base
            )));
        }

        Ok(Self { client, base })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChatError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Self::new(&config.api_base, client)
    }

    /// base + сегменты пути (каждый сегмент percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_chats(&self) -> Result<Vec<RawChat>> {
        let url = self.endpoint(&["chats"]);
        tracing::debug!(%url, "GET chats");

        let chats = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawChat>>()
            .await?;

        Ok(chats)
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<RawMessage>> {
        let url = self.endpoint(&["chats", chat_id, "messages"]);
        tracing::debug!(%url, "GET messages");

        let messages = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawMessage>>()
            .await?;

        Ok(messages)
    }

    async fn post_message(&self, chat_id: &str, body: &NewMessageBody) -> Result<()> {
        let url = self.endpoint(&["chats", chat_id, "messages"]);
        tracing::debug!(%url, "POST message");

        self.client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
