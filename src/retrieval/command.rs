use crate::retrieval::error::RetrievalError;
use crate::retrieval::{excerpt, Retriever};
use crate::types::command::CommandId;
use crate::types::station::StationId;
use crate::types::window::RetrievalWindow;
use log::{error, info};
use serde::Deserialize;

/// How the command endpoint's statuses are handled (429 is dealt with upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreationStatus {
    Accepted,
    Rejected,
    Unexpected,
}

fn classify(status: u16) -> CreationStatus {
    match status {
        202 => CreationStatus::Accepted,
        400 | 401 | 404 | 500 => CreationStatus::Rejected,
        _ => CreationStatus::Unexpected,
    }
}

#[derive(Debug, Deserialize)]
struct CommandAcceptance {
    #[serde(rename = "elaboreProduitAvecDemandeResponse")]
    response: AcceptedCommand,
}

#[derive(Debug, Deserialize)]
struct AcceptedCommand {
    #[serde(rename = "return")]
    command_id: RawCommandId,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCommandId {
    Text(String),
    Number(u64),
}

fn parse_command_id(body: &str) -> Result<CommandId, RetrievalError> {
    let acceptance: CommandAcceptance =
        serde_json::from_str(body).map_err(|e| RetrievalError::MalformedAcceptance {
            body: excerpt(body),
            source: Some(e),
        })?;
    let id = match acceptance.response.command_id {
        RawCommandId::Text(text) => text.trim().to_string(),
        RawCommandId::Number(n) => n.to_string(),
    };
    if id.is_empty() {
        return Err(RetrievalError::MalformedAcceptance {
            body: excerpt(body),
            source: None,
        });
    }
    Ok(CommandId::new(id))
}

impl Retriever {
    /// Asks the provider to prepare `station`'s file over `window`.
    ///
    /// A 202 without a usable command id is treated as a rejection, not retried.
    ///
    /// # Errors
    ///
    /// Every error is terminal for the station in this cycle; see [`RetrievalError`].
    pub async fn create_command(
        &self,
        station: &StationId,
        window: &RetrievalWindow,
    ) -> Result<CommandId, RetrievalError> {
        let context = format!("[station {}]", station);
        let response = self
            .send_with_retry(&context, || self.api.create_command(station, window))
            .await?;

        match classify(response.status) {
            CreationStatus::Accepted => {
                let command = parse_command_id(&response.body).inspect_err(|e| {
                    error!("{} 202 but no command id: {}", context, e);
                })?;
                info!("{} Command accepted => id={}", context, command);
                Ok(command)
            }
            CreationStatus::Rejected => {
                error!(
                    "{} Error {} => {}",
                    context,
                    response.status,
                    excerpt(&response.body)
                );
                Err(RetrievalError::Rejected {
                    status: response.status,
                    body: excerpt(&response.body),
                })
            }
            CreationStatus::Unexpected => {
                error!(
                    "{} Unexpected status {} => {}",
                    context,
                    response.status,
                    excerpt(&response.body)
                );
                Err(RetrievalError::UnexpectedStatus {
                    status: response.status,
                    body: excerpt(&response.body),
                })
            }
        }
    }
}
