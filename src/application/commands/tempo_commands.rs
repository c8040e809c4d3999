use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::composition::Tempo;
use crate::domain::history::{Command, CommandError, CommandKind, CommandMeta};
use crate::ports::CompositionApi;

/// Changes the project tempo; undo restores the tempo read just before.
pub struct SetTempoCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    tempo: Tempo,
    previous: Option<Tempo>,
}

impl SetTempoCommand {
    pub fn new(api: Arc<dyn CompositionApi>, tempo: Tempo) -> Self {
        Self {
            meta: CommandMeta::new(CommandKind::SetTempo, format!("Set tempo to {tempo}")),
            api,
            tempo,
            previous: None,
        }
    }
}

#[async_trait]
impl Command for SetTempoCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let previous = self.api.get_tempo().await?;
        self.api.set_tempo(self.tempo).await?;
        self.previous = Some(previous);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let previous = self.previous.ok_or(CommandError::NotExecuted)?;
        self.api.set_tempo(previous).await?;
        Ok(())
    }
}
