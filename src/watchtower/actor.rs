use bitcoin::Transaction;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::WatchtowerConfig;
use crate::errors::Error;

use super::justice::build_justice_tx;
use super::store::WatchtowerStore;
use super::types::{ChannelDescriptor, HintMsg};

pub struct WatchtowerActor<S> {
    store: S,
}

impl<S: WatchtowerStore> WatchtowerActor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

pub enum WatchtowerMessage {
    /// A customer opened a channel with us; start watching it.
    AddChannel(ChannelDescriptor),
    /// A customer revoked one more state.
    AddHint(HintMsg),
    /// The chain watcher saw a transaction worth checking.
    CandidateTx(Box<Transaction>),
    /// The embedding layer broadcast a sweep for this channel.
    ChannelSwept([u8; 20]),
}

pub struct WatchtowerState {
    justice_tx_sender: mpsc::Sender<Transaction>,
}

#[ractor::async_trait]
impl<S> Actor for WatchtowerActor<S>
where
    S: WatchtowerStore + Send + Sync + 'static,
{
    type Msg = WatchtowerMessage;
    type State = WatchtowerState;
    type Arguments = (WatchtowerConfig, mpsc::Sender<Transaction>);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (config, justice_tx_sender) = args;
        let channels = self.store.watched_channels()?;
        info!(
            "watchtower started, resuming watch over {} channels, store at {:?}",
            channels.len(),
            config.store_path()
        );
        Ok(Self::State { justice_tx_sender })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WatchtowerMessage::AddChannel(descriptor) => {
                match self.store.add_channel(&descriptor) {
                    Ok(local_index) => debug!(
                        "watching channel {} at index {}",
                        hex::encode(descriptor.dest_pkh),
                        local_index
                    ),
                    Err(err @ Error::ChannelExists(_)) => warn!("{}", err),
                    Err(err) => error!("failed to add channel: {}", err),
                }
            }
            WatchtowerMessage::AddHint(msg) => match self.store.add_hint(&msg) {
                Ok(()) => debug!("stored hint for txid {}", msg.txid),
                Err(err) => error!("failed to store hint for txid {}: {}", msg.txid, err),
            },
            WatchtowerMessage::CandidateTx(tx) => {
                let txid = tx.txid();
                match self.store.lookup_hint(&txid) {
                    Ok(Some(isig)) => {
                        info!("txid {} matches a stored hint, building justice tx", txid);
                        match build_justice_tx(&self.store, &tx, &isig) {
                            Ok(justice_tx) => {
                                if let Err(err) = state.justice_tx_sender.send(justice_tx).await {
                                    error!("failed to hand justice tx to broadcaster: {}", err);
                                }
                            }
                            Err(Error::ScriptMismatch) => {
                                // truncated-txid collision or a lure; keep watching
                                warn!("txid {} matched a hint but no output matches", txid);
                            }
                            Err(err) => error!("failed to build justice tx: {}", err),
                        }
                    }
                    Ok(None) => {}
                    Err(err) => error!("hint lookup failed: {}", err),
                }
            }
            WatchtowerMessage::ChannelSwept(dest_pkh) => {
                match self.store.mark_channel_swept(&dest_pkh) {
                    Ok(()) => debug!("channel {} marked swept", hex::encode(dest_pkh)),
                    Err(err) => error!("failed to mark channel swept: {}", err),
                }
            }
        }
        Ok(())
    }
}
