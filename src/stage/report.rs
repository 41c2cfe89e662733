use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::error::Result;
use crate::model::{MsgData, ReportLine};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;

const STAGE: &str = "result_aggregation";

/// Collects every classified message, sorts them once the input closes and
/// emits one report line per message.
///
/// Spam comes first; ties are broken by ascending message id. Nothing is
/// written until the whole input has been read.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultAggregation;

impl ResultAggregation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Pipe<MsgData, ReportLine> for ResultAggregation {
    fn stage_name(&self) -> &'static str {
        STAGE
    }

    async fn process(
        &self,
        mut input: Receiver<MsgData>,
        output: Sender<ReportLine>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let mut collected = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = STAGE, where_ = "recv", "spampipe.cancelled");
                    return Ok(());
                },
                msg = input.recv() => {
                    let Some(data) = msg else { break; };
                    collected.push(data);
                }
            }
        }

        collected.sort_by(MsgData::report_order);

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "spampipe.report.sorted", stage = STAGE, count = collected.len(), "spampipe.report.sorted");

        for data in collected {
            if cancel.is_cancelled() {
                break;
            }
            if output.send(data.report_line()).await.is_err() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "spampipe.downstream.closed", stage = STAGE, "spampipe.downstream.closed");
                break;
            }
        }
        Ok(())
    }
}
