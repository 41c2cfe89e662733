use std::sync::Arc;

use crate::error::Result;
use crate::model::{EmailAddress, MessageId, MsgData, ReportLine};
use crate::pipeline::chain::PipeExt;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::pipe::Pipe;
use crate::pipeline::runtime::Runtime;
use crate::service::MailService;
use crate::stage::{MessageLookup, ResultAggregation, SpamCheck, UserResolution};

/// The four classification stages wired together over one [`MailService`].
pub struct SpamClassifier<S> {
    service: Arc<S>,
    config: PipelineConfig,
}

impl<S> SpamClassifier<S>
where
    S: MailService + 'static,
{
    pub fn new(service: Arc<S>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { service, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// `addresses → users → message ids → classified messages → report lines`
    pub fn pipeline(&self) -> impl Pipe<EmailAddress, ReportLine> + 'static {
        UserResolution::new(Arc::clone(&self.service))
            .pipe::<MessageId, _>(MessageLookup::new(
                Arc::clone(&self.service),
                self.config.batch_size_value(),
            ))
            .pipe::<MsgData, _>(SpamCheck::new(
                Arc::clone(&self.service),
                self.config.max_in_flight_value(),
            ))
            .pipe::<ReportLine, _>(ResultAggregation::new())
    }

    /// Classify `addresses` and return the sorted report.
    pub async fn run<It>(&self, addresses: It) -> Result<Vec<ReportLine>>
    where
        It: IntoIterator,
        It::Item: Into<EmailAddress>,
    {
        let addresses: Vec<EmailAddress> = addresses.into_iter().map(Into::into).collect();

        Runtime::new()
            .buffer(self.config.buffer_value())
            .run(self.pipeline(), addresses)
            .await
    }
}
