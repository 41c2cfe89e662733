use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::pipeline::runtime::launch;

/// Two stages joined by an intermediate stream of `M`.
///
/// Each side runs on its own task. If either side fails or panics the shared
/// [`CancelToken`] is tripped so the other side stops too, and the first
/// failure is returned once both sides have been joined.
pub struct Chain<A, B, M> {
    a: Arc<A>,
    b: Arc<B>,
    _m: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a: Arc::new(a),
            b: Arc::new(b),
            _m: PhantomData,
        }
    }
}

#[async_trait]
impl<I, M, O, A, B> Pipe<I, O> for Chain<A, B, M>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
    A: Pipe<I, M> + 'static,
    B: Pipe<M, O> + 'static,
{
    fn stage_name(&self) -> &'static str {
        "chain"
    }

    async fn process(
        &self,
        input: mpsc::Receiver<I>,
        output: mpsc::Sender<O>,
        buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let (tx_mid, rx_mid) = mpsc::channel::<M>(buffer);

        let mut left = launch(Arc::clone(&self.a), input, tx_mid, buffer, cancel.clone());
        let mut right = launch(Arc::clone(&self.b), rx_mid, output, buffer, cancel.clone());

        let mut left_res: Option<Result<()>> = None;
        let mut right_res: Option<Result<()>> = None;

        while left_res.is_none() || right_res.is_none() {
            tokio::select! {
                res = &mut left, if left_res.is_none() => {
                    left_res = Some(settle(self.a.stage_name(), res, &cancel));
                }
                res = &mut right, if right_res.is_none() => {
                    right_res = Some(settle(self.b.stage_name(), res, &cancel));
                }
            }
        }

        left_res.unwrap_or(Ok(()))?;
        right_res.unwrap_or(Ok(()))?;
        Ok(())
    }
}

fn settle(
    stage: &'static str,
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
    cancel: &CancelToken,
) -> Result<()> {
    let res = joined.map_err(Error::from).and_then(|res| res);
    if let Err(_err) = &res {
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::ERROR, event = "spampipe.stage.failed", stage = stage, error = %_err, "spampipe.stage.failed");
        #[cfg(not(feature = "tracing"))]
        let _ = stage;
        cancel.cancel();
    }
    res
}

pub trait PipeExt<I, O>: Pipe<I, O> + Sized
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn pipe<N, P2>(self, next: P2) -> Chain<Self, P2, O>
    where
        N: Send + 'static,
        P2: Pipe<O, N>,
    {
        Chain::new(self, next)
    }
}

impl<I, O, P> PipeExt<I, O> for P
where
    I: Send + 'static,
    O: Send + 'static,
    P: Pipe<I, O> + Sized,
{
}

