use std::time::Duration;

use async_trait::async_trait;
use spampipe::error::{Error, Result};
use spampipe::pipeline::cancel::CancelToken;
use spampipe::pipeline::chain::PipeExt;
use spampipe::pipeline::pipe::Pipe;
use spampipe::pipeline::runtime::Runtime;
use tokio::sync::mpsc::{Receiver, Sender};

struct Scale(u32);

#[async_trait]
impl Pipe<u32, u32> for Scale {
    async fn process(
        &self,
        mut input: Receiver<u32>,
        output: Sender<u32>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = input.recv() => {
                    let Some(v) = msg else { break; };
                    if output.send(v * self.0).await.is_err() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

struct Describe;

#[async_trait]
impl Pipe<u32, String> for Describe {
    async fn process(
        &self,
        mut input: Receiver<u32>,
        output: Sender<String>,
        _buffer: usize,
        _cancel: CancelToken,
    ) -> Result<()> {
        while let Some(v) = input.recv().await {
            if output.send(format!("#{v}")).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

struct FailPipe;

#[async_trait]
impl Pipe<u32, u32> for FailPipe {
    async fn process(
        &self,
        mut input: Receiver<u32>,
        _output: Sender<u32>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            msg = input.recv() => {
                if msg.is_some() {
                    Err(Error::Pipeline { context: "boom" })
                } else {
                    Ok(())
                }
            }
        }
    }
}

struct PanicPipe;

#[async_trait]
impl Pipe<u32, u32> for PanicPipe {
    async fn process(
        &self,
        mut input: Receiver<u32>,
        _output: Sender<u32>,
        _buffer: usize,
        _cancel: CancelToken,
    ) -> Result<()> {
        if input.recv().await.is_some() {
            panic!("stage invariant violated");
        }
        Ok(())
    }
}

#[tokio::test]
async fn chain_passes_items_through_in_order() -> Result<()> {
    let pipe = Scale(2).pipe::<u32, _>(Scale(5));

    let out = Runtime::new().buffer(4).run(pipe, vec![1u32, 2, 3, 4]).await?;

    assert_eq!(out, vec![10, 20, 30, 40]);
    Ok(())
}

#[tokio::test]
async fn multi_stage_chain_changes_item_type_per_edge() -> Result<()> {
    let pipe = Scale(3)
        .pipe::<u32, _>(Scale(1))
        .pipe::<String, _>(Describe);

    let out = Runtime::new().buffer(2).run(pipe, 1u32..=3).await?;

    assert_eq!(out, vec!["#3", "#6", "#9"]);
    Ok(())
}

#[tokio::test]
async fn empty_input_terminates_with_empty_output() -> Result<()> {
    let pipe = Scale(2).pipe::<u32, _>(Scale(2)).pipe::<String, _>(Describe);

    let out = tokio::time::timeout(
        Duration::from_millis(500),
        Runtime::new().run(pipe, Vec::<u32>::new()),
    )
    .await
    .expect("pipeline should not block on empty input")?;

    assert!(out.is_empty());
    Ok(())
}

#[tokio::test]
async fn chain_propagates_error() {
    let pipe = Scale(1).pipe::<u32, _>(FailPipe).pipe::<u32, _>(Scale(1));

    let err = Runtime::new()
        .buffer(4)
        .run(pipe, vec![10u32])
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("boom"));
}

#[tokio::test]
async fn failing_stage_does_not_strand_a_busy_upstream() {
    // Upstream has far more items than the edge buffers hold.
    let pipe = Scale(1).pipe::<u32, _>(FailPipe);

    let res = tokio::time::timeout(
        Duration::from_millis(500),
        Runtime::new().buffer(1).run(pipe, 0u32..10_000),
    )
    .await
    .expect("pipeline should stop after a stage failure");

    assert!(matches!(res, Err(Error::Pipeline { context: "boom" })));
}

#[tokio::test]
async fn panicking_stage_surfaces_join_error_without_deadlock() {
    let pipe = Scale(1)
        .pipe::<u32, _>(PanicPipe)
        .pipe::<String, _>(Describe);

    let res = tokio::time::timeout(
        Duration::from_millis(500),
        Runtime::new().buffer(2).run(pipe, vec![1u32, 2, 3]),
    )
    .await
    .expect("downstream must not hang after a panic");

    match res {
        Err(Error::Join(err)) => assert!(err.is_panic()),
        other => panic!("expected join error, got {other:?}"),
    }
}

#[tokio::test]
async fn spawn_exposes_both_ends_of_the_pipeline() -> Result<()> {
    let pipe = Scale(2).pipe::<String, _>(Describe);

    let (tx, mut rx, _cancel, handle) = Runtime::new().buffer(8).spawn(pipe);

    tx.send(21).await.unwrap();
    drop(tx);

    assert_eq!(rx.recv().await.as_deref(), Some("#42"));
    assert_eq!(rx.recv().await, None);

    handle.await??;
    Ok(())
}
