use {
    crate::Ctx,
    anyhow::Result,
    partcrypt_protocol::encoding::decode_request,
    partcrypt_sdk::unit::{encode_reply, reject_message},
    tokio::{
        io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, stdin, stdout},
        sync::mpsc,
        task::JoinSet,
    },
    tracing::{debug, info},
};

/// Serves part requests, one JSON message per line on stdin.
pub async fn worker(ctx: &Ctx) -> Result<()> {
    serve(ctx, BufReader::new(stdin()), stdout()).await?;
    Ok(())
}

/// Answers every non-blank line of `input` with exactly one line on `output`.
///
/// Responses are written as parts complete, so they may be out of request
/// order; each carries its `partIndex`. At most `capacity` finished responses
/// wait for the writer, and reading pauses while they do. Reading stops at end
/// of input, after which pending parts still finish. Returns `output` once
/// everything has been written.
pub async fn serve<R, W>(ctx: &Ctx, input: R, output: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let capacity = ctx.pool.capacity();
    let (sender, mut receiver) = mpsc::channel::<String>(capacity);
    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(line) = receiver.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        anyhow::Ok(output)
    });

    let mut pending = JoinSet::new();
    let mut lines = input.lines();
    let mut received = 0_u64;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        received = received.saturating_add(1);
        while pending.len() >= capacity {
            if let Some(joined) = pending.join_next().await {
                joined?;
            }
        }
        match decode_request(&line) {
            Ok(request) => {
                let handle = ctx.pool.submit(request).await;
                debug!(part_index = handle.part_index(), "accepted request");
                let sender = sender.clone();
                pending.spawn(async move {
                    let reply = encode_reply(&handle.response().await);
                    // The writer only stops on an output error, which is returned below.
                    let _ = sender.send(reply).await;
                });
            }
            Err(err) => {
                let reply = encode_reply(&reject_message(&line, err));
                if sender.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }
    drop(sender);
    while let Some(joined) = pending.join_next().await {
        joined?;
    }
    let output = writer.await??;
    info!(received, "input closed");
    Ok(output)
}
