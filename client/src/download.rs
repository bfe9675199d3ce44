use {
    crate::{Ctx, info::pretty_size},
    anyhow::{Result, bail, ensure},
    cadd::{ops::Cadd, prelude::IntoType},
    futures::{StreamExt, stream},
    partcrypt_protocol::{DownloadRequest, EncryptionKey, PartRequest, PartResponse},
    std::{
        io::{BufWriter, Write},
        path::Path,
    },
    tracing::{debug, info, warn},
    url::Url,
};

/// Downloads every part of a stored file and writes the plaintext to `output`.
///
/// Parts are fetched concurrently but written strictly in order. Any failed
/// part fails the whole download and the incomplete output is removed.
pub async fn download(ctx: &Ctx, url: &Url, total_physical_size: u64, output: &Path) -> Result<()> {
    let key = ctx.encryption_key()?;
    let expected_size = ctx.layout.logical_size(total_physical_size)?;
    let parts = ctx.layout.number_of_parts(total_physical_size);
    info!(
        %url,
        parts,
        "downloading {} to {}",
        pretty_size(expected_size),
        output.display()
    );

    let mut file = BufWriter::new(fs_err::File::create(output)?);
    let result = write_parts(ctx, url, &key, total_physical_size, &mut file)
        .await
        .and_then(|written| {
            ensure!(
                written == expected_size,
                "size mismatch; written {written}, expected {expected_size}"
            );
            Ok(())
        });
    drop(file);

    if let Err(err) = result {
        if let Err(remove_err) = fs_err::remove_file(output) {
            warn!("failed to remove incomplete output: {remove_err}");
        }
        return Err(err);
    }
    info!("downloaded {} parts to {}", parts, output.display());
    Ok(())
}

async fn write_parts(
    ctx: &Ctx,
    url: &Url,
    key: &EncryptionKey,
    total_physical_size: u64,
    file: &mut impl Write,
) -> Result<u64> {
    let parts = ctx.layout.number_of_parts(total_physical_size);
    let mut responses = stream::iter(0..parts)
        .map(|part_index| {
            let request = PartRequest::Download(DownloadRequest {
                part_index,
                download_url: url.clone(),
                key: key.clone(),
                total_physical_size,
            });
            async move { ctx.pool.submit(request).await.response().await }
        })
        .buffered(ctx.pool.capacity());

    let mut written = 0_u64;
    let mut done = 0_u64;
    while let Some(response) = responses.next().await {
        match response {
            PartResponse::Downloaded {
                part_index,
                segments,
            } => {
                for segment in &segments {
                    file.write_all(&segment.0)?;
                    written = written.cadd(segment.0.len().try_into_type::<u64>()?)?;
                }
                debug!(part_index, segments = segments.len(), "wrote part");
                done = done.saturating_add(1);
                info!(
                    part_index,
                    "{done}/{parts} parts written ({}%)",
                    percent_done(done, parts)
                );
            }
            PartResponse::Failed {
                part_index,
                kind,
                message,
            } => bail!("part {part_index:?} failed ({kind:?}): {message}"),
            PartResponse::Uploaded { part_index, .. } => {
                bail!("unexpected upload response for part {part_index}")
            }
        }
    }
    file.flush()?;
    Ok(written)
}

/// Share of finished parts, rounded down. An empty download is complete.
fn percent_done(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    u128::from(done)
        .saturating_mul(100)
        .checked_div(u128::from(total))
        .and_then(|percent| u64::try_from(percent).ok())
        .unwrap_or(100)
}
