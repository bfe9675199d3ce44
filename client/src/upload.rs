use {
    crate::{Ctx, cli::UploadPartArgs, info::pretty_size},
    anyhow::{Result, bail},
    cadd::prelude::IntoType,
    partcrypt_protocol::{
        BlockLayout, PartRequest, PartResponse, UploadRequest, messages::StatusPayload,
    },
    std::{
        io::{Read, Seek, SeekFrom},
        path::Path,
    },
    tracing::info,
};

/// Reads the plaintext of one part of a local file.
fn read_part(layout: BlockLayout, path: &Path, part_index: u64) -> Result<Vec<u8>> {
    let mut file = fs_err::File::open(path)?;
    let file_size = file.metadata()?.len();
    let range = layout.logical_range_for_part(part_index, file_size)?;
    file.seek(SeekFrom::Start(range.start))?;
    let mut buf = vec![0; range.len().try_into_type::<usize>()?];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

pub async fn upload_part(ctx: &Ctx, args: UploadPartArgs) -> Result<()> {
    let key = ctx.encryption_key()?;
    let plaintext = read_part(ctx.layout, &args.file, args.part_index)?;
    info!(
        part_index = args.part_index,
        "uploading {} from {}",
        pretty_size(plaintext.len().try_into_type::<u64>()?),
        args.file.display()
    );
    let request = PartRequest::Upload(UploadRequest {
        part_index: args.part_index,
        request_body: args.request_body,
        status_payload: StatusPayload {
            signature: args.signature,
            hash: args.hash,
            public_key: args.public_key,
        },
        plaintext_bytes: plaintext,
        key,
        upload_url: args.url,
        content_type: args.content_type,
        initial_iv: args.iv,
    });
    match ctx.pool.submit(request).await.response().await {
        PartResponse::Uploaded { response, .. } => print_response(&response),
        PartResponse::Failed {
            part_index,
            kind,
            message,
        } => bail!("part {part_index:?} failed ({kind:?}): {message}"),
        PartResponse::Downloaded { part_index, .. } => {
            bail!("unexpected download response for part {part_index}")
        }
    }
}

#[expect(clippy::print_stdout, reason = "command output")]
fn print_response(response: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "test")]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn parts_of_a_local_file() {
        let layout = BlockLayout::new(16, 2).unwrap();
        let data: Vec<u8> = (0..70).collect();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        assert_eq!(read_part(layout, file.path(), 0).unwrap(), data[..32]);
        assert_eq!(read_part(layout, file.path(), 2).unwrap(), data[64..]);
        read_part(layout, file.path(), 3).unwrap_err();
    }
}
