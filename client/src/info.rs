use {
    anyhow::Result,
    byte_unit::{Byte, UnitType},
    partcrypt_protocol::{BlockLayout, ByteRange},
    prettytable::{format::FormatBuilder, row, Table},
    tracing::info,
};

pub fn pretty_size(size: u64) -> String {
    format!(
        "{:.2}",
        Byte::from_u64(size).get_appropriate_unit(UnitType::Binary)
    )
}

#[derive(Debug, PartialEq, Eq)]
struct PartPlan {
    index: u64,
    plaintext: ByteRange,
    stored: ByteRange,
}

fn plan_parts(layout: BlockLayout, logical_size: u64) -> Result<Vec<PartPlan>> {
    let physical_size = layout.size_on_fs(logical_size);
    (0..layout.number_of_logical_parts(logical_size))
        .map(|index| {
            Ok(PartPlan {
                index,
                plaintext: layout.logical_range_for_part(index, logical_size)?,
                stored: layout.physical_range_for_part(index, physical_size)?,
            })
        })
        .collect()
}

pub fn plan(layout: BlockLayout, logical_size: u64) -> Result<()> {
    let physical_size = layout.size_on_fs(logical_size);
    info!(
        "plaintext: {} ({logical_size} bytes) in {} blocks",
        pretty_size(logical_size),
        layout.number_of_blocks(logical_size),
    );
    info!(
        "stored: {} ({physical_size} bytes) in {} parts of up to {} blocks",
        pretty_size(physical_size),
        layout.number_of_parts(physical_size),
        layout.blocks_per_part(),
    );

    let mut table = Table::new();
    table.set_format(FormatBuilder::new().column_separator(' ').build());
    table.add_row(row!["Part", "Plaintext", "Stored", "Stored size"]);
    for part in plan_parts(layout, logical_size)? {
        table.add_row(row![
            part.index,
            part.plaintext,
            part.stored,
            pretty_size(part.stored.len()),
        ]);
    }
    info!("{table}");
    Ok(())
}
