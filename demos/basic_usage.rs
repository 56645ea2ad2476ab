use futures_util::StreamExt;
use futures_util::TryStreamExt;
use keyset_pager::blocking;
use keyset_pager::impls::memory::Table;
use keyset_pager::pager;
use keyset_pager::BatchOptions;
use keyset_pager::Value;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A table of 7000 items with creation times in shuffled order
    let mut table = Table::new(["id", "created"]);
    for i in 0..7000i64 {
        table.insert([Value::from(i + 1), Value::from((i * 7919) % 7000)]);
    }

    // Pages of 1000, stop after 2333 rows
    let options = BatchOptions::new().with_limit(2333);
    let mut pages = pager::batches(table.all(), options);
    while let Some(page) = pages.try_next().await? {
        println!("page of {} rows", page.len());
    }

    // Newest first, only the `created` column
    let options = BatchOptions::new()
        .with_batch_size(100)
        .with_order_by("-created")?
        .with_limit(5);
    let newest = pager::rows(table.all().values_flat("created"), options)
        .try_collect::<Vec<_>>()
        .await?;
    println!("newest: {:?}", newest);

    // Resume after a known key
    let options = BatchOptions::new().with_batch_size(10).with_start_with(6995);
    let tail = pager::rows(table.all().values_list(["id", "created"]), options)
        .map(|r| r.map(|row| format!("{:?}", row)))
        .try_collect::<Vec<_>>()
        .await?;
    println!("tail: {:?}", tail);

    // A projection without the ordering field is rejected
    let options = BatchOptions::new().with_order_by("created")?;
    let mut strm = pager::rows(table.all().values_list(["id", "created"]), options);
    if let Some(Err(e)) = strm.next().await {
        println!("error: {}", e);
    }

    // The same from synchronous code
    let count = tokio::task::spawn_blocking(move || {
        blocking::rows(table.all(), BatchOptions::new().with_batch_size(500))
            .filter_map(Result::ok)
            .count()
    })
    .await?;
    println!("counted {} rows", count);

    Ok(())
}
